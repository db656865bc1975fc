//! Scavenger — Hunt Definition Store.
//!
//! Holds teacher-authored hunts, each an ordered sequence of stops, and
//! serves them read-only to the progression core. Hunts are authored as
//! YAML documents and published into a [`application::catalog::HuntCatalog`].

pub mod application;
pub mod domain;

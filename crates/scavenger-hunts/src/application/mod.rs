//! Read-side services over hunt definitions.

pub mod catalog;
pub mod loader;

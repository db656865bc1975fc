//! Scavenger Core — shared domain abstractions.
//!
//! This crate defines the traits and types every component of the hunt
//! engine depends on: the error taxonomy, the clock, commands, domain
//! events and the event repository. It contains no infrastructure code.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod key;
pub mod repository;

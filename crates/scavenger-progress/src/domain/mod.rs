//! Progress domain: the aggregate, its commands and events.

pub mod aggregates;
pub mod commands;
pub mod events;

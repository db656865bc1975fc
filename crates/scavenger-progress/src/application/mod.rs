//! Application services for the Progress Tracker.

pub mod clue_dispatcher;
pub mod command_handlers;
pub mod context;
pub mod locks;
pub mod policy;
pub mod query_handlers;

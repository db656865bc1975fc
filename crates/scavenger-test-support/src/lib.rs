//! Shared test doubles and fixtures for the Scavenger hunt engine.

mod clock;
mod fixtures;
mod repository;

pub use clock::FixedClock;
pub use fixtures::{campus_tour, inactive_hunt, reversed, stop, text_hunt};
pub use repository::{
    AppendCall, EmptyEventRepository, FailingEventRepository, RecordingEventRepository,
};

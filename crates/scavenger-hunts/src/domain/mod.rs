//! Domain model for hunt definitions.

pub mod clue;
pub mod document;
pub mod hunt;

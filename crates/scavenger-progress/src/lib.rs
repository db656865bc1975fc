//! Scavenger — Progress Tracker and Clue Dispatcher.
//!
//! Owns the per-(student, hunt) progress record: the state machine from
//! `NotStarted` through `InProgress(i)` to `Completed`, attempts, scores and
//! pending image reviews. Also runs the submission pipeline and decides which
//! clue a student sees next.

pub mod application;
pub mod domain;

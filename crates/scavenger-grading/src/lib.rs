//! Scavenger — Answer validation and scoring.
//!
//! Decides whether a submission answers a stop, dispatching on the stop's
//! answer kind, and turns correct answers into points.

pub mod domain;

//! Validation outcomes.

use serde::{Deserialize, Serialize};

/// Three-way result of validating a submission.
///
/// Only `Correct` advances progress. `PendingReview` is a valid outcome,
/// not an error: the student stays at the stop until a reviewer decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The answer matches.
    Correct,
    /// The answer does not match.
    Incorrect,
    /// A human reviewer must grade the submission.
    PendingReview,
}

/// A verdict plus the points it is worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// The verdict.
    pub verdict: Verdict,
    /// The stop's points on `Correct`, zero otherwise.
    pub score_delta: u32,
}

impl Evaluation {
    /// Evaluation for a verdict at a stop worth `points`.
    #[must_use]
    pub fn new(verdict: Verdict, points: u32) -> Self {
        let score_delta = match verdict {
            Verdict::Correct => points,
            Verdict::Incorrect | Verdict::PendingReview => 0,
        };
        Self {
            verdict,
            score_delta,
        }
    }
}

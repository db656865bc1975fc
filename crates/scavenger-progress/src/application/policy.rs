//! Tunable grading behaviour.

use scavenger_grading::domain::scoring::ScoringPolicy;
use scavenger_grading::domain::validator::AnswerValidator;

/// Scoring, hint and validation settings applied by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct ProgressPolicy {
    /// Points awarded per correct answer.
    pub scoring: ScoringPolicy,
    /// Attempts a student must make at a stop before its hint is shown.
    /// Zero shows hints immediately.
    pub hint_after_attempts: u32,
    /// Validator used for submissions.
    pub validator: AnswerValidator,
}

impl ProgressPolicy {
    /// Whether the hint of a stop with `attempts` graded submissions is shown.
    #[must_use]
    pub fn reveals_hint(&self, attempts: u32) -> bool {
        attempts >= self.hint_after_attempts
    }
}

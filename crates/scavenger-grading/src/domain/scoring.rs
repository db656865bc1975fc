//! Scoring policy.

use serde::{Deserialize, Serialize};

/// Multipliers used by the classroom app: full marks on the first try,
/// half on the second, a tenth on the third and nothing afterwards.
pub const CLASSROOM_DECAY: [f64; 3] = [1.0, 0.5, 0.1];

/// How many points a correct answer earns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Always award the stop's full points.
    #[default]
    Flat,
    /// Scale the stop's points by `multipliers[attempt - 1]`; attempts past
    /// the end of the list earn nothing.
    AttemptDecay {
        /// Per-attempt multipliers, clamped to `0.0..=1.0`.
        multipliers: Vec<f64>,
    },
}

impl ScoringPolicy {
    /// Attempt decay with [`CLASSROOM_DECAY`].
    #[must_use]
    pub fn classroom_decay() -> Self {
        Self::AttemptDecay {
            multipliers: CLASSROOM_DECAY.to_vec(),
        }
    }

    /// Points for a correct answer worth `points`, given on the
    /// one-based `attempt`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn award(&self, points: u32, attempt: u32) -> u32 {
        match self {
            Self::Flat => points,
            Self::AttemptDecay { multipliers } => {
                let multiplier = attempt
                    .checked_sub(1)
                    .and_then(|i| multipliers.get(i as usize))
                    .copied()
                    .filter(|m| m.is_finite())
                    .map_or(0.0, |m| m.clamp(0.0, 1.0));
                // Product never exceeds `points`, so the cast is lossless.
                (f64::from(points) * multiplier).floor() as u32
            }
        }
    }
}

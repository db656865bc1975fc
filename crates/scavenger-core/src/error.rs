//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
///
/// `NotFound`, `InvalidInput` and `InvalidState` are final and must not be
/// retried. `Busy` and `ConcurrencyConflict` are transient; callers retry
/// them with backoff.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An unknown hunt, stop, student or submission was referenced.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up.
        entity: &'static str,
        /// Identifier used for the lookup.
        id: String,
    },

    /// A malformed submission, negative score delta or out-of-range choice.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation is not allowed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The per-pair progress lock could not be acquired in time.
    #[error("busy: {0}")]
    Busy(String),

    /// Optimistic concurrency conflict.
    #[error(
        "concurrency conflict on aggregate {aggregate_id}: \
         expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Shorthand for [`DomainError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether the caller should retry the operation after a backoff.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Busy(_) | Self::ConcurrencyConflict { .. })
    }
}

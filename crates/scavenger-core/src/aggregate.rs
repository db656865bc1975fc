//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::DomainEvent;

/// Trait for aggregate roots that reconstitute from event history.
///
/// `version` counts only events that came from the store. Events raised
/// by command handling mutate state immediately but stay uncommitted until
/// the handler persists them, so `version` is the expected version for the
/// next append.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the current version (number of stored events applied).
    fn version(&self) -> i64;

    /// Apply a stored event to mutate internal state (used during
    /// reconstitution).
    fn apply(&mut self, event: &Self::Event);

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Clears uncommitted events after persistence, counting them into
    /// `version`.
    fn clear_uncommitted_events(&mut self);
}

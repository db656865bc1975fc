//! Command abstractions.

use uuid::Uuid;

use crate::key::ProgressKey;

/// Trait that all commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this command through the system.
    fn correlation_id(&self) -> Uuid;

    /// The progress record this command mutates. Commands for the same key
    /// are serialized.
    fn target(&self) -> ProgressKey;
}

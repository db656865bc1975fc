//! Collaborators shared by progress handlers.

use scavenger_core::clock::Clock;
use scavenger_core::repository::EventRepository;
use scavenger_hunts::application::catalog::HuntCatalog;

use super::locks::ProgressLocks;
use super::policy::ProgressPolicy;

/// Everything a progress handler needs, borrowed from the caller.
#[derive(Clone, Copy)]
pub struct ProgressContext<'a> {
    /// Published hunts.
    pub catalog: &'a dyn HuntCatalog,
    /// Progress event streams.
    pub repo: &'a dyn EventRepository,
    /// Source of event timestamps.
    pub clock: &'a dyn Clock,
    /// Per-pair write locks.
    pub locks: &'a ProgressLocks,
    /// Scoring, hint and validation settings.
    pub policy: &'a ProgressPolicy,
}

//! Shared application state.

use std::sync::Arc;

use scavenger_core::clock::Clock;
use scavenger_core::repository::EventRepository;
use scavenger_hunts::application::catalog::HuntCatalog;
use scavenger_progress::application::context::ProgressContext;
use scavenger_progress::application::locks::ProgressLocks;
use scavenger_progress::application::policy::ProgressPolicy;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Published hunts.
    pub catalog: Arc<dyn HuntCatalog>,
    /// Progress event streams.
    pub event_repository: Arc<dyn EventRepository>,
    /// Clock for event timestamps.
    pub clock: Arc<dyn Clock>,
    /// Per-pair write locks.
    pub locks: Arc<ProgressLocks>,
    /// Scoring, hint and validation settings.
    pub policy: Arc<ProgressPolicy>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn HuntCatalog>,
        event_repository: Arc<dyn EventRepository>,
        clock: Arc<dyn Clock>,
        locks: ProgressLocks,
        policy: ProgressPolicy,
    ) -> Self {
        Self {
            catalog,
            event_repository,
            clock,
            locks: Arc::new(locks),
            policy: Arc::new(policy),
        }
    }

    /// Borrows the collaborators progress handlers need.
    #[must_use]
    pub fn progress_context(&self) -> ProgressContext<'_> {
        ProgressContext {
            catalog: self.catalog.as_ref(),
            repo: self.event_repository.as_ref(),
            clock: self.clock.as_ref(),
            locks: &self.locks,
            policy: &self.policy,
        }
    }
}

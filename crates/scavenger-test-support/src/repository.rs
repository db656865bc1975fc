//! Event repository doubles.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use scavenger_core::error::DomainError;
use scavenger_core::repository::{EventRepository, StoredEvent};
use uuid::Uuid;

/// One recorded `append_events` call.
pub type AppendCall = (Uuid, i64, Vec<StoredEvent>);

/// Repository that replays a seeded history plus everything appended since,
/// and records each append call. It performs no version check.
#[derive(Debug, Default)]
pub struct RecordingEventRepository {
    history: Mutex<Vec<StoredEvent>>,
    appended: Mutex<Vec<AppendCall>>,
}

impl RecordingEventRepository {
    /// Creates a repository whose streams start with `seed`.
    #[must_use]
    pub fn new(seed: Vec<StoredEvent>) -> Self {
        Self {
            history: Mutex::new(seed),
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of every append call, oldest first.
    #[must_use]
    pub fn appended_events(&self) -> Vec<AppendCall> {
        self.appended
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Event types of all appended events, in append order.
    #[must_use]
    pub fn appended_event_types(&self) -> Vec<String> {
        self.appended_events()
            .into_iter()
            .flat_map(|(_, _, events)| events)
            .map(|e| e.event_type)
            .collect()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect())
    }

    async fn load_events_by_type(&self, event_type: &str) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(events);
        self.appended
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((aggregate_id, expected_version, events.to_vec()));
        Ok(())
    }
}

/// Repository with no history that silently accepts appends.
#[derive(Debug)]
pub struct EmptyEventRepository;

#[async_trait]
impl EventRepository for EmptyEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn load_events_by_type(
        &self,
        _event_type: &str,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Repository whose every call fails with an infrastructure error.
#[derive(Debug)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("database unavailable".into()))
    }

    async fn load_events_by_type(
        &self,
        _event_type: &str,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("database unavailable".into()))
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("database unavailable".into()))
    }
}

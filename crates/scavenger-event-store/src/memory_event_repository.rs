//! In-memory implementation of the `EventRepository` trait.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use scavenger_core::error::DomainError;
use scavenger_core::repository::{EventRepository, StoredEvent};

/// Event repository that keeps every stream in process memory.
///
/// Used when no `DATABASE_URL` is configured. Streams are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    streams: RwLock<HashMap<Uuid, Vec<StoredEvent>>>,
}

impl InMemoryEventRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> DomainError {
        DomainError::Infrastructure("event stream lock poisoned".into())
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let streams = self.streams.read().map_err(|_| Self::poisoned())?;
        Ok(streams.get(&aggregate_id).cloned().unwrap_or_default())
    }

    async fn load_events_by_type(&self, event_type: &str) -> Result<Vec<StoredEvent>, DomainError> {
        let streams = self.streams.read().map_err(|_| Self::poisoned())?;
        let mut events: Vec<StoredEvent> = streams
            .values()
            .flatten()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.occurred_at, e.aggregate_id, e.sequence_number));
        Ok(events)
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        let mut streams = self.streams.write().map_err(|_| Self::poisoned())?;
        let stream = streams.entry(aggregate_id).or_default();
        let actual = stream.last().map_or(0, |e| e.sequence_number);
        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }
        stream.extend_from_slice(events);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_stored_event(aggregate_id: Uuid, sequence_number: i64) -> StoredEvent {
        StoredEvent {
            event_id: Uuid::new_v4(),
            aggregate_id,
            event_type: "progress.started".to_owned(),
            payload: serde_json::json!({"key": "value"}),
            sequence_number,
            correlation_id: Uuid::new_v4(),
            causation_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_load_events_returns_empty_vec_for_unknown_stream() {
        let repo = InMemoryEventRepository::new();

        let events = repo.load_events(Uuid::new_v4()).await.unwrap();

        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_appended_events_load_in_sequence_order() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let aggregate_id = Uuid::new_v4();

        // Act
        repo.append_events(
            aggregate_id,
            0,
            &[
                make_stored_event(aggregate_id, 1),
                make_stored_event(aggregate_id, 2),
            ],
        )
        .await
        .unwrap();
        repo.append_events(aggregate_id, 2, &[make_stored_event(aggregate_id, 3)])
            .await
            .unwrap();

        // Assert
        let loaded = repo.load_events(aggregate_id).await.unwrap();
        let sequence: Vec<i64> = loaded.iter().map(|e| e.sequence_number).collect();
        assert_eq!(sequence, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_stale_expected_version_is_a_concurrency_conflict() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let aggregate_id = Uuid::new_v4();
        repo.append_events(aggregate_id, 0, &[make_stored_event(aggregate_id, 1)])
            .await
            .unwrap();

        // Act
        let result = repo
            .append_events(aggregate_id, 0, &[make_stored_event(aggregate_id, 1)])
            .await;

        // Assert
        match result.unwrap_err() {
            DomainError::ConcurrencyConflict {
                aggregate_id: id,
                expected,
                actual,
            } => {
                assert_eq!(id, aggregate_id);
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("expected ConcurrencyConflict, got {other:?}"),
        }
        assert_eq!(repo.load_events(aggregate_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_events_by_type_spans_streams() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let agg_a = Uuid::new_v4();
        let agg_b = Uuid::new_v4();
        let mut other = make_stored_event(agg_a, 2);
        other.event_type = "progress.stop_advanced".to_owned();
        repo.append_events(agg_a, 0, &[make_stored_event(agg_a, 1), other])
            .await
            .unwrap();
        repo.append_events(agg_b, 0, &[make_stored_event(agg_b, 1)])
            .await
            .unwrap();

        // Act
        let started = repo.load_events_by_type("progress.started").await.unwrap();

        // Assert
        assert_eq!(started.len(), 2);
        assert!(started.iter().all(|e| e.event_type == "progress.started"));
        assert!(started.iter().any(|e| e.aggregate_id == agg_b));
    }

    #[tokio::test]
    async fn test_streams_are_isolated() {
        let repo = InMemoryEventRepository::new();
        let agg_a = Uuid::new_v4();
        let agg_b = Uuid::new_v4();

        repo.append_events(agg_a, 0, &[make_stored_event(agg_a, 1)])
            .await
            .unwrap();

        assert_eq!(repo.load_events(agg_a).await.unwrap().len(), 1);
        assert!(repo.load_events(agg_b).await.unwrap().is_empty());
    }
}

//! `PostgreSQL` implementation of the `EventRepository` trait.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, warn};
use uuid::Uuid;

use scavenger_core::error::DomainError;
use scavenger_core::repository::{EventRepository, StoredEvent};

/// Postgres error code for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed event repository.
#[derive(Debug, Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    /// Creates a new `PgEventRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the workspace migrations (the `domain_events` table).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if a migration fails.
    pub async fn migrate(&self) -> Result<(), DomainError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::Infrastructure(format!("migration failed: {e}")))
    }
}

fn infrastructure(err: &sqlx::Error) -> DomainError {
    DomainError::Infrastructure(err.to_string())
}

fn row_to_stored_event(row: &PgRow) -> Result<StoredEvent, sqlx::Error> {
    Ok(StoredEvent {
        event_id: row.try_get("event_id")?,
        aggregate_id: row.try_get("aggregate_id")?,
        event_type: row.try_get("event_type")?,
        payload: row.try_get("payload")?,
        sequence_number: row.try_get("sequence_number")?,
        correlation_id: row.try_get("correlation_id")?,
        causation_id: row.try_get("causation_id")?,
        occurred_at: row.try_get("occurred_at")?,
    })
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let rows = sqlx::query(
            r"SELECT event_id, aggregate_id, event_type, payload, sequence_number,
                     correlation_id, causation_id, occurred_at
              FROM domain_events
              WHERE aggregate_id = $1
              ORDER BY sequence_number ASC",
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infrastructure(&e))?;

        rows.iter()
            .map(row_to_stored_event)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| infrastructure(&e))
    }

    async fn load_events_by_type(&self, event_type: &str) -> Result<Vec<StoredEvent>, DomainError> {
        let rows = sqlx::query(
            r"SELECT event_id, aggregate_id, event_type, payload, sequence_number,
                     correlation_id, causation_id, occurred_at
              FROM domain_events
              WHERE event_type = $1
              ORDER BY occurred_at ASC, aggregate_id ASC, sequence_number ASC",
        )
        .bind(event_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infrastructure(&e))?;

        rows.iter()
            .map(row_to_stored_event)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| infrastructure(&e))
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(|e| infrastructure(&e))?;

        let actual: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sequence_number), 0) FROM domain_events WHERE aggregate_id = $1",
        )
        .bind(aggregate_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| infrastructure(&e))?;

        if actual != expected_version {
            warn!(%aggregate_id, expected_version, actual, "stale append rejected");
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        for event in events {
            let inserted = sqlx::query(
                r"INSERT INTO domain_events
                    (event_id, aggregate_id, event_type, payload, sequence_number,
                     correlation_id, causation_id, occurred_at)
                  VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(event.event_id)
            .bind(event.aggregate_id)
            .bind(&event.event_type)
            .bind(&event.payload)
            .bind(event.sequence_number)
            .bind(event.correlation_id)
            .bind(event.causation_id)
            .bind(event.occurred_at)
            .execute(&mut *tx)
            .await;

            if let Err(err) = inserted {
                // A concurrent writer claimed the same sequence number between
                // our version check and the insert.
                let is_unique_violation = err
                    .as_database_error()
                    .and_then(|db| db.code())
                    .is_some_and(|code| code == UNIQUE_VIOLATION);
                if is_unique_violation {
                    return Err(DomainError::ConcurrencyConflict {
                        aggregate_id,
                        expected: expected_version,
                        actual: event.sequence_number,
                    });
                }
                return Err(infrastructure(&err));
            }
        }

        tx.commit().await.map_err(|e| infrastructure(&e))?;
        debug!(%aggregate_id, count = events.len(), "appended events");
        Ok(())
    }
}

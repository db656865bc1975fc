//! Per-pair serialization of progress mutations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use scavenger_core::error::DomainError;
use scavenger_core::key::ProgressKey;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::warn;

/// How long a mutation waits for its pair by default.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(2);

/// Idle slots are pruned once the registry holds more than this many keys.
const PRUNE_THRESHOLD: usize = 1024;

/// Proof that the holder is the only writer for a (student, hunt) pair.
/// Released on drop.
#[derive(Debug)]
pub struct ProgressGuard {
    _guard: OwnedMutexGuard<()>,
}

/// Registry of one async mutex per (student, hunt) pair.
#[derive(Debug)]
pub struct ProgressLocks {
    slots: Mutex<HashMap<ProgressKey, Arc<AsyncMutex<()>>>>,
    wait: Duration,
}

impl Default for ProgressLocks {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_WAIT)
    }
}

impl ProgressLocks {
    /// Creates a registry whose acquisitions wait at most `wait`.
    #[must_use]
    pub fn new(wait: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            wait,
        }
    }

    fn slot(&self, key: ProgressKey) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots.len() > PRUNE_THRESHOLD {
            // Only the map holds an idle slot.
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        }
        Arc::clone(slots.entry(key).or_default())
    }

    /// Waits for exclusive access to `key`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Busy` if the pair stays locked longer than the
    /// configured wait.
    pub async fn acquire(&self, key: ProgressKey) -> Result<ProgressGuard, DomainError> {
        let slot = self.slot(key);
        match tokio::time::timeout(self.wait, slot.lock_owned()).await {
            Ok(guard) => Ok(ProgressGuard { _guard: guard }),
            Err(_) => {
                warn!(%key, wait_ms = self.wait.as_millis(), "progress lock wait timed out");
                Err(DomainError::Busy(format!(
                    "progress for {key} is being updated; retry shortly"
                )))
            }
        }
    }

    /// Number of pairs currently tracked.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn key() -> ProgressKey {
        ProgressKey::new(Uuid::new_v4(), Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_second_acquire_times_out_as_busy() {
        // Arrange
        let locks = ProgressLocks::new(Duration::from_millis(20));
        let key = key();
        let _held = locks.acquire(key).await.unwrap();

        // Act
        let result = locks.acquire(key).await;

        // Assert
        assert!(matches!(result, Err(DomainError::Busy(_))));
    }

    #[tokio::test]
    async fn test_lock_is_released_on_drop() {
        let locks = ProgressLocks::new(Duration::from_millis(20));
        let key = key();

        drop(locks.acquire(key).await.unwrap());
        let again = locks.acquire(key).await;

        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_distinct_pairs_do_not_contend() {
        let locks = ProgressLocks::new(Duration::from_millis(20));

        let _first = locks.acquire(key()).await.unwrap();
        let second = locks.acquire(key()).await;

        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_idle_slots_are_pruned() {
        let locks = ProgressLocks::new(Duration::from_millis(20));
        let held_key = key();
        let _held = locks.acquire(held_key).await.unwrap();

        for _ in 0..=PRUNE_THRESHOLD {
            drop(locks.acquire(key()).await.unwrap());
        }
        drop(locks.acquire(key()).await.unwrap());

        assert!(locks.tracked() < PRUNE_THRESHOLD);
        assert!(matches!(
            locks.acquire(held_key).await,
            Err(DomainError::Busy(_))
        ));
    }
}

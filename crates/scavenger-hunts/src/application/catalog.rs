//! Read-only access to published hunts.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use scavenger_core::error::DomainError;
use tracing::info;
use uuid::Uuid;

use crate::domain::hunt::{Hunt, Stop};

/// The Hunt Definition Store as seen by the progression core.
#[async_trait]
pub trait HuntCatalog: Send + Sync {
    /// Looks up a hunt by id.
    async fn get_hunt(&self, hunt_id: Uuid) -> Result<Arc<Hunt>, DomainError>;

    /// Hunts students may start, ordered by title.
    async fn list_active(&self) -> Result<Vec<Arc<Hunt>>, DomainError>;

    /// Resolves a scanned QR token to its hunt and stop.
    async fn find_stop_by_token(&self, qr_token: &str) -> Result<(Arc<Hunt>, Stop), DomainError>;

    /// Looks up the stop at `index` within a hunt.
    ///
    /// Unknown hunts fail with `NotFound`; negative or out-of-range indices
    /// with `InvalidState`.
    async fn get_stop(&self, hunt_id: Uuid, index: i64) -> Result<Stop, DomainError> {
        let hunt = self.get_hunt(hunt_id).await?;
        hunt.get_stop(index).cloned()
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    hunts: HashMap<Uuid, Arc<Hunt>>,
    /// QR token -> (hunt id, stop position).
    tokens: HashMap<String, (Uuid, u32)>,
}

/// Catalog held in process memory, filled by the authoring side through
/// [`InMemoryHuntCatalog::publish`].
#[derive(Debug, Default)]
pub struct InMemoryHuntCatalog {
    state: RwLock<CatalogState>,
}

impl InMemoryHuntCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding `hunts`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidInput` if two hunts share a QR token.
    pub fn with_hunts(hunts: impl IntoIterator<Item = Hunt>) -> Result<Self, DomainError> {
        let catalog = Self::new();
        for hunt in hunts {
            catalog.publish(hunt)?;
        }
        Ok(catalog)
    }

    /// Publishes or replaces a hunt and re-indexes its QR tokens.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidInput` if a token is owned by another hunt.
    pub fn publish(&self, hunt: Hunt) -> Result<(), DomainError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;

        for stop in hunt.stops() {
            if let Some((owner, _)) = state.tokens.get(&stop.qr_token) {
                if *owner != hunt.id {
                    return Err(DomainError::InvalidInput(format!(
                        "QR token {:?} already belongs to hunt {owner}",
                        stop.qr_token
                    )));
                }
            }
        }

        state.tokens.retain(|_, (owner, _)| *owner != hunt.id);
        for stop in hunt.stops() {
            state
                .tokens
                .insert(stop.qr_token.clone(), (hunt.id, stop.position));
        }
        info!(hunt_id = %hunt.id, stops = hunt.stop_count(), title = %hunt.title, "published hunt");
        state.hunts.insert(hunt.id, Arc::new(hunt));
        Ok(())
    }

    /// Number of published hunts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().map_or(0, |state| state.hunts.len())
    }

    /// Whether no hunt is published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> DomainError {
    DomainError::Infrastructure("hunt catalog lock poisoned".into())
}

#[async_trait]
impl HuntCatalog for InMemoryHuntCatalog {
    async fn get_hunt(&self, hunt_id: Uuid) -> Result<Arc<Hunt>, DomainError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        state
            .hunts
            .get(&hunt_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("hunt", hunt_id))
    }

    async fn list_active(&self) -> Result<Vec<Arc<Hunt>>, DomainError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let mut active: Vec<Arc<Hunt>> = state
            .hunts
            .values()
            .filter(|hunt| hunt.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(active)
    }

    async fn find_stop_by_token(&self, qr_token: &str) -> Result<(Arc<Hunt>, Stop), DomainError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let (hunt_id, position) = state
            .tokens
            .get(qr_token)
            .copied()
            .ok_or_else(|| DomainError::not_found("qr token", qr_token))?;
        let hunt = state
            .hunts
            .get(&hunt_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("hunt", hunt_id))?;
        let stop = hunt
            .stop_at(position)
            .cloned()
            .ok_or_else(|| DomainError::not_found("stop", qr_token))?;
        Ok((hunt, stop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hunt::tests::text_stop;

    fn hunt(stops: Vec<Stop>) -> Hunt {
        Hunt::new(
            Uuid::new_v4(),
            "Campus tour".to_owned(),
            String::new(),
            Uuid::new_v4(),
            true,
            stops,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_hunt_returns_not_found_for_unknown_id() {
        let catalog = InMemoryHuntCatalog::new();
        let hunt_id = Uuid::new_v4();

        match catalog.get_hunt(hunt_id).await.unwrap_err() {
            DomainError::NotFound { entity, id } => {
                assert_eq!(entity, "hunt");
                assert_eq!(id, hunt_id.to_string());
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_stop_distinguishes_unknown_hunt_from_bad_index() {
        // Arrange
        let hunt = hunt(vec![text_stop(0, "paris")]);
        let hunt_id = hunt.id;
        let catalog = InMemoryHuntCatalog::with_hunts([hunt]).unwrap();

        // Act / Assert
        assert_eq!(catalog.get_stop(hunt_id, 0).await.unwrap().position, 0);
        assert!(matches!(
            catalog.get_stop(Uuid::new_v4(), 0).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            catalog.get_stop(hunt_id, -1).await,
            Err(DomainError::InvalidState(_))
        ));
        assert!(matches!(
            catalog.get_stop(hunt_id, 1).await,
            Err(DomainError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_list_active_skips_inactive_hunts() {
        // Arrange
        let mut closed = hunt(vec![text_stop(0, "paris")]);
        closed.is_active = false;
        let mut second = text_stop(0, "rome");
        second.qr_token = "rome-gate".to_owned();
        let open = Hunt::new(
            Uuid::new_v4(),
            "Art walk".to_owned(),
            String::new(),
            Uuid::new_v4(),
            true,
            vec![second],
        )
        .unwrap();
        let open_id = open.id;
        let catalog = InMemoryHuntCatalog::with_hunts([closed, open]).unwrap();

        // Act
        let active = catalog.list_active().await.unwrap();

        // Assert
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, open_id);
    }

    #[tokio::test]
    async fn test_find_stop_by_token_resolves_scanned_code() {
        let hunt = hunt(vec![text_stop(0, "paris"), text_stop(1, "rome")]);
        let hunt_id = hunt.id;
        let catalog = InMemoryHuntCatalog::with_hunts([hunt]).unwrap();

        let (found, stop) = catalog.find_stop_by_token("token-1").await.unwrap();

        assert_eq!(found.id, hunt_id);
        assert_eq!(stop.position, 1);
        assert!(matches!(
            catalog.find_stop_by_token("nope").await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_publish_rejects_token_owned_by_another_hunt() {
        let catalog = InMemoryHuntCatalog::with_hunts([hunt(vec![text_stop(0, "paris")])]).unwrap();

        let result = catalog.publish(hunt(vec![text_stop(0, "rome")]));

        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
        assert_eq!(catalog.len(), 1);
    }

    #[tokio::test]
    async fn test_republishing_a_hunt_drops_its_old_tokens() {
        // Arrange
        let original = hunt(vec![text_stop(0, "paris")]);
        let hunt_id = original.id;
        let catalog = InMemoryHuntCatalog::with_hunts([original]).unwrap();
        let mut renamed = text_stop(0, "paris");
        renamed.qr_token = "gate".to_owned();
        let revised = Hunt::new(
            hunt_id,
            "Campus tour".to_owned(),
            String::new(),
            Uuid::new_v4(),
            true,
            vec![renamed],
        )
        .unwrap();

        // Act
        catalog.publish(revised).unwrap();

        // Assert
        assert!(catalog.find_stop_by_token("token-0").await.is_err());
        assert_eq!(catalog.find_stop_by_token("gate").await.unwrap().0.id, hunt_id);
    }
}

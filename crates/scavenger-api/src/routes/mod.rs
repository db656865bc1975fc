//! Route modules.

pub mod health;
pub mod hunts;
pub mod progress;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, Response};
    use chrono::{TimeZone, Utc};
    use http_body_util::BodyExt;
    use scavenger_core::repository::EventRepository;
    use scavenger_event_store::memory_event_repository::InMemoryEventRepository;
    use scavenger_hunts::application::catalog::InMemoryHuntCatalog;
    use scavenger_hunts::domain::hunt::Hunt;
    use scavenger_progress::application::locks::ProgressLocks;
    use scavenger_progress::application::policy::ProgressPolicy;
    use scavenger_test_support::FixedClock;
    use serde_json::Value;

    use crate::state::AppState;

    pub(crate) fn state_with(hunts: Vec<Hunt>, repo: Arc<dyn EventRepository>) -> AppState {
        AppState::new(
            Arc::new(InMemoryHuntCatalog::with_hunts(hunts).unwrap()),
            repo,
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap())),
            ProgressLocks::default(),
            ProgressPolicy::default(),
        )
    }

    pub(crate) fn state(hunts: Vec<Hunt>) -> AppState {
        state_with(hunts, Arc::new(InMemoryEventRepository::new()))
    }

    pub(crate) fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    pub(crate) fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    pub(crate) async fn json_body(response: Response<Body>) -> Value {
        let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body_bytes).unwrap()
    }
}

//! Routes for the Hunt Definition Store.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};
use scavenger_hunts::domain::clue::ClueView;
use scavenger_hunts::domain::hunt::{AnswerKind, Hunt};
use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// One stop of a hunt summary.
#[derive(Debug, Serialize)]
pub struct StopSummary {
    /// Stop identifier.
    pub id: Uuid,
    /// Zero-based position.
    pub position: u32,
    /// Where the stop is.
    pub location_label: String,
    /// Answer kind.
    pub kind: AnswerKind,
    /// Points available.
    pub points: u32,
}

/// A hunt without its answers.
#[derive(Debug, Serialize)]
pub struct HuntOverview {
    /// Hunt identifier.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Owning teacher.
    pub teacher_id: Uuid,
    /// Whether the hunt can be started.
    pub is_active: bool,
    /// Stop count.
    pub total_stops: u32,
    /// Sum of all stop points.
    pub max_score: u64,
    /// Stops in play order.
    pub stops: Vec<StopSummary>,
}

impl From<&Hunt> for HuntOverview {
    fn from(hunt: &Hunt) -> Self {
        Self {
            id: hunt.id,
            title: hunt.title.clone(),
            description: hunt.description.clone(),
            teacher_id: hunt.teacher_id,
            is_active: hunt.is_active,
            total_stops: hunt.stop_count(),
            max_score: hunt.max_score(),
            stops: hunt
                .stops()
                .iter()
                .map(|stop| StopSummary {
                    id: stop.id,
                    position: stop.position,
                    location_label: stop.location_label.clone(),
                    kind: stop.answer.kind(),
                    points: stop.points,
                })
                .collect(),
        }
    }
}

/// Response for a scanned QR code.
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    /// The hunt the code belongs to.
    pub hunt_id: Uuid,
    /// Its title.
    pub hunt_title: String,
    /// The stop the code marks.
    pub stop: ClueView,
}

/// GET /
#[instrument(skip(state))]
async fn list_hunts(State(state): State<AppState>) -> Result<Json<Vec<HuntOverview>>, ApiError> {
    let hunts = state.catalog.list_active().await?;
    debug!(count = hunts.len(), "listed active hunts");
    Ok(Json(hunts.iter().map(|hunt| HuntOverview::from(hunt.as_ref())).collect()))
}

/// GET /{hunt_id}
#[instrument(skip(state))]
async fn get_hunt(
    State(state): State<AppState>,
    Path(hunt_id): Path<Uuid>,
) -> Result<Json<HuntOverview>, ApiError> {
    let hunt = state.catalog.get_hunt(hunt_id).await?;
    Ok(Json(HuntOverview::from(hunt.as_ref())))
}

/// GET /{hunt_id}/stops/{index}
#[instrument(skip(state))]
async fn get_stop(
    State(state): State<AppState>,
    Path((hunt_id, index)): Path<(Uuid, i64)>,
) -> Result<Json<ClueView>, ApiError> {
    let hunt = state.catalog.get_hunt(hunt_id).await?;
    let stop = hunt.get_stop(index)?;
    Ok(Json(stop.to_clue_view(hunt.id, hunt.stop_count(), true)))
}

/// GET /scan/{qr_token}
#[instrument(skip(state))]
async fn scan(
    State(state): State<AppState>,
    Path(qr_token): Path<String>,
) -> Result<Json<ScanResponse>, ApiError> {
    let (hunt, stop) = state.catalog.find_stop_by_token(&qr_token).await?;
    debug!(hunt_id = %hunt.id, position = stop.position, "resolved qr token");
    Ok(Json(ScanResponse {
        hunt_id: hunt.id,
        hunt_title: hunt.title.clone(),
        stop: stop.to_clue_view(hunt.id, hunt.stop_count(), true),
    }))
}

/// Returns the router for hunt lookups.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_hunts))
        .route("/scan/{qr_token}", get(scan))
        .route("/{hunt_id}", get(get_hunt))
        .route("/{hunt_id}/stops/{index}", get(get_stop))
}

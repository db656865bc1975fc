//! Routes for the Progress Tracker and Clue Dispatcher.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use scavenger_core::command::Command;
use scavenger_core::key::ProgressKey;
use scavenger_grading::domain::submission::AnswerPayload;
use scavenger_progress::application::clue_dispatcher::NextClue;
use scavenger_progress::application::command_handlers::{
    self, ReviewOutcome, SubmissionOutcome,
};
use scavenger_progress::application::query_handlers::{self, HuntResults, ProgressView};
use scavenger_progress::domain::commands;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /start and POST /advance.
#[derive(Debug, Deserialize)]
pub struct PairRequest {
    /// The student.
    pub student_id: Uuid,
    /// The hunt.
    pub hunt_id: Uuid,
}

/// Request body for POST /submit-answer.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    /// The student.
    pub student_id: Uuid,
    /// The hunt.
    pub hunt_id: Uuid,
    /// The stop being answered.
    pub stop_id: Uuid,
    /// The answer.
    pub answer: AnswerPayload,
}

/// Request body for POST /finalize-review.
#[derive(Debug, Deserialize)]
pub struct FinalizeReviewRequest {
    /// The student.
    pub student_id: Uuid,
    /// The hunt.
    pub hunt_id: Uuid,
    /// The submission under review.
    pub submission_id: Uuid,
    /// The reviewer's decision.
    pub approved: bool,
}

/// Request body for POST /record-score.
#[derive(Debug, Deserialize)]
pub struct RecordScoreRequest {
    /// The student.
    pub student_id: Uuid,
    /// The hunt.
    pub hunt_id: Uuid,
    /// Points to add.
    pub delta: i64,
}

/// POST /start
#[instrument(
    skip(state, request),
    fields(student_id = %request.student_id, hunt_id = %request.hunt_id)
)]
async fn start(
    State(state): State<AppState>,
    Json(request): Json<PairRequest>,
) -> Result<Json<ProgressView>, ApiError> {
    let command = commands::StartHunt {
        correlation_id: Uuid::new_v4(),
        student_id: request.student_id,
        hunt_id: request.hunt_id,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let view =
        command_handlers::handle_start_hunt(&command, &state.progress_context()).await?;
    Ok(Json(view))
}

/// POST /submit-answer
#[instrument(
    skip(state, request),
    fields(
        student_id = %request.student_id,
        hunt_id = %request.hunt_id,
        stop_id = %request.stop_id
    )
)]
async fn submit_answer(
    State(state): State<AppState>,
    Json(request): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmissionOutcome>, ApiError> {
    let command = commands::SubmitAnswer {
        correlation_id: Uuid::new_v4(),
        student_id: request.student_id,
        hunt_id: request.hunt_id,
        stop_id: request.stop_id,
        answer: request.answer,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        kind = %command.answer.kind(),
        "handling command"
    );

    let outcome =
        command_handlers::handle_submit_answer(&command, &state.progress_context()).await?;
    Ok(Json(outcome))
}

/// POST /finalize-review
#[instrument(
    skip(state, request),
    fields(
        student_id = %request.student_id,
        hunt_id = %request.hunt_id,
        submission_id = %request.submission_id
    )
)]
async fn finalize_review(
    State(state): State<AppState>,
    Json(request): Json<FinalizeReviewRequest>,
) -> Result<Json<ReviewOutcome>, ApiError> {
    let command = commands::FinalizeReview {
        correlation_id: Uuid::new_v4(),
        student_id: request.student_id,
        hunt_id: request.hunt_id,
        submission_id: request.submission_id,
        approved: request.approved,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        approved = command.approved,
        "handling command"
    );

    let outcome =
        command_handlers::handle_finalize_review(&command, &state.progress_context()).await?;
    Ok(Json(outcome))
}

/// POST /advance
#[instrument(
    skip(state, request),
    fields(student_id = %request.student_id, hunt_id = %request.hunt_id)
)]
async fn advance(
    State(state): State<AppState>,
    Json(request): Json<PairRequest>,
) -> Result<Json<ProgressView>, ApiError> {
    let command = commands::AdvanceProgress {
        correlation_id: Uuid::new_v4(),
        student_id: request.student_id,
        hunt_id: request.hunt_id,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let view = command_handlers::handle_advance(&command, &state.progress_context()).await?;
    Ok(Json(view))
}

/// POST /record-score
#[instrument(
    skip(state, request),
    fields(student_id = %request.student_id, hunt_id = %request.hunt_id)
)]
async fn record_score(
    State(state): State<AppState>,
    Json(request): Json<RecordScoreRequest>,
) -> Result<Json<ProgressView>, ApiError> {
    let command = commands::RecordScore {
        correlation_id: Uuid::new_v4(),
        student_id: request.student_id,
        hunt_id: request.hunt_id,
        delta: request.delta,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        delta = command.delta,
        "handling command"
    );

    let view =
        command_handlers::handle_record_score(&command, &state.progress_context()).await?;
    Ok(Json(view))
}

/// GET /{hunt_id}/students/{student_id}
#[instrument(skip(state))]
async fn get_progress(
    State(state): State<AppState>,
    Path((hunt_id, student_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ProgressView>, ApiError> {
    let key = ProgressKey::new(student_id, hunt_id);
    let view = query_handlers::get_progress(key, &state.progress_context()).await?;
    Ok(Json(view))
}

/// GET /{hunt_id}/students/{student_id}/next-clue
#[instrument(skip(state))]
async fn next_clue(
    State(state): State<AppState>,
    Path((hunt_id, student_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<NextClue>, ApiError> {
    let key = ProgressKey::new(student_id, hunt_id);
    let clue = query_handlers::next_clue(key, &state.progress_context()).await?;
    Ok(Json(clue))
}

/// GET /{hunt_id}/results
#[instrument(skip(state))]
async fn results(
    State(state): State<AppState>,
    Path(hunt_id): Path<Uuid>,
) -> Result<Json<HuntResults>, ApiError> {
    let results = query_handlers::hunt_results(hunt_id, &state.progress_context()).await?;
    Ok(Json(results))
}

/// Returns the router for progress commands and queries.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(start))
        .route("/submit-answer", post(submit_answer))
        .route("/finalize-review", post(finalize_review))
        .route("/advance", post(advance))
        .route("/record-score", post(record_score))
        .route("/{hunt_id}/results", get(results))
        .route("/{hunt_id}/students/{student_id}", get(get_progress))
        .route("/{hunt_id}/students/{student_id}/next-clue", get(next_clue))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::http::StatusCode;
    use scavenger_hunts::domain::hunt::Hunt;
    use scavenger_test_support::{FailingEventRepository, campus_tour, inactive_hunt};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::routes::test_support::{get, json_body, post_json, state, state_with};

    async fn send(
        app: &Router,
        request: axum::http::Request<axum::body::Body>,
    ) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, json_body(response).await)
    }

    fn app_for(hunt: &Hunt) -> Router {
        router().with_state(state(vec![hunt.clone()]))
    }

    #[tokio::test]
    async fn test_start_returns_in_progress_view() {
        // Arrange
        let hunt = campus_tour();
        let app = app_for(&hunt);
        let body = json!({ "student_id": Uuid::new_v4(), "hunt_id": hunt.id });

        // Act
        let (status, json) = send(&app, post_json("/start", &body)).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"]["state"], "in_progress");
        assert_eq!(json["status"]["current_index"], 0);
        assert_eq!(json["total_stops"], 3);
    }

    #[tokio::test]
    async fn test_start_inactive_hunt_returns_409() {
        let hunt = inactive_hunt();
        let app = app_for(&hunt);
        let body = json!({ "student_id": Uuid::new_v4(), "hunt_id": hunt.id });

        let (status, json) = send(&app, post_json("/start", &body)).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], "invalid_state");
    }

    #[tokio::test]
    async fn test_full_hunt_over_http() {
        // Arrange
        let hunt = campus_tour();
        let app = app_for(&hunt);
        let student_id = Uuid::new_v4();
        let submit = |position: usize, answer: Value| {
            post_json(
                "/submit-answer",
                &json!({
                    "student_id": student_id,
                    "hunt_id": hunt.id,
                    "stop_id": hunt.stops()[position].id,
                    "answer": answer,
                }),
            )
        };

        // Act
        let (_, first) = send(&app, submit(0, json!({ "kind": "text", "text": " Paris " }))).await;
        let (_, second) = send(
            &app,
            submit(1, json!({ "kind": "multiple_choice", "choice": 1 })),
        )
        .await;
        let (_, third) = send(
            &app,
            submit(
                2,
                json!({
                    "kind": "image",
                    "artifact": { "reference": "abc.jpg", "content_type": "image/jpeg" }
                }),
            ),
        )
        .await;
        let (review_status, review) = send(
            &app,
            post_json(
                "/finalize-review",
                &json!({
                    "student_id": student_id,
                    "hunt_id": hunt.id,
                    "submission_id": third["submission_id"],
                    "approved": true,
                }),
            ),
        )
        .await;
        let (clue_status, clue) = send(
            &app,
            get(&format!("/{}/students/{student_id}/next-clue", hunt.id)),
        )
        .await;

        // Assert
        assert_eq!(first["verdict"], "correct");
        assert_eq!(first["next_clue"]["position"], 1);
        assert_eq!(second["verdict"], "correct");
        assert_eq!(third["verdict"], "pending_review");
        assert_eq!(third["next_clue"]["awaiting_review"], true);
        assert_eq!(review_status, StatusCode::OK);
        assert_eq!(review["total_score"], 30);
        assert_eq!(clue_status, StatusCode::OK);
        assert_eq!(clue["status"], "hunt_complete");
        assert_eq!(clue["final_score"], 30);
    }

    #[tokio::test]
    async fn test_out_of_range_choice_returns_400() {
        let hunt = campus_tour();
        let app = app_for(&hunt);
        let student_id = Uuid::new_v4();
        send(
            &app,
            post_json(
                "/submit-answer",
                &json!({
                    "student_id": student_id,
                    "hunt_id": hunt.id,
                    "stop_id": hunt.stops()[0].id,
                    "answer": { "kind": "text", "text": "paris" },
                }),
            ),
        )
        .await;

        let (status, json) = send(
            &app,
            post_json(
                "/submit-answer",
                &json!({
                    "student_id": student_id,
                    "hunt_id": hunt.id,
                    "stop_id": hunt.stops()[1].id,
                    "answer": { "kind": "multiple_choice", "choice": 5 },
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_input");
    }

    #[tokio::test]
    async fn test_get_progress_for_new_student_is_not_started() {
        let hunt = campus_tour();
        let app = app_for(&hunt);

        let (status, json) = send(
            &app,
            get(&format!("/{}/students/{}", hunt.id, Uuid::new_v4())),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"]["state"], "not_started");
        assert_eq!(json["score"], 0);
    }

    #[tokio::test]
    async fn test_record_score_rejects_negative_delta() {
        let hunt = campus_tour();
        let app = app_for(&hunt);
        let student_id = Uuid::new_v4();
        send(
            &app,
            post_json("/start", &json!({ "student_id": student_id, "hunt_id": hunt.id })),
        )
        .await;

        let (status, json) = send(
            &app,
            post_json(
                "/record-score",
                &json!({ "student_id": student_id, "hunt_id": hunt.id, "delta": -5 }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_input");
    }

    #[tokio::test]
    async fn test_advance_before_start_returns_409() {
        let hunt = campus_tour();
        let app = app_for(&hunt);

        let (status, _) = send(
            &app,
            post_json("/advance", &json!({ "student_id": Uuid::new_v4(), "hunt_id": hunt.id })),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_start_returns_500_when_repository_fails() {
        let hunt = campus_tour();
        let app =
            router().with_state(state_with(vec![hunt.clone()], Arc::new(FailingEventRepository)));

        let (status, json) = send(
            &app,
            post_json("/start", &json!({ "student_id": Uuid::new_v4(), "hunt_id": hunt.id })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "infrastructure_error");
    }

    #[tokio::test]
    async fn test_submit_answer_returns_422_for_unknown_answer_kind() {
        let hunt = campus_tour();
        let app = app_for(&hunt);
        let body = json!({
            "student_id": Uuid::new_v4(),
            "hunt_id": hunt.id,
            "stop_id": hunt.stops()[0].id,
            "answer": { "kind": "audio" },
        });

        let response = app.oneshot(post_json("/submit-answer", &body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_results_lists_students_who_started() {
        // Arrange
        let hunt = campus_tour();
        let app = app_for(&hunt);
        let student_id = Uuid::new_v4();
        send(
            &app,
            post_json(
                "/submit-answer",
                &json!({
                    "student_id": student_id,
                    "hunt_id": hunt.id,
                    "stop_id": hunt.stops()[0].id,
                    "answer": { "kind": "text", "text": "paris" },
                }),
            ),
        )
        .await;

        // Act
        let (status, json) = send(&app, get(&format!("/{}/results", hunt.id))).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["max_score"], 30);
        let students = json["students"].as_array().unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0]["student_id"], student_id.to_string());
        assert_eq!(students[0]["summary"]["final_score"], 10);
        assert_eq!(students[0]["summary"]["stops_completed"], 1);
    }

    #[tokio::test]
    async fn test_results_for_unknown_hunt_returns_404() {
        let app = app_for(&campus_tour());

        let (status, _) = send(&app, get(&format!("/{}/results", Uuid::new_v4()))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

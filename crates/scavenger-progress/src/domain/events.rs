//! Domain events for the Progress Tracker.

use scavenger_core::error::DomainError;
use scavenger_core::event::{DomainEvent, EventMetadata};
use scavenger_grading::domain::submission::{AnswerPayload, ArtifactRef};
use scavenger_grading::domain::verdict::Verdict;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emitted when a student begins a hunt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressStarted {
    /// The student playing.
    pub student_id: Uuid,
    /// The hunt being played.
    pub hunt_id: Uuid,
    /// Stop layout captured at start.
    pub layout_fingerprint: String,
    /// Number of stops at start.
    pub total_stops: u32,
}

/// Emitted for every submission graded at the active stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecorded {
    /// Identifies this submission.
    pub submission_id: Uuid,
    /// The stop answered.
    pub stop_id: Uuid,
    /// Position of the stop.
    pub position: u32,
    /// One-based attempt number at this stop.
    pub attempt: u32,
    /// The raw answer.
    pub answer: AnswerPayload,
    /// What the validator decided.
    pub verdict: Verdict,
}

/// Emitted when an image submission is handed to a reviewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequested {
    /// The submission awaiting review.
    pub submission_id: Uuid,
    /// The stop answered.
    pub stop_id: Uuid,
    /// Position of the stop.
    pub position: u32,
    /// Attempt number of the submission.
    pub attempt: u32,
    /// The uploaded photo.
    pub artifact: ArtifactRef,
}

/// Emitted when a reviewer decides on a pending image submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewResolved {
    /// The reviewed submission.
    pub submission_id: Uuid,
    /// Position of the stop.
    pub position: u32,
    /// Whether the photo was accepted.
    pub approved: bool,
}

/// Emitted when points are added to the running score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecorded {
    /// Stop the points were earned at, if any.
    pub position: Option<u32>,
    /// Points added.
    pub delta: u64,
}

/// Emitted when a stop is completed and the next one becomes active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopAdvanced {
    /// The stop just completed.
    pub completed_position: u32,
    /// The stop now active.
    pub next_position: u32,
}

/// Emitted when the final stop is completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HuntCompleted {
    /// The final stop.
    pub completed_position: u32,
    /// Score at completion.
    pub final_score: u64,
}

/// Stored type of the first event in every progress stream.
pub const PROGRESS_STARTED: &str = "progress.started";

/// Event payload variants for the Progress Tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProgressEventKind {
    /// The hunt was started.
    ProgressStarted(ProgressStarted),
    /// A submission was graded.
    AnswerRecorded(AnswerRecorded),
    /// A photo awaits review.
    ReviewRequested(ReviewRequested),
    /// A reviewer decided.
    ReviewResolved(ReviewResolved),
    /// Points were added.
    ScoreRecorded(ScoreRecorded),
    /// The next stop became active.
    StopAdvanced(StopAdvanced),
    /// The hunt was completed.
    HuntCompleted(HuntCompleted),
}

impl ProgressEventKind {
    /// Stored event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ProgressStarted(_) => PROGRESS_STARTED,
            Self::AnswerRecorded(_) => "progress.answer_recorded",
            Self::ReviewRequested(_) => "progress.review_requested",
            Self::ReviewResolved(_) => "progress.review_resolved",
            Self::ScoreRecorded(_) => "progress.score_recorded",
            Self::StopAdvanced(_) => "progress.stop_advanced",
            Self::HuntCompleted(_) => "progress.hunt_completed",
        }
    }
}

/// Domain event envelope for the Progress Tracker.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: ProgressEventKind,
}

impl DomainEvent for ProgressEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> Result<serde_json::Value, DomainError> {
        serde_json::to_value(&self.kind)
            .map_err(|e| DomainError::Infrastructure(format!("event serialization failed: {e}")))
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

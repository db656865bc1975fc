//! Query handlers for the Progress Tracker.
//!
//! Queries reconstitute the aggregate without taking the pair lock and
//! never create anything.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use scavenger_core::aggregate::AggregateRoot;
use scavenger_core::error::DomainError;
use scavenger_core::key::ProgressKey;
use scavenger_hunts::domain::hunt::Hunt;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::clue_dispatcher::{HuntSummary, NextClue, dispatch, summarize};
use super::command_handlers::{decode_kind, load};
use super::context::ProgressContext;
use crate::domain::aggregates::{HuntProgress, PendingReview, ProgressStatus};
use crate::domain::events::{PROGRESS_STARTED, ProgressEventKind};

/// A completed stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedStopView {
    /// Stop position.
    pub position: u32,
    /// When it was completed.
    pub completed_at: DateTime<Utc>,
    /// Points earned there.
    pub points: u64,
    /// Graded submissions there.
    pub attempts: u32,
}

/// Read-only view of a progress record.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressView {
    /// The student.
    pub student_id: Uuid,
    /// The hunt.
    pub hunt_id: Uuid,
    /// Current state.
    pub status: ProgressStatus,
    /// Position of the active stop (stop count once completed).
    pub current_index: u32,
    /// Stops in the hunt.
    pub total_stops: u32,
    /// Cumulative score.
    pub score: u64,
    /// Sum of all stop points.
    pub max_score: u64,
    /// Completed stops in position order.
    pub completed_stops: Vec<CompletedStopView>,
    /// Image submission awaiting review.
    pub pending_review: Option<PendingReview>,
    /// When the hunt was started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the hunt was completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Stored events in the stream.
    pub version: i64,
}

impl ProgressView {
    pub(crate) fn new(hunt: &Hunt, progress: &HuntProgress) -> Self {
        let completed_stops = progress
            .stop_records()
            .iter()
            .filter_map(|(position, record)| {
                record.completed_at.map(|completed_at| CompletedStopView {
                    position: *position,
                    completed_at,
                    points: record.points,
                    attempts: record.attempts,
                })
            })
            .collect();

        Self {
            student_id: progress.key.student_id,
            hunt_id: progress.key.hunt_id,
            status: progress.status(),
            current_index: progress.current_index(),
            total_stops: hunt.stop_count(),
            score: progress.score(),
            max_score: hunt.max_score(),
            completed_stops,
            pending_review: progress.pending_review().cloned(),
            started_at: progress.started_at(),
            completed_at: progress.completed_at(),
            version: progress.version(),
        }
    }
}

/// One student's standing in a hunt.
#[derive(Debug, Clone, Serialize)]
pub struct StudentResult {
    /// The student.
    pub student_id: Uuid,
    /// Where the student stands.
    pub status: ProgressStatus,
    /// Score and per-stop marks against the hunt as published now.
    pub summary: HuntSummary,
    /// The stops were reordered after this student started, so the marks
    /// may not line up with the current stops.
    pub layout_changed: bool,
}

/// Every student's standing in one hunt.
#[derive(Debug, Clone, Serialize)]
pub struct HuntResults {
    /// The hunt.
    pub hunt_id: Uuid,
    /// Hunt title.
    pub title: String,
    /// Sum of all stop points.
    pub max_score: u64,
    /// Most recently completed first, then students still playing.
    pub students: Vec<StudentResult>,
}

/// Reads the progress of a student through a hunt. A pair with no history
/// reports `not_started`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for an unknown hunt,
/// `DomainError::InvalidState` if the stops changed since the student
/// started, plus repository and decoding errors.
pub async fn get_progress(
    key: ProgressKey,
    ctx: &ProgressContext<'_>,
) -> Result<ProgressView, DomainError> {
    let hunt = ctx.catalog.get_hunt(key.hunt_id).await?;
    let progress = load(key, ctx.repo).await?;
    progress.ensure_layout(&hunt)?;
    Ok(ProgressView::new(&hunt, &progress))
}

/// Returns the clue a student should see next, or the completion summary.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for an unknown hunt or one without stops,
/// `DomainError::InvalidState` if the stops changed since the student
/// started, plus repository and decoding errors.
pub async fn next_clue(
    key: ProgressKey,
    ctx: &ProgressContext<'_>,
) -> Result<NextClue, DomainError> {
    let hunt = ctx.catalog.get_hunt(key.hunt_id).await?;
    let progress = load(key, ctx.repo).await?;
    progress.ensure_layout(&hunt)?;
    dispatch(&hunt, &progress, ctx.policy)
}

/// Lists every student who started `hunt_id` with their score and marks.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for an unknown hunt, plus repository and
/// decoding errors.
pub async fn hunt_results(
    hunt_id: Uuid,
    ctx: &ProgressContext<'_>,
) -> Result<HuntResults, DomainError> {
    let hunt = ctx.catalog.get_hunt(hunt_id).await?;

    let mut student_ids = BTreeSet::new();
    for stored in ctx.repo.load_events_by_type(PROGRESS_STARTED).await? {
        if let ProgressEventKind::ProgressStarted(started) = decode_kind(&stored)? {
            if started.hunt_id == hunt_id {
                student_ids.insert(started.student_id);
            }
        }
    }

    let mut students = Vec::with_capacity(student_ids.len());
    for student_id in student_ids {
        let progress = load(ProgressKey::new(student_id, hunt_id), ctx.repo).await?;
        students.push(StudentResult {
            student_id,
            status: progress.status(),
            summary: summarize(&hunt, &progress),
            layout_changed: progress.ensure_layout(&hunt).is_err(),
        });
    }
    students.sort_by(|a, b| b.summary.completed_at.cmp(&a.summary.completed_at));
    debug!(%hunt_id, students = students.len(), "hunt results read");

    Ok(HuntResults {
        hunt_id,
        title: hunt.title.clone(),
        max_score: hunt.max_score(),
        students,
    })
}

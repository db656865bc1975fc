//! Command handlers for the Progress Tracker.
//!
//! Every handler takes the pair's lock, reconstitutes the aggregate from its
//! stream, applies the command and appends the raised events with the
//! loaded version as the expected version.

use scavenger_core::aggregate::AggregateRoot;
use scavenger_core::command::Command;
use scavenger_core::error::DomainError;
use scavenger_core::event::{DomainEvent, EventMetadata};
use scavenger_core::key::ProgressKey;
use scavenger_core::repository::{EventRepository, StoredEvent};
use scavenger_grading::domain::submission::AnswerPayload;
use scavenger_grading::domain::verdict::Verdict;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::clue_dispatcher::{NextClue, dispatch};
use super::context::ProgressContext;
use super::query_handlers::ProgressView;
use crate::domain::aggregates::HuntProgress;
use crate::domain::commands::{
    AdvanceProgress, FinalizeReview, RecordScore, StartHunt, SubmitAnswer,
};
use crate::domain::events::{ProgressEvent, ProgressEventKind};

/// Result of one graded submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    /// Identifies the submission; needed to finalize an image review.
    pub submission_id: Uuid,
    /// What the validator decided.
    pub verdict: Verdict,
    /// Points added to the score by this submission.
    pub points_awarded: u64,
    /// Score after the submission.
    pub total_score: u64,
    /// One-based attempt number at the stop.
    pub attempt: u32,
    /// The stop's hint, returned on an incorrect answer once unlocked.
    pub hint: Option<String>,
    /// Where to go next, returned on a correct answer.
    pub next_location_hint: Option<String>,
    /// The clue the student sees now.
    pub next_clue: NextClue,
}

/// Result of a reviewer decision.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    /// The reviewed submission.
    pub submission_id: Uuid,
    /// Whether the photo was accepted.
    pub approved: bool,
    /// Points added to the score.
    pub points_awarded: u64,
    /// Score after the decision.
    pub total_score: u64,
    /// The clue the student sees now.
    pub next_clue: NextClue,
}

fn to_stored_event(event: &ProgressEvent) -> Result<StoredEvent, DomainError> {
    let meta = event.metadata();
    Ok(StoredEvent {
        event_id: meta.event_id,
        aggregate_id: meta.aggregate_id,
        event_type: event.event_type().to_owned(),
        payload: event.to_payload()?,
        sequence_number: meta.sequence_number,
        correlation_id: meta.correlation_id,
        causation_id: meta.causation_id,
        occurred_at: meta.occurred_at,
    })
}

/// Decodes the payload of a stored progress event.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the payload is not a progress
/// event.
pub(crate) fn decode_kind(stored: &StoredEvent) -> Result<ProgressEventKind, DomainError> {
    serde_json::from_value(stored.payload.clone()).map_err(|e| {
        DomainError::Infrastructure(format!(
            "cannot decode {} event {}: {e}",
            stored.event_type, stored.event_id
        ))
    })
}

/// Rebuilds a `HuntProgress` from its stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if an event payload cannot be
/// decoded.
pub(crate) fn reconstitute(
    key: ProgressKey,
    existing_events: &[StoredEvent],
) -> Result<HuntProgress, DomainError> {
    let mut progress = HuntProgress::new(key);
    for stored in existing_events {
        let kind = decode_kind(stored)?;
        let event = ProgressEvent {
            metadata: EventMetadata {
                event_id: stored.event_id,
                event_type: stored.event_type.clone(),
                aggregate_id: stored.aggregate_id,
                sequence_number: stored.sequence_number,
                correlation_id: stored.correlation_id,
                causation_id: stored.causation_id,
                occurred_at: stored.occurred_at,
            },
            kind,
        };
        progress.apply(&event);
    }
    Ok(progress)
}

/// Loads the progress record for `key`.
///
/// # Errors
///
/// Propagates repository and decoding errors.
pub(crate) async fn load(
    key: ProgressKey,
    repo: &dyn EventRepository,
) -> Result<HuntProgress, DomainError> {
    let existing_events = repo.load_events(key.stream_id()).await?;
    reconstitute(key, &existing_events)
}

async fn persist(
    progress: &mut HuntProgress,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let stored_events = progress
        .uncommitted_events()
        .iter()
        .map(to_stored_event)
        .collect::<Result<Vec<_>, _>>()?;
    if !stored_events.is_empty() {
        repo.append_events(progress.id, progress.version(), &stored_events)
            .await?;
        progress.clear_uncommitted_events();
    }
    Ok(stored_events)
}

/// Starts a hunt for a student, or returns the existing record.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for an unknown hunt or one without stops,
/// `DomainError::InvalidState` for an inactive hunt or a changed layout,
/// `DomainError::Busy` if the pair stays locked, and repository errors.
pub async fn handle_start_hunt(
    command: &StartHunt,
    ctx: &ProgressContext<'_>,
) -> Result<ProgressView, DomainError> {
    let key = command.target();
    let _guard = ctx.locks.acquire(key).await?;
    let hunt = ctx.catalog.get_hunt(key.hunt_id).await?;
    let mut progress = load(key, ctx.repo).await?;

    if progress.start(&hunt, command.correlation_id, ctx.clock)? {
        info!(%key, total_stops = hunt.stop_count(), "hunt started");
    } else {
        progress.ensure_layout(&hunt)?;
    }
    persist(&mut progress, ctx.repo).await?;

    Ok(ProgressView::new(&hunt, &progress))
}

/// Runs the submission pipeline: grades the answer at the active stop,
/// records the attempt, and on a correct answer scores and advances.
///
/// # Errors
///
/// Returns `DomainError::InvalidState` if the stop is not the active one,
/// the hunt is completed, a review is pending or the layout changed;
/// `DomainError::InvalidInput` for a malformed answer; `DomainError::Busy`
/// if the pair stays locked; plus lookup and repository errors.
pub async fn handle_submit_answer(
    command: &SubmitAnswer,
    ctx: &ProgressContext<'_>,
) -> Result<SubmissionOutcome, DomainError> {
    let key = command.target();
    let correlation_id = command.correlation_id;
    let _guard = ctx.locks.acquire(key).await?;
    let hunt = ctx.catalog.get_hunt(key.hunt_id).await?;
    let mut progress = load(key, ctx.repo).await?;

    progress.start(&hunt, correlation_id, ctx.clock)?;
    progress.ensure_layout(&hunt)?;
    let position = progress.active_position()?;
    let stop = hunt.get_stop(i64::from(position))?;
    if stop.id != command.stop_id {
        return Err(DomainError::InvalidState(format!(
            "stop {} is not the active stop for {key}",
            command.stop_id
        )));
    }
    if let Some(pending) = progress.pending_review() {
        return Err(DomainError::InvalidState(format!(
            "submission {} at stop {} is awaiting review",
            pending.submission_id, pending.position
        )));
    }

    let evaluation = ctx.policy.validator.validate(stop, &command.answer)?;
    let submission_id = Uuid::new_v4();
    let attempt = progress.record_answer(
        submission_id,
        stop,
        command.answer.clone(),
        evaluation.verdict,
        correlation_id,
        ctx.clock,
    )?;

    let mut points_awarded = 0;
    match evaluation.verdict {
        Verdict::Correct => {
            let awarded = ctx.policy.scoring.award(stop.points, attempt);
            progress.record_score(Some(position), i64::from(awarded), correlation_id, ctx.clock)?;
            points_awarded = u64::from(awarded);
            progress.advance(correlation_id, ctx.clock)?;
        }
        Verdict::PendingReview => {
            if let AnswerPayload::Image { artifact } = &command.answer {
                progress.request_review(
                    submission_id,
                    stop,
                    artifact.clone(),
                    attempt,
                    correlation_id,
                    ctx.clock,
                )?;
            }
        }
        Verdict::Incorrect => {}
    }

    persist(&mut progress, ctx.repo).await?;
    info!(
        %key,
        position,
        attempt,
        verdict = ?evaluation.verdict,
        points_awarded,
        total_score = progress.score(),
        "submission graded"
    );

    let hint = match evaluation.verdict {
        Verdict::Incorrect if ctx.policy.reveals_hint(attempt) => stop.hint.clone(),
        _ => None,
    };
    let next_location_hint = match evaluation.verdict {
        Verdict::Correct => stop.next_location_hint.clone(),
        _ => None,
    };

    Ok(SubmissionOutcome {
        submission_id,
        verdict: evaluation.verdict,
        points_awarded,
        total_score: progress.score(),
        attempt,
        hint,
        next_location_hint,
        next_clue: dispatch(&hunt, &progress, ctx.policy)?,
    })
}

/// Applies a reviewer's decision on a pending image submission. Approval
/// scores the stop and advances; rejection lets the student resubmit.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no review is pending for the
/// submission, `DomainError::InvalidState` if the layout changed,
/// `DomainError::Busy` if the pair stays locked, plus repository errors.
pub async fn handle_finalize_review(
    command: &FinalizeReview,
    ctx: &ProgressContext<'_>,
) -> Result<ReviewOutcome, DomainError> {
    let key = command.target();
    let correlation_id = command.correlation_id;
    let _guard = ctx.locks.acquire(key).await?;
    let hunt = ctx.catalog.get_hunt(key.hunt_id).await?;
    let mut progress = load(key, ctx.repo).await?;

    progress.ensure_layout(&hunt)?;
    let pending = progress.resolve_review(
        command.submission_id,
        command.approved,
        correlation_id,
        ctx.clock,
    )?;

    let mut points_awarded = 0;
    if command.approved {
        let stop = hunt.get_stop(i64::from(pending.position))?;
        let awarded = ctx.policy.scoring.award(stop.points, pending.attempt);
        progress.record_score(
            Some(pending.position),
            i64::from(awarded),
            correlation_id,
            ctx.clock,
        )?;
        points_awarded = u64::from(awarded);
        progress.advance(correlation_id, ctx.clock)?;
    }

    persist(&mut progress, ctx.repo).await?;
    info!(
        %key,
        submission_id = %command.submission_id,
        approved = command.approved,
        points_awarded,
        "review finalized"
    );

    Ok(ReviewOutcome {
        submission_id: command.submission_id,
        approved: command.approved,
        points_awarded,
        total_score: progress.score(),
        next_clue: dispatch(&hunt, &progress, ctx.policy)?,
    })
}

/// Moves a student past the active stop. A no-op once completed.
///
/// # Errors
///
/// Returns `DomainError::InvalidState` if the hunt has not been started or
/// the layout changed, `DomainError::Busy` if the pair stays locked, plus
/// lookup and repository errors.
pub async fn handle_advance(
    command: &AdvanceProgress,
    ctx: &ProgressContext<'_>,
) -> Result<ProgressView, DomainError> {
    let key = command.target();
    let _guard = ctx.locks.acquire(key).await?;
    let hunt = ctx.catalog.get_hunt(key.hunt_id).await?;
    let mut progress = load(key, ctx.repo).await?;

    progress.ensure_layout(&hunt)?;
    let status = progress.advance(command.correlation_id, ctx.clock)?;
    let stored = persist(&mut progress, ctx.repo).await?;
    debug!(%key, ?status, events = stored.len(), "advance handled");

    Ok(ProgressView::new(&hunt, &progress))
}

/// Adds points to a student's score.
///
/// # Errors
///
/// Returns `DomainError::InvalidInput` for a negative delta,
/// `DomainError::InvalidState` if the hunt has not been started or the
/// layout changed, `DomainError::Busy` if the pair stays locked, plus
/// lookup and repository errors.
pub async fn handle_record_score(
    command: &RecordScore,
    ctx: &ProgressContext<'_>,
) -> Result<ProgressView, DomainError> {
    let key = command.target();
    let _guard = ctx.locks.acquire(key).await?;
    let hunt = ctx.catalog.get_hunt(key.hunt_id).await?;
    let mut progress = load(key, ctx.repo).await?;

    progress.ensure_layout(&hunt)?;
    let total = progress.record_score(None, command.delta, command.correlation_id, ctx.clock)?;
    persist(&mut progress, ctx.repo).await?;
    info!(%key, delta = command.delta, total, "score recorded");

    Ok(ProgressView::new(&hunt, &progress))
}

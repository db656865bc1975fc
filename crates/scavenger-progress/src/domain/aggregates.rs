//! The `HuntProgress` aggregate.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use scavenger_core::aggregate::AggregateRoot;
use scavenger_core::clock::Clock;
use scavenger_core::error::DomainError;
use scavenger_core::event::EventMetadata;
use scavenger_core::key::ProgressKey;
use scavenger_grading::domain::submission::{AnswerPayload, ArtifactRef};
use scavenger_grading::domain::verdict::Verdict;
use scavenger_hunts::domain::hunt::{Hunt, Stop};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::{
    AnswerRecorded, HuntCompleted, ProgressEvent, ProgressEventKind, ProgressStarted,
    ReviewRequested, ReviewResolved, ScoreRecorded, StopAdvanced,
};

/// Where a student stands in a hunt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProgressStatus {
    /// Nothing recorded yet.
    NotStarted,
    /// Working on the stop at `current_index`.
    InProgress {
        /// Position of the active stop.
        current_index: u32,
    },
    /// Every stop answered. Terminal.
    Completed,
}

/// An image submission waiting for a reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingReview {
    /// The submission under review.
    pub submission_id: Uuid,
    /// The stop it answers.
    pub stop_id: Uuid,
    /// Position of that stop.
    pub position: u32,
    /// Attempt number of the submission.
    pub attempt: u32,
    /// The uploaded photo.
    pub artifact: ArtifactRef,
    /// When the review was requested.
    pub requested_at: DateTime<Utc>,
}

/// Per-stop bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StopRecord {
    /// Submissions graded at this stop.
    pub attempts: u32,
    /// Points earned at this stop.
    pub points: u64,
    /// When the stop was completed.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Progress of one student through one hunt.
#[derive(Debug)]
pub struct HuntProgress {
    /// Aggregate identifier, derived from `key`.
    pub id: Uuid,
    /// The (student, hunt) pair.
    pub key: ProgressKey,
    /// Number of stored events applied.
    pub(crate) version: i64,
    pub(crate) status: ProgressStatus,
    pub(crate) total_stops: u32,
    pub(crate) layout_fingerprint: Option<String>,
    pub(crate) score: u64,
    pub(crate) stops: BTreeMap<u32, StopRecord>,
    pub(crate) pending_review: Option<PendingReview>,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) completed_at: Option<DateTime<Utc>>,
    uncommitted_events: Vec<ProgressEvent>,
}

impl HuntProgress {
    /// Creates an empty, not-started progress record.
    #[must_use]
    pub fn new(key: ProgressKey) -> Self {
        Self {
            id: key.stream_id(),
            key,
            version: 0,
            status: ProgressStatus::NotStarted,
            total_stops: 0,
            layout_fingerprint: None,
            score: 0,
            stops: BTreeMap::new(),
            pending_review: None,
            started_at: None,
            completed_at: None,
            uncommitted_events: Vec::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn status(&self) -> ProgressStatus {
        self.status
    }

    /// Position of the active stop. `NotStarted` reads as 0 and `Completed`
    /// as the stop count.
    #[must_use]
    pub fn current_index(&self) -> u32 {
        match self.status {
            ProgressStatus::NotStarted => 0,
            ProgressStatus::InProgress { current_index } => current_index,
            ProgressStatus::Completed => self.total_stops,
        }
    }

    /// Cumulative score.
    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Stop count captured at start.
    #[must_use]
    pub fn total_stops(&self) -> u32 {
        self.total_stops
    }

    /// The submission awaiting review, if any.
    #[must_use]
    pub fn pending_review(&self) -> Option<&PendingReview> {
        self.pending_review.as_ref()
    }

    /// Per-stop records keyed by position.
    #[must_use]
    pub fn stop_records(&self) -> &BTreeMap<u32, StopRecord> {
        &self.stops
    }

    /// Submissions graded at `position` so far.
    #[must_use]
    pub fn attempts_at(&self, position: u32) -> u32 {
        self.stops.get(&position).map_or(0, |r| r.attempts)
    }

    /// When the hunt was started.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// When the hunt was completed.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Whether the final stop has been completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == ProgressStatus::Completed
    }

    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn raise(&mut self, kind: ProgressEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = ProgressEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                aggregate_id: self.id,
                sequence_number: self.next_sequence_number(),
                correlation_id,
                causation_id: correlation_id,
                occurred_at: clock.now(),
            },
            kind,
        };
        self.mutate(&event);
        self.uncommitted_events.push(event);
    }

    fn mutate(&mut self, event: &ProgressEvent) {
        let at = event.metadata.occurred_at;
        match &event.kind {
            ProgressEventKind::ProgressStarted(payload) => {
                self.status = ProgressStatus::InProgress { current_index: 0 };
                self.total_stops = payload.total_stops;
                self.layout_fingerprint = Some(payload.layout_fingerprint.clone());
                self.started_at = Some(at);
            }
            ProgressEventKind::AnswerRecorded(payload) => {
                let record = self.stops.entry(payload.position).or_default();
                record.attempts = record.attempts.max(payload.attempt);
            }
            ProgressEventKind::ReviewRequested(payload) => {
                self.pending_review = Some(PendingReview {
                    submission_id: payload.submission_id,
                    stop_id: payload.stop_id,
                    position: payload.position,
                    attempt: payload.attempt,
                    artifact: payload.artifact.clone(),
                    requested_at: at,
                });
            }
            ProgressEventKind::ReviewResolved(_) => {
                self.pending_review = None;
            }
            ProgressEventKind::ScoreRecorded(payload) => {
                self.score = self.score.saturating_add(payload.delta);
                if let Some(position) = payload.position {
                    let record = self.stops.entry(position).or_default();
                    record.points = record.points.saturating_add(payload.delta);
                }
            }
            ProgressEventKind::StopAdvanced(payload) => {
                self.stops
                    .entry(payload.completed_position)
                    .or_default()
                    .completed_at = Some(at);
                // Never move backwards, even on a malformed history.
                let current_index = payload.next_position.max(self.current_index());
                self.status = ProgressStatus::InProgress { current_index };
                self.pending_review = None;
            }
            ProgressEventKind::HuntCompleted(payload) => {
                self.stops
                    .entry(payload.completed_position)
                    .or_default()
                    .completed_at = Some(at);
                self.status = ProgressStatus::Completed;
                self.completed_at = Some(at);
                self.pending_review = None;
            }
        }
    }

    /// Starts the hunt, capturing its layout. A no-op once started.
    ///
    /// Returns whether a `progress.started` event was raised.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` if the hunt is inactive and
    /// `DomainError::NotFound` if it has no stops.
    pub fn start(
        &mut self,
        hunt: &Hunt,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<bool, DomainError> {
        if self.status != ProgressStatus::NotStarted {
            return Ok(false);
        }
        if !hunt.is_active {
            return Err(DomainError::InvalidState(format!(
                "hunt {} is not active",
                hunt.id
            )));
        }
        if hunt.stop_count() == 0 {
            return Err(DomainError::not_found("stop", format!("hunt {} has no stops", hunt.id)));
        }

        self.raise(
            ProgressEventKind::ProgressStarted(ProgressStarted {
                student_id: self.key.student_id,
                hunt_id: self.key.hunt_id,
                layout_fingerprint: hunt.layout_fingerprint(),
                total_stops: hunt.stop_count(),
            }),
            correlation_id,
            clock,
        );
        Ok(true)
    }

    /// Fails if the hunt's stops changed since this student started.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` on a layout mismatch.
    pub fn ensure_layout(&self, hunt: &Hunt) -> Result<(), DomainError> {
        match &self.layout_fingerprint {
            Some(captured) if *captured != hunt.layout_fingerprint() => {
                Err(DomainError::InvalidState(format!(
                    "stops of hunt {} changed while {} was playing",
                    hunt.id, self.key
                )))
            }
            _ => Ok(()),
        }
    }

    /// Position of the stop currently accepting answers.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` unless the hunt is in progress.
    pub fn active_position(&self) -> Result<u32, DomainError> {
        match self.status {
            ProgressStatus::InProgress { current_index } => Ok(current_index),
            ProgressStatus::NotStarted => Err(DomainError::InvalidState(format!(
                "{} has not started the hunt",
                self.key
            ))),
            ProgressStatus::Completed => Err(DomainError::InvalidState(format!(
                "{} has already completed the hunt",
                self.key
            ))),
        }
    }

    /// Records a graded submission at the active stop and returns its
    /// one-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` if `stop` is not the active stop.
    pub fn record_answer(
        &mut self,
        submission_id: Uuid,
        stop: &Stop,
        answer: AnswerPayload,
        verdict: Verdict,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<u32, DomainError> {
        let position = self.active_position()?;
        if stop.position != position {
            return Err(DomainError::InvalidState(format!(
                "stop {} is not the active stop ({position}) for {}",
                stop.position, self.key
            )));
        }

        let attempt = self.attempts_at(position) + 1;
        self.raise(
            ProgressEventKind::AnswerRecorded(AnswerRecorded {
                submission_id,
                stop_id: stop.id,
                position,
                attempt,
                answer,
                verdict,
            }),
            correlation_id,
            clock,
        );
        Ok(attempt)
    }

    /// Parks an image submission for a reviewer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` if a review is already pending or
    /// `stop` is not the active stop.
    pub fn request_review(
        &mut self,
        submission_id: Uuid,
        stop: &Stop,
        artifact: ArtifactRef,
        attempt: u32,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if let Some(pending) = &self.pending_review {
            return Err(DomainError::InvalidState(format!(
                "submission {} is already awaiting review",
                pending.submission_id
            )));
        }
        if self.active_position()? != stop.position {
            return Err(DomainError::InvalidState(format!(
                "stop {} is not the active stop for {}",
                stop.position, self.key
            )));
        }

        self.raise(
            ProgressEventKind::ReviewRequested(ReviewRequested {
                submission_id,
                stop_id: stop.id,
                position: stop.position,
                attempt,
                artifact,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Closes the pending review for `submission_id` and returns it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if no review is pending for that
    /// submission.
    pub fn resolve_review(
        &mut self,
        submission_id: Uuid,
        approved: bool,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<PendingReview, DomainError> {
        let pending = self
            .pending_review
            .clone()
            .filter(|p| p.submission_id == submission_id)
            .ok_or_else(|| DomainError::not_found("pending review", submission_id))?;

        self.raise(
            ProgressEventKind::ReviewResolved(ReviewResolved {
                submission_id,
                position: pending.position,
                approved,
            }),
            correlation_id,
            clock,
        );
        Ok(pending)
    }

    /// Adds `delta` points, optionally attributed to a stop, and returns the
    /// new score. A zero delta raises no event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidInput` if `delta` is negative and
    /// `DomainError::InvalidState` if the hunt has not been started.
    pub fn record_score(
        &mut self,
        position: Option<u32>,
        delta: i64,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<u64, DomainError> {
        if delta < 0 {
            return Err(DomainError::InvalidInput(format!(
                "score delta must not be negative, got {delta}"
            )));
        }
        if self.status == ProgressStatus::NotStarted {
            return Err(DomainError::InvalidState(format!(
                "{} has not started the hunt",
                self.key
            )));
        }

        if delta > 0 {
            self.raise(
                ProgressEventKind::ScoreRecorded(ScoreRecorded {
                    position,
                    delta: delta.unsigned_abs(),
                }),
                correlation_id,
                clock,
            );
        }
        Ok(self.score)
    }

    /// Completes the active stop, moving to the next one or completing the
    /// hunt after the last. A no-op once completed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` if the hunt has not been started.
    pub fn advance(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<ProgressStatus, DomainError> {
        let current_index = match self.status {
            ProgressStatus::Completed => return Ok(self.status),
            ProgressStatus::NotStarted => {
                return Err(DomainError::InvalidState(format!(
                    "{} has not started the hunt",
                    self.key
                )));
            }
            ProgressStatus::InProgress { current_index } => current_index,
        };

        let kind = if current_index + 1 >= self.total_stops {
            ProgressEventKind::HuntCompleted(HuntCompleted {
                completed_position: current_index,
                final_score: self.score,
            })
        } else {
            ProgressEventKind::StopAdvanced(StopAdvanced {
                completed_position: current_index,
                next_position: current_index + 1,
            })
        };
        self.raise(kind, correlation_id, clock);
        Ok(self.status)
    }
}

impl AggregateRoot for HuntProgress {
    type Event = ProgressEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        self.mutate(event);
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    #[allow(clippy::cast_possible_wrap)]
    fn clear_uncommitted_events(&mut self) {
        self.version += self.uncommitted_events.len() as i64;
        self.uncommitted_events.clear();
    }
}

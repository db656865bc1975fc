//! The Clue Dispatcher: what a student sees next.

use chrono::{DateTime, Utc};
use scavenger_core::error::DomainError;
use scavenger_hunts::domain::clue::ClueView;
use scavenger_hunts::domain::hunt::Hunt;
use serde::Serialize;

use super::policy::ProgressPolicy;
use crate::domain::aggregates::HuntProgress;

/// Points earned at one stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopMark {
    /// Stop position.
    pub position: u32,
    /// Stop location label.
    pub location_label: String,
    /// Points earned.
    pub points: u64,
    /// Points available.
    pub max_points: u32,
    /// Graded submissions at the stop.
    pub attempts: u32,
}

/// Summary returned once every stop is answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HuntSummary {
    /// Final score.
    pub final_score: u64,
    /// Sum of all stop points.
    pub max_score: u64,
    /// Stops completed.
    pub stops_completed: u32,
    /// Stops in the hunt.
    pub total_stops: u32,
    /// Per-stop marks in position order.
    pub marks: Vec<StopMark>,
    /// When the final stop was completed.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Either the active stop's clue or the completion summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NextClue {
    /// The student has a stop to answer.
    Clue(ClueView),
    /// The hunt is over.
    HuntComplete(HuntSummary),
}

/// Picks the next clue for `progress`. A not-started record reads as the
/// first stop.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the hunt has no stops and
/// `DomainError::InvalidState` if the active index is outside the hunt.
pub fn dispatch(
    hunt: &Hunt,
    progress: &HuntProgress,
    policy: &ProgressPolicy,
) -> Result<NextClue, DomainError> {
    if hunt.stop_count() == 0 {
        return Err(DomainError::not_found("stop", format!("hunt {} has no stops", hunt.id)));
    }
    if progress.is_completed() {
        return Ok(NextClue::HuntComplete(summarize(hunt, progress)));
    }

    let position = progress.current_index();
    let stop = hunt.get_stop(i64::from(position))?;
    let mut view = stop.to_clue_view(
        hunt.id,
        hunt.stop_count(),
        policy.reveals_hint(progress.attempts_at(position)),
    );
    view.awaiting_review = progress
        .pending_review()
        .is_some_and(|p| p.position == position);
    Ok(NextClue::Clue(view))
}

pub(crate) fn summarize(hunt: &Hunt, progress: &HuntProgress) -> HuntSummary {
    let records = progress.stop_records();
    let marks = hunt
        .stops()
        .iter()
        .map(|stop| {
            let record = records.get(&stop.position);
            StopMark {
                position: stop.position,
                location_label: stop.location_label.clone(),
                points: record.map_or(0, |r| r.points),
                max_points: stop.points,
                attempts: record.map_or(0, |r| r.attempts),
            }
        })
        .collect();
    #[allow(clippy::cast_possible_truncation)]
    let stops_completed = records
        .values()
        .filter(|r| r.completed_at.is_some())
        .count() as u32;

    HuntSummary {
        final_score: progress.score(),
        max_score: hunt.max_score(),
        stops_completed,
        total_stops: hunt.stop_count(),
        marks,
        completed_at: progress.completed_at(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use scavenger_core::key::ProgressKey;
    use scavenger_test_support::{FixedClock, campus_tour};
    use uuid::Uuid;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap())
    }

    #[test]
    fn test_not_started_reads_as_first_stop() {
        let hunt = campus_tour();
        let progress = HuntProgress::new(ProgressKey::new(Uuid::new_v4(), hunt.id));

        let next = dispatch(&hunt, &progress, &ProgressPolicy::default()).unwrap();

        match next {
            NextClue::Clue(view) => {
                assert_eq!(view.position, 0);
                assert_eq!(view.total_stops, 3);
                assert_eq!(view.hint.as_deref(), Some("Hint for stop 0"));
                assert!(!view.awaiting_review);
            }
            other => panic!("expected Clue, got {other:?}"),
        }
    }

    #[test]
    fn test_hint_is_withheld_until_attempts_reached() {
        let hunt = campus_tour();
        let progress = HuntProgress::new(ProgressKey::new(Uuid::new_v4(), hunt.id));
        let policy = ProgressPolicy {
            hint_after_attempts: 1,
            ..ProgressPolicy::default()
        };

        let next = dispatch(&hunt, &progress, &policy).unwrap();

        match next {
            NextClue::Clue(view) => assert_eq!(view.hint, None),
            other => panic!("expected Clue, got {other:?}"),
        }
    }

    #[test]
    fn test_clue_never_exposes_the_answer() {
        let hunt = campus_tour();
        let progress = HuntProgress::new(ProgressKey::new(Uuid::new_v4(), hunt.id));

        let next = dispatch(&hunt, &progress, &ProgressPolicy::default()).unwrap();
        let json = serde_json::to_string(&next).unwrap();

        assert!(!json.contains("paris"));
        assert!(!json.contains("accepted"));
    }

    #[test]
    fn test_completed_progress_yields_summary() {
        // Arrange
        let hunt = campus_tour();
        let mut progress = HuntProgress::new(ProgressKey::new(Uuid::new_v4(), hunt.id));
        progress.start(&hunt, Uuid::new_v4(), &clock()).unwrap();
        for position in 0..3 {
            progress
                .record_score(Some(position), 10, Uuid::new_v4(), &clock())
                .unwrap();
            progress.advance(Uuid::new_v4(), &clock()).unwrap();
        }

        // Act
        let next = dispatch(&hunt, &progress, &ProgressPolicy::default()).unwrap();

        // Assert
        match next {
            NextClue::HuntComplete(summary) => {
                assert_eq!(summary.final_score, 30);
                assert_eq!(summary.max_score, 30);
                assert_eq!(summary.stops_completed, 3);
                assert_eq!(summary.marks.len(), 3);
                assert_eq!(summary.completed_at, Some(clock().0));
            }
            other => panic!("expected HuntComplete, got {other:?}"),
        }
    }
}

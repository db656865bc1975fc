//! Commands for the Progress Tracker.

use scavenger_core::command::Command;
use scavenger_core::key::ProgressKey;
use scavenger_grading::domain::submission::AnswerPayload;
use uuid::Uuid;

/// Command to start (or resume) a hunt for a student.
#[derive(Debug, Clone)]
pub struct StartHunt {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The student acting.
    pub student_id: Uuid,
    /// The hunt being played.
    pub hunt_id: Uuid,
}

impl Command for StartHunt {
    fn command_type(&self) -> &'static str {
        "progress.start_hunt"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target(&self) -> ProgressKey {
        ProgressKey::new(self.student_id, self.hunt_id)
    }
}

/// Command to submit an answer at the active stop.
#[derive(Debug, Clone)]
pub struct SubmitAnswer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The student acting.
    pub student_id: Uuid,
    /// The hunt being played.
    pub hunt_id: Uuid,
    /// The stop being answered.
    pub stop_id: Uuid,
    /// The raw answer.
    pub answer: AnswerPayload,
}

impl Command for SubmitAnswer {
    fn command_type(&self) -> &'static str {
        "progress.submit_answer"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target(&self) -> ProgressKey {
        ProgressKey::new(self.student_id, self.hunt_id)
    }
}

/// Command recording a reviewer's decision on a pending image submission.
#[derive(Debug, Clone)]
pub struct FinalizeReview {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The student acting.
    pub student_id: Uuid,
    /// The hunt being played.
    pub hunt_id: Uuid,
    /// The submission under review.
    pub submission_id: Uuid,
    /// Whether the photo is accepted.
    pub approved: bool,
}

impl Command for FinalizeReview {
    fn command_type(&self) -> &'static str {
        "progress.finalize_review"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target(&self) -> ProgressKey {
        ProgressKey::new(self.student_id, self.hunt_id)
    }
}

/// Command to move a student past the active stop.
#[derive(Debug, Clone)]
pub struct AdvanceProgress {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The student acting.
    pub student_id: Uuid,
    /// The hunt being played.
    pub hunt_id: Uuid,
}

impl Command for AdvanceProgress {
    fn command_type(&self) -> &'static str {
        "progress.advance"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target(&self) -> ProgressKey {
        ProgressKey::new(self.student_id, self.hunt_id)
    }
}

/// Command to add points to a student's score.
#[derive(Debug, Clone)]
pub struct RecordScore {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The student acting.
    pub student_id: Uuid,
    /// The hunt being played.
    pub hunt_id: Uuid,
    /// Points to add; must not be negative.
    pub delta: i64,
}

impl Command for RecordScore {
    fn command_type(&self) -> &'static str {
        "progress.record_score"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target(&self) -> ProgressKey {
        ProgressKey::new(self.student_id, self.hunt_id)
    }
}

//! Student-facing projection of a stop.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::hunt::ChoiceOption;

/// The question part of a clue, stripped of its answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClueQuestion {
    /// Free-text answer expected.
    Text,
    /// Pick one of the listed options (by index or key).
    MultipleChoice {
        /// Options in display order.
        options: Vec<ChoiceOption>,
    },
    /// Upload a photo of one of the listed content types.
    Image {
        /// Accepted MIME types.
        content_types: Vec<String>,
    },
}

/// What a student sees for the active stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClueView {
    /// The hunt this clue belongs to.
    pub hunt_id: Uuid,
    /// The stop being presented.
    pub stop_id: Uuid,
    /// Zero-based stop position.
    pub position: u32,
    /// Number of stops in the hunt.
    pub total_stops: u32,
    /// Where the stop is.
    pub location_label: String,
    /// The question text.
    pub prompt: String,
    /// Question kind and its public payload.
    pub question: ClueQuestion,
    /// Points available at this stop.
    pub points: u32,
    /// Hint, once unlocked.
    pub hint: Option<String>,
    /// True while an image submission for this stop awaits a reviewer.
    pub awaiting_review: bool,
}

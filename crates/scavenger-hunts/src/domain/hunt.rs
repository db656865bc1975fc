//! Hunts and their stops.

use std::collections::HashSet;
use std::fmt::{self, Write as _};

use scavenger_core::error::DomainError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::clue::{ClueQuestion, ClueView};

/// Content types accepted for image stops when the author names none.
pub const DEFAULT_IMAGE_CONTENT_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/gif"];

/// One selectable option of a multiple-choice stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Stable key submitted by clients (e.g. `"a"`).
    pub key: String,
    /// Text shown to the student.
    pub label: String,
}

/// Expected-answer specification. Each kind carries its own answer shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerSpec {
    /// Free text compared case- and whitespace-insensitively.
    Text {
        /// Every accepted phrasing.
        accepted: Vec<String>,
    },
    /// One correct option out of an ordered list.
    MultipleChoice {
        /// Options in display order; indices refer to this order.
        options: Vec<ChoiceOption>,
        /// Key of the correct option.
        correct: String,
    },
    /// A photo graded by a human reviewer.
    Image {
        /// Accepted MIME types of the uploaded artifact.
        content_types: Vec<String>,
    },
}

/// Discriminant of [`AnswerSpec`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// Free text.
    Text,
    /// Multiple choice.
    MultipleChoice,
    /// Image upload.
    Image,
}

impl fmt::Display for AnswerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::MultipleChoice => "multiple-choice",
            Self::Image => "image",
        })
    }
}

impl AnswerSpec {
    /// Returns the kind of this specification.
    #[must_use]
    pub fn kind(&self) -> AnswerKind {
        match self {
            Self::Text { .. } => AnswerKind::Text,
            Self::MultipleChoice { .. } => AnswerKind::MultipleChoice,
            Self::Image { .. } => AnswerKind::Image,
        }
    }

    fn validate(&self, stop_id: Uuid) -> Result<(), DomainError> {
        match self {
            Self::Text { accepted } => {
                if accepted.iter().all(|a| a.trim().is_empty()) {
                    return Err(DomainError::InvalidInput(format!(
                        "text stop {stop_id} has no accepted answer"
                    )));
                }
            }
            Self::MultipleChoice { options, correct } => {
                if options.len() < 2 {
                    return Err(DomainError::InvalidInput(format!(
                        "multiple-choice stop {stop_id} needs at least two options"
                    )));
                }
                let mut keys = HashSet::new();
                for option in options {
                    if option.key.trim().is_empty() || !keys.insert(option.key.as_str()) {
                        return Err(DomainError::InvalidInput(format!(
                            "multiple-choice stop {stop_id} has a blank or duplicate option key"
                        )));
                    }
                }
                if !keys.contains(correct.as_str()) {
                    return Err(DomainError::InvalidInput(format!(
                        "multiple-choice stop {stop_id} marks unknown option {correct:?} as correct"
                    )));
                }
            }
            Self::Image { content_types } => {
                if content_types.is_empty() {
                    return Err(DomainError::InvalidInput(format!(
                        "image stop {stop_id} accepts no content type"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// One location/question unit within a hunt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Stop identifier.
    pub id: Uuid,
    /// Zero-based position within the hunt.
    pub position: u32,
    /// Where the stop is physically located.
    pub location_label: String,
    /// Token encoded in the stop's QR code.
    pub qr_token: String,
    /// Question shown to the student.
    pub prompt: String,
    /// What counts as a correct answer.
    pub answer: AnswerSpec,
    /// Hint for this stop.
    pub hint: Option<String>,
    /// Clue pointing at the next location, revealed after a correct answer.
    pub next_location_hint: Option<String>,
    /// Points awarded for a correct answer.
    pub points: u32,
}

impl Stop {
    /// Student-facing projection of this stop. Never carries the answer.
    #[must_use]
    pub fn to_clue_view(&self, hunt_id: Uuid, total_stops: u32, reveal_hint: bool) -> ClueView {
        let question = match &self.answer {
            AnswerSpec::Text { .. } => ClueQuestion::Text,
            AnswerSpec::MultipleChoice { options, .. } => ClueQuestion::MultipleChoice {
                options: options.clone(),
            },
            AnswerSpec::Image { content_types } => ClueQuestion::Image {
                content_types: content_types.clone(),
            },
        };
        ClueView {
            hunt_id,
            stop_id: self.id,
            position: self.position,
            total_stops,
            location_label: self.location_label.clone(),
            prompt: self.prompt.clone(),
            question,
            points: self.points,
            hint: if reveal_hint { self.hint.clone() } else { None },
            awaiting_review: false,
        }
    }
}

/// A teacher-authored ordered sequence of stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hunt {
    /// Hunt identifier.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Longer description shown before starting.
    pub description: String,
    /// Owning teacher.
    pub teacher_id: Uuid,
    /// Only active hunts can be started.
    pub is_active: bool,
    stops: Vec<Stop>,
}

impl Hunt {
    /// Builds a hunt, checking every structural invariant.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` if stop positions are not unique
    /// and contiguous from zero, and `DomainError::InvalidInput` for a blank
    /// title, duplicate stop ids or QR tokens, or a malformed answer spec.
    pub fn new(
        id: Uuid,
        title: String,
        description: String,
        teacher_id: Uuid,
        is_active: bool,
        stops: Vec<Stop>,
    ) -> Result<Self, DomainError> {
        if title.trim().is_empty() {
            return Err(DomainError::InvalidInput(format!("hunt {id} has no title")));
        }

        let mut stop_ids = HashSet::new();
        let mut tokens = HashSet::new();
        for (expected, stop) in (0u32..).zip(&stops) {
            if stop.position != expected {
                return Err(DomainError::InvalidState(format!(
                    "hunt {id}: stop positions must be contiguous from zero \
                     (expected {expected}, found {})",
                    stop.position
                )));
            }
            if !stop_ids.insert(stop.id) {
                return Err(DomainError::InvalidInput(format!(
                    "hunt {id}: duplicate stop id {}",
                    stop.id
                )));
            }
            if stop.qr_token.trim().is_empty() || !tokens.insert(stop.qr_token.as_str()) {
                return Err(DomainError::InvalidInput(format!(
                    "hunt {id}: stop {} has a blank or duplicate QR token",
                    stop.id
                )));
            }
            stop.answer.validate(stop.id)?;
        }

        Ok(Self {
            id,
            title,
            description,
            teacher_id,
            is_active,
            stops,
        })
    }

    /// Stops in position order.
    #[must_use]
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Number of stops.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn stop_count(&self) -> u32 {
        self.stops.len() as u32
    }

    /// Stop at `position`, if any.
    #[must_use]
    pub fn stop_at(&self, position: u32) -> Option<&Stop> {
        self.stops.get(position as usize)
    }

    /// Stop at a caller-supplied index.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` if `index` is negative or not
    /// below the stop count.
    pub fn get_stop(&self, index: i64) -> Result<&Stop, DomainError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.stops.get(i))
            .ok_or_else(|| {
                DomainError::InvalidState(format!(
                    "stop index {index} is outside hunt {} ({} stops)",
                    self.id,
                    self.stops.len()
                ))
            })
    }

    /// Sum of all stop points.
    #[must_use]
    pub fn max_score(&self) -> u64 {
        self.stops.iter().map(|s| u64::from(s.points)).sum()
    }

    /// Hex SHA-256 over the ordered stop ids. Progress records capture it at
    /// start so a reordered hunt is detected.
    #[must_use]
    pub fn layout_fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for stop in &self.stops {
            hasher.update(stop.id.as_bytes());
        }
        let mut out = String::with_capacity(64);
        for byte in hasher.finalize() {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

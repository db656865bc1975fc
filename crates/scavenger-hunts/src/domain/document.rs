//! YAML authoring format for hunts.
//!
//! Stop positions are implied by document order. Stop ids and QR tokens may
//! be omitted; they are then derived from the hunt id and position so they
//! stay stable across reloads.

use serde::Deserialize;
use uuid::Uuid;

use scavenger_core::error::DomainError;

use super::hunt::{AnswerSpec, ChoiceOption, DEFAULT_IMAGE_CONTENT_TYPES, Hunt, Stop};

fn default_points() -> u32 {
    10
}

/// A hunt as written by a teacher.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HuntDocument {
    /// Hunt identifier.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: String,
    /// Owning teacher.
    pub teacher_id: Uuid,
    /// Whether students may start the hunt.
    #[serde(default)]
    pub active: bool,
    /// Stops in play order.
    #[serde(default)]
    pub stops: Vec<StopDocument>,
}

/// A stop as written by a teacher.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StopDocument {
    /// Explicit stop id; derived when absent.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// Location label.
    pub location: String,
    /// Explicit QR token; derived from the stop id when absent.
    #[serde(default)]
    pub qr_token: Option<String>,
    /// Question text.
    pub prompt: String,
    /// Expected answer.
    pub answer: AnswerDocument,
    /// Hint for this stop.
    #[serde(default)]
    pub hint: Option<String>,
    /// Clue for the next location.
    #[serde(default)]
    pub next_location_hint: Option<String>,
    /// Points for a correct answer.
    #[serde(default = "default_points")]
    pub points: u32,
}

/// Expected answer as written by a teacher.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerDocument {
    /// Accepted phrasings of a free-text answer.
    Text {
        /// Accepted phrasings.
        accepted: Vec<String>,
    },
    /// Options plus the key of the correct one.
    MultipleChoice {
        /// Options, either plain labels (keyed `a`, `b`, ...) or key/label pairs.
        options: Vec<OptionDocument>,
        /// Key of the correct option.
        correct: String,
    },
    /// Photo upload.
    Image {
        /// Accepted MIME types; common image types when empty.
        #[serde(default)]
        content_types: Vec<String>,
    },
}

/// A multiple-choice option in either short or long form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OptionDocument {
    /// `{ key: b, label: Rome }`
    Keyed(ChoiceOption),
    /// `Rome`
    Label(String),
}

fn option_key(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'a' + i).to_string(),
        _ => index.to_string(),
    }
}

impl AnswerDocument {
    fn into_spec(self) -> AnswerSpec {
        match self {
            Self::Text { accepted } => AnswerSpec::Text { accepted },
            Self::MultipleChoice { options, correct } => AnswerSpec::MultipleChoice {
                options: options
                    .into_iter()
                    .enumerate()
                    .map(|(i, option)| match option {
                        OptionDocument::Keyed(keyed) => keyed,
                        OptionDocument::Label(label) => ChoiceOption {
                            key: option_key(i),
                            label,
                        },
                    })
                    .collect(),
                correct,
            },
            Self::Image { content_types } => AnswerSpec::Image {
                content_types: if content_types.is_empty() {
                    DEFAULT_IMAGE_CONTENT_TYPES
                        .iter()
                        .map(|&t| t.to_owned())
                        .collect()
                } else {
                    content_types
                },
            },
        }
    }
}

impl HuntDocument {
    /// Converts the document into a validated [`Hunt`].
    ///
    /// # Errors
    ///
    /// Returns the `DomainError` raised by [`Hunt::new`].
    pub fn into_hunt(self) -> Result<Hunt, DomainError> {
        let hunt_id = self.id;
        let stops = (0u32..)
            .zip(self.stops)
            .map(|(position, doc)| {
                let id = doc.id.unwrap_or_else(|| {
                    Uuid::new_v5(&hunt_id, format!("stop-{position}").as_bytes())
                });
                Stop {
                    id,
                    position,
                    location_label: doc.location,
                    qr_token: doc
                        .qr_token
                        .unwrap_or_else(|| id.simple().to_string()),
                    prompt: doc.prompt,
                    answer: doc.answer.into_spec(),
                    hint: doc.hint,
                    next_location_hint: doc.next_location_hint,
                    points: doc.points,
                }
            })
            .collect();

        Hunt::new(
            hunt_id,
            self.title,
            self.description,
            self.teacher_id,
            self.active,
            stops,
        )
    }
}

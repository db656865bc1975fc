//! Submitted answers.

use serde::{Deserialize, Serialize};

use scavenger_hunts::domain::hunt::AnswerKind;

/// Which option a student picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceSelection {
    /// Zero-based option index (a JSON number).
    Index(i64),
    /// Option key (a JSON string).
    Key(String),
}

/// Opaque reference to an uploaded file, supplied by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Handle or URL of the stored artifact.
    pub reference: String,
    /// MIME type recorded at upload.
    pub content_type: String,
    /// Size recorded at upload, when known.
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

/// Raw answer payload of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerPayload {
    /// Free-text answer.
    Text {
        /// What the student typed.
        text: String,
    },
    /// Multiple-choice answer.
    MultipleChoice {
        /// The picked option.
        choice: ChoiceSelection,
    },
    /// Uploaded photo.
    Image {
        /// Where the photo was stored.
        artifact: ArtifactRef,
    },
}

impl AnswerPayload {
    /// The answer kind this payload is for.
    #[must_use]
    pub fn kind(&self) -> AnswerKind {
        match self {
            Self::Text { .. } => AnswerKind::Text,
            Self::MultipleChoice { .. } => AnswerKind::MultipleChoice,
            Self::Image { .. } => AnswerKind::Image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_accepts_index_or_key_json() {
        let by_index: AnswerPayload =
            serde_json::from_str(r#"{"kind":"multiple_choice","choice":1}"#).unwrap();
        let by_key: AnswerPayload =
            serde_json::from_str(r#"{"kind":"multiple_choice","choice":"b"}"#).unwrap();

        assert_eq!(
            by_index,
            AnswerPayload::MultipleChoice {
                choice: ChoiceSelection::Index(1)
            }
        );
        assert_eq!(
            by_key,
            AnswerPayload::MultipleChoice {
                choice: ChoiceSelection::Key("b".into())
            }
        );
    }

    #[test]
    fn test_image_size_is_optional() {
        let payload: AnswerPayload = serde_json::from_str(
            r#"{"kind":"image","artifact":{"reference":"abc.jpg","content_type":"image/jpeg"}}"#,
        )
        .unwrap();

        match payload {
            AnswerPayload::Image { artifact } => assert_eq!(artifact.size_bytes, None),
            other => panic!("expected Image, got {other:?}"),
        }
    }
}

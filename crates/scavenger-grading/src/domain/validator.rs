//! The Answer Validator.

use scavenger_core::error::DomainError;
use scavenger_hunts::domain::hunt::{AnswerSpec, ChoiceOption, Stop};
use tracing::debug;

use super::submission::{AnswerPayload, ArtifactRef, ChoiceSelection};
use super::verdict::{Evaluation, Verdict};

/// Largest image accepted when no limit is configured (5 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Lowercases, trims and collapses internal whitespace runs.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decides correctness of submissions against a stop's answer spec.
#[derive(Debug, Clone, Copy)]
pub struct AnswerValidator {
    max_image_bytes: u64,
}

impl Default for AnswerValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IMAGE_BYTES)
    }
}

impl AnswerValidator {
    /// Creates a validator rejecting images above `max_image_bytes`.
    #[must_use]
    pub fn new(max_image_bytes: u64) -> Self {
        Self { max_image_bytes }
    }

    /// Validates `answer` against `stop`.
    ///
    /// Text mismatches are `Incorrect`, not errors. Images are never graded
    /// here: a structurally valid image is `PendingReview`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidInput` if the payload kind does not match
    /// the stop, a choice is outside the option set, or an image reference
    /// is blank, of an unaccepted content type, or too large.
    pub fn validate(&self, stop: &Stop, answer: &AnswerPayload) -> Result<Evaluation, DomainError> {
        let verdict = match (&stop.answer, answer) {
            (AnswerSpec::Text { accepted }, AnswerPayload::Text { text }) => {
                grade_text(accepted, text)
            }
            (
                AnswerSpec::MultipleChoice { options, correct },
                AnswerPayload::MultipleChoice { choice },
            ) => grade_choice(options, correct, choice)?,
            (AnswerSpec::Image { content_types }, AnswerPayload::Image { artifact }) => {
                self.check_artifact(content_types, artifact)?;
                Verdict::PendingReview
            }
            (spec, payload) => {
                return Err(DomainError::InvalidInput(format!(
                    "stop {} expects a {} answer, got {}",
                    stop.id,
                    spec.kind(),
                    payload.kind()
                )));
            }
        };

        debug!(stop_id = %stop.id, ?verdict, "validated submission");
        Ok(Evaluation::new(verdict, stop.points))
    }

    fn check_artifact(
        &self,
        content_types: &[String],
        artifact: &ArtifactRef,
    ) -> Result<(), DomainError> {
        if artifact.reference.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "image submission has an empty artifact reference".into(),
            ));
        }

        // Ignore MIME parameters such as `; charset=...`.
        let recorded = artifact
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        if !content_types.iter().any(|t| t.eq_ignore_ascii_case(recorded)) {
            return Err(DomainError::InvalidInput(format!(
                "content type {:?} is not accepted (expected one of {})",
                artifact.content_type,
                content_types.join(", ")
            )));
        }

        if let Some(size) = artifact.size_bytes {
            if size > self.max_image_bytes {
                return Err(DomainError::InvalidInput(format!(
                    "image is {size} bytes; the limit is {}",
                    self.max_image_bytes
                )));
            }
        }
        Ok(())
    }
}

fn grade_text(accepted: &[String], text: &str) -> Verdict {
    let submitted = normalize_text(text);
    if accepted.iter().any(|a| normalize_text(a) == submitted) {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    }
}

fn grade_choice(
    options: &[ChoiceOption],
    correct: &str,
    choice: &ChoiceSelection,
) -> Result<Verdict, DomainError> {
    let picked = match choice {
        ChoiceSelection::Index(index) => usize::try_from(*index)
            .ok()
            .and_then(|i| options.get(i))
            .ok_or_else(|| {
                DomainError::InvalidInput(format!(
                    "choice {index} is outside 0..{}",
                    options.len()
                ))
            })?,
        ChoiceSelection::Key(key) => options
            .iter()
            .find(|o| o.key == *key)
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown choice key {key:?}")))?,
    };

    Ok(if picked.key == correct {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn stop_with(answer: AnswerSpec) -> Stop {
        Stop {
            id: Uuid::new_v4(),
            position: 0,
            location_label: "Front gate".into(),
            qr_token: "gate".into(),
            prompt: "?".into(),
            answer,
            hint: None,
            next_location_hint: None,
            points: 10,
        }
    }

    fn text_stop() -> Stop {
        stop_with(AnswerSpec::Text {
            accepted: vec!["paris".into(), "Paris, France".into()],
        })
    }

    fn choice_stop() -> Stop {
        stop_with(AnswerSpec::MultipleChoice {
            options: ["a", "b", "c"]
                .iter()
                .map(|k| ChoiceOption {
                    key: (*k).into(),
                    label: k.to_uppercase(),
                })
                .collect(),
            correct: "b".into(),
        })
    }

    fn image_stop() -> Stop {
        stop_with(AnswerSpec::Image {
            content_types: vec!["image/jpeg".into(), "image/png".into()],
        })
    }

    fn text(s: &str) -> AnswerPayload {
        AnswerPayload::Text { text: s.into() }
    }

    fn image(reference: &str, content_type: &str, size_bytes: Option<u64>) -> AnswerPayload {
        AnswerPayload::Image {
            artifact: ArtifactRef {
                reference: reference.into(),
                content_type: content_type.into(),
                size_bytes,
            },
        }
    }

    #[test]
    fn test_text_match_ignores_case_and_surrounding_whitespace() {
        let evaluation = AnswerValidator::default()
            .validate(&text_stop(), &text(" Paris "))
            .unwrap();

        assert_eq!(evaluation.verdict, Verdict::Correct);
        assert_eq!(evaluation.score_delta, 10);
    }

    #[test]
    fn test_text_accepts_any_listed_phrasing() {
        let evaluation = AnswerValidator::default()
            .validate(&text_stop(), &text("paris,   FRANCE"))
            .unwrap();

        assert_eq!(evaluation.verdict, Verdict::Correct);
    }

    #[test]
    fn test_text_mismatch_is_incorrect_not_an_error() {
        let evaluation = AnswerValidator::default()
            .validate(&text_stop(), &text("London"))
            .unwrap();

        assert_eq!(evaluation.verdict, Verdict::Incorrect);
        assert_eq!(evaluation.score_delta, 0);
    }

    #[test]
    fn test_choice_by_index_and_by_key() {
        let validator = AnswerValidator::default();
        let stop = choice_stop();

        let right = validator
            .validate(
                &stop,
                &AnswerPayload::MultipleChoice {
                    choice: ChoiceSelection::Index(1),
                },
            )
            .unwrap();
        let wrong = validator
            .validate(
                &stop,
                &AnswerPayload::MultipleChoice {
                    choice: ChoiceSelection::Key("c".into()),
                },
            )
            .unwrap();

        assert_eq!(right.verdict, Verdict::Correct);
        assert_eq!(wrong.verdict, Verdict::Incorrect);
    }

    #[test]
    fn test_choice_outside_option_set_is_invalid_input() {
        let validator = AnswerValidator::default();
        let stop = choice_stop();

        for choice in [
            ChoiceSelection::Index(3),
            ChoiceSelection::Index(-1),
            ChoiceSelection::Key("z".into()),
        ] {
            let result = validator.validate(&stop, &AnswerPayload::MultipleChoice { choice });
            assert!(
                matches!(result, Err(DomainError::InvalidInput(_))),
                "expected InvalidInput, got {result:?}"
            );
        }
    }

    #[test]
    fn test_image_is_pending_review_never_correct() {
        let evaluation = AnswerValidator::default()
            .validate(&image_stop(), &image("abc.jpg", "image/JPEG", Some(1024)))
            .unwrap();

        assert_eq!(evaluation.verdict, Verdict::PendingReview);
        assert_eq!(evaluation.score_delta, 0);
    }

    #[test]
    fn test_image_structural_checks() {
        let validator = AnswerValidator::new(2048);
        let stop = image_stop();

        assert!(matches!(
            validator.validate(&stop, &image("  ", "image/png", None)),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            validator.validate(&stop, &image("abc.gif", "image/gif", None)),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            validator.validate(&stop, &image("abc.png", "image/png", Some(4096))),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_payload_kind_must_match_stop_kind() {
        let result = AnswerValidator::default().validate(&choice_stop(), &text("b"));

        match result.unwrap_err() {
            DomainError::InvalidInput(msg) => assert!(msg.contains("multiple-choice")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }
}

//! Hunt fixtures.

use scavenger_hunts::domain::hunt::{AnswerSpec, ChoiceOption, Hunt, Stop};
use uuid::Uuid;

/// A stop at `position` worth 10 points, with a hint and a next-location
/// hint.
#[must_use]
pub fn stop(position: u32, answer: AnswerSpec) -> Stop {
    Stop {
        id: Uuid::new_v4(),
        position,
        location_label: format!("Location {position}"),
        qr_token: format!("qr-{}", Uuid::new_v4().simple()),
        prompt: format!("Question {position}"),
        answer,
        hint: Some(format!("Hint for stop {position}")),
        next_location_hint: Some(format!("Head to location {}", position + 1)),
        points: 10,
    }
}

fn build(is_active: bool, stops: Vec<Stop>) -> Hunt {
    Hunt::new(
        Uuid::new_v4(),
        "Campus tour".to_owned(),
        "Find your way around campus".to_owned(),
        Uuid::new_v4(),
        is_active,
        stops,
    )
    .unwrap_or_else(|e| panic!("fixture hunt is invalid: {e}"))
}

/// The classic three-stop hunt: text "paris", a multiple-choice question
/// whose correct option is index 1 (key `b`), then a photo.
///
/// # Panics
///
/// Never; the fixture is always valid.
#[must_use]
pub fn campus_tour() -> Hunt {
    build(
        true,
        vec![
            stop(
                0,
                AnswerSpec::Text {
                    accepted: vec!["paris".to_owned()],
                },
            ),
            stop(
                1,
                AnswerSpec::MultipleChoice {
                    options: ["One", "Two", "Three"]
                        .iter()
                        .zip(["a", "b", "c"])
                        .map(|(label, key)| ChoiceOption {
                            key: key.to_owned(),
                            label: (*label).to_owned(),
                        })
                        .collect(),
                    correct: "b".to_owned(),
                },
            ),
            stop(
                2,
                AnswerSpec::Image {
                    content_types: vec!["image/jpeg".to_owned(), "image/png".to_owned()],
                },
            ),
        ],
    )
}

/// An active hunt of text stops, one per accepted answer.
///
/// # Panics
///
/// Panics if `answers` contains a blank string.
#[must_use]
pub fn text_hunt(answers: &[&str]) -> Hunt {
    build(
        true,
        (0u32..)
            .zip(answers)
            .map(|(position, accepted)| {
                stop(
                    position,
                    AnswerSpec::Text {
                        accepted: vec![(*accepted).to_owned()],
                    },
                )
            })
            .collect(),
    )
}

/// A single-stop hunt that students may not start.
///
/// # Panics
///
/// Never; the fixture is always valid.
#[must_use]
pub fn inactive_hunt() -> Hunt {
    build(
        false,
        vec![stop(
            0,
            AnswerSpec::Text {
                accepted: vec!["paris".to_owned()],
            },
        )],
    )
}

/// `hunt` republished with its stops in reverse order, as if the author
/// reshuffled it. Same id, stop ids and QR tokens.
///
/// # Panics
///
/// Never for a hunt that was valid to begin with.
#[must_use]
pub fn reversed(hunt: &Hunt) -> Hunt {
    let stops = (0u32..)
        .zip(hunt.stops().iter().rev())
        .map(|(position, stop)| Stop {
            position,
            ..stop.clone()
        })
        .collect();
    Hunt::new(
        hunt.id,
        hunt.title.clone(),
        hunt.description.clone(),
        hunt.teacher_id,
        hunt.is_active,
        stops,
    )
    .unwrap_or_else(|e| panic!("reversed hunt is invalid: {e}"))
}

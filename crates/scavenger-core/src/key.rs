//! Identity of a progress record.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for deriving progress stream identifiers.
const PROGRESS_NAMESPACE: Uuid = Uuid::from_u128(0x6a3f_0c52_9d1e_4b7a_8e21_5c0d_b9f4_a713);

/// A (student, hunt) pair. Exactly one progress record exists per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressKey {
    /// The student, as supplied by the authentication collaborator.
    pub student_id: Uuid,
    /// The hunt being played.
    pub hunt_id: Uuid,
}

impl ProgressKey {
    /// Creates a key for the given pair.
    #[must_use]
    pub fn new(student_id: Uuid, hunt_id: Uuid) -> Self {
        Self {
            student_id,
            hunt_id,
        }
    }

    /// Deterministic event stream identifier for this pair.
    #[must_use]
    pub fn stream_id(&self) -> Uuid {
        let mut name = [0u8; 32];
        name[..16].copy_from_slice(self.student_id.as_bytes());
        name[16..].copy_from_slice(self.hunt_id.as_bytes());
        Uuid::new_v5(&PROGRESS_NAMESPACE, &name)
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "student {} / hunt {}", self.student_id, self.hunt_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_id_is_stable_for_the_same_pair() {
        let student_id = Uuid::new_v4();
        let hunt_id = Uuid::new_v4();

        let first = ProgressKey::new(student_id, hunt_id).stream_id();
        let second = ProgressKey::new(student_id, hunt_id).stream_id();

        assert_eq!(first, second);
    }

    #[test]
    fn test_stream_id_differs_when_student_and_hunt_are_swapped() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_ne!(
            ProgressKey::new(a, b).stream_id(),
            ProgressKey::new(b, a).stream_id()
        );
    }
}

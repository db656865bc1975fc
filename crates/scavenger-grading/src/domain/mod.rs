//! Grading domain: submissions, verdicts, the validator and scoring policy.

pub mod scoring;
pub mod submission;
pub mod validator;
pub mod verdict;

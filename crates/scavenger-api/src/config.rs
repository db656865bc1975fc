//! Environment configuration.

use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use scavenger_grading::domain::scoring::{CLASSROOM_DECAY, ScoringPolicy};
use scavenger_grading::domain::validator::{AnswerValidator, DEFAULT_MAX_IMAGE_BYTES};
use scavenger_progress::application::locks::DEFAULT_LOCK_WAIT;
use scavenger_progress::application::policy::ProgressPolicy;

use crate::error::AppError;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Multi-line, human-readable.
    Pretty,
}

/// Server settings read from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Bind host (`HOST`).
    pub host: String,
    /// Bind port (`PORT`).
    pub port: u16,
    /// PostgreSQL URL (`DATABASE_URL`); in-memory store when unset.
    pub database_url: Option<String>,
    /// Directory of hunt documents (`HUNTS_DIR`).
    pub hunts_dir: PathBuf,
    /// Bounded wait for a progress lock (`PROGRESS_LOCK_WAIT_MS`).
    pub lock_wait: Duration,
    /// Scoring (`SCORING_POLICY`, `SCORING_DECAY`).
    pub scoring: ScoringPolicy,
    /// Attempts before hints are shown (`HINT_AFTER_ATTEMPTS`).
    pub hint_after_attempts: u32,
    /// Image size cap in bytes (`MAX_IMAGE_BYTES`).
    pub max_image_bytes: u64,
    /// Log format (`LOG_FORMAT`).
    pub log_format: LogFormat,
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid ({raw:?}): {e}"))),
        None => Ok(default),
    }
}

fn parse_decay(raw: &str) -> Result<Vec<f64>, AppError> {
    raw.split(',')
        .map(|part| {
            let value: f64 = part
                .trim()
                .parse()
                .map_err(|e| AppError::Config(format!("SCORING_DECAY entry {part:?}: {e}")))?;
            if (0.0..=1.0).contains(&value) {
                Ok(value)
            } else {
                Err(AppError::Config(format!(
                    "SCORING_DECAY entry {value} is outside 0.0..=1.0"
                )))
            }
        })
        .collect()
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, applying defaults for missing keys.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a value is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let scoring = match lookup("SCORING_POLICY").as_deref().map(str::trim) {
            None | Some("flat") => ScoringPolicy::Flat,
            Some("attempt_decay") => ScoringPolicy::AttemptDecay {
                multipliers: match lookup("SCORING_DECAY") {
                    Some(raw) => parse_decay(&raw)?,
                    None => CLASSROOM_DECAY.to_vec(),
                },
            },
            Some(other) => {
                return Err(AppError::Config(format!(
                    "SCORING_POLICY must be flat or attempt_decay, got {other:?}"
                )));
            }
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "LOG_FORMAT must be json or pretty, got {other:?}"
                )));
            }
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: parse_or(&lookup, "PORT", 3000)?,
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            hunts_dir: lookup("HUNTS_DIR").map_or_else(|| PathBuf::from("hunts"), PathBuf::from),
            lock_wait: Duration::from_millis(parse_or(
                &lookup,
                "PROGRESS_LOCK_WAIT_MS",
                u64::try_from(DEFAULT_LOCK_WAIT.as_millis()).unwrap_or(u64::MAX),
            )?),
            scoring,
            hint_after_attempts: parse_or(&lookup, "HINT_AFTER_ATTEMPTS", 0)?,
            max_image_bytes: parse_or(&lookup, "MAX_IMAGE_BYTES", DEFAULT_MAX_IMAGE_BYTES)?,
            log_format,
        })
    }

    /// Socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }

    /// Grading policy derived from these settings.
    #[must_use]
    pub fn progress_policy(&self) -> ProgressPolicy {
        ProgressPolicy {
            scoring: self.scoring.clone(),
            hint_after_attempts: self.hint_after_attempts,
            validator: AnswerValidator::new(self.max_image_bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply_when_nothing_is_set() {
        let settings = settings(&[]).unwrap();

        assert_eq!(settings.bind_addr().unwrap().to_string(), "0.0.0.0:3000");
        assert_eq!(settings.database_url, None);
        assert_eq!(settings.hunts_dir, PathBuf::from("hunts"));
        assert_eq!(settings.lock_wait, Duration::from_secs(2));
        assert_eq!(settings.scoring, ScoringPolicy::Flat);
        assert_eq!(settings.hint_after_attempts, 0);
        assert_eq!(settings.max_image_bytes, 5 * 1024 * 1024);
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_attempt_decay_uses_classroom_multipliers_by_default() {
        let settings = settings(&[("SCORING_POLICY", "attempt_decay")]).unwrap();

        assert_eq!(settings.scoring, ScoringPolicy::classroom_decay());
    }

    #[test]
    fn test_custom_decay_and_limits_are_parsed() {
        let settings = settings(&[
            ("SCORING_POLICY", "attempt_decay"),
            ("SCORING_DECAY", "1, 0.75"),
            ("HINT_AFTER_ATTEMPTS", "2"),
            ("PROGRESS_LOCK_WAIT_MS", "250"),
            ("DATABASE_URL", "postgres://localhost/scavenger"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();

        assert_eq!(
            settings.scoring,
            ScoringPolicy::AttemptDecay {
                multipliers: vec![1.0, 0.75]
            }
        );
        assert_eq!(settings.progress_policy().hint_after_attempts, 2);
        assert_eq!(settings.lock_wait, Duration::from_millis(250));
        assert!(settings.database_url.is_some());
        assert_eq!(settings.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for vars in [
            [("PORT", "eighty")],
            [("SCORING_POLICY", "generous")],
            [("LOG_FORMAT", "xml")],
        ] {
            assert!(matches!(settings(&vars), Err(AppError::Config(_))));
        }
        assert!(matches!(
            settings(&[("SCORING_POLICY", "attempt_decay"), ("SCORING_DECAY", "1.0,1.5")]),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_blank_database_url_means_in_memory() {
        assert_eq!(settings(&[("DATABASE_URL", " ")]).unwrap().database_url, None);
    }
}

//! Loads hunt documents from disk.

use std::fs;
use std::path::{Path, PathBuf};

use scavenger_core::error::DomainError;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::document::HuntDocument;
use crate::domain::hunt::Hunt;

/// Failure to turn a hunt file into a [`Hunt`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// The directory or file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not a valid hunt document.
    #[error("cannot parse {path}: {source}")]
    Parse {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        source: serde_yaml::Error,
    },

    /// The document parsed but violates a hunt invariant.
    #[error("invalid hunt in {path}: {source}")]
    Invalid {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        source: DomainError,
    },
}

fn is_hunt_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Parses one hunt document.
///
/// # Errors
///
/// Returns `LoadError::Parse` or `LoadError::Invalid`, tagged with `path`.
pub fn parse_hunt(path: &Path, source: &str) -> Result<Hunt, LoadError> {
    let document: HuntDocument =
        serde_yaml::from_str(source).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    document.into_hunt().map_err(|source| LoadError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads every `*.yaml` / `*.yml` file in `dir`, in file name order.
///
/// # Errors
///
/// Returns the first `LoadError` encountered; nothing is loaded partially.
pub fn load_hunts_from_dir(dir: &Path) -> Result<Vec<Hunt>, LoadError> {
    let io_error = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = fs::read_dir(dir)
        .map_err(io_error)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error)?;
    paths.retain(|p| is_hunt_file(p));
    paths.sort();

    let mut hunts = Vec::with_capacity(paths.len());
    for path in paths {
        let source = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        let hunt = parse_hunt(&path, &source)?;
        debug!(path = %path.display(), hunt_id = %hunt.id, "parsed hunt document");
        hunts.push(hunt);
    }

    info!(dir = %dir.display(), count = hunts.len(), "loaded hunt documents");
    Ok(hunts)
}

//! Persist an assertion failure to disk and read it back.
//!
//! The file holds the failure's [`FailureState`] as a JSON object. Writes use a
//! temp file + rename in the destination directory, so a reader never sees a
//! half-written failure. On Windows, rename-over-existing fails, so an existing
//! file is moved aside to `.bak` first and restored if the rename still fails.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use testkit_types::{AssertionFailure, FailureState, StateError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not a valid failure state: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} holds an unusable failure state: {source}", .path.display())]
    State {
        path: PathBuf,
        #[source]
        source: StateError,
    },
}

impl PersistError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Atomically write `failure` to `path`, replacing any previous file.
pub fn write_failure(
    path: impl AsRef<Path>,
    failure: &AssertionFailure,
) -> Result<(), PersistError> {
    let path = path.as_ref();
    let bytes =
        serde_json::to_vec_pretty(&failure.to_state()).map_err(|source| PersistError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    atomic_write(path, &bytes).map_err(|e| PersistError::io(path, e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Persisted assertion failure");
    Ok(())
}

/// Read a failure previously written by [`write_failure`] or by any peer that
/// writes the same keys.
pub fn read_failure(path: impl AsRef<Path>) -> Result<AssertionFailure, PersistError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| PersistError::io(path, e))?;
    let state: FailureState =
        serde_json::from_slice(&bytes).map_err(|source| PersistError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    let failure = AssertionFailure::from_state(&state).map_err(|source| PersistError::State {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Loaded assertion failure");
    Ok(failure)
}

fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    if let Err(err) = tmp.persist(path) {
        if !path.exists() {
            return Err(err.error);
        }
        let backup_path = path.with_extension("bak");
        let _ = fs::remove_file(&backup_path);
        fs::rename(path, &backup_path)?;

        if let Err(rename_err) = err.file.persist(path) {
            let _ = fs::rename(&backup_path, path);
            return Err(rename_err.error);
        }
        if let Err(e) = fs::remove_file(&backup_path) {
            tracing::warn!(
                path = %backup_path.display(),
                "Failed to remove .bak after persisting failure: {e}"
            );
        }
    }

    Ok(())
}

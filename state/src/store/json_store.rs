//! JsonFileStore
//! -------------
//! File-backed [`StateStore`]: the whole document lives in one pretty-printed
//! JSON file.
//!
//!  - a missing or empty file is a first run and yields an empty state
//!  - an unparsable file is `StateError::Corrupt` and is never overwritten
//!    by `load`
//!  - `save` writes a sibling temp file, syncs it, then renames it over the
//!    target, so readers see either the old or the new document
//!
//! There is no file locking. Two concurrent runs against the same file are
//! last-writer-wins.
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::StateStore;
use crate::errors::StateError;
use crate::model::{DEFAULT_RETENTION_DAYS, PersistedState};

pub struct JsonFileStore {
    path: PathBuf,
    retention: Duration,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
        }
    }

    /// History retention applied to states loaded through this store.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn fresh(&self) -> PersistedState {
        PersistedState::new().with_retention(self.retention)
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<PersistedState, StateError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no state file yet, starting fresh");
                return Ok(self.fresh());
            }
            Err(source) => {
                return Err(StateError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            info!(path = %self.path.display(), "state file is empty, starting fresh");
            return Ok(self.fresh());
        }

        let mut state: PersistedState =
            serde_json::from_slice(&data).map_err(|source| StateError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        state.set_retention(self.retention);

        debug!(
            path = %self.path.display(),
            tickers = state.tickers().count(),
            triggered = state.triggered_keys().count(),
            "state loaded"
        );

        Ok(state)
    }

    fn save(&self, state: &PersistedState) -> Result<(), StateError> {
        let body = serde_json::to_vec_pretty(state)?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let save_err = |source| StateError::Save {
            path: self.path.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(save_err)?;
        tmp.write_all(&body).map_err(save_err)?;
        tmp.as_file().sync_all().map_err(save_err)?;
        tmp.persist(&self.path).map_err(|e| save_err(e.error))?;

        debug!(path = %self.path.display(), bytes = body.len(), "state saved");
        Ok(())
    }
}

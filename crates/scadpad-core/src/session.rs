//! Scratchpad session persistence - the single source of truth for the
//! current script
//!
//! One record per session, persisted as pretty JSON under the working
//! directory. Writes go through a temp file + rename so a crash mid-write
//! never corrupts the last-good state. A missing or unreadable state file
//! reinitializes rather than failing startup.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Fixed state file name under the working directory.
pub const STATE_FILE: &str = "scratchpad_state.json";

/// The persisted unit of state surviving process restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The current script. Empty means "no model yet".
    #[serde(default)]
    pub script: String,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    fn fresh() -> Self {
        Self {
            script: String::new(),
            updated_at: Utc::now(),
        }
    }
}

/// Sole owner and writer of the session record.
pub struct SessionStore {
    path: PathBuf,
    record: Mutex<SessionRecord>,
}

impl SessionStore {
    /// Open the store rooted at `work_dir`, creating the directory and a
    /// fresh state file as needed.
    pub fn open(work_dir: &Path) -> Result<Self, Error> {
        std::fs::create_dir_all(work_dir).map_err(|e| Error::io(work_dir, e))?;
        let path = work_dir.join(STATE_FILE);

        let record = match read_record(&path) {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::info!(path = %path.display(), "no session state found, starting fresh");
                let record = SessionRecord::fresh();
                write_atomic(&path, &record)?;
                record
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "session state unreadable, reinitializing"
                );
                let record = SessionRecord::fresh();
                write_atomic(&path, &record)?;
                record
            }
        };

        Ok(Self {
            path,
            record: Mutex::new(record),
        })
    }

    /// Snapshot of the current record.
    pub fn current(&self) -> SessionRecord {
        self.record.lock().clone()
    }

    /// The current script text.
    pub fn script(&self) -> String {
        self.record.lock().script.clone()
    }

    /// Replace the script, stamp `updated_at`, and persist atomically.
    pub fn update_script(&self, text: &str) -> Result<SessionRecord, Error> {
        let record = {
            let mut record = self.record.lock();
            record.script = text.to_string();
            record.updated_at = Utc::now();
            record.clone()
        };
        write_atomic(&self.path, &record)?;
        Ok(record)
    }

    /// Re-persist the current record. For an unmodified record the written
    /// bytes are identical to what is already on disk.
    pub fn save(&self) -> Result<(), Error> {
        write_atomic(&self.path, &self.current())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_record(path: &Path) -> std::io::Result<Option<SessionRecord>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(std::io::Error::other)
}

fn write_atomic(path: &Path, record: &SessionRecord) -> Result<(), Error> {
    let body = serde_json::to_string_pretty(record)
        .map_err(|e| Error::io(path, std::io::Error::other(e)))?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &body).map_err(|e| Error::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| Error::io(path, e))?;
    Ok(())
}

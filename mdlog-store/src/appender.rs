//! Append-only writer for `error_log.md`.
//!
//! Every call renders one entry, makes sure the log directory exists, opens
//! the file in append mode and writes the whole block with a single
//! `write_all`. Existing content is never read back or rewritten.
//!
//! Appends from one `LogAppender` are serialized by an internal mutex held
//! across directory creation and the write, so blocks from concurrent
//! requests never interleave. Writers in other processes are not coordinated.

use chrono::{DateTime, Local, TimeZone, Utc};
use mdlog_core::config::ServerConfig;
use mdlog_core::{LogEntry, LogRecord, MdlogError, LOG_FILE_NAME};
use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

pub struct LogAppender {
    dir: PathBuf,
    file_path: PathBuf,
    lock: Mutex<()>,
}

impl LogAppender {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let file_path = dir.join(LOG_FILE_NAME);
        Self {
            dir,
            file_path,
            lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.log_file_path.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the log file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Append one entry stamped with the current time. Returns the log file name.
    pub fn append(&self, record: &LogRecord) -> Result<&'static str, MdlogError> {
        self.append_at(record, Utc::now())
    }

    /// Append one entry using `received_at` as the receipt time.
    pub fn append_at(
        &self,
        record: &LogRecord,
        received_at: DateTime<Utc>,
    ) -> Result<&'static str, MdlogError> {
        self.append_in(record, received_at, &Local)
    }

    /// Append one entry, formatting its title in `tz`.
    pub fn append_in<Tz>(
        &self,
        record: &LogRecord,
        received_at: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<&'static str, MdlogError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let entry = LogEntry::from_record_in(record, received_at, tz)?;
        let block = entry.render();

        // A poisoned lock only means another append panicked; the file is
        // still usable.
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        fs::create_dir_all(&self.dir).map_err(|source| MdlogError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let write_err = |source| MdlogError::Write {
            path: self.file_path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .map_err(write_err)?;
        file.write_all(block.as_bytes()).map_err(write_err)?;

        debug!(
            path = %self.file_path.display(),
            title = entry.title(),
            bytes = block.len(),
            "Appended log entry"
        );

        Ok(LOG_FILE_NAME)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

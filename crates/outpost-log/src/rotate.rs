//! Append-only log file with size-bounded rotation.
//!
//! Files are named `log-0.txt`, `log-1.txt`, ... inside the log directory.
//! Once the active file has grown past the ceiling, the next write first
//! appends an end marker to it, then moves on to the next index. A file is
//! never edited again after it has been rotated away.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{LogError, timestamp};

/// Size ceiling for a single log file (512 KiB).
pub const MAX_LOG_BYTES: u64 = 512 * 1024;

// ---------------------------------------------------------------------------
// LogConfig
// ---------------------------------------------------------------------------

/// Where log files go and how large they may grow.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory holding `log-<i>.txt` files. Created on first write.
    pub directory: PathBuf,
    /// Rotation ceiling in bytes.
    pub max_bytes: u64,
}

impl LogConfig {
    /// Config for the given directory with the default ceiling.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            max_bytes: MAX_LOG_BYTES,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("config/logs")
    }
}

// ---------------------------------------------------------------------------
// RotatingLog
// ---------------------------------------------------------------------------

struct ActiveFile {
    path: PathBuf,
    file: File,
    size: u64,
}

/// The single writer for the server's log files.
pub struct RotatingLog {
    config: LogConfig,
    current: Option<ActiveFile>,
    next_index: u32,
}

impl RotatingLog {
    pub fn new(config: LogConfig) -> Self {
        Self {
            config,
            current: None,
            next_index: 0,
        }
    }

    /// Appends one line (a newline is added).
    ///
    /// The file handle is opened lazily, so a fresh `RotatingLog` and one
    /// that just rotated behave the same way.
    pub fn write_line(&mut self, line: &str) -> Result<(), LogError> {
        if self
            .current
            .as_ref()
            .is_some_and(|active| active.size > self.config.max_bytes)
        {
            self.rotate()?;
        }

        if self.current.is_none() {
            self.current = Some(self.open_next()?);
        }
        let Some(active) = self.current.as_mut() else {
            return Ok(());
        };

        active.file.write_all(line.as_bytes())?;
        active.file.write_all(b"\n")?;
        active.size += line.len() as u64 + 1;
        Ok(())
    }

    /// Path of the file currently being written, if one is open.
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|active| active.path.as_path())
    }

    /// Path of the file with the given index.
    pub fn path_for(&self, index: u32) -> PathBuf {
        self.config.directory.join(format!("log-{index}.txt"))
    }

    /// Closes the active file with an end marker. The next write opens a new one.
    fn rotate(&mut self) -> Result<(), LogError> {
        if let Some(mut active) = self.current.take() {
            let marker = format!("[End of log file. Date: {}]\n", timestamp());
            active.file.write_all(marker.as_bytes())?;
            active.file.flush()?;
            tracing::debug!(path = %active.path.display(), "log file rotated");
        }
        Ok(())
    }

    /// Opens the first file at or after `next_index` that is still below the ceiling.
    ///
    /// Existing full files are skipped, so a restart never appends to a file
    /// that has already been rotated away.
    fn open_next(&mut self) -> Result<ActiveFile, LogError> {
        fs::create_dir_all(&self.config.directory)?;

        let mut index = self.next_index;
        loop {
            let path = self.path_for(index);
            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            if size < self.config.max_bytes {
                let file = OpenOptions::new().create(true).append(true).open(&path)?;
                self.next_index = index + 1;
                return Ok(ActiveFile { path, file, size });
            }
            index += 1;
        }
    }
}

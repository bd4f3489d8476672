//! History store: the append-only log of progress entries.
//!
//! Entries are appended to a JSONL (JSON Lines) file with file locking
//! to ensure safe concurrent access.

use crate::{ProgressEntry, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Append/read access to progress history
pub trait HistoryStore {
    fn append(&mut self, entry: &ProgressEntry) -> Result<()>;
    fn load(&self) -> Result<Vec<ProgressEntry>>;
}

/// JSONL-based history store with file locking
pub struct JsonlHistoryStore {
    path: PathBuf,
}

impl JsonlHistoryStore {
    /// Create a new JSONL store for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl HistoryStore for JsonlHistoryStore {
    fn append(&mut self, entry: &ProgressEntry) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Appended entry {} ({}) to history", entry.id, entry.exercise_name);
        Ok(())
    }

    fn load(&self) -> Result<Vec<ProgressEntry>> {
        read_entries(&self.path)
    }
}

/// Read all entries from a history file
///
/// Unparsable lines are logged and skipped.
pub fn read_entries(path: &Path) -> Result<Vec<ProgressEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ProgressEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse history entry at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} entries from history", entries.len());
    Ok(entries)
}

/// In-memory history store
#[derive(Clone, Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Vec<ProgressEntry>,
}

impl MemoryHistoryStore {
    pub fn entries(&self) -> &[ProgressEntry] {
        &self.entries
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn append(&mut self, entry: &ProgressEntry) -> Result<()> {
        self.entries.push(entry.clone());
        Ok(())
    }

    fn load(&self) -> Result<Vec<ProgressEntry>> {
        Ok(self.entries.clone())
    }
}

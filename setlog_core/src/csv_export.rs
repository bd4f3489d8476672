//! CSV export of the history log.
//!
//! One row per progress entry; per-set data is flattened to
//! `reps@weight` pairs joined by `;`.

use crate::analytics::chronological;
use crate::{PairRole, ProgressEntry, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    date: String,
    exercise_id: String,
    exercise_name: String,
    muscle: String,
    sets_completed: u32,
    weight_used: f64,
    reps_completed: u32,
    sets: String,
    pair_id: Option<String>,
    pair_role: Option<&'static str>,
    notes: Option<String>,
}

impl From<&ProgressEntry> for CsvRow {
    fn from(entry: &ProgressEntry) -> Self {
        let sets = entry
            .sets_data
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|s| format!("{}@{}", s.reps, s.weight))
            .collect::<Vec<_>>()
            .join(";");

        CsvRow {
            id: entry.id.to_string(),
            date: entry.date.to_rfc3339(),
            exercise_id: entry.exercise_id.clone(),
            exercise_name: entry.exercise_name.clone(),
            muscle: entry.muscle.clone(),
            sets_completed: entry.sets_completed,
            weight_used: entry.weight_used,
            reps_completed: entry.reps_completed,
            sets,
            pair_id: entry.pair.as_ref().map(|p| p.pair_id.to_string()),
            pair_role: entry.pair.as_ref().map(|p| match p.role {
                PairRole::Primary => "primary",
                PairRole::Partner => "partner",
            }),
            notes: entry.notes.clone(),
        }
    }
}

/// Append entries to a CSV file in chronological order
///
/// Headers are written only when the file is new or empty. Returns the
/// number of rows written.
pub fn export_csv(entries: &[ProgressEntry], csv_path: &Path) -> Result<usize> {
    if entries.is_empty() {
        tracing::info!("No history entries to export");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    let sorted = chronological(entries);
    for entry in &sorted {
        writer.serialize(CsvRow::from(*entry))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} entries to {:?}", sorted.len(), csv_path);
    Ok(sorted.len())
}

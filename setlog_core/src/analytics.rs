//! Trend views over the raw history log.
//!
//! Exercise names typed by hand drift ("Squat", "squat "), so every grouping
//! here keys on [`normalize_name`] and displays the first-seen spelling.

use crate::ProgressEntry;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};

/// Grouping key for an exercise name: trimmed and lowercased
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// How often and how heavy one exercise has been performed
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseSummary {
    /// Display name, as first seen chronologically
    pub name: String,
    pub muscle: String,
    pub times_performed: usize,
    pub best_weight: f64,
    pub last_performed: DateTime<Utc>,
}

/// One point of an exercise's trend line
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressPoint {
    pub date: NaiveDate,
    pub max_weight: f64,
    pub total_sets: u32,
}

/// Entries sorted chronologically, ties broken by id for a stable order
pub fn chronological(entries: &[ProgressEntry]) -> Vec<&ProgressEntry> {
    let mut sorted: Vec<&ProgressEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    sorted
}

/// Summaries of every distinct exercise, most frequent first
pub fn exercise_summaries(entries: &[ProgressEntry]) -> Vec<ExerciseSummary> {
    let mut by_key: HashMap<String, ExerciseSummary> = HashMap::new();

    for entry in chronological(entries) {
        let key = normalize_name(&entry.exercise_name);
        if key.is_empty() {
            continue;
        }
        by_key
            .entry(key)
            .and_modify(|s| {
                s.times_performed += 1;
                s.best_weight = s.best_weight.max(entry.weight_used);
                s.last_performed = entry.date;
            })
            .or_insert_with(|| ExerciseSummary {
                name: entry.exercise_name.trim().to_string(),
                muscle: entry.muscle.clone(),
                times_performed: 1,
                best_weight: entry.weight_used,
                last_performed: entry.date,
            });
    }

    let mut summaries: Vec<ExerciseSummary> = by_key.into_values().collect();
    summaries.sort_by(|a, b| {
        b.times_performed
            .cmp(&a.times_performed)
            .then_with(|| normalize_name(&a.name).cmp(&normalize_name(&b.name)))
    });
    summaries
}

/// Daily best weight and set volume for one exercise, oldest first
pub fn progression_series(entries: &[ProgressEntry], name: &str) -> Vec<ProgressPoint> {
    let key = normalize_name(name);
    let mut by_day: BTreeMap<NaiveDate, ProgressPoint> = BTreeMap::new();

    for entry in entries
        .iter()
        .filter(|e| normalize_name(&e.exercise_name) == key)
    {
        let date = entry.date.date_naive();
        let point = by_day.entry(date).or_insert(ProgressPoint {
            date,
            max_weight: 0.0,
            total_sets: 0,
        });
        point.max_weight = point.max_weight.max(entry.weight_used);
        point.total_sets += entry.sets_completed;
    }

    by_day.into_values().collect()
}

/// Entries dated within one calendar month (UTC)
pub fn entries_in_month(entries: &[ProgressEntry], year: i32, month: u32) -> Vec<ProgressEntry> {
    entries
        .iter()
        .filter(|e| e.date.year() == year && e.date.month() == month)
        .cloned()
        .collect()
}

//! Progress recorder: turns a finished session into history entries.
//!
//! For every exercise with at least one completed set:
//! - representative weight = heaviest completed set
//! - representative reps = mean reps of completed sets, rounded
//! - per-set data = the completed sets in set order
//!
//! A superset yields a [`RecordedMovement::SupersetPair`], written as two
//! entries sharing a pair id. Exercises are written independently, so one
//! failed write never blocks the rest of the session.

use crate::store::HistoryStore;
use crate::{
    superset, ActiveSession, Error, ExerciseSession, ProgressEntry, RecordedMovement, SetData,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Aggregate of one movement's completed sets
#[derive(Clone, Debug, PartialEq)]
pub struct SetSummary {
    pub sets_completed: u32,
    pub weight_used: f64,
    pub reps_completed: u32,
    pub sets_data: Vec<SetData>,
}

/// Summarize completed sets given as `(set number, reps, weight)`
///
/// Returns `None` when there is nothing to summarize.
pub fn summarize<I>(sets: I) -> Option<SetSummary>
where
    I: IntoIterator<Item = (u32, u32, f64)>,
{
    let sets_data: Vec<SetData> = sets
        .into_iter()
        .map(|(set_number, reps, weight)| SetData {
            set_number,
            reps,
            weight,
        })
        .collect();

    if sets_data.is_empty() {
        return None;
    }

    let weight_used = sets_data.iter().map(|s| s.weight).fold(0.0, f64::max);
    let total_reps: u64 = sets_data.iter().map(|s| u64::from(s.reps)).sum();
    let reps_completed = (total_reps as f64 / sets_data.len() as f64).round() as u32;

    Some(SetSummary {
        sets_completed: sets_data.len() as u32,
        weight_used,
        reps_completed,
        sets_data,
    })
}

/// Build the history records for one exercise, or `None` if no set was completed
pub fn record_exercise(
    exercise: &ExerciseSession,
    user_id: &str,
    now: DateTime<Utc>,
) -> Option<RecordedMovement> {
    let primary_summary = summarize(
        exercise
            .completed_sets()
            .map(|s| (s.set_number, s.reps, s.weight)),
    )?;

    let notes = Some(exercise.notes.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let primary = entry(
        user_id,
        exercise.exercise_id.clone(),
        superset::primary_display_name(&exercise.name).to_string(),
        exercise.muscle.clone(),
        now,
        notes,
        primary_summary,
    );

    let Some(partner) = exercise.superset.as_ref() else {
        return Some(RecordedMovement::Single(primary));
    };

    let partner_summary = summarize(exercise.completed_sets().filter_map(|s| {
        s.partner
            .as_ref()
            .map(|p| (s.set_number, p.reps, p.weight))
    }));

    match partner_summary {
        Some(summary) => {
            let partner = entry(
                user_id,
                String::new(),
                partner.name.clone(),
                partner.muscle.clone(),
                now,
                None,
                summary,
            );
            Some(RecordedMovement::SupersetPair {
                primary,
                partner,
                pair_id: Uuid::new_v4(),
            })
        }
        None => {
            tracing::warn!(
                "Superset '{}' has completed sets without partner data; recording primary only",
                exercise.name
            );
            Some(RecordedMovement::Single(primary))
        }
    }
}

fn entry(
    user_id: &str,
    exercise_id: String,
    exercise_name: String,
    muscle: String,
    date: DateTime<Utc>,
    notes: Option<String>,
    summary: SetSummary,
) -> ProgressEntry {
    ProgressEntry {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        exercise_id,
        exercise_name,
        muscle,
        date,
        sets_completed: summary.sets_completed,
        weight_used: summary.weight_used,
        reps_completed: summary.reps_completed,
        notes,
        sets_data: Some(summary.sets_data),
        pair: None,
    }
}

/// One entry that could not be written
#[derive(Debug)]
pub struct WriteFailure {
    pub exercise_name: String,
    pub error: Error,
}

/// Outcome of writing a finished session
#[derive(Debug, Default)]
pub struct FinalizeReport {
    /// Entries successfully appended
    pub written: usize,
    /// Exercises left out because no set was completed
    pub skipped: usize,
    pub failed: Vec<WriteFailure>,
}

impl FinalizeReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Write a finished session to the history store
///
/// Failures are collected in the report; there is no retry and no rollback.
pub fn record_session<S>(
    session: &ActiveSession,
    user_id: &str,
    now: DateTime<Utc>,
    store: &mut S,
) -> FinalizeReport
where
    S: HistoryStore + ?Sized,
{
    let mut report = FinalizeReport::default();

    for exercise in &session.exercises {
        let Some(movement) = record_exercise(exercise, user_id, now) else {
            report.skipped += 1;
            continue;
        };

        for entry in movement.into_entries() {
            match store.append(&entry) {
                Ok(()) => report.written += 1,
                Err(e) => {
                    tracing::warn!("Failed to record '{}': {}", entry.exercise_name, e);
                    report.failed.push(WriteFailure {
                        exercise_name: entry.exercise_name,
                        error: e,
                    });
                }
            }
        }
    }

    tracing::info!(
        "Recorded session '{}': {} entries written, {} exercises skipped, {} failed",
        session.name,
        report.written,
        report.skipped,
        report.failed.len()
    );

    report
}

//! Default-value seeding for new sessions.
//!
//! A re-run of a workout starts from "what I lifted last time", set by set:
//!
//! 1. Find the most recent progress entry for the exercise (by exercise id)
//!    or, for a superset partner, by movement name.
//! 2. If it carries per-set data, set *i* takes the recorded set *i*, or the
//!    last recorded set when set *i* was not recorded.
//! 3. Otherwise every set takes the template's flat targets.

use crate::analytics::normalize_name;
use crate::{PartnerSet, ProgressEntry, SetData, SetRecord, TemplateExercise};

/// Starting reps/weight for one set
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SetDefault {
    pub reps: u32,
    pub weight: f64,
}

/// Per-set defaults for one exercise, one slot per target set
#[derive(Clone, Debug, PartialEq)]
pub struct SeededDefaults {
    pub primary: Vec<SetDefault>,
    pub partner: Option<Vec<SetDefault>>,
}

impl SeededDefaults {
    /// Fresh, uncompleted set records numbered `1..=N`
    pub fn into_set_records(self) -> Vec<SetRecord> {
        let partner = self.partner;
        self.primary
            .into_iter()
            .enumerate()
            .map(|(i, d)| SetRecord {
                set_number: i as u32 + 1,
                reps: d.reps,
                weight: d.weight,
                completed: false,
                partner: partner.as_ref().map(|p| PartnerSet {
                    reps: p[i].reps,
                    weight: p[i].weight,
                }),
            })
            .collect()
    }
}

/// Compute the per-set defaults for a template exercise
pub fn seed_exercise(exercise: &TemplateExercise, history: &[ProgressEntry]) -> SeededDefaults {
    let sets = exercise.target_sets as usize;

    let primary_target = SetDefault {
        reps: exercise.target_reps,
        weight: exercise.target_weight,
    };
    let primary_last = latest_matching(history, |e| {
        !exercise.id.is_empty() && e.exercise_id == exercise.id
    });
    let primary = defaults_from(primary_last, primary_target, sets);

    let partner = exercise.superset.as_ref().map(|p| {
        let target = SetDefault {
            reps: p.target_reps,
            weight: p.target_weight,
        };
        let key = normalize_name(&p.name);
        let last = latest_matching(history, |e| normalize_name(&e.exercise_name) == key);
        defaults_from(last, target, sets)
    });

    tracing::debug!(
        "Seeded '{}' from {}",
        exercise.name,
        if primary_last.is_some() {
            "history"
        } else {
            "template targets"
        }
    );

    SeededDefaults { primary, partner }
}

/// Defaults where every set uses the flat target values
pub fn flat_defaults(reps: u32, weight: f64, sets: u32) -> Vec<SetDefault> {
    vec![SetDefault { reps, weight }; sets as usize]
}

/// Most recent entry matching the predicate
fn latest_matching<'a, F>(history: &'a [ProgressEntry], matches: F) -> Option<&'a ProgressEntry>
where
    F: Fn(&ProgressEntry) -> bool,
{
    history
        .iter()
        .filter(|e| matches(e))
        .max_by(|a, b| a.date.cmp(&b.date))
}

fn defaults_from(
    entry: Option<&ProgressEntry>,
    target: SetDefault,
    sets: usize,
) -> Vec<SetDefault> {
    let recorded = match entry.and_then(|e| e.sets_data.as_deref()) {
        Some(data) if !data.is_empty() => data,
        _ => return vec![target; sets],
    };

    (1..=sets as u32)
        .map(|n| {
            let source = recorded_set(recorded, n);
            SetDefault {
                reps: source.reps,
                weight: source.weight.max(0.0),
            }
        })
        .collect()
}

/// Recorded set `n`, or the last recorded set when `n` is missing.
/// `recorded` must be non-empty.
fn recorded_set(recorded: &[SetData], n: u32) -> &SetData {
    let last = &recorded[recorded.len() - 1];
    recorded.iter().find(|s| s.set_number == n).unwrap_or(last)
}

//! History reconstruction: regroup the flat progress log for display.
//!
//! Entries are bucketed by calendar day (UTC) and walked chronologically.
//! Superset halves are merged back into one [`GroupedExercise::Superset`]:
//!
//! 1. Entries carrying a [`PairLink`](crate::PairLink) pair with the other
//!    half sharing the same pair id.
//! 2. Older entries without a link fall back to the id-suffix convention:
//!    an entry whose exercise id is another's plus
//!    [`PARTNER_ID_SUFFIX`](crate::superset::PARTNER_ID_SUFFIX), recorded
//!    within the pairing window, is that entry's partner.
//!
//! Anything that cannot be paired is shown standalone. Within a day, groups
//! are sorted by display name.

use crate::analytics::{chronological, entries_in_month, normalize_name};
use crate::superset::{partner_exercise_id, strip_partner_suffix};
use crate::{GroupedExercise, HistoryDay, PairRole, ProgressEntry};
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// Default time window for legacy superset pairing
pub const PAIRING_WINDOW_SECONDS: i64 = 60;

/// Regroup entries using the default pairing window
pub fn reconstruct(entries: &[ProgressEntry]) -> Vec<HistoryDay> {
    reconstruct_with_window(entries, Duration::seconds(PAIRING_WINDOW_SECONDS))
}

/// Regroup one calendar month of entries
pub fn reconstruct_month(
    entries: &[ProgressEntry],
    year: i32,
    month: u32,
    window: Duration,
) -> Vec<HistoryDay> {
    reconstruct_with_window(&entries_in_month(entries, year, month), window)
}

/// Regroup entries into days, oldest day first
///
/// Entries repeated with the same id are only shown once.
pub fn reconstruct_with_window(entries: &[ProgressEntry], window: Duration) -> Vec<HistoryDay> {
    let mut seen_ids = HashSet::new();
    let mut by_day: BTreeMap<NaiveDate, Vec<&ProgressEntry>> = BTreeMap::new();

    for entry in chronological(entries) {
        if !seen_ids.insert(entry.id) {
            tracing::debug!("Skipping duplicate history entry {}", entry.id);
            continue;
        }
        by_day.entry(entry.date.date_naive()).or_default().push(entry);
    }

    let days: Vec<HistoryDay> = by_day
        .into_iter()
        .map(|(date, day_entries)| HistoryDay {
            date,
            exercises: group_day(&day_entries, window),
        })
        .collect();

    tracing::debug!(
        "Reconstructed {} entries into {} days",
        seen_ids.len(),
        days.len()
    );
    days
}

/// Group one day's chronologically sorted entries
fn group_day(entries: &[&ProgressEntry], window: Duration) -> Vec<GroupedExercise> {
    let mut consumed = vec![false; entries.len()];
    let mut grouped = Vec::new();

    for i in 0..entries.len() {
        if consumed[i] {
            continue;
        }
        consumed[i] = true;
        let entry = entries[i];

        let partner = if entry.pair.is_some() {
            find_linked(entries, &consumed, entry)
        } else {
            find_legacy(entries, &consumed, entry, window)
        };

        match partner {
            Some((j, pair_id)) => {
                consumed[j] = true;
                let (primary, exercise2) = if is_primary_half(entry, entries[j]) {
                    (entry, entries[j])
                } else {
                    (entries[j], entry)
                };
                grouped.push(GroupedExercise::Superset {
                    primary: primary.clone(),
                    exercise2: exercise2.clone(),
                    pair_id,
                });
            }
            None => grouped.push(GroupedExercise::Single {
                entry: entry.clone(),
            }),
        }
    }

    grouped.sort_by(|a, b| {
        let (pa, pb) = (a.primary(), b.primary());
        normalize_name(a.display_name())
            .cmp(&normalize_name(b.display_name()))
            .then_with(|| a.display_name().cmp(b.display_name()))
            .then_with(|| pa.date.cmp(&pb.date))
            .then_with(|| pa.id.cmp(&pb.id))
    });
    grouped
}

/// The other half of an explicitly linked superset
fn find_linked(
    entries: &[&ProgressEntry],
    consumed: &[bool],
    entry: &ProgressEntry,
) -> Option<(usize, Option<Uuid>)> {
    let link = entry.pair.as_ref()?;
    let found = entries.iter().enumerate().position(|(j, other)| {
        !consumed[j]
            && other
                .pair
                .as_ref()
                .is_some_and(|l| l.pair_id == link.pair_id && l.role != link.role)
    });

    if found.is_none() {
        tracing::debug!(
            "Superset half '{}' has no partner for pair {}",
            entry.exercise_name,
            link.pair_id
        );
    }
    found.map(|j| (j, Some(link.pair_id)))
}

/// The other half of a legacy superset, inferred from the id suffix and timing
fn find_legacy(
    entries: &[&ProgressEntry],
    consumed: &[bool],
    entry: &ProgressEntry,
    window: Duration,
) -> Option<(usize, Option<Uuid>)> {
    if entry.exercise_id.is_empty() {
        return None;
    }

    let wanted = match strip_partner_suffix(&entry.exercise_id) {
        Some(base) => base.to_string(),
        None => partner_exercise_id(&entry.exercise_id),
    };

    entries
        .iter()
        .enumerate()
        .position(|(j, other)| {
            let gap = if other.date > entry.date {
                other.date - entry.date
            } else {
                entry.date - other.date
            };
            !consumed[j] && other.pair.is_none() && other.exercise_id == wanted && gap <= window
        })
        .map(|j| (j, None))
}

/// Whether `a` is the primary half of the pair `(a, b)`
fn is_primary_half(a: &ProgressEntry, b: &ProgressEntry) -> bool {
    match (&a.pair, &b.pair) {
        (Some(link), _) => link.role == PairRole::Primary,
        (None, _) => strip_partner_suffix(&a.exercise_id).is_none()
            && strip_partner_suffix(&b.exercise_id).is_some(),
    }
}

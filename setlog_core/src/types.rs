//! Core domain types for setlog.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workout templates and their exercises
//! - The live session (exercises and set records)
//! - Persisted progress entries and their superset pairing
//! - Reconstructed history for display

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Template Types
// ============================================================================

/// The second movement of a superset, performed in the same set slot
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SupersetPartner {
    pub name: String,
    pub muscle: String,
    pub target_reps: u32,
    pub target_weight: f64,
}

/// One exercise of a saved workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TemplateExercise {
    pub id: String,
    pub name: String,
    pub muscle: String,
    pub target_sets: u32,
    pub target_reps: u32,
    pub target_weight: f64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub rest_seconds: Option<u32>,
    #[serde(default)]
    pub superset: Option<SupersetPartner>,
}

/// A saved, reusable workout definition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutTemplate {
    pub id: String,
    pub name: String,
    pub exercises: Vec<TemplateExercise>,
}

// ============================================================================
// Session Types
// ============================================================================

/// Where an active session came from
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "template_id", rename_all = "snake_case")]
pub enum SessionSource {
    Template(String),
    Custom,
}

/// Reps/weight of the partner movement within one superset set slot
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PartnerSet {
    pub reps: u32,
    pub weight: f64,
}

/// One set of an exercise in a live session
///
/// `partner` is present exactly when the owning exercise is a superset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetRecord {
    pub set_number: u32,
    pub reps: u32,
    pub weight: f64,
    pub completed: bool,
    #[serde(default)]
    pub partner: Option<PartnerSet>,
}

/// An exercise as it is being performed
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSession {
    pub exercise_id: String,
    pub name: String,
    pub muscle: String,
    pub target_sets: u32,
    pub target_reps: u32,
    pub target_weight: f64,
    #[serde(default)]
    pub superset: Option<SupersetPartner>,
    #[serde(default)]
    pub notes: String,
    pub sets: Vec<SetRecord>,
}

impl ExerciseSession {
    pub fn is_superset(&self) -> bool {
        self.superset.is_some()
    }

    /// Sets marked completed, in set order
    pub fn completed_sets(&self) -> impl Iterator<Item = &SetRecord> {
        self.sets.iter().filter(|s| s.completed)
    }
}

/// One live, in-progress workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ActiveSession {
    pub source: SessionSource,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub recovery_seconds: u32,
    pub exercises: Vec<ExerciseSession>,
}

impl ActiveSession {
    pub fn is_custom(&self) -> bool {
        self.source == SessionSource::Custom
    }

    pub fn completed_set_count(&self) -> usize {
        self.exercises
            .iter()
            .map(|e| e.completed_sets().count())
            .sum()
    }
}

// ============================================================================
// History Types
// ============================================================================

/// One recorded set inside a progress entry
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetData {
    pub set_number: u32,
    pub reps: u32,
    pub weight: f64,
}

/// Which half of a superset a progress entry records
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PairRole {
    Primary,
    Partner,
}

/// Explicit link between the two entries of a superset
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PairLink {
    pub pair_id: Uuid,
    pub role: PairRole,
}

/// One persisted historical record of a movement
///
/// Field names on the wire follow the history store's camelCase schema.
/// Entries written before pair links existed have `pair == None`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub id: Uuid,
    pub user_id: String,
    #[serde(default)]
    pub exercise_id: String,
    pub exercise_name: String,
    pub muscle: String,
    pub date: DateTime<Utc>,
    pub sets_completed: u32,
    pub weight_used: f64,
    pub reps_completed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets_data: Option<Vec<SetData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair: Option<PairLink>,
}

/// What the progress recorder produced for one exercise
///
/// The store only holds flat entries; `into_entries` flattens a pair into
/// two entries sharing a `PairLink::pair_id`.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedMovement {
    Single(ProgressEntry),
    SupersetPair {
        primary: ProgressEntry,
        partner: ProgressEntry,
        pair_id: Uuid,
    },
}

impl RecordedMovement {
    pub fn into_entries(self) -> Vec<ProgressEntry> {
        match self {
            RecordedMovement::Single(entry) => vec![entry],
            RecordedMovement::SupersetPair {
                mut primary,
                mut partner,
                pair_id,
            } => {
                primary.pair = Some(PairLink {
                    pair_id,
                    role: PairRole::Primary,
                });
                partner.pair = Some(PairLink {
                    pair_id,
                    role: PairRole::Partner,
                });
                vec![primary, partner]
            }
        }
    }

    pub fn primary(&self) -> &ProgressEntry {
        match self {
            RecordedMovement::Single(entry) => entry,
            RecordedMovement::SupersetPair { primary, .. } => primary,
        }
    }
}

/// A display unit of reconstructed history
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupedExercise {
    Single {
        entry: ProgressEntry,
    },
    Superset {
        primary: ProgressEntry,
        exercise2: ProgressEntry,
        /// None when the pair was inferred by the legacy id-suffix heuristic
        pair_id: Option<Uuid>,
    },
}

impl GroupedExercise {
    pub fn display_name(&self) -> &str {
        match self {
            GroupedExercise::Single { entry } => &entry.exercise_name,
            GroupedExercise::Superset { primary, .. } => &primary.exercise_name,
        }
    }

    pub fn is_superset(&self) -> bool {
        matches!(self, GroupedExercise::Superset { .. })
    }

    pub fn primary(&self) -> &ProgressEntry {
        match self {
            GroupedExercise::Single { entry } => entry,
            GroupedExercise::Superset { primary, .. } => primary,
        }
    }

    pub fn exercise2(&self) -> Option<&ProgressEntry> {
        match self {
            GroupedExercise::Single { .. } => None,
            GroupedExercise::Superset { exercise2, .. } => Some(exercise2),
        }
    }
}

/// All grouped exercises performed on one calendar day
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct HistoryDay {
    pub date: NaiveDate,
    pub exercises: Vec<GroupedExercise>,
}

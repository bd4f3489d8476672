#![forbid(unsafe_code)]

//! Core domain model and business logic for setlog.
//!
//! This crate provides:
//! - Domain types (templates, live sessions, progress entries)
//! - Default-value seeding from history
//! - The session state machine and its recovery timer
//! - Progress recording and history reconstruction
//! - Persistence (history log, template file, active-session slot, CSV)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod superset;
pub mod templates;
pub mod seeder;
pub mod session;
pub mod timer;
pub mod controller;
pub mod recorder;
pub mod history;
pub mod analytics;
pub mod store;
pub mod slot;
pub mod csv_export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use templates::{get_default_templates, TemplateCatalog};
pub use seeder::{seed_exercise, SeededDefaults, SetDefault};
pub use session::{NewExercise, SessionAction, SessionState, SetField};
pub use timer::{RecoveryTimer, TimerEvent};
pub use controller::{SessionController, SessionSnapshot};
pub use recorder::{record_session, FinalizeReport};
pub use history::{reconstruct, reconstruct_month};
pub use analytics::{exercise_summaries, progression_series, ExerciseSummary};
pub use store::{HistoryStore, JsonlHistoryStore, MemoryHistoryStore};
pub use slot::SessionSlot;

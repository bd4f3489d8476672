//! Session state machine as a pure reducer.
//!
//! `NoSession → Active → (Finalized | Cancelled)`. Every change is a named
//! [`SessionAction`] applied by [`reduce`], which never mutates its input: it
//! returns the next state plus an [`Effect`] for the caller to carry out
//! (start the recovery timer, record the finished session).
//!
//! Only starting, adding an exercise and finalizing can fail. Everything else
//! issued against a missing session or an out-of-range index is a logged
//! no-op.

use crate::seeder::{flat_defaults, seed_exercise, SeededDefaults};
use crate::{
    superset, ActiveSession, Error, ExerciseSession, ProgressEntry, Result, SessionSource,
    SupersetPartner, WorkoutTemplate,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Input for adding an exercise to a custom session
#[derive(Clone, Debug, PartialEq)]
pub struct NewExercise {
    pub name: String,
    pub muscle: String,
    pub target_sets: u32,
    pub target_reps: u32,
    pub target_weight: f64,
    pub superset: Option<SupersetPartner>,
}

/// One editable field of a set
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SetField {
    Reps(u32),
    Weight(f64),
    Completed(bool),
    PartnerReps(u32),
    PartnerWeight(f64),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", content = "session", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    NoSession,
    Active(ActiveSession),
    Finalized,
    Cancelled,
}

impl SessionState {
    pub fn active(&self) -> Option<&ActiveSession> {
        match self {
            SessionState::Active(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionAction {
    Start(ActiveSession),
    AddExercise(NewExercise),
    UpdateSet {
        exercise: usize,
        set: usize,
        field: SetField,
    },
    UpdateNotes {
        exercise: usize,
        notes: String,
    },
    Finalize,
    Cancel,
}

/// Side effect requested by a transition
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    None,
    /// A set just went from not completed to completed
    StartRecovery { exercise: usize },
    /// The session was finalized and should be written to history
    Record(ActiveSession),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: SessionState,
    pub effect: Effect,
}

impl Transition {
    fn to(state: SessionState) -> Self {
        Self {
            state,
            effect: Effect::None,
        }
    }
}

impl ActiveSession {
    /// Build a session from a template, seeding every exercise from history
    pub fn from_template(
        template: &WorkoutTemplate,
        history: &[ProgressEntry],
        recovery_seconds: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let exercises = template
            .exercises
            .iter()
            .map(|t| ExerciseSession {
                exercise_id: t.id.clone(),
                name: t.name.clone(),
                muscle: t.muscle.clone(),
                target_sets: t.target_sets,
                target_reps: t.target_reps,
                target_weight: t.target_weight,
                superset: t.superset.clone(),
                notes: String::new(),
                sets: seed_exercise(t, history).into_set_records(),
            })
            .collect();

        ActiveSession {
            source: SessionSource::Template(template.id.clone()),
            name: template.name.clone(),
            started_at: now,
            recovery_seconds,
            exercises,
        }
    }

    /// An empty session the user fills in as they go
    pub fn custom(name: &str, recovery_seconds: u32, now: DateTime<Utc>) -> Self {
        let name = name.trim();
        ActiveSession {
            source: SessionSource::Custom,
            name: if name.is_empty() {
                "Custom workout".into()
            } else {
                name.to_string()
            },
            started_at: now,
            recovery_seconds,
            exercises: Vec::new(),
        }
    }
}

/// Apply one action to a state
pub fn reduce(state: &SessionState, action: SessionAction) -> Result<Transition> {
    let session = match state {
        SessionState::Active(session) => session,
        _ => return reduce_inactive(state, action),
    };

    match action {
        SessionAction::Start(_) => Err(Error::State(
            "a session is already active; finish or cancel it first".into(),
        )),
        SessionAction::AddExercise(new) => {
            let next = add_exercise(session, new)?;
            Ok(Transition::to(SessionState::Active(next)))
        }
        SessionAction::UpdateSet {
            exercise,
            set,
            field,
        } => Ok(update_set(session, exercise, set, field)),
        SessionAction::UpdateNotes { exercise, notes } => {
            let mut next = session.clone();
            match next.exercises.get_mut(exercise) {
                Some(e) => e.notes = notes,
                None => tracing::warn!("Notes for unknown exercise {} ignored", exercise),
            }
            Ok(Transition::to(SessionState::Active(next)))
        }
        SessionAction::Finalize => {
            if matches!(session.source, SessionSource::Template(_)) && session.exercises.is_empty()
            {
                return Err(Error::Validation(
                    "cannot finish a template session with no exercises".into(),
                ));
            }
            tracing::info!(
                "Finalizing session '{}' ({} completed sets)",
                session.name,
                session.completed_set_count()
            );
            Ok(Transition {
                state: SessionState::Finalized,
                effect: Effect::Record(session.clone()),
            })
        }
        SessionAction::Cancel => {
            tracing::info!("Cancelled session '{}'", session.name);
            Ok(Transition::to(SessionState::Cancelled))
        }
    }
}

/// Transitions out of `NoSession`, `Finalized` and `Cancelled`
fn reduce_inactive(state: &SessionState, action: SessionAction) -> Result<Transition> {
    match action {
        SessionAction::Start(session) => {
            tracing::info!(
                "Started session '{}' with {} exercises",
                session.name,
                session.exercises.len()
            );
            Ok(Transition::to(SessionState::Active(session)))
        }
        SessionAction::Finalize => Err(Error::State("no active session to finish".into())),
        SessionAction::AddExercise(_) => Err(Error::State("no active session to add to".into())),
        other => {
            tracing::warn!("Ignoring {} without an active session", action_name(&other));
            Ok(Transition::to(state.clone()))
        }
    }
}

fn action_name(action: &SessionAction) -> &'static str {
    match action {
        SessionAction::Start(_) => "start",
        SessionAction::AddExercise(_) => "add-exercise",
        SessionAction::UpdateSet { .. } => "update-set",
        SessionAction::UpdateNotes { .. } => "update-notes",
        SessionAction::Finalize => "finalize",
        SessionAction::Cancel => "cancel",
    }
}

fn add_exercise(session: &ActiveSession, new: NewExercise) -> Result<ActiveSession> {
    if !session.is_custom() {
        return Err(Error::Validation(
            "exercises can only be added to custom sessions".into(),
        ));
    }

    let name = require("exercise name", &new.name)?;
    let muscle = require("muscle group", &new.muscle)?;
    if new.target_sets == 0 {
        return Err(Error::Validation("target sets must be at least 1".into()));
    }
    require_weight("target weight", new.target_weight)?;

    let superset = match new.superset {
        Some(partner) => {
            let partner_name = require("superset partner name", &partner.name)?;
            let partner_muscle = require("superset partner muscle group", &partner.muscle)?;
            require_weight("superset partner target weight", partner.target_weight)?;
            for n in [name, partner_name] {
                if !superset::is_embeddable(n) {
                    return Err(Error::Validation(format!(
                        "superset movement '{}' must not contain '+' or ')'",
                        n
                    )));
                }
            }
            Some(SupersetPartner {
                name: partner_name.to_string(),
                muscle: partner_muscle.to_string(),
                target_reps: partner.target_reps,
                target_weight: partner.target_weight,
            })
        }
        None => None,
    };

    let display = match &superset {
        Some(partner) => superset::display_name(name, &partner.name),
        None => name.to_string(),
    };

    let defaults = SeededDefaults {
        primary: flat_defaults(new.target_reps, new.target_weight, new.target_sets),
        partner: superset
            .as_ref()
            .map(|p| flat_defaults(p.target_reps, p.target_weight, new.target_sets)),
    };

    let mut next = session.clone();
    next.exercises.push(ExerciseSession {
        exercise_id: Uuid::new_v4().to_string(),
        name: display,
        muscle: muscle.to_string(),
        target_sets: new.target_sets,
        target_reps: new.target_reps,
        target_weight: new.target_weight,
        superset,
        notes: String::new(),
        sets: defaults.into_set_records(),
    });

    tracing::debug!("Added exercise #{} to '{}'", next.exercises.len(), next.name);
    Ok(next)
}

fn require<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::Validation(format!("{} is required", what)))
    } else {
        Ok(trimmed)
    }
}

/// Weights are finite and never negative
pub fn is_valid_weight(weight: f64) -> bool {
    weight.is_finite() && weight >= 0.0
}

fn require_weight(what: &str, weight: f64) -> Result<()> {
    if is_valid_weight(weight) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} must be a non-negative number, got {}",
            what, weight
        )))
    }
}

fn update_set(session: &ActiveSession, exercise: usize, set: usize, field: SetField) -> Transition {
    if let SetField::Weight(w) | SetField::PartnerWeight(w) = field {
        if !w.is_finite() {
            tracing::warn!("Non-finite weight {} for set {}/{} ignored", w, exercise, set);
            return Transition::to(SessionState::Active(session.clone()));
        }
    }

    let in_range = session
        .exercises
        .get(exercise)
        .is_some_and(|e| set < e.sets.len());
    if !in_range {
        tracing::warn!("Update for unknown set {}/{} ignored", exercise, set);
        return Transition::to(SessionState::Active(session.clone()));
    }

    let mut next = session.clone();
    let record = &mut next.exercises[exercise].sets[set];

    let mut newly_completed = false;
    match field {
        SetField::Reps(reps) => record.reps = reps,
        SetField::Weight(weight) => record.weight = weight.max(0.0),
        SetField::Completed(done) => {
            newly_completed = done && !record.completed;
            record.completed = done;
        }
        SetField::PartnerReps(reps) => match record.partner.as_mut() {
            Some(p) => p.reps = reps,
            None => tracing::warn!("Partner reps on a non-superset set ignored"),
        },
        SetField::PartnerWeight(weight) => match record.partner.as_mut() {
            Some(p) => p.weight = weight.max(0.0),
            None => tracing::warn!("Partner weight on a non-superset set ignored"),
        },
    }

    Transition {
        state: SessionState::Active(next),
        effect: if newly_completed {
            Effect::StartRecovery { exercise }
        } else {
            Effect::None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::get_default_templates;
    use crate::TemplateExercise;

    fn custom_state() -> SessionState {
        SessionState::Active(ActiveSession::custom("Evening", 90, Utc::now()))
    }

    fn squat() -> NewExercise {
        NewExercise {
            name: "Squat".into(),
            muscle: "Legs".into(),
            target_sets: 3,
            target_reps: 5,
            target_weight: 100.0,
            superset: None,
        }
    }

    fn apply(state: &SessionState, action: SessionAction) -> SessionState {
        reduce(state, action).unwrap().state
    }

    fn assert_contiguous(state: &SessionState) {
        for e in &state.active().unwrap().exercises {
            assert_eq!(e.sets.len(), e.target_sets as usize);
            for (i, s) in e.sets.iter().enumerate() {
                assert_eq!(s.set_number, i as u32 + 1);
            }
        }
    }

    #[test]
    fn test_start_from_template_seeds_all_exercises() {
        let template = &get_default_templates().templates[0];
        let session = ActiveSession::from_template(template, &[], 90, Utc::now());
        let state = apply(&SessionState::NoSession, SessionAction::Start(session));

        let active = state.active().unwrap();
        assert_eq!(active.exercises.len(), template.exercises.len());
        assert_eq!(active.source, SessionSource::Template(template.id.clone()));
        assert_contiguous(&state);
    }

    #[test]
    fn test_start_while_active_is_rejected() {
        let state = custom_state();
        let other = ActiveSession::custom("Other", 60, Utc::now());
        let err = reduce(&state, SessionAction::Start(other)).unwrap_err();
        assert!(matches!(err, Error::State(_)));
    }

    #[test]
    fn test_add_exercise_creates_target_sets() {
        let state = apply(&custom_state(), SessionAction::AddExercise(squat()));
        let exercise = &state.active().unwrap().exercises[0];

        assert_eq!(exercise.name, "Squat");
        assert_eq!(exercise.sets.len(), 3);
        assert!(exercise.sets.iter().all(|s| s.reps == 5 && s.weight == 100.0));
        assert_contiguous(&state);
    }

    #[test]
    fn test_add_exercise_requires_name_and_muscle() {
        let state = custom_state();

        let mut missing_name = squat();
        missing_name.name = "  ".into();
        let err = reduce(&state, SessionAction::AddExercise(missing_name)).unwrap_err();
        assert!(err.is_validation());

        let mut missing_muscle = squat();
        missing_muscle.muscle = String::new();
        let err = reduce(&state, SessionAction::AddExercise(missing_muscle)).unwrap_err();
        assert!(err.is_validation());

        // Input state is untouched
        assert!(state.active().unwrap().exercises.is_empty());
    }

    #[test]
    fn test_add_superset_requires_partner_fields() {
        let mut new = squat();
        new.superset = Some(SupersetPartner {
            name: "Row".into(),
            muscle: "".into(),
            target_reps: 10,
            target_weight: 40.0,
        });
        let err = reduce(&custom_state(), SessionAction::AddExercise(new)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_add_superset_builds_combined_name() {
        let mut new = squat();
        new.name = "Bench Press".into();
        new.superset = Some(SupersetPartner {
            name: "Row".into(),
            muscle: "Back".into(),
            target_reps: 10,
            target_weight: 40.0,
        });
        let state = apply(&custom_state(), SessionAction::AddExercise(new));
        let exercise = &state.active().unwrap().exercises[0];

        assert_eq!(exercise.name, "Superset (Bench Press+Row)");
        assert!(exercise.sets.iter().all(|s| s.partner.is_some()));
    }

    #[test]
    fn test_add_superset_rejects_plus_in_name() {
        let mut new = squat();
        new.name = "Clean+Jerk".into();
        new.superset = Some(SupersetPartner {
            name: "Row".into(),
            muscle: "Back".into(),
            target_reps: 10,
            target_weight: 40.0,
        });
        let err = reduce(&custom_state(), SessionAction::AddExercise(new)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_add_exercise_to_template_session_rejected() {
        let template = WorkoutTemplate {
            id: "t".into(),
            name: "T".into(),
            exercises: vec![],
        };
        let state = SessionState::Active(ActiveSession::from_template(&template, &[], 90, Utc::now()));
        let err = reduce(&state, SessionAction::AddExercise(squat())).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_completing_set_is_edge_triggered() {
        let state = apply(&custom_state(), SessionAction::AddExercise(squat()));
        let complete = SessionAction::UpdateSet {
            exercise: 0,
            set: 1,
            field: SetField::Completed(true),
        };

        let first = reduce(&state, complete.clone()).unwrap();
        assert_eq!(first.effect, Effect::StartRecovery { exercise: 0 });

        let again = reduce(&first.state, complete).unwrap();
        assert_eq!(again.effect, Effect::None);
        assert!(again.state.active().unwrap().exercises[0].sets[1].completed);
    }

    #[test]
    fn test_update_out_of_range_is_noop() {
        let state = apply(&custom_state(), SessionAction::AddExercise(squat()));
        let next = apply(
            &state,
            SessionAction::UpdateSet {
                exercise: 4,
                set: 0,
                field: SetField::Reps(1),
            },
        );
        assert_eq!(next, state);
    }

    #[test]
    fn test_partner_field_on_plain_set_ignored() {
        let state = apply(&custom_state(), SessionAction::AddExercise(squat()));
        let next = apply(
            &state,
            SessionAction::UpdateSet {
                exercise: 0,
                set: 0,
                field: SetField::PartnerReps(9),
            },
        );
        assert_eq!(next, state);
    }

    #[test]
    fn test_add_exercise_rejects_bad_target_weight() {
        for weight in [-5.0, f64::INFINITY, f64::NAN] {
            let mut new = squat();
            new.target_weight = weight;
            let err = reduce(&custom_state(), SessionAction::AddExercise(new)).unwrap_err();
            assert!(err.is_validation(), "weight {} accepted", weight);
        }

        let mut new = squat();
        new.superset = Some(SupersetPartner {
            name: "Row".into(),
            muscle: "Back".into(),
            target_reps: 10,
            target_weight: -2.5,
        });
        let err = reduce(&custom_state(), SessionAction::AddExercise(new)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_non_finite_weight_edit_ignored() {
        let mut new = squat();
        new.superset = Some(SupersetPartner {
            name: "Row".into(),
            muscle: "Back".into(),
            target_reps: 10,
            target_weight: 40.0,
        });
        let state = apply(&custom_state(), SessionAction::AddExercise(new));

        for field in [
            SetField::Weight(f64::INFINITY),
            SetField::Weight(f64::NAN),
            SetField::PartnerWeight(f64::NEG_INFINITY),
        ] {
            let next = apply(
                &state,
                SessionAction::UpdateSet {
                    exercise: 0,
                    set: 0,
                    field,
                },
            );
            assert_eq!(next, state);
        }

        let clamped = apply(
            &state,
            SessionAction::UpdateSet {
                exercise: 0,
                set: 0,
                field: SetField::Weight(-10.0),
            },
        );
        assert_eq!(clamped.active().unwrap().exercises[0].sets[0].weight, 0.0);
    }

    #[test]
    fn test_update_notes() {
        let state = apply(&custom_state(), SessionAction::AddExercise(squat()));
        let notes = "felt heavy ".repeat(100);
        let next = apply(
            &state,
            SessionAction::UpdateNotes {
                exercise: 0,
                notes: notes.clone(),
            },
        );
        assert_eq!(next.active().unwrap().exercises[0].notes, notes);
    }

    #[test]
    fn test_finalize_empty_template_session_rejected() {
        let template = WorkoutTemplate {
            id: "empty".into(),
            name: "Empty".into(),
            exercises: Vec::<TemplateExercise>::new(),
        };
        let state = SessionState::Active(ActiveSession::from_template(&template, &[], 90, Utc::now()));
        let err = reduce(&state, SessionAction::Finalize).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_finalize_emits_record_effect() {
        let state = apply(&custom_state(), SessionAction::AddExercise(squat()));
        let transition = reduce(&state, SessionAction::Finalize).unwrap();

        assert_eq!(transition.state, SessionState::Finalized);
        match transition.effect {
            Effect::Record(session) => assert_eq!(session.exercises.len(), 1),
            other => panic!("Expected Record effect, got {:?}", other),
        }
    }

    #[test]
    fn test_cancel_and_finalize_without_session() {
        let cancelled = apply(&custom_state(), SessionAction::Cancel);
        assert_eq!(cancelled, SessionState::Cancelled);

        let err = reduce(&SessionState::NoSession, SessionAction::Finalize).unwrap_err();
        assert!(matches!(err, Error::State(_)));

        let still = apply(&SessionState::NoSession, SessionAction::Cancel);
        assert_eq!(still, SessionState::NoSession);
    }
}

//! Session controller: owns the session state, the recovery timer and the
//! UI cursor, and carries out the effects the reducer asks for.

use crate::recorder::{record_session, FinalizeReport};
use crate::session::{reduce, Effect, NewExercise, SessionAction, SessionState, SetField};
use crate::store::HistoryStore;
use crate::timer::{RecoveryTimer, TimerEvent};
use crate::{ActiveSession, ProgressEntry, Result, WorkoutTemplate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything needed to resume an active session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub session: ActiveSession,
    #[serde(default)]
    pub timer: RecoveryTimer,
    #[serde(default)]
    pub cursor: usize,
}

#[derive(Debug, Default)]
pub struct SessionController {
    state: SessionState,
    timer: RecoveryTimer,
    cursor: usize,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a session saved with [`SessionController::snapshot`]
    pub fn restore(snapshot: SessionSnapshot) -> Self {
        let cursor = snapshot
            .cursor
            .min(snapshot.session.exercises.len().saturating_sub(1));
        Self {
            state: SessionState::Active(snapshot.session),
            timer: snapshot.timer,
            cursor,
        }
    }

    /// Current session as a snapshot, `None` unless a session is active
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.state.active().map(|session| SessionSnapshot {
            session: session.clone(),
            timer: self.timer.clone(),
            cursor: self.cursor,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session(&self) -> Option<&ActiveSession> {
        self.state.active()
    }

    pub fn timer(&self) -> &RecoveryTimer {
        &self.timer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn apply(&mut self, action: SessionAction) -> Result<Effect> {
        let transition = reduce(&self.state, action)?;
        self.state = transition.state;

        if !self.state.is_active() {
            self.timer.cancel();
            self.cursor = 0;
        }

        if let Effect::StartRecovery { exercise } = transition.effect {
            if let Some(session) = self.state.active() {
                self.timer.start(session.recovery_seconds, exercise);
            }
        }

        Ok(transition.effect)
    }

    pub fn start_template(
        &mut self,
        template: &WorkoutTemplate,
        history: &[ProgressEntry],
        recovery_seconds: u32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let session = ActiveSession::from_template(template, history, recovery_seconds, now);
        self.apply(SessionAction::Start(session))?;
        self.cursor = 0;
        Ok(())
    }

    pub fn start_custom(&mut self, name: &str, recovery_seconds: u32, now: DateTime<Utc>) -> Result<()> {
        self.apply(SessionAction::Start(ActiveSession::custom(
            name,
            recovery_seconds,
            now,
        )))?;
        self.cursor = 0;
        Ok(())
    }

    /// Append an exercise to a custom session and move the cursor onto it
    pub fn add_exercise(&mut self, exercise: NewExercise) -> Result<()> {
        self.apply(SessionAction::AddExercise(exercise))?;
        if let Some(session) = self.state.active() {
            self.cursor = session.exercises.len().saturating_sub(1);
        }
        Ok(())
    }

    /// Change one field of a set; returns true if this started the recovery timer
    pub fn update_set(&mut self, exercise: usize, set: usize, field: SetField) -> bool {
        let action = SessionAction::UpdateSet {
            exercise,
            set,
            field,
        };
        matches!(self.apply_edit(action), Effect::StartRecovery { .. })
    }

    pub fn update_notes(&mut self, exercise: usize, notes: impl Into<String>) {
        self.apply_edit(SessionAction::UpdateNotes {
            exercise,
            notes: notes.into(),
        });
    }

    /// Apply an action the reducer never rejects; a rejection is logged and leaves state as is
    fn apply_edit(&mut self, action: SessionAction) -> Effect {
        match self.apply(action) {
            Ok(effect) => effect,
            Err(e) => {
                tracing::warn!("Session edit rejected: {}", e);
                Effect::None
            }
        }
    }

    /// Move the cursor to an exercise, clamped to the session
    pub fn go_to(&mut self, exercise: usize) {
        if let Some(session) = self.state.active() {
            self.cursor = exercise.min(session.exercises.len().saturating_sub(1));
        }
    }

    pub fn next(&mut self) {
        self.go_to(self.cursor.saturating_add(1));
    }

    pub fn previous(&mut self) {
        self.go_to(self.cursor.saturating_sub(1));
    }

    /// Whether cancel should be offered: only on the first exercise
    pub fn cancel_offered(&self) -> bool {
        self.state.is_active() && self.cursor == 0
    }

    /// Discard the session without writing history
    pub fn cancel(&mut self) {
        self.apply_edit(SessionAction::Cancel);
    }

    pub fn tick(&mut self) -> TimerEvent {
        self.timer.tick()
    }

    pub fn extend_recovery(&mut self) {
        self.timer.extend();
    }

    pub fn cancel_recovery(&mut self) {
        self.timer.cancel();
    }

    /// Finish the session and write its completed sets to the store
    ///
    /// Validation errors leave the session active and untouched. Store write
    /// failures do not: they are reported in the returned [`FinalizeReport`].
    pub fn finalize<S>(&mut self, user_id: &str, now: DateTime<Utc>, store: &mut S) -> Result<FinalizeReport>
    where
        S: HistoryStore + ?Sized,
    {
        match self.apply(SessionAction::Finalize)? {
            Effect::Record(session) => Ok(record_session(&session, user_id, now, store)),
            _ => Ok(FinalizeReport::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryHistoryStore;
    use crate::templates::get_default_templates;
    use crate::SupersetPartner;

    fn curl() -> NewExercise {
        NewExercise {
            name: "Curl".into(),
            muscle: "Biceps".into(),
            target_sets: 3,
            target_reps: 12,
            target_weight: 15.0,
            superset: None,
        }
    }

    fn custom_controller() -> SessionController {
        let mut controller = SessionController::new();
        controller.start_custom("Arms", 60, Utc::now()).unwrap();
        controller
    }

    #[test]
    fn test_completing_set_starts_timer_at_recovery_seconds() {
        crate::logging::init_test();
        let mut controller = custom_controller();
        controller.add_exercise(curl()).unwrap();

        assert!(controller.update_set(0, 0, SetField::Completed(true)));
        assert_eq!(controller.timer().remaining(), 60);
        assert!(controller.timer().is_running());
    }

    #[test]
    fn test_recompleting_does_not_reset_timer() {
        let mut controller = custom_controller();
        controller.add_exercise(curl()).unwrap();

        controller.update_set(0, 0, SetField::Completed(true));
        for _ in 0..10 {
            controller.tick();
        }
        assert!(!controller.update_set(0, 0, SetField::Completed(true)));
        assert_eq!(controller.timer().remaining(), 50);
    }

    #[test]
    fn test_completion_in_other_exercise_restarts_timer() {
        let mut controller = custom_controller();
        controller.add_exercise(curl()).unwrap();
        controller.add_exercise(curl()).unwrap();

        controller.update_set(0, 0, SetField::Completed(true));
        controller.tick();
        controller.update_set(1, 0, SetField::Completed(true));

        assert_eq!(controller.timer().remaining(), 60);
        assert_eq!(controller.timer().exercise(), Some(1));
    }

    #[test]
    fn test_editing_reps_does_not_touch_timer() {
        let mut controller = custom_controller();
        controller.add_exercise(curl()).unwrap();
        assert!(!controller.update_set(0, 0, SetField::Reps(10)));
        assert!(!controller.timer().is_running());
        assert_eq!(controller.session().unwrap().exercises[0].sets[0].reps, 10);
    }

    #[test]
    fn test_set_count_invariant_holds_through_lifecycle() {
        let template = get_default_templates().get("push_day").unwrap();
        let mut controller = SessionController::new();
        controller.start_template(template, &[], 90, Utc::now()).unwrap();

        controller.update_set(0, 2, SetField::Completed(true));
        controller.update_set(0, 2, SetField::Completed(false));
        controller.update_set(1, 7, SetField::Completed(true));
        controller.update_notes(2, "last set slow");

        for e in &controller.session().unwrap().exercises {
            let numbers: Vec<u32> = e.sets.iter().map(|s| s.set_number).collect();
            let expected: Vec<u32> = (1..=e.target_sets).collect();
            assert_eq!(numbers, expected);
        }
    }

    #[test]
    fn test_cursor_navigation_and_cancel_offer() {
        let mut controller = custom_controller();
        assert!(controller.cancel_offered());

        controller.add_exercise(curl()).unwrap();
        controller.add_exercise(curl()).unwrap();
        assert_eq!(controller.cursor(), 1);
        assert!(!controller.cancel_offered());

        controller.next();
        assert_eq!(controller.cursor(), 1);
        controller.previous();
        controller.previous();
        assert_eq!(controller.cursor(), 0);
        assert!(controller.cancel_offered());
    }

    #[test]
    fn test_cancel_writes_nothing_and_clears() {
        let mut controller = custom_controller();
        controller.add_exercise(curl()).unwrap();
        controller.update_set(0, 0, SetField::Completed(true));

        controller.cancel();
        assert_eq!(controller.state(), &SessionState::Cancelled);
        assert!(controller.snapshot().is_none());
        assert!(!controller.timer().is_running());
    }

    #[test]
    fn test_edits_without_session_leave_controller_idle() {
        let mut controller = SessionController::new();
        assert!(!controller.update_set(0, 0, SetField::Completed(true)));
        controller.update_notes(0, "nothing to annotate");
        controller.cancel();

        assert_eq!(controller.state(), &SessionState::NoSession);
        assert!(!controller.timer().is_running());
        assert!(controller.snapshot().is_none());
    }

    #[test]
    fn test_finalize_with_nothing_completed_writes_nothing() {
        let template = get_default_templates().get("leg_day").unwrap();
        let mut controller = SessionController::new();
        controller.start_template(template, &[], 90, Utc::now()).unwrap();

        let mut store = MemoryHistoryStore::default();
        let report = controller.finalize("u1", Utc::now(), &mut store).unwrap();

        assert_eq!(report.written, 0);
        assert!(store.entries().is_empty());
        assert_eq!(controller.state(), &SessionState::Finalized);
    }

    #[test]
    fn test_finalize_superset_writes_two_entries() {
        let mut controller = custom_controller();
        controller
            .add_exercise(NewExercise {
                name: "Bench Press".into(),
                muscle: "Chest".into(),
                target_sets: 2,
                target_reps: 8,
                target_weight: 60.0,
                superset: Some(SupersetPartner {
                    name: "Row".into(),
                    muscle: "Back".into(),
                    target_reps: 10,
                    target_weight: 40.0,
                }),
            })
            .unwrap();
        controller.update_set(0, 0, SetField::Completed(true));
        controller.update_set(0, 1, SetField::Completed(true));

        let mut store = MemoryHistoryStore::default();
        let report = controller.finalize("u1", Utc::now(), &mut store).unwrap();

        assert_eq!(report.written, 2);
        let names: Vec<_> = store.entries().iter().map(|e| e.exercise_name.as_str()).collect();
        assert_eq!(names, vec!["Bench Press", "Row"]);
    }

    #[test]
    fn test_seeded_template_session_uses_history() {
        let template = get_default_templates().get("leg_day").unwrap();

        let mut first = SessionController::new();
        first.start_template(template, &[], 90, Utc::now()).unwrap();
        first.update_set(0, 0, SetField::Weight(110.0));
        first.update_set(0, 0, SetField::Completed(true));
        let mut store = MemoryHistoryStore::default();
        first.finalize("u1", Utc::now(), &mut store).unwrap();

        let mut second = SessionController::new();
        second
            .start_template(template, store.entries(), 90, Utc::now())
            .unwrap();
        let squat = &second.session().unwrap().exercises[0];
        assert!(squat.sets.iter().all(|s| s.weight == 110.0));
        // Untouched exercises still use template targets
        let rdl = &second.session().unwrap().exercises[1];
        assert!(rdl.sets.iter().all(|s| s.weight == 80.0));
    }

    #[test]
    fn test_validation_error_leaves_state_untouched() {
        let template = WorkoutTemplate {
            id: "empty".into(),
            name: "Empty".into(),
            exercises: vec![],
        };
        let mut controller = SessionController::new();
        controller.start_template(&template, &[], 90, Utc::now()).unwrap();
        let before = controller.snapshot();

        let mut store = MemoryHistoryStore::default();
        let err = controller.finalize("u1", Utc::now(), &mut store).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(controller.snapshot(), before);
    }

    #[test]
    fn test_snapshot_restore_roundtrip() {
        let mut controller = custom_controller();
        controller.add_exercise(curl()).unwrap();
        controller.update_set(0, 1, SetField::Completed(true));
        controller.tick();

        let snapshot = controller.snapshot().unwrap();
        let restored = SessionController::restore(snapshot.clone());
        assert_eq!(restored.snapshot().unwrap(), snapshot);
        assert_eq!(restored.timer().remaining(), 59);
    }
}

//! Live workout logging.
//!
//! `WorkoutViewModel` owns the in-memory session while the athlete trains.
//! Every change goes through [`WorkoutViewModel::send`], one action at a
//! time; the only await point is persistence. UI-facing state (sheets,
//! alerts, the rest overlay) lives in [`Presentation`] next to the core
//! [`State`].

use crate::config::LoggingConfig;
use crate::repository::WorkoutRepository;
use crate::rest_timer::{RestTimer, Tick};
use crate::types::{Effort, Exercise, ExerciseLog, ExerciseLogId, SetChange, SetRecord, WorkoutSession};
use crate::{Error, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Core logging state
#[derive(Clone, Debug, PartialEq)]
pub struct State {
    pub session: WorkoutSession,
    pub active_exercise_index: usize,
    /// Set currently in progress within the active exercise
    pub active_set_index: Option<usize>,
    /// Set while a save is awaited. `send` borrows the view-model mutably, so
    /// it only reads `true` after a `send` future was dropped mid-save.
    pub is_saving: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Sheet {
    ExercisePicker,
    SetEditor { log_id: ExerciseLogId, set: SetRecord },
    Summary(WorkoutSession),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Presentation {
    pub sheet: Option<Sheet>,
    pub alert: Option<Alert>,
    pub show_rest_overlay: bool,
    /// Log the exercise list should scroll to
    pub scroll_target: Option<ExerciseLogId>,
    pub did_exit: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenePhase {
    Active,
    Background,
}

/// Per-exercise row interactions
#[derive(Clone, Debug, PartialEq)]
pub enum ExerciseIntent {
    AddSetTapped,
    EditSet(SetRecord),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    AddExerciseTapped,
    ExercisePicked(Exercise),
    ExerciseIntent { log_id: ExerciseLogId, intent: ExerciseIntent },
    SetEdited { log_id: ExerciseLogId, set: SetRecord },
    /// Positions of the logs to remove
    DeleteExercise(Vec<usize>),
    FinishTapped,
    SaveAndExit,
    StartSet,
    FinishSet { weight: f64, reps: u32, rpe: Option<f32> },
    NextExercise,
    PreviousExercise,
    RestTick,
    SkipRest,
    ScenePhaseChanged(ScenePhase),
    DismissSheet,
    DismissAlert,
}

pub struct WorkoutViewModel {
    state: State,
    presentation: Presentation,
    rest_timer: RestTimer,
    rest_seconds: u32,
    workouts: Arc<dyn WorkoutRepository>,
}

impl WorkoutViewModel {
    pub fn new(session: WorkoutSession, workouts: Arc<dyn WorkoutRepository>, config: &LoggingConfig) -> Self {
        Self {
            state: State {
                session,
                active_exercise_index: 0,
                active_set_index: None,
                is_saving: false,
                error: None,
            },
            presentation: Presentation::default(),
            rest_timer: RestTimer::default(),
            rest_seconds: config.rest_seconds,
            workouts,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn rest_timer(&self) -> RestTimer {
        self.rest_timer
    }

    pub async fn send(&mut self, action: Action) {
        tracing::debug!("Workout action: {:?}", action);

        match action {
            Action::AddExerciseTapped => {
                self.presentation.sheet = Some(Sheet::ExercisePicker);
            }
            Action::ExercisePicked(exercise) => {
                let log = ExerciseLog::new(exercise.id.clone());
                let log_id = log.id;
                self.state.active_exercise_index = self.state.session.push_log(log);
                self.state.active_set_index = None;
                self.presentation.scroll_target = Some(log_id);
                self.presentation.sheet = None;
                tracing::info!("Added {} to session {}", exercise.id, self.state.session.id());
            }
            Action::ExerciseIntent { log_id, intent } => {
                let set = match intent {
                    ExerciseIntent::AddSetTapped => SetRecord::draft(),
                    ExerciseIntent::EditSet(set) => set,
                };
                self.presentation.sheet = Some(Sheet::SetEditor { log_id, set });
            }
            Action::SetEdited { log_id, set } => self.set_edited(log_id, set),
            Action::DeleteExercise(positions) => {
                let removed = self.state.session.remove_logs(&positions);
                let count = self.state.session.exercise_logs().len();
                self.state.active_exercise_index = self.state.active_exercise_index.min(count.saturating_sub(1));
                self.state.active_set_index = None;
                tracing::info!("Removed {} exercise(s), {} left", removed, count);
            }
            Action::FinishTapped => self.finish().await,
            Action::SaveAndExit => {
                if self.persist(false).await.is_some() {
                    self.presentation.did_exit = true;
                }
            }
            Action::StartSet => self.start_set(),
            Action::FinishSet { weight, reps, rpe } => self.finish_set(weight, reps, rpe),
            Action::NextExercise => {
                let last = self.state.session.exercise_logs().len().saturating_sub(1);
                self.state.active_exercise_index = (self.state.active_exercise_index + 1).min(last);
                self.state.active_set_index = None;
            }
            Action::PreviousExercise => {
                self.state.active_exercise_index = self.state.active_exercise_index.saturating_sub(1);
                self.state.active_set_index = None;
            }
            Action::RestTick => {
                if self.rest_timer.tick() == Tick::Finished {
                    tracing::debug!("Rest finished");
                    self.presentation.show_rest_overlay = false;
                }
            }
            Action::SkipRest => {
                self.rest_timer.cancel();
                self.presentation.show_rest_overlay = false;
            }
            Action::ScenePhaseChanged(ScenePhase::Background) => self.rest_timer.pause(),
            Action::ScenePhaseChanged(ScenePhase::Active) => self.rest_timer.resume(),
            Action::DismissSheet => self.presentation.sheet = None,
            Action::DismissAlert => self.presentation.alert = None,
        }
    }

    /// Count down the running rest timer in one-second steps until it stops.
    ///
    /// Returns immediately when no rest is running; a paused timer ends the wait.
    pub async fn run_rest_timer(&mut self) {
        let period = Duration::from_secs(1);
        let mut ticks = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        while self.rest_timer.is_running() {
            ticks.tick().await;
            self.send(Action::RestTick).await;
        }
    }

    fn set_edited(&mut self, log_id: ExerciseLogId, mut set: SetRecord) {
        if let Err(err) = set.validate() {
            self.show_error("Invalid set", &err);
            return;
        }

        let exists = match self.state.session.log(log_id) {
            Some(log) => log.sets.iter().any(|s| s.id == set.id),
            None => {
                self.show_error("Set not saved", &Error::InvalidSession(format!("unknown exercise log {}", log_id)));
                return;
            }
        };
        if !exists {
            set.completed_at.get_or_insert_with(Utc::now);
        }

        match self.state.session.upsert_set(log_id, set) {
            Ok(SetChange::Appended) => self.start_rest(),
            Ok(SetChange::Replaced) => {}
            Err(err) => {
                self.show_error("Set not saved", &err);
                return;
            }
        }
        self.state.active_set_index = None;
        self.presentation.sheet = None;
    }

    fn start_set(&mut self) {
        let Some(log) = self.active_log() else {
            tracing::warn!("Start set ignored: no exercise in session");
            return;
        };
        let next = log.sets.len();
        self.state.active_set_index = Some(next);
        self.rest_timer.cancel();
        self.presentation.show_rest_overlay = false;
    }

    fn finish_set(&mut self, weight: f64, reps: u32, rpe: Option<f32>) {
        if self.state.active_set_index.is_none() {
            tracing::warn!("Finish set ignored: no set in progress");
            return;
        }
        let Some(log_id) = self.active_log().map(|l| l.id) else {
            self.state.active_set_index = None;
            return;
        };

        let result = SetRecord::new(weight, reps, rpe.map(Effort::Rpe), None).and_then(|mut set| {
            set.completed_at = Some(Utc::now());
            self.state.session.upsert_set(log_id, set)
        });
        match result {
            Ok(_) => {
                self.state.active_set_index = None;
                self.start_rest();
            }
            Err(err) => self.show_error("Invalid set", &err),
        }
    }

    async fn finish(&mut self) {
        if !self.state.session.is_active() {
            self.show_error("Workout already finished", &Error::SessionNotActive(self.state.session.id()));
            return;
        }
        if let Some(saved) = self.persist(true).await {
            self.rest_timer.cancel();
            self.presentation.show_rest_overlay = false;
            self.presentation.sheet = Some(Sheet::Summary(saved));
        }
    }

    /// Save a copy of the session, optionally finished now.
    ///
    /// Local state is replaced only when the save succeeds.
    async fn persist(&mut self, finish: bool) -> Option<WorkoutSession> {
        let mut candidate = self.state.session.clone();
        let prepared: Result<()> = if finish {
            candidate.finish(Utc::now()).and_then(|_| candidate.validate())
        } else {
            candidate.validate()
        };
        if let Err(err) = prepared {
            self.show_error("Can't save workout", &err);
            return None;
        }

        self.state.is_saving = true;
        let result = self.workouts.save_session(&candidate).await;
        self.state.is_saving = false;

        match result {
            Ok(confirmed) => {
                let saved = confirmed.unwrap_or(candidate);
                tracing::info!("Saved session {} ({} sets)", saved.id(), saved.total_sets());
                self.state.session = saved.clone();
                self.state.error = None;
                Some(saved)
            }
            Err(err) => {
                tracing::error!("Saving session {} failed: {}", candidate.id(), err);
                self.show_error("Save failed", &Error::from(err));
                None
            }
        }
    }

    fn active_log(&self) -> Option<&ExerciseLog> {
        self.state.session.exercise_logs().get(self.state.active_exercise_index)
    }

    fn start_rest(&mut self) {
        self.rest_timer.start(self.rest_seconds);
        self.presentation.show_rest_overlay = !self.rest_timer.is_idle();
    }

    fn show_error(&mut self, title: &str, err: &Error) {
        let message = err.to_string();
        self.state.error = Some(message.clone());
        self.presentation.alert = Some(Alert {
            title: title.to_string(),
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;
    use crate::memory::InMemoryStore;
    use crate::types::ExerciseId;

    fn exercise(id: &str) -> Exercise {
        default_catalog()
            .iter()
            .find(|e| e.id.as_str() == id)
            .cloned()
            .unwrap()
    }

    fn one_log_session() -> WorkoutSession {
        WorkoutSession::new(
            Utc::now(),
            vec![ExerciseLog::new("barbell_bench_press".into())],
            None,
            None,
        )
        .unwrap()
    }

    fn view_model(store: &Arc<InMemoryStore>, session: WorkoutSession) -> WorkoutViewModel {
        WorkoutViewModel::new(session, store.clone(), &LoggingConfig::default())
    }

    fn new_set(weight: f64, reps: u32) -> SetRecord {
        SetRecord::new(weight, reps, Some(Effort::Rir(2)), None).unwrap()
    }

    #[tokio::test]
    async fn test_pick_then_log_set() {
        let store = Arc::new(InMemoryStore::new());
        let mut vm = view_model(&store, one_log_session());

        vm.send(Action::AddExerciseTapped).await;
        assert_eq!(vm.presentation().sheet, Some(Sheet::ExercisePicker));

        vm.send(Action::ExercisePicked(exercise("overhead_press"))).await;
        assert_eq!(vm.state().active_exercise_index, 1);
        let log_id = vm.state().session.exercise_logs()[1].id;
        assert_eq!(vm.presentation().scroll_target, Some(log_id));

        let before = vm.state().session.total_sets();
        vm.send(Action::SetEdited { log_id, set: new_set(40.0, 8) }).await;

        assert_eq!(vm.state().session.total_sets(), before + 1);
        assert_eq!(vm.state().active_exercise_index, 1);
        assert!(vm.presentation().show_rest_overlay);
        assert_eq!(vm.presentation().sheet, None);
        assert!(vm.state().session.exercise_logs()[1].sets[0].completed_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_only_exercise() {
        let store = Arc::new(InMemoryStore::new());
        let mut vm = view_model(&store, one_log_session());
        vm.send(Action::StartSet).await;
        assert_eq!(vm.state().active_set_index, Some(0));

        vm.send(Action::DeleteExercise(vec![0])).await;

        assert!(vm.state().session.exercise_logs().is_empty());
        assert_eq!(vm.state().active_exercise_index, 0);
        assert_eq!(vm.state().active_set_index, None);
    }

    #[tokio::test]
    async fn test_delete_clamps_active_index() {
        let store = Arc::new(InMemoryStore::new());
        let mut vm = view_model(&store, one_log_session());
        vm.send(Action::ExercisePicked(exercise("pull_up"))).await;
        vm.send(Action::ExercisePicked(exercise("deadlift"))).await;
        assert_eq!(vm.state().active_exercise_index, 2);

        vm.send(Action::DeleteExercise(vec![2, 1, 7])).await;

        assert_eq!(vm.state().session.exercise_logs().len(), 1);
        assert_eq!(vm.state().active_exercise_index, 0);
    }

    #[tokio::test]
    async fn test_edit_existing_set_replaces_in_place() {
        let store = Arc::new(InMemoryStore::new());
        let mut vm = view_model(&store, one_log_session());
        let log_id = vm.state().session.exercise_logs()[0].id;
        vm.send(Action::SetEdited { log_id, set: new_set(60.0, 8) }).await;
        vm.send(Action::SkipRest).await;

        let mut edited = vm.state().session.exercise_logs()[0].sets[0].clone();
        edited.reps = 10;
        vm.send(Action::ExerciseIntent {
            log_id,
            intent: ExerciseIntent::EditSet(edited.clone()),
        })
        .await;
        assert!(matches!(vm.presentation().sheet, Some(Sheet::SetEditor { .. })));

        vm.send(Action::SetEdited { log_id, set: edited }).await;

        let sets = &vm.state().session.exercise_logs()[0].sets;
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].reps, 10);
        assert!(!vm.presentation().show_rest_overlay);
    }

    #[tokio::test]
    async fn test_draft_set_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let mut vm = view_model(&store, one_log_session());
        let log_id = vm.state().session.exercise_logs()[0].id;

        vm.send(Action::ExerciseIntent {
            log_id,
            intent: ExerciseIntent::AddSetTapped,
        })
        .await;
        vm.send(Action::SetEdited { log_id, set: SetRecord::draft() }).await;

        assert_eq!(vm.state().session.total_sets(), 0);
        assert!(vm.presentation().alert.is_some());
        assert!(matches!(vm.presentation().sheet, Some(Sheet::SetEditor { .. })));
    }

    #[tokio::test]
    async fn test_save_failure_keeps_local_state() {
        let store = Arc::new(InMemoryStore::new());
        let mut vm = view_model(&store, one_log_session());
        let log_id = vm.state().session.exercise_logs()[0].id;
        vm.send(Action::SetEdited { log_id, set: new_set(80.0, 5) }).await;
        store.fail_saves(true).unwrap();

        let before = vm.state().session.clone();
        vm.send(Action::FinishTapped).await;

        assert_eq!(vm.state().session, before);
        assert!(vm.state().session.is_active());
        assert!(vm.state().error.is_some());
        assert!(!vm.state().is_saving);
        assert!(vm.presentation().alert.is_some());
        assert!(store.session(before.id()).await.unwrap().is_none());

        // Retry succeeds once the backend recovers
        store.fail_saves(false).unwrap();
        vm.send(Action::DismissAlert).await;
        vm.send(Action::FinishTapped).await;
        assert!(!vm.state().session.is_active());
        assert!(vm.state().error.is_none());
    }

    #[tokio::test]
    async fn test_finish_shows_summary() {
        let store = Arc::new(InMemoryStore::new());
        let mut vm = view_model(&store, one_log_session());
        let log_id = vm.state().session.exercise_logs()[0].id;
        vm.send(Action::SetEdited { log_id, set: new_set(80.0, 5) }).await;

        vm.send(Action::FinishTapped).await;

        let Some(Sheet::Summary(saved)) = &vm.presentation().sheet else {
            panic!("expected summary sheet");
        };
        assert_eq!(saved.total_sets(), 1);
        assert!(saved.ended_at().is_some());
        assert!(vm.rest_timer().is_idle());
        assert!(store.session(saved.id()).await.unwrap().is_some());

        vm.send(Action::FinishTapped).await;
        assert!(vm.presentation().alert.is_some());
    }

    #[tokio::test]
    async fn test_finish_without_confirmation_uses_local_copy() {
        let store = Arc::new(InMemoryStore::new());
        store.withhold_confirmation(true).unwrap();
        let mut vm = view_model(&store, one_log_session());

        vm.send(Action::FinishTapped).await;

        let Some(Sheet::Summary(saved)) = &vm.presentation().sheet else {
            panic!("expected summary sheet");
        };
        assert_eq!(saved.id(), vm.state().session.id());
        assert!(saved.ended_at().is_some());
    }

    #[tokio::test]
    async fn test_empty_draft_cannot_be_saved() {
        let store = Arc::new(InMemoryStore::new());
        let mut vm = view_model(&store, WorkoutSession::draft(Utc::now(), None));

        vm.send(Action::SaveAndExit).await;

        assert!(!vm.presentation().did_exit);
        assert!(vm.state().error.is_some());
    }

    #[tokio::test]
    async fn test_save_and_exit_keeps_session_open() {
        let store = Arc::new(InMemoryStore::new());
        let mut vm = view_model(&store, one_log_session());

        vm.send(Action::SaveAndExit).await;

        assert!(vm.presentation().did_exit);
        let stored = store.session(vm.state().session.id()).await.unwrap().unwrap();
        assert!(stored.is_active());
    }

    #[tokio::test]
    async fn test_set_in_progress_flow() {
        let store = Arc::new(InMemoryStore::new());
        let mut vm = view_model(&store, one_log_session());
        vm.send(Action::ExercisePicked(exercise("pull_up"))).await;
        vm.send(Action::PreviousExercise).await;
        vm.send(Action::PreviousExercise).await;
        assert_eq!(vm.state().active_exercise_index, 0);

        vm.send(Action::FinishSet { weight: 60.0, reps: 8, rpe: Some(8.0) }).await;
        assert_eq!(vm.state().session.total_sets(), 0);

        vm.send(Action::StartSet).await;
        vm.send(Action::FinishSet { weight: 60.0, reps: 8, rpe: Some(8.0) }).await;

        let log = &vm.state().session.exercise_logs()[0];
        assert_eq!(log.exercise_id, ExerciseId::new("barbell_bench_press"));
        assert_eq!(log.sets[0].effort, Some(Effort::Rpe(8.0)));
        assert_eq!(vm.state().active_set_index, None);
        assert!(vm.rest_timer().is_running());

        vm.send(Action::NextExercise).await;
        vm.send(Action::NextExercise).await;
        assert_eq!(vm.state().active_exercise_index, 1);
    }

    #[tokio::test]
    async fn test_background_freezes_rest() {
        let store = Arc::new(InMemoryStore::new());
        let mut vm = view_model(&store, one_log_session());
        let log_id = vm.state().session.exercise_logs()[0].id;
        vm.send(Action::SetEdited { log_id, set: new_set(60.0, 8) }).await;
        vm.send(Action::RestTick).await;

        vm.send(Action::ScenePhaseChanged(ScenePhase::Background)).await;
        vm.send(Action::RestTick).await;
        vm.send(Action::RestTick).await;
        assert_eq!(vm.rest_timer().remaining(), Some(89));

        vm.send(Action::ScenePhaseChanged(ScenePhase::Active)).await;
        vm.send(Action::RestTick).await;
        assert_eq!(vm.rest_timer().remaining(), Some(88));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rest_timer_runs_to_completion() {
        let store = Arc::new(InMemoryStore::new());
        let config = LoggingConfig { rest_seconds: 3 };
        let mut vm = WorkoutViewModel::new(one_log_session(), store, &config);
        let log_id = vm.state().session.exercise_logs()[0].id;
        vm.send(Action::SetEdited { log_id, set: new_set(60.0, 8) }).await;
        assert!(vm.presentation().show_rest_overlay);

        let started = tokio::time::Instant::now();
        vm.run_rest_timer().await;

        assert!(started.elapsed() >= Duration::from_secs(3));
        assert!(vm.rest_timer().is_idle());
        assert!(!vm.presentation().show_rest_overlay);
    }

    /// Delegates to the in-memory store but never completes saves while stalled
    struct StalledSaves {
        inner: InMemoryStore,
        stalled: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl WorkoutRepository for StalledSaves {
        async fn session(&self, id: crate::types::SessionId) -> crate::RepositoryResult<Option<WorkoutSession>> {
            self.inner.session(id).await
        }

        async fn save_session(&self, session: &WorkoutSession) -> crate::RepositoryResult<Option<WorkoutSession>> {
            if self.stalled.load(std::sync::atomic::Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            self.inner.save_session(session).await
        }

        async fn save_set(
            &self,
            set: &SetRecord,
            exercise_id: &ExerciseId,
            session_id: crate::types::SessionId,
        ) -> crate::RepositoryResult<()> {
            self.inner.save_set(set, exercise_id, session_id).await
        }

        async fn recent_sessions(
            &self,
            since: chrono::DateTime<Utc>,
        ) -> crate::RepositoryResult<Vec<WorkoutSession>> {
            self.inner.recent_sessions(since).await
        }

        async fn save_plan(&self, plan: &crate::types::MesocyclePlan) -> crate::RepositoryResult<()> {
            self.inner.save_plan(plan).await
        }

        async fn latest_plan(&self) -> crate::RepositoryResult<Option<crate::types::MesocyclePlan>> {
            self.inner.latest_plan().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_save_does_not_block_retry() {
        let store = Arc::new(StalledSaves {
            inner: InMemoryStore::new(),
            stalled: std::sync::atomic::AtomicBool::new(true),
        });
        let mut vm = WorkoutViewModel::new(one_log_session(), store.clone(), &LoggingConfig::default());
        let log_id = vm.state().session.exercise_logs()[0].id;
        vm.send(Action::SetEdited { log_id, set: new_set(90.0, 6) }).await;
        let before = vm.state().session.clone();

        let abandoned = tokio::time::timeout(Duration::from_secs(5), vm.send(Action::FinishTapped)).await;
        assert!(abandoned.is_err());
        assert!(vm.state().is_saving);
        assert_eq!(vm.state().session, before);

        store.stalled.store(false, std::sync::atomic::Ordering::SeqCst);
        vm.send(Action::FinishTapped).await;

        assert!(!vm.state().is_saving);
        assert!(!vm.state().session.is_active());
        assert!(matches!(vm.presentation().sheet, Some(Sheet::Summary(_))));
        assert!(store.inner.session(before.id()).await.unwrap().is_some());
    }
}

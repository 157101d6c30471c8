//! In-memory repository implementation.
//!
//! Used by tests and as a scratch backend. Saves can be made to fail to
//! exercise error paths.

use crate::analytics::{self, AnalyticsSummary, LoggedSet, PersonalRecord, WeeklyVolume};
use crate::error::{RepositoryError, RepositoryResult};
use crate::repository::{
    merge_catalog, AnalyticsRepository, CatalogStream, ExerciseRepository, WorkoutRepository,
};
use crate::types::{Exercise, ExerciseId, MesocyclePlan, SessionId, SetRecord, WorkoutSession};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

#[derive(Default)]
struct Inner {
    exercises: Vec<Exercise>,
    sessions: HashMap<SessionId, WorkoutSession>,
    plan: Option<MesocyclePlan>,
    logged_sets: Vec<LoggedSet>,
    summary: Option<AnalyticsSummary>,
    fail_saves: bool,
    withhold_confirmation: bool,
}

/// Mutex-guarded store implementing every repository contract
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    catalog_tx: watch::Sender<Vec<Exercise>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_catalog(Vec::new())
    }

    pub fn with_catalog(exercises: Vec<Exercise>) -> Self {
        let (catalog_tx, _) = watch::channel(exercises.clone());
        Self {
            inner: Mutex::new(Inner {
                exercises,
                ..Inner::default()
            }),
            catalog_tx,
        }
    }

    /// Make every subsequent write fail with `PersistenceFailed`
    pub fn fail_saves(&self, fail: bool) -> RepositoryResult<()> {
        self.lock()?.fail_saves = fail;
        Ok(())
    }

    /// Make `save_session` succeed without returning the stored copy
    pub fn withhold_confirmation(&self, withhold: bool) -> RepositoryResult<()> {
        self.lock()?.withhold_confirmation = withhold;
        Ok(())
    }

    pub fn cached_summary(&self) -> RepositoryResult<Option<AnalyticsSummary>> {
        Ok(self.lock()?.summary.clone())
    }

    pub fn logged_sets(&self) -> RepositoryResult<Vec<LoggedSet>> {
        Ok(self.lock()?.logged_sets.clone())
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| RepositoryError::Unknown(format!("store lock poisoned: {}", e)))
    }

    fn writable(&self) -> RepositoryResult<MutexGuard<'_, Inner>> {
        let inner = self.lock()?;
        if inner.fail_saves {
            return Err(RepositoryError::persistence("simulated storage failure"));
        }
        Ok(inner)
    }
}

#[async_trait]
impl ExerciseRepository for InMemoryStore {
    async fn fetch_all(&self) -> RepositoryResult<Vec<Exercise>> {
        Ok(self.lock()?.exercises.clone())
    }

    async fn fetch(&self, id: &ExerciseId) -> RepositoryResult<Option<Exercise>> {
        Ok(self.lock()?.exercises.iter().find(|e| &e.id == id).cloned())
    }

    async fn save(&self, exercises: Vec<Exercise>) -> RepositoryResult<()> {
        let snapshot = {
            let mut inner = self.writable()?;
            merge_catalog(&mut inner.exercises, exercises);
            inner.exercises.clone()
        };
        self.catalog_tx.send_replace(snapshot);
        Ok(())
    }

    fn observe_catalog(&self) -> CatalogStream {
        Box::pin(WatchStream::new(self.catalog_tx.subscribe()))
    }
}

#[async_trait]
impl WorkoutRepository for InMemoryStore {
    async fn session(&self, id: SessionId) -> RepositoryResult<Option<WorkoutSession>> {
        Ok(self.lock()?.sessions.get(&id).cloned())
    }

    async fn save_session(&self, session: &WorkoutSession) -> RepositoryResult<Option<WorkoutSession>> {
        let mut inner = self.writable()?;
        inner.sessions.insert(session.id(), session.clone());
        if inner.withhold_confirmation {
            Ok(None)
        } else {
            Ok(Some(session.clone()))
        }
    }

    async fn save_set(
        &self,
        set: &SetRecord,
        exercise_id: &ExerciseId,
        session_id: SessionId,
    ) -> RepositoryResult<()> {
        let mut inner = self.writable()?;
        let session = inner
            .sessions
            .get_mut(&session_id)
            .ok_or(RepositoryError::NotFound)?;
        session.append_set_for_exercise(exercise_id, set.clone());
        Ok(())
    }

    async fn recent_sessions(&self, since: DateTime<Utc>) -> RepositoryResult<Vec<WorkoutSession>> {
        let mut sessions: Vec<_> = self
            .lock()?
            .sessions
            .values()
            .filter(|s| s.started_at() >= since)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.started_at().cmp(&a.started_at()));
        Ok(sessions)
    }

    async fn save_plan(&self, plan: &MesocyclePlan) -> RepositoryResult<()> {
        self.writable()?.plan = Some(plan.clone());
        Ok(())
    }

    async fn latest_plan(&self) -> RepositoryResult<Option<MesocyclePlan>> {
        Ok(self.lock()?.plan.clone())
    }
}

#[async_trait]
impl AnalyticsRepository for InMemoryStore {
    async fn record(&self, set: LoggedSet) -> RepositoryResult<()> {
        self.writable()?.logged_sets.push(set);
        Ok(())
    }

    async fn fetch_weekly_volume(&self) -> RepositoryResult<Vec<WeeklyVolume>> {
        Ok(analytics::weekly_volume(&self.lock()?.logged_sets))
    }

    async fn fetch_personal_records(&self) -> RepositoryResult<Vec<PersonalRecord>> {
        Ok(analytics::personal_records(&self.lock()?.logged_sets))
    }

    async fn fetch_estimated_one_rep_max(&self, exercise_id: &ExerciseId) -> RepositoryResult<Option<f64>> {
        Ok(analytics::best_one_rep_maxes(&self.lock()?.logged_sets)
            .get(exercise_id)
            .copied())
    }

    async fn save_summary(&self, summary: &AnalyticsSummary) -> RepositoryResult<()> {
        self.writable()?.summary = Some(summary.clone());
        Ok(())
    }
}

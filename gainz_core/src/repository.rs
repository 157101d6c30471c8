//! Storage-agnostic contracts the planning and logging logic depends on.
//!
//! Implementations are injected as `Arc<dyn ...>` so tests and the CLI can
//! substitute backends freely.

use crate::analytics::{AnalyticsSummary, LoggedSet, PersonalRecord, WeeklyVolume};
use crate::error::RepositoryResult;
use crate::types::{Exercise, ExerciseId, MesocyclePlan, SessionId, SetRecord, WorkoutSession};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::pin::Pin;
use tokio_stream::Stream;

/// Stream of catalog snapshots, starting with the current catalog
pub type CatalogStream = Pin<Box<dyn Stream<Item = Vec<Exercise>> + Send>>;

#[async_trait]
pub trait ExerciseRepository: Send + Sync {
    async fn fetch_all(&self) -> RepositoryResult<Vec<Exercise>>;

    async fn fetch(&self, id: &ExerciseId) -> RepositoryResult<Option<Exercise>>;

    /// Insert or supersede catalog entries by id
    async fn save(&self, exercises: Vec<Exercise>) -> RepositoryResult<()>;

    fn observe_catalog(&self) -> CatalogStream;
}

#[async_trait]
pub trait WorkoutRepository: Send + Sync {
    async fn session(&self, id: SessionId) -> RepositoryResult<Option<WorkoutSession>>;

    /// Persist a session, returning the stored copy when the backend confirms one
    async fn save_session(&self, session: &WorkoutSession) -> RepositoryResult<Option<WorkoutSession>>;

    /// Append a set to the session's log for `exercise_id`
    async fn save_set(
        &self,
        set: &SetRecord,
        exercise_id: &ExerciseId,
        session_id: SessionId,
    ) -> RepositoryResult<()>;

    /// Sessions started at or after `since`, newest first
    async fn recent_sessions(&self, since: DateTime<Utc>) -> RepositoryResult<Vec<WorkoutSession>>;

    async fn save_plan(&self, plan: &MesocyclePlan) -> RepositoryResult<()>;

    async fn latest_plan(&self) -> RepositoryResult<Option<MesocyclePlan>>;
}

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn record(&self, set: LoggedSet) -> RepositoryResult<()>;

    async fn fetch_weekly_volume(&self) -> RepositoryResult<Vec<WeeklyVolume>>;

    async fn fetch_personal_records(&self) -> RepositoryResult<Vec<PersonalRecord>>;

    async fn fetch_estimated_one_rep_max(&self, exercise_id: &ExerciseId) -> RepositoryResult<Option<f64>>;

    async fn save_summary(&self, summary: &AnalyticsSummary) -> RepositoryResult<()>;
}

/// Merge `incoming` into `catalog`, replacing entries with the same id
pub(crate) fn merge_catalog(catalog: &mut Vec<Exercise>, incoming: Vec<Exercise>) {
    for exercise in incoming {
        match catalog.iter_mut().find(|e| e.id == exercise.id) {
            Some(existing) => *existing = exercise,
            None => catalog.push(exercise),
        }
    }
}

//! Session lifecycle use cases: start, log a set, finish.

use crate::analytics::LoggedSet;
use crate::repository::{AnalyticsRepository, WorkoutRepository};
use crate::types::{ExerciseId, ExerciseLog, SessionId, SetRecord, WorkoutPlan, WorkoutSession};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Creates and persists a new session, optionally from a day's plan
pub struct StartWorkoutUseCase {
    workouts: Arc<dyn WorkoutRepository>,
}

impl StartWorkoutUseCase {
    pub fn new(workouts: Arc<dyn WorkoutRepository>) -> Self {
        Self { workouts }
    }

    /// One empty log per planned exercise, followed by `extra_exercises`
    pub async fn execute(
        &self,
        plan: Option<&WorkoutPlan>,
        extra_exercises: &[ExerciseId],
        started_at: DateTime<Utc>,
    ) -> Result<WorkoutSession> {
        let planned = plan
            .map(|p| p.exercises.iter().map(|e| e.exercise_id.clone()).collect::<Vec<_>>())
            .unwrap_or_default();
        let logs = planned
            .into_iter()
            .chain(extra_exercises.iter().cloned())
            .map(ExerciseLog::new)
            .collect();

        let session = WorkoutSession::new(started_at, logs, None, plan.map(|p| p.id))?;
        let stored = self.workouts.save_session(&session).await?;

        tracing::info!(
            "Started session {} with {} exercises",
            session.id(),
            session.exercise_logs().len()
        );
        Ok(stored.unwrap_or(session))
    }
}

/// Appends a set to a stored, still-active session
pub struct LogSetUseCase {
    workouts: Arc<dyn WorkoutRepository>,
    analytics: Arc<dyn AnalyticsRepository>,
}

impl LogSetUseCase {
    pub fn new(workouts: Arc<dyn WorkoutRepository>, analytics: Arc<dyn AnalyticsRepository>) -> Self {
        Self { workouts, analytics }
    }

    pub async fn execute(&self, session_id: SessionId, exercise_id: &ExerciseId, mut set: SetRecord) -> Result<()> {
        set.validate()?;

        let session = self
            .workouts
            .session(session_id)
            .await?
            .ok_or(Error::SessionNotFound(session_id))?;
        if !session.is_active() {
            return Err(Error::SessionNotActive(session_id));
        }

        let performed_at = *set.completed_at.get_or_insert_with(Utc::now);
        self.workouts.save_set(&set, exercise_id, session_id).await?;
        self.analytics
            .record(LoggedSet {
                session_id,
                exercise_id: exercise_id.clone(),
                set,
                performed_at,
            })
            .await?;

        tracing::debug!("Logged set for {} in session {}", exercise_id, session_id);
        Ok(())
    }
}

/// Sets the end time of a stored session and persists it
pub struct FinishWorkoutUseCase {
    workouts: Arc<dyn WorkoutRepository>,
}

impl FinishWorkoutUseCase {
    pub fn new(workouts: Arc<dyn WorkoutRepository>) -> Self {
        Self { workouts }
    }

    pub async fn execute(&self, session_id: SessionId, ended_at: DateTime<Utc>) -> Result<WorkoutSession> {
        let mut session = self
            .workouts
            .session(session_id)
            .await?
            .ok_or(Error::SessionNotFound(session_id))?;
        if !session.is_active() {
            return Err(Error::SessionNotActive(session_id));
        }

        session.finish(ended_at)?;
        let stored = self.workouts.save_session(&session).await?;
        tracing::info!("Finished session {} ({} sets)", session_id, session.total_sets());
        Ok(stored.unwrap_or(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::types::{DayFocus, EffortTarget, ExercisePrescription, RepRange, WorkoutPlanId};
    use chrono::Duration;

    fn plan() -> WorkoutPlan {
        let prescribe = |id: &str| ExercisePrescription {
            exercise_id: id.into(),
            target_sets: 3,
            rep_range: RepRange { low: 8, high: 12 },
            effort: EffortTarget::Rir(1),
        };
        WorkoutPlan {
            id: WorkoutPlanId::new(),
            week_index: 0,
            day_index: 0,
            focus: DayFocus::Pull,
            exercises: vec![prescribe("lat_pulldown"), prescribe("seated_cable_row")],
        }
    }

    #[tokio::test]
    async fn test_start_from_plan() {
        let store = Arc::new(InMemoryStore::new());
        let plan = plan();

        let session = StartWorkoutUseCase::new(store.clone())
            .execute(Some(&plan), &["hammer_curl".into()], Utc::now())
            .await
            .unwrap();

        assert_eq!(session.plan_id(), Some(plan.id));
        let ids: Vec<_> = session.exercise_logs().iter().map(|l| l.exercise_id.as_str()).collect();
        assert_eq!(ids, vec!["lat_pulldown", "seated_cable_row", "hammer_curl"]);
        assert!(store.session(session.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_start_without_exercises_fails() {
        let store = Arc::new(InMemoryStore::new());
        let result = StartWorkoutUseCase::new(store).execute(None, &[], Utc::now()).await;
        assert!(matches!(result, Err(Error::InvalidSession(_))));
    }

    #[tokio::test]
    async fn test_log_set_records_analytics() {
        let store = Arc::new(InMemoryStore::new());
        let session = StartWorkoutUseCase::new(store.clone())
            .execute(Some(&plan()), &[], Utc::now())
            .await
            .unwrap();

        let set = SetRecord::new(65.0, 10, None, None).unwrap();
        LogSetUseCase::new(store.clone(), store.clone())
            .execute(session.id(), &"lat_pulldown".into(), set)
            .await
            .unwrap();

        let stored = store.session(session.id()).await.unwrap().unwrap();
        assert_eq!(stored.total_sets(), 1);
        let logged = store.logged_sets().unwrap();
        assert_eq!(logged.len(), 1);
        assert!(logged[0].set.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_log_set_unknown_session() {
        let store = Arc::new(InMemoryStore::new());
        let missing = SessionId::new();

        let result = LogSetUseCase::new(store.clone(), store)
            .execute(missing, &"dip".into(), SetRecord::new(10.0, 8, None, None).unwrap())
            .await;

        assert!(matches!(result, Err(Error::SessionNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn test_finished_session_rejects_sets_and_second_finish() {
        let store = Arc::new(InMemoryStore::new());
        let start = Utc::now();
        let session = StartWorkoutUseCase::new(store.clone())
            .execute(Some(&plan()), &[], start)
            .await
            .unwrap();

        let finish = FinishWorkoutUseCase::new(store.clone());
        let finished = finish
            .execute(session.id(), start + Duration::minutes(50))
            .await
            .unwrap();
        assert!(!finished.is_active());

        let result = LogSetUseCase::new(store.clone(), store.clone())
            .execute(session.id(), &"lat_pulldown".into(), SetRecord::new(65.0, 10, None, None).unwrap())
            .await;
        assert!(matches!(result, Err(Error::SessionNotActive(_))));

        let again = finish.execute(session.id(), start + Duration::minutes(55)).await;
        assert!(matches!(again, Err(Error::SessionNotActive(_))));
    }

    #[tokio::test]
    async fn test_invalid_set_rejected_before_lookup() {
        let store = Arc::new(InMemoryStore::new());
        let result = LogSetUseCase::new(store.clone(), store)
            .execute(SessionId::new(), &"dip".into(), SetRecord::draft())
            .await;
        assert!(matches!(result, Err(Error::InvalidSet(_))));
    }
}

//! Read-only projections over logged training history.
//!
//! Summaries are derived on demand from sessions; the stored summary is a
//! cache, never the source of truth.

use crate::repository::{AnalyticsRepository, WorkoutRepository};
use crate::types::{ExerciseId, SessionId, SetRecord, WorkoutSession};
use crate::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A set together with where and when it was performed
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LoggedSet {
    pub session_id: SessionId,
    pub exercise_id: ExerciseId,
    pub set: SetRecord,
    pub performed_at: DateTime<Utc>,
}

impl LoggedSet {
    /// Flatten a session into its logged sets
    pub fn from_session(session: &WorkoutSession) -> Vec<LoggedSet> {
        session
            .exercise_logs()
            .iter()
            .flat_map(|log| {
                log.sets.iter().map(|set| LoggedSet {
                    session_id: session.id(),
                    exercise_id: log.exercise_id.clone(),
                    set: set.clone(),
                    performed_at: set.completed_at.unwrap_or_else(|| session.started_at()),
                })
            })
            .collect()
    }
}

/// Work done in one calendar week (starting Monday)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WeeklyVolume {
    pub week_start: NaiveDate,
    pub sets: usize,
    pub tonnage: f64,
}

/// Heaviest set ever performed for one exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersonalRecord {
    pub exercise_id: ExerciseId,
    pub weight: f64,
    pub reps: u32,
    pub estimated_one_rep_max: f64,
    pub achieved_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsSummary {
    pub generated_at: DateTime<Utc>,
    pub total_sessions: usize,
    pub total_sets: usize,
    pub total_tonnage: f64,
    pub weekly_volume: Vec<WeeklyVolume>,
    pub personal_records: Vec<PersonalRecord>,
    pub estimated_one_rep_max: BTreeMap<ExerciseId, f64>,
}

/// Epley estimate of the one-repetition maximum
pub fn estimated_one_rep_max(weight: f64, reps: u32) -> f64 {
    match reps {
        0 => 0.0,
        1 => weight,
        _ => weight * (1.0 + f64::from(reps) / 30.0),
    }
}

fn week_start(at: DateTime<Utc>) -> NaiveDate {
    let date = at.date_naive();
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Sets and tonnage per week, oldest week first
pub fn weekly_volume(sets: &[LoggedSet]) -> Vec<WeeklyVolume> {
    let mut weeks: BTreeMap<NaiveDate, WeeklyVolume> = BTreeMap::new();
    for logged in sets {
        let start = week_start(logged.performed_at);
        let week = weeks.entry(start).or_insert_with(|| WeeklyVolume {
            week_start: start,
            sets: 0,
            tonnage: 0.0,
        });
        week.sets += 1;
        week.tonnage += logged.set.tonnage();
    }
    weeks.into_values().collect()
}

/// Best set per exercise id: heaviest weight, then most reps, then earliest
pub fn personal_records(sets: &[LoggedSet]) -> Vec<PersonalRecord> {
    let mut records: BTreeMap<&ExerciseId, &LoggedSet> = BTreeMap::new();
    for logged in sets {
        let better = match records.get(&logged.exercise_id) {
            None => true,
            Some(best) => {
                logged.set.weight > best.set.weight
                    || (logged.set.weight == best.set.weight && logged.set.reps > best.set.reps)
                    || (logged.set.weight == best.set.weight
                        && logged.set.reps == best.set.reps
                        && logged.performed_at < best.performed_at)
            }
        };
        if better {
            records.insert(&logged.exercise_id, logged);
        }
    }

    records
        .into_values()
        .map(|logged| PersonalRecord {
            exercise_id: logged.exercise_id.clone(),
            weight: logged.set.weight,
            reps: logged.set.reps,
            estimated_one_rep_max: estimated_one_rep_max(logged.set.weight, logged.set.reps),
            achieved_at: logged.performed_at,
        })
        .collect()
}

/// Highest Epley estimate per exercise id
pub fn best_one_rep_maxes(sets: &[LoggedSet]) -> BTreeMap<ExerciseId, f64> {
    let mut best: BTreeMap<ExerciseId, f64> = BTreeMap::new();
    for logged in sets {
        let estimate = estimated_one_rep_max(logged.set.weight, logged.set.reps);
        let entry = best.entry(logged.exercise_id.clone()).or_insert(0.0);
        if estimate > *entry {
            *entry = estimate;
        }
    }
    best
}

/// Compute a summary over the given sessions
pub fn summarize(sessions: &[WorkoutSession], now: DateTime<Utc>) -> AnalyticsSummary {
    let sets: Vec<LoggedSet> = sessions.iter().flat_map(LoggedSet::from_session).collect();

    AnalyticsSummary {
        generated_at: now,
        total_sessions: sessions.len(),
        total_sets: sets.len(),
        total_tonnage: sets.iter().map(|s| s.set.tonnage()).sum(),
        weekly_volume: weekly_volume(&sets),
        personal_records: personal_records(&sets),
        estimated_one_rep_max: best_one_rep_maxes(&sets),
    }
}

/// Derives and caches an analytics summary from recent sessions
pub struct CalculateAnalyticsUseCase {
    workouts: Arc<dyn WorkoutRepository>,
    analytics: Arc<dyn AnalyticsRepository>,
}

impl CalculateAnalyticsUseCase {
    pub fn new(workouts: Arc<dyn WorkoutRepository>, analytics: Arc<dyn AnalyticsRepository>) -> Self {
        Self { workouts, analytics }
    }

    /// Summarize every session started at or after `since`
    pub async fn execute(&self, since: DateTime<Utc>) -> Result<AnalyticsSummary> {
        let sessions = self.workouts.recent_sessions(since).await?;
        let summary = summarize(&sessions, Utc::now());
        self.analytics.save_summary(&summary).await?;

        tracing::info!(
            "Summarized {} sessions ({} sets, {:.1} total tonnage)",
            summary.total_sessions,
            summary.total_sets,
            summary.total_tonnage
        );
        Ok(summary)
    }
}

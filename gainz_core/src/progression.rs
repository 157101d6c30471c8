//! Load/rep progression between sessions.
//!
//! Double progression: add reps inside the prescribed range until every set
//! reaches the top, then add load and drop back to the bottom of the range.

use crate::config::ProgressionConfig;
use crate::types::{ExerciseId, ExercisePrescription, SetRecord, WorkoutSession};
use serde::{Deserialize, Serialize};

/// Suggested weight and reps for the next session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetTarget {
    pub weight: f64,
    pub reps: u32,
}

pub trait ProgressionStrategy: Send + Sync {
    /// Target for the next session, or None without history
    fn next_target(&self, prescription: &ExercisePrescription, last_sets: &[SetRecord]) -> Option<SetTarget>;
}

#[derive(Clone, Debug)]
pub struct DoubleProgression {
    load_increment: f64,
}

impl DoubleProgression {
    pub fn new(config: &ProgressionConfig) -> Self {
        Self {
            load_increment: config.load_increment,
        }
    }
}

impl Default for DoubleProgression {
    fn default() -> Self {
        Self::new(&ProgressionConfig::default())
    }
}

impl ProgressionStrategy for DoubleProgression {
    fn next_target(&self, prescription: &ExercisePrescription, last_sets: &[SetRecord]) -> Option<SetTarget> {
        let range = prescription.rep_range;
        let working_weight = last_sets
            .iter()
            .map(|s| s.weight)
            .fold(None, |max: Option<f64>, w| Some(max.map_or(w, |m| m.max(w))))?;

        let worst_reps = last_sets
            .iter()
            .filter(|s| s.weight == working_weight)
            .map(|s| s.reps)
            .min()?;

        if worst_reps >= range.high {
            let target = SetTarget {
                weight: working_weight + self.load_increment,
                reps: range.low,
            };
            tracing::debug!(
                "{}: top of range reached, load up to {}",
                prescription.exercise_id,
                target.weight
            );
            return Some(target);
        }

        Some(SetTarget {
            weight: working_weight,
            reps: (worst_reps + 1).clamp(range.low, range.high),
        })
    }
}

/// Sets from the most recent session that logged `exercise_id`
pub fn last_sets_for<'a>(exercise_id: &ExerciseId, history: &'a [WorkoutSession]) -> &'a [SetRecord] {
    history
        .iter()
        .filter(|s| s.exercise_logs().iter().any(|l| &l.exercise_id == exercise_id && !l.sets.is_empty()))
        .max_by_key(|s| s.started_at())
        .and_then(|s| {
            s.exercise_logs()
                .iter()
                .find(|l| &l.exercise_id == exercise_id && !l.sets.is_empty())
        })
        .map(|l| l.sets.as_slice())
        .unwrap_or(&[])
}

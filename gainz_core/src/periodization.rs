//! Week-by-week volume periodization.
//!
//! Volume ramps linearly towards the base weekly volume and the final week
//! is always a deload.

use crate::config::PeriodizationConfig;
use crate::repository::ExerciseRepository;
use crate::types::{ExerciseId, MuscleGroup, Objective, WeeklySummary};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const MIN_WEEKS: u8 = 4;
pub const MAX_WEEKS: u8 = 6;

/// Athlete-facing description of the mesocycle to periodize
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MesocycleTemplate {
    /// Catalog names of the main lifts; resolved by exact match
    pub primary_exercise_names: Vec<String>,
    /// Target weekly sets per muscle group at peak
    pub weekly_volume: BTreeMap<MuscleGroup, u32>,
    pub weeks: u8,
    pub goal: Objective,
}

/// Volume targets for one week
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeekBlock {
    pub week_index: u8,
    pub volume: BTreeMap<MuscleGroup, u32>,
    pub deload: bool,
}

pub trait PeriodizationStrategy: Send + Sync {
    fn generate_blocks(&self, base_volume: &BTreeMap<MuscleGroup, u32>, weeks: u8) -> Result<Vec<WeekBlock>>;
}

/// Linear ramp from `base / weeks` up to `base`, then a deload week
#[derive(Clone, Debug)]
pub struct LinearPeriodization {
    deload_factor: f64,
}

impl Default for LinearPeriodization {
    fn default() -> Self {
        Self::new(&PeriodizationConfig::default())
    }
}

impl LinearPeriodization {
    pub fn new(config: &PeriodizationConfig) -> Self {
        Self {
            deload_factor: config.deload_factor,
        }
    }
}

fn scale(volume: u32, factor: f64) -> u32 {
    (f64::from(volume) * factor).round().max(0.0) as u32
}

impl PeriodizationStrategy for LinearPeriodization {
    fn generate_blocks(&self, base_volume: &BTreeMap<MuscleGroup, u32>, weeks: u8) -> Result<Vec<WeekBlock>> {
        if !(MIN_WEEKS..=MAX_WEEKS).contains(&weeks) {
            return Err(Error::Planning(format!(
                "mesocycle must span {} to {} weeks, got {}",
                MIN_WEEKS, MAX_WEEKS, weeks
            )));
        }

        let blocks = (0..weeks)
            .map(|week_index| {
                let deload = week_index == weeks - 1;
                let factor = if deload {
                    self.deload_factor
                } else {
                    f64::from(week_index + 1) / f64::from(weeks)
                };
                WeekBlock {
                    week_index,
                    volume: base_volume
                        .iter()
                        .map(|(muscle, volume)| (*muscle, scale(*volume, factor)))
                        .collect(),
                    deload,
                }
            })
            .collect();

        Ok(blocks)
    }
}

/// Result of periodizing a template
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PeriodizedMesocycle {
    pub goal: Objective,
    pub primary_exercise_ids: Vec<ExerciseId>,
    pub blocks: Vec<WeekBlock>,
}

impl PeriodizedMesocycle {
    pub fn weekly_summaries(&self) -> Vec<WeeklySummary> {
        self.blocks
            .iter()
            .map(|block| WeeklySummary {
                week_index: block.week_index,
                volume: block.volume.clone(),
                notes: if block.deload {
                    "Deload".to_string()
                } else {
                    format!("Build week {}", block.week_index + 1)
                },
            })
            .collect()
    }
}

pub struct PlanMesocycleUseCase {
    exercises: Arc<dyn ExerciseRepository>,
    strategy: Box<dyn PeriodizationStrategy>,
}

impl PlanMesocycleUseCase {
    pub fn new(exercises: Arc<dyn ExerciseRepository>, strategy: Box<dyn PeriodizationStrategy>) -> Self {
        Self { exercises, strategy }
    }

    pub async fn execute(&self, template: &MesocycleTemplate) -> Result<PeriodizedMesocycle> {
        let blocks = self
            .strategy
            .generate_blocks(&template.weekly_volume, template.weeks)?;

        let catalog = self.exercises.fetch_all().await?;
        let primary_exercise_ids = template
            .primary_exercise_names
            .iter()
            .filter_map(|name| match catalog.iter().find(|e| &e.name == name) {
                Some(exercise) => Some(exercise.id.clone()),
                None => {
                    tracing::warn!("No catalog exercise named '{}', dropping it", name);
                    None
                }
            })
            .collect();

        tracing::info!(
            "Periodized {:?} mesocycle over {} weeks",
            template.goal,
            template.weeks
        );

        Ok(PeriodizedMesocycle {
            goal: template.goal,
            primary_exercise_ids,
            blocks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_default_catalog;
    use crate::memory::InMemoryStore;

    fn base_volume() -> BTreeMap<MuscleGroup, u32> {
        BTreeMap::from([
            (MuscleGroup::Chest, 12),
            (MuscleGroup::Back, 14),
            (MuscleGroup::Quadriceps, 10),
            (MuscleGroup::Calves, 1),
        ])
    }

    #[test]
    fn test_five_week_ramp_and_deload() {
        let blocks = LinearPeriodization::default()
            .generate_blocks(&base_volume(), 5)
            .unwrap();

        assert_eq!(blocks.len(), 5);
        for muscle in base_volume().keys() {
            for week in 1..4 {
                assert!(blocks[week].volume[muscle] >= blocks[week - 1].volume[muscle]);
            }
        }
        for (muscle, base) in base_volume() {
            assert_eq!(blocks[4].volume[&muscle], (f64::from(base) * 0.6).round() as u32);
        }
        assert!(blocks[4].deload);
        assert!(blocks[..4].iter().all(|b| !b.deload));
    }

    #[test]
    fn test_ramp_values() {
        let blocks = LinearPeriodization::default()
            .generate_blocks(&base_volume(), 4)
            .unwrap();

        let chest: Vec<_> = blocks.iter().map(|b| b.volume[&MuscleGroup::Chest]).collect();
        // 12 * 1/4, 12 * 2/4, 12 * 3/4, deload 12 * 0.6 = 7.2
        assert_eq!(chest, vec![3, 6, 9, 7]);
    }

    #[test]
    fn test_week_bounds() {
        let strategy = LinearPeriodization::default();
        assert!(strategy.generate_blocks(&base_volume(), 3).is_err());
        assert!(strategy.generate_blocks(&base_volume(), 7).is_err());
        assert_eq!(strategy.generate_blocks(&base_volume(), 6).unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_unmatched_names_are_dropped() {
        let store = Arc::new(InMemoryStore::with_catalog(build_default_catalog()));
        let use_case = PlanMesocycleUseCase::new(store, Box::new(LinearPeriodization::default()));
        let template = MesocycleTemplate {
            primary_exercise_names: vec![
                "Barbell Bench Press".into(),
                "Underwater Basket Weaving".into(),
                "deadlift".into(),
                "Deadlift".into(),
            ],
            weekly_volume: base_volume(),
            weeks: 5,
            goal: Objective::Strength,
        };

        let mesocycle = use_case.execute(&template).await.unwrap();

        assert_eq!(
            mesocycle.primary_exercise_ids,
            vec![ExerciseId::new("barbell_bench_press"), ExerciseId::new("deadlift")]
        );
        let summaries = mesocycle.weekly_summaries();
        assert_eq!(summaries.len(), 5);
        assert_eq!(summaries[4].notes, "Deload");
    }
}

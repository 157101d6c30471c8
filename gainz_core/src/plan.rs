//! Initial mesocycle generation.
//!
//! Builds the athlete's first plan from an onboarding request:
//! 1. Choose a split for the weekly frequency and experience
//! 2. Filter the catalog per day focus and available equipment
//! 3. Shuffle candidates with a seedable generator and take the first few
//! 4. Prescribe fixed sets, rep range and effort for every pick

use crate::config::PlanningConfig;
use crate::repository::ExerciseRepository;
use crate::rng::SeededGenerator;
use crate::split::SplitPlanner;
use crate::types::{
    DayFocus, Equipment, Exercise, ExercisePrescription, Experience, MesocyclePlan, Objective,
    PlanId, WeeklySummary, WorkoutPlan, WorkoutPlanId,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Onboarding answers that drive the first plan
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitialPlanRequest {
    pub weekly_frequency: u8,
    pub owns_barbell: bool,
    pub experience: Experience,
    /// Fixed seed for reproducible plans; system randomness otherwise
    pub random_seed: Option<u64>,
}

/// Filters and samples catalog exercises for a day focus
pub struct ExerciseSelector<'a> {
    catalog: &'a [Exercise],
    owns_barbell: bool,
}

impl<'a> ExerciseSelector<'a> {
    pub fn new(catalog: &'a [Exercise], owns_barbell: bool) -> Self {
        Self {
            catalog,
            owns_barbell,
        }
    }

    /// Exercises matching the focus and equipment, in catalog order
    pub fn candidates(&self, focus: DayFocus) -> Vec<&'a Exercise> {
        self.catalog
            .iter()
            .filter(|e| self.owns_barbell || e.equipment != Equipment::Barbell)
            .filter(|e| e.targets_any(focus.target_muscles()))
            .collect()
    }

    pub fn select(&self, focus: DayFocus, count: usize, rng: &mut SeededGenerator) -> Vec<&'a Exercise> {
        let mut candidates = self.candidates(focus);
        rng.shuffle(&mut candidates);
        candidates.truncate(count);
        candidates
    }
}

fn next_uuid(rng: &mut SeededGenerator) -> Uuid {
    let high = u128::from(rng.next_u64());
    let low = u128::from(rng.next_u64());
    Uuid::from_u128((high << 64) | low)
}

pub struct GenerateInitialPlanUseCase {
    exercises: Arc<dyn ExerciseRepository>,
    config: PlanningConfig,
}

impl GenerateInitialPlanUseCase {
    pub fn new(exercises: Arc<dyn ExerciseRepository>, config: PlanningConfig) -> Self {
        Self { exercises, config }
    }

    /// Generate a hypertrophy mesocycle for the request.
    ///
    /// With a fixed seed the output depends only on the catalog and request.
    /// Fails if a day has no exercise matching its focus and equipment.
    pub async fn execute(&self, request: &InitialPlanRequest) -> Result<MesocyclePlan> {
        let catalog = self.exercises.fetch_all().await?;
        let mut rng = match request.random_seed {
            Some(seed) => SeededGenerator::new(seed),
            None => SeededGenerator::from_entropy(),
        };

        let split = SplitPlanner::choose_split(request.weekly_frequency, request.experience);
        tracing::info!(
            "Planning {} days per week ({:?}): {:?}",
            request.weekly_frequency,
            request.experience,
            split
        );

        let rep_range = self.config.rep_range()?;
        let selector = ExerciseSelector::new(&catalog, request.owns_barbell);
        let mut workouts = Vec::with_capacity(split.len());

        for (day_index, focus) in split.into_iter().enumerate() {
            let picks = selector.select(focus, self.config.exercises_per_day, &mut rng);
            if picks.is_empty() {
                return Err(Error::Planning(format!(
                    "no catalog exercise fits day {} ({:?}{})",
                    day_index + 1,
                    focus,
                    if request.owns_barbell { "" } else { ", no barbell" }
                )));
            }
            tracing::debug!(
                "Day {} ({:?}): {:?}",
                day_index + 1,
                focus,
                picks.iter().map(|e| e.id.as_str()).collect::<Vec<_>>()
            );

            let exercises = picks
                .into_iter()
                .map(|exercise| ExercisePrescription {
                    exercise_id: exercise.id.clone(),
                    target_sets: self.config.sets_per_exercise,
                    rep_range,
                    effort: self.config.effort(),
                })
                .collect();

            workouts.push(WorkoutPlan {
                id: WorkoutPlanId::from(next_uuid(&mut rng)),
                week_index: 0,
                day_index: day_index as u8,
                focus,
                exercises,
            });
        }

        let weeks = self.config.mesocycle_weeks;
        let weekly_summaries = (0..weeks)
            .map(|week_index| WeeklySummary {
                week_index,
                ..WeeklySummary::default()
            })
            .collect();

        let plan = MesocyclePlan::new(
            PlanId::from(next_uuid(&mut rng)),
            Objective::Hypertrophy,
            weeks,
            workouts,
            weekly_summaries,
        )?;

        tracing::info!("Generated plan {} with {} workouts", plan.id, plan.workouts.len());
        Ok(plan)
    }
}

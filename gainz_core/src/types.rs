//! Core domain types for Gainz.
//!
//! This module defines the vocabulary shared by planning and logging:
//! - Catalog exercises and their muscle/equipment classification
//! - Performed sets, exercise logs and workout sessions
//! - Daily workout plans and multi-week mesocycles

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn nil() -> Self {
                Self(Uuid::nil())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| Error::Other(format!("Invalid UUID '{}': {}", s, e)))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// Identifies a workout session
    SessionId
);
uuid_id!(
    /// Identifies one exercise log within a session
    ExerciseLogId
);
uuid_id!(
    /// Identifies a performed set, used for diffing edits
    SetId
);
uuid_id!(
    /// Identifies a single day's workout plan
    WorkoutPlanId
);
uuid_id!(
    /// Identifies a mesocycle plan
    PlanId
);

/// Catalog identifier of an exercise (a stable slug such as `barbell_bench_press`)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ExerciseId(String);

impl ExerciseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ExerciseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Catalog Classification
// ============================================================================

/// Mutually exclusive muscle categories
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Forearms,
    Quadriceps,
    Hamstrings,
    Glutes,
    Calves,
    Abs,
}

impl MuscleGroup {
    pub const ALL: [MuscleGroup; 11] = [
        MuscleGroup::Chest,
        MuscleGroup::Back,
        MuscleGroup::Shoulders,
        MuscleGroup::Biceps,
        MuscleGroup::Triceps,
        MuscleGroup::Forearms,
        MuscleGroup::Quadriceps,
        MuscleGroup::Hamstrings,
        MuscleGroup::Glutes,
        MuscleGroup::Calves,
        MuscleGroup::Abs,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "chest",
            MuscleGroup::Back => "back",
            MuscleGroup::Shoulders => "shoulders",
            MuscleGroup::Biceps => "biceps",
            MuscleGroup::Triceps => "triceps",
            MuscleGroup::Forearms => "forearms",
            MuscleGroup::Quadriceps => "quadriceps",
            MuscleGroup::Hamstrings => "hamstrings",
            MuscleGroup::Glutes => "glutes",
            MuscleGroup::Calves => "calves",
            MuscleGroup::Abs => "abs",
        }
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MuscleGroup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "quads" => return Ok(MuscleGroup::Quadriceps),
            "hams" => return Ok(MuscleGroup::Hamstrings),
            "delts" => return Ok(MuscleGroup::Shoulders),
            _ => {}
        }
        MuscleGroup::ALL
            .into_iter()
            .find(|m| m.name() == lower)
            .ok_or_else(|| Error::Other(format!("Unknown muscle group: {}", s)))
    }
}

/// Equipment an exercise requires
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    Barbell,
    Dumbbell,
    Machine,
    Cable,
    Bodyweight,
    Kettlebell,
    Band,
}

/// Mechanical movement pattern
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MovementPattern {
    HorizontalPush,
    VerticalPush,
    HorizontalPull,
    VerticalPull,
    Squat,
    Hinge,
    Lunge,
    Isolation,
    Carry,
    Core,
}

/// A catalog entry. Immutable once created; a new entry with the same id supersedes it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    pub primary_muscles: BTreeSet<MuscleGroup>,
    #[serde(default)]
    pub secondary_muscles: BTreeSet<MuscleGroup>,
    pub pattern: MovementPattern,
    pub equipment: Equipment,
    #[serde(default)]
    pub unilateral: bool,
}

impl Exercise {
    pub fn new(
        id: impl Into<ExerciseId>,
        name: impl Into<String>,
        primary_muscles: impl IntoIterator<Item = MuscleGroup>,
        secondary_muscles: impl IntoIterator<Item = MuscleGroup>,
        pattern: MovementPattern,
        equipment: Equipment,
        unilateral: bool,
    ) -> Result<Self> {
        let exercise = Exercise {
            id: id.into(),
            name: name.into(),
            primary_muscles: primary_muscles.into_iter().collect(),
            secondary_muscles: secondary_muscles.into_iter().collect(),
            pattern,
            equipment,
            unilateral,
        };
        exercise.validate()?;
        Ok(exercise)
    }

    /// Check the primary/secondary muscle invariants
    pub fn validate(&self) -> Result<()> {
        if self.primary_muscles.is_empty() {
            return Err(Error::CatalogValidation(format!(
                "Exercise '{}' has no primary muscles",
                self.id
            )));
        }
        if let Some(overlap) = self
            .primary_muscles
            .intersection(&self.secondary_muscles)
            .next()
        {
            return Err(Error::CatalogValidation(format!(
                "Exercise '{}' lists {} as both primary and secondary",
                self.id, overlap
            )));
        }
        Ok(())
    }

    /// Whether any primary muscle is in the given target set
    pub fn targets_any(&self, muscles: &[MuscleGroup]) -> bool {
        self.primary_muscles.iter().any(|m| muscles.contains(m))
    }
}

impl From<String> for ExerciseId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================================================
// Logging Types
// ============================================================================

/// Perceived effort of a performed set; RIR and RPE are alternatives
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    /// Reps in reserve, 0..=5
    Rir(u8),
    /// Rate of perceived exertion, 1..=10
    Rpe(f32),
}

impl Effort {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Effort::Rir(rir) if rir > 5 => Err(Error::InvalidSet(format!(
                "RIR must be between 0 and 5, got {}",
                rir
            ))),
            Effort::Rpe(rpe) if !(1.0..=10.0).contains(&rpe) => Err(Error::InvalidSet(
                format!("RPE must be between 1 and 10, got {}", rpe),
            )),
            _ => Ok(()),
        }
    }
}

/// One performed set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetRecord {
    pub id: SetId,
    pub weight: f64,
    pub reps: u32,
    pub effort: Option<Effort>,
    pub tempo: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SetRecord {
    pub fn new(weight: f64, reps: u32, effort: Option<Effort>, tempo: Option<String>) -> Result<Self> {
        let set = SetRecord {
            id: SetId::new(),
            weight,
            reps,
            effort,
            tempo,
            completed_at: None,
        };
        set.validate()?;
        Ok(set)
    }

    /// Zero-valued draft used to pre-fill the set editor. Not valid until edited.
    pub fn draft() -> Self {
        SetRecord {
            id: SetId::new(),
            weight: 0.0,
            reps: 0,
            effort: None,
            tempo: None,
            completed_at: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.weight.is_finite() && self.weight > 0.0) {
            return Err(Error::InvalidSet(format!(
                "weight must be greater than zero, got {}",
                self.weight
            )));
        }
        if let Some(effort) = &self.effort {
            effort.validate()?;
        }
        Ok(())
    }

    /// Weight multiplied by reps
    pub fn tonnage(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

/// Outcome of upserting a set into a log
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetChange {
    Replaced,
    Appended,
}

/// Sets performed for one exercise within a session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseLog {
    pub id: ExerciseLogId,
    pub exercise_id: ExerciseId,
    pub sets: Vec<SetRecord>,
    pub perceived_exertion: Option<u8>,
    pub notes: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl ExerciseLog {
    pub fn new(exercise_id: ExerciseId) -> Self {
        ExerciseLog {
            id: ExerciseLogId::new(),
            exercise_id,
            sets: Vec::new(),
            perceived_exertion: None,
            notes: None,
            started_at: None,
            ended_at: None,
        }
    }

    /// Replace the set with the same id, or append it
    pub fn upsert_set(&mut self, set: SetRecord) -> SetChange {
        if let Some(existing) = self.sets.iter_mut().find(|s| s.id == set.id) {
            *existing = set;
            return SetChange::Replaced;
        }
        if self.started_at.is_none() {
            self.started_at = set.completed_at;
        }
        self.ended_at = set.completed_at.or(self.ended_at);
        self.sets.push(set);
        SetChange::Appended
    }

    pub fn tonnage(&self) -> f64 {
        self.sets.iter().map(SetRecord::tonnage).sum()
    }
}

/// Aggregate root of a workout.
///
/// The log list is private: all mutation goes through methods that rebuild
/// and replace the affected log, so copies taken before a mutation stay intact.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSession {
    id: SessionId,
    date: NaiveDate,
    exercise_logs: Vec<ExerciseLog>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    plan_id: Option<WorkoutPlanId>,
}

impl WorkoutSession {
    /// Create a session that satisfies every invariant
    pub fn new(
        started_at: DateTime<Utc>,
        exercise_logs: Vec<ExerciseLog>,
        ended_at: Option<DateTime<Utc>>,
        plan_id: Option<WorkoutPlanId>,
    ) -> Result<Self> {
        let session = WorkoutSession {
            id: SessionId::new(),
            date: started_at.date_naive(),
            exercise_logs,
            started_at,
            ended_at,
            plan_id,
        };
        session.validate()?;
        Ok(session)
    }

    /// Working copy for live logging; may hold no logs until exercises are picked
    pub fn draft(started_at: DateTime<Utc>, plan_id: Option<WorkoutPlanId>) -> Self {
        WorkoutSession {
            id: SessionId::new(),
            date: started_at.date_naive(),
            exercise_logs: Vec::new(),
            started_at,
            ended_at: None,
            plan_id,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.exercise_logs.is_empty() {
            return Err(Error::InvalidSession(
                "a session needs at least one exercise".into(),
            ));
        }
        if let Some(ended_at) = self.ended_at {
            if ended_at < self.started_at {
                return Err(Error::InvalidSession(format!(
                    "end time {} is before start time {}",
                    ended_at, self.started_at
                )));
            }
        }
        Ok(())
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn exercise_logs(&self) -> &[ExerciseLog] {
        &self.exercise_logs
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn plan_id(&self) -> Option<WorkoutPlanId> {
        self.plan_id
    }

    /// A session is active until its end time is set
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    pub fn total_sets(&self) -> usize {
        self.exercise_logs.iter().map(|l| l.sets.len()).sum()
    }

    pub fn tonnage(&self) -> f64 {
        self.exercise_logs.iter().map(ExerciseLog::tonnage).sum()
    }

    pub fn log(&self, id: ExerciseLogId) -> Option<&ExerciseLog> {
        self.exercise_logs.iter().find(|l| l.id == id)
    }

    pub fn position_of(&self, id: ExerciseLogId) -> Option<usize> {
        self.exercise_logs.iter().position(|l| l.id == id)
    }

    /// Append a log and return its position
    pub fn push_log(&mut self, log: ExerciseLog) -> usize {
        self.exercise_logs.push(log);
        self.exercise_logs.len() - 1
    }

    /// Replace or append a set in the given log
    pub fn upsert_set(&mut self, log_id: ExerciseLogId, set: SetRecord) -> Result<SetChange> {
        let index = self.position_of(log_id).ok_or_else(|| {
            Error::InvalidSession(format!("exercise log {} is not part of session {}", log_id, self.id))
        })?;
        let mut rebuilt = self.exercise_logs[index].clone();
        let change = rebuilt.upsert_set(set);
        self.exercise_logs[index] = rebuilt;
        Ok(change)
    }

    /// Append a set to the first log for `exercise_id`, creating the log if needed
    pub fn append_set_for_exercise(&mut self, exercise_id: &ExerciseId, set: SetRecord) -> SetChange {
        match self
            .exercise_logs
            .iter()
            .position(|l| &l.exercise_id == exercise_id)
        {
            Some(index) => {
                let mut rebuilt = self.exercise_logs[index].clone();
                let change = rebuilt.upsert_set(set);
                self.exercise_logs[index] = rebuilt;
                change
            }
            None => {
                let mut log = ExerciseLog::new(exercise_id.clone());
                log.upsert_set(set);
                self.exercise_logs.push(log);
                SetChange::Appended
            }
        }
    }

    /// Remove logs at the given positions. Out-of-range positions are ignored.
    ///
    /// Returns the number of logs removed.
    pub fn remove_logs(&mut self, positions: &[usize]) -> usize {
        let mut sorted: Vec<usize> = positions
            .iter()
            .copied()
            .filter(|&p| p < self.exercise_logs.len())
            .collect();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        for position in &sorted {
            self.exercise_logs.remove(*position);
        }
        sorted.len()
    }

    /// Set the end time, finalizing the session
    pub fn finish(&mut self, at: DateTime<Utc>) -> Result<()> {
        if at < self.started_at {
            return Err(Error::InvalidSession(format!(
                "end time {} is before start time {}",
                at, self.started_at
            )));
        }
        self.ended_at = Some(at);
        Ok(())
    }
}

// ============================================================================
// Planning Types
// ============================================================================

/// Inclusive repetition range
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepRange {
    pub low: u32,
    pub high: u32,
}

impl RepRange {
    pub fn new(low: u32, high: u32) -> Result<Self> {
        if low > high {
            return Err(Error::InvalidPlan(format!(
                "rep range low {} exceeds high {}",
                low, high
            )));
        }
        Ok(Self { low, high })
    }

    pub fn contains(&self, reps: u32) -> bool {
        (self.low..=self.high).contains(&reps)
    }
}

/// Effort target of a prescription; RIR and %1RM are mutually exclusive
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum EffortTarget {
    Rir(u8),
    PercentOneRm(f32),
}

/// Target work for one exercise on a given day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExercisePrescription {
    pub exercise_id: ExerciseId,
    pub target_sets: u32,
    pub rep_range: RepRange,
    pub effort: EffortTarget,
}

/// Training focus of a split day
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DayFocus {
    FullBody,
    Push,
    Pull,
    Legs,
    Upper,
    Lower,
    Accessory,
}

impl DayFocus {
    /// Muscles whose exercises qualify for this focus
    pub fn target_muscles(&self) -> &'static [MuscleGroup] {
        use MuscleGroup::*;
        match self {
            DayFocus::FullBody => &[Chest, Back, Shoulders, Quadriceps, Hamstrings, Glutes],
            DayFocus::Push => &[Chest, Shoulders, Triceps],
            DayFocus::Pull => &[Back, Biceps, Forearms],
            DayFocus::Legs => &[Quadriceps, Hamstrings, Glutes, Calves],
            DayFocus::Upper => &[Chest, Back, Shoulders, Biceps, Triceps],
            DayFocus::Lower => &[Quadriceps, Hamstrings, Glutes, Calves],
            DayFocus::Accessory => &[Biceps, Triceps, Forearms, Calves, Abs],
        }
    }
}

/// A single day's prescription. Read-only after planning.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutPlan {
    pub id: WorkoutPlanId,
    pub week_index: u8,
    pub day_index: u8,
    pub focus: DayFocus,
    pub exercises: Vec<ExercisePrescription>,
}

/// Adaptation objective of a mesocycle
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Hypertrophy,
    Strength,
    Peaking,
    Deload,
}

impl FromStr for Objective {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "hypertrophy" => Ok(Objective::Hypertrophy),
            "strength" => Ok(Objective::Strength),
            "peaking" => Ok(Objective::Peaking),
            "deload" => Ok(Objective::Deload),
            other => Err(Error::Other(format!("Unknown objective: {}", other))),
        }
    }
}

/// Training experience of the athlete
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Experience {
    Novice,
    Intermediate,
    Advanced,
}

impl FromStr for Experience {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "novice" | "beginner" => Ok(Experience::Novice),
            "intermediate" => Ok(Experience::Intermediate),
            "advanced" => Ok(Experience::Advanced),
            other => Err(Error::Other(format!("Unknown experience level: {}", other))),
        }
    }
}

/// Per-week volume targets and notes of a mesocycle
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct WeeklySummary {
    pub week_index: u8,
    pub volume: BTreeMap<MuscleGroup, u32>,
    pub notes: String,
}

/// Multi-week block of workouts. Superseded, never mutated.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MesocyclePlan {
    pub id: PlanId,
    pub objective: Objective,
    pub weeks: u8,
    pub workouts: Vec<WorkoutPlan>,
    pub weekly_summaries: Vec<WeeklySummary>,
}

impl MesocyclePlan {
    pub const MIN_WEEKS: u8 = 1;
    pub const MAX_WEEKS: u8 = 12;

    pub fn new(
        id: PlanId,
        objective: Objective,
        weeks: u8,
        workouts: Vec<WorkoutPlan>,
        weekly_summaries: Vec<WeeklySummary>,
    ) -> Result<Self> {
        let plan = MesocyclePlan {
            id,
            objective,
            weeks,
            workouts,
            weekly_summaries,
        };
        plan.validate()?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<()> {
        if !(Self::MIN_WEEKS..=Self::MAX_WEEKS).contains(&self.weeks) {
            return Err(Error::InvalidPlan(format!(
                "week count {} outside {}..={}",
                self.weeks,
                Self::MIN_WEEKS,
                Self::MAX_WEEKS
            )));
        }
        if let Some(workout) = self.workouts.iter().find(|w| w.week_index >= self.weeks) {
            return Err(Error::InvalidPlan(format!(
                "workout {} is scheduled in week {} of a {}-week plan",
                workout.id, workout.week_index, self.weeks
            )));
        }
        Ok(())
    }

    pub fn workouts_for_week(&self, week_index: u8) -> impl Iterator<Item = &WorkoutPlan> {
        self.workouts.iter().filter(move |w| w.week_index == week_index)
    }
}

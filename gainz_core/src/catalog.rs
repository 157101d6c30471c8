//! Default exercise catalog.
//!
//! This module provides the built-in exercises used to seed a fresh data
//! directory, and catalog validation.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Vec<Exercise>> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn default_catalog() -> &'static [Exercise] {
    &DEFAULT_CATALOG
}

fn entry(
    id: &str,
    name: &str,
    primary: &[MuscleGroup],
    secondary: &[MuscleGroup],
    pattern: MovementPattern,
    equipment: Equipment,
    unilateral: bool,
) -> Exercise {
    Exercise {
        id: ExerciseId::new(id),
        name: name.to_string(),
        primary_muscles: primary.iter().copied().collect(),
        secondary_muscles: secondary.iter().copied().collect(),
        pattern,
        equipment,
        unilateral,
    }
}

/// Builds the default catalog. Order is stable, which plan generation relies on.
#[rustfmt::skip]
pub fn build_default_catalog() -> Vec<Exercise> {
    use Equipment::*;
    use MovementPattern::*;
    use MuscleGroup::*;

    vec![
        // ====================================================================
        // Chest
        // ====================================================================
        entry("barbell_bench_press", "Barbell Bench Press", &[Chest], &[Triceps, Shoulders], HorizontalPush, Barbell, false),
        entry("incline_barbell_press", "Incline Barbell Press", &[Chest], &[Shoulders, Triceps], HorizontalPush, Barbell, false),
        entry("dumbbell_bench_press", "Dumbbell Bench Press", &[Chest], &[Triceps, Shoulders], HorizontalPush, Dumbbell, false),
        entry("incline_dumbbell_press", "Incline Dumbbell Press", &[Chest], &[Shoulders, Triceps], HorizontalPush, Dumbbell, false),
        entry("machine_chest_press", "Machine Chest Press", &[Chest], &[Triceps], HorizontalPush, Machine, false),
        entry("cable_fly", "Cable Fly", &[Chest], &[], Isolation, Cable, false),
        entry("push_up", "Push-up", &[Chest], &[Triceps, Shoulders, Abs], HorizontalPush, Bodyweight, false),
        // ====================================================================
        // Shoulders
        // ====================================================================
        entry("overhead_press", "Overhead Press", &[Shoulders], &[Triceps], VerticalPush, Barbell, false),
        entry("seated_dumbbell_press", "Seated Dumbbell Press", &[Shoulders], &[Triceps], VerticalPush, Dumbbell, false),
        entry("dumbbell_lateral_raise", "Dumbbell Lateral Raise", &[Shoulders], &[], Isolation, Dumbbell, false),
        entry("cable_lateral_raise", "Cable Lateral Raise", &[Shoulders], &[], Isolation, Cable, true),
        entry("reverse_pec_deck", "Reverse Pec Deck", &[Shoulders], &[Back], Isolation, Machine, false),
        // ====================================================================
        // Triceps
        // ====================================================================
        entry("close_grip_bench_press", "Close-Grip Bench Press", &[Triceps], &[Chest, Shoulders], HorizontalPush, Barbell, false),
        entry("cable_triceps_pushdown", "Cable Triceps Pushdown", &[Triceps], &[], Isolation, Cable, false),
        entry("overhead_triceps_extension", "Overhead Triceps Extension", &[Triceps], &[], Isolation, Dumbbell, false),
        entry("dip", "Dip", &[Triceps], &[Chest, Shoulders], VerticalPush, Bodyweight, false),
        // ====================================================================
        // Back
        // ====================================================================
        entry("barbell_row", "Barbell Row", &[Back], &[Biceps, Forearms], HorizontalPull, Barbell, false),
        entry("deadlift", "Deadlift", &[Back, Hamstrings, Glutes], &[Forearms, Quadriceps], Hinge, Barbell, false),
        entry("pull_up", "Pull-up", &[Back], &[Biceps, Forearms], VerticalPull, Bodyweight, false),
        entry("lat_pulldown", "Lat Pulldown", &[Back], &[Biceps], VerticalPull, Cable, false),
        entry("seated_cable_row", "Seated Cable Row", &[Back], &[Biceps], HorizontalPull, Cable, false),
        entry("one_arm_dumbbell_row", "One-Arm Dumbbell Row", &[Back], &[Biceps], HorizontalPull, Dumbbell, true),
        entry("chest_supported_row", "Chest-Supported Row", &[Back], &[Biceps, Shoulders], HorizontalPull, Machine, false),
        // ====================================================================
        // Arms
        // ====================================================================
        entry("barbell_curl", "Barbell Curl", &[Biceps], &[Forearms], Isolation, Barbell, false),
        entry("dumbbell_curl", "Dumbbell Curl", &[Biceps], &[Forearms], Isolation, Dumbbell, false),
        entry("hammer_curl", "Hammer Curl", &[Biceps], &[Forearms], Isolation, Dumbbell, false),
        entry("cable_curl", "Cable Curl", &[Biceps], &[], Isolation, Cable, false),
        entry("wrist_curl", "Wrist Curl", &[Forearms], &[], Isolation, Dumbbell, false),
        entry("farmer_carry", "Farmer Carry", &[Forearms], &[Back, Abs], Carry, Dumbbell, false),
        // ====================================================================
        // Legs
        // ====================================================================
        entry("barbell_back_squat", "Barbell Back Squat", &[Quadriceps], &[Glutes, Hamstrings], Squat, Barbell, false),
        entry("front_squat", "Front Squat", &[Quadriceps], &[Glutes, Abs], Squat, Barbell, false),
        entry("leg_press", "Leg Press", &[Quadriceps], &[Glutes], Squat, Machine, false),
        entry("goblet_squat", "Goblet Squat", &[Quadriceps], &[Glutes], Squat, Kettlebell, false),
        entry("bulgarian_split_squat", "Bulgarian Split Squat", &[Quadriceps], &[Glutes], Lunge, Dumbbell, true),
        entry("leg_extension", "Leg Extension", &[Quadriceps], &[], Isolation, Machine, false),
        entry("romanian_deadlift", "Romanian Deadlift", &[Hamstrings], &[Glutes, Back], Hinge, Barbell, false),
        entry("dumbbell_romanian_deadlift", "Dumbbell Romanian Deadlift", &[Hamstrings], &[Glutes], Hinge, Dumbbell, false),
        entry("lying_leg_curl", "Lying Leg Curl", &[Hamstrings], &[], Isolation, Machine, false),
        entry("kettlebell_swing", "Kettlebell Swing", &[Glutes], &[Hamstrings, Back], Hinge, Kettlebell, false),
        entry("hip_thrust", "Hip Thrust", &[Glutes], &[Hamstrings], Hinge, Barbell, false),
        entry("standing_calf_raise", "Standing Calf Raise", &[Calves], &[], Isolation, Machine, false),
        entry("seated_calf_raise", "Seated Calf Raise", &[Calves], &[], Isolation, Machine, false),
        // ====================================================================
        // Core
        // ====================================================================
        entry("cable_crunch", "Cable Crunch", &[Abs], &[], Core, Cable, false),
        entry("hanging_leg_raise", "Hanging Leg Raise", &[Abs], &[Forearms], Core, Bodyweight, false),
    ]
}

/// Validate a catalog for consistency and completeness
///
/// Returns a list of validation errors, or empty Vec if valid.
pub fn validate_catalog(exercises: &[Exercise]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for exercise in exercises {
        if exercise.id.as_str().is_empty() {
            errors.push("Exercise has empty ID".to_string());
        }
        if !seen.insert(&exercise.id) {
            errors.push(format!("Duplicate exercise ID '{}'", exercise.id));
        }
        if exercise.name.trim().is_empty() {
            errors.push(format!("Exercise '{}' has empty name", exercise.id));
        }
        if let Err(e) = exercise.validate() {
            errors.push(e.to_string());
        }
    }

    for focus in [
        DayFocus::FullBody,
        DayFocus::Push,
        DayFocus::Pull,
        DayFocus::Legs,
        DayFocus::Upper,
        DayFocus::Lower,
        DayFocus::Accessory,
    ] {
        if !exercises
            .iter()
            .any(|e| e.targets_any(focus.target_muscles()))
        {
            errors.push(format!("Catalog has no exercises for {:?} days", focus));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_FOCI: [DayFocus; 7] = [
        DayFocus::FullBody,
        DayFocus::Push,
        DayFocus::Pull,
        DayFocus::Legs,
        DayFocus::Upper,
        DayFocus::Lower,
        DayFocus::Accessory,
    ];

    #[test]
    fn test_default_catalog_validates() {
        let errors = validate_catalog(default_catalog());
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_every_focus_has_five_barbell_free_exercises() {
        let catalog = default_catalog();
        for focus in ALL_FOCI {
            let count = catalog
                .iter()
                .filter(|e| e.equipment != Equipment::Barbell)
                .filter(|e| e.targets_any(focus.target_muscles()))
                .count();
            assert!(count >= 5, "{:?} has only {} barbell-free exercises", focus, count);
        }
    }

    #[test]
    fn test_validation_reports_problems() {
        let mut exercises = build_default_catalog();
        exercises.push(exercises[0].clone());
        exercises[1].name = String::new();

        let errors = validate_catalog(&exercises);
        assert!(errors.iter().any(|e| e.contains("Duplicate")));
        assert!(errors.iter().any(|e| e.contains("empty name")));
    }

    #[test]
    fn test_empty_catalog_reports_uncovered_focus() {
        let errors = validate_catalog(&[]);
        assert_eq!(errors.len(), ALL_FOCI.len());
    }
}

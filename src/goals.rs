//src/goals.rs
//! Goal progress. Progress only ever grows from logged workouts; deleting a
//! workout leaves it untouched.
use std::fmt;

use crate::models::{Exercise, Goal, GoalKind, StrengthWorkout};

/// Adds a logged cardio session to every distance goal. Time is only
/// accumulated for goals that have a time limit.
pub fn on_cardio_logged(goals: &mut [Goal], distance_km: f64, duration_minutes: u32) {
    for goal in goals.iter_mut() {
        if let GoalKind::CardioDistance {
            target_time,
            progress_time,
        } = &mut goal.kind
        {
            goal.progress += distance_km;
            if *target_time > 0 {
                *progress_time = progress_time.saturating_add(duration_minutes);
            }
        }
    }
}

/// Credits each strength goal at most once for the given workout.
/// Returns how many goals advanced.
pub fn on_strength_logged(goals: &mut [Goal], workout: &StrengthWorkout) -> usize {
    let mut advanced = 0;
    for goal in goals.iter_mut() {
        if workout_achieves(&goal.kind, workout) {
            goal.progress += 1.0;
            advanced += 1;
        }
    }
    advanced
}

/// Whether the workout qualifies for a strength goal. Goals without an
/// exercise name (legacy records) never qualify.
pub fn workout_achieves(kind: &GoalKind, workout: &StrengthWorkout) -> bool {
    let GoalKind::StrengthExercise {
        exercise_name,
        ex_weight,
        ex_sets,
        ex_reps,
    } = kind
    else {
        return false;
    };
    if exercise_name.is_empty() {
        return false;
    }
    workout
        .exercises
        .iter()
        .filter(|e| names_match(&e.name, exercise_name))
        .any(|e| exercise_achieves(e, *ex_weight, *ex_sets, *ex_reps))
}

fn names_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn exercise_achieves(exercise: &Exercise, ex_weight: f64, ex_sets: u32, ex_reps: u32) -> bool {
    exercise.sets.len() >= ex_sets as usize
        && exercise
            .sets
            .iter()
            .any(|s| s.reps >= ex_reps && s.weight >= ex_weight)
}

/// `min(100, round(100 * progress / target))`; a non-positive target reads as 0%.
pub fn completion_percent(goal: &Goal) -> u32 {
    if goal.target <= 0.0 {
        return 0;
    }
    let pct = (100.0 * goal.progress / goal.target).round();
    pct.clamp(0.0, 100.0) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalStatus {
    Done,
    InProgress(u32),
}

impl GoalStatus {
    pub fn of(goal: &Goal) -> Self {
        match completion_percent(goal) {
            100 => Self::Done,
            pct => Self::InProgress(pct),
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done => write!(f, "Done"),
            Self::InProgress(pct) => write!(f, "{pct}%"),
        }
    }
}

/// One goal as the goal list shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalRow {
    pub name: String,
    pub type_label: &'static str,
    pub progress: f64,
    pub target: f64,
    pub percent: u32,
    pub status: GoalStatus,
}

impl From<&Goal> for GoalRow {
    fn from(goal: &Goal) -> Self {
        Self {
            name: goal.name.clone(),
            type_label: match goal.kind {
                GoalKind::CardioDistance { .. } => "Cardio",
                GoalKind::StrengthExercise { .. } => "Strength",
            },
            progress: goal.progress,
            target: goal.target,
            percent: completion_percent(goal),
            status: GoalStatus::of(goal),
        }
    }
}

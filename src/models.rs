//src/models.rs
use chrono::NaiveDate;
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Date format used for every date-bearing record on disk.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Characters the record codec uses as separators; names may not contain them.
pub const RESERVED_CHARS: [char; 4] = ['|', ';', ':', ','];

/// User-correctable rejections. Nothing is mutated when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} cannot be empty.")]
    EmptyField(&'static str),
    #[error("{field} cannot contain '{ch}'.")]
    ReservedCharacter { field: &'static str, ch: char },
    #[error("{0} cannot contain line breaks or control characters.")]
    ControlCharacter(&'static str),
    #[error("{0} must be greater than zero.")]
    NotPositive(&'static str),
    #[error("{0} cannot be negative.")]
    Negative(&'static str),
    #[error("Password must be at least {0} characters.")]
    PasswordTooShort(usize),
    #[error("Passwords don't match.")]
    PasswordMismatch,
    #[error("Username '{0}' is already taken.")]
    UsernameTaken(String),
    #[error("Invalid username or password.")]
    InvalidCredentials,
    #[error("A strength workout needs at least one exercise.")]
    NoExercises,
    #[error("Can't read exercise entry '{0}'. Use Name:RxW,RxW;Other:RxW.")]
    MalformedExercise(String),
    #[error("No {kind} entry at index {index} ({len} entries).")]
    NoSuchRecord {
        kind: RecordKind,
        index: usize,
        len: usize,
    },
    #[error("Not logged in. Use 'login' first.")]
    NotLoggedIn,
}

/// Rejects empty text, control characters and codec separators, so the
/// value always fits on one record line.
pub fn validate_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    if value.chars().any(char::is_control) {
        return Err(ValidationError::ControlCharacter(field));
    }
    if let Some(ch) = value.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(ValidationError::ReservedCharacter { field, ch });
    }
    Ok(())
}

pub(crate) fn validate_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NotPositive(field))
    }
}

/// Parses a stored `YYYY-MM-DD` date. Records whose date fails this are kept
/// but never aggregated.
pub fn parse_day(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
}

pub fn format_day(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// The record collections that support deletion by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RecordKind {
    Cardio,
    Strength,
    Bodyweight,
    Goal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserProfile {
    pub username: String,
    pub display_name: String,
    /// `None` until the profile has been completed.
    pub gender: Option<Gender>,
    pub weight: f64, // kg
    pub target_bodyweight: f64, // kg
    pub height: f64, // cm
    pub age: u32,
}

/// Fields supplied when completing or updating a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub gender: Gender,
    pub weight: f64,
    pub target_bodyweight: f64,
    pub height: f64,
    pub age: u32,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_positive("Weight", self.weight)?;
        validate_positive("Height", self.height)?;
        if self.target_bodyweight < 0.0 {
            return Err(ValidationError::Negative("Target bodyweight"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum CardioType {
    Running,
    Cycling,
    Swimming,
    Walking,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardioWorkout {
    pub date: String,
    pub type_: CardioType,
    pub duration_minutes: u32,
    pub distance_km: f64,
    pub calories: f64,
    pub avg_speed_kmh: f64,
}

impl CardioWorkout {
    pub fn day(&self) -> Option<NaiveDate> {
        parse_day(&self.date)
    }
}

#[derive(Debug, Clone)]
pub struct NewCardio {
    pub date: NaiveDate,
    pub type_: CardioType,
    pub duration_minutes: u32,
    pub distance_km: f64,
}

impl NewCardio {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.duration_minutes == 0 {
            return Err(ValidationError::NotPositive("Duration"));
        }
        validate_positive("Distance", self.distance_km)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExerciseSet {
    pub reps: u32,
    pub weight: f64, // kg
}

impl ExerciseSet {
    pub fn volume(&self) -> f64 {
        f64::from(self.reps) * self.weight
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub name: String,
    pub sets: Vec<ExerciseSet>,
}

impl Exercise {
    pub fn volume(&self) -> f64 {
        self.sets.iter().map(ExerciseSet::volume).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrengthWorkout {
    pub date: String,
    pub exercises: Vec<Exercise>,
    pub calories: f64,
}

impl StrengthWorkout {
    pub fn day(&self) -> Option<NaiveDate> {
        parse_day(&self.date)
    }

    /// Sum of reps x weight over every set of every exercise.
    pub fn volume(&self) -> f64 {
        self.exercises.iter().map(Exercise::volume).sum()
    }
}

#[derive(Debug, Clone)]
pub struct NewStrength {
    pub date: NaiveDate,
    pub exercises: Vec<Exercise>,
}

impl NewStrength {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.exercises.is_empty() {
            return Err(ValidationError::NoExercises);
        }
        for exercise in &self.exercises {
            validate_name("Exercise name", &exercise.name)?;
            if exercise.sets.iter().any(|s| s.weight < 0.0 || !s.weight.is_finite()) {
                return Err(ValidationError::Negative("Set weight"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyweightLog {
    pub date: String,
    pub weight: f64, // kg
}

impl BodyweightLog {
    pub fn day(&self) -> Option<NaiveDate> {
        parse_day(&self.date)
    }
}

/// Per-variant goal payload.
#[derive(Debug, Clone, PartialEq)]
pub enum GoalKind {
    /// Accumulates kilometres; `target_time` of 0 means no time limit.
    CardioDistance { target_time: u32, progress_time: u32 },
    /// Counts workouts where `exercise_name` (case-insensitive) had at least
    /// `ex_sets` sets and one set with `reps >= ex_reps` and `weight >= ex_weight`.
    StrengthExercise {
        exercise_name: String,
        ex_weight: f64,
        ex_sets: u32,
        ex_reps: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    pub name: String,
    pub target: f64,
    pub progress: f64,
    pub kind: GoalKind,
}

impl Goal {
    pub fn cardio(name: impl Into<String>, target_km: f64, target_time: u32) -> Self {
        Self {
            name: name.into(),
            target: target_km,
            progress: 0.0,
            kind: GoalKind::CardioDistance {
                target_time,
                progress_time: 0,
            },
        }
    }

    /// Strength goals always target one qualifying workout.
    pub fn strength(
        name: impl Into<String>,
        exercise_name: impl Into<String>,
        ex_weight: f64,
        ex_sets: u32,
        ex_reps: u32,
    ) -> Self {
        Self {
            name: name.into(),
            target: 1.0,
            progress: 0.0,
            kind: GoalKind::StrengthExercise {
                exercise_name: exercise_name.into(),
                ex_weight,
                ex_sets,
                ex_reps,
            },
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name("Goal name", &self.name)?;
        match &self.kind {
            GoalKind::CardioDistance { .. } => {
                if self.target < 0.0 {
                    return Err(ValidationError::Negative("Goal target"));
                }
            }
            GoalKind::StrengthExercise {
                exercise_name,
                ex_weight,
                ..
            } => {
                validate_name("Exercise name", exercise_name)?;
                if *ex_weight < 0.0 {
                    return Err(ValidationError::Negative("Exercise weight"));
                }
            }
        }
        Ok(())
    }

    pub const fn is_cardio(&self) -> bool {
        matches!(self.kind, GoalKind::CardioDistance { .. })
    }

    pub const fn is_strength(&self) -> bool {
        matches!(self.kind, GoalKind::StrengthExercise { .. })
    }
}

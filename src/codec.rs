//src/codec.rs
//! Line-oriented `|`-delimited text format, one line per record.
use std::str::FromStr;
use thiserror::Error;

use crate::models::{
    BodyweightLog, CardioType, CardioWorkout, Exercise, ExerciseSet, Gender, Goal, GoalKind,
    StrengthWorkout, UserProfile, ValidationError,
};

pub const FIELD_SEPARATOR: char = '|';
pub const EXERCISE_SEPARATOR: char = ';';
pub const NAME_SEPARATOR: char = ':';
pub const SET_SEPARATOR: char = ',';
pub const REPS_WEIGHT_SEPARATOR: char = 'x';

const GOAL_TAG_CARDIO: &str = "cardio_km";
const GOAL_TAG_STRENGTH: &str = "strength_exercise";
const GOAL_FULL_FIELDS: usize = 10;
const GOAL_LEGACY_FIELDS: usize = 6;

/// Why a persisted line was skipped. Never fatal: loaders drop the line and move on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
    #[error("invalid {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("unknown {field}: '{value}'")]
    UnknownVariant { field: &'static str, value: String },
}

/// A record kind with one canonical line shape.
pub trait Record: Sized {
    fn encode(&self) -> String;
    fn decode(line: &str) -> Result<Self, ParseError>;
}

fn split_fields(line: &str, expected: usize) -> Result<Vec<&str>, ParseError> {
    let fields: Vec<&str> = line
        .trim_end_matches(&['\r', '\n'][..])
        .split(FIELD_SEPARATOR)
        .collect();
    if fields.len() < expected {
        return Err(ParseError::TooFewFields {
            expected,
            found: fields.len(),
        });
    }
    Ok(fields)
}

fn number<T: FromStr>(field: &'static str, value: &str) -> Result<T, ParseError> {
    value.trim().parse().map_err(|_| ParseError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn variant<T: FromStr>(field: &'static str, value: &str) -> Result<T, ParseError> {
    value.trim().parse().map_err(|_| ParseError::UnknownVariant {
        field,
        value: value.to_string(),
    })
}

// Profile: gender|weight|targetBodyweight|height|age
// Username and display name are not part of the line; the store fills them in.
impl Record for UserProfile {
    fn encode(&self) -> String {
        let gender = self.gender.map(|g| g.to_string()).unwrap_or_default();
        format!(
            "{gender}|{}|{}|{}|{}",
            self.weight, self.target_bodyweight, self.height, self.age
        )
    }

    fn decode(line: &str) -> Result<Self, ParseError> {
        let f = split_fields(line, 5)?;
        let gender = match f[0].trim() {
            "" => None,
            g => Some(variant::<Gender>("gender", g)?),
        };
        Ok(Self {
            gender,
            weight: number("weight", f[1])?,
            target_bodyweight: number("target bodyweight", f[2])?,
            height: number("height", f[3])?,
            age: number("age", f[4])?,
            ..Self::default()
        })
    }
}

// Cardio: date|type|duration|distance|calories|avgSpeed
impl Record for CardioWorkout {
    fn encode(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.date,
            self.type_,
            self.duration_minutes,
            self.distance_km,
            self.calories,
            self.avg_speed_kmh
        )
    }

    fn decode(line: &str) -> Result<Self, ParseError> {
        let f = split_fields(line, 6)?;
        Ok(Self {
            date: f[0].to_string(),
            type_: variant::<CardioType>("cardio type", f[1])?,
            duration_minutes: number("duration", f[2])?,
            distance_km: number("distance", f[3])?,
            calories: number("calories", f[4])?,
            avg_speed_kmh: number("average speed", f[5])?,
        })
    }
}

/// Encodes exercises as `name:RxW,RxW;name:RxW`.
pub fn encode_exercises(exercises: &[Exercise]) -> String {
    exercises
        .iter()
        .map(|ex| {
            let sets = ex
                .sets
                .iter()
                .map(|s| format!("{}{REPS_WEIGHT_SEPARATOR}{}", s.reps, s.weight))
                .collect::<Vec<_>>()
                .join(&SET_SEPARATOR.to_string());
            format!("{}{NAME_SEPARATOR}{sets}", ex.name)
        })
        .collect::<Vec<_>>()
        .join(&EXERCISE_SEPARATOR.to_string())
}

/// Parses the exercises field. Entries without a `:` and set entries that are
/// not `<reps>x<weight>` are dropped; the rest of the workout is kept.
pub fn parse_exercises(text: &str) -> Vec<Exercise> {
    text.split(EXERCISE_SEPARATOR)
        .filter_map(|entry| {
            let mut parts = entry.split(NAME_SEPARATOR);
            let name = parts.next()?;
            let sets = parts.next()?;
            Some(Exercise {
                name: name.to_string(),
                sets: sets.split(SET_SEPARATOR).filter_map(parse_set).collect(),
            })
        })
        .collect()
}

/// Parses exercises typed by a user. Unlike [`parse_exercises`], any entry or
/// set that doesn't fit the grammar rejects the whole input.
pub fn parse_exercise_input(text: &str) -> Result<Vec<Exercise>, ValidationError> {
    let malformed = |entry: &str| ValidationError::MalformedExercise(entry.trim().to_string());
    text.split(EXERCISE_SEPARATOR)
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| -> Result<Exercise, ValidationError> {
            let (name, sets) = entry
                .split_once(NAME_SEPARATOR)
                .ok_or_else(|| malformed(entry))?;
            let sets = sets
                .split(SET_SEPARATOR)
                .map(|set| parse_set(set).ok_or_else(|| malformed(entry)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Exercise {
                name: name.trim().to_string(),
                sets,
            })
        })
        .collect()
}

fn parse_set(text: &str) -> Option<ExerciseSet> {
    let mut parts = text.split(REPS_WEIGHT_SEPARATOR);
    let reps = parts.next()?.trim().parse().ok()?;
    let weight = parts.next()?.trim().parse().ok()?;
    Some(ExerciseSet { reps, weight })
}

// Strength: date|calories|exercises
impl Record for StrengthWorkout {
    fn encode(&self) -> String {
        format!(
            "{}|{}|{}",
            self.date,
            self.calories,
            encode_exercises(&self.exercises)
        )
    }

    fn decode(line: &str) -> Result<Self, ParseError> {
        let f = split_fields(line, 3)?;
        Ok(Self {
            date: f[0].to_string(),
            calories: number("calories", f[1])?,
            exercises: parse_exercises(f[2]),
        })
    }
}

// Bodyweight: date|weight
impl Record for BodyweightLog {
    fn encode(&self) -> String {
        format!("{}|{}", self.date, self.weight)
    }

    fn decode(line: &str) -> Result<Self, ParseError> {
        let f = split_fields(line, 2)?;
        Ok(Self {
            date: f[0].to_string(),
            weight: number("weight", f[1])?,
        })
    }
}

// Goal: name|type|target|progress|targetTime|progressTime|exerciseName|exWeight|exSets|exReps
// The first six fields alone are the pre-strength-goal legacy shape.
impl Record for Goal {
    fn encode(&self) -> String {
        match &self.kind {
            GoalKind::CardioDistance {
                target_time,
                progress_time,
            } => format!(
                "{}|{GOAL_TAG_CARDIO}|{}|{}|{target_time}|{progress_time}||0|0|0",
                self.name, self.target, self.progress
            ),
            GoalKind::StrengthExercise {
                exercise_name,
                ex_weight,
                ex_sets,
                ex_reps,
            } => format!(
                "{}|{GOAL_TAG_STRENGTH}|{}|{}|0|0|{exercise_name}|{ex_weight}|{ex_sets}|{ex_reps}",
                self.name, self.target, self.progress
            ),
        }
    }

    fn decode(line: &str) -> Result<Self, ParseError> {
        let f = split_fields(line, GOAL_LEGACY_FIELDS)?;
        if f.len() >= GOAL_FULL_FIELDS {
            if let Ok(goal) = decode_goal(&f, true) {
                return Ok(goal);
            }
        }
        decode_goal(&f, false)
    }
}

fn decode_goal(f: &[&str], full: bool) -> Result<Goal, ParseError> {
    let target = number("goal target", f[2])?;
    let progress = number("goal progress", f[3])?;
    let target_time = number("goal target time", f[4])?;
    let progress_time = number("goal progress time", f[5])?;
    let kind = match f[1].trim() {
        GOAL_TAG_CARDIO => GoalKind::CardioDistance {
            target_time,
            progress_time,
        },
        GOAL_TAG_STRENGTH if full => GoalKind::StrengthExercise {
            exercise_name: f[6].to_string(),
            ex_weight: number("exercise weight", f[7])?,
            ex_sets: number("exercise sets", f[8])?,
            ex_reps: number("exercise reps", f[9])?,
        },
        GOAL_TAG_STRENGTH => GoalKind::StrengthExercise {
            exercise_name: String::new(),
            ex_weight: 0.0,
            ex_sets: 0,
            ex_reps: 0,
        },
        other => {
            return Err(ParseError::UnknownVariant {
                field: "goal type",
                value: other.to_string(),
            })
        }
    };
    Ok(Goal {
        name: f[0].to_string(),
        target,
        progress,
        kind,
    })
}

/// Decodes every line, discarding the ones that fail. Blank lines are ignored.
pub fn decode_lines<R: Record>(text: &str) -> Vec<R> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match R::decode(line) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!("skipping malformed line {line:?}: {e}");
                None
            }
        })
        .collect()
}

pub fn encode_lines<R: Record>(records: &[R]) -> String {
    records
        .iter()
        .map(|r| r.encode() + "\n")
        .collect::<String>()
}

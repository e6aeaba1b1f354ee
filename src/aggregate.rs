//src/aggregate.rs
//! Trailing seven-day rollups for the dashboard. Everything here is read-only
//! over the account's collections.
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

use crate::goals::GoalRow;
use crate::metrics::{self, BmiCategory};
use crate::models::{BodyweightLog, CardioWorkout, Goal, StrengthWorkout};
use crate::store::AccountData;

pub const WINDOW_DAYS: usize = 7;
pub const DEFAULT_CARDIO_TARGET_KM: f64 = 20.0;
pub const DEFAULT_STRENGTH_TARGET: u32 = 3;

/// One value per day, oldest first: index 0 is six days before `today`,
/// index 6 is `today`.
pub type DailyBuckets = [f64; WINDOW_DAYS];

/// Bucket index for `day`, or `None` when it falls outside the window.
pub fn bucket_index(day: NaiveDate, today: NaiveDate) -> Option<usize> {
    let offset = (today - day).num_days();
    if (0..WINDOW_DAYS as i64).contains(&offset) {
        Some(WINDOW_DAYS - 1 - offset as usize)
    } else {
        None
    }
}

/// Inclusive `[today - 6, today]`.
pub fn in_week(day: NaiveDate, today: NaiveDate) -> bool {
    day >= week_start(today) && day <= today
}

pub fn week_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(WINDOW_DAYS as i64 - 1)
}

fn bucketize<T>(
    records: &[T],
    today: NaiveDate,
    day: impl Fn(&T) -> Option<NaiveDate>,
    value: impl Fn(&T) -> f64,
) -> DailyBuckets {
    let mut buckets = [0.0; WINDOW_DAYS];
    for record in records {
        if let Some(idx) = day(record).and_then(|d| bucket_index(d, today)) {
            buckets[idx] += value(record);
        }
    }
    buckets
}

pub fn cardio_buckets(cardio: &[CardioWorkout], today: NaiveDate) -> DailyBuckets {
    bucketize(cardio, today, CardioWorkout::day, |w| w.distance_km)
}

pub fn strength_buckets(strength: &[StrengthWorkout], today: NaiveDate) -> DailyBuckets {
    bucketize(strength, today, StrengthWorkout::day, StrengthWorkout::volume)
}

/// Latest logged weight per calendar day across the whole history, where
/// "latest" is position in the list rather than date order.
pub fn weight_by_day(logs: &[BodyweightLog]) -> HashMap<NaiveDate, f64> {
    let mut by_day = HashMap::new();
    for log in logs {
        if let Some(day) = log.day() {
            by_day.insert(day, log.weight);
        }
    }
    by_day
}

/// Days without an entry are 0.
pub fn bodyweight_buckets(logs: &[BodyweightLog], today: NaiveDate) -> DailyBuckets {
    let by_day = weight_by_day(logs);
    let start = week_start(today);
    let mut buckets = [0.0; WINDOW_DAYS];
    for (i, bucket) in buckets.iter_mut().enumerate() {
        let day = start + Duration::days(i as i64);
        *bucket = by_day.get(&day).copied().unwrap_or(0.0);
    }
    buckets
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklyTotals {
    pub cardio_sessions: u32,
    pub cardio_km: f64,
    pub cardio_minutes: u64,
    pub cardio_calories: f64,
    pub strength_workouts: u32,
    pub strength_volume: f64,
    pub strength_calories: f64,
}

pub fn weekly_totals(data: &AccountData, today: NaiveDate) -> WeeklyTotals {
    let mut totals = WeeklyTotals::default();
    for w in &data.cardio {
        if w.day().is_some_and(|d| in_week(d, today)) {
            totals.cardio_sessions += 1;
            totals.cardio_km += w.distance_km;
            totals.cardio_minutes += u64::from(w.duration_minutes);
            totals.cardio_calories += w.calories;
        }
    }
    for w in &data.strength {
        if w.day().is_some_and(|d| in_week(d, today)) {
            totals.strength_workouts += 1;
            totals.strength_volume += w.volume();
            totals.strength_calories += w.calories;
        }
    }
    totals
}

/// Weekly cardio target: the last distance goal with a positive target wins.
pub fn cardio_target_km(goals: &[Goal]) -> f64 {
    goals
        .iter()
        .filter(|g| g.is_cardio() && g.target > 0.0)
        .last()
        .map_or(DEFAULT_CARDIO_TARGET_KM, |g| g.target)
}

/// Weekly strength target: the last strength goal overrides, never below 1.
pub fn strength_target(goals: &[Goal]) -> u32 {
    goals
        .iter()
        .filter(|g| g.is_strength())
        .fold(DEFAULT_STRENGTH_TARGET, |current, g| {
            let target = if g.target > 0.0 { g.target as u32 } else { current };
            target.max(1)
        })
}

/// `round(min(100, 100 * value / target))`, 0 for a non-positive target.
pub fn percent_of(value: f64, target: f64) -> u32 {
    if target <= 0.0 {
        return 0;
    }
    (100.0 * value / target).round().clamp(0.0, 100.0) as u32
}

/// All-time figures over every stored record, dated or not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LifetimeTotals {
    pub cardio_count: usize,
    pub cardio_km: f64,
    pub cardio_calories: f64,
    pub strength_count: usize,
    pub strength_volume: f64,
    pub strength_calories: f64,
}

pub fn lifetime_totals(data: &AccountData) -> LifetimeTotals {
    LifetimeTotals {
        cardio_count: data.cardio.len(),
        cardio_km: data.cardio.iter().map(|w| w.distance_km).sum(),
        cardio_calories: data.cardio.iter().map(|w| w.calories).sum(),
        strength_count: data.strength.len(),
        strength_volume: data.strength.iter().map(StrengthWorkout::volume).sum(),
        strength_calories: data.strength.iter().map(|w| w.calories).sum(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub weekly: WeeklyTotals,
    pub cardio_daily: DailyBuckets,
    pub strength_daily: DailyBuckets,
    pub bodyweight_daily: DailyBuckets,
    pub cardio_target_km: f64,
    pub strength_target: u32,
    pub cardio_percent: u32,
    pub strength_percent: u32,
    /// Profile weight, or the last logged bodyweight when the profile has none.
    pub current_weight: Option<f64>,
    pub target_bodyweight: f64,
    pub bmi: Option<f64>,
    pub bmi_category: Option<BmiCategory>,
    pub lifetime: LifetimeTotals,
    pub goals: Vec<GoalRow>,
}

pub fn compute_dashboard(data: &AccountData, today: NaiveDate) -> Dashboard {
    let weekly = weekly_totals(data, today);
    let cardio_target_km = cardio_target_km(&data.goals);
    let strength_target = strength_target(&data.goals);
    let profile = &data.profile;

    let current_weight = if profile.weight > 0.0 {
        Some(profile.weight)
    } else {
        data.bodyweight.last().map(|b| b.weight)
    };
    let bmi = metrics::bmi(profile.weight, profile.height);

    Dashboard {
        today,
        cardio_daily: cardio_buckets(&data.cardio, today),
        strength_daily: strength_buckets(&data.strength, today),
        bodyweight_daily: bodyweight_buckets(&data.bodyweight, today),
        cardio_target_km,
        strength_target,
        cardio_percent: percent_of(weekly.cardio_km, cardio_target_km),
        strength_percent: percent_of(
            f64::from(weekly.strength_workouts),
            f64::from(strength_target),
        ),
        weekly,
        current_weight,
        target_bodyweight: profile.target_bodyweight,
        bmi,
        bmi_category: metrics::bmi_category(bmi),
        lifetime: lifetime_totals(data),
        goals: data.goals.iter().map(GoalRow::from).collect(),
    }
}

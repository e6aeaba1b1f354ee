//src/metrics.rs
use std::fmt;

use crate::models::CardioType;

/// Bodyweight assumed when the profile has none.
pub const FALLBACK_BODYWEIGHT_KG: f64 = 70.0;

fn effective_weight(bodyweight_kg: f64) -> f64 {
    if bodyweight_kg > 0.0 {
        bodyweight_kg
    } else {
        FALLBACK_BODYWEIGHT_KG
    }
}

/// MET value used for the calorie estimate.
pub const fn met(type_: CardioType) -> f64 {
    match type_ {
        CardioType::Running => 9.8,
        CardioType::Swimming => 8.0,
        CardioType::Walking => 3.5,
        CardioType::Cycling => 7.5,
    }
}

pub fn cardio_calories(type_: CardioType, duration_minutes: u32, bodyweight_kg: f64) -> f64 {
    met(type_) * effective_weight(bodyweight_kg) * (f64::from(duration_minutes) / 60.0)
}

pub fn avg_speed_kmh(distance_km: f64, duration_minutes: u32) -> f64 {
    if duration_minutes > 0 {
        distance_km * 60.0 / f64::from(duration_minutes)
    } else {
        0.0
    }
}

pub fn strength_calories(total_volume_kg: f64, bodyweight_kg: f64) -> f64 {
    5.0 * effective_weight(bodyweight_kg) * 0.15 + total_volume_kg * 0.01
}

/// Body mass index, `None` when the height is not positive.
pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if height_cm <= 0.0 {
        return None;
    }
    let metres = height_cm / 100.0;
    Some(weight_kg / (metres * metres))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Underweight => write!(f, "Underweight"),
            Self::Normal => write!(f, "Normal"),
            Self::Overweight => write!(f, "Overweight"),
            Self::Obese => write!(f, "Obese"),
        }
    }
}

pub fn bmi_category(bmi: Option<f64>) -> Option<BmiCategory> {
    bmi.map(BmiCategory::from_bmi)
}

/// Renders an optional value the way the dashboard shows it ("N/A" when undefined).
pub fn or_na<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

//! Fixed studio settings handed to presentation code.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::catalog::models::{ClassType, DayOfWeek};

const FIRST_SLOT_MINUTES: u32 = 9 * 60;
const LAST_SLOT_MINUTES: u32 = 20 * 60;
const SLOT_STEP_MINUTES: usize = 30;

/// Inclusive bounds for an admin-entered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValueRange<T> {
    pub min: T,
    pub max: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub class_types: Vec<ClassType>,
    pub days_of_week: Vec<DayOfWeek>,
    /// `HH:MM` start times offered when scheduling a course.
    pub time_slots: Vec<String>,
    pub price_range: ValueRange<Decimal>,
    pub duration_range: ValueRange<u32>,
    pub capacity_range: ValueRange<u32>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            class_types: ClassType::ALL.to_vec(),
            days_of_week: DayOfWeek::ALL.to_vec(),
            time_slots: time_slots(),
            price_range: ValueRange {
                min: Decimal::from(10),
                max: Decimal::from(100),
            },
            duration_range: ValueRange { min: 30, max: 120 },
            capacity_range: ValueRange { min: 5, max: 30 },
        }
    }
}

fn time_slots() -> Vec<String> {
    (FIRST_SLOT_MINUTES..=LAST_SLOT_MINUTES)
        .step_by(SLOT_STEP_MINUTES)
        .map(|minutes| format!("{:02}:{:02}", minutes / 60, minutes % 60))
        .collect()
}

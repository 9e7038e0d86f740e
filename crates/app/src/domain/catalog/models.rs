//! Catalog Models

use std::fmt::{Display, Formatter, Result as FmtResult};

use jiff::civil::{Date, Time};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    domain::bookings::models::BookingId,
    ids::{TypedId, UserId},
    store::{Collection, Record},
    validation::{MAX_DURATION_MINUTES, parse_clock_time, require},
};

/// Course Id
pub type CourseId = TypedId<Course>;

/// Schedule Id
pub type ScheduleId = TypedId<ScheduleInstance>;

/// Day of the week a course runs on, in Monday-first week order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [Self; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }
}

impl Display for DayOfWeek {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// Kind of yoga class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassType {
    #[serde(rename = "Flow Yoga")]
    FlowYoga,
    #[serde(rename = "Aerial Yoga")]
    AerialYoga,
    #[serde(rename = "Family Yoga")]
    FamilyYoga,
}

impl ClassType {
    pub const ALL: [Self; 3] = [Self::FlowYoga, Self::AerialYoga, Self::FamilyYoga];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FlowYoga => "Flow Yoga",
            Self::AerialYoga => "Aerial Yoga",
            Self::FamilyYoga => "Family Yoga",
        }
    }
}

impl Display for ClassType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// Course Model
///
/// A recurring weekly class template, maintained by the admin system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub day_of_week: DayOfWeek,
    /// Start time, `HH:MM` 24h.
    pub time: String,
    pub capacity: u32,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    pub price: Decimal,
    #[serde(rename = "type")]
    pub class_type: ClassType,
    #[serde(default)]
    pub description: String,
    /// Epoch milliseconds of the last admin sync.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
}

impl Course {
    #[must_use]
    pub fn start_time(&self) -> Option<Time> {
        parse_clock_time(&self.time)
    }
}

impl Record for Course {
    const COLLECTION: Collection = Collection::Courses;

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();

        require(&mut violations, "id", self.id.as_str());
        require(&mut violations, "time", &self.time);

        if !self.time.trim().is_empty() && self.start_time().is_none() {
            violations.push(format!("time {:?} is not HH:MM", self.time));
        }

        if self.capacity == 0 {
            violations.push("capacity must be positive".to_string());
        }

        if self.duration_minutes == 0 || self.duration_minutes > MAX_DURATION_MINUTES {
            violations.push(format!(
                "duration must be between 1 and {MAX_DURATION_MINUTES} minutes"
            ));
        }

        if self.price.is_sign_negative() {
            violations.push("price must not be negative".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// One reservation recorded against a schedule instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub user_email: String,
    pub booked_at: jiff::Timestamp,
    pub quantity: u32,
}

/// Schedule Instance Model
///
/// One dated occurrence of a [`Course`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInstance {
    pub id: ScheduleId,
    pub course_id: CourseId,
    pub date: Date,
    pub teacher: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default, rename = "bookings")]
    pub roster: Vec<RosterEntry>,
    /// Epoch milliseconds of the last write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
}

impl ScheduleInstance {
    /// Seats taken, summed over the roster.
    #[must_use]
    pub fn booked_quantity(&self) -> u32 {
        self.roster
            .iter()
            .fold(0_u32, |total, entry| total.saturating_add(entry.quantity))
    }
}

impl Record for ScheduleInstance {
    const COLLECTION: Collection = Collection::Schedules;

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();

        require(&mut violations, "id", self.id.as_str());
        require(&mut violations, "courseId", self.course_id.as_str());
        require(&mut violations, "teacher", &self.teacher);

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Seat availability of a schedule instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub available: bool,
    pub available_spots: u32,
    pub capacity: u32,
}

/// Course capacity minus the summed roster quantity, floored at zero.
#[must_use]
pub fn compute_availability(schedule: &ScheduleInstance, course: &Course) -> Availability {
    let available_spots = course.capacity.saturating_sub(schedule.booked_quantity());

    Availability {
        available: available_spots > 0,
        available_spots,
        capacity: course.capacity,
    }
}

/// Only instances strictly after `today` can be booked.
#[must_use]
pub fn is_bookable(schedule: &ScheduleInstance, today: Date) -> bool {
    schedule.date > today
}

/// Course listing filter; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseFilter {
    pub day_of_week: Option<DayOfWeek>,
    pub time: Option<String>,
    pub class_type: Option<ClassType>,
    pub max_price: Option<Decimal>,
    pub min_capacity: Option<u32>,
    pub max_duration_minutes: Option<u32>,
}

impl CourseFilter {
    #[must_use]
    pub fn for_day(day_of_week: DayOfWeek) -> Self {
        Self {
            day_of_week: Some(day_of_week),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn for_type(class_type: ClassType) -> Self {
        Self {
            class_type: Some(class_type),
            ..Self::default()
        }
    }

    /// Range predicates, applied after the equality ones ran in the store.
    pub(crate) fn admits(&self, course: &Course) -> bool {
        self.max_price.is_none_or(|max| course.price <= max)
            && self.min_capacity.is_none_or(|min| course.capacity >= min)
            && self
                .max_duration_minutes
                .is_none_or(|max| course.duration_minutes <= max)
    }
}

/// A schedule instance joined with its course, when the course still exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleWithCourse {
    pub schedule: ScheduleInstance,
    pub course: Option<Course>,
}

//! Cart Models

use std::collections::BTreeMap;

use jiff::{
    Timestamp,
    civil::{Date, Time},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        bookings::models::BookingId,
        catalog::models::{ClassType, Course, CourseId, DayOfWeek, ScheduleId, ScheduleInstance},
    },
    ids::{TypedId, UserId},
    store::{Collection, Record},
    validation::{parse_clock_time, require},
};

/// Cart Item Id
pub type CartItemId = TypedId<CartItem>;

/// Label used for lines that carry no class type.
pub const UNKNOWN_CLASS_TYPE: &str = "Unknown";

/// Display copy of a course and one of its schedule instances.
///
/// Cart rows carry it so the cart renders without catalog reads; bookings
/// snapshot it so later catalog edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDetails {
    pub course_id: CourseId,
    pub instance_id: ScheduleId,
    pub class_name: String,
    #[serde(default)]
    pub class_type: Option<ClassType>,
    #[serde(default)]
    pub teacher: String,
    #[serde(default)]
    pub date: Option<Date>,
    #[serde(default)]
    pub time: String,
    #[serde(default, rename = "duration")]
    pub duration_minutes: u32,
    pub price: Decimal,
    #[serde(default)]
    pub day_of_week: Option<DayOfWeek>,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub comments: String,
}

impl ClassDetails {
    #[must_use]
    pub fn from_course_and_schedule(course: &Course, schedule: &ScheduleInstance) -> Self {
        Self {
            course_id: course.id.clone(),
            instance_id: schedule.id.clone(),
            class_name: course.class_type.name().to_string(),
            class_type: Some(course.class_type),
            teacher: schedule.teacher.clone(),
            date: Some(schedule.date),
            time: course.time.clone(),
            duration_minutes: course.duration_minutes,
            price: course.price,
            day_of_week: Some(course.day_of_week),
            capacity: course.capacity,
            description: course.description.clone(),
            comments: schedule.comments.clone(),
        }
    }

    #[must_use]
    pub fn class_type_label(&self) -> &'static str {
        self.class_type.map_or(UNKNOWN_CLASS_TYPE, ClassType::name)
    }

    #[must_use]
    pub fn start_time(&self) -> Option<Time> {
        parse_clock_time(&self.time)
    }

    /// Required fields shared by cart rows and booking lines.
    pub(crate) fn collect_violations(&self, violations: &mut Vec<String>) {
        require(violations, "courseId", self.course_id.as_str());
        require(violations, "instanceId", self.instance_id.as_str());
        require(violations, "className", &self.class_name);

        if self.price.is_sign_negative() {
            violations.push("price must not be negative".to_string());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartItemStatus {
    #[default]
    Pending,
    Booked,
}

impl CartItemStatus {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Booked => "booked",
        }
    }
}

/// Cart Item Model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub details: ClassDetails,
    pub quantity: u32,
    pub added_at: Timestamp,
    #[serde(default)]
    pub status: CartItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<BookingId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booked_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.details.price * Decimal::from(self.quantity)
    }
}

impl Record for CartItem {
    const COLLECTION: Collection = Collection::Cart;

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();

        require(&mut violations, "userId", self.user_id.as_str());
        self.details.collect_violations(&mut violations);

        if self.quantity == 0 {
            violations.push("quantity must be at least 1".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// New Cart Item Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub details: ClassDetails,
    /// Seats requested; one when unset.
    pub quantity: Option<u32>,
}

impl NewCartItem {
    #[must_use]
    pub fn from_course_and_schedule(
        course: &Course,
        schedule: &ScheduleInstance,
        quantity: u32,
    ) -> Self {
        Self {
            details: ClassDetails::from_course_and_schedule(course, schedule),
            quantity: Some(quantity),
        }
    }

    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity.unwrap_or(1)
    }

    pub(crate) fn into_cart_item(self, id: CartItemId, user: UserId, now: Timestamp) -> CartItem {
        let quantity = self.quantity();

        CartItem {
            id,
            user_id: user,
            details: self.details,
            quantity,
            added_at: now,
            status: CartItemStatus::Pending,
            booking_id: None,
            booked_at: None,
            updated_at: None,
        }
    }
}

/// Aggregate view over a user's pending cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub total_items: usize,
    pub total_quantity: u32,
    pub total_amount: Decimal,
    /// Seats per class type label.
    pub items_by_type: BTreeMap<String, u32>,
    /// Rows dated today or later.
    pub upcoming_classes_count: usize,
}

impl CartSummary {
    #[must_use]
    pub fn from_items(items: &[CartItem], today: Date) -> Self {
        let mut summary = Self {
            total_items: items.len(),
            ..Self::default()
        };

        for item in items {
            summary.total_quantity = summary.total_quantity.saturating_add(item.quantity);
            summary.total_amount += item.line_total();

            let seats = summary
                .items_by_type
                .entry(item.details.class_type_label().to_string())
                .or_default();
            *seats = seats.saturating_add(item.quantity);

            if item.details.date.is_some_and(|date| date >= today) {
                summary.upcoming_classes_count += 1;
            }
        }

        summary
    }
}

/// A cart's pending rows together with their summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub summary: CartSummary,
}

//! Booking Models

use jiff::{Timestamp, civil::Date};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::carts::models::{CartItem, CartItemId, ClassDetails},
    ids::{TypedId, UserId},
    store::{Collection, Record},
    validation::{is_valid_email, require},
};

/// Booking Id
pub type BookingId = TypedId<Booking>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

const fn one() -> u32 {
    1
}

/// A booked class, copied from the cart row at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingItem {
    #[serde(flatten)]
    pub details: ClassDetails,
    #[serde(default = "one")]
    pub quantity: u32,
}

impl BookingItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.details.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub total_amount: Decimal,
    pub total_items: usize,
    pub total_quantity: u32,
}

impl BookingSummary {
    /// Totals over booking lines: price times quantity, line count, seat count.
    #[must_use]
    pub fn from_items(items: &[BookingItem]) -> Self {
        items.iter().fold(
            Self {
                total_items: items.len(),
                ..Self::default()
            },
            |mut summary, item| {
                summary.total_amount += item.line_total();
                summary.total_quantity = summary.total_quantity.saturating_add(item.quantity);
                summary
            },
        )
    }
}

/// Booking Model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub user_email: String,
    pub items: Vec<BookingItem>,
    pub summary: BookingSummary,
    #[serde(default)]
    pub status: BookingStatus,
    pub booking_date: Timestamp,
    #[serde(default)]
    pub cancelled_at: Option<Timestamp>,
    /// Opaque to this crate; payment is handled elsewhere.
    #[serde(default)]
    pub payment_details: Option<Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Booking {
    /// Confirmed, with at least one class dated strictly after `today`.
    #[must_use]
    pub fn is_cancellable(&self, today: Date) -> bool {
        self.status == BookingStatus::Confirmed
            && self
                .items
                .iter()
                .any(|item| item.details.date.is_some_and(|date| date > today))
    }
}

fn collect_item_violations(
    violations: &mut Vec<String>,
    index: usize,
    details: &ClassDetails,
    quantity: u32,
) {
    let mut item = Vec::new();

    details.collect_violations(&mut item);

    if quantity == 0 {
        item.push("quantity must be at least 1".to_string());
    }

    let position = index.saturating_add(1);

    violations.extend(item.into_iter().map(|violation| format!("item {position}: {violation}")));
}

impl Record for Booking {
    const COLLECTION: Collection = Collection::Bookings;

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();

        require(&mut violations, "userId", self.user_id.as_str());
        require(&mut violations, "userEmail", &self.user_email);

        if self.items.is_empty() {
            violations.push("booking must contain at least one item".to_string());
        }

        for (index, item) in self.items.iter().enumerate() {
            collect_item_violations(&mut violations, index, &item.details, item.quantity);
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// One class to book, usually taken from a pending cart row.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingLine {
    /// Cart row to flip to booked, when the line came from the cart.
    pub cart_item: Option<CartItemId>,
    pub details: ClassDetails,
    pub quantity: u32,
}

impl From<CartItem> for BookingLine {
    fn from(item: CartItem) -> Self {
        Self {
            cart_item: Some(item.id),
            details: item.details,
            quantity: item.quantity,
        }
    }
}

/// New Booking Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub user_id: UserId,
    pub user_email: String,
    pub lines: Vec<BookingLine>,
    pub payment_details: Option<Value>,
}

impl NewBooking {
    /// Check the payload before any store call, returning every violation.
    ///
    /// # Errors
    ///
    /// Returns the list of violations when the booking cannot be submitted.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();

        require(&mut violations, "userId", self.user_id.as_str());
        require(&mut violations, "userEmail", &self.user_email);

        if !self.user_email.trim().is_empty() && !is_valid_email(&self.user_email) {
            violations.push("userEmail is not a valid email address".to_string());
        }

        if self.lines.is_empty() {
            violations.push("booking must contain at least one item".to_string());
        }

        for (index, line) in self.lines.iter().enumerate() {
            collect_item_violations(&mut violations, index, &line.details, line.quantity);
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    pub(crate) fn to_booking(&self, id: BookingId, now: Timestamp) -> Booking {
        let items: Vec<BookingItem> = self
            .lines
            .iter()
            .map(|line| BookingItem {
                details: line.details.clone(),
                quantity: line.quantity,
            })
            .collect();

        Booking {
            id,
            user_id: self.user_id.clone(),
            user_email: self.user_email.clone(),
            summary: BookingSummary::from_items(&items),
            items,
            status: BookingStatus::Confirmed,
            booking_date: now,
            cancelled_at: None,
            payment_details: self.payment_details.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Booking history filter; bounds apply to the booking date, inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingHistoryFilter {
    pub status: Option<BookingStatus>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

impl BookingHistoryFilter {
    pub(crate) fn admits(&self, booking: &Booking) -> bool {
        self.status.is_none_or(|status| booking.status == status)
            && self.from.is_none_or(|from| booking.booking_date >= from)
            && self.to.is_none_or(|to| booking.booking_date <= to)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookingsByStatus {
    pub confirmed: Vec<Booking>,
    pub cancelled: Vec<Booking>,
    pub pending: Vec<Booking>,
}

#[must_use]
pub fn group_by_status(bookings: &[Booking]) -> BookingsByStatus {
    let mut groups = BookingsByStatus::default();

    for booking in bookings {
        let group = match booking.status {
            BookingStatus::Confirmed => &mut groups.confirmed,
            BookingStatus::Cancelled => &mut groups.cancelled,
            BookingStatus::Pending => &mut groups.pending,
        };

        group.push(booking.clone());
    }

    groups
}

/// A booked class still ahead of the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingClass {
    #[serde(flatten)]
    pub item: BookingItem,
    pub booking_id: BookingId,
    pub booking_date: Timestamp,
}

/// Classes of confirmed bookings dated strictly after `today`, earliest first.
#[must_use]
pub fn upcoming_classes(bookings: &[Booking], today: Date) -> Vec<UpcomingClass> {
    let mut upcoming: Vec<UpcomingClass> = bookings
        .iter()
        .filter(|booking| booking.status == BookingStatus::Confirmed)
        .flat_map(|booking| {
            booking
                .items
                .iter()
                .filter(|item| item.details.date.is_some_and(|date| date > today))
                .map(|item| UpcomingClass {
                    item: item.clone(),
                    booking_id: booking.id.clone(),
                    booking_date: booking.booking_date,
                })
        })
        .collect();

    upcoming.sort_by_key(|class| class.item.details.date);

    upcoming
}

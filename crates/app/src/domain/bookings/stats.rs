//! Booking statistics.

use std::collections::BTreeMap;

use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::bookings::models::{Booking, BookingStatus};

/// Spend and attendance figures over a user's booking history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStats {
    pub total_bookings: usize,
    /// Summed over every status, cancelled bookings included.
    pub total_spent: Decimal,
    pub confirmed_bookings: usize,
    pub cancelled_bookings: usize,
    /// Booked classes dated today or later.
    pub upcoming_classes: usize,
    pub past_classes: usize,
    pub class_type_stats: BTreeMap<String, usize>,
    pub favorite_class_type: Option<String>,
    /// Spend per `YYYY-MM` of the booking date.
    pub monthly_spending: BTreeMap<String, Decimal>,
    /// Rounded to two decimal places.
    pub average_per_booking: Decimal,
}

impl BookingStats {
    #[must_use]
    pub fn from_bookings(bookings: &[Booking], today: Date) -> Self {
        let mut stats = Self {
            total_bookings: bookings.len(),
            ..Self::default()
        };

        // First-seen order decides ties for the favourite.
        let mut type_counts: Vec<(&'static str, usize)> = Vec::new();

        for booking in bookings {
            stats.total_spent += booking.summary.total_amount;

            match booking.status {
                BookingStatus::Confirmed => stats.confirmed_bookings += 1,
                BookingStatus::Cancelled => stats.cancelled_bookings += 1,
                BookingStatus::Pending => {}
            }

            for item in &booking.items {
                let label = item.details.class_type_label();

                match type_counts.iter_mut().find(|(seen, _)| *seen == label) {
                    Some((_, count)) => *count += 1,
                    None => type_counts.push((label, 1)),
                }

                match item.details.date {
                    Some(date) if date >= today => stats.upcoming_classes += 1,
                    Some(_) => stats.past_classes += 1,
                    None => {}
                }
            }

            let month = booking.booking_date.strftime("%Y-%m").to_string();

            *stats.monthly_spending.entry(month).or_default() += booking.summary.total_amount;
        }

        let mut favorite: Option<(&str, usize)> = None;

        for &(label, count) in &type_counts {
            if favorite.is_none_or(|(_, best)| count > best) {
                favorite = Some((label, count));
            }
        }

        stats.favorite_class_type = favorite.map(|(label, _)| label.to_string());
        stats.class_type_stats = type_counts
            .into_iter()
            .map(|(label, count)| (label.to_string(), count))
            .collect();

        if stats.total_bookings > 0 {
            stats.average_per_booking = stats.total_spent / Decimal::from(stats.total_bookings);
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use jiff::{Timestamp, civil::date};
    use testresult::TestResult;

    use crate::{
        domain::{
            bookings::models::{BookingId, BookingLine, NewBooking},
            catalog::models::ClassType,
        },
        ids::UserId,
        test::fixtures,
    };

    use super::*;

    fn booking(
        status: BookingStatus,
        booked: &str,
        lines: &[(ClassType, Date, i64)],
    ) -> Result<Booking, jiff::Error> {
        let lines = lines
            .iter()
            .map(|&(class_type, day, price)| {
                let mut details = fixtures::class_details("c1", "s1", day);
                details.class_type = Some(class_type);
                details.price = Decimal::from(price);

                BookingLine {
                    cart_item: None,
                    details,
                    quantity: 1,
                }
            })
            .collect();

        let mut booking = NewBooking {
            user_id: UserId::new("u1"),
            user_email: "u1@example.com".to_string(),
            lines,
            payment_details: None,
        }
        .to_booking(BookingId::generate(), booked.parse::<Timestamp>()?);

        booking.status = status;

        Ok(booking)
    }

    #[test]
    fn no_bookings_yields_zeroes() {
        let stats = BookingStats::from_bookings(&[], date(2026, 10, 16));

        assert_eq!(stats, BookingStats::default());
        assert_eq!(stats.favorite_class_type, None);
    }

    #[test]
    fn totals_count_cancelled_spend() -> TestResult {
        let today = date(2026, 10, 16);
        let bookings = [
            booking(
                BookingStatus::Confirmed,
                "2026-10-01T10:00:00Z",
                &[(ClassType::FlowYoga, date(2026, 10, 20), 20)],
            )?,
            booking(
                BookingStatus::Cancelled,
                "2026-09-12T10:00:00Z",
                &[(ClassType::AerialYoga, date(2026, 9, 20), 15)],
            )?,
        ];

        let stats = BookingStats::from_bookings(&bookings, today);

        assert_eq!(stats.total_bookings, 2);
        assert_eq!(stats.total_spent, Decimal::from(35));
        assert_eq!(stats.confirmed_bookings, 1);
        assert_eq!(stats.cancelled_bookings, 1);
        assert_eq!(stats.average_per_booking, Decimal::new(1750, 2));
        assert_eq!(stats.monthly_spending.get("2026-10"), Some(&Decimal::from(20)));
        assert_eq!(stats.monthly_spending.get("2026-09"), Some(&Decimal::from(15)));

        Ok(())
    }

    #[test]
    fn classes_dated_today_count_as_upcoming() -> TestResult {
        let today = date(2026, 10, 16);
        let bookings = [booking(
            BookingStatus::Confirmed,
            "2026-10-01T10:00:00Z",
            &[
                (ClassType::FlowYoga, today, 10),
                (ClassType::FlowYoga, date(2026, 10, 15), 10),
                (ClassType::FlowYoga, date(2026, 10, 17), 10),
            ],
        )?];

        let stats = BookingStats::from_bookings(&bookings, today);

        assert_eq!(stats.upcoming_classes, 2);
        assert_eq!(stats.past_classes, 1);

        Ok(())
    }

    #[test]
    fn favourite_tie_goes_to_first_seen_type() -> TestResult {
        let today = date(2026, 10, 16);
        let bookings = [
            booking(
                BookingStatus::Confirmed,
                "2026-10-02T10:00:00Z",
                &[(ClassType::FamilyYoga, today, 10)],
            )?,
            booking(
                BookingStatus::Confirmed,
                "2026-10-01T10:00:00Z",
                &[
                    (ClassType::AerialYoga, today, 10),
                    (ClassType::AerialYoga, today, 10),
                    (ClassType::FamilyYoga, today, 10),
                ],
            )?,
        ];

        let stats = BookingStats::from_bookings(&bookings, today);

        assert_eq!(stats.class_type_stats.get("Family Yoga"), Some(&2));
        assert_eq!(stats.class_type_stats.get("Aerial Yoga"), Some(&2));
        assert_eq!(stats.favorite_class_type.as_deref(), Some("Family Yoga"));

        Ok(())
    }

    #[test]
    fn average_keeps_full_precision() -> TestResult {
        let today = date(2026, 10, 16);
        let bookings = [
            booking(BookingStatus::Confirmed, "2026-10-01T10:00:00Z", &[(ClassType::FlowYoga, today, 10)])?,
            booking(BookingStatus::Confirmed, "2026-10-01T10:00:00Z", &[(ClassType::FlowYoga, today, 10)])?,
            booking(BookingStatus::Confirmed, "2026-10-01T10:00:00Z", &[(ClassType::FlowYoga, today, 0)])?,
        ];

        let stats = BookingStats::from_bookings(&bookings, today);

        assert_eq!(stats.total_spent, Decimal::from(20));
        assert_eq!(
            stats.average_per_booking,
            Decimal::from(20) / Decimal::from(3),
            "average must be total spent over booking count, unrounded"
        );
        assert_ne!(stats.average_per_booking, Decimal::new(667, 2));

        Ok(())
    }
}

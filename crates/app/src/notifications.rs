//! Booking confirmation hand-off.

use async_trait::async_trait;
use jiff::civil::Date;
use mockall::automock;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::domain::bookings::models::{Booking, BookingId};

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("confirmation delivery failed: {0}")]
    Delivery(String),
}

/// Payload handed to the delivery channel after a booking is submitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub booking_id: BookingId,
    pub user_email: String,
    pub total_amount: Decimal,
    pub items: Vec<ConfirmationItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationItem {
    pub class_name: String,
    pub date: Option<Date>,
    pub time: String,
    pub teacher: String,
}

impl From<&Booking> for BookingConfirmation {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id.clone(),
            user_email: booking.user_email.clone(),
            total_amount: booking.summary.total_amount,
            items: booking
                .items
                .iter()
                .map(|item| ConfirmationItem {
                    class_name: item.details.class_name.clone(),
                    date: item.details.date,
                    time: item.details.time.clone(),
                    teacher: item.details.teacher.clone(),
                })
                .collect(),
        }
    }
}

#[automock]
#[async_trait]
pub trait ConfirmationSender: Send + Sync {
    /// Deliver a confirmation; best effort from the caller's point of view.
    async fn send(&self, confirmation: BookingConfirmation) -> Result<(), NotificationError>;
}

/// Sender that only records the hand-off in the log.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfirmationSender;

#[async_trait]
impl ConfirmationSender for LoggingConfirmationSender {
    async fn send(&self, confirmation: BookingConfirmation) -> Result<(), NotificationError> {
        info!(
            booking = %confirmation.booking_id,
            items = confirmation.items.len(),
            total = %confirmation.total_amount,
            "booking confirmation queued"
        );

        Ok(())
    }
}

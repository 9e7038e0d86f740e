//! Booking Config

use std::num::NonZeroU32;

use clap::Args;

use crate::domain::bookings::BookingSettings;

/// Booking and cart behaviour settings.
#[derive(Debug, Clone, Args)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "independent boolean feature toggles from env."
)]
pub struct BookingConfig {
    /// Attempts per booking transaction under write contention.
    #[arg(
        long = "booking-max-attempts",
        env = "BOOKING_TRANSACTION_MAX_ATTEMPTS",
        default_value = "5"
    )]
    pub max_attempts: NonZeroU32,

    /// Hand off a confirmation after each submitted booking.
    #[arg(
        long = "booking-send-confirmations",
        env = "BOOKING_SEND_CONFIRMATIONS",
        default_value_t = true
    )]
    pub send_confirmations: bool,

    /// Refuse cancellation of bookings with no class left ahead.
    #[arg(
        long = "booking-check-cancellable",
        env = "BOOKING_CHECK_CANCELLABLE",
        default_value_t = true
    )]
    pub check_cancellable: bool,

    /// Re-check seats inside the submit transaction.
    #[arg(
        long = "booking-enforce-capacity",
        env = "BOOKING_ENFORCE_CAPACITY",
        default_value_t = false
    )]
    pub enforce_capacity: bool,

    /// Check seat availability before adding a class to the cart.
    #[arg(
        long = "cart-check-availability",
        env = "CART_CHECK_AVAILABILITY",
        default_value_t = true
    )]
    pub check_availability: bool,
}

impl BookingConfig {
    /// Transaction settings for the bookings service.
    #[must_use]
    pub fn settings(&self) -> BookingSettings {
        BookingSettings {
            max_attempts: self.max_attempts,
            enforce_capacity: self.enforce_capacity,
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        let settings = BookingSettings::default();

        Self {
            max_attempts: settings.max_attempts,
            send_confirmations: true,
            check_cancellable: true,
            enforce_capacity: settings.enforce_capacity,
            check_availability: true,
        }
    }
}

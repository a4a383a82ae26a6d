//! Table booking model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// First and last bookable slot (hour of day).
pub const FIRST_SLOT: i16 = 10;
pub const LAST_SLOT: i16 = 20;
/// Slot used when a request leaves it out.
pub const DEFAULT_SLOT: i16 = FIRST_SLOT;

/// Stored booking. At most one booking exists per (date, slot).
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: u64,
    /// Owner
    pub user_id: u64,
    pub first_name: String,
    pub reservation_date: NaiveDate,
    pub reservation_slot: i16,
}

/// Fields needed to create a booking.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: u64,
    pub first_name: String,
    pub reservation_date: NaiveDate,
    pub reservation_slot: i16,
}

/// Filter for listing bookings.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingFilter {
    /// Only bookings owned by this user
    pub user_id: Option<u64>,
    /// Only bookings on this date
    pub date: Option<NaiveDate>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.user_id.map_or(true, |id| booking.user_id == id)
            && self.date.map_or(true, |d| booking.reservation_date == d)
    }
}

/// Booking as returned by the API, with the owner's username.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct BookingResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub user: String,
    pub first_name: String,
    pub reservation_date: NaiveDate,
    pub reservation_slot: i16,
}

impl BookingResponse {
    pub fn new(booking: Booking, username: String) -> Self {
        Self {
            id: booking.id,
            user: username,
            first_name: booking.first_name,
            reservation_date: booking.reservation_date,
            reservation_slot: booking.reservation_slot,
        }
    }
}

/// Whether `slot` is a bookable slot.
pub fn is_valid_slot(slot: i16) -> bool {
    (FIRST_SLOT..=LAST_SLOT).contains(&slot)
}

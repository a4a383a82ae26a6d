// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod booking;
pub mod menu;
pub mod user;

pub use booking::{Booking, BookingFilter, NewBooking};
pub use menu::{MenuItem, NewMenuItem, Price};
pub use user::{NewUser, User};

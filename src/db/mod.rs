// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`Store`] is the storage contract used by the routes. [`MySqlStore`] is
//! the production backend; [`MemoryStore`] serves local development and
//! tests.

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

use crate::models::{Booking, BookingFilter, MenuItem, NewBooking, NewMenuItem, NewUser, User};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Table names as constants.
pub mod tables {
    pub const USERS: &str = "users";
    pub const MENU_ITEMS: &str = "menu_items";
    pub const BOOKINGS: &str = "bookings";
}

/// Storage-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("username already taken: {0}")]
    DuplicateUsername(String),

    #[error("slot {slot} is already taken on {date}")]
    SlotTaken { date: NaiveDate, slot: i16 },

    #[error("backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage contract for users, menu items and bookings.
#[async_trait]
pub trait Store: Send + Sync {
    /// Check that the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;

    // ─── Users ───────────────────────────────────────────────────

    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn get_user(&self, id: u64) -> StoreResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    /// All users ordered by ID.
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn update_user(&self, user: &User) -> StoreResult<()>;
    /// Delete a user and their bookings. Returns `false` if no such user.
    async fn delete_user(&self, id: u64) -> StoreResult<bool>;

    // ─── Menu ────────────────────────────────────────────────────

    /// All menu items ordered by ID.
    async fn list_menu_items(&self) -> StoreResult<Vec<MenuItem>>;
    async fn get_menu_item(&self, id: u64) -> StoreResult<Option<MenuItem>>;
    async fn create_menu_item(&self, item: NewMenuItem) -> StoreResult<MenuItem>;
    async fn update_menu_item(&self, item: &MenuItem) -> StoreResult<()>;
    async fn delete_menu_item(&self, id: u64) -> StoreResult<bool>;

    // ─── Bookings ────────────────────────────────────────────────

    /// Bookings matching `filter`, ordered by ID.
    async fn list_bookings(&self, filter: BookingFilter) -> StoreResult<Vec<Booking>>;
    async fn get_booking(&self, id: u64) -> StoreResult<Option<Booking>>;
    /// Fails with [`StoreError::SlotTaken`] if the slot is booked.
    async fn create_booking(&self, booking: NewBooking) -> StoreResult<Booking>;
    /// Fails with [`StoreError::SlotTaken`] if another booking holds the slot.
    async fn update_booking(&self, booking: &Booking) -> StoreResult<()>;
    async fn delete_booking(&self, id: u64) -> StoreResult<bool>;
}

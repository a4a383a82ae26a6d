// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory [`Store`] used for local development and tests.
//!
//! All tables sit behind one lock, so uniqueness checks and the writes they
//! guard happen atomically.

use super::{Store, StoreError, StoreResult};
use crate::models::{Booking, BookingFilter, MenuItem, NewBooking, NewMenuItem, NewUser, User};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    users: BTreeMap<u64, User>,
    menu_items: BTreeMap<u64, MenuItem>,
    bookings: BTreeMap<u64, Booking>,
    next_user_id: u64,
    next_menu_item_id: u64,
    next_booking_id: u64,
}

impl Tables {
    fn username_taken(&self, username: &str, except: Option<u64>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn slot_holder(&self, booking_date: chrono::NaiveDate, slot: i16) -> Option<u64> {
        self.bookings
            .values()
            .find(|b| b.reservation_date == booking_date && b.reservation_slot == slot)
            .map(|b| b.id)
    }
}

fn next_id(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

/// In-memory storage backend.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }

    // ─── Users ───────────────────────────────────────────────────

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.write()?;
        if tables.username_taken(&user.username, None) {
            return Err(StoreError::DuplicateUsername(user.username));
        }

        let id = next_id(&mut tables.next_user_id);
        let user = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_superuser: user.is_superuser,
            is_active: true,
            date_joined: chrono::Utc::now(),
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: u64) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.read()?.users.values().cloned().collect())
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.write()?;
        if !tables.users.contains_key(&user.id) {
            return Err(StoreError::NotFound(format!("user {}", user.id)));
        }
        if tables.username_taken(&user.username, Some(user.id)) {
            return Err(StoreError::DuplicateUsername(user.username.clone()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: u64) -> StoreResult<bool> {
        let mut tables = self.write()?;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.bookings.retain(|_, b| b.user_id != id);
        Ok(true)
    }

    // ─── Menu ────────────────────────────────────────────────────

    async fn list_menu_items(&self) -> StoreResult<Vec<MenuItem>> {
        Ok(self.read()?.menu_items.values().cloned().collect())
    }

    async fn get_menu_item(&self, id: u64) -> StoreResult<Option<MenuItem>> {
        Ok(self.read()?.menu_items.get(&id).cloned())
    }

    async fn create_menu_item(&self, item: NewMenuItem) -> StoreResult<MenuItem> {
        let mut tables = self.write()?;
        let id = next_id(&mut tables.next_menu_item_id);
        let item = MenuItem {
            id,
            title: item.title,
            price: item.price,
            inventory: item.inventory,
        };
        tables.menu_items.insert(id, item.clone());
        Ok(item)
    }

    async fn update_menu_item(&self, item: &MenuItem) -> StoreResult<()> {
        let mut tables = self.write()?;
        match tables.menu_items.get_mut(&item.id) {
            Some(existing) => {
                *existing = item.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("menu item {}", item.id))),
        }
    }

    async fn delete_menu_item(&self, id: u64) -> StoreResult<bool> {
        Ok(self.write()?.menu_items.remove(&id).is_some())
    }

    // ─── Bookings ────────────────────────────────────────────────

    async fn list_bookings(&self, filter: BookingFilter) -> StoreResult<Vec<Booking>> {
        Ok(self
            .read()?
            .bookings
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect())
    }

    async fn get_booking(&self, id: u64) -> StoreResult<Option<Booking>> {
        Ok(self.read()?.bookings.get(&id).cloned())
    }

    async fn create_booking(&self, booking: NewBooking) -> StoreResult<Booking> {
        let mut tables = self.write()?;
        if !tables.users.contains_key(&booking.user_id) {
            return Err(StoreError::NotFound(format!("user {}", booking.user_id)));
        }
        if tables
            .slot_holder(booking.reservation_date, booking.reservation_slot)
            .is_some()
        {
            return Err(StoreError::SlotTaken {
                date: booking.reservation_date,
                slot: booking.reservation_slot,
            });
        }

        let id = next_id(&mut tables.next_booking_id);
        let booking = Booking {
            id,
            user_id: booking.user_id,
            first_name: booking.first_name,
            reservation_date: booking.reservation_date,
            reservation_slot: booking.reservation_slot,
        };
        tables.bookings.insert(id, booking.clone());
        Ok(booking)
    }

    async fn update_booking(&self, booking: &Booking) -> StoreResult<()> {
        let mut tables = self.write()?;
        if !tables.bookings.contains_key(&booking.id) {
            return Err(StoreError::NotFound(format!("booking {}", booking.id)));
        }
        match tables.slot_holder(booking.reservation_date, booking.reservation_slot) {
            Some(holder) if holder != booking.id => Err(StoreError::SlotTaken {
                date: booking.reservation_date,
                slot: booking.reservation_slot,
            }),
            _ => {
                tables.bookings.insert(booking.id, booking.clone());
                Ok(())
            }
        }
    }

    async fn delete_booking(&self, id: u64) -> StoreResult<bool> {
        Ok(self.write()?.bookings.remove(&id).is_some())
    }
}

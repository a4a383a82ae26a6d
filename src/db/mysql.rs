// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! MySQL-backed [`Store`].
//!
//! The schema is created on startup. Slot uniqueness is enforced by a unique
//! index, so concurrent bookings for the same slot cannot both commit.

use super::{tables, Store, StoreError, StoreResult};
use crate::config::DatabaseConfig;
use crate::models::{
    Booking, BookingFilter, MenuItem, NewBooking, NewMenuItem, NewUser, Price, User,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::{MySqlPool, Row};
use std::str::FromStr;
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Name of the unique index on (reservation_date, reservation_slot).
const SLOT_INDEX: &str = "bookings_date_slot_unique";

/// MySQL storage backend.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Connect and create the schema if needed.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let mut options = MySqlConnectOptions::from_str(&config.url)
            .map_err(|e| StoreError::Backend(format!("Invalid DATABASE_URL: {}", e)))?;
        if let Some((host, port)) = &config.proxy {
            tracing::info!(host = %host, port, "Connecting through Cloud SQL Auth Proxy");
            options = options.host(host).port(*port);
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .max_lifetime(Duration::from_secs(config.conn_max_age_secs))
            .acquire_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to connect to MySQL: {}", e)))?;

        tracing::info!("Connected to MySQL");

        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    /// Create tables and indexes if they do not exist.
    pub async fn initialize_schema(&self) -> StoreResult<()> {
        let statements = [
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {users} (
                    id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
                    username VARCHAR(150) COLLATE utf8mb4_bin NOT NULL,
                    email VARCHAR(254) NOT NULL DEFAULT '',
                    password_hash VARCHAR(255) NOT NULL,
                    is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
                    is_active BOOLEAN NOT NULL DEFAULT TRUE,
                    date_joined DATETIME(6) NOT NULL,
                    UNIQUE KEY users_username_unique (username)
                ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
                "#,
                users = tables::USERS
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {menu} (
                    id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
                    title VARCHAR(255) NOT NULL,
                    price_cents BIGINT NOT NULL,
                    inventory INT NOT NULL
                ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
                "#,
                menu = tables::MENU_ITEMS
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {bookings} (
                    id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
                    user_id BIGINT UNSIGNED NOT NULL,
                    first_name VARCHAR(255) NOT NULL,
                    reservation_date DATE NOT NULL,
                    reservation_slot SMALLINT NOT NULL,
                    UNIQUE KEY {slot_index} (reservation_date, reservation_slot),
                    KEY bookings_user_id (user_id),
                    CONSTRAINT bookings_user_fk FOREIGN KEY (user_id)
                        REFERENCES {users} (id) ON DELETE CASCADE
                ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
                "#,
                bookings = tables::BOOKINGS,
                users = tables::USERS,
                slot_index = SLOT_INDEX
            ),
        ];

        for stmt in statements {
            sqlx::query(&stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Backend(format!("Schema setup failed: {}", e)))?;
        }

        tracing::debug!("Database schema ready");
        Ok(())
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

fn user_from_row(row: &MySqlRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        is_superuser: row.try_get("is_superuser")?,
        is_active: row.try_get("is_active")?,
        date_joined: row.try_get::<DateTime<Utc>, _>("date_joined")?,
    })
}

fn menu_item_from_row(row: &MySqlRow) -> Result<MenuItem, sqlx::Error> {
    Ok(MenuItem {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        price: Price::from_cents(row.try_get("price_cents")?),
        inventory: row.try_get("inventory")?,
    })
}

fn booking_from_row(row: &MySqlRow) -> Result<Booking, sqlx::Error> {
    Ok(Booking {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        first_name: row.try_get("first_name")?,
        reservation_date: row.try_get::<NaiveDate, _>("reservation_date")?,
        reservation_slot: row.try_get("reservation_slot")?,
    })
}

const USER_COLUMNS: &str = "id, username, email, password_hash, is_superuser, is_active, date_joined";
const BOOKING_COLUMNS: &str = "id, user_id, first_name, reservation_date, reservation_slot";

#[async_trait]
impl Store for MySqlStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    // ─── Users ───────────────────────────────────────────────────

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let date_joined = Utc::now();
        let result = sqlx::query(&format!(
            "INSERT INTO {} (username, email, password_hash, is_superuser, is_active, date_joined) \
             VALUES (?, ?, ?, ?, TRUE, ?)",
            tables::USERS
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_superuser)
        .bind(date_joined)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateUsername(user.username.clone())
            } else {
                backend(e)
            }
        })?;

        Ok(User {
            id: result.last_insert_id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_superuser: user.is_superuser,
            is_active: true,
            date_joined,
        })
    }

    async fn get_user(&self, id: u64) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE id = ?",
            USER_COLUMNS,
            tables::USERS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.as_ref().map(user_from_row).transpose().map_err(backend)
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE username = ?",
            USER_COLUMNS,
            tables::USERS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.as_ref().map(user_from_row).transpose().map_err(backend)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM {} ORDER BY id",
            USER_COLUMNS,
            tables::USERS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter()
            .map(user_from_row)
            .collect::<Result<_, _>>()
            .map_err(backend)
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET username = ?, email = ?, password_hash = ?, is_superuser = ?, \
             is_active = ? WHERE id = ?",
            tables::USERS
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_superuser)
        .bind(user.is_active)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateUsername(user.username.clone())
            } else {
                backend(e)
            }
        })?;

        // MySQL reports 0 affected rows when nothing changed, so check existence.
        if result.rows_affected() == 0 && self.get_user(user.id).await?.is_none() {
            return Err(StoreError::NotFound(format!("user {}", user.id)));
        }
        Ok(())
    }

    async fn delete_user(&self, id: u64) -> StoreResult<bool> {
        // Bookings go with the user via ON DELETE CASCADE.
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", tables::USERS))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }

    // ─── Menu ────────────────────────────────────────────────────

    async fn list_menu_items(&self) -> StoreResult<Vec<MenuItem>> {
        let rows = sqlx::query(&format!(
            "SELECT id, title, price_cents, inventory FROM {} ORDER BY id",
            tables::MENU_ITEMS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter()
            .map(menu_item_from_row)
            .collect::<Result<_, _>>()
            .map_err(backend)
    }

    async fn get_menu_item(&self, id: u64) -> StoreResult<Option<MenuItem>> {
        let row = sqlx::query(&format!(
            "SELECT id, title, price_cents, inventory FROM {} WHERE id = ?",
            tables::MENU_ITEMS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.as_ref().map(menu_item_from_row).transpose().map_err(backend)
    }

    async fn create_menu_item(&self, item: NewMenuItem) -> StoreResult<MenuItem> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (title, price_cents, inventory) VALUES (?, ?, ?)",
            tables::MENU_ITEMS
        ))
        .bind(&item.title)
        .bind(item.price.cents())
        .bind(item.inventory)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(MenuItem {
            id: result.last_insert_id(),
            title: item.title,
            price: item.price,
            inventory: item.inventory,
        })
    }

    async fn update_menu_item(&self, item: &MenuItem) -> StoreResult<()> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET title = ?, price_cents = ?, inventory = ? WHERE id = ?",
            tables::MENU_ITEMS
        ))
        .bind(&item.title)
        .bind(item.price.cents())
        .bind(item.inventory)
        .bind(item.id)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 && self.get_menu_item(item.id).await?.is_none() {
            return Err(StoreError::NotFound(format!("menu item {}", item.id)));
        }
        Ok(())
    }

    async fn delete_menu_item(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", tables::MENU_ITEMS))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }

    // ─── Bookings ────────────────────────────────────────────────

    async fn list_bookings(&self, filter: BookingFilter) -> StoreResult<Vec<Booking>> {
        let mut sql = format!("SELECT {} FROM {} WHERE 1 = 1", BOOKING_COLUMNS, tables::BOOKINGS);
        if filter.user_id.is_some() {
            sql.push_str(" AND user_id = ?");
        }
        if filter.date.is_some() {
            sql.push_str(" AND reservation_date = ?");
        }
        sql.push_str(" ORDER BY id");

        let mut query = sqlx::query(&sql);
        if let Some(user_id) = filter.user_id {
            query = query.bind(user_id);
        }
        if let Some(date) = filter.date {
            query = query.bind(date);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(backend)?;
        rows.iter()
            .map(booking_from_row)
            .collect::<Result<_, _>>()
            .map_err(backend)
    }

    async fn get_booking(&self, id: u64) -> StoreResult<Option<Booking>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE id = ?",
            BOOKING_COLUMNS,
            tables::BOOKINGS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.as_ref().map(booking_from_row).transpose().map_err(backend)
    }

    async fn create_booking(&self, booking: NewBooking) -> StoreResult<Booking> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (user_id, first_name, reservation_date, reservation_slot) \
             VALUES (?, ?, ?, ?)",
            tables::BOOKINGS
        ))
        .bind(booking.user_id)
        .bind(&booking.first_name)
        .bind(booking.reservation_date)
        .bind(booking.reservation_slot)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::SlotTaken {
                    date: booking.reservation_date,
                    slot: booking.reservation_slot,
                }
            } else {
                backend(e)
            }
        })?;

        Ok(Booking {
            id: result.last_insert_id(),
            user_id: booking.user_id,
            first_name: booking.first_name,
            reservation_date: booking.reservation_date,
            reservation_slot: booking.reservation_slot,
        })
    }

    async fn update_booking(&self, booking: &Booking) -> StoreResult<()> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET user_id = ?, first_name = ?, reservation_date = ?, \
             reservation_slot = ? WHERE id = ?",
            tables::BOOKINGS
        ))
        .bind(booking.user_id)
        .bind(&booking.first_name)
        .bind(booking.reservation_date)
        .bind(booking.reservation_slot)
        .bind(booking.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::SlotTaken {
                    date: booking.reservation_date,
                    slot: booking.reservation_slot,
                }
            } else {
                backend(e)
            }
        })?;

        if result.rows_affected() == 0 && self.get_booking(booking.id).await?.is_none() {
            return Err(StoreError::NotFound(format!("booking {}", booking.id)));
        }
        Ok(())
    }

    async fn delete_booking(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", tables::BOOKINGS))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Table booking routes.
//!
//! Every route requires authentication. Ordinary users only see their own
//! bookings; someone else's booking looks exactly like a missing one.

use crate::error::{AppError, FieldErrors, Result, NON_FIELD_ERRORS};
use crate::middleware::AuthUser;
use crate::models::booking::{is_valid_slot, BookingResponse, DEFAULT_SLOT, FIRST_SLOT, LAST_SLOT};
use crate::models::{Booking, BookingFilter, NewBooking};
use crate::routes::{int_or_string, JsonBody, PathParam, REQUIRED};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

const DATE_REQUIRED: &str = "Reservation date is required.";
const INVALID_DATE: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings/", get(list_bookings).post(create_booking))
        .route(
            "/bookings/{id}/",
            get(get_booking)
                .put(replace_booking)
                .patch(patch_booking)
                .delete(delete_booking),
        )
}

#[derive(Debug, Deserialize)]
pub struct BookingQuery {
    pub date: Option<String>,
}

/// Request body for creating/updating a booking.
#[derive(Debug, Deserialize)]
pub struct BookingInput {
    pub first_name: Option<String>,
    pub reservation_date: Option<String>,
    /// Wide integer so out-of-range values get a readable error.
    #[serde(default, deserialize_with = "int_or_string")]
    pub reservation_slot: Option<i64>,
}

/// Validated booking fields.
#[derive(Debug, PartialEq)]
struct BookingFields {
    first_name: String,
    reservation_date: NaiveDate,
    reservation_slot: i16,
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

impl BookingInput {
    /// Resolve the final field values.
    ///
    /// With `existing`, missing fields keep their current value. Without it,
    /// the date is required and the slot defaults to the first slot.
    fn resolve(self, existing: Option<&Booking>) -> Result<BookingFields> {
        let mut fields = FieldErrors::new();

        let first_name = match self.first_name.map(|n| n.trim().to_string()) {
            Some(name) if name.is_empty() => {
                fields.insert("first_name".to_string(), vec!["This field may not be blank.".to_string()]);
                None
            }
            Some(name) if name.chars().count() > 255 => {
                fields.insert(
                    "first_name".to_string(),
                    vec!["Ensure this field has no more than 255 characters.".to_string()],
                );
                None
            }
            Some(name) => Some(name),
            None => {
                let name = existing.map(|b| b.first_name.clone());
                if name.is_none() {
                    fields.insert("first_name".to_string(), vec![REQUIRED.to_string()]);
                }
                name
            }
        };

        let reservation_date = match self.reservation_date {
            Some(raw) => {
                let date = parse_date(&raw);
                if date.is_none() {
                    fields.insert("reservation_date".to_string(), vec![INVALID_DATE.to_string()]);
                }
                date
            }
            None => {
                let date = existing.map(|b| b.reservation_date);
                if date.is_none() {
                    fields.insert(NON_FIELD_ERRORS.to_string(), vec![DATE_REQUIRED.to_string()]);
                }
                date
            }
        };

        let slot = self
            .reservation_slot
            .or_else(|| existing.map(|b| i64::from(b.reservation_slot)))
            .unwrap_or(i64::from(DEFAULT_SLOT));
        let reservation_slot = match i16::try_from(slot) {
            Ok(slot) if is_valid_slot(slot) => Some(slot),
            _ => {
                fields.insert(
                    "reservation_slot".to_string(),
                    vec![format!(
                        "Reservation slot must be between {} and {}",
                        FIRST_SLOT, LAST_SLOT
                    )],
                );
                None
            }
        };

        match (first_name, reservation_date, reservation_slot) {
            (Some(first_name), Some(reservation_date), Some(reservation_slot))
                if fields.is_empty() =>
            {
                Ok(BookingFields {
                    first_name,
                    reservation_date,
                    reservation_slot,
                })
            }
            _ => Err(AppError::Validation(fields)),
        }
    }
}

/// Load a booking the caller may act on.
async fn load(state: &AppState, user: &AuthUser, id: u64) -> Result<Booking> {
    state
        .store
        .get_booking(id)
        .await?
        .filter(|b| user.can_access(b.user_id))
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
}

/// Owner's username; the caller's own name when they own it.
async fn owner_name(state: &AppState, user: &AuthUser, owner_id: u64) -> Result<String> {
    if owner_id == user.id {
        return Ok(user.username.clone());
    }
    Ok(state
        .store
        .get_user(owner_id)
        .await?
        .map(|u| u.username)
        .unwrap_or_default())
}

async fn respond(state: &AppState, user: &AuthUser, booking: Booking) -> Result<Json<BookingResponse>> {
    let username = owner_name(state, user, booking.user_id).await?;
    Ok(Json(BookingResponse::new(booking, username)))
}

/// List bookings visible to the caller, optionally for one date.
async fn list_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<BookingQuery>,
) -> Result<Json<Vec<BookingResponse>>> {
    let date = match query.date.as_deref() {
        Some(raw) => Some(parse_date(raw).ok_or_else(|| AppError::field("date", INVALID_DATE))?),
        None => None,
    };

    let filter = BookingFilter {
        user_id: (!user.is_superuser).then_some(user.id),
        date,
    };
    let bookings = state.store.list_bookings(filter).await?;

    let usernames: HashMap<u64, String> = if user.is_superuser {
        state
            .store
            .list_users()
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect()
    } else {
        HashMap::from([(user.id, user.username.clone())])
    };

    let response = bookings
        .into_iter()
        .map(|b| {
            let username = usernames.get(&b.user_id).cloned().unwrap_or_default();
            BookingResponse::new(b, username)
        })
        .collect();
    Ok(Json(response))
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    JsonBody(input): JsonBody<BookingInput>,
) -> Result<(StatusCode, Json<BookingResponse>)> {
    let fields = input.resolve(None)?;

    let booking = state
        .store
        .create_booking(NewBooking {
            user_id: user.id,
            first_name: fields.first_name,
            reservation_date: fields.reservation_date,
            reservation_slot: fields.reservation_slot,
        })
        .await?;

    tracing::info!(
        user_id = user.id,
        booking_id = booking.id,
        date = %booking.reservation_date,
        slot = booking.reservation_slot,
        "Booking created"
    );
    Ok((
        StatusCode::CREATED,
        Json(BookingResponse::new(booking, user.username)),
    ))
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    PathParam(id): PathParam<u64>,
) -> Result<Json<BookingResponse>> {
    let booking = load(&state, &user, id).await?;
    respond(&state, &user, booking).await
}

/// PUT: name and date must be supplied; slot defaults to the first slot.
async fn replace_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    PathParam(id): PathParam<u64>,
    JsonBody(input): JsonBody<BookingInput>,
) -> Result<Json<BookingResponse>> {
    let current = load(&state, &user, id).await?;
    let fields = input.resolve(None)?;
    save(&state, &user, current, fields).await
}

/// PATCH: only supplied fields change.
async fn patch_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    PathParam(id): PathParam<u64>,
    JsonBody(input): JsonBody<BookingInput>,
) -> Result<Json<BookingResponse>> {
    let current = load(&state, &user, id).await?;
    let fields = input.resolve(Some(&current))?;
    save(&state, &user, current, fields).await
}

async fn save(
    state: &AppState,
    user: &AuthUser,
    current: Booking,
    fields: BookingFields,
) -> Result<Json<BookingResponse>> {
    let booking = Booking {
        first_name: fields.first_name,
        reservation_date: fields.reservation_date,
        reservation_slot: fields.reservation_slot,
        ..current
    };
    state.store.update_booking(&booking).await?;

    tracing::info!(user_id = user.id, booking_id = booking.id, "Booking updated");
    respond(state, user, booking).await
}

async fn delete_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    PathParam(id): PathParam<u64>,
) -> Result<StatusCode> {
    let booking = load(&state, &user, id).await?;
    if !state.store.delete_booking(booking.id).await? {
        return Err(AppError::NotFound(format!("Booking {} not found", id)));
    }
    tracing::info!(user_id = user.id, booking_id = id, "Booking deleted");
    Ok(StatusCode::NO_CONTENT)
}

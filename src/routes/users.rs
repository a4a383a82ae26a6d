// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User account routes under `/auth/users/`.

use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::AuthUser;
use crate::models::user::{is_valid_username, UserResponse};
use crate::models::User;
use crate::routes::{JsonBody, PathParam, REQUIRED};
use crate::services::{accounts, passwords};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::ValidateEmail;

const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
const INVALID_PASSWORD: &str = "Invalid password.";
const INVALID_EMAIL: &str = "Enter a valid email address.";
const MAX_EMAIL_LEN: usize = 254;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/users/", get(list_users).post(register))
        .route(
            "/auth/users/me/",
            get(get_me).put(update_me).patch(update_me).delete(delete_me),
        )
        .route("/auth/users/set_password/", post(set_password))
        .route("/auth/users/set_username/", post(set_username))
        .route("/auth/users/{username}/", get(get_user))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    #[serde(default)]
    pub email: String,
    pub password: Option<String>,
    pub re_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CurrentPasswordRequest {
    pub current_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    /// Optional confirmation; checked when present.
    pub re_new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetUsernameRequest {
    pub current_password: Option<String>,
    pub new_username: Option<String>,
}

/// Record a "required" error for each missing field.
fn require<'a>(fields: &mut FieldErrors, name: &str, value: &'a Option<String>) -> &'a str {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v,
        _ => {
            fields.insert(name.to_string(), vec![REQUIRED.to_string()]);
            ""
        }
    }
}

/// Empty emails are allowed; anything else must look like an address.
fn check_email(email: &str) -> Result<()> {
    if email.is_empty() || (email.len() <= MAX_EMAIL_LEN && email.validate_email()) {
        Ok(())
    } else {
        Err(AppError::field("email", INVALID_EMAIL))
    }
}

async fn current_user(state: &AppState, user: &AuthUser) -> Result<User> {
    // The account can vanish between authentication and here.
    state
        .store
        .get_user(user.id)
        .await?
        .ok_or(AppError::InvalidToken)
}

/// Verify `current_password` against the stored hash.
async fn check_current_password(user: &User, current_password: &str) -> Result<()> {
    let ok = passwords::verify_password_blocking(
        current_password.to_string(),
        user.password_hash.clone(),
    )
    .await;
    if !ok {
        tracing::warn!(user_id = user.id, "Current password check failed");
        return Err(AppError::field("current_password", INVALID_PASSWORD));
    }
    Ok(())
}

/// Register a new account.
async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let mut fields = FieldErrors::new();
    let username = require(&mut fields, "username", &req.username);
    let password = require(&mut fields, "password", &req.password);
    let re_password = require(&mut fields, "re_password", &req.re_password);
    if !fields.is_empty() {
        return Err(AppError::Validation(fields));
    }

    let email = req.email.trim();
    check_email(email)?;
    if password != re_password {
        return Err(AppError::non_field(PASSWORD_MISMATCH));
    }

    let user = accounts::create_account(
        state.store.as_ref(),
        username,
        email,
        password,
        false,
        state.config.password_iterations,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Superusers see every account; others only their own.
async fn list_users(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<UserResponse>>> {
    let users = if user.is_superuser {
        state.store.list_users().await?
    } else {
        vec![current_user(&state, &user).await?]
    };
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

async fn get_me(State(state): State<Arc<AppState>>, user: AuthUser) -> Result<Json<UserResponse>> {
    let me = current_user(&state, &user).await?;
    Ok(Json(UserResponse::from(&me)))
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    JsonBody(req): JsonBody<UpdateMeRequest>,
) -> Result<Json<UserResponse>> {
    let mut me = current_user(&state, &user).await?;

    if let Some(email) = req.email {
        let email = email.trim().to_string();
        check_email(&email)?;
        me.email = email;
        state.store.update_user(&me).await?;
        tracing::info!(user_id = me.id, "Email updated");
    }

    Ok(Json(UserResponse::from(&me)))
}

/// Delete the caller's account and their bookings.
async fn delete_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    JsonBody(req): JsonBody<CurrentPasswordRequest>,
) -> Result<StatusCode> {
    let mut fields = FieldErrors::new();
    let current_password = require(&mut fields, "current_password", &req.current_password);
    if !fields.is_empty() {
        return Err(AppError::Validation(fields));
    }

    let me = current_user(&state, &user).await?;
    check_current_password(&me, current_password).await?;

    state.store.delete_user(me.id).await?;
    tracing::info!(user_id = me.id, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Profile by username, visible to its owner and superusers.
async fn get_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    PathParam(username): PathParam<String>,
) -> Result<Json<UserResponse>> {
    let not_found = || AppError::NotFound(format!("User {} not found", username));

    if !user.is_superuser && user.username != username {
        return Err(not_found());
    }
    let found = state
        .store
        .get_user_by_username(&username)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(UserResponse::from(&found)))
}

async fn set_password(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    JsonBody(req): JsonBody<SetPasswordRequest>,
) -> Result<StatusCode> {
    let mut fields = FieldErrors::new();
    let current_password = require(&mut fields, "current_password", &req.current_password);
    let new_password = require(&mut fields, "new_password", &req.new_password);
    if !fields.is_empty() {
        return Err(AppError::Validation(fields));
    }
    if req
        .re_new_password
        .as_deref()
        .is_some_and(|confirm| confirm != new_password)
    {
        return Err(AppError::non_field(PASSWORD_MISMATCH));
    }

    let mut me = current_user(&state, &user).await?;
    check_current_password(&me, current_password).await?;
    if let Err(problems) = passwords::validate_password(new_password, &me.username) {
        let mut fields = FieldErrors::new();
        fields.insert("new_password".to_string(), problems);
        return Err(AppError::Validation(fields));
    }

    me.password_hash = passwords::hash_password_blocking(
        new_password.to_string(),
        state.config.password_iterations,
    )
    .await?;
    state.store.update_user(&me).await?;

    tracing::info!(user_id = me.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

async fn set_username(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    JsonBody(req): JsonBody<SetUsernameRequest>,
) -> Result<StatusCode> {
    let mut fields = FieldErrors::new();
    let current_password = require(&mut fields, "current_password", &req.current_password);
    let new_username = require(&mut fields, "new_username", &req.new_username);
    if !fields.is_empty() {
        return Err(AppError::Validation(fields));
    }
    if !is_valid_username(new_username) {
        return Err(AppError::field(
            "new_username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }

    let mut me = current_user(&state, &user).await?;
    check_current_password(&me, current_password).await?;

    if new_username != me.username
        && state.store.get_user_by_username(new_username).await?.is_some()
    {
        return Err(AppError::field(
            "new_username",
            "A user with that username already exists.",
        ));
    }

    let old_username = std::mem::replace(&mut me.username, new_username.to_string());
    state.store.update_user(&me).await?;

    tracing::info!(user_id = me.id, old = %old_username, new = %me.username, "Username changed");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_collects_missing() {
        let mut fields = FieldErrors::new();
        let present = Some("tilly".to_string());
        let empty = Some(String::new());
        assert_eq!(require(&mut fields, "username", &present), "tilly");
        require(&mut fields, "password", &empty);
        require(&mut fields, "re_password", &None);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["password"], vec![REQUIRED]);
    }

    #[test]
    fn test_check_email() {
        assert!(check_email("").is_ok());
        assert!(check_email("tilly@littlelemon.com").is_ok());
        assert!(check_email("not-an-email").is_err());
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT issue, refresh and verify endpoints under `/auth/jwt/`.

use crate::error::{AppError, FieldErrors, Result};
use crate::routes::{JsonBody, REQUIRED};
use crate::services::passwords;
use crate::services::tokens::{TokenPair, TokenType};
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/jwt/create/", post(create_token))
        .route("/auth/jwt/refresh/", post(refresh_token))
        .route("/auth/jwt/verify/", post(verify_token))
}

#[derive(Debug, Deserialize)]
pub struct CreateTokenRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub access: String,
}

#[derive(Debug, Serialize)]
pub struct EmptyResponse {}

/// Fail with a "required" error for each missing field.
fn required_fields(present: &[(&str, bool)]) -> Result<()> {
    let fields: FieldErrors = present
        .iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| (name.to_string(), vec![REQUIRED.to_string()]))
        .collect();
    if fields.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(fields))
    }
}

/// Exchange credentials for an access/refresh pair.
async fn create_token(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateTokenRequest>,
) -> Result<Json<TokenPair>> {
    required_fields(&[
        ("username", req.username.is_some()),
        ("password", req.password.is_some()),
    ])?;
    let username = req.username.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    let user = state.store.get_user_by_username(&username).await?;

    // Unknown usernames still pay for a full hash check.
    let encoded = match &user {
        Some(user) => user.password_hash.clone(),
        None => passwords::dummy_hash(state.config.password_iterations),
    };
    let authenticated = passwords::verify_password_blocking(password, encoded).await;

    match user {
        Some(user) if authenticated && user.is_active => {
            let pair = state.tokens.issue_pair(user.id).map_err(anyhow::Error::from)?;
            tracing::info!(user_id = user.id, "Issued token pair");
            Ok(Json(pair))
        }
        _ => {
            tracing::warn!(username = %username, "Failed login attempt");
            Err(AppError::NoActiveAccount)
        }
    }
}

/// Exchange a refresh token for a new access token.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<RefreshRequest>,
) -> Result<Json<AccessResponse>> {
    required_fields(&[("refresh", req.refresh.is_some())])?;
    let refresh = req.refresh.unwrap_or_default();

    let claims = state
        .tokens
        .verify_type(&refresh, TokenType::Refresh)
        .map_err(|err| {
            tracing::debug!(error = %err, "Rejected refresh token");
            AppError::InvalidToken
        })?;
    let user_id = claims.user_id().ok_or(AppError::InvalidToken)?;

    // Deactivated or deleted accounts cannot refresh.
    state
        .store
        .get_user(user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AppError::InvalidToken)?;

    let access = state
        .tokens
        .issue(user_id, TokenType::Access)
        .map_err(anyhow::Error::from)?;
    Ok(Json(AccessResponse { access }))
}

/// Check that a token of either type is valid.
async fn verify_token(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<VerifyRequest>,
) -> Result<Json<EmptyResponse>> {
    required_fields(&[("token", req.token.is_some())])?;
    let token = req.token.unwrap_or_default();

    state
        .tokens
        .verify(&token)
        .map_err(|_| AppError::InvalidToken)?;
    Ok(Json(EmptyResponse {}))
}

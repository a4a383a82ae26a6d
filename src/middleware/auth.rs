// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware and extractors.

use crate::error::AppError;
use crate::services::tokens::TokenType;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: u64,
    pub username: String,
    pub is_superuser: bool,
}

impl AuthUser {
    /// Superusers may act on anything; others only on what they own.
    pub fn can_access(&self, owner_id: u64) -> bool {
        self.is_superuser || self.id == owner_id
    }
}

/// Middleware that authenticates `Authorization: Bearer` requests.
///
/// Requests without bearer credentials pass through anonymously. Bad
/// credentials are rejected outright.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    if let Some(token) = token {
        match resolve_user(&state, &token).await {
            Ok(user) => {
                request.extensions_mut().insert(user);
            }
            Err(err) => return err.into_response(),
        }
    }

    next.run(request).await
}

async fn resolve_user(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let claims = state
        .tokens
        .verify_type(token, TokenType::Access)
        .map_err(|err| {
            tracing::debug!(error = %err, "Rejected bearer token");
            AppError::InvalidToken
        })?;
    let user_id = claims.user_id().ok_or(AppError::InvalidToken)?;

    let user = state
        .store
        .get_user(user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| {
            tracing::warn!(user_id, "Token for missing or inactive user");
            AppError::InvalidToken
        })?;

    Ok(AuthUser {
        id: user.id,
        username: user.username,
        is_superuser: user.is_superuser,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Extractor for routes restricted to superusers.
#[derive(Debug, Clone)]
pub struct Superuser(pub AuthUser);

impl<S> FromRequestParts<S> for Superuser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = <AuthUser as FromRequestParts<S>>::from_request_parts(parts, state).await?;
        if !user.is_superuser {
            tracing::warn!(user_id = user.id, "Non-superuser attempted a restricted action");
            return Err(AppError::Forbidden);
        }
        Ok(Superuser(user))
    }
}

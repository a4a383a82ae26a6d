// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request throttling middleware.

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Throttle anonymous callers by IP and authenticated callers by user.
///
/// Must run after [`super::auth::authenticate`].
pub async fn throttle(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let now = Instant::now();

    let (scope, key, result) = match request.extensions().get::<AuthUser>() {
        Some(user) => {
            let key = user.id.to_string();
            let result = state.user_throttle.check(&key, now);
            ("user", key, result)
        }
        None => {
            let peer = request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr);
            let key = client_ip(request.headers(), peer);
            let result = state.anon_throttle.check(&key, now);
            ("anon", key, result)
        }
    };

    if let Err(retry_after_secs) = result {
        tracing::warn!(
            scope,
            key = %key,
            retry_after_secs,
            path = %request.uri().path(),
            "Request throttled"
        );
        return AppError::Throttled { retry_after_secs }.into_response();
    }

    next.run(request).await
}

/// Client address: last `X-Forwarded-For` hop, else the socket peer.
///
/// Earlier hops come from the client and can be forged; the last one is
/// appended by the proxy in front of the service.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(String::from)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Security headers middleware.

use crate::config::Config;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// `Strict-Transport-Security` value, or `None` in debug mode.
pub fn hsts_header(config: &Config) -> Option<String> {
    if config.debug || config.hsts_seconds == 0 {
        return None;
    }
    let mut value = format!("max-age={}", config.hsts_seconds);
    if config.hsts_include_subdomains {
        value.push_str("; includeSubDomains");
    }
    if config.hsts_preload {
        value.push_str("; preload");
    }
    Some(value)
}

/// Add security headers to all responses.
pub async fn add_security_headers(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("same-origin"));
    headers.insert(
        "Cross-Origin-Opener-Policy",
        HeaderValue::from_static("same-origin"),
    );

    if let Some(hsts) = hsts_header(&state.config) {
        if let Ok(value) = HeaderValue::from_str(&hsts) {
            headers.insert("Strict-Transport-Security", value);
        }
    }

    response
}

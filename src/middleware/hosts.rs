// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Host header validation and HTTPS redirect.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, uri::Authority, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Paths that skip host checks (platform health checks use internal hosts).
const EXEMPT_PATHS: &[&str] = &["/health"];

/// Host from the `Host` header, lowercased and without port.
///
/// IPv6 literals keep their brackets (`[::1]`).
fn request_host(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::HOST)?.to_str().ok()?.trim();
    let authority: Authority = raw.parse().ok()?;
    let host = authority.host();
    (!host.is_empty()).then(|| host.to_ascii_lowercase())
}

/// Whether `host` matches one of the allowed patterns.
///
/// `*` matches anything; `.example.com` matches the domain and subdomains.
pub fn host_allowed(host: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|pattern| {
        let pattern = pattern.to_ascii_lowercase();
        if pattern == "*" {
            true
        } else if let Some(domain) = pattern.strip_prefix('.') {
            host == domain || host.ends_with(&pattern)
        } else {
            host == pattern
        }
    })
}

/// Reject disallowed hosts and redirect plain HTTP when configured.
pub async fn enforce_host(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if EXEMPT_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    // HTTP/2 requests carry the host in the URI authority instead.
    let host = request_host(request.headers())
        .or_else(|| request.uri().host().map(|h| h.to_ascii_lowercase()));
    let host = match host {
        Some(host) if host_allowed(&host, &state.config.allowed_hosts) => host,
        other => {
            let host = other.unwrap_or_default();
            tracing::warn!(host = %host, "Rejected request for disallowed host");
            return AppError::DisallowedHost(host).into_response();
        }
    };

    if state.config.secure_ssl_redirect {
        let forwarded_proto = request
            .headers()
            .get("x-forwarded-proto")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("http");
        if !forwarded_proto.eq_ignore_ascii_case("https") {
            let path_and_query = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            let target = format!("https://{}{}", host, path_and_query);
            return (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, target)]).into_response();
        }
    }

    next.run(request).await
}

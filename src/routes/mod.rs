// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod bookings;
pub mod jwt;
pub mod menus;
pub mod users;

use crate::error::{AppError, Result};
use crate::middleware::{authenticate, hosts::enforce_host, throttle::throttle};
use crate::AppState;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Request, State};
use axum::http::{header, request::Parts, HeaderMap, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Message for missing required fields.
pub(crate) const REQUIRED: &str = "This field is required.";

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>> {
    state
        .store
        .ping()
        .await
        .map_err(|e| AppError::Unavailable(e.to_string()))?;

    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    }))
}

/// Links to the resource collections.
#[derive(Serialize)]
pub struct ApiRootResponse {
    pub menus: String,
    pub bookings: String,
}

/// Base URL of the request as seen by the client.
fn base_url(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("http");
    format!("{}://{}", scheme, host)
}

async fn api_root(headers: HeaderMap) -> Json<ApiRootResponse> {
    let base = base_url(&headers);
    Json(ApiRootResponse {
        menus: format!("{}/menus/", base),
        bookings: format!("{}/bookings/", base),
    })
}

async fn not_found() -> AppError {
    AppError::NotFound("No route matches the requested path".to_string())
}

/// JSON body extractor that reports malformed bodies as `400 bad_request`.
///
/// An empty body without a `Content-Type` is read as `{}`, so missing
/// fields get field errors.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        if !req.headers().contains_key(header::CONTENT_TYPE) {
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
            if !bytes.iter().all(u8::is_ascii_whitespace) {
                return Err(AppError::BadRequest(
                    "Expected request with `Content-Type: application/json`".to_string(),
                ));
            }
            // A missing body reads as an empty object.
            return serde_json::from_slice(b"{}")
                .map(JsonBody)
                .map_err(|e| AppError::BadRequest(e.to_string()));
        }

        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

/// Optional integer field that accepts a JSON number or a numeric string.
///
/// Use with `#[serde(default, deserialize_with = "int_or_string")]`.
pub(crate) fn int_or_string<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: std::str::FromStr + TryFrom<i64>,
{
    use serde::de::Error;
    use serde_json::Value;

    let invalid = || D::Error::custom("A valid integer is required.");
    match <Option<Value> as serde::Deserialize>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|n| T::try_from(n).ok())
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

/// Path extractor that reports unparseable segments as `404 not_found`.
///
/// `/menus/abc/` names no resource, the same as an id that doesn't exist.
pub struct PathParam<T>(pub T);

impl<S, T> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(PathParam(value)),
            Err(rejection) => {
                let path = parts.uri.path();
                tracing::debug!(path = %path, error = %rejection.body_text(), "Bad path parameter");
                Err(AppError::NotFound(format!("No resource matches {}", path)))
            }
        }
    }
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from the trusted origins
    let trusted_origins = state.config.trusted_origins.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                trusted_origins.iter().any(|trusted| {
                    origin_str == trusted
                        || origin_str
                            .strip_prefix(trusted.as_str())
                            .is_some_and(|rest| rest.starts_with(':'))
                })
            },
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // API routes: optional JWT authentication, then throttling
    let api_routes = Router::new()
        .route("/", get(api_root))
        .merge(menus::routes())
        .merge(bookings::routes())
        .merge(users::routes())
        .merge(jwt::routes())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), throttle))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .route("/health", get(health_check))
        .merge(api_routes)
        .layer(middleware::from_fn_with_state(state.clone(), enforce_host))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

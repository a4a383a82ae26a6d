// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use littlelemon::config::Config;
use littlelemon::db::MemoryStore;
use littlelemon::models::User;
use littlelemon::routes::create_router;
use littlelemon::services::{accounts, TokenType};
use littlelemon::AppState;
use serde_json::Value;
use std::sync::Arc;

/// Password accepted by the password rules.
#[allow(dead_code)]
pub const PASSWORD: &str = "Lemon&Olive7";

/// Check if a MySQL test database is configured.
#[allow(dead_code)]
pub fn mysql_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

/// Skip test with message if no MySQL test database is configured.
#[macro_export]
macro_rules! require_mysql {
    () => {
        match crate::common::mysql_url() {
            Some(url) => url,
            None => {
                eprintln!("⚠️  Skipping: TEST_DATABASE_URL not set");
                return;
            }
        }
    };
}

/// Create a test app backed by the memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Config::test_default())
}

/// Create a test app with a custom configuration.
#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, Arc::new(MemoryStore::new())));
    (create_router(state.clone()), state)
}

/// Create an account directly through the account service.
#[allow(dead_code)]
pub async fn create_user(state: &AppState, username: &str, is_superuser: bool) -> User {
    accounts::create_account(
        state.store.as_ref(),
        username,
        &format!("{}@littlelemon.com", username),
        PASSWORD,
        is_superuser,
        state.config.password_iterations,
    )
    .await
    .expect("Failed to create test user")
}

/// Access token for `user_id`.
#[allow(dead_code)]
pub fn access_token(state: &AppState, user_id: u64) -> String {
    state
        .tokens
        .issue(user_id, TokenType::Access)
        .expect("Failed to issue token")
}

/// Build a request for an allowed host, with optional bearer token and
/// JSON body.
#[allow(dead_code)]
pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, "localhost");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

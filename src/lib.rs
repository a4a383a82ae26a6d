// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Little Lemon: restaurant menu and table booking API
//!
//! This crate provides the JSON backend for browsing the menu, managing
//! accounts with JWT authentication, and reserving tables by date and
//! hourly slot.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Store;
use services::{Throttle, TokenService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    /// Per-IP limits for anonymous callers
    pub anon_throttle: Throttle,
    /// Per-user limits for authenticated callers
    pub user_throttle: Throttle,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        let tokens = TokenService::new(
            &config.secret_key,
            config.access_token_lifetime_secs,
            config.refresh_token_lifetime_secs,
        );
        Self {
            anon_throttle: Throttle::new(config.anon_rate),
            user_throttle: Throttle::new(config.user_rate),
            tokens,
            store,
            config,
        }
    }
}

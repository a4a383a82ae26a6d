// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, throttling, security, etc.).

pub mod auth;
pub mod hosts;
pub mod security;
pub mod throttle;

pub use auth::{authenticate, AuthUser, Superuser};

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod passwords;
pub mod throttle;
pub mod tokens;

pub use throttle::{Rate, Throttle};
pub use tokens::{Claims, TokenPair, TokenService, TokenType};

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing and validation.
//!
//! Hashes use PBKDF2-HMAC-SHA256 and the
//! `pbkdf2_sha256$<iterations>$<salt>$<base64 hash>` encoding, so accounts
//! carried over from the previous deployment keep working.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;

const ALGORITHM_NAME: &str = "pbkdf2_sha256";
pub const DEFAULT_ITERATIONS: u32 = 600_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const MIN_PASSWORD_LEN: usize = 8;

const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "password123", "12345678", "123456789", "1234567890",
    "qwerty123", "qwertyuiop", "iloveyou", "sunshine", "princess", "football",
    "baseball", "welcome1", "letmein1", "admin123", "abc12345", "trustno1",
    "passw0rd", "superman", "starwars", "whatever", "littlelemon",
];

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> anyhow::Result<String> {
    let iterations = NonZeroU32::new(iterations)
        .ok_or_else(|| anyhow::anyhow!("iteration count must be non-zero"))?;

    let mut salt_bytes = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt_bytes)
        .map_err(|_| anyhow::anyhow!("failed to generate salt"))?;
    let salt = hex::encode(salt_bytes);

    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt.as_bytes(),
        password.as_bytes(),
        &mut hash,
    );

    Ok(format!(
        "{}${}${}${}",
        ALGORITHM_NAME,
        iterations,
        salt,
        BASE64.encode(hash)
    ))
}

/// Check `password` against an encoded hash. Malformed hashes never match.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.splitn(4, '$');
    let (Some(algorithm), Some(iterations), Some(salt), Some(hash)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if algorithm != ALGORITHM_NAME {
        return false;
    }
    let Some(iterations) = iterations.parse::<u32>().ok().and_then(NonZeroU32::new) else {
        return false;
    };
    let Ok(expected) = BASE64.decode(hash) else {
        return false;
    };

    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt.as_bytes(),
        password.as_bytes(),
        &expected,
    )
    .is_ok()
}

/// A well-formed hash that no password matches.
///
/// Checking a password against it costs the same as checking a real hash
/// at `iterations`, so logins for unknown usernames take as long as logins
/// with a wrong password.
pub fn dummy_hash(iterations: u32) -> String {
    format!(
        "{}${}${}${}",
        ALGORITHM_NAME,
        iterations,
        "0".repeat(SALT_LEN * 2),
        BASE64.encode([0u8; HASH_LEN])
    )
}

/// Hash on the blocking pool; PBKDF2 at production cost takes a while.
pub async fn hash_password_blocking(password: String, iterations: u32) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password, iterations)).await?
}

/// Verify on the blocking pool.
pub async fn verify_password_blocking(password: String, encoded: String) -> bool {
    tokio::task::spawn_blocking(move || verify_password(&password, &encoded))
        .await
        .unwrap_or(false)
}

/// Check password strength. Returns every failed rule.
pub fn validate_password(password: &str, username: &str) -> Result<(), Vec<String>> {
    let mut problems = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LEN {
        problems.push(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LEN
        ));
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }
    if !username.is_empty() && password.eq_ignore_ascii_case(username) {
        problems.push("The password is too similar to the username.".to_string());
    }
    if COMMON_PASSWORDS.contains(&password.to_ascii_lowercase().as_str()) {
        problems.push("This password is too common.".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

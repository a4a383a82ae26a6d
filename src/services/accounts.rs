// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account creation shared by registration and startup bootstrap.

use crate::config::SuperuserConfig;
use crate::db::Store;
use crate::error::{AppError, FieldErrors, Result};
use crate::models::user::is_valid_username;
use crate::models::{NewUser, User};
use crate::services::passwords;

/// Validate and create an account.
///
/// All field problems are collected into one validation error.
pub async fn create_account(
    store: &dyn Store,
    username: &str,
    email: &str,
    password: &str,
    is_superuser: bool,
    iterations: u32,
) -> Result<User> {
    let mut fields = FieldErrors::new();

    if !is_valid_username(username) {
        fields.insert(
            "username".to_string(),
            vec![
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                    .to_string(),
            ],
        );
    }
    if let Err(problems) = passwords::validate_password(password, username) {
        fields.insert("password".to_string(), problems);
    }
    if !fields.is_empty() {
        return Err(AppError::Validation(fields));
    }

    if store.get_user_by_username(username).await?.is_some() {
        return Err(AppError::field(
            "username",
            "A user with that username already exists.",
        ));
    }

    let password_hash = passwords::hash_password_blocking(password.to_string(), iterations).await?;

    let user = store
        .create_user(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            is_superuser,
        })
        .await?;

    tracing::info!(user_id = user.id, is_superuser, "Account created");
    Ok(user)
}

/// Create the configured superuser if it does not exist yet.
///
/// Returns `true` when an account was created.
pub async fn ensure_superuser(
    store: &dyn Store,
    superuser: &SuperuserConfig,
    iterations: u32,
) -> Result<bool> {
    if store
        .get_user_by_username(&superuser.username)
        .await?
        .is_some()
    {
        tracing::debug!(username = %superuser.username, "Superuser already present");
        return Ok(false);
    }

    create_account(
        store,
        &superuser.username,
        &superuser.email,
        &superuser.password,
        true,
        iterations,
    )
    .await?;
    tracing::info!(username = %superuser.username, "Bootstrapped superuser");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[tokio::test]
    async fn test_create_account_validates() {
        let store = MemoryStore::new();

        let err = create_account(&store, "bad name", "", "short", false, 1_000)
            .await
            .unwrap_err();
        match err {
            AppError::Validation(fields) => {
                assert!(fields.contains_key("username"));
                assert!(fields.contains_key("password"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let user = create_account(&store, "mario", "m@example.com", "Lemon&Olive7", false, 1_000)
            .await
            .unwrap();
        assert!(!user.is_superuser);
        assert!(passwords::verify_password("Lemon&Olive7", &user.password_hash));

        let dup = create_account(&store, "mario", "", "Lemon&Olive7", false, 1_000)
            .await
            .unwrap_err();
        assert!(matches!(dup, AppError::Validation(f) if f.contains_key("username")));
    }

    #[tokio::test]
    async fn test_ensure_superuser_is_idempotent() {
        let store = MemoryStore::new();
        let config = SuperuserConfig {
            username: "admin".to_string(),
            password: "Chef-Adrian-2026".to_string(),
            email: "admin@littlelemon.com".to_string(),
        };

        assert!(ensure_superuser(&store, &config, 1_000).await.unwrap());
        assert!(!ensure_superuser(&store, &config, 1_000).await.unwrap());

        let admin = store.get_user_by_username("admin").await.unwrap().unwrap();
        assert!(admin.is_superuser);
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account endpoint tests under `/auth/users/`.

use axum::http::{Method, StatusCode};
use littlelemon::services::passwords;
use serde_json::json;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_register() {
    let (app, state) = common::create_test_app();

    let response = app
        .oneshot(common::request(
            Method::POST,
            "/auth/users/",
            None,
            Some(json!({
                "username": "tilly",
                "email": "  tilly@littlelemon.com ",
                "password": common::PASSWORD,
                "re_password": common::PASSWORD,
            })),
        ))
        .await
        .unwrap();

    // Surrounding whitespace is dropped, as on profile updates
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::body_json(response).await;
    assert_eq!(body["username"], "tilly");
    assert_eq!(body["email"], "tilly@littlelemon.com");
    assert!(body.get("password_hash").is_none());

    let stored = state
        .store
        .get_user_by_username("tilly")
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_superuser);
    assert!(stored.password_hash.starts_with("pbkdf2_sha256$"));
    assert_eq!(stored.email, "tilly@littlelemon.com");
}

#[tokio::test]
async fn test_register_validation() {
    let (app, state) = common::create_test_app();
    common::create_user(&state, "taken", false).await;

    let cases = [
        (
            json!({"username": "tilly", "password": common::PASSWORD, "re_password": "Other&Pass9"}),
            "non_field_errors",
        ),
        (
            json!({"username": "tilly", "password": "12345678", "re_password": "12345678"}),
            "password",
        ),
        (
            json!({"username": "taken", "password": common::PASSWORD, "re_password": common::PASSWORD}),
            "username",
        ),
        (
            json!({"username": "tilly", "email": "nope", "password": common::PASSWORD, "re_password": common::PASSWORD}),
            "email",
        ),
        (json!({"username": "tilly"}), "password"),
    ];

    for (body, field) in cases {
        let response = app
            .clone()
            .oneshot(common::request(Method::POST, "/auth/users/", None, Some(body.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        let json = common::body_json(response).await;
        assert!(json["fields"][field].is_array(), "{body} -> {json}");
    }
}

#[tokio::test]
async fn test_me_and_update_email() {
    let (app, state) = common::create_test_app();
    let user = common::create_user(&state, "tilly", false).await;
    let token = common::access_token(&state, user.id);

    let response = app
        .clone()
        .oneshot(common::request(Method::GET, "/auth/users/me/", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["username"], "tilly");

    let response = app
        .clone()
        .oneshot(common::request(
            Method::PATCH,
            "/auth/users/me/",
            Some(&token),
            Some(json!({"email": "new@littlelemon.com"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["email"], "new@littlelemon.com");

    let response = app
        .oneshot(common::request(Method::GET, "/auth/users/me/", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_list_visibility() {
    let (app, state) = common::create_test_app();
    let ana = common::create_user(&state, "ana", false).await;
    let admin = common::create_user(&state, "admin", true).await;

    let response = app
        .clone()
        .oneshot(common::request(
            Method::GET,
            "/auth/users/",
            Some(&common::access_token(&state, ana.id)),
            None,
        ))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["username"], "ana");

    let response = app
        .clone()
        .oneshot(common::request(
            Method::GET,
            "/auth/users/",
            Some(&common::access_token(&state, admin.id)),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(common::body_json(response).await.as_array().unwrap().len(), 2);

    // Profiles by username: self or superuser only
    let response = app
        .clone()
        .oneshot(common::request(
            Method::GET,
            "/auth/users/admin/",
            Some(&common::access_token(&state, ana.id)),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(common::request(
            Method::GET,
            "/auth/users/ana/",
            Some(&common::access_token(&state, admin.id)),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["id"], ana.id);
}

#[tokio::test]
async fn test_set_password() {
    let (app, state) = common::create_test_app();
    let user = common::create_user(&state, "tilly", false).await;
    let token = common::access_token(&state, user.id);

    let response = app
        .clone()
        .oneshot(common::request(
            Method::POST,
            "/auth/users/set_password/",
            Some(&token),
            Some(json!({"current_password": "wrong-Password1", "new_password": "Fresh&Basil42"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        common::body_json(response).await["fields"]["current_password"][0],
        "Invalid password."
    );

    let response = app
        .oneshot(common::request(
            Method::POST,
            "/auth/users/set_password/",
            Some(&token),
            Some(json!({"current_password": common::PASSWORD, "new_password": "Fresh&Basil42"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let stored = state.store.get_user(user.id).await.unwrap().unwrap();
    assert!(passwords::verify_password("Fresh&Basil42", &stored.password_hash));
    assert!(!passwords::verify_password(common::PASSWORD, &stored.password_hash));
}

#[tokio::test]
async fn test_set_username() {
    let (app, state) = common::create_test_app();
    let user = common::create_user(&state, "tilly", false).await;
    common::create_user(&state, "taken", false).await;
    let token = common::access_token(&state, user.id);

    let response = app
        .clone()
        .oneshot(common::request(
            Method::POST,
            "/auth/users/set_username/",
            Some(&token),
            Some(json!({"current_password": common::PASSWORD, "new_username": "taken"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(common::request(
            Method::POST,
            "/auth/users/set_username/",
            Some(&token),
            Some(json!({"current_password": common::PASSWORD, "new_username": "matilda"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let stored = state.store.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.username, "matilda");
}

#[tokio::test]
async fn test_delete_me_without_body() {
    let (app, state) = common::create_test_app();
    let user = common::create_user(&state, "tilly", false).await;
    let token = common::access_token(&state, user.id);

    let response = app
        .oneshot(common::request(Method::DELETE, "/auth/users/me/", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["fields"]["current_password"], json!(["This field is required."]));
    assert!(state.store.get_user(user.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_me_requires_password() {
    let (app, state) = common::create_test_app();
    let user = common::create_user(&state, "tilly", false).await;
    let token = common::access_token(&state, user.id);

    let response = app
        .clone()
        .oneshot(common::request(
            Method::DELETE,
            "/auth/users/me/",
            Some(&token),
            Some(json!({"current_password": "not-my-Password1"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.store.get_user(user.id).await.unwrap().is_some());

    let response = app
        .clone()
        .oneshot(common::request(
            Method::DELETE,
            "/auth/users/me/",
            Some(&token),
            Some(json!({"current_password": common::PASSWORD})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(state.store.get_user(user.id).await.unwrap().is_none());

    // The token no longer maps to an account
    let response = app
        .oneshot(common::request(Method::GET, "/auth/users/me/", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

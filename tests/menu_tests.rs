// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Menu endpoint tests: public reads, superuser-only writes.

use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_menu_list_is_public() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(common::request(Method::GET, "/menus/", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_superuser_manages_menu() {
    let (app, state) = common::create_test_app();
    let admin = common::create_user(&state, "admin", true).await;
    let token = common::access_token(&state, admin.id);

    // Create
    let response = app
        .clone()
        .oneshot(common::request(
            Method::POST,
            "/menus/",
            Some(&token),
            Some(json!({"title": "Greek Salad", "price": "12.50", "inventory": 10})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = common::body_json(response).await;
    assert_eq!(created["title"], "Greek Salad");
    assert_eq!(created["price"], "12.50");
    assert_eq!(created["inventory"], 10);
    let id = created["id"].as_u64().unwrap();

    // Patch only the price
    let response = app
        .clone()
        .oneshot(common::request(
            Method::PATCH,
            &format!("/menus/{}/", id),
            Some(&token),
            Some(json!({"price": 11})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let patched = common::body_json(response).await;
    assert_eq!(patched["price"], "11.00");
    assert_eq!(patched["title"], "Greek Salad");

    // Anyone can read it back
    let response = app
        .clone()
        .oneshot(common::request(Method::GET, &format!("/menus/{}/", id), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["price"], "11.00");

    // Delete
    let response = app
        .clone()
        .oneshot(common::request(
            Method::DELETE,
            &format!("/menus/{}/", id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(common::request(Method::GET, &format!("/menus/{}/", id), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_menu_write_permissions() {
    let (app, state) = common::create_test_app();
    let user = common::create_user(&state, "tilly", false).await;
    let token = common::access_token(&state, user.id);
    let body = json!({"title": "Bruschetta", "price": "7.99", "inventory": 3});

    let response = app
        .clone()
        .oneshot(common::request(Method::POST, "/menus/", None, Some(body.clone())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(common::body_json(response).await["error"], "unauthorized");

    let response = app
        .oneshot(common::request(Method::POST, "/menus/", Some(&token), Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(common::body_json(response).await["error"], "forbidden");
}

#[tokio::test]
async fn test_put_requires_all_fields() {
    let (app, state) = common::create_test_app();
    let admin = common::create_user(&state, "admin", true).await;
    let token = common::access_token(&state, admin.id);
    let item = state
        .store
        .create_menu_item(littlelemon::models::NewMenuItem {
            title: "Lemon Dessert".to_string(),
            price: littlelemon::models::Price::from_cents(699),
            inventory: 5,
        })
        .await
        .unwrap();

    let response = app
        .oneshot(common::request(
            Method::PUT,
            &format!("/menus/{}/", item.id),
            Some(&token),
            Some(json!({"title": "Lemon Cake"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["fields"]["price"][0], "This field is required.");
    assert_eq!(body["fields"]["inventory"][0], "This field is required.");
}

#[tokio::test]
async fn test_invalid_price_rejected() {
    let (app, state) = common::create_test_app();
    let admin = common::create_user(&state, "admin", true).await;
    let token = common::access_token(&state, admin.id);

    for price in [json!("-1.00"), json!("3.999"), json!("abc"), json!("123456789.00")] {
        let response = app
            .clone()
            .oneshot(common::request(
                Method::POST,
                "/menus/",
                Some(&token),
                Some(json!({"title": "Pasta", "price": price, "inventory": 1})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "price {price}");
        let body = common::body_json(response).await;
        assert!(body["fields"]["price"].is_array(), "price {price}");
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, state) = common::create_test_app();
    let admin = common::create_user(&state, "admin", true).await;
    let token = common::access_token(&state, admin.id);

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/menus/")
        .header("host", "localhost")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(common::body_json(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_non_numeric_id_is_not_found() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(common::request(Method::GET, "/menus/abc/", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers()["content-type"],
        "application/json"
    );
    assert_eq!(common::body_json(response).await["error"], "not_found");
}

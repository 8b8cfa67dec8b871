//! HTTP-level tests for friend requests, categories, devices and the
//! current user.

mod common;

use axum::http::StatusCode;
use common::{befriend, body_json, build_test_app, delete, eventually, get, post_json, put_json, user};
use evently_core::realtime::{ChangeAction, RealtimeContext};
use evently_core::types::NO_ENTITY_ID;
use evently_db::repositories::{DeviceRepo, FriendRepo};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Friend requests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn friend_request_round_trip(pool: PgPool) {
    let alice = user(&pool, "alice").await;
    let bob = user(&pool, "bob").await;
    let app = build_test_app(pool.clone());

    let response = post_json(
        app.router.clone(),
        "/api/v1/friend-requests",
        alice.id,
        json!({"username": "bob"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let request_id = body_json(response).await["id"].as_i64().unwrap();

    eventually(|| !app.sessions.for_user(bob.id).is_empty()).await;
    let signal = &app.sessions.for_user(bob.id)[0];
    assert_eq!(signal.context, RealtimeContext::FriendRequest);
    assert_eq!(signal.id, NO_ENTITY_ID);

    let received = body_json(get(app.router.clone(), "/api/v1/friend-requests", bob.id).await).await;
    assert_eq!(received[0]["sender_username"], "alice");

    let response = put_json(
        app.router.clone(),
        &format!("/api/v1/friend-requests/{request_id}"),
        bob.id,
        json!({"accept": true}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(FriendRepo::are_friends(&pool, alice.id, bob.id).await.unwrap());

    eventually(|| {
        app.sessions
            .for_user(alice.id)
            .iter()
            .any(|m| m.context == RealtimeContext::Friend)
    })
    .await;

    let friends = body_json(get(app.router, "/api/v1/users/me/friends", alice.id).await).await;
    assert_eq!(friends[0]["username"], "bob");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_and_self_requests_are_rejected(pool: PgPool) {
    let alice = user(&pool, "alice").await;
    user(&pool, "bob").await;
    let app = build_test_app(pool);

    let response = post_json(
        app.router.clone(),
        "/api/v1/friend-requests",
        alice.id,
        json!({"username": "alice"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        app.router.clone(),
        "/api/v1/friend-requests",
        alice.id,
        json!({"username": "bob"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(
        app.router.clone(),
        "/api/v1/friend-requests",
        alice.id,
        json!({"username": "bob"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_json(
        app.router,
        "/api/v1/friend-requests",
        alice.id,
        json!({"username": "nobody"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn removing_a_friend_signals_both_sides(pool: PgPool) {
    let alice = user(&pool, "alice").await;
    let bob = user(&pool, "bob").await;
    befriend(&pool, alice.id, bob.id).await;
    let app = build_test_app(pool.clone());

    let response = delete(app.router.clone(), "/api/v1/friends/bob", alice.id).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!FriendRepo::are_friends(&pool, alice.id, bob.id).await.unwrap());

    eventually(|| app.sessions.total() == 2).await;
    for id in [alice.id, bob.id] {
        let signals = app.sessions.for_user(id);
        assert_eq!(signals[0].context, RealtimeContext::Friend);
        assert_eq!(signals[0].action, Some(ChangeAction::Delete));
    }

    let response = delete(app.router, "/api/v1/friends/bob", alice.id).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn categories_are_private_to_their_owner(pool: PgPool) {
    let alice = user(&pool, "alice").await;
    let bob = user(&pool, "bob").await;
    let app = build_test_app(pool);

    let response = post_json(
        app.router.clone(),
        "/api/v1/categories",
        alice.id,
        json!({"name": "Sport", "icon": "ball", "color": "#00ff00"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["id"].as_i64().unwrap();

    let response = put_json(
        app.router.clone(),
        &format!("/api/v1/categories/{id}"),
        bob.id,
        json!({"name": "Stolen"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete(app.router.clone(), &format!("/api/v1/categories/{id}"), alice.id).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let defaults = body_json(get(app.router, "/api/v1/categories/default", bob.id).await).await;
    assert!(!defaults.as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn category_without_color_returns_422(pool: PgPool) {
    let alice = user(&pool, "alice").await;
    let app = build_test_app(pool);

    let response = post_json(
        app.router,
        "/api/v1/categories",
        alice.id,
        json!({"name": "Sport", "icon": "ball"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await["error"]
        .as_str()
        .unwrap()
        .contains("color"));
}

// ---------------------------------------------------------------------------
// Devices and account
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn subscribing_replaces_the_previous_apple_device(pool: PgPool) {
    let alice = user(&pool, "alice").await;
    let app = build_test_app(pool.clone());

    for token in ["first-token", "second-token"] {
        let response = post_json(
            app.router.clone(),
            "/api/v1/notifications/subscribe/ios",
            alice.id,
            json!({"device_token": token}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let devices = DeviceRepo::list_for_user(&pool, alice.id).await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].token, "second-token");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleted_users_are_gone(pool: PgPool) {
    let alice = user(&pool, "alice").await;
    let app = build_test_app(pool);

    let me = body_json(get(app.router.clone(), "/api/v1/users/me", alice.id).await).await;
    assert_eq!(me["username"], "alice");

    let response = delete(app.router.clone(), "/api/v1/users/me", alice.id).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(app.router, "/api/v1/users/me", alice.id).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

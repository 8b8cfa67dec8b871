//! Router, recording sinks and request helpers shared by the API tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use evently_api::auth::jwt::{generate_access_token, JwtConfig};
use evently_api::config::ServerConfig;
use evently_api::router::build_app_router;
use evently_api::state::AppState;
use evently_api::ws::WsManager;
use evently_core::push::PushMessage;
use evently_core::realtime::RealtimeMessage;
use evently_core::types::DbId;
use evently_db::models::user::{CreateUser, User};
use evently_db::repositories::{FriendRequestRepo, UserRepo};
use evently_events::{ChangeTriggers, NotificationDispatcher, PushError, PushSink, RealtimeSink};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        recurrence_interval_secs: 60,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

// ---------------------------------------------------------------------------
// Recording sinks
// ---------------------------------------------------------------------------

/// Every realtime delivery, one entry per user.
#[derive(Default)]
pub struct RecordedSessions {
    pub deliveries: Mutex<Vec<(DbId, RealtimeMessage)>>,
}

impl RecordedSessions {
    pub fn for_user(&self, user_id: DbId) -> Vec<RealtimeMessage> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == user_id)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }
}

#[async_trait]
impl RealtimeSink for RecordedSessions {
    async fn notify(&self, user_ids: &[DbId], message: &RealtimeMessage) -> usize {
        let mut deliveries = self.deliveries.lock().unwrap();
        for id in user_ids {
            deliveries.push((*id, message.clone()));
        }
        user_ids.len()
    }
}

#[derive(Default)]
pub struct RecordedPushes {
    pub sent: Mutex<Vec<PushMessage>>,
}

impl RecordedPushes {
    pub fn total(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl PushSink for RecordedPushes {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub sessions: Arc<RecordedSessions>,
    pub pushes: Arc<RecordedPushes>,
}

/// Build the full application router over `pool`, with the same middleware
/// stack as `main.rs` and recording notification sinks.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let config = test_config();
    let sessions = Arc::new(RecordedSessions::default());
    let pushes = Arc::new(RecordedPushes::default());
    let dispatcher = NotificationDispatcher::new(sessions.clone(), pushes.clone());

    let state = AppState {
        triggers: ChangeTriggers::new(pool.clone(), dispatcher),
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::new(WsManager::new()),
    };

    TestApp {
        router: build_app_router(state.clone(), &config),
        state,
        sessions,
        pushes,
    }
}

/// Poll until `done` holds. Dispatch runs on spawned tasks, so signals land
/// shortly after the response.
pub async fn eventually(done: impl Fn() -> bool) {
    for _ in 0..100 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within one second");
}

/// Give stray background deliveries time to land before asserting absence.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn user(pool: &PgPool, username: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            first_name: None,
            last_name: None,
            email: None,
        },
    )
    .await
    .expect("create user")
}

pub async fn befriend(pool: &PgPool, a: DbId, b: DbId) {
    let request = FriendRequestRepo::create(pool, a, b).await.expect("request");
    FriendRequestRepo::accept(pool, &request)
        .await
        .expect("accept");
}

pub fn token_for(user_id: DbId) -> String {
    generate_access_token(user_id, &test_config().jwt).expect("token")
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    user_id: DbId,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(user_id)));
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str, user_id: DbId) -> Response<Body> {
    send(app, Method::GET, uri, user_id, None).await
}

pub async fn post_json(
    app: Router,
    uri: &str,
    user_id: DbId,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, user_id, Some(body)).await
}

pub async fn post_empty(app: Router, uri: &str, user_id: DbId) -> Response<Body> {
    send(app, Method::POST, uri, user_id, None).await
}

pub async fn put_json(
    app: Router,
    uri: &str,
    user_id: DbId,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PUT, uri, user_id, Some(body)).await
}

pub async fn delete(app: Router, uri: &str, user_id: DbId) -> Response<Body> {
    send(app, Method::DELETE, uri, user_id, None).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

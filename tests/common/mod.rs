#![allow(dead_code)]

use std::{sync::Arc, time::SystemTime};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use catalog_api::{
    AppConfig, AppState, InMemoryRepository, auth::Claims, create_router, models::User,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
pub const ADMIN_ID: Uuid = Uuid::from_u128(1);
pub const USER_ID: Uuid = Uuid::from_u128(2);
/// Has valid tokens but no `profiles` row.
pub const UNPROVISIONED_ID: Uuid = Uuid::from_u128(3);
/// Provisioned with a role outside the closed set.
pub const ROGUE_ID: Uuid = Uuid::from_u128(4);

fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Signs a token for `user_id` expiring `exp_offset` seconds from now (negative = already expired).
pub fn create_token_with_secret(user_id: Uuid, exp_offset: i64, secret: &str) -> String {
    let now = now();
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: (now as i64 + exp_offset) as u64,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn create_token(user_id: Uuid, exp_offset: i64) -> String {
    create_token_with_secret(user_id, exp_offset, TEST_JWT_SECRET)
}

pub fn admin_token() -> String {
    create_token(ADMIN_ID, 3600)
}

pub fn user_token() -> String {
    create_token(USER_ID, 3600)
}

pub fn seeded_repo() -> InMemoryRepository {
    InMemoryRepository::new()
        .with_user(User {
            id: ADMIN_ID,
            email: "admin@example.com".to_string(),
            role: "admin".to_string(),
        })
        .with_user(User {
            id: USER_ID,
            email: "user@example.com".to_string(),
            role: "user".to_string(),
        })
        .with_user(User {
            id: ROGUE_ID,
            email: "rogue@example.com".to_string(),
            role: "superuser".to_string(),
        })
}

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    }
}

pub fn app_state(repo: Arc<InMemoryRepository>) -> AppState {
    AppState::new(test_config(), repo)
}

/// Router over a fresh seeded repository. The repository handle is returned
/// so tests can inject storage failures.
pub fn test_app() -> (Router, Arc<InMemoryRepository>) {
    let repo = Arc::new(seeded_repo());
    (create_router(app_state(repo.clone())), repo)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

#![allow(dead_code)]

use atelier_backend::{config::Config, routes, AppState};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test_secret_key";

pub fn test_config(public_rps: u32, api_rps: u32) -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url: None,
        database_max_connections: 1,
        jwt_secret: JWT_SECRET.into(),
        public_rps,
        api_rps,
        cors_allowed_origins: Vec::new(),
        recommendation_limit: 10,
    }
}

pub fn app() -> Router {
    app_with(test_config(1000, 1000))
}

pub fn app_with(config: Config) -> Router {
    routes::router(AppState::in_memory(&config), &config)
}

#[derive(Serialize)]
struct Claims {
    sub: String,
    exp: usize,
    role: Option<String>,
}

pub fn token_for(user: Uuid) -> String {
    encode(
        &Header::default(),
        &Claims {
            sub: user.to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            role: None,
        },
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Sends one request through the router and returns the status with the
/// decoded JSON body (`Null` when the body is empty).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<Uuid>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("authorization", format!("Bearer {}", token_for(user)));
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };
    (status, json)
}

pub fn dec(value: &JsonValue) -> Decimal {
    match value {
        JsonValue::String(s) => s.parse().unwrap(),
        JsonValue::Number(n) => n.to_string().parse().unwrap(),
        other => panic!("not a decimal: {}", other),
    }
}

pub fn id(value: &JsonValue) -> Uuid {
    value.as_str().unwrap().parse().unwrap()
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::middleware::auth::AuthUser;

const WINDOW: Duration = Duration::from_secs(1);
/// Stale windows are swept once the table grows past this many callers.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug)]
struct WindowState {
    start: Instant,
    count: u32,
}

/// Fixed one-second windows per caller. Authenticated callers are keyed by
/// user id and get the API budget; anonymous traffic shares one window with
/// the public budget.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    public_rps: u32,
    api_rps: u32,
    windows: Arc<Mutex<HashMap<String, WindowState>>>,
}

impl RateLimiter {
    pub fn new(public_rps: u32, api_rps: u32) -> Self {
        Self {
            public_rps: public_rps.max(1),
            api_rps: api_rps.max(1),
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn allow(&self, key: &str, limit: u32, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, w| now.duration_since(w.start) < WINDOW);
        }
        let window = windows.entry(key.to_string()).or_insert(WindowState {
            start: now,
            count: 0,
        });
        if now.duration_since(window.start) >= WINDOW {
            window.start = now;
            window.count = 0;
        }
        if window.count < limit {
            window.count += 1;
            true
        } else {
            false
        }
    }
}

pub async fn rps_middleware(
    State(state): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (key, limit) = match req.extensions().get::<AuthUser>() {
        Some(user) => (user.id.to_string(), state.api_rps),
        None => ("anonymous".to_string(), state.public_rps),
    };
    if !state.allow(&key, limit, Instant::now()) {
        tracing::warn!(caller = %key, "Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "rate_limit_exceeded" })),
        )
            .into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callers_have_independent_windows() {
        let limiter = RateLimiter::new(1, 2);
        let start = Instant::now();

        assert!(limiter.allow("alice", 2, start));
        assert!(limiter.allow("alice", 2, start));
        assert!(!limiter.allow("alice", 2, start));
        assert!(limiter.allow("bob", 2, start));

        assert!(limiter.allow("alice", 2, start + WINDOW));
    }
}

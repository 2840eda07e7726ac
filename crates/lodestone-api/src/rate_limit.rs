//! Per-IP sliding-window rate limiter (spec §6: 90 requests per 60
//! seconds; `X-RateLimit-{Limit,Remaining,Reset}` headers; 429 with
//! `{error, retryAfter}`). Process-local, read-mostly-per-key state in a
//! `DashMap` — same "shared cache, no external coordination" posture as
//! the price-graph cache (spec §5).

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use dashmap::DashMap;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(60);
const LIMIT: u32 = 90;

#[derive(Default)]
struct Window {
    /// Request instants within the last [`WINDOW`], oldest first.
    hits: Vec<Instant>,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    windows: Arc<DashMap<String, Window>>,
}

struct Decision {
    allowed: bool,
    remaining: u32,
    reset_after: Duration,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self, key: &str) -> Decision {
        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_string()).or_default();
        entry.hits.retain(|&t| now.duration_since(t) < WINDOW);

        let reset_after = entry
            .hits
            .first()
            .map(|&oldest| WINDOW.saturating_sub(now.duration_since(oldest)))
            .unwrap_or(WINDOW);

        if entry.hits.len() as u32 >= LIMIT {
            return Decision {
                allowed: false,
                remaining: 0,
                reset_after,
            };
        }

        entry.hits.push(now);
        Decision {
            allowed: true,
            remaining: LIMIT - entry.hits.len() as u32,
            reset_after,
        }
    }
}

#[derive(Serialize)]
struct RateLimitBody {
    error: &'static str,
    #[serde(rename = "retryAfter")]
    retry_after: u64,
}

pub async fn enforce(
    State(limiter): State<RateLimiter>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let decision = limiter.check(&addr.ip().to_string());
    let reset_secs = decision.reset_after.as_secs();

    if !decision.allowed {
        let mut resp = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(RateLimitBody {
                error: "rate limit exceeded",
                retry_after: reset_secs,
            }),
        )
            .into_response();
        apply_headers(resp.headers_mut(), 0, reset_secs);
        return resp;
    }

    let mut resp = next.run(req).await;
    apply_headers(resp.headers_mut(), decision.remaining, reset_secs);
    resp
}

fn apply_headers(headers: &mut axum::http::HeaderMap, remaining: u32, reset_secs: u64) {
    headers.insert("X-RateLimit-Limit", HeaderValue::from_static("90"));
    if let Ok(v) = HeaderValue::from_str(&remaining.to_string()) {
        headers.insert("X-RateLimit-Remaining", v);
    }
    if let Ok(v) = HeaderValue::from_str(&reset_secs.to_string()) {
        headers.insert("X-RateLimit-Reset", v);
    }
}

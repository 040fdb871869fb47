//! Fixed-window request throttling.
//!
//! One counter per `(operation, client)` pair. The window starts on the
//! first request from a key and resets `window_secs` later; the check and
//! the increment happen as one step under the map's write lock, so two
//! concurrent requests can never both slip past the boundary. Expired
//! windows are also swept on a periodic pass to bound memory; lazy reset on
//! access keeps per-key state correct regardless.

use std::collections::HashMap;

use actix_web::HttpRequest;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::config::RateLimitPolicy;

#[derive(Debug)]
struct Window {
    count: u32,
    reset: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RateLimitDecision {
    Allowed {
        remaining: u32,
    },
    Limited {
        limit: u32,
        retry_after_secs: i64,
        reset: DateTime<Utc>,
    },
}

/// Constructed once at startup and shared through `AppState`; tests build
/// their own isolated instances.
#[derive(Default)]
pub struct RateLimiter {
    windows: RwLock<HashMap<(String, String), Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn check(
        &self,
        operation: &str,
        client: &str,
        policy: RateLimitPolicy,
    ) -> RateLimitDecision {
        let now = Utc::now();
        let window_len = Duration::seconds(policy.window_secs as i64);

        let mut windows = self.windows.write().await;
        let window = windows
            .entry((operation.to_string(), client.to_string()))
            .or_insert_with(|| Window {
                count: 0,
                reset: now + window_len,
            });

        if now > window.reset {
            window.count = 0;
            window.reset = now + window_len;
        }

        window.count += 1;

        if window.count > policy.limit {
            RateLimitDecision::Limited {
                limit: policy.limit,
                retry_after_secs: seconds_until(window.reset, now),
                reset: window.reset,
            }
        } else {
            RateLimitDecision::Allowed {
                remaining: policy.limit - window.count,
            }
        }
    }

    /// Drops windows whose reset time has passed. Optimization only.
    pub async fn sweep(&self) {
        let now = Utc::now();
        self.windows.write().await.retain(|_, w| w.reset > now);
    }

    #[cfg(test)]
    async fn window_count(&self) -> usize {
        self.windows.read().await.len()
    }
}

fn seconds_until(reset: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (reset - now).num_milliseconds().max(0);
    (ms + 999) / 1000
}

/// Client identity for throttling. Trusts the forwarded-address headers set
/// by the fronting proxy; a client talking to the process directly can spoof
/// them, which is accepted for these endpoints.
pub fn client_key(req: &HttpRequest) -> String {
    if let Some(forwarded) = header_value(req, "x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real_ip) = header_value(req, "x-real-ip") {
        return real_ip.to_string();
    }
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn header_value<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

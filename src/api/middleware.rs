//! Request middleware for the game API
//!
//! Layers, outermost first as mounted by `create_app`:
//! - Security headers
//! - Request logging with masked client addresses
//! - Fixed-window rate limiting per client
//! - Declared body size guard
//!
//! Rejections use the same `{"error": ...}` body as game errors. Player
//! credentials travel in query strings and bodies and are checked by the
//! game itself, so nothing here authenticates.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use serde_json::json;
use tracing::{error, info, warn};

const RATE_WINDOW: Duration = Duration::from_secs(60);

const SECURITY_HEADERS: [(&str, &str); 4] = [
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("referrer-policy", "no-referrer"),
    ("cache-control", "no-store"),
];

#[derive(Debug, Clone)]
pub struct SecurityMiddlewareConfig {
    /// Requests per minute per client
    pub rate_limit_per_minute: u32,
    /// Largest accepted Content-Length, in bytes
    pub max_request_size: usize,
    pub log_requests: bool,
    /// Mask client addresses in request logs
    pub sanitize_logs: bool,
}

impl Default for SecurityMiddlewareConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: 120,
            max_request_size: 64 * 1024,
            log_requests: true,
            sanitize_logs: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    used: u32,
}

/// Result of counting one request against its client's window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allowance {
    pub admitted: bool,
    pub remaining: u32,
    /// Whole seconds until the window resets
    pub reset_secs: u64,
}

/// Fixed-window request counter keyed by client address
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    limit: u32,
}

impl RateLimiter {
    pub fn new(limit: u32) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Count a request from `client`. Refused requests are not counted.
    pub fn admit(&self, client: &str) -> Allowance {
        let now = Instant::now();
        let mut window = self
            .windows
            .entry(client.to_string())
            .or_insert(Window { started: now, used: 0 });

        if now.duration_since(window.started) >= RATE_WINDOW {
            *window = Window { started: now, used: 0 };
        }
        let reset_secs = RATE_WINDOW
            .saturating_sub(now.duration_since(window.started))
            .as_secs();

        if window.used >= self.limit {
            return Allowance {
                admitted: false,
                remaining: 0,
                reset_secs,
            };
        }

        window.used += 1;
        Allowance {
            admitted: true,
            remaining: self.limit - window.used,
            reset_secs,
        }
    }

    /// Forget clients whose window closed more than a window ago
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, window| now.duration_since(window.started) < RATE_WINDOW * 2);
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

#[derive(Clone)]
pub struct SecurityState {
    pub config: SecurityMiddlewareConfig,
    pub rate_limiter: Arc<RateLimiter>,
}

impl SecurityState {
    pub fn new(config: SecurityMiddlewareConfig) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit_per_minute));
        Self {
            config,
            rate_limiter,
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Proxy headers first, then the socket peer
fn client_address(request: &Request) -> String {
    let headers = request.headers();
    header_str(headers, "x-forwarded-for")
        // First hop is the original client
        .and_then(|chain| chain.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .or_else(|| header_str(headers, "x-real-ip").map(str::to_string))
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Client address with the host part hidden: `10.1.2.*`, `2001:db8:*`
pub fn mask_client(addr: &str) -> String {
    match addr.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => {
            let [a, b, c, _] = ip.octets();
            format!("{}.{}.{}.*", a, b, c)
        }
        Ok(IpAddr::V6(ip)) => {
            let segments = ip.segments();
            format!("{:x}:{:x}:*", segments[0], segments[1])
        }
        Err(_) => "unknown".to_string(),
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn set_rate_headers(headers: &mut HeaderMap, limit: u32, allowance: Allowance) {
    headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(allowance.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(allowance.reset_secs));
}

pub async fn rate_limit_middleware(
    State(state): State<SecurityState>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_address(&request);
    let limiter = &state.rate_limiter;
    let allowance = limiter.admit(&client);

    if !allowance.admitted {
        warn!(
            client = %mask_client(&client),
            path = %request.uri().path(),
            "Rate limit exceeded"
        );
        let mut response = error_body(StatusCode::TOO_MANY_REQUESTS, "Too many requests.");
        set_rate_headers(response.headers_mut(), limiter.limit(), allowance);
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(allowance.reset_secs));
        return response;
    }

    let mut response = next.run(request).await;
    set_rate_headers(response.headers_mut(), limiter.limit(), allowance);
    response
}

pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    headers.remove(header::SERVER);

    response
}

pub async fn logging_middleware(
    State(state): State<SecurityState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.log_requests {
        return next.run(request).await;
    }

    let started = Instant::now();
    let method = request.method().clone();
    // Path only; query strings carry credentials
    let path = request.uri().path().to_string();
    let client = client_address(&request);
    let client = if state.config.sanitize_logs {
        mask_client(&client)
    } else {
        client
    };

    let response = next.run(request).await;
    let status = response.status();
    let code = status.as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        error!(%method, %path, status = code, elapsed_ms, %client, "Request failed");
    } else if status.is_client_error() {
        warn!(%method, %path, status = code, elapsed_ms, %client, "Request rejected");
    } else {
        info!(%method, %path, status = code, elapsed_ms, %client, "Request served");
    }

    response
}

/// Rejects requests whose declared Content-Length exceeds the limit
pub async fn body_size_middleware(
    State(state): State<SecurityState>,
    request: Request,
    next: Next,
) -> Response {
    let limit = state.config.max_request_size;
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    match declared {
        Some(length) if length > limit => {
            warn!(length, limit, "Request body too large");
            error_body(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large.")
        }
        _ => next.run(request).await,
    }
}

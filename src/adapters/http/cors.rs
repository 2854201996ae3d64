//! Origin policy gate for the cross-domain storefront.
//!
//! The storefront lives on its own domain, so every browser-facing route
//! carries cross-origin headers - but only for origins on the configured
//! allow-list. The gate fails closed: an absent or unknown origin yields a
//! decision with no headers at all, and the browser enforces the block.
//! A rejection is a normal value here, never an error.
//!
//! The allowed origin is always echoed back exactly (never `*`) so
//! credentialed requests keep working, and `Vary: Origin` keeps shared
//! caches from leaking one origin's response to another.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::{
        ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
        ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN, VARY,
    },
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::ServerConfig;

/// Request headers the storefront may send cross-origin. Must include the
/// custom identity header or the browser strips it from actual requests.
const ALLOWED_REQUEST_HEADERS: &str = "content-type, authorization, x-user-id";

/// Access decision for one request: computed fresh, never stored.
#[derive(Debug, Clone, Default)]
pub struct AccessDecision {
    /// Whether the origin is on the allow-list.
    pub allowed: bool,

    /// Headers to attach; empty when not allowed.
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

/// The configured origin allow-list.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed_origins: Vec<String>,
}

impl OriginPolicy {
    /// Policy over an explicit allow-list.
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    /// Policy from the server configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.allowed_origins())
    }

    /// Decide whether `origin` may make a cross-origin call with the
    /// given methods.
    ///
    /// Membership is a case-sensitive exact match. A negative decision
    /// carries no headers; the caller simply attaches nothing.
    pub fn decide(&self, origin: Option<&str>, methods: &str) -> AccessDecision {
        let Some(origin) = origin else {
            return AccessDecision::default();
        };
        if !self.allowed_origins.iter().any(|allowed| allowed == origin) {
            return AccessDecision::default();
        }
        let (Ok(origin_value), Ok(methods_value)) = (
            HeaderValue::from_str(origin),
            HeaderValue::from_str(methods),
        ) else {
            return AccessDecision::default();
        };

        AccessDecision {
            allowed: true,
            headers: vec![
                (ACCESS_CONTROL_ALLOW_ORIGIN, origin_value),
                (ACCESS_CONTROL_ALLOW_METHODS, methods_value),
                (
                    ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static(ALLOWED_REQUEST_HEADERS),
                ),
                (
                    ACCESS_CONTROL_ALLOW_CREDENTIALS,
                    HeaderValue::from_static("true"),
                ),
                (VARY, HeaderValue::from_static("Origin")),
            ],
        }
    }
}

/// Middleware attaching access-control headers to browser-facing routes.
///
/// Applied uniformly: every route behind it gets the same allow-list
/// treatment. Disallowed origins get an unadorned response and the
/// browser blocks it.
pub async fn origin_gate(
    State(policy): State<Arc<OriginPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let methods = format!("{}, OPTIONS", request.method());

    let mut response = next.run(request).await;

    let decision = policy.decide(origin.as_deref(), &methods);
    if decision.allowed {
        for (name, value) in decision.headers {
            response.headers_mut().insert(name, value);
        }
    }
    response
}

/// Build a preflight response: 204, empty body, decision headers only.
///
/// No business logic runs for a preflight.
pub fn preflight_response(
    policy: &OriginPolicy,
    origin: Option<&str>,
    methods: &str,
) -> Response {
    let decision = policy.decide(origin, methods);
    let mut response = StatusCode::NO_CONTENT.into_response();
    for (name, value) in decision.headers {
        response.headers_mut().insert(name, value);
    }
    response
}

//! HTTP proxy to the backend ledger.
//!
//! Implements the `LedgerClient` port with reqwest. The ledger base
//! address is resolved once at construction (server-only address over the
//! public one); an unconfigured backend fails per-request with the fixed
//! generic configuration error and no outbound call is attempted.
//!
//! # Relay rules
//!
//! - Body bytes are forwarded verbatim, never re-serialized
//! - The upstream status code is propagated unchanged
//! - `Content-Type` is taken from the upstream reply, defaulting to
//!   `application/json`
//! - Unparseable upstream JSON becomes `{"error": <raw text>}` so the
//!   caller always receives valid JSON
//! - No retries: one failure, one 500; retry belongs to the caller

use async_trait::async_trait;

use crate::config::BackendConfig;
use crate::domain::billing::GatewayError;
use crate::ports::{LedgerClient, LedgerRequest, LedgerResponse};

/// Header carrying the opaque caller identity to the ledger.
pub const IDENTITY_HEADER: &str = "x-user-id";

/// reqwest-based ledger proxy.
pub struct HttpLedgerProxy {
    base_url: Option<String>,
    http_client: reqwest::Client,
}

impl HttpLedgerProxy {
    /// Build the proxy, resolving the ledger address once.
    pub fn from_config(config: &BackendConfig) -> Self {
        let base_url = config.resolve().map(str::to_string);
        if base_url.is_none() {
            tracing::warn!("No ledger backend address configured; billing calls will fail");
        }
        Self {
            base_url,
            http_client: reqwest::Client::new(),
        }
    }

    /// Proxy with an explicit base address (for tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerProxy {
    async fn forward(&self, request: LedgerRequest) -> Result<LedgerResponse, GatewayError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(GatewayError::backend_not_configured)?;
        let url = format!("{}{}", base, request.path);

        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| GatewayError::upstream(format!("invalid method: {}", e)))?;

        let mut builder = self
            .http_client
            .request(method, &url)
            .header(IDENTITY_HEADER, request.identity.header_value());

        if let Some(authorization) = &request.authorization {
            builder = builder.header("authorization", authorization);
        }

        for (name, value) in &request.extra_headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = request.body {
            let content_type = request
                .content_type
                .as_deref()
                .unwrap_or("application/json");
            builder = builder.header("content-type", content_type).body(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(path = %request.path, error = %e, "Ledger call failed");
            GatewayError::upstream(e.to_string())
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::upstream(e.to_string()))?;

        let body = ensure_json_body(&content_type, bytes.to_vec());
        let cache_control = cache_control_for(&request.method, request.cache_ttl);

        tracing::debug!(
            path = %request.path,
            status = status,
            cache_control = %cache_control,
            "Ledger call relayed"
        );

        Ok(LedgerResponse {
            status,
            content_type,
            body,
            cache_control,
        })
    }
}

/// Downgrade unparseable JSON bodies to `{"error": <raw text>}`.
///
/// Applies only to JSON content types; other types relay verbatim.
fn ensure_json_body(content_type: &str, body: Vec<u8>) -> Vec<u8> {
    if !content_type.contains("json") || body.is_empty() {
        return body;
    }
    if serde_json::from_slice::<serde_json::Value>(&body).is_ok() {
        return body;
    }
    let raw = String::from_utf8_lossy(&body).to_string();
    tracing::warn!("Unparseable ledger JSON body downgraded to error object");
    serde_json::to_vec(&serde_json::json!({ "error": raw }))
        .unwrap_or_else(|_| b"{\"error\":\"unparseable upstream body\"}".to_vec())
}

/// Compute the relayed cache policy.
///
/// Only a GET with an explicit positive TTL is cacheable; everything else
/// must never be stored by shared caches.
fn cache_control_for(method: &http::Method, cache_ttl: Option<u32>) -> String {
    match cache_ttl {
        Some(ttl) if *method == http::Method::GET && ttl > 0 => {
            format!("public, max-age={}", ttl)
        }
        _ => "no-store".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::CallerIdentity;

    // ════════════════════════════════════════════════════════════════════════════
    // Address Resolution Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn from_config_prefers_internal_address() {
        let config = BackendConfig {
            internal_url: Some("http://ledger.internal:9000".to_string()),
            public_url: Some("https://api.example.com".to_string()),
        };
        let proxy = HttpLedgerProxy::from_config(&config);
        assert_eq!(proxy.base_url.as_deref(), Some("http://ledger.internal:9000"));
    }

    #[test]
    fn from_config_accepts_unconfigured_backend() {
        let proxy = HttpLedgerProxy::from_config(&BackendConfig::default());
        assert!(proxy.base_url.is_none());
    }

    #[tokio::test]
    async fn forward_fails_closed_without_backend_address() {
        let proxy = HttpLedgerProxy::from_config(&BackendConfig::default());
        let request = LedgerRequest::post("/billing/subscription/upgrade", b"{}".to_vec())
            .with_identity(CallerIdentity::from_user_id("u1"));

        let err = proxy.forward(request).await.unwrap_err();
        assert_eq!(err, GatewayError::backend_not_configured());
        assert_eq!(err.public_message(), "API url not configured");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Cache Policy Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn cacheable_get_declares_public_max_age() {
        let header = cache_control_for(&http::Method::GET, Some(30));
        assert_eq!(header, "public, max-age=30");
    }

    #[test]
    fn get_without_ttl_is_no_store() {
        assert_eq!(cache_control_for(&http::Method::GET, None), "no-store");
        assert_eq!(cache_control_for(&http::Method::GET, Some(0)), "no-store");
    }

    #[test]
    fn mutating_methods_are_no_store_even_with_ttl() {
        assert_eq!(cache_control_for(&http::Method::POST, Some(30)), "no-store");
        assert_eq!(cache_control_for(&http::Method::PATCH, Some(30)), "no-store");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Body Downgrade Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn valid_json_body_relays_verbatim() {
        let body = br#"{"plans":[{"id":"pro"}]}"#.to_vec();
        assert_eq!(ensure_json_body("application/json", body.clone()), body);
    }

    #[test]
    fn unparseable_json_body_becomes_error_object() {
        let body = b"<html>Bad Gateway</html>".to_vec();
        let downgraded = ensure_json_body("application/json", body);
        let value: serde_json::Value = serde_json::from_slice(&downgraded).unwrap();
        assert_eq!(value["error"], "<html>Bad Gateway</html>");
    }

    #[test]
    fn non_json_content_type_relays_verbatim() {
        let body = b"plain text".to_vec();
        assert_eq!(ensure_json_body("text/plain", body.clone()), body);
    }

    #[test]
    fn empty_body_relays_verbatim() {
        assert!(ensure_json_body("application/json", Vec::new()).is_empty());
    }
}

//! Ledger client port - the seam to the authoritative backend.
//!
//! The backend ledger owns all subscription and payment state; the gateway
//! only forwards. This port keeps handlers and the reconciler testable
//! against a mock ledger.

use async_trait::async_trait;
use http::Method;

use crate::domain::billing::{CallerIdentity, GatewayError};

/// A request to forward to the ledger backend.
///
/// The body is opaque bytes: it is relayed exactly as received, never
/// re-serialized, so JSON payloads cannot be double-encoded.
#[derive(Debug, Clone)]
pub struct LedgerRequest {
    /// HTTP method of the outbound call.
    pub method: Method,

    /// Ledger path, e.g. `/billing/plans`.
    pub path: String,

    /// Identity forwarded in the `x-user-id` header (empty when anonymous).
    pub identity: CallerIdentity,

    /// Caller's authorization header, forwarded verbatim when present.
    pub authorization: Option<String>,

    /// Content type of the body; defaults to `application/json` when a body
    /// is present and no type was given.
    pub content_type: Option<String>,

    /// Raw body bytes, forwarded verbatim.
    pub body: Option<Vec<u8>>,

    /// Additional headers (provider channel, passthrough webhook headers).
    pub extra_headers: Vec<(String, String)>,

    /// Positive cache lifetime in seconds; only honored for GET.
    pub cache_ttl: Option<u32>,
}

impl LedgerRequest {
    /// A GET request with no body.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// A POST request carrying raw body bytes.
    pub fn post(path: impl Into<String>, body: Vec<u8>) -> Self {
        let mut request = Self::new(Method::POST, path);
        request.body = Some(body);
        request
    }

    /// A PATCH request carrying raw body bytes.
    pub fn patch(path: impl Into<String>, body: Vec<u8>) -> Self {
        let mut request = Self::new(Method::PATCH, path);
        request.body = Some(body);
        request
    }

    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            identity: CallerIdentity::anonymous(),
            authorization: None,
            content_type: None,
            body: None,
            extra_headers: Vec::new(),
            cache_ttl: None,
        }
    }

    /// Attach the caller identity.
    pub fn with_identity(mut self, identity: CallerIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Forward the caller's authorization header.
    pub fn with_authorization(mut self, authorization: Option<String>) -> Self {
        self.authorization = authorization;
        self
    }

    /// Declare a short positive cache lifetime (GET only).
    pub fn with_cache_ttl(mut self, seconds: u32) -> Self {
        self.cache_ttl = Some(seconds);
        self
    }

    /// Add an extra header to forward.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }
}

/// The ledger's reply, relayed to the caller with adjusted caching headers.
#[derive(Debug, Clone)]
pub struct LedgerResponse {
    /// Upstream status code, propagated unchanged.
    pub status: u16,

    /// Upstream content type, defaulted to `application/json`.
    pub content_type: String,

    /// Body bytes. Always valid JSON for JSON content types: unparseable
    /// upstream bodies are downgraded to `{"error": <raw text>}`.
    pub body: Vec<u8>,

    /// Cache policy computed from the request (`no-store` for anything
    /// that is not an explicitly cacheable GET).
    pub cache_control: String,
}

impl LedgerResponse {
    /// Whether the upstream reported success.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<serde_json::Value, GatewayError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| GatewayError::upstream(format!("invalid ledger response: {}", e)))
    }
}

/// Port for forwarding requests to the backend ledger.
///
/// Implementations make exactly one outbound call per `forward`; retry
/// policy belongs to the gateway's callers.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Forward a request and relay the response.
    async fn forward(&self, request: LedgerRequest) -> Result<LedgerResponse, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn ledger_client_is_object_safe() {
        fn _accepts_dyn(_client: &dyn LedgerClient) {}
    }

    #[test]
    fn builders_set_method_and_body() {
        let request = LedgerRequest::post("/billing/refunds/request", b"{}".to_vec())
            .with_identity(CallerIdentity::from_user_id("u1"))
            .with_header("x-provider-channel", "card-billing");

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/billing/refunds/request");
        assert_eq!(request.identity.header_value(), "u1");
        assert_eq!(request.extra_headers.len(), 1);
        assert!(request.cache_ttl.is_none());
    }

    #[test]
    fn get_builder_supports_cache_ttl() {
        let request = LedgerRequest::get("/billing/plans").with_cache_ttl(30);
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.cache_ttl, Some(30));
        assert!(request.body.is_none());
    }

    #[test]
    fn response_success_range() {
        let response = LedgerResponse {
            status: 204,
            content_type: "application/json".to_string(),
            body: Vec::new(),
            cache_control: "no-store".to_string(),
        };
        assert!(response.is_success());

        let response = LedgerResponse {
            status: 502,
            ..response
        };
        assert!(!response.is_success());
    }
}

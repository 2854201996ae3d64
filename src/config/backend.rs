//! Backend ledger configuration
//!
//! The authoritative subscription ledger can be addressed two ways: a
//! server-only internal address (preferred, never exposed to the browser)
//! and a public-facing address (fallback for deployments without a private
//! network path). Both are optional at load time; resolution happens once
//! when the proxy client is constructed, and an unresolvable backend
//! surfaces as a request-time error rather than a startup crash.

use serde::Deserialize;

use super::error::ValidationError;

/// Backend ledger addresses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendConfig {
    /// Server-only ledger address; takes precedence when set
    pub internal_url: Option<String>,

    /// Public ledger address; used only when no internal address is set
    pub public_url: Option<String>,
}

impl BackendConfig {
    /// Resolve the ledger base address: internal over public.
    ///
    /// Returns `None` when neither is configured. Callers must not report
    /// which of the two variables was missing.
    pub fn resolve(&self) -> Option<&str> {
        self.internal_url
            .as_deref()
            .or(self.public_url.as_deref())
            .map(|s| s.trim_end_matches('/'))
            .filter(|s| !s.is_empty())
    }

    /// Validate backend configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        for url in [&self.internal_url, &self.public_url].into_iter().flatten() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidBackendUrl);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_internal() {
        let config = BackendConfig {
            internal_url: Some("http://ledger.internal:9000".to_string()),
            public_url: Some("https://api.example.com".to_string()),
        };
        assert_eq!(config.resolve(), Some("http://ledger.internal:9000"));
    }

    #[test]
    fn test_resolve_falls_back_to_public() {
        let config = BackendConfig {
            internal_url: None,
            public_url: Some("https://api.example.com".to_string()),
        };
        assert_eq!(config.resolve(), Some("https://api.example.com"));
    }

    #[test]
    fn test_resolve_none_when_unconfigured() {
        let config = BackendConfig::default();
        assert_eq!(config.resolve(), None);
    }

    #[test]
    fn test_resolve_strips_trailing_slash() {
        let config = BackendConfig {
            internal_url: Some("http://ledger.internal:9000/".to_string()),
            public_url: None,
        };
        assert_eq!(config.resolve(), Some("http://ledger.internal:9000"));
    }

    #[test]
    fn test_resolve_ignores_empty_string() {
        let config = BackendConfig {
            internal_url: Some("".to_string()),
            public_url: None,
        };
        assert_eq!(config.resolve(), None);
    }

    #[test]
    fn test_validation_rejects_non_http_url() {
        let config = BackendConfig {
            internal_url: Some("ledger.internal:9000".to_string()),
            public_url: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_accepts_unconfigured() {
        assert!(BackendConfig::default().validate().is_ok());
    }
}

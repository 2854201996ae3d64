//! Gateway error taxonomy.
//!
//! The gateway never retries; every error maps to one HTTP response and the
//! caller (browser or provider redelivery) owns the retry decision.

use thiserror::Error;

/// Errors surfaced by gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// A required address or key is missing from configuration.
    ///
    /// The message is a fixed generic string; it must never name the
    /// variable that was missing.
    #[error("{0}")]
    Configuration(&'static str),

    /// A payment event failed field validation before any network call.
    #[error("invalid payment event: {reason}")]
    InvalidPaymentEvent { reason: String },

    /// Talking to the ledger backend failed (network or response parsing).
    #[error("upstream unavailable: {message}")]
    Upstream { message: String },
}

impl GatewayError {
    /// The backend ledger address is not configured.
    pub fn backend_not_configured() -> Self {
        GatewayError::Configuration("API url not configured")
    }

    /// A provider tenant key is not configured.
    pub fn provider_not_configured() -> Self {
        GatewayError::Configuration("provider key not configured")
    }

    /// Create an invalid payment event error.
    pub fn invalid_event(reason: impl Into<String>) -> Self {
        GatewayError::InvalidPaymentEvent {
            reason: reason.into(),
        }
    }

    /// Create an upstream failure error.
    pub fn upstream(message: impl Into<String>) -> Self {
        GatewayError::Upstream {
            message: message.into(),
        }
    }

    /// HTTP status this error surfaces as.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Configuration(_) => 500,
            GatewayError::InvalidPaymentEvent { .. } => 400,
            GatewayError::Upstream { .. } => 500,
        }
    }

    /// Message safe to put in the response body.
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::Configuration(msg) => (*msg).to_string(),
            GatewayError::InvalidPaymentEvent { reason } => reason.clone(),
            // Operator-facing diagnosis; not client-actionable.
            GatewayError::Upstream { message } => message.clone(),
        }
    }

    /// Whether the caller should treat a retry as potentially useful.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Upstream { .. })
    }
}

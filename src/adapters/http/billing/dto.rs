//! HTTP DTOs (Data Transfer Objects) for the billing endpoints.
//!
//! These types define the JSON request/response structure of the gateway
//! API. They are the boundary between HTTP and the application layer.

use serde::{Deserialize, Serialize};

use crate::domain::billing::NormalizedStatus;
use crate::ports::ProviderKind;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create a subscription.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionBody {
    /// Plan tier to subscribe to.
    pub plan: String,
}

/// Request to change the plan of an existing subscription.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanChangeBody {
    /// Target plan tier.
    pub plan: String,

    /// Provider channel of the subscription; defaults to recurring-billing.
    #[serde(default)]
    pub provider: Option<ProviderKind>,
}

/// Request body for operations that only need the provider channel.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelBody {
    /// Provider channel of the subscription; defaults to recurring-billing.
    #[serde(default)]
    pub provider: Option<ProviderKind>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response for a direct payment confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmResponse {
    /// Whether the payment is settled (first confirm or redelivery).
    pub confirmed: bool,

    /// Normalized settlement status.
    pub status: NormalizedStatus,
}

/// Uniform JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error description.
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

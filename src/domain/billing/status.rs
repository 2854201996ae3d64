//! Normalization of provider status vocabularies.
//!
//! Each provider (and the ledger's confirmation endpoint) speaks its own
//! status dialect. Everything collapses into four internal values; callers
//! must treat `AlreadyConfirmed` exactly like `Confirmed`, which is what
//! makes webhook redelivery safe without a dedup store.

use serde::{Deserialize, Serialize};

/// Normalized outcome of a payment or confirmation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NormalizedStatus {
    /// Payment settled by this call.
    Confirmed,

    /// Payment was already settled by an earlier call. Success, not error.
    AlreadyConfirmed,

    /// Provider declined the payment.
    Declined,

    /// Status vocabulary we do not recognize.
    Unknown,
}

impl NormalizedStatus {
    /// Map a provider/ledger status string to the internal vocabulary.
    pub fn from_provider(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CONFIRMED" | "DONE" | "PAID" | "COMPLETED" => NormalizedStatus::Confirmed,
            "ALREADY_CONFIRMED" | "ALREADY_DONE" | "ALREADY_PROCESSED" => {
                NormalizedStatus::AlreadyConfirmed
            }
            s if s.starts_with("REJECT") || s.starts_with("DECLINE") => NormalizedStatus::Declined,
            "FAILED" | "CANCELED" | "ABORTED" | "EXPIRED" => NormalizedStatus::Declined,
            _ => NormalizedStatus::Unknown,
        }
    }

    /// Whether the payment is settled (first call or redelivery).
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            NormalizedStatus::Confirmed | NormalizedStatus::AlreadyConfirmed
        )
    }

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalizedStatus::Confirmed => "CONFIRMED",
            NormalizedStatus::AlreadyConfirmed => "ALREADY_CONFIRMED",
            NormalizedStatus::Declined => "DECLINED",
            NormalizedStatus::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for NormalizedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

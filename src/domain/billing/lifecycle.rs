//! Subscription lifecycle vocabulary.
//!
//! The ledger owns the authoritative state machine; this module names the
//! externally visible states so the gateway can log intended transitions
//! and reason about them in tests. The gateway never enforces transitions
//! itself — an impossible one is the ledger's to reject.

use serde::{Deserialize, Serialize};

use super::error::GatewayError;

/// Externally visible subscription lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No subscription exists for the user.
    None,

    /// Created with the provider, awaiting payment confirmation.
    PendingConfirmation,

    /// Paid and current.
    Active,

    /// Active after a prorated mid-cycle upgrade.
    ActiveUpgraded,

    /// Active with a downgrade queued for the next billing cycle.
    ActiveDowngradeScheduled,

    /// Canceled; terminal.
    Canceled,
}

impl LifecycleState {
    /// Parse a ledger state string.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "none" => Some(LifecycleState::None),
            "pending_confirmation" => Some(LifecycleState::PendingConfirmation),
            "active" => Some(LifecycleState::Active),
            "active_upgraded" => Some(LifecycleState::ActiveUpgraded),
            "active_downgrade_scheduled" => Some(LifecycleState::ActiveDowngradeScheduled),
            "canceled" => Some(LifecycleState::Canceled),
            _ => None,
        }
    }

    /// Whether `next` is a legal transition from this state.
    pub fn can_transition_to(&self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (*self, next),
            (None, PendingConfirmation)
                | (PendingConfirmation, Active)
                | (Active, ActiveUpgraded)
                | (Active, ActiveDowngradeScheduled)
                | (ActiveDowngradeScheduled, Active)
                | (Active, Canceled)
                | (ActiveUpgraded, Canceled)
                | (ActiveUpgraded, ActiveDowngradeScheduled)
                | (ActiveDowngradeScheduled, Canceled)
        )
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Canceled)
    }

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::None => "none",
            LifecycleState::PendingConfirmation => "pending_confirmation",
            LifecycleState::Active => "active",
            LifecycleState::ActiveUpgraded => "active_upgraded",
            LifecycleState::ActiveDowngradeScheduled => "active_downgrade_scheduled",
            LifecycleState::Canceled => "canceled",
        }
    }
}

/// A plan tier identifier.
///
/// Plans are owned by the ledger's catalog; the gateway treats the tier as
/// an opaque, non-empty token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanTier(String);

impl PlanTier {
    /// Create a plan tier, rejecting empty/blank identifiers.
    pub fn new(raw: impl Into<String>) -> Result<Self, GatewayError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(GatewayError::invalid_event("plan is required"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

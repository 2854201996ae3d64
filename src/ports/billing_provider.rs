//! Billing provider port - the normalized subscription-action contract.
//!
//! Two external providers with different protocols sit behind this trait:
//! the card-billing provider (one-shot card payments confirmed by webhook)
//! and the recurring-billing provider (agreement-based subscriptions).
//! Callers never see provider-specific shapes; they see the capability set
//! below and the normalized status vocabulary.
//!
//! # Design
//!
//! - **Provider agnostic**: one contract for both provider channels
//! - **Fixed proration rule**: upgrade applies immediately with proration,
//!   downgrade takes effect at the next billing cycle; callers cannot
//!   choose otherwise
//! - **Idempotent confirm**: repeating a confirm with the same identifiers
//!   yields `ALREADY_CONFIRMED`, which is success

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::billing::{CallerIdentity, GatewayError, NormalizedStatus, PaymentEvent, PlanTier};

use super::ledger_client::LedgerResponse;

/// Which provider channel an adapter speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    CardBilling,
    RecurringBilling,
}

impl ProviderKind {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::CardBilling => "card-billing",
            ProviderKind::RecurringBilling => "recurring-billing",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to create a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscriptionRequest {
    /// Tier to subscribe to.
    pub plan: PlanTier,
}

/// Request to change the plan of an existing subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanChangeRequest {
    /// Target tier.
    pub plan: PlanTier,
}

/// Normalized result of a payment confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmOutcome {
    /// Normalized settlement status.
    pub status: NormalizedStatus,

    /// Raw detail from the confirm call, for relaying diagnostics.
    pub detail: serde_json::Value,
}

impl ConfirmOutcome {
    /// Whether the payment is settled (first confirm or redelivery).
    pub fn is_settled(&self) -> bool {
        self.status.is_settled()
    }
}

/// Port for provider-channel subscription actions.
///
/// Implementations translate the internal contract into their provider's
/// shapes and forward through the ledger client. They must validate
/// payment-event fields before any network call and must never fabricate
/// an identity the caller did not supply.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// The channel this adapter speaks for.
    fn kind(&self) -> ProviderKind;

    /// Create a subscription in `pending_confirmation` state.
    async fn create_subscription(
        &self,
        identity: &CallerIdentity,
        request: CreateSubscriptionRequest,
    ) -> Result<LedgerResponse, GatewayError>;

    /// Confirm a payment with the ledger.
    ///
    /// Safe to repeat: the same `(paymentKey, orderId, amount)` yields
    /// `ALREADY_CONFIRMED` instead of a duplicate charge.
    async fn confirm_payment(
        &self,
        identity: &CallerIdentity,
        event: PaymentEvent,
    ) -> Result<ConfirmOutcome, GatewayError>;

    /// Cancel the subscription.
    async fn cancel_subscription(
        &self,
        identity: &CallerIdentity,
    ) -> Result<LedgerResponse, GatewayError>;

    /// Upgrade the plan. Proration applies immediately.
    async fn upgrade(
        &self,
        identity: &CallerIdentity,
        request: PlanChangeRequest,
    ) -> Result<LedgerResponse, GatewayError>;

    /// Downgrade the plan. Takes effect at the next billing cycle.
    async fn downgrade(
        &self,
        identity: &CallerIdentity,
        request: PlanChangeRequest,
    ) -> Result<LedgerResponse, GatewayError>;

    /// Cancel a downgrade scheduled for the next billing cycle.
    async fn cancel_pending_downgrade(
        &self,
        identity: &CallerIdentity,
    ) -> Result<LedgerResponse, GatewayError>;
}

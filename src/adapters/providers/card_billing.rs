//! Card-billing provider adapter.
//!
//! The card provider runs one-shot card payments that the storefront
//! initiates in the browser; settlement is finalized by a confirmation
//! call carrying `(paymentKey, orderId, amount)`, and the provider
//! re-notifies via webhook until the gateway acknowledges. The ledger's
//! confirmation endpoint is idempotent, so the adapter never tracks
//! delivery state.
//!
//! # Security
//!
//! Webhook deliveries can carry an HMAC-SHA256 signature. Verification
//! runs only when a webhook secret is configured: constant-time
//! comparison, with a timestamp window to reject replays.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde_json::json;
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::config::CardProviderConfig;
use crate::domain::billing::{CallerIdentity, GatewayError, NormalizedStatus, PaymentEvent};
use crate::ports::{
    BillingProvider, ConfirmOutcome, CreateSubscriptionRequest, LedgerClient, LedgerRequest,
    LedgerResponse, PlanChangeRequest, ProviderKind,
};

use super::signature::{hex_encode, SignatureHeader};
use super::{channel_headers, plan_change_body};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook deliveries (5 minutes).
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

/// Ledger paths for the card-billing channel.
const CONFIRM_PATH: &str = "/billing/card/payments/confirm";
const CREATE_PATH: &str = "/billing/card/subscription";
const CANCEL_PATH: &str = "/billing/card/subscription/cancel";
const UPGRADE_PATH: &str = "/billing/card/subscription/upgrade";
const DOWNGRADE_PATH: &str = "/billing/card/subscription/downgrade";
const CANCEL_DOWNGRADE_PATH: &str = "/billing/card/subscription/cancel-downgrade";

/// Card-billing adapter over the shared ledger client.
pub struct CardBillingAdapter {
    ledger: Arc<dyn LedgerClient>,
    settings: CardProviderConfig,
}

impl CardBillingAdapter {
    /// Create the adapter with its channel settings.
    pub fn new(ledger: Arc<dyn LedgerClient>, settings: CardProviderConfig) -> Self {
        Self { ledger, settings }
    }

    fn request(&self, mut request: LedgerRequest, identity: &CallerIdentity) -> LedgerRequest {
        request.extra_headers = channel_headers(
            ProviderKind::CardBilling,
            &self.settings.base_url,
            &self.settings.tenant_key,
        );
        request.with_identity(identity.clone())
    }

    /// Verify a webhook signature when a secret is configured.
    ///
    /// Without a configured secret this is a no-op: the deployment has
    /// opted out and deliveries are accepted as-is.
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<(), GatewayError> {
        let Some(secret) = &self.settings.webhook_secret else {
            return Ok(());
        };

        let header = signature
            .ok_or_else(|| GatewayError::invalid_event("missing webhook signature header"))
            .and_then(|raw| {
                SignatureHeader::parse(raw)
                    .map_err(|e| GatewayError::invalid_event(e.to_string()))
            })?;

        // 1. Validate timestamp (prevent replay attacks)
        let now = chrono::Utc::now().timestamp();
        let age = now - header.timestamp;

        if age > MAX_TIMESTAMP_AGE_SECS {
            tracing::warn!(
                delivery_timestamp = header.timestamp,
                age_secs = age,
                "Webhook delivery too old"
            );
            return Err(GatewayError::invalid_event(format!(
                "delivery too old ({} seconds)",
                age
            )));
        }

        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                delivery_timestamp = header.timestamp,
                "Webhook delivery timestamp in future"
            );
            return Err(GatewayError::invalid_event("delivery timestamp in future"));
        }

        // 2. Compute expected signature over "{timestamp}.{body}"
        let signed_payload = format!("{}.{}", header.timestamp, String::from_utf8_lossy(payload));

        let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .map_err(|e| GatewayError::invalid_event(e.to_string()))?;
        mac.update(signed_payload.as_bytes());
        let expected = mac.finalize().into_bytes();

        // 3. Constant-time comparison
        let expected_bytes: &[u8] = expected.as_slice();
        let provided_bytes: &[u8] = &header.v1_signature;

        if expected_bytes.ct_eq(provided_bytes).unwrap_u8() != 1 {
            tracing::warn!(
                expected_signature = hex_encode(expected_bytes),
                "Invalid webhook signature"
            );
            return Err(GatewayError::invalid_event("invalid webhook signature"));
        }

        Ok(())
    }
}

/// Map a confirm reply to the normalized status.
///
/// The ledger reports the settlement status in the body; replies without
/// one fall back to the HTTP status: 409 is the ledger's "already
/// confirmed" conflict, other 4xx are declines, anything else is unknown.
fn normalize_confirm_reply(response: &LedgerResponse) -> (NormalizedStatus, serde_json::Value) {
    let detail: serde_json::Value = serde_json::from_slice(&response.body).unwrap_or_default();

    let status = match detail.get("status").and_then(serde_json::Value::as_str) {
        Some(raw) => NormalizedStatus::from_provider(raw),
        None if response.status == 409 => NormalizedStatus::AlreadyConfirmed,
        None if (400..500).contains(&response.status) => NormalizedStatus::Declined,
        None => NormalizedStatus::Unknown,
    };

    (status, detail)
}

#[async_trait]
impl BillingProvider for CardBillingAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CardBilling
    }

    async fn create_subscription(
        &self,
        identity: &CallerIdentity,
        request: CreateSubscriptionRequest,
    ) -> Result<LedgerResponse, GatewayError> {
        let body = serde_json::to_vec(&json!({ "plan": request.plan.as_str() }))
            .map_err(|e| GatewayError::upstream(e.to_string()))?;
        self.ledger
            .forward(self.request(LedgerRequest::post(CREATE_PATH, body), identity))
            .await
    }

    async fn confirm_payment(
        &self,
        identity: &CallerIdentity,
        event: PaymentEvent,
    ) -> Result<ConfirmOutcome, GatewayError> {
        let body = serde_json::to_vec(&json!({
            "paymentKey": event.payment_key,
            "orderId": event.order_id,
            "amount": event.amount,
        }))
        .map_err(|e| GatewayError::upstream(e.to_string()))?;

        let response = self
            .ledger
            .forward(self.request(LedgerRequest::post(CONFIRM_PATH, body), identity))
            .await?;

        let (status, detail) = normalize_confirm_reply(&response);

        tracing::info!(
            order_id = %event.order_id,
            amount = event.amount,
            status = %status,
            "Card payment confirm relayed"
        );

        Ok(ConfirmOutcome { status, detail })
    }

    async fn cancel_subscription(
        &self,
        identity: &CallerIdentity,
    ) -> Result<LedgerResponse, GatewayError> {
        self.ledger
            .forward(self.request(LedgerRequest::post(CANCEL_PATH, b"{}".to_vec()), identity))
            .await
    }

    async fn upgrade(
        &self,
        identity: &CallerIdentity,
        request: PlanChangeRequest,
    ) -> Result<LedgerResponse, GatewayError> {
        let body = plan_change_body(&request.plan, true)?;
        self.ledger
            .forward(self.request(LedgerRequest::patch(UPGRADE_PATH, body), identity))
            .await
    }

    async fn downgrade(
        &self,
        identity: &CallerIdentity,
        request: PlanChangeRequest,
    ) -> Result<LedgerResponse, GatewayError> {
        let body = plan_change_body(&request.plan, false)?;
        self.ledger
            .forward(self.request(LedgerRequest::post(DOWNGRADE_PATH, body), identity))
            .await
    }

    async fn cancel_pending_downgrade(
        &self,
        identity: &CallerIdentity,
    ) -> Result<LedgerResponse, GatewayError> {
        self.ledger
            .forward(self.request(
                LedgerRequest::post(CANCEL_DOWNGRADE_PATH, b"{}".to_vec()),
                identity,
            ))
            .await
    }
}

//! Recurring-billing provider adapter.
//!
//! The recurring provider runs agreement-based subscriptions: the
//! storefront creates an agreement, the customer approves it on the
//! provider's own pages, and the provider charges each cycle on its own
//! schedule. Subscription creation therefore starts in
//! `pending_confirmation` and the ledger reply carries the approval
//! redirect for the browser.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use crate::config::RecurringProviderConfig;
use crate::domain::billing::{CallerIdentity, GatewayError, NormalizedStatus, PaymentEvent};
use crate::ports::{
    BillingProvider, ConfirmOutcome, CreateSubscriptionRequest, LedgerClient, LedgerRequest,
    LedgerResponse, PlanChangeRequest, ProviderKind,
};

use super::{channel_headers, plan_change_body};

/// Ledger paths for the recurring-billing channel.
const CREATE_PATH: &str = "/billing/recurring/subscription";
const CONFIRM_PATH: &str = "/billing/recurring/payments/confirm";
const CANCEL_PATH: &str = "/billing/recurring/subscription/cancel";
const UPGRADE_PATH: &str = "/billing/recurring/subscription/upgrade";
const DOWNGRADE_PATH: &str = "/billing/recurring/subscription/downgrade";
const CANCEL_DOWNGRADE_PATH: &str = "/billing/recurring/subscription/cancel-downgrade";

/// Recurring-billing adapter over the shared ledger client.
pub struct RecurringBillingAdapter {
    ledger: Arc<dyn LedgerClient>,
    settings: RecurringProviderConfig,
}

impl RecurringBillingAdapter {
    /// Create the adapter with its channel settings.
    pub fn new(ledger: Arc<dyn LedgerClient>, settings: RecurringProviderConfig) -> Self {
        Self { ledger, settings }
    }

    fn request(&self, mut request: LedgerRequest, identity: &CallerIdentity) -> LedgerRequest {
        request.extra_headers = channel_headers(
            ProviderKind::RecurringBilling,
            &self.settings.base_url,
            &self.settings.tenant_key,
        );
        request.with_identity(identity.clone())
    }
}

#[async_trait]
impl BillingProvider for RecurringBillingAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::RecurringBilling
    }

    async fn create_subscription(
        &self,
        identity: &CallerIdentity,
        request: CreateSubscriptionRequest,
    ) -> Result<LedgerResponse, GatewayError> {
        let body = serde_json::to_vec(&json!({ "plan": request.plan.as_str() }))
            .map_err(|e| GatewayError::upstream(e.to_string()))?;

        let response = self
            .ledger
            .forward(self.request(LedgerRequest::post(CREATE_PATH, body), identity))
            .await?;

        tracing::info!(
            plan = %request.plan,
            status = response.status,
            "Recurring subscription create relayed"
        );

        Ok(response)
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

        let detail: serde_json::Value = serde_json::from_slice(&response.body).unwrap_or_default();
        let status = detail
            .get("status")
            .and_then(serde_json::Value::as_str)
            .map(NormalizedStatus::from_provider)
            .unwrap_or(NormalizedStatus::Unknown);

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::PlanTier;
    use std::sync::Mutex;

    struct MockLedger {
        requests: Mutex<Vec<LedgerRequest>>,
        reply: LedgerResponse,
    }

    impl MockLedger {
        fn replying(status: u16, body: serde_json::Value) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                reply: LedgerResponse {
                    status,
                    content_type: "application/json".to_string(),
                    body: serde_json::to_vec(&body).unwrap(),
                    cache_control: "no-store".to_string(),
                },
            }
        }

        fn last_request(&self) -> LedgerRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl LedgerClient for MockLedger {
        async fn forward(&self, request: LedgerRequest) -> Result<LedgerResponse, GatewayError> {
            self.requests.lock().unwrap().push(request);
            Ok(self.reply.clone())
        }
    }

    fn adapter_with(ledger: Arc<MockLedger>) -> RecurringBillingAdapter {
        RecurringBillingAdapter::new(ledger, RecurringProviderConfig::default())
    }

    #[tokio::test]
    async fn create_relays_approval_redirect_verbatim() {
        let reply = serde_json::json!({
            "state": "pending_confirmation",
            "approvalUrl": "https://sandbox.api.recurbilling.example/approve/tok_1"
        });
        let ledger = Arc::new(MockLedger::replying(201, reply.clone()));
        let adapter = adapter_with(ledger.clone());

        let response = adapter
            .create_subscription(
                &CallerIdentity::from_user_id("u1"),
                CreateSubscriptionRequest {
                    plan: PlanTier::new("pro").unwrap(),
                },
            )
            .await
            .unwrap();

        assert_eq!(response.status, 201);
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body, reply);

        let request = ledger.last_request();
        assert_eq!(request.path, CREATE_PATH);
        assert!(request
            .extra_headers
            .iter()
            .any(|(name, value)| {
                name == super::super::CHANNEL_HEADER && value == "recurring-billing"
            }));
    }

    #[tokio::test]
    async fn ledger_rejection_is_surfaced_verbatim() {
        let ledger = Arc::new(MockLedger::replying(
            409,
            serde_json::json!({"error": "subscription already canceled"}),
        ));
        let adapter = adapter_with(ledger);

        let response = adapter
            .upgrade(
                &CallerIdentity::from_user_id("u1"),
                PlanChangeRequest {
                    plan: PlanTier::new("pro").unwrap(),
                },
            )
            .await
            .unwrap();

        // The gateway does not reinterpret impossible transitions.
        assert_eq!(response.status, 409);
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["error"], "subscription already canceled");
    }

    #[tokio::test]
    async fn cancel_downgrade_hits_dedicated_path() {
        let ledger = Arc::new(MockLedger::replying(200, serde_json::json!({})));
        let adapter = adapter_with(ledger.clone());

        adapter
            .cancel_pending_downgrade(&CallerIdentity::from_user_id("u1"))
            .await
            .unwrap();

        assert_eq!(ledger.last_request().path, CANCEL_DOWNGRADE_PATH);
    }
}

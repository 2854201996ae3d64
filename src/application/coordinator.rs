//! Subscription lifecycle coordinator.
//!
//! The façade the HTTP handlers drive: each operation picks the relevant
//! provider adapter or the direct proxy path, makes exactly one ledger
//! call, and relays the reply. The coordinator holds no state — the
//! ledger is the source of truth and its rejections (for example an
//! upgrade on a canceled subscription) pass through verbatim.
//!
//! All collaborators are injected at construction; there is no lazily
//! built process-wide client.

use std::sync::Arc;

use crate::domain::billing::{CallerIdentity, GatewayError, LifecycleState, PaymentEvent};
use crate::ports::{
    BillingProvider, ConfirmOutcome, CreateSubscriptionRequest, LedgerClient, LedgerRequest,
    LedgerResponse, PlanChangeRequest, ProviderKind,
};

/// Direct proxy paths (no provider channel involved).
const PLANS_PATH: &str = "/billing/plans";
const STATUS_PATH: &str = "/billing/status";
const REFUND_REQUEST_PATH: &str = "/billing/refunds/request";
const REFUND_APPROVE_PATH: &str = "/billing/refunds/approve";
const RECURRING_WEBHOOK_PATH: &str = "/billing/webhooks/recurring";

/// Plan catalog data changes slowly; shared caches may hold it briefly.
const PLAN_CACHE_TTL_SECS: u32 = 30;

/// Sequences subscription lifecycle operations.
pub struct SubscriptionLifecycleCoordinator {
    card: Arc<dyn BillingProvider>,
    recurring: Arc<dyn BillingProvider>,
    ledger: Arc<dyn LedgerClient>,
}

impl SubscriptionLifecycleCoordinator {
    /// Create the coordinator with explicitly injected collaborators.
    pub fn new(
        card: Arc<dyn BillingProvider>,
        recurring: Arc<dyn BillingProvider>,
        ledger: Arc<dyn LedgerClient>,
    ) -> Self {
        Self {
            card,
            recurring,
            ledger,
        }
    }

    /// Pick the adapter for a lifecycle operation.
    ///
    /// Subscriptions ride the recurring channel unless the caller names
    /// the card channel explicitly.
    fn provider_for(&self, kind: Option<ProviderKind>) -> &Arc<dyn BillingProvider> {
        match kind.unwrap_or(ProviderKind::RecurringBilling) {
            ProviderKind::CardBilling => &self.card,
            ProviderKind::RecurringBilling => &self.recurring,
        }
    }

    /// GET the plan catalog; cacheable for a short window.
    pub async fn plan_catalog(&self) -> Result<LedgerResponse, GatewayError> {
        self.ledger
            .forward(LedgerRequest::get(PLANS_PATH).with_cache_ttl(PLAN_CACHE_TTL_SECS))
            .await
    }

    /// Create a subscription on the recurring channel.
    pub async fn create_subscription(
        &self,
        identity: &CallerIdentity,
        request: CreateSubscriptionRequest,
    ) -> Result<LedgerResponse, GatewayError> {
        tracing::info!(
            target_state = LifecycleState::PendingConfirmation.as_str(),
            "Subscription create requested"
        );
        self.recurring.create_subscription(identity, request).await
    }

    /// Confirm a card payment against the ledger.
    pub async fn confirm_payment(
        &self,
        identity: &CallerIdentity,
        event: PaymentEvent,
    ) -> Result<ConfirmOutcome, GatewayError> {
        let outcome = self.card.confirm_payment(identity, event).await?;
        if outcome.is_settled() {
            tracing::info!(
                target_state = LifecycleState::Active.as_str(),
                status = %outcome.status,
                "Payment confirmation settled"
            );
        } else {
            tracing::warn!(
                status = %outcome.status,
                detail = %outcome.detail,
                "Payment confirmation not settled"
            );
        }
        Ok(outcome)
    }

    /// Cancel the subscription.
    pub async fn cancel(
        &self,
        identity: &CallerIdentity,
        provider: Option<ProviderKind>,
    ) -> Result<LedgerResponse, GatewayError> {
        tracing::info!(
            target_state = LifecycleState::Canceled.as_str(),
            "Subscription cancel requested"
        );
        self.provider_for(provider).cancel_subscription(identity).await
    }

    /// Upgrade the plan; proration applies immediately.
    pub async fn upgrade(
        &self,
        identity: &CallerIdentity,
        provider: Option<ProviderKind>,
        request: PlanChangeRequest,
    ) -> Result<LedgerResponse, GatewayError> {
        tracing::info!(
            target_state = LifecycleState::ActiveUpgraded.as_str(),
            plan = %request.plan,
            "Subscription upgrade requested"
        );
        self.provider_for(provider).upgrade(identity, request).await
    }

    /// Downgrade the plan; takes effect at the next billing cycle.
    pub async fn downgrade(
        &self,
        identity: &CallerIdentity,
        provider: Option<ProviderKind>,
        request: PlanChangeRequest,
    ) -> Result<LedgerResponse, GatewayError> {
        tracing::info!(
            target_state = LifecycleState::ActiveDowngradeScheduled.as_str(),
            plan = %request.plan,
            "Subscription downgrade requested"
        );
        self.provider_for(provider).downgrade(identity, request).await
    }

    /// Cancel a downgrade scheduled for the next billing cycle.
    pub async fn cancel_pending_downgrade(
        &self,
        identity: &CallerIdentity,
        provider: Option<ProviderKind>,
    ) -> Result<LedgerResponse, GatewayError> {
        tracing::info!(
            target_state = LifecycleState::Active.as_str(),
            "Pending downgrade cancel requested"
        );
        self.provider_for(provider)
            .cancel_pending_downgrade(identity)
            .await
    }

    /// GET the caller's billing status. Never cached.
    pub async fn billing_status(
        &self,
        identity: &CallerIdentity,
    ) -> Result<LedgerResponse, GatewayError> {
        self.ledger
            .forward(LedgerRequest::get(STATUS_PATH).with_identity(identity.clone()))
            .await
    }

    /// Relay a refund request verbatim.
    pub async fn request_refund(
        &self,
        identity: &CallerIdentity,
        body: Vec<u8>,
    ) -> Result<LedgerResponse, GatewayError> {
        self.ledger
            .forward(
                LedgerRequest::post(REFUND_REQUEST_PATH, body).with_identity(identity.clone()),
            )
            .await
    }

    /// Relay a refund approval.
    ///
    /// The caller's authorization header is forwarded; whether the caller
    /// is privileged enough is the ledger's decision.
    pub async fn approve_refund(
        &self,
        identity: &CallerIdentity,
        authorization: Option<String>,
        body: Vec<u8>,
    ) -> Result<LedgerResponse, GatewayError> {
        self.ledger
            .forward(
                LedgerRequest::post(REFUND_APPROVE_PATH, body)
                    .with_identity(identity.clone())
                    .with_authorization(authorization),
            )
            .await
    }

    /// Relay a recurring-provider webhook delivery untouched.
    ///
    /// Headers and body pass through unmodified; the ledger verifies the
    /// provider's own signature scheme.
    pub async fn relay_recurring_webhook(
        &self,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Result<LedgerResponse, GatewayError> {
        let mut request = LedgerRequest::post(RECURRING_WEBHOOK_PATH, body);
        request.extra_headers = headers;
        self.ledger.forward(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::providers::{CardBillingAdapter, RecurringBillingAdapter};
    use crate::config::{CardProviderConfig, RecurringProviderConfig};
    use crate::domain::billing::PlanTier;
    use async_trait::async_trait;
    use serde_json::json;
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

    fn coordinator_over(ledger: Arc<MockLedger>) -> SubscriptionLifecycleCoordinator {
        let card = Arc::new(CardBillingAdapter::new(
            ledger.clone(),
            CardProviderConfig::default(),
        ));
        let recurring = Arc::new(RecurringBillingAdapter::new(
            ledger.clone(),
            RecurringProviderConfig::default(),
        ));
        SubscriptionLifecycleCoordinator::new(card, recurring, ledger)
    }

    #[tokio::test]
    async fn plan_catalog_declares_cache_ttl() {
        let ledger = Arc::new(MockLedger::replying(200, json!({"plans": []})));
        let coordinator = coordinator_over(ledger.clone());

        coordinator.plan_catalog().await.unwrap();

        let request = ledger.last_request();
        assert_eq!(request.path, "/billing/plans");
        assert_eq!(request.cache_ttl, Some(30));
        assert!(request.identity.is_anonymous());
    }

    #[tokio::test]
    async fn create_rides_recurring_channel() {
        let ledger = Arc::new(MockLedger::replying(201, json!({})));
        let coordinator = coordinator_over(ledger.clone());

        coordinator
            .create_subscription(
                &CallerIdentity::from_user_id("u1"),
                CreateSubscriptionRequest {
                    plan: PlanTier::new("pro").unwrap(),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            ledger.last_request().path,
            "/billing/recurring/subscription"
        );
    }

    #[tokio::test]
    async fn lifecycle_ops_default_to_recurring_channel() {
        let ledger = Arc::new(MockLedger::replying(200, json!({})));
        let coordinator = coordinator_over(ledger.clone());
        let identity = CallerIdentity::from_user_id("u1");

        coordinator.cancel(&identity, None).await.unwrap();
        assert_eq!(
            ledger.last_request().path,
            "/billing/recurring/subscription/cancel"
        );

        coordinator
            .cancel(&identity, Some(ProviderKind::CardBilling))
            .await
            .unwrap();
        assert_eq!(
            ledger.last_request().path,
            "/billing/card/subscription/cancel"
        );
    }

    #[tokio::test]
    async fn confirm_rides_card_channel() {
        let ledger = Arc::new(MockLedger::replying(200, json!({"status": "CONFIRMED"})));
        let coordinator = coordinator_over(ledger.clone());

        let outcome = coordinator
            .confirm_payment(
                &CallerIdentity::from_user_id("u1"),
                PaymentEvent::new("pk1", "o1", 20000).unwrap(),
            )
            .await
            .unwrap();

        assert!(outcome.is_settled());
        assert_eq!(
            ledger.last_request().path,
            "/billing/card/payments/confirm"
        );
    }

    #[tokio::test]
    async fn billing_status_is_never_cached() {
        let ledger = Arc::new(MockLedger::replying(200, json!({"state": "active"})));
        let coordinator = coordinator_over(ledger.clone());

        coordinator
            .billing_status(&CallerIdentity::from_user_id("u1"))
            .await
            .unwrap();

        let request = ledger.last_request();
        assert_eq!(request.path, "/billing/status");
        assert_eq!(request.cache_ttl, None);
        assert_eq!(request.identity.header_value(), "u1");
    }

    #[tokio::test]
    async fn approve_refund_forwards_authorization() {
        let ledger = Arc::new(MockLedger::replying(200, json!({})));
        let coordinator = coordinator_over(ledger.clone());

        coordinator
            .approve_refund(
                &CallerIdentity::from_user_id("admin-1"),
                Some("Bearer ops-token".to_string()),
                b"{}".to_vec(),
            )
            .await
            .unwrap();

        let request = ledger.last_request();
        assert_eq!(request.path, "/billing/refunds/approve");
        assert_eq!(request.authorization.as_deref(), Some("Bearer ops-token"));
    }

    #[tokio::test]
    async fn recurring_webhook_passes_headers_through() {
        let ledger = Arc::new(MockLedger::replying(200, json!({})));
        let coordinator = coordinator_over(ledger.clone());

        coordinator
            .relay_recurring_webhook(
                vec![("x-provider-event".to_string(), "BILLING.RENEWED".to_string())],
                b"{\"id\":\"wh-1\"}".to_vec(),
            )
            .await
            .unwrap();

        let request = ledger.last_request();
        assert_eq!(request.path, "/billing/webhooks/recurring");
        assert_eq!(
            request.extra_headers,
            vec![("x-provider-event".to_string(), "BILLING.RENEWED".to_string())]
        );
        assert_eq!(request.body.unwrap(), b"{\"id\":\"wh-1\"}".to_vec());
    }
}

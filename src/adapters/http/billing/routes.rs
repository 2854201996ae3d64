//! Axum router configuration for the billing gateway.
//!
//! Browser-facing routes sit behind the origin gate middleware and each
//! mutating route pairs with an OPTIONS preflight. Webhook routes are
//! server-to-server and bypass the gate entirely.

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::adapters::http::cors::origin_gate;

use super::handlers::{
    approve_refund, billing_status, cancel_pending_downgrade, cancel_subscription, card_webhook,
    confirm_payment, create_subscription, downgrade_subscription, get_plans, preflight_patch,
    preflight_post, recurring_webhook, request_refund, upgrade_subscription, GatewayAppState,
};

/// Create the browser-facing billing router.
///
/// # Routes
///
/// - `GET  /plans` - plan catalog (cacheable ~30s)
/// - `GET  /status` - caller's billing status
/// - `POST /subscription` - create (recurring channel)
/// - `POST /subscription/confirm` - confirm a card payment
/// - `POST /subscription/cancel` - cancel
/// - `POST /subscription/cancel-downgrade` - cancel a pending downgrade
/// - `PATCH /subscription/upgrade` - prorated upgrade
/// - `POST /subscription/downgrade` - deferred downgrade
/// - `POST /refunds/request` - request a refund
/// - `POST /refunds/approve` - approve a refund (privileged callers)
///
/// Every mutating route answers `OPTIONS` with a 204 preflight carrying
/// the same allow-list decision as the route itself.
pub fn billing_routes() -> Router<GatewayAppState> {
    Router::new()
        .route("/plans", get(get_plans))
        .route("/status", get(billing_status))
        .route(
            "/subscription",
            post(create_subscription).options(preflight_post),
        )
        .route(
            "/subscription/confirm",
            post(confirm_payment).options(preflight_post),
        )
        .route(
            "/subscription/cancel",
            post(cancel_subscription).options(preflight_post),
        )
        .route(
            "/subscription/cancel-downgrade",
            post(cancel_pending_downgrade).options(preflight_post),
        )
        .route(
            "/subscription/upgrade",
            patch(upgrade_subscription).options(preflight_patch),
        )
        .route(
            "/subscription/downgrade",
            post(downgrade_subscription).options(preflight_post),
        )
        .route(
            "/refunds/request",
            post(request_refund).options(preflight_post),
        )
        .route(
            "/refunds/approve",
            post(approve_refund).options(preflight_post),
        )
}

/// Create the webhook router.
///
/// Separate from the billing routes because providers deliver
/// server-to-server: no origin gate, no identity header.
///
/// # Routes
/// - `POST /card` - card-provider notifications (reconciled)
/// - `POST /recurring` - recurring-provider notifications (passthrough)
pub fn webhook_routes() -> Router<GatewayAppState> {
    Router::new()
        .route("/card", post(card_webhook))
        .route("/recurring", post(recurring_webhook))
}

/// Create the complete gateway router.
///
/// Mounts the billing routes under `/api/billing` behind the origin gate
/// and the webhook routes under `/api/webhooks`.
pub fn gateway_router(state: GatewayAppState) -> Router {
    let browser_routes = billing_routes().layer(middleware::from_fn_with_state(
        state.policy.clone(),
        origin_gate,
    ));

    Router::new()
        .nest("/api/billing", browser_routes)
        .nest("/api/webhooks", webhook_routes())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::cors::OriginPolicy;
    use crate::adapters::providers::{CardBillingAdapter, RecurringBillingAdapter};
    use crate::application::{SubscriptionLifecycleCoordinator, WebhookReconciler};
    use crate::config::{CardProviderConfig, RecurringProviderConfig};
    use crate::domain::billing::GatewayError;
    use crate::ports::{LedgerClient, LedgerRequest, LedgerResponse};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct StubLedger;

    #[async_trait]
    impl LedgerClient for StubLedger {
        async fn forward(&self, _request: LedgerRequest) -> Result<LedgerResponse, GatewayError> {
            Ok(LedgerResponse {
                status: 200,
                content_type: "application/json".to_string(),
                body: b"{}".to_vec(),
                cache_control: "no-store".to_string(),
            })
        }
    }

    fn test_state() -> GatewayAppState {
        let ledger: Arc<dyn LedgerClient> = Arc::new(StubLedger);
        let card = Arc::new(CardBillingAdapter::new(
            ledger.clone(),
            CardProviderConfig::default(),
        ));
        let recurring = Arc::new(RecurringBillingAdapter::new(
            ledger.clone(),
            RecurringProviderConfig::default(),
        ));
        GatewayAppState {
            coordinator: Arc::new(SubscriptionLifecycleCoordinator::new(
                card.clone(),
                recurring,
                ledger,
            )),
            reconciler: Arc::new(WebhookReconciler::new(card.clone())),
            card,
            policy: Arc::new(OriginPolicy::new(vec![
                "https://shop.example.com".to_string(),
            ])),
        }
    }

    #[test]
    fn billing_routes_creates_router() {
        let router = billing_routes();
        let _: Router<()> = router.with_state(test_state());
    }

    #[test]
    fn webhook_routes_creates_router() {
        let router = webhook_routes();
        let _: Router<()> = router.with_state(test_state());
    }

    #[test]
    fn gateway_router_creates_combined_router() {
        let _router: Router = gateway_router(test_state());
    }
}

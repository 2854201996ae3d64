//! Billing gateway server binary.
//!
//! Loads and validates configuration once, constructs every component
//! explicitly, and serves the gateway router.

use std::sync::Arc;
use std::time::Duration;

use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use billing_gateway::adapters::http::billing::{gateway_router, GatewayAppState};
use billing_gateway::adapters::http::cors::OriginPolicy;
use billing_gateway::adapters::ledger::HttpLedgerProxy;
use billing_gateway::adapters::providers::{CardBillingAdapter, RecurringBillingAdapter};
use billing_gateway::application::{SubscriptionLifecycleCoordinator, WebhookReconciler};
use billing_gateway::config::AppConfig;
use billing_gateway::ports::LedgerClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.server.log_level)?)
        .json()
        .init();

    let ledger: Arc<dyn LedgerClient> = Arc::new(HttpLedgerProxy::from_config(&config.backend));
    let card = Arc::new(CardBillingAdapter::new(
        ledger.clone(),
        config.providers.card.clone(),
    ));
    let recurring = Arc::new(RecurringBillingAdapter::new(
        ledger.clone(),
        config.providers.recurring.clone(),
    ));

    let state = GatewayAppState {
        coordinator: Arc::new(SubscriptionLifecycleCoordinator::new(
            card.clone(),
            recurring,
            ledger,
        )),
        reconciler: Arc::new(WebhookReconciler::new(card.clone())),
        card,
        policy: Arc::new(OriginPolicy::from_config(&config.server)),
    };

    let app = gateway_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let addr = config.server.socket_addr();
    tracing::info!(%addr, environment = ?config.server.environment, "Billing gateway listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

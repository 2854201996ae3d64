//! HTTP handlers for the billing gateway endpoints.
//!
//! Handlers connect axum routes to the coordinator and the webhook
//! reconciler. Lifecycle replies from the ledger are relayed with their
//! original status codes; only gateway-internal failures produce new ones.

use std::sync::Arc;

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequestParts, Json, State};
use axum::http::header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, ORIGIN};
use axum::http::{request::Parts, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::adapters::http::cors::{preflight_response, OriginPolicy};
use crate::adapters::ledger::IDENTITY_HEADER;
use crate::adapters::providers::CardBillingAdapter;
use crate::application::{SubscriptionLifecycleCoordinator, WebhookReconciler};
use crate::domain::billing::{
    CallerIdentity, GatewayError, PaymentEvent, PlanTier, WebhookNotification,
};
use crate::ports::{CreateSubscriptionRequest, LedgerResponse, PlanChangeRequest};

use super::dto::{
    ChannelBody, ConfirmResponse, CreateSubscriptionBody, ErrorBody, PlanChangeBody,
};

/// Signature header on card-provider webhook deliveries.
const CARD_SIGNATURE_HEADER: &str = "x-webhook-signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; everything inside is Arc-wrapped and constructed
/// once at startup.
#[derive(Clone)]
pub struct GatewayAppState {
    pub coordinator: Arc<SubscriptionLifecycleCoordinator>,
    pub reconciler: Arc<WebhookReconciler>,
    pub card: Arc<CardBillingAdapter>,
    pub policy: Arc<OriginPolicy>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Caller Identity Extraction
// ════════════════════════════════════════════════════════════════════════════════

/// Extracts the opaque caller identity from the identity header.
///
/// Never rejects: a missing or empty header is an anonymous caller whose
/// empty identity is forwarded for the ledger to judge. The gateway does
/// not do authentication.
#[derive(Debug, Clone)]
pub struct Identity(pub CallerIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|v| v.to_str().ok());
        Ok(Identity(CallerIdentity::from_header(value)))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts gateway errors to HTTP responses.
#[derive(Debug)]
pub struct GatewayApiError(GatewayError);

impl From<GatewayError> for GatewayApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for GatewayApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody::new(self.0.public_message());
        (status, Json(body)).into_response()
    }
}

/// Relay a ledger reply: original status, reported content type, and the
/// cache policy computed by the proxy.
fn relay(response: LedgerResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [
            (CONTENT_TYPE, response.content_type),
            (CACHE_CONTROL, response.cache_control),
        ],
        response.body,
    )
        .into_response()
}

// ════════════════════════════════════════════════════════════════════════════════
// Catalog and Status (GET)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/billing/plans - Plan catalog, cacheable for a short window
pub async fn get_plans(
    State(state): State<GatewayAppState>,
) -> Result<Response, GatewayApiError> {
    let response = state.coordinator.plan_catalog().await?;
    Ok(relay(response))
}

/// GET /api/billing/status - Caller's billing status, never cached
pub async fn billing_status(
    State(state): State<GatewayAppState>,
    Identity(identity): Identity,
) -> Result<Response, GatewayApiError> {
    let response = state.coordinator.billing_status(&identity).await?;
    Ok(relay(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscription Lifecycle (POST/PATCH)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/billing/subscription - Create on the recurring channel
pub async fn create_subscription(
    State(state): State<GatewayAppState>,
    Identity(identity): Identity,
    Json(body): Json<CreateSubscriptionBody>,
) -> Result<Response, GatewayApiError> {
    let plan = PlanTier::new(body.plan)?;
    let response = state
        .coordinator
        .create_subscription(&identity, CreateSubscriptionRequest { plan })
        .await?;
    Ok(relay(response))
}

/// POST /api/billing/subscription/confirm - Confirm a card payment
pub async fn confirm_payment(
    State(state): State<GatewayAppState>,
    Identity(identity): Identity,
    Json(payload): Json<serde_json::Value>,
) -> Result<Response, GatewayApiError> {
    let event = PaymentEvent::from_payload(&payload)?;
    let outcome = state.coordinator.confirm_payment(&identity, event).await?;
    let response = ConfirmResponse {
        confirmed: outcome.is_settled(),
        status: outcome.status,
    };
    Ok(Json(response).into_response())
}

/// POST /api/billing/subscription/cancel - Cancel the subscription
pub async fn cancel_subscription(
    State(state): State<GatewayAppState>,
    Identity(identity): Identity,
    body: Option<Json<ChannelBody>>,
) -> Result<Response, GatewayApiError> {
    let provider = body.and_then(|Json(b)| b.provider);
    let response = state.coordinator.cancel(&identity, provider).await?;
    Ok(relay(response))
}

/// PATCH /api/billing/subscription/upgrade - Prorated, immediate
pub async fn upgrade_subscription(
    State(state): State<GatewayAppState>,
    Identity(identity): Identity,
    Json(body): Json<PlanChangeBody>,
) -> Result<Response, GatewayApiError> {
    let plan = PlanTier::new(body.plan)?;
    let response = state
        .coordinator
        .upgrade(&identity, body.provider, PlanChangeRequest { plan })
        .await?;
    Ok(relay(response))
}

/// POST /api/billing/subscription/downgrade - Deferred to next cycle
pub async fn downgrade_subscription(
    State(state): State<GatewayAppState>,
    Identity(identity): Identity,
    Json(body): Json<PlanChangeBody>,
) -> Result<Response, GatewayApiError> {
    let plan = PlanTier::new(body.plan)?;
    let response = state
        .coordinator
        .downgrade(&identity, body.provider, PlanChangeRequest { plan })
        .await?;
    Ok(relay(response))
}

/// POST /api/billing/subscription/cancel-downgrade - Cancel a pending downgrade
pub async fn cancel_pending_downgrade(
    State(state): State<GatewayAppState>,
    Identity(identity): Identity,
    body: Option<Json<ChannelBody>>,
) -> Result<Response, GatewayApiError> {
    let provider = body.and_then(|Json(b)| b.provider);
    let response = state
        .coordinator
        .cancel_pending_downgrade(&identity, provider)
        .await?;
    Ok(relay(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Refunds
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/billing/refunds/request - Relay a refund request
pub async fn request_refund(
    State(state): State<GatewayAppState>,
    Identity(identity): Identity,
    body: Bytes,
) -> Result<Response, GatewayApiError> {
    let response = state
        .coordinator
        .request_refund(&identity, body.to_vec())
        .await?;
    Ok(relay(response))
}

/// POST /api/billing/refunds/approve - Relay a refund approval
///
/// The caller's authorization header is forwarded; the ledger decides
/// whether the caller is privileged.
pub async fn approve_refund(
    State(state): State<GatewayAppState>,
    Identity(identity): Identity,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayApiError> {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let response = state
        .coordinator
        .approve_refund(&identity, authorization, body.to_vec())
        .await?;
    Ok(relay(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhooks (server-to-server, bypass the origin gate)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/card - Card-provider notifications
pub async fn card_webhook(
    State(state): State<GatewayAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(CARD_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    if let Err(e) = state.card.verify_webhook_signature(&body, signature) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "received": false, "error": e.public_message() })),
        )
            .into_response();
    }

    let notification: WebhookNotification = match serde_json::from_slice(&body) {
        Ok(notification) => notification,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "received": false,
                    "error": format!("invalid JSON payload: {}", e),
                })),
            )
                .into_response();
        }
    };

    let outcome = state.reconciler.reconcile(notification).await;
    let status = StatusCode::from_u16(outcome.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(outcome.body())).into_response()
}

/// POST /api/webhooks/recurring - Raw passthrough to the ledger
pub async fn recurring_webhook(
    State(state): State<GatewayAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayApiError> {
    let passthrough = passthrough_headers(&headers);
    let response = state
        .coordinator
        .relay_recurring_webhook(passthrough, body.to_vec())
        .await?;
    Ok(relay(response))
}

/// Headers to relay on the recurring webhook passthrough.
///
/// Connection-level headers are dropped; everything else (provider event
/// tags, transmission ids, signatures) passes through unmodified.
fn passthrough_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|(name, _)| {
            let name = name.as_str();
            name != "host" && name != "content-length" && name != "connection"
        })
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════════
// Preflight
// ════════════════════════════════════════════════════════════════════════════════

/// OPTIONS handler for POST routes.
pub async fn preflight_post(
    State(state): State<GatewayAppState>,
    headers: HeaderMap,
) -> Response {
    preflight(&state.policy, &headers, "POST, OPTIONS")
}

/// OPTIONS handler for PATCH routes.
pub async fn preflight_patch(
    State(state): State<GatewayAppState>,
    headers: HeaderMap,
) -> Response {
    preflight(&state.policy, &headers, "PATCH, OPTIONS")
}

fn preflight(policy: &OriginPolicy, headers: &HeaderMap, methods: &str) -> Response {
    let origin = headers.get(ORIGIN).and_then(|v| v.to_str().ok());
    preflight_response(policy, origin, methods)
}

//! Webhook reconciler - drives provider notifications into idempotent
//! confirmation calls.
//!
//! ## Design
//!
//! Each delivery is handled synchronously to completion:
//! 1. Filter by event type - only payment status changes proceed
//! 2. Check the payload status - only settled payments proceed
//! 3. Validate identifying fields - bad fields invite a provider retry
//! 4. Confirm through the card-billing adapter
//! 5. Report the normalized outcome
//!
//! ## Redelivery Handling
//!
//! The reconciler keeps no delivery ledger. Redelivered notifications
//! re-run the confirm call, and the ledger answers `ALREADY_CONFIRMED`,
//! which step 5 reports as success. Two deliveries racing across process
//! instances resolve the same way at the ledger.

use std::sync::Arc;

use serde_json::json;

use crate::domain::billing::{
    CallerIdentity, NormalizedStatus, PaymentEvent, WebhookNotification,
};
use crate::ports::BillingProvider;

/// Event type tag for payment status changes; everything else is noise
/// the provider should not retry.
const PAYMENT_STATUS_CHANGED: &str = "PAYMENT_STATUS_CHANGED";

/// Outcome of reconciling one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Intentionally ignored event type or non-settled status.
    Skipped,

    /// Malformed delivery; the provider should retry.
    Rejected { reason: String },

    /// Confirm call ran; status is the normalized result.
    Confirmed { status: NormalizedStatus },

    /// Confirm call failed; the provider should retry.
    Failed { message: String },
}

impl WebhookOutcome {
    /// HTTP status to answer the provider with.
    ///
    /// 200 acknowledges (including intentional skips, so the provider
    /// stops retrying); 400 and 500 both invite redelivery.
    pub fn http_status(&self) -> u16 {
        match self {
            WebhookOutcome::Skipped | WebhookOutcome::Confirmed { .. } => 200,
            WebhookOutcome::Rejected { .. } => 400,
            WebhookOutcome::Failed { .. } => 500,
        }
    }

    /// JSON body to answer the provider with.
    pub fn body(&self) -> serde_json::Value {
        match self {
            WebhookOutcome::Skipped => json!({ "received": true, "skipped": true }),
            WebhookOutcome::Rejected { reason } => {
                json!({ "received": false, "error": reason })
            }
            WebhookOutcome::Confirmed { status } => json!({
                "received": true,
                "confirmed": status.is_settled(),
                "status": status.as_str(),
            }),
            WebhookOutcome::Failed { message } => {
                json!({ "received": false, "error": message })
            }
        }
    }
}

/// Reconciles card-provider webhook deliveries.
pub struct WebhookReconciler {
    card: Arc<dyn BillingProvider>,
}

impl WebhookReconciler {
    /// Create the reconciler over the card-billing adapter.
    pub fn new(card: Arc<dyn BillingProvider>) -> Self {
        Self { card }
    }

    /// Process one delivery to completion.
    pub async fn reconcile(&self, notification: WebhookNotification) -> WebhookOutcome {
        // 1. Filter by event type
        if notification.event_type != PAYMENT_STATUS_CHANGED {
            tracing::debug!(
                event_type = %notification.event_type,
                "Webhook event type ignored"
            );
            return WebhookOutcome::Skipped;
        }

        // 2. Only settled payments proceed; pending/failed/canceled are
        // acknowledged so the provider stops redelivering them.
        let settled = notification
            .payload_status()
            .map(|s| NormalizedStatus::from_provider(s) == NormalizedStatus::Confirmed)
            .unwrap_or(false);
        if !settled {
            tracing::debug!(
                status = notification.payload_status().unwrap_or("<missing>"),
                "Webhook payload status not settled"
            );
            return WebhookOutcome::Skipped;
        }

        // 3. Field validation
        let event = match PaymentEvent::from_payload(&notification.data) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Webhook delivery failed field validation");
                return WebhookOutcome::Rejected {
                    reason: e.public_message(),
                };
            }
        };

        // 4. Confirm; identity is server-to-server, the ledger resolves
        // the owning user from the order.
        match self
            .card
            .confirm_payment(&CallerIdentity::anonymous(), event)
            .await
        {
            // 5. Report the normalized outcome
            Ok(outcome) => {
                tracing::info!(
                    status = %outcome.status,
                    received_at = %notification.received_at,
                    "Webhook reconciled"
                );
                WebhookOutcome::Confirmed {
                    status: outcome.status,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Webhook confirm failed");
                WebhookOutcome::Failed {
                    message: e.public_message(),
                }
            }
        }
    }
}

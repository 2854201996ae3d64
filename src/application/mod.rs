//! Application layer - operation sequencing over the ports.

mod coordinator;
mod reconciler;

pub use coordinator::SubscriptionLifecycleCoordinator;
pub use reconciler::{WebhookOutcome, WebhookReconciler};

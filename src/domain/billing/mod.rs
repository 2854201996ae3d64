//! Billing domain - the gateway's internal vocabulary.
//!
//! Payment events, normalized provider statuses, the subscription
//! lifecycle, caller identity, and the error taxonomy. Nothing in here
//! performs I/O or holds state across requests.

mod error;
mod event;
mod identity;
mod lifecycle;
mod status;

pub use error::GatewayError;
pub use event::{PaymentEvent, WebhookNotification};
pub use identity::CallerIdentity;
pub use lifecycle::{LifecycleState, PlanTier};
pub use status::NormalizedStatus;

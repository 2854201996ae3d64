//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `BillingProvider` - normalized subscription actions per provider channel
//! - `LedgerClient` - forwarding to the authoritative backend ledger

mod billing_provider;
mod ledger_client;

pub use billing_provider::{
    BillingProvider, ConfirmOutcome, CreateSubscriptionRequest, PlanChangeRequest, ProviderKind,
};
pub use ledger_client::{LedgerClient, LedgerRequest, LedgerResponse};

//! Ledger adapter - HTTP proxy to the authoritative backend.

mod http_proxy;

pub use http_proxy::{HttpLedgerProxy, IDENTITY_HEADER};

//! Billing Gateway - Payment brokerage for subscription storefronts
//!
//! This crate normalizes two external payment providers (card billing and
//! recurring billing) into one internal subscription contract, enforces
//! cross-origin policy for a storefront hosted on a separate domain, and
//! reconciles provider webhooks into idempotent confirmation calls against
//! the authoritative subscription ledger.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

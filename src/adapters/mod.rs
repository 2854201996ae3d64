//! Adapters - implementations of the ports against the outside world.

pub mod http;
pub mod ledger;
pub mod providers;

//! HTTP adapter for the billing gateway API.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::GatewayAppState;
pub use routes::{billing_routes, gateway_router, webhook_routes};

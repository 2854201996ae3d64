//! Provider adapters - one per external payment provider.
//!
//! Each adapter translates the internal subscription contract into its
//! provider's channel at the ledger, tagging every forwarded request with
//! the provider channel headers so the multi-tenant ledger can route to
//! the right provider tenant.

mod card_billing;
mod recurring_billing;
mod signature;

pub use card_billing::CardBillingAdapter;
pub use recurring_billing::RecurringBillingAdapter;
pub use signature::{SignatureHeader, SignatureParseError};

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::domain::billing::{GatewayError, PlanTier};
use crate::ports::ProviderKind;

/// Header naming the provider channel of a forwarded request.
pub const CHANNEL_HEADER: &str = "x-provider-channel";

/// Header carrying the provider API base URL for the channel.
pub const CHANNEL_BASE_URL_HEADER: &str = "x-provider-base-url";

/// Header carrying the tenant key for the channel.
pub const CHANNEL_TENANT_KEY_HEADER: &str = "x-provider-tenant-key";

/// Channel headers attached to every provider-channel ledger call.
pub(crate) fn channel_headers(
    kind: ProviderKind,
    base_url: &str,
    tenant_key: &SecretString,
) -> Vec<(String, String)> {
    vec![
        (CHANNEL_HEADER.to_string(), kind.as_str().to_string()),
        (CHANNEL_BASE_URL_HEADER.to_string(), base_url.to_string()),
        (
            CHANNEL_TENANT_KEY_HEADER.to_string(),
            tenant_key.expose_secret().clone(),
        ),
    ]
}

/// Body for a plan change. The proration flag is the fixed business rule,
/// not caller input: upgrades prorate now, downgrades wait for the next
/// billing cycle.
pub(crate) fn plan_change_body(plan: &PlanTier, prorate: bool) -> Result<Vec<u8>, GatewayError> {
    serde_json::to_vec(&json!({
        "plan": plan.as_str(),
        "prorate": prorate,
        "effective": if prorate { "immediate" } else { "next_cycle" },
    }))
    .map_err(|e| GatewayError::upstream(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_change_body_encodes_proration_rule() {
        let plan = PlanTier::new("pro").unwrap();

        let upgrade: serde_json::Value =
            serde_json::from_slice(&plan_change_body(&plan, true).unwrap()).unwrap();
        assert_eq!(upgrade["effective"], "immediate");

        let downgrade: serde_json::Value =
            serde_json::from_slice(&plan_change_body(&plan, false).unwrap()).unwrap();
        assert_eq!(downgrade["effective"], "next_cycle");
    }

    #[test]
    fn channel_headers_carry_kind_and_tenant() {
        let headers = channel_headers(
            ProviderKind::CardBilling,
            "https://sandbox.pay.cardbilling.example",
            &SecretString::new("tk_test".to_string()),
        );
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[0].1, "card-billing");
        assert_eq!(headers[2].1, "tk_test");
    }
}

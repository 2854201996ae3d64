//! Payment provider configuration
//!
//! Each provider channel carries a base URL and a tenant key. Built-in
//! defaults point at the providers' sandbox tenants so a development
//! gateway works without any provider env vars set.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Configuration for both provider channels
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersConfig {
    /// Card-billing provider (one-shot card payments, webhook-confirmed)
    #[serde(default)]
    pub card: CardProviderConfig,

    /// Recurring-billing provider (agreement-based subscriptions)
    #[serde(default)]
    pub recurring: RecurringProviderConfig,
}

impl ProvidersConfig {
    /// Validate provider configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_channel(&self.card.base_url, &self.card.tenant_key)?;
        validate_channel(&self.recurring.base_url, &self.recurring.tenant_key)?;
        Ok(())
    }
}

/// Card-billing provider settings
#[derive(Debug, Clone, Deserialize)]
pub struct CardProviderConfig {
    /// Provider API base URL
    #[serde(default = "default_card_base_url")]
    pub base_url: String,

    /// Tenant key identifying this storefront to the provider
    #[serde(default = "default_card_tenant_key")]
    pub tenant_key: SecretString,

    /// Webhook signing secret; signature checks run only when set
    pub webhook_secret: Option<SecretString>,
}

impl Default for CardProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_card_base_url(),
            tenant_key: default_card_tenant_key(),
            webhook_secret: None,
        }
    }
}

/// Recurring-billing provider settings
#[derive(Debug, Clone, Deserialize)]
pub struct RecurringProviderConfig {
    /// Provider API base URL
    #[serde(default = "default_recurring_base_url")]
    pub base_url: String,

    /// Tenant key identifying this storefront to the provider
    #[serde(default = "default_recurring_tenant_key")]
    pub tenant_key: SecretString,
}

impl Default for RecurringProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_recurring_base_url(),
            tenant_key: default_recurring_tenant_key(),
        }
    }
}

fn validate_channel(base_url: &str, tenant_key: &SecretString) -> Result<(), ValidationError> {
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ValidationError::InvalidProviderUrl);
    }
    if tenant_key.expose_secret().is_empty() {
        return Err(ValidationError::EmptyTenantKey);
    }
    Ok(())
}

fn default_card_base_url() -> String {
    "https://sandbox.pay.cardbilling.example".to_string()
}

fn default_card_tenant_key() -> SecretString {
    SecretString::new("tk_sandbox_card".to_string())
}

fn default_recurring_base_url() -> String {
    "https://sandbox.api.recurbilling.example".to_string()
}

fn default_recurring_tenant_key() -> SecretString {
    SecretString::new("tk_sandbox_recurring".to_string())
}

//! Payment events and webhook notifications.
//!
//! A `PaymentEvent` is one attempt to move money; it is constructed per
//! request or webhook delivery and never persisted here. Field validation
//! happens at construction so no confirm call can be issued for a
//! zero/negative/non-numeric amount.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::GatewayError;

/// Payload field names that may carry the amount, in precedence order.
///
/// The card provider sends `totalAmount` in webhooks but `amount` on its
/// direct confirmation payloads; the first field present wins.
const AMOUNT_FIELDS: [&str; 2] = ["totalAmount", "amount"];

/// One attempt to move money, identified by provider-assigned keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// Provider-assigned payment identifier.
    pub payment_key: String,

    /// Provider-assigned order identifier.
    pub order_id: String,

    /// Amount in minor currency units. Always positive.
    pub amount: i64,
}

impl PaymentEvent {
    /// Build a payment event, validating the amount.
    pub fn new(
        payment_key: impl Into<String>,
        order_id: impl Into<String>,
        amount: i64,
    ) -> Result<Self, GatewayError> {
        let payment_key = payment_key.into();
        let order_id = order_id.into();
        if payment_key.is_empty() {
            return Err(GatewayError::invalid_event("paymentKey is required"));
        }
        if order_id.is_empty() {
            return Err(GatewayError::invalid_event("orderId is required"));
        }
        if amount <= 0 {
            return Err(GatewayError::invalid_event("amount must be positive"));
        }
        Ok(Self {
            payment_key,
            order_id,
            amount,
        })
    }

    /// Read a payment event out of a provider payload.
    ///
    /// `paymentKey` and `orderId` are required strings; the amount is read
    /// with the [`AMOUNT_FIELDS`] precedence and must be a positive whole
    /// number of minor units.
    pub fn from_payload(payload: &Value) -> Result<Self, GatewayError> {
        let payment_key = required_string(payload, "paymentKey")?;
        let order_id = required_string(payload, "orderId")?;
        let amount = read_amount(payload)?;
        Self::new(payment_key, order_id, amount)
    }
}

fn required_string(payload: &Value, field: &str) -> Result<String, GatewayError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GatewayError::invalid_event(format!("{} is required", field)))
}

/// Read the amount with documented field precedence.
///
/// The first of [`AMOUNT_FIELDS`] present in the payload is used; a present
/// but invalid value is an error, never a fall-through to the next name.
fn read_amount(payload: &Value) -> Result<i64, GatewayError> {
    for field in AMOUNT_FIELDS {
        let Some(value) = payload.get(field) else {
            continue;
        };
        if let Some(n) = value.as_i64() {
            if n <= 0 {
                return Err(GatewayError::invalid_event("amount must be positive"));
            }
            return Ok(n);
        }
        if let Some(f) = value.as_f64() {
            if !f.is_finite() || f <= 0.0 {
                return Err(GatewayError::invalid_event("amount must be positive"));
            }
            if f.fract() != 0.0 {
                return Err(GatewayError::invalid_event(
                    "amount must be a whole number of minor units",
                ));
            }
            return Ok(f as i64);
        }
        return Err(GatewayError::invalid_event("amount must be numeric"));
    }
    Err(GatewayError::invalid_event("amount is required"))
}

/// An asynchronous provider notification as delivered to a webhook route.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookNotification {
    /// Provider event type tag.
    #[serde(rename = "eventType", default)]
    pub event_type: String,

    /// Nested payload; shape matches the provider's payment object.
    #[serde(default)]
    pub data: Value,

    /// Arrival time at this gateway instance.
    #[serde(skip, default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl WebhookNotification {
    /// The provider-reported payment status inside the payload, if any.
    pub fn payload_status(&self) -> Option<&str> {
        self.data.get("status").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ════════════════════════════════════════════════════════════════════════════
    // Amount Precedence Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn amount_read_from_total_amount() {
        let payload = json!({"paymentKey": "pk1", "orderId": "o1", "totalAmount": 20000});
        let event = PaymentEvent::from_payload(&payload).unwrap();
        assert_eq!(event.amount, 20000);
    }

    #[test]
    fn amount_read_from_amount_when_total_absent() {
        let payload = json!({"paymentKey": "pk1", "orderId": "o1", "amount": 4500});
        let event = PaymentEvent::from_payload(&payload).unwrap();
        assert_eq!(event.amount, 4500);
    }

    #[test]
    fn total_amount_wins_when_both_present() {
        let payload = json!({
            "paymentKey": "pk1",
            "orderId": "o1",
            "totalAmount": 20000,
            "amount": 999
        });
        let event = PaymentEvent::from_payload(&payload).unwrap();
        assert_eq!(event.amount, 20000);
    }

    #[test]
    fn invalid_total_amount_does_not_fall_through() {
        let payload = json!({
            "paymentKey": "pk1",
            "orderId": "o1",
            "totalAmount": "not-a-number",
            "amount": 999
        });
        assert!(PaymentEvent::from_payload(&payload).is_err());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Field Validation Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn missing_payment_key_rejected() {
        let payload = json!({"orderId": "o1", "totalAmount": 20000});
        let err = PaymentEvent::from_payload(&payload).unwrap_err();
        assert!(err.public_message().contains("paymentKey"));
    }

    #[test]
    fn missing_order_id_rejected() {
        let payload = json!({"paymentKey": "pk1", "totalAmount": 20000});
        let err = PaymentEvent::from_payload(&payload).unwrap_err();
        assert!(err.public_message().contains("orderId"));
    }

    #[test]
    fn empty_identifiers_rejected() {
        let payload = json!({"paymentKey": "", "orderId": "o1", "totalAmount": 20000});
        assert!(PaymentEvent::from_payload(&payload).is_err());
    }

    #[test]
    fn zero_amount_rejected() {
        let payload = json!({"paymentKey": "pk1", "orderId": "o1", "totalAmount": 0});
        assert!(PaymentEvent::from_payload(&payload).is_err());
    }

    #[test]
    fn negative_amount_rejected() {
        let payload = json!({"paymentKey": "pk1", "orderId": "o1", "totalAmount": -100});
        assert!(PaymentEvent::from_payload(&payload).is_err());
    }

    #[test]
    fn non_numeric_amount_rejected() {
        let payload = json!({"paymentKey": "pk1", "orderId": "o1", "totalAmount": "20000"});
        assert!(PaymentEvent::from_payload(&payload).is_err());
    }

    #[test]
    fn missing_amount_rejected() {
        let payload = json!({"paymentKey": "pk1", "orderId": "o1"});
        let err = PaymentEvent::from_payload(&payload).unwrap_err();
        assert!(err.public_message().contains("amount"));
    }

    #[test]
    fn fractional_amount_rejected() {
        let payload = json!({"paymentKey": "pk1", "orderId": "o1", "totalAmount": 199.99});
        assert!(PaymentEvent::from_payload(&payload).is_err());
    }

    #[test]
    fn whole_float_amount_accepted() {
        let payload = json!({"paymentKey": "pk1", "orderId": "o1", "totalAmount": 20000.0});
        let event = PaymentEvent::from_payload(&payload).unwrap();
        assert_eq!(event.amount, 20000);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Webhook Notification Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn notification_deserializes_event_type_and_data() {
        let raw = json!({
            "eventType": "PAYMENT_STATUS_CHANGED",
            "data": {"status": "DONE", "paymentKey": "pk1", "orderId": "o1", "totalAmount": 20000}
        });
        let notification: WebhookNotification = serde_json::from_value(raw).unwrap();
        assert_eq!(notification.event_type, "PAYMENT_STATUS_CHANGED");
        assert_eq!(notification.payload_status(), Some("DONE"));
    }

    #[test]
    fn notification_tolerates_missing_fields() {
        let notification: WebhookNotification = serde_json::from_value(json!({})).unwrap();
        assert_eq!(notification.event_type, "");
        assert_eq!(notification.payload_status(), None);
    }
}

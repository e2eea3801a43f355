//! # Payment Intents
//!
//! A payment intent is created server-side, handed to the browser as a
//! client secret, then confirmed with the payment method the form collected.

use crate::payment_method::PaymentMethodType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of a create-payment-intent call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntentCreateParams {
    /// Amount in minor units (cents)
    pub amount: i64,
    /// Lowercase ISO currency code
    pub currency: String,
    pub payment_method_types: Vec<PaymentMethodType>,
    /// Anything else the caller sends (metadata, capture_method, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PaymentIntentCreateParams {
    pub fn new(
        amount: i64,
        currency: impl Into<String>,
        payment_method_types: Vec<PaymentMethodType>,
    ) -> Self {
        Self {
            amount,
            currency: currency.into(),
            payment_method_types,
            extra: Map::new(),
        }
    }
}

/// Body of a confirm-payment-intent call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntentConfirmParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A payment intent record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    /// e.g. `requires_payment_method`, `processing`, `succeeded`
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_params_pass_through_extra_fields() {
        let params: PaymentIntentCreateParams = serde_json::from_value(json!({
            "amount": 500,
            "currency": "usd",
            "payment_method_types": ["card", "ach_debit"],
            "metadata": { "order_id": "ord_1" }
        }))
        .unwrap();

        assert_eq!(
            params.payment_method_types,
            vec![PaymentMethodType::Card, PaymentMethodType::AchDebit]
        );

        let out = serde_json::to_value(&params).unwrap();
        assert_eq!(out["metadata"]["order_id"], "ord_1");
        assert_eq!(out["amount"], 500);
    }

    #[test]
    fn test_confirm_params_optional_method() {
        let params: PaymentIntentConfirmParams = serde_json::from_value(json!({})).unwrap();
        assert!(params.payment_method_id.is_none());
        assert_eq!(serde_json::to_value(&params).unwrap(), json!({}));
    }
}

//! # Customers and Subscriptions
//!
//! Customers own saved payment methods; subscriptions charge one of them on
//! a schedule. The relay models only the fields it reads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of a create-customer call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerCreateParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A customer record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of a create-subscription call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionCreateParams {
    pub customer_id: String,
    pub payment_method_id: String,
    /// price, currency, interval_unit, billing_cycle_anchor, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A subscription record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

//! # Payment Method Types
//!
//! Payment methods as the processor returns them, plus the request
//! parameters the relay forwards for them.
//!
//! Records are owned by the processor. Fields the relay does not model are
//! kept in `extra` so a record can be handed back to the browser unchanged.

use crate::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Kind of payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    /// Credit or debit card
    Card,
    /// US bank account debit
    AchDebit,
    /// Canadian bank account debit
    EftDebit,
}

impl PaymentMethodType {
    /// Wire name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodType::Card => "card",
            PaymentMethodType::AchDebit => "ach_debit",
            PaymentMethodType::EftDebit => "eft_debit",
        }
    }
}

impl fmt::Display for PaymentMethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(PaymentMethodType::Card),
            "ach_debit" => Ok(PaymentMethodType::AchDebit),
            "eft_debit" => Ok(PaymentMethodType::EftDebit),
            other => Err(format!("unknown payment method type: {}", other)),
        }
    }
}

/// Card details of a card payment method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_year: Option<u32>,
    /// `credit`, `debit`, `prepaid` or `unknown`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Bank details of an ACH debit payment method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AchDebitDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    /// `checking` or `savings`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_number: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Bank details of an EFT debit payment method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EftDebitDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_number: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A payment method record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Processor-assigned ID (pm_...)
    pub id: String,

    #[serde(rename = "type")]
    pub method_type: PaymentMethodType,

    /// Owning customer, absent until attached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    /// Whether the method can currently be charged
    #[serde(default)]
    pub chargeable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<CardDetails>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ach_debit: Option<AchDebitDetails>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eft_debit: Option<EftDebitDetails>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Fields not modeled by the relay (billing_details, metadata, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PaymentMethod {
    /// Create a bare record of the given type
    pub fn new(id: impl Into<String>, method_type: PaymentMethodType) -> Self {
        Self {
            id: id.into(),
            method_type,
            customer_id: None,
            chargeable: true,
            card: None,
            ach_debit: None,
            eft_debit: None,
            created_at: None,
            updated_at: None,
            extra: Map::new(),
        }
    }

    /// Create a card payment method
    pub fn card(id: impl Into<String>, card: CardDetails) -> Self {
        Self {
            card: Some(card),
            ..Self::new(id, PaymentMethodType::Card)
        }
    }

    /// Create an ACH debit payment method
    pub fn ach_debit(id: impl Into<String>, details: AchDebitDetails) -> Self {
        Self {
            ach_debit: Some(details),
            ..Self::new(id, PaymentMethodType::AchDebit)
        }
    }

    /// Create an EFT debit payment method
    pub fn eft_debit(id: impl Into<String>, details: EftDebitDetails) -> Self {
        Self {
            eft_debit: Some(details),
            ..Self::new(id, PaymentMethodType::EftDebit)
        }
    }

    /// Builder: set the owning customer
    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Fingerprint fields for this method's type.
    ///
    /// `None` when the type-specific details are missing from the record.
    pub fn fingerprint(&self) -> Option<Fingerprint<'_>> {
        match self.method_type {
            PaymentMethodType::Card => self.card.as_ref().map(Fingerprint::Card),
            PaymentMethodType::AchDebit => self.ach_debit.as_ref().map(Fingerprint::AchDebit),
            PaymentMethodType::EftDebit => self.eft_debit.as_ref().map(Fingerprint::EftDebit),
        }
    }
}

/// One page of a customer's payment methods
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodList {
    pub items: Vec<PaymentMethod>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Query for listing a customer's payment methods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPaymentMethodsParams {
    pub customer_id: String,
    #[serde(rename = "type")]
    pub method_type: PaymentMethodType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl ListPaymentMethodsParams {
    pub fn new(customer_id: impl Into<String>, method_type: PaymentMethodType) -> Self {
        Self {
            customer_id: customer_id.into(),
            method_type,
            offset: None,
            limit: None,
        }
    }
}

/// Body of an attach call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodAttachParams {
    pub customer_id: String,
}

/// Body of a create-payment-method call.
///
/// Card and bank fields are tokenized by the browser form; the relay only
/// needs the type and forwards the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodCreateParams {
    #[serde(rename = "type")]
    pub method_type: PaymentMethodType,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

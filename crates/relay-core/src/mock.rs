//! # Mock Processor
//!
//! In-memory processor for tests and local demos. Payment methods are kept
//! in insertion order, which is the order `list_payment_methods` returns.

use crate::customer::{Customer, CustomerCreateParams, Subscription, SubscriptionCreateParams};
use crate::error::{PaymentError, PaymentResult};
use crate::intent::{PaymentIntent, PaymentIntentConfirmParams, PaymentIntentCreateParams};
use crate::payment_method::{
    ListPaymentMethodsParams, PaymentMethod, PaymentMethodAttachParams,
    PaymentMethodCreateParams, PaymentMethodList,
};
use crate::processor::PaymentProcessor;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Processor operations, for call assertions and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    CreatePaymentIntent,
    ConfirmPaymentIntent,
    CreatePaymentMethod,
    GetPaymentMethod,
    ListPaymentMethods,
    AttachPaymentMethod,
    CreateCustomer,
    CreateSubscription,
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub operation: MockOperation,
    pub account_id: String,
    /// Operation-specific target, e.g. the payment method ID
    pub target: Option<String>,
}

#[derive(Default)]
struct MockState {
    payment_methods: Vec<PaymentMethod>,
    intents: Vec<PaymentIntent>,
    duplicates: HashSet<String>,
    failures: HashMap<MockOperation, (u16, String)>,
    calls: Vec<MockCall>,
    next_id: u64,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}_mock_{}", prefix, self.next_id)
    }
}

/// In-memory [`PaymentProcessor`]
#[derive(Default)]
pub struct MockProcessor {
    state: Mutex<MockState>,
}

/// Message the mock reports for a refused duplicate attach
pub const MOCK_DUPLICATE_MESSAGE: &str =
    "The card is already associated with this customer on another payment method.";

impl MockProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: seed a payment method
    pub fn with_payment_method(self, pm: PaymentMethod) -> Self {
        self.lock().payment_methods.push(pm);
        self
    }

    /// Builder: attaching this payment method reports a duplicate
    pub fn with_duplicate(self, payment_method_id: impl Into<String>) -> Self {
        self.lock().duplicates.insert(payment_method_id.into());
        self
    }

    /// Builder: every call of `operation` fails with a provider error
    pub fn fail_on(self, operation: MockOperation, status: u16, message: impl Into<String>) -> Self {
        self.lock()
            .failures
            .insert(operation, (status, message.into()));
        self
    }

    /// Current copy of a stored payment method
    pub fn payment_method(&self, id: &str) -> Option<PaymentMethod> {
        self.lock()
            .payment_methods
            .iter()
            .find(|pm| pm.id == id)
            .cloned()
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Recorded calls of one operation
    pub fn calls_of(&self, operation: MockOperation) -> Vec<MockCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    /// Number of recorded calls of one operation
    pub fn count(&self, operation: MockOperation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call and return the locked state, or the injected failure
    fn begin(
        &self,
        operation: MockOperation,
        account_id: &str,
        target: Option<String>,
    ) -> PaymentResult<MutexGuard<'_, MockState>> {
        let mut state = self.lock();
        state.calls.push(MockCall {
            operation,
            account_id: account_id.to_string(),
            target,
        });

        if let Some((status, message)) = state.failures.get(&operation) {
            return Err(provider_error(*status, message.clone()));
        }
        Ok(state)
    }
}

fn provider_error(status: u16, message: impl Into<String>) -> PaymentError {
    PaymentError::ProviderError {
        provider: "mock".to_string(),
        status,
        message: message.into(),
    }
}

fn payment_method_not_found(id: &str) -> PaymentError {
    provider_error(404, format!("PaymentMethod {} not found", id))
}

fn detail<T: serde::de::DeserializeOwned>(
    extra: &Map<String, Value>,
    key: &str,
) -> PaymentResult<Option<T>> {
    extra
        .get(key)
        .map(|v| serde_json::from_value(v.clone()))
        .transpose()
        .map_err(|e| PaymentError::Serialization(format!("Invalid {}: {}", key, e)))
}

#[async_trait]
impl PaymentProcessor for MockProcessor {
    async fn create_payment_intent(
        &self,
        account_id: &str,
        params: &PaymentIntentCreateParams,
    ) -> PaymentResult<PaymentIntent> {
        let mut state = self.begin(MockOperation::CreatePaymentIntent, account_id, None)?;
        let id = state.next_id("pi");
        let intent = PaymentIntent {
            client_secret: Some(format!("{}_secret", id)),
            id,
            amount: params.amount,
            currency: params.currency.clone(),
            status: "requires_payment_method".to_string(),
            extra: params.extra.clone(),
        };
        state.intents.push(intent.clone());
        Ok(intent)
    }

    async fn confirm_payment_intent(
        &self,
        account_id: &str,
        id: &str,
        params: &PaymentIntentConfirmParams,
    ) -> PaymentResult<PaymentIntent> {
        let mut state = self.begin(
            MockOperation::ConfirmPaymentIntent,
            account_id,
            Some(id.to_string()),
        )?;
        let intent = state
            .intents
            .iter_mut()
            .find(|pi| pi.id == id)
            .ok_or_else(|| provider_error(404, format!("PaymentIntent {} not found", id)))?;

        intent.status = "processing".to_string();
        if let Some(pm) = &params.payment_method_id {
            intent
                .extra
                .insert("payment_method_id".to_string(), Value::String(pm.clone()));
        }
        Ok(intent.clone())
    }

    async fn create_payment_method(
        &self,
        account_id: &str,
        params: &PaymentMethodCreateParams,
    ) -> PaymentResult<PaymentMethod> {
        let mut state = self.begin(MockOperation::CreatePaymentMethod, account_id, None)?;
        let mut pm = PaymentMethod::new(state.next_id("pm"), params.method_type);
        pm.card = detail(&params.extra, "card")?;
        pm.ach_debit = detail(&params.extra, "ach_debit")?;
        pm.eft_debit = detail(&params.extra, "eft_debit")?;
        state.payment_methods.push(pm.clone());
        Ok(pm)
    }

    async fn get_payment_method(&self, account_id: &str, id: &str) -> PaymentResult<PaymentMethod> {
        let state = self.begin(
            MockOperation::GetPaymentMethod,
            account_id,
            Some(id.to_string()),
        )?;
        state
            .payment_methods
            .iter()
            .find(|pm| pm.id == id)
            .cloned()
            .ok_or_else(|| payment_method_not_found(id))
    }

    async fn list_payment_methods(
        &self,
        account_id: &str,
        params: &ListPaymentMethodsParams,
    ) -> PaymentResult<PaymentMethodList> {
        let state = self.begin(
            MockOperation::ListPaymentMethods,
            account_id,
            Some(format!("{}:{}", params.customer_id, params.method_type)),
        )?;

        let matching: Vec<PaymentMethod> = state
            .payment_methods
            .iter()
            .filter(|pm| {
                pm.method_type == params.method_type
                    && pm.customer_id.as_deref() == Some(params.customer_id.as_str())
            })
            .cloned()
            .collect();

        let total = matching.len() as u64;
        let offset = params.offset.unwrap_or(0);
        let limit = params.limit.unwrap_or(100);
        let items: Vec<PaymentMethod> = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok(PaymentMethodList {
            has_more: offset + (items.len() as u64) < total,
            items,
            total: Some(total),
            offset: Some(offset),
            limit: Some(limit),
        })
    }

    async fn attach_payment_method(
        &self,
        account_id: &str,
        id: &str,
        params: &PaymentMethodAttachParams,
    ) -> PaymentResult<PaymentMethod> {
        let mut state = self.begin(
            MockOperation::AttachPaymentMethod,
            account_id,
            Some(id.to_string()),
        )?;

        if state.duplicates.contains(id) {
            return Err(PaymentError::DuplicatePaymentMethod {
                message: MOCK_DUPLICATE_MESSAGE.to_string(),
            });
        }

        let pm = state
            .payment_methods
            .iter_mut()
            .find(|pm| pm.id == id)
            .ok_or_else(|| payment_method_not_found(id))?;
        pm.customer_id = Some(params.customer_id.clone());
        Ok(pm.clone())
    }

    async fn create_customer(
        &self,
        account_id: &str,
        params: &CustomerCreateParams,
    ) -> PaymentResult<Customer> {
        let mut state = self.begin(MockOperation::CreateCustomer, account_id, None)?;
        let extra = match serde_json::to_value(params) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => return Err(PaymentError::Serialization(e.to_string())),
        };
        Ok(Customer {
            id: state.next_id("cus"),
            extra,
        })
    }

    async fn create_subscription(
        &self,
        account_id: &str,
        params: &SubscriptionCreateParams,
    ) -> PaymentResult<Subscription> {
        let mut state = self.begin(
            MockOperation::CreateSubscription,
            account_id,
            Some(params.customer_id.clone()),
        )?;
        let mut extra = params.extra.clone();
        extra.insert(
            "customer_id".to_string(),
            Value::String(params.customer_id.clone()),
        );
        extra.insert(
            "payment_method_id".to_string(),
            Value::String(params.payment_method_id.clone()),
        );
        Ok(Subscription {
            id: state.next_id("sub"),
            status: Some("active".to_string()),
            extra,
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment_method::{CardDetails, PaymentMethodType};
    use serde_json::json;

    #[tokio::test]
    async fn test_injected_failure_is_recorded() {
        let mock = MockProcessor::new().fail_on(MockOperation::GetPaymentMethod, 500, "boom");

        let err = mock.get_payment_method("acct_1", "pm_1").await.unwrap_err();
        assert!(matches!(err, PaymentError::ProviderError { status: 500, .. }));
        assert_eq!(mock.calls().len(), 1);
        assert_eq!(mock.calls()[0].account_id, "acct_1");
    }

    #[tokio::test]
    async fn test_list_filters_customer_and_type() {
        let mock = MockProcessor::new()
            .with_payment_method(
                PaymentMethod::card("pm_a", CardDetails::default()).with_customer("cus_1"),
            )
            .with_payment_method(
                PaymentMethod::card("pm_b", CardDetails::default()).with_customer("cus_2"),
            )
            .with_payment_method(
                PaymentMethod::new("pm_c", PaymentMethodType::AchDebit).with_customer("cus_1"),
            );

        let list = mock
            .list_payment_methods(
                "acct_1",
                &ListPaymentMethodsParams::new("cus_1", PaymentMethodType::Card),
            )
            .await
            .unwrap();

        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].id, "pm_a");
        assert!(!list.has_more);
    }

    #[tokio::test]
    async fn test_create_then_confirm_intent() {
        let mock = MockProcessor::new();
        let intent = mock
            .create_payment_intent(
                "acct_1",
                &PaymentIntentCreateParams::new(500, "usd", vec![PaymentMethodType::Card]),
            )
            .await
            .unwrap();
        assert_eq!(intent.status, "requires_payment_method");
        assert!(intent.client_secret.is_some());

        let confirmed = mock
            .confirm_payment_intent(
                "acct_1",
                &intent.id,
                &PaymentIntentConfirmParams {
                    payment_method_id: Some("pm_1".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(confirmed.status, "processing");
        assert_eq!(confirmed.extra["payment_method_id"], json!("pm_1"));
    }

    #[tokio::test]
    async fn test_create_payment_method_reads_card() {
        let mock = MockProcessor::new();
        let mut extra = Map::new();
        extra.insert("card".into(), json!({ "last4": "4242", "brand": "visa" }));

        let pm = mock
            .create_payment_method(
                "acct_1",
                &PaymentMethodCreateParams {
                    method_type: PaymentMethodType::Card,
                    extra,
                },
            )
            .await
            .unwrap();

        assert_eq!(pm.card.unwrap().last4.as_deref(), Some("4242"));
        assert!(mock.payment_method(&pm.id).is_some());
    }
}

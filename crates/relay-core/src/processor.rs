//! # Payment Processor Trait
//!
//! The seam between the relay and the hosted payment processor. The HTTP
//! client in `relay-tilled` implements it for production; `MockProcessor`
//! implements it in memory for tests.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 PaymentProcessor (trait)                 │
//! │  ├── create_payment_intent() / confirm_payment_intent()  │
//! │  ├── create_payment_method() / get_payment_method()      │
//! │  ├── list_payment_methods() / attach_payment_method()    │
//! │  └── create_customer() / create_subscription()           │
//! └──────────────────────────────────────────────────────────┘
//!                 ▲                          ▲
//!        ┌────────┴───────┐         ┌────────┴───────┐
//!        │  TilledClient  │         │ MockProcessor  │
//!        └────────────────┘         └────────────────┘
//! ```
//!
//! Every call is scoped to a merchant account (the tenant header).

use crate::customer::{Customer, CustomerCreateParams, Subscription, SubscriptionCreateParams};
use crate::error::PaymentResult;
use crate::intent::{PaymentIntent, PaymentIntentConfirmParams, PaymentIntentCreateParams};
use crate::payment_method::{
    ListPaymentMethodsParams, PaymentMethod, PaymentMethodAttachParams,
    PaymentMethodCreateParams, PaymentMethodList,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Operations the relay needs from a payment processor.
///
/// Implementations must report a refused duplicate attach as
/// [`PaymentError::DuplicatePaymentMethod`](crate::PaymentError::DuplicatePaymentMethod)
/// so callers never inspect message text.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a payment intent.
    async fn create_payment_intent(
        &self,
        account_id: &str,
        params: &PaymentIntentCreateParams,
    ) -> PaymentResult<PaymentIntent>;

    /// Confirm a payment intent with a payment method.
    async fn confirm_payment_intent(
        &self,
        account_id: &str,
        id: &str,
        params: &PaymentIntentConfirmParams,
    ) -> PaymentResult<PaymentIntent>;

    /// Create a payment method from tokenized form fields.
    async fn create_payment_method(
        &self,
        account_id: &str,
        params: &PaymentMethodCreateParams,
    ) -> PaymentResult<PaymentMethod>;

    /// Fetch a payment method by ID.
    async fn get_payment_method(&self, account_id: &str, id: &str) -> PaymentResult<PaymentMethod>;

    /// List a customer's payment methods of one type, in the processor's order.
    async fn list_payment_methods(
        &self,
        account_id: &str,
        params: &ListPaymentMethodsParams,
    ) -> PaymentResult<PaymentMethodList>;

    /// Attach a payment method to a customer.
    async fn attach_payment_method(
        &self,
        account_id: &str,
        id: &str,
        params: &PaymentMethodAttachParams,
    ) -> PaymentResult<PaymentMethod>;

    /// Create a customer.
    async fn create_customer(
        &self,
        account_id: &str,
        params: &CustomerCreateParams,
    ) -> PaymentResult<Customer>;

    /// Create a subscription.
    async fn create_subscription(
        &self,
        account_id: &str,
        params: &SubscriptionCreateParams,
    ) -> PaymentResult<Subscription>;

    /// Get the provider name (for logging and error reporting).
    fn provider_name(&self) -> &'static str;
}

/// Shared, dynamically dispatched processor
pub type BoxedPaymentProcessor = Arc<dyn PaymentProcessor>;

//! # relay-core
//!
//! Core types and traits for checkout-relay.
//!
//! This crate provides:
//! - `PaymentProcessor` trait, the seam to the hosted payment processor
//! - `PaymentMethod`, `PaymentIntent`, `Customer` and `Subscription` records
//! - `AttachOrReuse`, which attaches a payment method to a customer and
//!   falls back to the customer's existing method when the processor
//!   reports a duplicate card
//! - `PaymentError` for typed error handling
//! - `MockProcessor`, an in-memory processor for tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use relay_core::{AttachOrReuse, AttachOutcome, AttachRequest};
//!
//! let service = AttachOrReuse::new(processor);
//!
//! match service.attach(&AttachRequest::new("acct_1", "pm_2", "cus_1")).await? {
//!     AttachOutcome::Attached(pm) => println!("attached {}", pm.id),
//!     AttachOutcome::Reused(pm) => println!("customer already had {}", pm.id),
//! }
//! ```

pub mod attach;
pub mod customer;
pub mod error;
pub mod fingerprint;
pub mod intent;
pub mod mock;
pub mod payment_method;
pub mod processor;

// Re-exports for convenience
pub use attach::{AttachError, AttachOrReuse, AttachOutcome, AttachRequest, AttachResult};
pub use customer::{Customer, CustomerCreateParams, Subscription, SubscriptionCreateParams};
pub use error::{PaymentError, PaymentResult};
pub use fingerprint::{FieldMatch, Fingerprint, MatchPolicy};
pub use intent::{PaymentIntent, PaymentIntentConfirmParams, PaymentIntentCreateParams};
pub use mock::{MockCall, MockOperation, MockProcessor};
pub use payment_method::{
    AchDebitDetails, CardDetails, EftDebitDetails, ListPaymentMethodsParams, PaymentMethod,
    PaymentMethodAttachParams, PaymentMethodCreateParams, PaymentMethodList, PaymentMethodType,
};
pub use processor::{BoxedPaymentProcessor, PaymentProcessor};

//! # Attach-or-Reuse
//!
//! Attaching a payment method to a customer fails when the processor
//! already holds the same card for that customer under another payment
//! method. Instead of surfacing that failure, the existing method is looked
//! up and returned in place of the new one, so a customer never ends up
//! with two fingerprint-identical methods.
//!
//! ```text
//! attach(pm, cus) ──ok──────────────────────────────▶ Attached(pm)
//!       │
//!       └─ DuplicatePaymentMethod
//!             get(pm) ─▶ list(cus, pm.type) ─▶ first fingerprint match
//!                                                 ├── found ─▶ Reused(existing)
//!                                                 └── none  ─▶ NoMatchingPaymentMethod
//! ```
//!
//! The calls are strictly sequential: the list needs the type from `get`.

use crate::error::PaymentError;
use crate::fingerprint::MatchPolicy;
use crate::payment_method::{ListPaymentMethodsParams, PaymentMethod, PaymentMethodAttachParams};
use crate::processor::BoxedPaymentProcessor;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Attach a payment method to a customer on a merchant account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachRequest {
    pub account_id: String,
    pub payment_method_id: String,
    pub customer_id: String,
}

impl AttachRequest {
    pub fn new(
        account_id: impl Into<String>,
        payment_method_id: impl Into<String>,
        customer_id: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            payment_method_id: payment_method_id.into(),
            customer_id: customer_id.into(),
        }
    }
}

/// Successful attach
#[derive(Debug, Clone, PartialEq)]
pub enum AttachOutcome {
    /// The requested method is now attached
    Attached(PaymentMethod),
    /// The customer already had this card; the existing method is returned
    Reused(PaymentMethod),
}

impl AttachOutcome {
    pub fn payment_method(&self) -> &PaymentMethod {
        match self {
            AttachOutcome::Attached(pm) | AttachOutcome::Reused(pm) => pm,
        }
    }

    pub fn into_payment_method(self) -> PaymentMethod {
        match self {
            AttachOutcome::Attached(pm) | AttachOutcome::Reused(pm) => pm,
        }
    }

    pub fn is_reused(&self) -> bool {
        matches!(self, AttachOutcome::Reused(_))
    }
}

/// Failed attach, by stage
#[derive(Debug, Error)]
pub enum AttachError {
    /// The attach call failed for a reason other than a duplicate
    #[error("Attach failed: {0}")]
    Attach(#[source] PaymentError),

    /// Fetching or listing payment methods failed after a duplicate report
    #[error("Reconciliation failed: {0}")]
    Reconcile(#[source] PaymentError),

    /// A duplicate was reported but none of the customer's methods match
    #[error("No existing payment method of customer {customer_id} matches {payment_method_id}")]
    NoMatchingPaymentMethod {
        payment_method_id: String,
        customer_id: String,
    },
}

impl AttachError {
    /// HTTP status the relay answers with
    pub fn status_code(&self) -> u16 {
        match self {
            AttachError::Attach(_) | AttachError::Reconcile(_) => 500,
            AttachError::NoMatchingPaymentMethod { .. } => 404,
        }
    }

    /// Flatten into the crate-wide error type
    pub fn into_payment_error(self) -> PaymentError {
        match self {
            AttachError::Attach(e) | AttachError::Reconcile(e) => e,
            AttachError::NoMatchingPaymentMethod {
                payment_method_id,
                customer_id,
            } => PaymentError::PaymentMethodNotFound {
                payment_method_id,
                customer_id,
            },
        }
    }
}

/// Result of an attach-or-reuse call
pub type AttachResult = Result<AttachOutcome, AttachError>;

/// Attach-or-reuse service over an injected processor
#[derive(Clone)]
pub struct AttachOrReuse {
    processor: BoxedPaymentProcessor,
    policy: MatchPolicy,
}

impl AttachOrReuse {
    /// Create with the default (any-field) match policy
    pub fn new(processor: BoxedPaymentProcessor) -> Self {
        Self {
            processor,
            policy: MatchPolicy::default(),
        }
    }

    /// Builder: set the fingerprint match policy
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Attach `request.payment_method_id` to `request.customer_id`, reusing
    /// an existing method when the processor reports a duplicate.
    #[instrument(
        skip(self, request),
        fields(
            account = %request.account_id,
            payment_method = %request.payment_method_id,
            customer = %request.customer_id
        )
    )]
    pub async fn attach(&self, request: &AttachRequest) -> AttachResult {
        let params = PaymentMethodAttachParams {
            customer_id: request.customer_id.clone(),
        };

        match self
            .processor
            .attach_payment_method(&request.account_id, &request.payment_method_id, &params)
            .await
        {
            Ok(pm) => {
                info!("Attached payment method {}", pm.id);
                Ok(AttachOutcome::Attached(pm))
            }
            Err(PaymentError::DuplicatePaymentMethod { message }) => {
                info!("Duplicate reported, looking for existing method: {}", message);
                self.reconcile(request).await
            }
            Err(e) => {
                error!("Attach failed: {}", e);
                Err(AttachError::Attach(e))
            }
        }
    }

    async fn reconcile(&self, request: &AttachRequest) -> AttachResult {
        let incoming = self
            .processor
            .get_payment_method(&request.account_id, &request.payment_method_id)
            .await
            .map_err(|e| {
                error!("Failed to fetch payment method: {}", e);
                AttachError::Reconcile(e)
            })?;

        let fingerprint = incoming.fingerprint().ok_or_else(|| {
            AttachError::Reconcile(PaymentError::Internal(format!(
                "payment method {} has no {} details",
                incoming.id, incoming.method_type
            )))
        })?;

        let existing = self
            .processor
            .list_payment_methods(
                &request.account_id,
                &ListPaymentMethodsParams::new(&request.customer_id, incoming.method_type),
            )
            .await
            .map_err(|e| {
                error!("Failed to list payment methods: {}", e);
                AttachError::Reconcile(e)
            })?;

        debug!(
            "Comparing against {} existing {} methods (policy={})",
            existing.items.len(),
            incoming.method_type,
            self.policy
        );

        for candidate in existing.items {
            let Some(result) = candidate.fingerprint().map(|fp| fingerprint.compare(&fp)) else {
                continue;
            };

            if !self.policy.accepts(&result) {
                continue;
            }

            if result.all() {
                info!("Reusing payment method {}", candidate.id);
            } else {
                warn!(
                    "Reusing payment method {} on partial fingerprint match {:?} of {} fields",
                    candidate.id, result.matched, result.compared
                );
            }
            return Ok(AttachOutcome::Reused(candidate));
        }

        warn!("No existing payment method matches {}", incoming.id);
        Err(AttachError::NoMatchingPaymentMethod {
            payment_method_id: request.payment_method_id.clone(),
            customer_id: request.customer_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockOperation, MockProcessor};
    use crate::payment_method::{AchDebitDetails, CardDetails, EftDebitDetails, PaymentMethodType};
    use std::sync::Arc;

    fn card(last4: &str, brand: &str) -> CardDetails {
        CardDetails {
            last4: Some(last4.into()),
            brand: Some(brand.into()),
            ..Default::default()
        }
    }

    fn full_card(last4: &str, brand: &str, month: u32, year: u32, funding: &str) -> CardDetails {
        CardDetails {
            exp_month: Some(month),
            exp_year: Some(year),
            funding: Some(funding.into()),
            ..card(last4, brand)
        }
    }

    fn service(mock: &Arc<MockProcessor>) -> AttachOrReuse {
        AttachOrReuse::new(mock.clone())
    }

    #[tokio::test]
    async fn test_attach_success_returns_vendor_method() {
        let mock = Arc::new(
            MockProcessor::new().with_payment_method(PaymentMethod::card("pm_1", card("4242", "visa"))),
        );

        let outcome = service(&mock)
            .attach(&AttachRequest::new("acct_1", "pm_1", "cus_1"))
            .await
            .unwrap();

        assert!(!outcome.is_reused());
        assert_eq!(outcome.payment_method().id, "pm_1");
        assert_eq!(outcome.payment_method().customer_id.as_deref(), Some("cus_1"));
        assert_eq!(mock.count(MockOperation::GetPaymentMethod), 0);
        assert_eq!(mock.count(MockOperation::ListPaymentMethods), 0);
    }

    #[tokio::test]
    async fn test_duplicate_reuses_first_single_field_match() {
        let mock = Arc::new(
            MockProcessor::new()
                .with_payment_method(
                    PaymentMethod::card("pm_0", card("4242", "mastercard")).with_customer("cus_1"),
                )
                .with_payment_method(
                    PaymentMethod::card("pm_5", card("4242", "visa")).with_customer("cus_1"),
                )
                .with_payment_method(PaymentMethod::card("pm_2", card("4242", "visa")))
                .with_duplicate("pm_2"),
        );

        let outcome = service(&mock)
            .attach(&AttachRequest::new("acct_1", "pm_2", "cus_1"))
            .await
            .unwrap();

        assert!(outcome.is_reused());
        assert_eq!(outcome.payment_method().id, "pm_0");
        assert_eq!(mock.count(MockOperation::AttachPaymentMethod), 1);
        assert_eq!(mock.count(MockOperation::GetPaymentMethod), 1);
        assert_eq!(mock.count(MockOperation::ListPaymentMethods), 1);
    }

    #[tokio::test]
    async fn test_duplicate_without_match_is_no_match() {
        let mock = Arc::new(
            MockProcessor::new()
                .with_payment_method(
                    PaymentMethod::card("pm_9", card("9999", "amex")).with_customer("cus_1"),
                )
                .with_payment_method(PaymentMethod::card("pm_2", card("4242", "visa")))
                .with_duplicate("pm_2"),
        );

        let err = service(&mock)
            .attach(&AttachRequest::new("acct_1", "pm_2", "cus_1"))
            .await
            .unwrap_err();

        assert!(matches!(err, AttachError::NoMatchingPaymentMethod { .. }));
        assert_eq!(err.status_code(), 404);
        assert!(matches!(
            err.into_payment_error(),
            PaymentError::PaymentMethodNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_duplicate_with_empty_customer_list_is_no_match() {
        let mock = Arc::new(
            MockProcessor::new()
                .with_payment_method(PaymentMethod::card("pm_2", card("4242", "visa")))
                .with_duplicate("pm_2"),
        );

        let err = service(&mock)
            .attach(&AttachRequest::new("acct_1", "pm_2", "cus_1"))
            .await
            .unwrap_err();

        match err {
            AttachError::NoMatchingPaymentMethod {
                payment_method_id,
                customer_id,
            } => {
                assert_eq!(payment_method_id, "pm_2");
                assert_eq!(customer_id, "cus_1");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(mock.count(MockOperation::ListPaymentMethods), 1);
    }

    #[tokio::test]
    async fn test_eft_debit_duplicate_reuses_bank_match() {
        let eft = |last2: &str, bank: &str| EftDebitDetails {
            last2: Some(last2.into()),
            bank_name: Some(bank.into()),
            ..Default::default()
        };
        let mock = Arc::new(
            MockProcessor::new()
                .with_payment_method(
                    PaymentMethod::card("pm_card", card("4242", "visa")).with_customer("cus_1"),
                )
                .with_payment_method(
                    PaymentMethod::eft_debit("pm_0", eft("11", "ROYAL BANK")).with_customer("cus_1"),
                )
                .with_payment_method(PaymentMethod::eft_debit("pm_2", eft("42", "ROYAL BANK")))
                .with_duplicate("pm_2"),
        );

        let outcome = service(&mock)
            .attach(&AttachRequest::new("acct_1", "pm_2", "cus_1"))
            .await
            .unwrap();

        assert!(outcome.is_reused());
        assert_eq!(outcome.payment_method().id, "pm_0");
        let list = mock.calls_of(MockOperation::ListPaymentMethods);
        assert_eq!(list[0].target.as_deref(), Some("cus_1:eft_debit"));
    }

    #[tokio::test]
    async fn test_reused_method_is_returned_unchanged() {
        let existing = PaymentMethod::card("pm_0", full_card("4242", "visa", 12, 2030, "credit"))
            .with_customer("cus_1");
        let mock = Arc::new(
            MockProcessor::new()
                .with_payment_method(existing.clone())
                .with_payment_method(PaymentMethod::card(
                    "pm_2",
                    full_card("4242", "visa", 12, 2030, "credit"),
                ))
                .with_duplicate("pm_2"),
        );

        let outcome = service(&mock)
            .attach(&AttachRequest::new("acct_1", "pm_2", "cus_1"))
            .await
            .unwrap();

        assert_eq!(outcome.into_payment_method(), existing);
        assert_eq!(mock.payment_method("pm_0"), Some(existing));
        // pm_2 stays unattached
        assert_eq!(mock.payment_method("pm_2").unwrap().customer_id, None);
        assert_eq!(mock.count(MockOperation::AttachPaymentMethod), 1);
    }

    #[tokio::test]
    async fn test_only_same_type_is_listed() {
        let mock = Arc::new(
            MockProcessor::new()
                .with_payment_method(
                    PaymentMethod::ach_debit(
                        "pm_ach",
                        AchDebitDetails {
                            last2: Some("42".into()),
                            ..Default::default()
                        },
                    )
                    .with_customer("cus_1"),
                )
                .with_payment_method(PaymentMethod::card("pm_2", card("4242", "visa")))
                .with_duplicate("pm_2"),
        );

        let err = service(&mock)
            .attach(&AttachRequest::new("acct_1", "pm_2", "cus_1"))
            .await
            .unwrap_err();

        assert!(matches!(err, AttachError::NoMatchingPaymentMethod { .. }));
        let list = mock.calls_of(MockOperation::ListPaymentMethods);
        assert_eq!(list[0].target.as_deref(), Some("cus_1:card"));
    }

    #[tokio::test]
    async fn test_all_fields_policy_rejects_partial_match() {
        let mock = Arc::new(
            MockProcessor::new()
                .with_payment_method(
                    PaymentMethod::card("pm_0", full_card("4242", "mastercard", 1, 2027, "debit"))
                        .with_customer("cus_1"),
                )
                .with_payment_method(
                    PaymentMethod::card("pm_1", full_card("4242", "visa", 12, 2030, "credit"))
                        .with_customer("cus_1"),
                )
                .with_payment_method(PaymentMethod::card(
                    "pm_2",
                    full_card("4242", "visa", 12, 2030, "credit"),
                ))
                .with_duplicate("pm_2"),
        );

        let outcome = service(&mock)
            .with_policy(MatchPolicy::AllFields)
            .attach(&AttachRequest::new("acct_1", "pm_2", "cus_1"))
            .await
            .unwrap();

        assert_eq!(outcome.payment_method().id, "pm_1");
    }

    #[tokio::test]
    async fn test_other_attach_failure_skips_reconciliation() {
        let mock = Arc::new(
            MockProcessor::new()
                .with_payment_method(PaymentMethod::card("pm_1", card("4242", "visa")))
                .fail_on(MockOperation::AttachPaymentMethod, 400, "Customer not found"),
        );

        let err = service(&mock)
            .attach(&AttachRequest::new("acct_1", "pm_1", "cus_missing"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AttachError::Attach(PaymentError::ProviderError { status: 400, .. })
        ));
        assert_eq!(err.status_code(), 500);
        assert_eq!(mock.count(MockOperation::GetPaymentMethod), 0);
        assert_eq!(mock.count(MockOperation::ListPaymentMethods), 0);
    }

    #[tokio::test]
    async fn test_list_failure_is_reconcile_error() {
        let mock = Arc::new(
            MockProcessor::new()
                .with_payment_method(PaymentMethod::card("pm_2", card("4242", "visa")))
                .with_duplicate("pm_2")
                .fail_on(MockOperation::ListPaymentMethods, 503, "Service unavailable"),
        );

        let err = service(&mock)
            .attach(&AttachRequest::new("acct_1", "pm_2", "cus_1"))
            .await
            .unwrap_err();

        assert!(matches!(err, AttachError::Reconcile(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_missing_details_is_reconcile_error() {
        let mock = Arc::new(
            MockProcessor::new()
                .with_payment_method(PaymentMethod::new("pm_2", PaymentMethodType::Card))
                .with_duplicate("pm_2"),
        );

        let err = service(&mock)
            .attach(&AttachRequest::new("acct_1", "pm_2", "cus_1"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AttachError::Reconcile(PaymentError::Internal(_))
        ));
        assert_eq!(mock.count(MockOperation::ListPaymentMethods), 0);
    }
}

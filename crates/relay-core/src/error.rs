//! # Payment Error Types
//!
//! Typed error handling for checkout-relay.
//! All processor operations return `Result<T, PaymentError>`.

use thiserror::Error;

/// Core error type for all processor operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Network/HTTP error reaching the processor
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The processor refused an attach because the same card is already
    /// on file for the customer under another payment method
    #[error("Duplicate payment method: {message}")]
    DuplicatePaymentMethod { message: String },

    /// A duplicate was reported but no existing method could be matched
    #[error("No existing payment method of customer {customer_id} matches {payment_method_id}")]
    PaymentMethodNotFound {
        payment_method_id: String,
        customer_id: String,
    },

    /// Any other processor-reported failure
    #[error("Provider error [{provider}] ({status}): {message}")]
    ProviderError {
        provider: String,
        status: u16,
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    /// Returns the HTTP status code the relay answers with for this error.
    ///
    /// Vendor-reported failures and unresolved duplicates are 404, input
    /// problems are 400, everything unexpected is 500.
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Configuration(_) => 500,
            PaymentError::InvalidRequest(_) => 400,
            PaymentError::NetworkError(_) => 500,
            PaymentError::DuplicatePaymentMethod { .. } => 404,
            PaymentError::PaymentMethodNotFound { .. } => 404,
            PaymentError::ProviderError { .. } => 404,
            PaymentError::Serialization(_) => 500,
            PaymentError::Internal(_) => 500,
        }
    }
}

/// Result type alias for processor operations
pub type PaymentResult<T> = Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            PaymentError::InvalidRequest("test".into()).status_code(),
            400
        );
        assert_eq!(
            PaymentError::ProviderError {
                provider: "tilled".into(),
                status: 422,
                message: "x".into()
            }
            .status_code(),
            404
        );
        assert_eq!(
            PaymentError::PaymentMethodNotFound {
                payment_method_id: "pm_2".into(),
                customer_id: "cus_1".into()
            }
            .status_code(),
            404
        );
        assert_eq!(PaymentError::NetworkError("reset".into()).status_code(), 500);
    }
}

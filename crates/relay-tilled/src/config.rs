//! # Processor Configuration
//!
//! Configuration for the hosted processor API.
//! The secret key is loaded from environment variables.

use relay_core::PaymentError;
use std::env;
use std::time::Duration;

/// Sandbox API, used unless `TILLED_API_BASE_URL` says otherwise
pub const SANDBOX_API_BASE_URL: &str = "https://sandbox-api.tilled.com";

/// Production API
pub const PRODUCTION_API_BASE_URL: &str = "https://api.tilled.com";

const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Processor API configuration
#[derive(Clone)]
pub struct TilledConfig {
    /// Secret API key (sk_...)
    pub secret_key: String,

    /// API base URL (for sandbox/production/mocking)
    pub api_base_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for TilledConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TilledConfig")
            .field("secret_key", &"sk_***")
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TilledConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `TILLED_SECRET_KEY`
    ///
    /// Optional:
    /// - `TILLED_API_BASE_URL` (default: sandbox)
    /// - `TILLED_TIMEOUT_MS` (default: 2000)
    pub fn from_env() -> Result<Self, PaymentError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let secret_key = env::var("TILLED_SECRET_KEY").map_err(|_| {
            PaymentError::Configuration("TILLED_SECRET_KEY not set".to_string())
        })?;

        let mut config = Self::new(secret_key);
        config.validate()?;

        if let Ok(url) = env::var("TILLED_API_BASE_URL") {
            config = config.with_api_base_url(url.trim_end_matches('/'));
        }

        if let Ok(ms) = env::var("TILLED_TIMEOUT_MS") {
            let ms: u64 = ms.parse().map_err(|_| {
                PaymentError::Configuration(format!("TILLED_TIMEOUT_MS is not a number: {}", ms))
            })?;
            config = config.with_timeout(Duration::from_millis(ms));
        }

        Ok(config)
    }

    /// Create config with explicit values (for testing)
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            api_base_url: SANDBOX_API_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Validate the key format
    pub fn validate(&self) -> Result<(), PaymentError> {
        if !self.secret_key.starts_with("sk_") {
            return Err(PaymentError::Configuration(
                "TILLED_SECRET_KEY must start with sk_".to_string(),
            ));
        }
        Ok(())
    }

    /// Check if pointed at the sandbox
    pub fn is_sandbox(&self) -> bool {
        self.api_base_url == SANDBOX_API_BASE_URL
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.secret_key)
    }

    /// Builder: set custom API base URL
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Builder: set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TilledConfig::new("sk_test_abc123");
        assert!(config.is_sandbox());
        assert_eq!(config.timeout, Duration::from_millis(2000));
        assert!(config.validate().is_ok());

        let config = config.with_api_base_url(PRODUCTION_API_BASE_URL);
        assert!(!config.is_sandbox());
    }

    #[test]
    fn test_key_validation() {
        let config = TilledConfig::new("pk_abc123");
        assert!(matches!(
            config.validate(),
            Err(PaymentError::Configuration(_))
        ));
    }

    #[test]
    fn test_auth_header() {
        let config = TilledConfig::new("sk_test_abc123");
        assert_eq!(config.auth_header(), "Bearer sk_test_abc123");
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = TilledConfig::new("sk_test_abc123");
        assert!(!format!("{:?}", config).contains("abc123"));
    }
}

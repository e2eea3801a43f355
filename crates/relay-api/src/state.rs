//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the injected processor client, the attach-or-reuse service and
//! configuration.

use anyhow::Context;
use relay_core::{AttachOrReuse, BoxedPaymentProcessor, MatchPolicy, PaymentMethodType};
use relay_tilled::TilledClient;
use serde::Deserialize;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Fingerprint match policy for duplicate reconciliation
    pub match_policy: MatchPolicy,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let match_policy = match std::env::var("FINGERPRINT_MATCH") {
            Ok(value) => value.parse().map_err(anyhow::Error::msg)?,
            Err(_) => MatchPolicy::default(),
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5052),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            match_policy,
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid socket address {}:{}", self.host, self.port))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5052,
            environment: "development".to_string(),
            match_policy: MatchPolicy::default(),
        }
    }
}

/// Payment intent created by `GET /secret/{account_id}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SecretIntentDefaults {
    /// Amount in cents
    pub amount: i64,
    pub currency: String,
    pub payment_method_types: Vec<PaymentMethodType>,
}

impl Default for SecretIntentDefaults {
    fn default() -> Self {
        Self {
            amount: 500,
            currency: "usd".to_string(),
            payment_method_types: vec![PaymentMethodType::Card, PaymentMethodType::AchDebit],
        }
    }
}

/// Settings read from `config/relay.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RelaySettings {
    #[serde(default)]
    pub secret_intent: SecretIntentDefaults,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Processor client
    pub processor: BoxedPaymentProcessor,
    /// Attach-or-reuse service over the same processor
    pub attach: AttachOrReuse,
    /// File-based settings
    pub settings: RelaySettings,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState backed by the processor API
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let settings = load_relay_settings()?;

        let client = TilledClient::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize processor client: {}", e))?;

        Ok(Self::with_processor(Arc::new(client), config, settings))
    }

    /// Create with an explicit processor (tests, alternative backends)
    pub fn with_processor(
        processor: BoxedPaymentProcessor,
        config: AppConfig,
        settings: RelaySettings,
    ) -> Self {
        let attach = AttachOrReuse::new(processor.clone()).with_policy(config.match_policy);

        Self {
            processor,
            attach,
            settings,
            config,
        }
    }
}

/// Load relay settings from config file
fn load_relay_settings() -> anyhow::Result<RelaySettings> {
    let config_paths = [
        "config/relay.toml",
        "../config/relay.toml",
        "../../config/relay.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let settings = parse_relay_settings(&content)
                .with_context(|| format!("Failed to parse {}", path))?;
            tracing::info!("Loaded relay settings from {}", path);
            return Ok(settings);
        }
    }

    tracing::warn!("No relay settings found, using defaults");
    Ok(RelaySettings::default())
}

fn parse_relay_settings(content: &str) -> anyhow::Result<RelaySettings> {
    Ok(toml::from_str(content)?)
}

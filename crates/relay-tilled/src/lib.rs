//! # relay-tilled
//!
//! Hosted payment processor client for checkout-relay.
//!
//! `TilledClient` implements `relay_core::PaymentProcessor` over the
//! processor's REST API. It adds the secret key and the merchant account
//! header to each call and turns error responses into typed
//! `PaymentError`s, including the duplicate-card refusal that
//! `AttachOrReuse` reconciles.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use relay_core::{AttachOrReuse, AttachRequest};
//! use relay_tilled::TilledClient;
//! use std::sync::Arc;
//!
//! // Reads TILLED_SECRET_KEY (and optional overrides) from the environment
//! let client = Arc::new(TilledClient::from_env()?);
//!
//! let outcome = AttachOrReuse::new(client)
//!     .attach(&AttachRequest::new("acct_1", "pm_2", "cus_1"))
//!     .await?;
//! ```

pub mod client;
pub mod config;

// Re-exports
pub use client::{TilledClient, ACCOUNT_HEADER, DUPLICATE_CARD_MESSAGE};
pub use config::{TilledConfig, PRODUCTION_API_BASE_URL, SANDBOX_API_BASE_URL};

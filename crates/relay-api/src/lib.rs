//! # relay-api
//!
//! HTTP relay layer for checkout-relay.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Pass-through endpoints for payment intents, payment methods,
//!   customers and subscriptions
//! - The attach endpoint, which reuses a customer's existing card when the
//!   processor reports a duplicate
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/secret/{account_id}` | Client secret for a default payment intent |
//! | POST | `/payment-intents` | Create payment intent |
//! | POST | `/payment-intents/{id}/confirm` | Confirm payment intent |
//! | POST | `/payment-methods` | Create payment method |
//! | POST | `/payment-methods/{id}/attach` | Attach or reuse payment method |
//! | GET | `/listPaymentMethods` | List a customer's payment methods |
//! | POST | `/customers` | Create customer |
//! | POST | `/subscriptions` | Create subscription |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState, RelaySettings, SecretIntentDefaults};

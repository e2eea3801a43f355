//! # Routes
//!
//! Axum router configuration for the relay.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health
/// - GET  /secret/{account_id} - Payment intent client secret with default amount
/// - POST /payment-intents
/// - POST /payment-intents/{id}/confirm
/// - POST /payment-methods
/// - POST /payment-methods/{id}/attach - Attach, or reuse the customer's existing card
/// - GET  /listPaymentMethods?tilled_account=&customer_id=&type=
/// - POST /customers
/// - POST /subscriptions
pub fn create_router(state: AppState) -> Router {
    // Checkout forms are served from other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .route("/secret/{account_id}", get(handlers::get_secret))
        .route("/payment-intents", post(handlers::create_payment_intent))
        .route(
            "/payment-intents/{id}/confirm",
            post(handlers::confirm_payment_intent),
        )
        .route("/payment-methods", post(handlers::create_payment_method))
        .route(
            "/payment-methods/{id}/attach",
            post(handlers::attach_payment_method),
        )
        .route("/listPaymentMethods", get(handlers::list_payment_methods))
        .route("/customers", post(handlers::create_customer))
        .route("/subscriptions", post(handlers::create_subscription))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

//! # checkout-relay
//!
//! Backend relay between browser checkout forms and the payment processor.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export TILLED_SECRET_KEY=sk_...
//!
//! # Run the server
//! checkout-relay
//! ```

use relay_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Payment processor: {}", state.processor.provider_name());
    info!("Fingerprint match policy: {}", state.config.match_policy);
    info!(
        "Default secret intent: {} {}",
        state.settings.secret_intent.amount, state.settings.secret_intent.currency
    );

    // Create router
    let app = routes::create_router(state);

    info!("checkout-relay v{} listening on http://{}", env!("CARGO_PKG_VERSION"), addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Attach: POST http://{}/payment-methods/{{id}}/attach", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! HTTP API server for the menubot gateway

pub mod health;
pub mod webhook;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use secrecy::SecretString;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::channels::Messenger;
use crate::dispatch::Dispatcher;

/// Shared state for API handlers
///
/// Immutable after startup, so concurrent requests share it without locking.
pub struct ApiState {
    /// Secret expected in `hub.verify_token`
    pub verify_token: SecretString,
    /// Outbound messenger replies go through
    pub messenger: Arc<dyn Messenger>,
    /// Menu dispatcher
    pub dispatcher: Dispatcher,
}

/// Build the router with all routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(webhook::verify).post(webhook::receive))
        .with_state(state)
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a server for `state` listening on `port`
    #[must_use]
    pub fn new(state: ApiState, port: u16) -> Self {
        Self {
            state: Arc::new(state),
            port,
        }
    }

    /// Run the API server until the process is interrupted
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

//! Application startup and server initialization.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::ConfigV1;
use crate::routes;
use crate::state::AppState;

/// Builds the state and router, binds, and serves until the process stops.
///
/// # Errors
///
/// Returns an error if the state cannot be built, the address cannot be bound,
/// or the server fails while running.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), String> {
    let state = AppState::from_config(config.clone())?;
    let app = routes::create_router(state);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| format!("Could not bind to {}: {}", address, e))?;
    info!(
        address = %address,
        environment = ?config.environment,
        host = %config.platform.host,
        "Ready"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))
}

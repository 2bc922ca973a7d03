//! Health check endpoints.

use axum::routing::get;

use crate::gate::GatedRouter;
use crate::state::AppState;

/// Registers the liveness probe. Never gated.
pub fn register(routes: GatedRouter<AppState>) -> GatedRouter<AppState> {
    routes.open("/health", get(health_check))
}

/// Returns 200 with "OK" while the process is serving.
async fn health_check() -> &'static str {
    "OK"
}

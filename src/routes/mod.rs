//! HTTP route definitions and the middleware chain around them.
//!
//! Each route module declares its routes together with their protection, so
//! the gate's table is built in the same pass as the router.

pub mod auth_routes;
pub mod graphql_routes;
pub mod health_routes;
pub mod page_routes;
pub mod verify_routes;
pub mod webhook_routes;

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::Router;
use tracing::info;

use crate::gate::{billing_interceptor, session_gate, GateState, GatedRouter, ProtectionTable};
use crate::state::AppState;

/// Registers every route and returns the router with its protection table.
pub fn routes() -> (Router<AppState>, ProtectionTable) {
    let routes = GatedRouter::new();
    let routes = auth_routes::register(routes);
    let routes = webhook_routes::register(routes);
    let routes = verify_routes::register(routes);
    let routes = graphql_routes::register(routes);
    let routes = health_routes::register(routes);
    routes.into_parts()
}

/// Creates the application: routes, page fallback, session gate, and the
/// billing interceptor in front of everything.
pub fn create_router(state: AppState) -> Router {
    let (router, table) = routes();
    info!("Session gate protects {} route entries", table.len());

    let gate = GateState {
        app: state.clone(),
        table: Arc::new(table),
    };

    router
        .fallback(page_routes::page_fallback)
        .layer(from_fn_with_state(gate, session_gate))
        .layer(from_fn_with_state(state.clone(), billing_interceptor))
        .with_state(state)
}

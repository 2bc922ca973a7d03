//! Session check used by the front-end before it renders.

use std::collections::HashMap;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::gate::GatedRouter;
use crate::models::TenantSession;
use crate::state::AppState;

pub const VERIFY_TOKEN_PATH: &str = "/verify_token";

/// Registers `/verify_token`, gated for every method.
pub fn register(routes: GatedRouter<AppState>) -> GatedRouter<AppState> {
    routes.protected_any(VERIFY_TOKEN_PATH, get(verify_token))
}

/// Reached only when the gate accepted the session token and found a durable
/// token for its tenant.
async fn verify_token(
    Extension(session): Extension<TenantSession>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if let Some(requested) = params.get("shop") {
        if !requested.eq_ignore_ascii_case(session.shop.as_str()) {
            warn!(
                token_shop = %session.shop,
                requested = %requested,
                "Session token belongs to another shop"
            );
            return (
                StatusCode::FORBIDDEN,
                Json(json!({ "status": "shop_mismatch" })),
            );
        }
    }
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "shop": session.shop })),
    )
}

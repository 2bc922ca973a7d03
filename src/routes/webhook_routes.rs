//! Receiver for platform webhook deliveries.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::routing::post;
use serde_json::Value;
use tracing::{info, warn};

use super::page_routes::page_fallback;
use crate::gate::GatedRouter;
use crate::platform::webhooks::{verify_delivery, HMAC_HEADER, PRODUCTS_CREATE, SHOP_HEADER, TOPIC_HEADER};
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

/// Registers the delivery endpoint. Only POST is gated; other methods are
/// answered like any unknown path: the page shell for reads, 405 otherwise.
pub fn register(routes: GatedRouter<AppState>) -> GatedRouter<AppState> {
    routes.protected(
        PRODUCTS_CREATE.path,
        &[Method::POST],
        post(receive_products_create).fallback(page_fallback),
    )
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn receive_products_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, HTTPError> {
    let signature = header(&headers, HMAC_HEADER)
        .ok_or_else(|| HTTPError::new(StatusCode::UNAUTHORIZED, "Missing webhook signature"))?;
    if !verify_delivery(&body, signature, &state.config.platform.api_secret) {
        warn!("Webhook delivery with invalid signature");
        return Err(HTTPError::new(
            StatusCode::UNAUTHORIZED,
            "Invalid webhook signature",
        ));
    }

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| HTTPError::bad_request(format!("Invalid webhook body: {}", e)))?;
    info!(
        topic = header(&headers, TOPIC_HEADER).unwrap_or(PRODUCTS_CREATE.graphql_name),
        shop = header(&headers, SHOP_HEADER).unwrap_or("unknown"),
        payload = %payload,
        "Received webhook"
    );
    Ok(StatusCode::OK)
}

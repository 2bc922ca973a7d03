use std::collections::HashMap;

use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::info;

use crate::models::ShopDomain;
use crate::state::AppState;
use crate::utils::http_helpers::{found, HTTPError};

/// Where the platform returns the merchant after a billing confirmation.
pub const CHARGE_PATH: &str = "/charge";

/// Middleware: `/charge` never reaches the gate or the router. The merchant is
/// sent back to the app inside the platform admin, trusting only the `shop`
/// query parameter. `charge_id` is ignored.
pub async fn billing_interceptor(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if request.uri().path() != CHARGE_PATH {
        return next.run(request).await;
    }

    match charge_return_location(&state, &request) {
        Ok(location) => {
            info!(location = %location, "Billing return; redirecting to app page");
            found(&location).into_response()
        }
        Err(e) => e.into_response(),
    }
}

fn charge_return_location(state: &AppState, request: &Request) -> Result<String, HTTPError> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .map_err(|e| HTTPError::bad_request(e.to_string()))?;
    let shop = params
        .get("shop")
        .ok_or_else(|| HTTPError::bad_request("Missing shop parameter"))?;
    let shop = ShopDomain::parse(shop).map_err(HTTPError::bad_request)?;

    let platform = &state.config.platform;
    Ok(format!(
        "{}/apps/{}",
        platform.admin_base(&shop),
        platform.api_key
    ))
}

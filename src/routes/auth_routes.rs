//! Install / OAuth handshake.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::Duration;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::gate::GatedRouter;
use crate::models::ShopDomain;
use crate::platform::oauth::{authorize_url, verify_query_signature, CALLBACK_PATH};
use crate::platform::webhooks::PRODUCTS_CREATE;
use crate::state::AppState;
use crate::utils::http_helpers::{found, HTTPError};

pub const AUTH_PATH: &str = "/auth";
pub const STATE_COOKIE: &str = "appgate_oauth_state";

/// Registers the handshake routes. Neither is gated.
pub fn register(routes: GatedRouter<AppState>) -> GatedRouter<AppState> {
    routes
        .open(AUTH_PATH, get(begin_install))
        .open(CALLBACK_PATH, get(complete_install))
}

#[derive(Deserialize)]
struct BeginQuery {
    shop: Option<String>,
}

fn require_shop(raw: Option<&String>) -> Result<ShopDomain, HTTPError> {
    let raw = raw.ok_or_else(|| HTTPError::bad_request("Missing shop parameter"))?;
    ShopDomain::parse(raw).map_err(HTTPError::bad_request)
}

/// The nonce cookie, scoped to the handshake paths.
fn state_cookie(state: &AppState, value: String) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, value))
        .path(AUTH_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.platform.host.starts_with("https://"))
        .max_age(Duration::minutes(10))
        .build()
}

/// Sends the merchant to the platform's consent screen, remembering a nonce
/// that the callback must echo back.
async fn begin_install(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<BeginQuery>,
) -> Result<(CookieJar, Response), HTTPError> {
    let shop = require_shop(query.shop.as_ref())?;
    let nonce = Uuid::new_v4().to_string();
    let url = authorize_url(&state.config.platform, &shop, &nonce)
        .map_err(|e| HTTPError::new(StatusCode::INTERNAL_SERVER_ERROR, e))?;

    info!(shop = %shop, "Starting install handshake");
    let response = found(&url)?;
    Ok((jar.add(state_cookie(&state, nonce)), response))
}

/// Verifies the platform's callback, trades the code for a durable token,
/// stores it, then registers webhooks. Registration failures are only logged.
async fn complete_install(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<(CookieJar, Response), HTTPError> {
    let platform = &state.config.platform;
    if !verify_query_signature(&params, &platform.api_secret) {
        warn!("Install callback with invalid signature");
        return Err(HTTPError::new(
            StatusCode::UNAUTHORIZED,
            "Invalid callback signature",
        ));
    }

    let param = |name: &str| {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };
    let shop = require_shop(param("shop").as_ref())?;
    let code = param("code").ok_or_else(|| HTTPError::bad_request("Missing code parameter"))?;

    let expected = jar
        .get(STATE_COOKIE)
        .map(|cookie| cookie.value_trimmed().to_string());
    if expected.is_none() || expected != param("state") {
        warn!(shop = %shop, "Install callback state does not match cookie");
        return Err(HTTPError::new(StatusCode::FORBIDDEN, "OAuth state mismatch"));
    }

    let access_token = state
        .platform
        .exchange_code(&shop, &code)
        .await
        .map_err(|e| HTTPError::new(StatusCode::BAD_GATEWAY, e))?;

    state
        .store
        .put(&shop, access_token.clone())
        .await
        .map_err(|e| HTTPError::new(StatusCode::INTERNAL_SERVER_ERROR, e))?;
    info!(shop = %shop, "Tenant installed");

    match state
        .platform
        .register_webhook(&shop, &access_token, &PRODUCTS_CREATE)
        .await
    {
        Ok(id) => info!(shop = %shop, subscription = %id, "Successfully registered webhook"),
        Err(e) => warn!(shop = %shop, "Failed to register webhook: {}", e),
    }

    let response = found(&format!("/?shop={}", shop))?;
    let cleared = Cookie::build(STATE_COOKIE).path(AUTH_PATH).build();
    Ok((jar.remove(cleared), response))
}

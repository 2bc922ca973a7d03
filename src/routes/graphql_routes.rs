//! GraphQL proxy to the tenant's admin API.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_LENGTH, COOKIE, HOST};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use axum::routing::any;
use axum::Extension;
use tracing::{debug, error};

use crate::gate::GatedRouter;
use crate::models::TenantSession;
use crate::state::AppState;
use crate::utils::http_helpers::{is_hop_by_hop_header, HTTPError};

pub const GRAPHQL_PATH: &str = "/graphql";

/// Registers the proxy, gated for every method.
pub fn register(routes: GatedRouter<AppState>) -> GatedRouter<AppState> {
    routes.protected_any(GRAPHQL_PATH, any(proxy_graphql))
}

/// Headers from the browser that must not reach the platform.
fn is_local_header(name: &str) -> bool {
    is_hop_by_hop_header(name)
        || name.eq_ignore_ascii_case(HOST.as_str())
        || name.eq_ignore_ascii_case(AUTHORIZATION.as_str())
        || name.eq_ignore_ascii_case(COOKIE.as_str())
        || name.eq_ignore_ascii_case(CONTENT_LENGTH.as_str())
}

/// Forwards the request unchanged except for the credential: the caller's
/// session token is replaced by the tenant's durable token.
async fn proxy_graphql(
    State(state): State<AppState>,
    Extension(session): Extension<TenantSession>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, HTTPError> {
    let url = state.config.platform.graphql_endpoint(&session.shop);
    debug!(
        shop = %session.shop,
        sid = ?session.claims.sid,
        %method,
        url = %url,
        "Proxying GraphQL request"
    );

    let mut upstream = state.platform.http().request(method, &url).body(body);
    for (name, value) in headers.iter() {
        if !is_local_header(name.as_str()) {
            upstream = upstream.header(name, value);
        }
    }
    upstream = upstream.header(AUTHORIZATION, session.access_token.bearer());

    let upstream_response = upstream.send().await.map_err(|e| {
        error!(shop = %session.shop, "GraphQL upstream request failed: {}", e);
        HTTPError::new(StatusCode::BAD_GATEWAY, "Upstream GraphQL request failed")
    })?;

    let status = upstream_response.status();
    let upstream_headers = upstream_response.headers().clone();
    let bytes = upstream_response.bytes().await.map_err(|e| {
        error!(shop = %session.shop, "Failed to read GraphQL upstream body: {}", e);
        HTTPError::new(StatusCode::BAD_GATEWAY, "Upstream GraphQL response unreadable")
    })?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    for (name, value) in upstream_headers.iter() {
        if !is_hop_by_hop_header(name.as_str()) && *name != CONTENT_LENGTH {
            response.headers_mut().append(name.clone(), value.clone());
        }
    }
    Ok(response)
}

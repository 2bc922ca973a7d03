use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, Request, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{debug, error, warn};

use super::protection::ProtectionTable;
use crate::models::{ShopDomain, TenantSession};
use crate::routes::auth_routes::AUTH_PATH;
use crate::state::AppState;
use crate::utils::http_helpers::bearer_token;

/// State handed to the gate middleware: the app plus the frozen table.
#[derive(Clone)]
pub struct GateState {
    pub app: AppState,
    pub table: Arc<ProtectionTable>,
}

/// Why a protected request was sent back to the install handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    MissingToken,
    InvalidToken,
    NotInstalled,
    StoreUnavailable,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::MissingToken => "missing_token",
            DenialReason::InvalidToken => "invalid_token",
            DenialReason::NotInstalled => "not_installed",
            DenialReason::StoreUnavailable => "store_unavailable",
        }
    }
}

/// A denied request. Renders as a 302 into `/auth` with a JSON body whose
/// `status` names the reason, so scripted callers can tell it from success.
#[derive(Debug)]
pub struct GateDenial {
    pub reason: DenialReason,
    pub shop: Option<ShopDomain>,
}

impl GateDenial {
    pub fn location(&self) -> String {
        match &self.shop {
            Some(shop) => format!("{}?shop={}", AUTH_PATH, shop),
            None => AUTH_PATH.to_string(),
        }
    }
}

impl IntoResponse for GateDenial {
    fn into_response(self) -> Response {
        let location = self.location();
        // ShopDomain only holds hostname characters, so this always succeeds.
        let header =
            HeaderValue::from_str(&location).unwrap_or_else(|_| HeaderValue::from_static(AUTH_PATH));
        (
            StatusCode::FOUND,
            [(LOCATION, header)],
            Json(json!({
                "status": self.reason.as_str(),
                "redirect": location,
            })),
        )
            .into_response()
    }
}

fn query_params(uri: &Uri) -> HashMap<String, String> {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .map(|Query(params)| params)
        .unwrap_or_default()
}

/// Resolves the caller's session token to the tenant's durable token.
///
/// The token comes from `Authorization: Bearer`, falling back to the `token`
/// query parameter.
pub async fn authorize(
    app: &AppState,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<TenantSession, GateDenial> {
    let params = query_params(uri);
    let query_shop = params.get("shop").and_then(|s| ShopDomain::parse(s).ok());

    let token = match bearer_token(headers).or(params.get("token").map(String::as_str)) {
        Some(token) => token,
        None => {
            return Err(GateDenial {
                reason: DenialReason::MissingToken,
                shop: query_shop,
            })
        }
    };

    let (shop, claims) = app.sessions.verify(token).map_err(|e| {
        warn!(path = %uri.path(), "Session token rejected: {}", e);
        GateDenial {
            reason: DenialReason::InvalidToken,
            shop: query_shop.clone(),
        }
    })?;

    match app.store.get(&shop).await {
        Ok(Some(access_token)) => Ok(TenantSession {
            shop,
            access_token,
            claims,
        }),
        Ok(None) => {
            warn!(shop = %shop, "No durable token stored; redirecting to install");
            Err(GateDenial {
                reason: DenialReason::NotInstalled,
                shop: Some(shop),
            })
        }
        Err(e) => {
            error!(shop = %shop, store = app.store.name(), "Token lookup failed: {}", e);
            Err(GateDenial {
                reason: DenialReason::StoreUnavailable,
                shop: Some(shop),
            })
        }
    }
}

/// Middleware: requests matching the protection table must carry a valid
/// session for an installed tenant; everything else passes untouched.
pub async fn session_gate(
    State(gate): State<GateState>,
    mut request: Request,
    next: Next,
) -> Response {
    if !gate
        .table
        .is_protected(request.method(), request.uri().path())
    {
        return next.run(request).await;
    }

    debug!(method = %request.method(), path = %request.uri().path(), "Gating request");
    let outcome = authorize(&gate.app, request.headers(), request.uri()).await;
    match outcome {
        Ok(session) => {
            debug!(shop = %session.shop, "Session accepted");
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(denial) => denial.into_response(),
    }
}

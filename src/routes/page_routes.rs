//! Fallback for everything not routed elsewhere: the front-end shell.
//!
//! Pages and assets are never gated; the shell's bootstrap script is what
//! obtains and verifies a session before the app renders.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};

use crate::models::ShopDomain;
use crate::state::AppState;

/// Serves the application shell for GET and HEAD.
async fn render_page(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<String> {
    // Only a validated domain is echoed into the markup.
    let shop = params
        .get("shop")
        .and_then(|s| ShopDomain::parse(s).ok())
        .map(|s| s.to_string())
        .unwrap_or_default();
    Html(format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html>\n<head>\n<meta charset=\"utf-8\" />\n<title>App</title>\n</head>\n",
            "<body>\n<div id=\"app\" data-api-key=\"{}\" data-shop=\"{}\"></div>\n",
            "</body>\n</html>\n"
        ),
        html_attr(&state.config.platform.api_key),
        shop
    ))
}

/// Router fallback: the shell for reads, 405 for anything else.
pub async fn page_fallback(
    state: State<AppState>,
    query: Query<HashMap<String, String>>,
    method: Method,
) -> Response {
    if method == Method::GET || method == Method::HEAD {
        render_page(state, query).await.into_response()
    } else {
        StatusCode::METHOD_NOT_ALLOWED.into_response()
    }
}

fn html_attr(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '"' => "&quot;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            other => other.to_string(),
        })
        .collect()
}

#![allow(dead_code)]

use std::sync::Arc;

use appgate::config::{extract_config, ConfigV1};
use appgate::models::ShopDomain;
use appgate::routes::create_router;
use appgate::state::AppState;
use appgate::store::{MemoryStore, TokenStore};
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::Utc;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

pub const API_KEY: &str = "test-api-key";
pub const API_SECRET: &str = "test-api-secret";
pub const APP_HOST: &str = "https://app.example.com";

/// Config pointing the tenant admin API at `admin_url` ("{shop}" is substituted).
pub fn test_config(admin_url: &str) -> ConfigV1 {
    let yaml = format!(
        r#"
version: "1.0.0"
port: 3000
environment: development
logging:
  level: "debug"
  format: "json"
platform:
  api_key: "{API_KEY}"
  api_secret: "{API_SECRET}"
  host: "{APP_HOST}"
  admin_url: "{admin_url}"
  upstream_timeout_in_ms: 3000
store:
  type: memory
"#
    );
    extract_config(Figment::new().merge(Yaml::string(&yaml))).expect("Failed to parse test config")
}

/// Admin URL template routed to a mock server.
pub fn mock_admin_url(server_url: &str) -> String {
    format!("{}/{{shop}}/admin", server_url)
}

pub fn build_app(config: ConfigV1) -> (Router, Arc<dyn TokenStore>) {
    let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::new());
    let state =
        AppState::with_store(Arc::new(config), store.clone()).expect("Failed to build app state");
    (create_router(state), store)
}

pub fn shop(domain: &str) -> ShopDomain {
    ShopDomain::parse(domain).expect("valid shop domain")
}

/// A session token as the platform would issue it for `shop`.
pub fn session_token(shop: &str) -> String {
    session_token_with(shop, API_SECRET, Utc::now().timestamp() + 60)
}

pub fn session_token_with(shop: &str, secret: &str, exp: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = json!({
        "iss": format!("https://{}/admin", shop),
        "dest": format!("https://{}", shop),
        "aud": API_KEY,
        "sub": "1",
        "exp": exp,
        "nbf": now - 5,
        "iat": now - 5,
        "jti": "test-jti",
        "sid": "test-sid",
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to mint session token")
}

pub fn request(method: Method, path: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub fn request_with_bearer(method: Method, path: &str, token: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(body)
        .expect("failed to build request")
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get("location")
        .expect("Location header missing")
        .to_str()
        .expect("Location header not valid UTF-8")
        .to_string()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body")
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("body is not JSON")
}

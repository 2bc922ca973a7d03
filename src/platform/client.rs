use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::webhooks::{WebhookTopic, SUBSCRIPTION_CREATE_MUTATION};
use crate::config::PlatformConfig;
use crate::models::{AccessToken, ShopDomain};

/// HTTP client for the platform's admin API, shared by every request.
#[derive(Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    config: Arc<PlatformConfig>,
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    #[serde(default)]
    scope: Option<String>,
}

impl PlatformClient {
    pub fn new(config: Arc<PlatformConfig>) -> Result<Self, String> {
        let mut builder = reqwest::Client::builder();
        if let Some(ms) = config.upstream_timeout_in_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let http = builder
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
        Ok(Self { http, config })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Trades a one-time authorization code for the tenant's durable token.
    pub async fn exchange_code(&self, shop: &ShopDomain, code: &str) -> Result<AccessToken, String> {
        let url = format!("{}/oauth/access_token", self.config.admin_base(shop));
        debug!(shop = %shop, "Exchanging authorization code");

        let resp = self
            .http
            .post(&url)
            .json(&json!({
                "client_id": self.config.api_key,
                "client_secret": self.config.api_secret,
                "code": code,
            }))
            .send()
            .await
            .map_err(|e| format!("Failed to call token endpoint: {}", e))?;

        if !resp.status().is_success() {
            return Err(format!("Token exchange failed: {}", resp.status()));
        }

        let body: AccessTokenResponse = resp
            .json()
            .await
            .map_err(|e| format!("Failed to parse access token JSON: {}", e))?;

        info!(shop = %shop, scope = ?body.scope, "Obtained durable access token");
        Ok(AccessToken::new(body.access_token))
    }

    /// Subscribes this app to `topic` for `shop`, returning the subscription id.
    pub async fn register_webhook(
        &self,
        shop: &ShopDomain,
        token: &AccessToken,
        topic: &WebhookTopic,
    ) -> Result<String, String> {
        let callback_url = self.config.app_url(topic.path);
        let payload = json!({
            "query": SUBSCRIPTION_CREATE_MUTATION,
            "variables": {
                "topic": topic.graphql_name,
                "webhookSubscription": {
                    "callbackUrl": callback_url,
                    "format": "JSON",
                },
            },
        });

        let resp = self
            .http
            .post(self.config.graphql_endpoint(shop))
            .header(reqwest::header::AUTHORIZATION, token.bearer())
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("Failed to call GraphQL endpoint: {}", e))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| format!("Failed to parse registration response: {}", e))?;
        if !status.is_success() {
            return Err(format!("Registration returned {}: {}", status, body));
        }
        subscription_id(&body)
    }
}

/// Pulls the subscription id out of a `webhookSubscriptionCreate` response,
/// treating GraphQL errors and user errors as failures.
fn subscription_id(body: &Value) -> Result<String, String> {
    if let Some(errors) = body.get("errors") {
        return Err(format!("GraphQL errors: {}", errors));
    }
    let result = &body["data"]["webhookSubscriptionCreate"];
    if let Some(user_errors) = result["userErrors"].as_array() {
        if !user_errors.is_empty() {
            return Err(format!("User errors: {}", Value::from(user_errors.clone())));
        }
    }
    result["webhookSubscription"]["id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("No subscription in response: {}", body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::webhooks::PRODUCTS_CREATE;
    use mockito::{Matcher, Server};

    fn client(server_url: &str) -> PlatformClient {
        let config = PlatformConfig {
            api_key: "app-key".to_string(),
            api_secret: "app-secret".to_string(),
            host: "https://app.example.com".to_string(),
            scopes: vec!["read_products".to_string()],
            api_version: "2020-07".to_string(),
            admin_url: format!("{}/{{shop}}/admin", server_url),
            session_leeway_secs: 0,
            upstream_timeout_in_ms: Some(2000),
        };
        PlatformClient::new(Arc::new(config)).expect("client should build")
    }

    fn shop() -> ShopDomain {
        ShopDomain::parse("shop1.example").unwrap()
    }

    #[tokio::test]
    async fn test_exchange_code_success() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/shop1.example/admin/oauth/access_token")
            .match_body(Matcher::PartialJson(json!({
                "client_id": "app-key",
                "client_secret": "app-secret",
                "code": "c0de"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "abc123", "scope": "read_products"}"#)
            .create_async()
            .await;

        let token = client(&server.url()).exchange_code(&shop(), "c0de").await;
        m.assert_async().await;
        assert_eq!(token, Ok(AccessToken::new("abc123")));
    }

    #[tokio::test]
    async fn test_exchange_code_failure_status() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/shop1.example/admin/oauth/access_token")
            .with_status(400)
            .with_body(r#"{"error": "invalid_request"}"#)
            .create_async()
            .await;

        let result = client(&server.url()).exchange_code(&shop(), "bad").await;
        m.assert_async().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_register_webhook_success() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/shop1.example/admin/api/2020-07/graphql.json")
            .match_header("authorization", "Bearer abc123")
            .match_body(Matcher::PartialJson(json!({
                "variables": {
                    "topic": "PRODUCTS_CREATE",
                    "webhookSubscription": {
                        "callbackUrl": "https://app.example.com/webhooks/products/create"
                    }
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data": {"webhookSubscriptionCreate": {"userErrors": [], "webhookSubscription": {"id": "gid://WebhookSubscription/1"}}}}"#,
            )
            .create_async()
            .await;

        let id = client(&server.url())
            .register_webhook(&shop(), &AccessToken::new("abc123"), &PRODUCTS_CREATE)
            .await;
        m.assert_async().await;
        assert_eq!(id, Ok("gid://WebhookSubscription/1".to_string()));
    }

    #[tokio::test]
    async fn test_register_webhook_user_errors() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/shop1.example/admin/api/2020-07/graphql.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data": {"webhookSubscriptionCreate": {"userErrors": [{"field": ["callbackUrl"], "message": "Address for this topic has already been taken"}], "webhookSubscription": null}}}"#,
            )
            .create_async()
            .await;

        let result = client(&server.url())
            .register_webhook(&shop(), &AccessToken::new("abc123"), &PRODUCTS_CREATE)
            .await;
        m.assert_async().await;
        let err = result.unwrap_err();
        assert!(err.contains("already been taken"), "unexpected error: {}", err);
    }
}

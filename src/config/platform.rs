use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::ShopDomain;

/// Credentials and endpoints for talking to the host platform.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct PlatformConfig {
    pub api_key: String,
    pub api_secret: String,
    /// Public origin of this app, e.g. "https://app.example.com".
    pub host: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Admin base URL for a tenant. "{shop}" is replaced by the tenant domain.
    #[serde(default = "default_admin_url")]
    pub admin_url: String,
    /// Clock skew tolerated when checking session token exp/nbf.
    #[serde(default = "default_session_leeway_secs")]
    pub session_leeway_secs: u64,
    /// Client-wide timeout for upstream calls; unset keeps the client default.
    #[serde(default)]
    pub upstream_timeout_in_ms: Option<u64>,
}

impl PlatformConfig {
    /// Admin base URL for the given tenant, without a trailing slash.
    pub fn admin_base(&self, shop: &ShopDomain) -> String {
        self.admin_url
            .replace("{shop}", shop.as_str())
            .trim_end_matches('/')
            .to_string()
    }

    /// The upstream GraphQL endpoint for the given tenant.
    pub fn graphql_endpoint(&self, shop: &ShopDomain) -> String {
        format!(
            "{}/api/{}/graphql.json",
            self.admin_base(shop),
            self.api_version
        )
    }

    /// Absolute URL on this app's public origin.
    pub fn app_url(&self, path: &str) -> String {
        format!("{}{}", self.host.trim_end_matches('/'), path)
    }
}

fn default_scopes() -> Vec<String> {
    vec!["read_products".to_string(), "write_products".to_string()]
}

fn default_api_version() -> String {
    "2020-07".to_string()
}

fn default_admin_url() -> String {
    "https://{shop}/admin".to_string()
}

fn default_session_leeway_secs() -> u64 {
    5
}

//! Webhook topics this app subscribes to, and verification of deliveries.

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the base64 HMAC-SHA256 of the raw delivery body.
pub const HMAC_HEADER: &str = "x-platform-hmac-sha256";
pub const TOPIC_HEADER: &str = "x-platform-topic";
pub const SHOP_HEADER: &str = "x-platform-shop-domain";

/// A subscription registered once per install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookTopic {
    /// Enum value in the platform's GraphQL schema.
    pub graphql_name: &'static str,
    /// Path on this app that receives deliveries.
    pub path: &'static str,
}

pub const PRODUCTS_CREATE: WebhookTopic = WebhookTopic {
    graphql_name: "PRODUCTS_CREATE",
    path: "/webhooks/products/create",
};

pub(crate) const SUBSCRIPTION_CREATE_MUTATION: &str = r#"mutation webhookSubscriptionCreate($topic: WebhookSubscriptionTopic!, $webhookSubscription: WebhookSubscriptionInput!) {
  webhookSubscriptionCreate(topic: $topic, webhookSubscription: $webhookSubscription) {
    userErrors { field message }
    webhookSubscription { id }
  }
}"#;

/// Checks a delivery's signature header against the raw body.
pub fn verify_delivery(body: &[u8], signature: &str, secret: &str) -> bool {
    let Ok(provided) = general_purpose::STANDARD.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&provided).is_ok()
}

/// Base64 HMAC-SHA256 of `body`, as the platform computes it.
pub fn sign_delivery(body: &[u8], secret: &str) -> Result<String, String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| format!("Invalid HMAC key: {}", e))?;
    mac.update(body);
    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

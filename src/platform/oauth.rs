//! Pieces of the install handshake that need no network access.

use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::Sha256;

use crate::config::PlatformConfig;
use crate::models::ShopDomain;

type HmacSha256 = Hmac<Sha256>;

/// Path the platform sends the merchant back to after consent.
pub const CALLBACK_PATH: &str = "/auth/callback";

/// URL of the platform's consent screen for `shop`.
pub fn authorize_url(
    config: &PlatformConfig,
    shop: &ShopDomain,
    state: &str,
) -> Result<String, String> {
    let base = format!("{}/oauth/authorize", config.admin_base(shop));
    let scope = config.scopes.join(",");
    let redirect_uri = config.app_url(CALLBACK_PATH);
    let url = Url::parse_with_params(
        &base,
        &[
            ("client_id", config.api_key.as_str()),
            ("scope", scope.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("state", state),
        ],
    )
    .map_err(|e| format!("Failed to build authorize URL: {}", e))?;
    Ok(url.to_string())
}

/// The string the platform signs: every query pair except `hmac` (and the
/// legacy `signature`), sorted by key, joined as `k=v` with `&`.
pub fn signing_message(params: &[(String, String)]) -> String {
    let mut pairs: Vec<_> = params
        .iter()
        .filter(|(k, _)| k != "hmac" && k != "signature")
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Checks the hex HMAC-SHA256 the platform attaches to callback query strings.
pub fn verify_query_signature(params: &[(String, String)], secret: &str) -> bool {
    let Some(provided) = params
        .iter()
        .find(|(k, _)| k == "hmac")
        .and_then(|(_, v)| hex::decode(v).ok())
    else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(signing_message(params).as_bytes());
    mac.verify_slice(&provided).is_ok()
}

/// Hex HMAC-SHA256 of the signing message; used by tests and tooling that
/// need to produce a valid callback.
pub fn sign_query(params: &[(String, String)], secret: &str) -> Result<String, String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| format!("Invalid HMAC key: {}", e))?;
    mac.update(signing_message(params).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

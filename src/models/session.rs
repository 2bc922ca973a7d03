use std::fmt;

use serde::{Deserialize, Serialize};

use super::shop::ShopDomain;

/// Claims carried by a platform-issued session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// "https://{shop}/admin"
    pub iss: String,
    /// "https://{shop}"
    pub dest: String,
    /// The app's API key.
    pub aud: String,
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub jti: Option<String>,
    #[serde(default)]
    pub sid: Option<String>,
}

impl SessionClaims {
    /// The tenant this token was issued for, taken from `dest`.
    pub fn shop(&self) -> Result<ShopDomain, String> {
        let host = self
            .dest
            .strip_prefix("https://")
            .ok_or_else(|| format!("Session token dest is not https: '{}'", self.dest))?;
        let shop = ShopDomain::parse(host.trim_end_matches('/'))?;

        // iss must point at the same tenant's admin.
        let expected_iss = format!("https://{}/admin", shop);
        if self.iss.trim_end_matches('/') != expected_iss {
            return Err(format!(
                "Session token iss '{}' does not match dest '{}'",
                self.iss, self.dest
            ));
        }
        Ok(shop)
    }
}

/// A durable (offline) access token. Debug output is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        AccessToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// What the session gate attaches to a request it lets through.
#[derive(Debug, Clone)]
pub struct TenantSession {
    pub shop: ShopDomain,
    pub access_token: AccessToken,
    pub claims: SessionClaims,
}

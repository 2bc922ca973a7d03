use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tracing::debug;

use crate::config::PlatformConfig;
use crate::models::{SessionClaims, ShopDomain};

/// Verifies platform-issued session tokens (HS256, keyed by the app secret).
#[derive(Clone)]
pub struct SessionTokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl SessionTokenVerifier {
    pub fn new(config: &PlatformConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.api_key.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud"]);
        validation.validate_nbf = true;
        validation.leeway = config.session_leeway_secs;

        Self {
            key: DecodingKey::from_secret(config.api_secret.as_bytes()),
            validation,
        }
    }

    /// Checks signature, expiry and audience, then resolves the tenant.
    pub fn verify(&self, token: &str) -> Result<(ShopDomain, SessionClaims), String> {
        let decoded = decode::<SessionClaims>(token, &self.key, &self.validation)
            .map_err(|e| format!("Invalid session token: {}", e))?;
        let claims = decoded.claims;
        let shop = claims.shop()?;
        debug!(shop = %shop, sid = ?claims.sid, "Session token verified");
        Ok((shop, claims))
    }
}

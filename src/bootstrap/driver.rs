use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::machine::{Bootstrap, BootstrapConfig, BootstrapEvent, BootstrapState, VerifyOutcome};
use crate::models::ShopDomain;
use crate::routes::verify_routes::VERIFY_TOKEN_PATH;

/// The host platform's iframe bridge, as seen from the embedded page.
#[async_trait]
pub trait EmbeddingBridge: Send + Sync {
    /// True when the page is running inside the host's frame.
    fn is_framed(&self) -> bool;
    /// A fresh session token for `shop`, if the host will issue one.
    async fn session_token(&self, shop: &ShopDomain) -> Option<String>;
    /// Navigate this window (used when not framed).
    fn navigate(&self, location: &str);
    /// Ask the host to navigate the top-level window.
    fn redirect_remote(&self, location: &str);
}

/// Asks the server whether a session token is backed by a durable token.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, shop: &ShopDomain, session_token: &str) -> VerifyOutcome;
}

/// Calls `GET /verify_token?shop&token` on the app server.
pub struct HttpSessionVerifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSessionVerifier {
    /// Redirects are not followed: a gate denial is a 302, and following it
    /// would land on the install flow instead of reporting the denial.
    pub fn new(base_url: &str) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SessionVerifier for HttpSessionVerifier {
    async fn verify(&self, shop: &ShopDomain, session_token: &str) -> VerifyOutcome {
        let url = format!("{}{}", self.base_url, VERIFY_TOKEN_PATH);
        let resp = match self
            .client
            .get(&url)
            .query(&[("shop", shop.as_str()), ("token", session_token)])
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return VerifyOutcome::Error(format!("verify_token request failed: {}", e)),
        };

        let status = resp.status();
        if !status.is_success() {
            return VerifyOutcome::Denied(format!("verify_token returned {}", status));
        }
        match resp.json::<Value>().await {
            Ok(body) if body["status"] == "ok" => VerifyOutcome::Ok,
            Ok(body) => VerifyOutcome::Denied(format!("verify_token status {}", body["status"])),
            Err(e) => VerifyOutcome::Error(format!("verify_token body unreadable: {}", e)),
        }
    }
}

/// Runs the bootstrap for one page load and performs the resulting
/// navigation, if any. Returns the terminal state.
pub async fn run_bootstrap(
    page_url: &str,
    config: BootstrapConfig,
    prior_attempts: u32,
    bridge: &dyn EmbeddingBridge,
    verifier: &dyn SessionVerifier,
) -> BootstrapState {
    let shop = Url::parse(page_url).ok().and_then(|url| {
        url.query_pairs()
            .find(|(k, _)| k == "shop")
            .map(|(_, v)| v.into_owned())
    });

    let mut machine = Bootstrap::new(config, prior_attempts);
    let mut event = BootstrapEvent::Loaded {
        shop,
        framed: bridge.is_framed(),
    };

    loop {
        let state = match machine.handle(event) {
            Ok(state) => state.clone(),
            Err(e) => {
                warn!("Bootstrap stopped: {}", e);
                return machine.state().clone();
            }
        };
        debug!(?state, "Bootstrap transition");

        event = match &state {
            BootstrapState::TokenPending { shop } => {
                BootstrapEvent::TokenObtained(bridge.session_token(shop).await)
            }
            BootstrapState::Verifying {
                shop,
                session_token,
            } => BootstrapEvent::VerificationFinished(verifier.verify(shop, session_token).await),
            BootstrapState::TopLevelRedirect { location } => {
                bridge.navigate(location);
                return state;
            }
            BootstrapState::RedirectRetry { location, attempt } => {
                info!(attempt, "Re-entering embedded auth");
                bridge.redirect_remote(location);
                return state;
            }
            BootstrapState::Exhausted { shop, attempts } => {
                warn!(shop = %shop, attempts, "Giving up on re-auth");
                return state;
            }
            BootstrapState::Uninitialized
            | BootstrapState::Failed
            | BootstrapState::VerifiedReady { .. } => return state,
        };
    }
}

use crate::models::ShopDomain;

/// Knobs for the bootstrap flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Origin of this app, e.g. "https://app.example.com"; the remote
    /// re-auth redirect must be absolute.
    pub app_origin: String,
    /// How many re-auth redirects may happen before giving up. `None` never
    /// gives up, so a tenant whose durable token is never stored loops.
    pub max_reauth_attempts: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapState {
    Uninitialized,
    /// No tenant could be derived from the page URL. Terminal, silent.
    Failed,
    /// Loaded outside the host frame; navigate the page to `location`.
    TopLevelRedirect { location: String },
    /// Framed; waiting for the bridge to hand over a session token.
    TokenPending { shop: ShopDomain },
    /// Token obtained; waiting for `/verify_token`.
    Verifying { shop: ShopDomain, session_token: String },
    /// The server confirmed a durable token exists. Render the app.
    VerifiedReady { shop: ShopDomain, session_token: String },
    /// Re-enter the host's embedded auth flow at `location`.
    RedirectRetry { location: String, attempt: u32 },
    /// The retry bound was reached; no further navigation.
    Exhausted { shop: ShopDomain, attempts: u32 },
}

impl BootstrapState {
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            BootstrapState::Uninitialized
                | BootstrapState::TokenPending { .. }
                | BootstrapState::Verifying { .. }
        )
    }
}

/// Result of asking the server whether the session is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Ok,
    /// The server answered, but not with `status: "ok"`.
    Denied(String),
    /// Transport failure or unreadable response.
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapEvent {
    Loaded { shop: Option<String>, framed: bool },
    TokenObtained(Option<String>),
    VerificationFinished(VerifyOutcome),
}

/// The bootstrap state machine.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    config: BootstrapConfig,
    prior_attempts: u32,
    state: BootstrapState,
}

impl Bootstrap {
    /// `prior_attempts` is how many re-auth redirects already happened for
    /// this page, as tracked by the host.
    pub fn new(config: BootstrapConfig, prior_attempts: u32) -> Self {
        Bootstrap {
            config,
            prior_attempts,
            state: BootstrapState::Uninitialized,
        }
    }

    pub fn state(&self) -> &BootstrapState {
        &self.state
    }

    /// Applies one event. Events that make no sense in the current state are
    /// rejected and leave the state untouched.
    pub fn handle(&mut self, event: BootstrapEvent) -> Result<&BootstrapState, String> {
        let next = match (&self.state, event) {
            (BootstrapState::Uninitialized, BootstrapEvent::Loaded { shop, framed }) => {
                match shop.as_deref().map(ShopDomain::parse) {
                    None | Some(Err(_)) => BootstrapState::Failed,
                    Some(Ok(shop)) if !framed => BootstrapState::TopLevelRedirect {
                        location: format!("/auth?shop={}", shop),
                    },
                    Some(Ok(shop)) => BootstrapState::TokenPending { shop },
                }
            }
            (BootstrapState::TokenPending { shop }, BootstrapEvent::TokenObtained(token)) => {
                match token.filter(|t| !t.is_empty()) {
                    Some(session_token) => BootstrapState::Verifying {
                        shop: shop.clone(),
                        session_token,
                    },
                    None => self.retry(shop),
                }
            }
            (
                BootstrapState::Verifying {
                    shop,
                    session_token,
                },
                BootstrapEvent::VerificationFinished(outcome),
            ) => match outcome {
                VerifyOutcome::Ok => BootstrapState::VerifiedReady {
                    shop: shop.clone(),
                    session_token: session_token.clone(),
                },
                VerifyOutcome::Denied(_) | VerifyOutcome::Error(_) => self.retry(shop),
            },
            (state, event) => {
                return Err(format!("Event {:?} not valid in state {:?}", event, state));
            }
        };
        self.state = next;
        Ok(&self.state)
    }

    fn retry(&self, shop: &ShopDomain) -> BootstrapState {
        match self.config.max_reauth_attempts {
            Some(max) if self.prior_attempts >= max => BootstrapState::Exhausted {
                shop: shop.clone(),
                attempts: self.prior_attempts,
            },
            _ => BootstrapState::RedirectRetry {
                location: format!(
                    "{}/auth?shop={}",
                    self.config.app_origin.trim_end_matches('/'),
                    shop
                ),
                attempt: self.prior_attempts + 1,
            },
        }
    }
}

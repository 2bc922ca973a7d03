//! Shared application state.

use std::sync::Arc;

use crate::config::ConfigV1;
use crate::platform::{PlatformClient, SessionTokenVerifier};
use crate::store::{create_store, TokenStore};

/// Application state shared across all HTTP handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Durable per-tenant access tokens.
    pub store: Arc<dyn TokenStore>,
    /// Admin API client used for the handshake, webhooks and the proxy.
    pub platform: PlatformClient,
    /// Verifies session tokens presented to the gate.
    pub sessions: SessionTokenVerifier,
}

impl AppState {
    /// Builds the state with the store named in the configuration.
    pub fn from_config(config: Arc<ConfigV1>) -> Result<Self, String> {
        let store = create_store(&config.store);
        Self::with_store(config, store)
    }

    /// Builds the state around an injected store.
    pub fn with_store(config: Arc<ConfigV1>, store: Arc<dyn TokenStore>) -> Result<Self, String> {
        let platform = PlatformClient::new(Arc::new(config.platform.clone()))?;
        let sessions = SessionTokenVerifier::new(&config.platform);
        Ok(AppState {
            config,
            store,
            platform,
            sessions,
        })
    }
}

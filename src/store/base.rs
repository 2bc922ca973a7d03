use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::memory_store::MemoryStore;
use crate::config::StoreConfig;
use crate::models::{AccessToken, ShopDomain};

/// Durable per-tenant access tokens, keyed by shop domain.
///
/// `get` returns `Ok(None)` for an unknown tenant; `Err` is reserved for a
/// backend that could not answer.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, shop: &ShopDomain) -> Result<Option<AccessToken>, String>;
    async fn put(&self, shop: &ShopDomain, token: AccessToken) -> Result<(), String>;
    fn name(&self) -> &str;
}

/// Creates the configured store implementation.
pub fn create_store(config: &StoreConfig) -> Arc<dyn TokenStore> {
    match config {
        StoreConfig::Memory => {
            info!("Using in-memory token store; tokens are lost on restart.");
            Arc::new(MemoryStore::new())
        }
    }
}

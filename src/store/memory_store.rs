use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::TokenStore;
use crate::models::{AccessToken, ShopDomain};

/// Process-memory token map. Re-installs overwrite; nothing is ever removed.
#[derive(Default)]
pub struct MemoryStore {
    tokens: RwLock<HashMap<ShopDomain, AccessToken>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn get(&self, shop: &ShopDomain) -> Result<Option<AccessToken>, String> {
        let token = self.tokens.read().await.get(shop).cloned();
        debug!(shop = %shop, found = token.is_some(), "Token lookup");
        Ok(token)
    }

    async fn put(&self, shop: &ShopDomain, token: AccessToken) -> Result<(), String> {
        let previous = self.tokens.write().await.insert(shop.clone(), token);
        debug!(shop = %shop, replaced = previous.is_some(), "Token stored");
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

pub mod base;
pub mod memory_store;

// Re-export the primary store items so callers can do
// "use crate::store::{TokenStore, create_store};"
pub use base::{create_store, TokenStore};
pub use memory_store::MemoryStore;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which backend holds the durable per-tenant access tokens.
/// Selected by a "type" tag in the YAML; only the in-memory map ships today.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
#[serde(tag = "type")]
pub enum StoreConfig {
    #[default]
    #[serde(rename = "memory")]
    Memory,
}

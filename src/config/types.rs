use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::platform::PlatformConfig;
use super::store::StoreConfig;

/// Path of the YAML file read at startup, unless `APPGATE_CONFIG` says otherwise.
pub const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    #[serde(default = "default_bind_host")]
    pub bind_host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub environment: Environment,
    pub platform: PlatformConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Deployment flag. Production tightens validation of the public host.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl ConfigV1 {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    /// Rejects configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.platform.api_key.trim().is_empty() {
            return Err("platform.api_key must not be empty".to_string());
        }
        if self.platform.api_secret.trim().is_empty() {
            return Err("platform.api_secret must not be empty".to_string());
        }
        if !self.platform.admin_url.contains("{shop}") {
            return Err("platform.admin_url must contain a {shop} placeholder".to_string());
        }
        if self.environment == Environment::Production
            && !self.platform.host.starts_with("https://")
        {
            return Err(format!(
                "platform.host must use https in production, got '{}'",
                self.platform.host
            ));
        }
        Ok(())
    }
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Builds the figment used at startup: YAML file, then `APPGATE_` environment
/// variables (`__` separates nested keys, e.g. `APPGATE_PLATFORM__API_SECRET`).
pub fn config_figment(path: &str) -> Figment {
    Figment::new()
        .merge(Serialized::default("version", "1.0.0"))
        .merge(Yaml::file(path))
        .merge(Env::prefixed("APPGATE_").ignore(&["CONFIG"]).split("__"))
}

/// Extracts and validates a configuration from any figment.
pub fn extract_config(figment: Figment) -> Result<ConfigV1, String> {
    let config = figment
        .extract::<Config>()
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let Config::ConfigV1(config) = config;
    config.validate()?;
    Ok(config)
}

/// Load config from the YAML file (see `DEFAULT_CONFIG_PATH`) and environment.
/// Exits the process when the configuration is unusable.
pub fn load_config() -> ConfigV1 {
    let path = std::env::var("APPGATE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    match extract_config(config_figment(&path)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), String> {
    let schema = schema_for!(Config);
    let rendered = serde_json::to_string_pretty(&schema).map_err(|e| e.to_string())?;
    println!("{}", rendered);
    Ok(())
}

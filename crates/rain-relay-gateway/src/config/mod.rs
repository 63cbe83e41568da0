//! Relay config loader (strict parsing).

pub mod schema;

use std::fs;

use rain_relay_core::error::{RelayError, Result};

pub use schema::{
    AuditConfig, GatewaySection, LicenseConfig, LicenseDefault, LicenseGrant, RelayConfig,
    UpstreamSection,
};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "RAIN_RELAY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "rain-relay.yaml";

/// Config path from `RAIN_RELAY_CONFIG`, falling back to `rain-relay.yaml`.
pub fn config_path() -> String {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

pub fn load_from_file(path: &str) -> Result<RelayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| RelayError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<RelayConfig> {
    let cfg: RelayConfig = serde_yaml::from_str(s)
        .map_err(|e| RelayError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

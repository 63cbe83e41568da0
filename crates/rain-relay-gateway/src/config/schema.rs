use std::collections::HashSet;
use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use rain_relay_core::error::{RelayError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    pub upstream: UpstreamSection,

    #[serde(default)]
    pub license: LicenseConfig,

    #[serde(default)]
    pub audit: AuditConfig,
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RelayError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.upstream.validate()?;
        self.license.validate()?;
        self.audit.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(RelayError::BadRequest(
                "gateway.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(RelayError::BadRequest(
                "gateway.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(RelayError::BadRequest(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if self.max_frame_bytes == 0 {
            return Err(RelayError::BadRequest(
                "gateway.max_frame_bytes must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            RelayError::BadRequest(format!("gateway.listen is not a socket address: {}", self.listen))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_max_frame_bytes() -> usize {
    16384
}

/// The single realtime peer requests are forwarded to.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamSection {
    pub url: String,
}

impl UpstreamSection {
    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(RelayError::BadRequest(
                "upstream.url must start with ws:// or wss://".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseDefault {
    #[default]
    Deny,
    Allow,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LicenseConfig {
    /// Verdict for users without a grant.
    #[serde(default)]
    pub default: LicenseDefault,

    #[serde(default)]
    pub grants: Vec<LicenseGrant>,
}

impl LicenseConfig {
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for g in &self.grants {
            if g.user_id.is_empty() {
                return Err(RelayError::BadRequest("license.grants[].user_id must not be empty".into()));
            }
            if !seen.insert(g.user_id.as_str()) {
                return Err(RelayError::BadRequest(format!(
                    "license.grants has duplicate user_id: {}",
                    g.user_id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LicenseGrant {
    pub user_id: String,
    /// RFC 3339; absent means the grant never expires.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum AuditConfig {
    /// In-process log; lost on restart.
    #[default]
    Memory,
    /// One append-only `<dir>/<collection>.jsonl` file per collection.
    Jsonl { dir: String },
}

impl AuditConfig {
    pub fn validate(&self) -> Result<()> {
        if let AuditConfig::Jsonl { dir } = self {
            if dir.trim().is_empty() {
                return Err(RelayError::BadRequest("audit.dir must not be empty".into()));
            }
        }
        Ok(())
    }
}

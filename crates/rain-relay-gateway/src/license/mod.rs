//! License gate: decides whether a user may use the relay.
//!
//! The relay only depends on the [`LicenseGate`] trait; [`StaticLicenseGate`]
//! is the built-in implementation compiled from the `license` config section.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rain_relay_core::error::Result;

use crate::config::{LicenseConfig, LicenseDefault};

#[async_trait]
pub trait LicenseGate: Send + Sync {
    /// `Ok(false)` is a verdict; `Err` means the gate itself could not answer.
    async fn is_license_valid(&self, user_id: &str) -> Result<bool>;
}

/// Config-backed gate: per-user grants with optional expiry.
pub struct StaticLicenseGate {
    grants: HashMap<String, Option<DateTime<Utc>>>,
    default: LicenseDefault,
}

impl StaticLicenseGate {
    pub fn new(cfg: &LicenseConfig) -> Self {
        let grants = cfg
            .grants
            .iter()
            .map(|g| (g.user_id.clone(), g.expires_at))
            .collect();
        Self {
            grants,
            default: cfg.default,
        }
    }

    pub fn is_valid_at(&self, user_id: &str, now: DateTime<Utc>) -> bool {
        match self.grants.get(user_id) {
            Some(None) => true,
            Some(Some(expires_at)) => now < *expires_at,
            None => self.default == LicenseDefault::Allow,
        }
    }
}

#[async_trait]
impl LicenseGate for StaticLicenseGate {
    async fn is_license_valid(&self, user_id: &str) -> Result<bool> {
        Ok(self.is_valid_at(user_id, Utc::now()))
    }
}

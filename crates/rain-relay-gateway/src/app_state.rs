//! Shared application state for the relay gateway.
//!
//! Owns the config, the client registry, and the relay. [`AppState::connect`]
//! wires the production collaborators (config license gate, configured audit
//! sink, WebSocket upstream) and starts the upstream pump;
//! [`AppState::new`] takes an already-built relay so tests can inject fakes.

use std::sync::Arc;

use rain_relay_core::error::Result;

use crate::audit;
use crate::config::RelayConfig;
use crate::license::StaticLicenseGate;
use crate::realtime::{ClientRegistry, SessionStore};
use crate::services::ClientRelay;
use crate::upstream::WsUpstream;

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<RelayConfig>,
    clients: Arc<ClientRegistry>,
    relay: Arc<ClientRelay>,
}

impl AppState {
    pub fn new(cfg: RelayConfig, clients: Arc<ClientRegistry>, relay: Arc<ClientRelay>) -> Self {
        Self {
            cfg: Arc::new(cfg),
            clients,
            relay,
        }
    }

    /// Build production state. The returned link handle is used for shutdown.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub async fn connect(cfg: RelayConfig) -> Result<(Self, Arc<WsUpstream>)> {
        let license = Arc::new(StaticLicenseGate::new(&cfg.license));
        let audit = audit::from_config(&cfg.audit).await?;
        tracing::info!(sink = audit.name(), grants = cfg.license.grants.len(), "collaborators ready");

        let (upstream, events) = WsUpstream::connect(&cfg.upstream.url).await?;
        let upstream = Arc::new(upstream);

        let sessions = Arc::new(SessionStore::new());
        let clients = Arc::new(ClientRegistry::new());
        let relay = Arc::new(ClientRelay::new(
            sessions,
            Arc::clone(&clients),
            license,
            audit,
            upstream.clone(),
        ));

        tokio::spawn(Arc::clone(&relay).run_upstream_pump(events));

        Ok((Self::new(cfg, clients, relay), upstream))
    }

    pub fn cfg(&self) -> &RelayConfig {
        &self.cfg
    }

    pub fn clients(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.clients)
    }

    pub fn relay(&self) -> Arc<ClientRelay> {
        Arc::clone(&self.relay)
    }
}

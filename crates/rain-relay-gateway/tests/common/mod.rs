//! Fakes shared by gateway integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use rain_relay_core::error::{RelayError, Result};
use rain_relay_core::protocol::audit::AuditRecord;
use rain_relay_core::protocol::upstream::UpstreamRequest;
use rain_relay_gateway::audit::{AuditLog, MemoryAuditLog};
use rain_relay_gateway::license::LicenseGate;
use rain_relay_gateway::realtime::{ClientRegistry, Connection, SessionStore};
use rain_relay_gateway::services::ClientRelay;
use rain_relay_gateway::upstream::UpstreamLink;

/// Upstream that records every request instead of sending it.
#[derive(Default)]
pub struct RecordingUpstream {
    pub sent: Mutex<Vec<UpstreamRequest>>,
    pub closed: bool,
}

impl RecordingUpstream {
    pub fn closed() -> Self {
        Self { sent: Mutex::new(Vec::new()), closed: true }
    }

    pub fn sent(&self) -> Vec<UpstreamRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamLink for RecordingUpstream {
    async fn send(&self, req: UpstreamRequest) -> Result<()> {
        if self.closed {
            return Err(RelayError::Upstream("link closed".into()));
        }
        self.sent.lock().unwrap().push(req);
        Ok(())
    }
}

/// License gate with a fixed allow set; `broken` makes every call fail.
pub struct FixedLicense {
    allowed: HashSet<String>,
    broken: bool,
    pub calls: AtomicUsize,
}

impl FixedLicense {
    pub fn allowing(users: &[&str]) -> Self {
        Self {
            allowed: users.iter().map(|u| u.to_string()).collect(),
            broken: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn broken() -> Self {
        Self { allowed: HashSet::new(), broken: true, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl LicenseGate for FixedLicense {
    async fn is_license_valid(&self, user_id: &str) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(RelayError::License("license service unreachable".into()));
        }
        Ok(self.allowed.contains(user_id))
    }
}

/// License gate that answers `true` after a fixed delay.
pub struct SlowLicense {
    pub delay: Duration,
}

#[async_trait]
impl LicenseGate for SlowLicense {
    async fn is_license_valid(&self, _user_id: &str) -> Result<bool> {
        sleep(self.delay).await;
        Ok(true)
    }
}

/// Audit sink that always fails but counts attempts.
#[derive(Default)]
pub struct FailingAudit {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl AuditLog for FailingAudit {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn append(&self, _collection: &str, _record: &AuditRecord) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(RelayError::Audit("disk full".into()))
    }
}

pub struct Harness {
    pub relay: Arc<ClientRelay>,
    pub sessions: Arc<SessionStore>,
    pub clients: Arc<ClientRegistry>,
    pub upstream: Arc<RecordingUpstream>,
    pub audit: Arc<MemoryAuditLog>,
}

pub fn harness(allowed: &[&str]) -> Harness {
    harness_with(Arc::new(FixedLicense::allowing(allowed)), Arc::new(RecordingUpstream::default()))
}

pub fn harness_with(license: Arc<dyn LicenseGate>, upstream: Arc<RecordingUpstream>) -> Harness {
    let sessions = Arc::new(SessionStore::new());
    let clients = Arc::new(ClientRegistry::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let relay = Arc::new(ClientRelay::new(
        Arc::clone(&sessions),
        Arc::clone(&clients),
        license,
        audit.clone(),
        upstream.clone(),
    ));
    Harness { relay, sessions, clients, upstream, audit }
}

/// A registered client connection bound to `user_id`.
pub fn connect(clients: &ClientRegistry, user_id: &str) -> (Connection, mpsc::Receiver<Message>) {
    let (tx, rx) = mpsc::channel(16);
    let conn = Connection::new(tx);
    let key = clients.next_conn_key();
    clients.insert(&key, conn.clone());
    clients.bind_user(user_id, &key);
    (conn, rx)
}

/// Every queued text frame, parsed as JSON.
pub fn drain(rx: &mut mpsc::Receiver<Message>) -> Vec<serde_json::Value> {
    let mut out = Vec::new();
    while let Ok(m) = rx.try_recv() {
        if let Message::Text(s) = m {
            out.push(serde_json::from_str(&s).unwrap());
        }
    }
    out
}

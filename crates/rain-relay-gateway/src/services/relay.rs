//! Client relay: client events -> upstream requests, upstream events -> client replies.
//!
//! Inbound handlers gate on the license, touch the session store, and forward
//! one request upstream. Upstream handlers deliver one reply to the user's
//! sockets and append an audit record in a background task.

use std::sync::Arc;

use tokio::task::JoinHandle;

use rain_relay_core::error::Result;
use rain_relay_core::protocol::audit::{AuditRecord, RAIN_EVENTS_COLLECTION};
use rain_relay_core::protocol::client::{BotMessage, ClientInbound, ClientOutbound, GenerateMatches};
use rain_relay_core::protocol::upstream::{
    ChatRequest, ChatResponse, MatchmakingRequest, MatchmakingResponse, UpstreamEvent,
    UpstreamRequest,
};

use crate::audit::AuditLog;
use crate::license::LicenseGate;
use crate::realtime::{ClientRegistry, Connection, SessionStore};
use crate::upstream::{UpstreamEvents, UpstreamLink};

/// What an inbound handler did with the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Request sent upstream.
    Forwarded,
    /// License rejected; the caller got a `system_message`.
    Denied,
}

pub struct ClientRelay {
    sessions: Arc<SessionStore>,
    clients: Arc<ClientRegistry>,
    license: Arc<dyn LicenseGate>,
    audit: Arc<dyn AuditLog>,
    upstream: Arc<dyn UpstreamLink>,
}

impl ClientRelay {
    pub fn new(
        sessions: Arc<SessionStore>,
        clients: Arc<ClientRegistry>,
        license: Arc<dyn LicenseGate>,
        audit: Arc<dyn AuditLog>,
        upstream: Arc<dyn UpstreamLink>,
    ) -> Self {
        Self {
            sessions,
            clients,
            license,
            audit,
            upstream,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub async fn handle_inbound(&self, conn: &Connection, ev: ClientInbound) -> Result<InboundOutcome> {
        match ev {
            ClientInbound::GenerateMatches(req) => self.on_generate_matches(conn, req).await,
            ClientInbound::SendMessageToBot(msg) => self.on_send_message_to_bot(conn, msg).await,
        }
    }

    pub async fn on_generate_matches(
        &self,
        conn: &Connection,
        req: GenerateMatches,
    ) -> Result<InboundOutcome> {
        if !self.admit(conn, &req.user_id).await? {
            return Ok(InboundOutcome::Denied);
        }

        let prev = match req.session_id.as_deref() {
            Some(session_id) => self.sessions.bind(&req.user_id, session_id),
            None => self.sessions.clear(&req.user_id),
        };
        tracing::debug!(user = %req.user_id, session = ?req.session_id, prev = ?prev, "session bound");

        self.upstream
            .send(UpstreamRequest::Matchmaking(MatchmakingRequest {
                session_id: req.session_id,
                user_id: req.user_id,
            }))
            .await?;
        Ok(InboundOutcome::Forwarded)
    }

    /// Reads the session store but never writes it.
    pub async fn on_send_message_to_bot(
        &self,
        conn: &Connection,
        msg: BotMessage,
    ) -> Result<InboundOutcome> {
        let session_id = self.sessions.resolve(&msg.user_id, msg.session_id.as_deref());

        if !self.admit(conn, &msg.user_id).await? {
            return Ok(InboundOutcome::Denied);
        }

        self.upstream
            .send(UpstreamRequest::Chat(ChatRequest {
                user_id: msg.user_id,
                message: msg.text,
                session_id,
            }))
            .await?;
        Ok(InboundOutcome::Forwarded)
    }

    /// Returns the handle of the background audit write.
    pub fn on_upstream_chat_response(&self, resp: ChatResponse) -> JoinHandle<()> {
        self.deliver(&resp.user_id, &ClientOutbound::reply(&resp.user_id, &resp.reply));

        let session_id = self.sessions.get(&resp.user_id);
        self.spawn_audit(AuditRecord::chat_response(&resp.user_id, session_id, &resp.reply))
    }

    /// Returns the handle of the background audit write.
    pub fn on_upstream_match_response(&self, resp: MatchmakingResponse) -> JoinHandle<()> {
        let summary =
            ClientOutbound::match_summary(&resp.user_id, resp.match_count, resp.session_id.as_deref());
        self.deliver(&resp.user_id, &summary);

        self.spawn_audit(AuditRecord::matchmaking_complete(&resp))
    }

    pub fn handle_upstream(&self, ev: UpstreamEvent) -> JoinHandle<()> {
        match ev {
            UpstreamEvent::ChatResponse(r) => self.on_upstream_chat_response(r),
            UpstreamEvent::MatchmakingResponse(r) => self.on_upstream_match_response(r),
        }
    }

    /// Feed upstream events into the relay until the link closes.
    pub async fn run_upstream_pump(self: Arc<Self>, mut events: UpstreamEvents) {
        while let Some(ev) = events.recv().await {
            let _ = self.handle_upstream(ev);
        }
        tracing::info!("upstream event stream ended");
    }

    async fn admit(&self, conn: &Connection, user_id: &str) -> Result<bool> {
        if self.license.is_license_valid(user_id).await? {
            return Ok(true);
        }
        tracing::info!(user = %user_id, "license rejected");
        if !conn.send(&ClientOutbound::license_expired(user_id))? {
            tracing::warn!(user = %user_id, "denial dropped: client queue full or closed");
        }
        Ok(false)
    }

    fn deliver(&self, user_id: &str, out: &ClientOutbound) {
        match self.clients.send_to_user(user_id, out) {
            Ok(0) => tracing::warn!(user = %user_id, "no connected client for upstream reply"),
            Ok(n) => tracing::debug!(user = %user_id, sockets = n, "upstream reply delivered"),
            Err(e) => tracing::warn!(user = %user_id, error = %e, "upstream reply not delivered"),
        }
    }

    fn spawn_audit(&self, record: AuditRecord) -> JoinHandle<()> {
        let audit = Arc::clone(&self.audit);
        tokio::spawn(async move {
            if let Err(e) = audit.append(RAIN_EVENTS_COLLECTION, &record).await {
                tracing::warn!(
                    user = %record.user_id,
                    event = record.event.as_str(),
                    sink = audit.name(),
                    error = %e,
                    "audit append failed"
                );
            }
        })
    }
}

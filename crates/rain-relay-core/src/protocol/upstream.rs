//! Upstream lane envelopes (JSON text frames exchanged with the matchmaking peer).
//!
//! Same `{"event", "data"}` shape as the client lane, with snake_case payloads.
//! Events the relay does not know are surfaced as `None` by [`decode_event`]
//! so the link can skip them without tearing down.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RelayError, Result};

pub const CHAT_RESPONSE: &str = "chat_response";
pub const MATCHMAKING_RESPONSE: &str = "matchmaking_response";

/// Relay -> upstream request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum UpstreamRequest {
    #[serde(rename = "matchmaking_request")]
    Matchmaking(MatchmakingRequest),
    #[serde(rename = "chat_request")]
    Chat(ChatRequest),
}

impl UpstreamRequest {
    pub fn user_id(&self) -> &str {
        match self {
            UpstreamRequest::Matchmaking(r) => &r.user_id,
            UpstreamRequest::Chat(r) => &r.user_id,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| RelayError::Internal(format!("upstream json encode failed: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MatchmakingRequest {
    /// `null` when the client did not name a session.
    pub session_id: Option<String>,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
    pub session_id: String,
}

/// Upstream -> relay event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum UpstreamEvent {
    #[serde(rename = "chat_response")]
    ChatResponse(ChatResponse),
    #[serde(rename = "matchmaking_response")]
    MatchmakingResponse(MatchmakingResponse),
}

impl UpstreamEvent {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| RelayError::Internal(format!("upstream json encode failed: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatResponse {
    pub user_id: String,
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MatchmakingResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub match_count: u64,
    pub user_id: String,
    /// Any additional fields the peer attaches; kept for the audit payload.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Decode one upstream text frame. Unknown event names yield `Ok(None)`.
pub fn decode_event(s: &str) -> Result<Option<UpstreamEvent>> {
    let raw: RawEnvelope = serde_json::from_str(s)
        .map_err(|e| RelayError::BadRequest(format!("invalid upstream envelope: {e}")))?;

    let ev = match raw.event.as_str() {
        CHAT_RESPONSE => UpstreamEvent::ChatResponse(payload(&raw.event, raw.data)?),
        MATCHMAKING_RESPONSE => UpstreamEvent::MatchmakingResponse(payload(&raw.event, raw.data)?),
        _ => return Ok(None),
    };
    Ok(Some(ev))
}

fn payload<T: serde::de::DeserializeOwned>(event: &str, data: Value) -> Result<T> {
    serde_json::from_value(data)
        .map_err(|e| RelayError::BadRequest(format!("invalid {event} payload: {e}")))
}

//! Audit record format (append-only, written once, never read back by the relay).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::protocol::upstream::MatchmakingResponse;

/// Collection all relay events are appended to.
pub const RAIN_EVENTS_COLLECTION: &str = "RAINEvents";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    ChatResponse,
    MatchmakingComplete,
}

impl AuditKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditKind::ChatResponse => "chat_response",
            AuditKind::MatchmakingComplete => "matchmaking_complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub user_id: String,
    /// Absent when the user never established a session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub event: AuditKind,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn chat_response(user_id: &str, session_id: Option<String>, reply: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            session_id,
            event: AuditKind::ChatResponse,
            data: json!({ "reply": reply }),
            timestamp: Utc::now(),
        }
    }

    /// Records the matchmaking payload as received, extra fields included.
    pub fn matchmaking_complete(resp: &MatchmakingResponse) -> Self {
        let mut data = Map::new();
        if let Some(session_id) = &resp.session_id {
            data.insert("session_id".into(), json!(session_id));
        }
        data.insert("match_count".into(), json!(resp.match_count));
        data.insert("user_id".into(), json!(resp.user_id));
        for (k, v) in &resp.extra {
            data.entry(k.clone()).or_insert_with(|| v.clone());
        }

        Self {
            user_id: resp.user_id.clone(),
            session_id: resp.session_id.clone(),
            event: AuditKind::MatchmakingComplete,
            data: Value::Object(data),
            timestamp: Utc::now(),
        }
    }
}

//! Client lane envelopes (JSON text frames exchanged with app sockets).
//!
//! Wire shape: `{"event": "<name>", "data": { ..camelCase payload.. }}`.

use serde::{Deserialize, Serialize};

use crate::error::{ClientCode, RelayError, Result};

/// Denial text sent when the license gate rejects a user.
pub const LICENSE_EXPIRED_TEXT: &str = "❌ Your RAIN license has expired.";

/// Inbound client event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event", content = "data", deny_unknown_fields)]
pub enum ClientInbound {
    /// Ask the upstream peer to run matchmaking for a session.
    GenerateMatches(GenerateMatches),
    /// Free-text chat message for the bot.
    SendMessageToBot(BotMessage),
}

impl ClientInbound {
    /// User the event was sent on behalf of.
    pub fn user_id(&self) -> &str {
        match self {
            ClientInbound::GenerateMatches(m) => &m.user_id,
            ClientInbound::SendMessageToBot(m) => &m.user_id,
        }
    }

    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ClientInbound::GenerateMatches(_) => "GenerateMatches",
            ClientInbound::SendMessageToBot(_) => "SendMessageToBot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMatches {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotMessage {
    pub user_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Outbound client event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientOutbound {
    /// Relay-originated notice (license denials).
    #[serde(rename = "system_message")]
    SystemMessage(UserText),
    /// Bot replies and matchmaking summaries.
    #[serde(rename = "RAIN_response")]
    RainResponse(UserText),
    /// Transport-level failure (malformed frame, size limit, idle timeout).
    #[serde(rename = "error")]
    Error(ErrorBody),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserText {
    pub user_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub msg: String,
}

impl ClientOutbound {
    pub fn license_expired(user_id: &str) -> Self {
        ClientOutbound::SystemMessage(UserText {
            user_id: user_id.to_string(),
            text: LICENSE_EXPIRED_TEXT.to_string(),
        })
    }

    pub fn reply(user_id: &str, text: &str) -> Self {
        ClientOutbound::RainResponse(UserText {
            user_id: user_id.to_string(),
            text: text.to_string(),
        })
    }

    /// Human-readable matchmaking summary.
    pub fn match_summary(user_id: &str, match_count: u64, session_id: Option<&str>) -> Self {
        let session = session_id.unwrap_or("unknown");
        ClientOutbound::RainResponse(UserText {
            user_id: user_id.to_string(),
            text: format!("✅ {match_count} connections generated for session {session}."),
        })
    }

    pub fn error(code: ClientCode, msg: &str) -> Self {
        ClientOutbound::Error(ErrorBody {
            code: code.as_str().to_string(),
            msg: msg.to_string(),
        })
    }

    /// Serialize to the JSON text sent on the socket.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| RelayError::Internal(format!("client json encode failed: {e}")))
    }
}

/// Decode one client text frame.
pub fn decode(s: &str) -> Result<ClientInbound> {
    serde_json::from_str(s)
        .map_err(|e| RelayError::BadRequest(format!("invalid client envelope: {e}")))
}

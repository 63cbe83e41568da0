//! Upstream link: the single realtime peer that runs matchmaking and chat.
//!
//! The relay talks to the peer only through [`UpstreamLink`], so tests can
//! substitute a fake. [`WsUpstream`] is the WebSocket implementation.

mod ws;

use async_trait::async_trait;
use tokio::sync::mpsc;

use rain_relay_core::error::Result;
use rain_relay_core::protocol::upstream::{UpstreamEvent, UpstreamRequest};

pub use ws::WsUpstream;

/// Stream of events pushed by the peer. Ends when the link closes.
pub type UpstreamEvents = mpsc::Receiver<UpstreamEvent>;

#[async_trait]
pub trait UpstreamLink: Send + Sync {
    /// Queue a request for the peer. Fails once the link is closed.
    async fn send(&self, req: UpstreamRequest) -> Result<()>;
}

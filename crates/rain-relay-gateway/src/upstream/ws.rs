//! Upstream link over a WebSocket client (`tokio-tungstenite`).
//!
//! A single task owns the socket: it drains queued requests into the sink and
//! decodes inbound frames into [`UpstreamEvent`]s. No reconnection: once the
//! task exits, `send` fails and the event stream ends.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use rain_relay_core::error::{RelayError, Result};
use rain_relay_core::protocol::upstream::{decode_event, UpstreamEvent, UpstreamRequest};

use super::{UpstreamEvents, UpstreamLink};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const QUEUE_CAPACITY: usize = 1024;

enum LinkCommand {
    Send(String),
    Close,
}

pub struct WsUpstream {
    url: String,
    cmd_tx: mpsc::Sender<LinkCommand>,
    handler: Mutex<Option<JoinHandle<()>>>,
}

impl WsUpstream {
    /// Connect to the peer and start the link task.
    pub async fn connect(url: &str) -> Result<(Self, UpstreamEvents)> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| RelayError::Upstream(format!("connect {url} failed: {e}")))?;

        let (cmd_tx, cmd_rx) = mpsc::channel::<LinkCommand>(QUEUE_CAPACITY);
        let (ev_tx, ev_rx) = mpsc::channel::<UpstreamEvent>(QUEUE_CAPACITY);
        let handler = tokio::spawn(link_loop(ws, cmd_rx, ev_tx));

        tracing::info!(%url, "upstream link connected");

        Ok((
            Self {
                url: url.to_string(),
                cmd_tx,
                handler: Mutex::new(Some(handler)),
            },
            ev_rx,
        ))
    }

    pub fn is_connected(&self) -> bool {
        !self.cmd_tx.is_closed()
    }

    /// Send a close frame and wait for the link task to finish.
    pub async fn disconnect(&self) {
        let _ = self.cmd_tx.send(LinkCommand::Close).await;
        if let Some(h) = self.handler.lock().await.take() {
            let _ = h.await;
        }
        tracing::info!(url = %self.url, "upstream link disconnected");
    }
}

#[async_trait]
impl UpstreamLink for WsUpstream {
    async fn send(&self, req: UpstreamRequest) -> Result<()> {
        let text = req.to_json()?;
        self.cmd_tx
            .send(LinkCommand::Send(text))
            .await
            .map_err(|_| RelayError::Upstream("link closed".into()))
    }
}

async fn link_loop(
    ws: WsStream,
    mut cmd_rx: mpsc::Receiver<LinkCommand>,
    ev_tx: mpsc::Sender<UpstreamEvent>,
) {
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(LinkCommand::Send(text)) => {
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            tracing::warn!(error = %e, "upstream write failed");
                            break;
                        }
                    }
                    Some(LinkCommand::Close) | None => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }

            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(s))) => match decode_event(&s) {
                        Ok(Some(ev)) => {
                            if ev_tx.send(ev).await.is_err() {
                                break;
                            }
                        }
                        Ok(None) => tracing::debug!(frame = %s, "upstream event ignored"),
                        Err(e) => tracing::warn!(error = %e, "upstream frame dropped"),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("upstream closed the link");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "upstream read failed");
                        break;
                    }
                }
            }
        }
    }
}

//! Client WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS and register the socket with the client registry
//! - Lifecycle: ping/pong + idle timeout
//! - Frame size limit before decode, then decode-once
//! - Bind the socket to each user it speaks for, then queue the event for the
//!   connection's relay worker
//!
//! Events from one socket are relayed in arrival order by that worker. The
//! socket loop never awaits the relay, so a slow license check or upstream
//! send does not hold back writes, pings, or the idle check.

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{Duration, Instant};
use tracing::Instrument;

use rain_relay_core::error::{ClientCode, RelayError, Result};
use rain_relay_core::protocol::client::{ClientInbound, ClientOutbound};

use crate::app_state::AppState;
use crate::realtime::Connection;
use crate::services::ClientRelay;
use crate::transport::codec::{decode, frame_len, Inbound};

const OUTBOUND_QUEUE: usize = 1024;
const EVENT_QUEUE: usize = 256;
const IDLE_CHECK_EVERY: Duration = Duration::from_millis(250);

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| async move {
        let conn_key = app.clients().next_conn_key();
        let span = tracing::info_span!("client", conn = %conn_key);
        if let Err(e) = run_session(app, conn_key, socket).instrument(span).await {
            tracing::debug!(error = %e, "client session ended with error");
        }
    })
}

fn error_frame(code: ClientCode, msg: &str) -> Option<Message> {
    ClientOutbound::error(code, msg).to_json().ok().map(Message::Text)
}

// --------------------
// Core session loop
// --------------------
async fn run_session(app: AppState, conn_key: String, socket: WebSocket) -> Result<()> {
    let (out_tx, out_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE);
    let conn = Connection::new(out_tx);

    let clients = app.clients();
    clients.insert(&conn_key, conn.clone());
    tracing::info!(connected = clients.len(), "client connected");

    let (ev_tx, ev_rx) = mpsc::channel::<ClientInbound>(EVENT_QUEUE);
    tokio::spawn(relay_worker(app.relay(), conn.clone(), ev_rx).in_current_span());

    let res = session_loop(&app, &conn_key, &conn, ev_tx, out_rx, socket).await;

    clients.remove_connection(&conn_key);
    tracing::info!(connected = clients.len(), "client disconnected");
    res
}

async fn session_loop(
    app: &AppState,
    conn_key: &str,
    conn: &Connection,
    ev_tx: mpsc::Sender<ClientInbound>,
    mut out_rx: mpsc::Receiver<Message>,
    socket: WebSocket,
) -> Result<()> {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let gw = &app.cfg().gateway;
    let ping_every = Duration::from_millis(gw.ping_interval_ms);
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);
    let max_frame_bytes = gw.max_frame_bytes;

    let mut ping_tick = tokio::time::interval(ping_every);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut idle_tick = tokio::time::interval(IDLE_CHECK_EVERY);
    idle_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                let Some(m) = maybe_out else { break; };
                ws_tx
                    .send(m)
                    .await
                    .map_err(|e| RelayError::Internal(format!("client write failed: {e}")))?;
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let Ok(msg) = incoming else { break; };

                last_activity = Instant::now();

                if frame_len(&msg) > max_frame_bytes {
                    if let Some(m) = error_frame(ClientCode::PayloadTooLarge, "frame too large") {
                        let _ = conn.tx.try_send(m);
                    }
                    continue;
                }

                let decoded = match decode(msg) {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::debug!(error = %e, "client frame rejected");
                        if let Some(m) = error_frame(e.client_code(), &e.to_string()) {
                            let _ = conn.tx.try_send(m);
                        }
                        continue;
                    }
                };

                match decoded {
                    Inbound::Event { ev, bytes_len } => {
                        let user = ev.user_id().to_string();
                        let name = ev.name();
                        app.clients().bind_user(&user, conn_key);
                        tracing::debug!(user = %user, event = name, bytes_len, "client event");

                        match ev_tx.try_send(ev) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                tracing::warn!(user = %user, event = name, "relay worker busy; event dropped");
                                if let Some(m) = error_frame(ClientCode::Unavailable, "too many pending events") {
                                    let _ = conn.tx.try_send(m);
                                }
                            }
                            Err(TrySendError::Closed(_)) => break,
                        }
                    }
                    Inbound::Binary { bytes_len } => {
                        tracing::debug!(bytes_len, "binary frame rejected");
                        if let Some(m) = error_frame(ClientCode::BadRequest, "binary frames are not supported") {
                            let _ = conn.tx.try_send(m);
                        }
                    }
                    Inbound::Ping(payload) => {
                        let _ = conn.tx.try_send(Message::Pong(payload));
                    }
                    Inbound::Pong(_) => {}
                    Inbound::Close => break,
                }
            }

            // ping
            _ = ping_tick.tick() => {
                let _ = conn.tx.try_send(Message::Ping(Vec::new()));
            }

            // idle timeout
            _ = idle_tick.tick() => {
                if last_activity.elapsed() >= idle_timeout {
                    if let Some(m) = error_frame(ClientCode::Timeout, "idle timeout") {
                        let _ = ws_tx.send(m).await;
                    }
                    break;
                }
            }
        }
    }

    let _ = ws_tx.send(Message::Close(None)).await;
    Ok(())
}

/// Relays one socket's events in arrival order. Ends once the socket loop
/// drops its sender and the queue is drained.
async fn relay_worker(
    relay: Arc<ClientRelay>,
    conn: Connection,
    mut events: mpsc::Receiver<ClientInbound>,
) {
    while let Some(ev) = events.recv().await {
        let user = ev.user_id().to_string();
        let name = ev.name();
        if let Err(e) = relay.handle_inbound(&conn, ev).await {
            tracing::error!(user = %user, event = name, error = %e, "client event not relayed");
        }
    }
}

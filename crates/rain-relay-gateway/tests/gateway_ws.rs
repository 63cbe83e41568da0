//! End-to-end: client socket -> gateway -> fake upstream, and back.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use rain_relay_core::protocol::upstream::{ChatResponse, MatchmakingResponse, UpstreamRequest};
use rain_relay_gateway::app_state::AppState;
use rain_relay_gateway::{config, router};

use common::{harness, harness_with, Harness, RecordingUpstream, SlowLicense};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

const SMALL_FRAMES: &str = r#"
version: 1
gateway:
  max_frame_bytes: 256
upstream:
  url: "ws://127.0.0.1:1"
"#;

async fn serve(h: &Harness) -> SocketAddr {
    serve_with(h, SMALL_FRAMES).await
}

async fn serve_with(h: &Harness, yaml: &str) -> SocketAddr {
    let cfg = config::load_from_str(yaml).unwrap();
    let state = AppState::new(cfg, h.clients.clone(), h.relay.clone());
    let app = router::build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn client(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/v1/ws")).await.unwrap();
    ws
}

async fn next_json(ws: &mut Client) -> Value {
    loop {
        let msg = timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();
        if let Message::Text(s) = msg {
            return serde_json::from_str(&s).unwrap();
        }
    }
}

async fn wait_for_requests(h: &Harness, n: usize) -> Vec<UpstreamRequest> {
    timeout(WAIT, async {
        loop {
            let sent = h.upstream.sent();
            if sent.len() >= n {
                return sent;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn matchmaking_round_trip() {
    let h = harness(&["u1"]);
    let addr = serve(&h).await;
    let mut ws = client(addr).await;

    let frame = json!({ "event": "GenerateMatches", "data": { "userId": "u1", "sessionId": "s1" } });
    ws.send(Message::Text(frame.to_string())).await.unwrap();

    let sent = wait_for_requests(&h, 1).await;
    assert!(matches!(&sent[0], UpstreamRequest::Matchmaking(r) if r.session_id.as_deref() == Some("s1")));
    assert_eq!(h.sessions.get("u1").as_deref(), Some("s1"));

    h.relay
        .on_upstream_match_response(MatchmakingResponse {
            session_id: Some("s1".into()),
            match_count: 5,
            user_id: "u1".into(),
            extra: Map::new(),
        })
        .await
        .unwrap();

    let reply = next_json(&mut ws).await;
    assert_eq!(reply["event"], "RAIN_response");
    assert_eq!(reply["data"]["userId"], "u1");
    assert_eq!(reply["data"]["text"], "✅ 5 connections generated for session s1.");
}

#[tokio::test]
async fn unlicensed_user_gets_system_message() {
    let h = harness(&[]);
    let addr = serve(&h).await;
    let mut ws = client(addr).await;

    let frame = json!({ "event": "SendMessageToBot", "data": { "userId": "u2", "text": "hi" } });
    ws.send(Message::Text(frame.to_string())).await.unwrap();

    let reply = next_json(&mut ws).await;
    assert_eq!(reply["event"], "system_message");
    assert_eq!(reply["data"]["userId"], "u2");
    assert!(h.upstream.sent().is_empty());
}

#[tokio::test]
async fn malformed_and_oversized_frames_get_errors() {
    let h = harness(&["u1"]);
    let addr = serve(&h).await;
    let mut ws = client(addr).await;

    ws.send(Message::Text("{not json".into())).await.unwrap();
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["event"], "error");
    assert_eq!(reply["data"]["code"], "BAD_REQUEST");

    let big = json!({ "event": "SendMessageToBot", "data": { "userId": "u1", "text": "x".repeat(512) } });
    ws.send(Message::Text(big.to_string())).await.unwrap();
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["data"]["code"], "PAYLOAD_TOO_LARGE");

    ws.send(Message::Binary(vec![1, 2, 3])).await.unwrap();
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["data"]["code"], "BAD_REQUEST");

    assert!(h.upstream.sent().is_empty());
}

#[tokio::test]
async fn closing_the_socket_unregisters_it() {
    let h = harness(&["u1"]);
    let addr = serve(&h).await;
    let mut ws = client(addr).await;

    let frame = json!({ "event": "SendMessageToBot", "data": { "userId": "u1", "text": "hi" } });
    ws.send(Message::Text(frame.to_string())).await.unwrap();
    wait_for_requests(&h, 1).await;
    assert_eq!(h.clients.count_user_connections("u1"), 1);

    ws.close(None).await.unwrap();

    timeout(WAIT, async {
        while !h.clients.is_empty() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(h.clients.count_user_connections("u1"), 0);
}

#[tokio::test]
async fn healthz_answers_ok() {
    let h = harness(&[]);
    let addr = serve(&h).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut body = String::new();
    timeout(WAIT, stream.read_to_string(&mut body)).await.unwrap().unwrap();

    assert!(body.starts_with("HTTP/1.1 200"));
    assert!(body.ends_with("ok"));
}

#[tokio::test]
async fn slow_license_check_does_not_hold_back_replies() {
    let h = harness_with(
        Arc::new(SlowLicense { delay: Duration::from_secs(3) }),
        Arc::new(RecordingUpstream::default()),
    );
    let addr = serve(&h).await;
    let mut ws = client(addr).await;

    let frame = json!({ "event": "GenerateMatches", "data": { "userId": "u1", "sessionId": "s1" } });
    ws.send(Message::Text(frame.to_string())).await.unwrap();
    sleep(Duration::from_millis(200)).await;

    let started = Instant::now();
    h.relay
        .on_upstream_chat_response(ChatResponse { user_id: "u1".into(), reply: "hi".into() })
        .await
        .unwrap();

    let reply = next_json(&mut ws).await;
    assert!(started.elapsed() < Duration::from_millis(500), "reply took {:?}", started.elapsed());
    assert_eq!(reply, json!({ "event": "RAIN_response", "data": { "userId": "u1", "text": "hi" } }));

    // the gated request still goes through once the check completes
    let sent = wait_for_requests(&h, 1).await;
    assert!(matches!(&sent[0], UpstreamRequest::Matchmaking(_)));
}

fn contains(hay: &[u8], needle: &[u8]) -> bool {
    hay.windows(needle.len()).any(|w| w == needle)
}

#[tokio::test]
async fn silent_client_is_pinged_then_closed_for_idleness() {
    let h = harness(&[]);
    let addr = serve_with(
        &h,
        r#"
version: 1
gateway:
  ping_interval_ms: 5000
  idle_timeout_ms: 10000
upstream:
  url: "ws://127.0.0.1:1"
"#,
    )
    .await;

    // Raw socket: never answers pings, so only the idle timer can end the session.
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(
            b"GET /v1/ws HTTP/1.1\r\n\
              Host: localhost\r\n\
              Upgrade: websocket\r\n\
              Connection: Upgrade\r\n\
              Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
              Sec-WebSocket-Version: 13\r\n\r\n",
        )
        .await
        .unwrap();

    let started = Instant::now();
    let mut raw = Vec::new();
    timeout(Duration::from_secs(20), stream.read_to_end(&mut raw))
        .await
        .unwrap()
        .unwrap();
    let elapsed = started.elapsed();

    assert!(raw.starts_with(b"HTTP/1.1 101"));
    assert!(contains(&raw, &[0x89, 0x00]), "expected an empty ping frame");
    assert!(contains(&raw, br#""code":"TIMEOUT""#), "expected an idle timeout error");
    assert!(contains(&raw, &[0x88, 0x00]), "expected a close frame");
    assert!(elapsed >= Duration::from_secs(9), "closed too early: {elapsed:?}");

    timeout(WAIT, async {
        while !h.clients.is_empty() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

//! Decode-once codec for the client transport.
//!
//! - Text frames => `ClientInbound` (strict envelope)
//! - Binary frames are not part of the client protocol and are surfaced as such
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;
use rain_relay_core::{error::Result, protocol::client};

#[derive(Debug)]
pub enum Inbound {
    Event { ev: client::ClientInbound, bytes_len: usize },
    Binary { bytes_len: usize },
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

/// Cheap frame length, checked before decoding.
pub fn frame_len(msg: &Message) -> usize {
    match msg {
        Message::Text(s) => s.len(),
        Message::Binary(b) => b.len(),
        Message::Ping(v) => v.len(),
        Message::Pong(v) => v.len(),
        Message::Close(_) => 0,
    }
}

pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => {
            let bytes_len = s.len();
            let ev = client::decode(&s)?;
            Ok(Inbound::Event { ev, bytes_len })
        }
        Message::Binary(b) => Ok(Inbound::Binary { bytes_len: b.len() }),
        Message::Ping(v) => Ok(Inbound::Ping(v)),
        Message::Pong(v) => Ok(Inbound::Pong(v)),
        Message::Close(_) => Ok(Inbound::Close),
    }
}

//! Transport layer (client WebSocket).
//!
//! Exposes the WS upgrade handler and the codec that decodes frames once
//! before they reach the relay.

pub mod codec;
pub mod ws;

//! Protocol modules (client lane + upstream lane + audit records).
//!
//! Both realtime lanes share one JSON envelope shape, `{"event": .., "data": ..}`,
//! mirroring named-event realtime messaging:
//! - Client lane: camelCase payloads exchanged with browser/app sockets.
//! - Upstream lane: snake_case payloads exchanged with the matchmaking peer.
//!
//! Decoding never panics: malformed input is reported as `RelayError`.

pub mod audit;
pub mod client;
pub mod upstream;

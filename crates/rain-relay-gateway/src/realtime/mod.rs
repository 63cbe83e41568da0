//! Realtime runtime for the relay.
//!
//! Owns the per-process routing state shared by the transport and the relay.

pub mod core;

pub use core::{ClientRegistry, Connection, SessionStore, DEFAULT_SESSION};

//! Realtime core components for the relay runtime.
//!
//! Client connection registry (who to deliver replies to) and the session
//! store (which matchmaking session a user is in).

mod client_registry;
mod session_store;

pub use client_registry::{ClientRegistry, Connection};
pub use session_store::{SessionStore, DEFAULT_SESSION};

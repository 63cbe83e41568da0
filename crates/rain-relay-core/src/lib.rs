//! RAIN relay core: transport-agnostic wire contracts and the shared error type.
//!
//! This crate defines the client-facing and upstream-facing event envelopes,
//! the audit record format, and the error surface shared by the gateway and
//! its tests. It carries no transport or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `RelayError`/`Result` so a malformed
//! frame from a client or the upstream peer never takes the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{RelayError, Result};

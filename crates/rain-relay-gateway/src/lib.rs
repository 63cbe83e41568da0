//! RAIN relay gateway library entry.
//!
//! This crate wires the client transport, the relay service, and its
//! collaborators (license gate, session store, audit log, upstream link) into
//! one gateway stack. It is consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod audit;
pub mod config;
pub mod license;
pub mod realtime;
pub mod router;
pub mod services;
pub mod transport;
pub mod upstream;

//! Relay services.

pub mod relay;

pub use relay::{ClientRelay, InboundOutcome};

//! Top-level facade crate for the RAIN relay.
//!
//! Re-exports the wire contracts and the gateway library so users can depend on a single crate.

pub mod core {
    pub use rain_relay_core::*;
}

pub mod gateway {
    pub use rain_relay_gateway::*;
}

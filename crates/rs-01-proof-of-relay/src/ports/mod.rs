//! Ports layer for the proof-of-relay subsystem.
//!
//! - Inbound (Driving) port: `ProofOfRelayApi`
//! - Outbound (Driven) port: `AccountIndexer`

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;

//! Ports layer for the account agent.
//!
//! - Inbound (Driving) port: `AccountApi`
//! - Outbound (Driven) ports: `ChainClient`, `ChainIndexer`, `BalanceSource`

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;

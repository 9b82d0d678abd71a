//! Cross-crate settlement flows.

pub mod fixtures;
mod nonce_safety;
mod ticket_redemption;

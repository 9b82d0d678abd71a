//! # Shared Types Crate
//!
//! Entities shared by the proof-of-relay and account subsystems.
//!
//! ## Design Principles
//!
//! - **Fixed-width identities**: addresses are `[u8; 20]`, hashes `[u8; 32]`.
//! - **No unit mixing**: channel-token amounts (`Balance`) and native coin
//!   amounts (`NativeBalance`) are distinct types with no implicit conversion.
//! - **Deterministic time**: everything that reads the clock goes through
//!   `TimeSource` so tests can drive expiry by hand.

pub mod entities;
pub mod errors;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use time::*;

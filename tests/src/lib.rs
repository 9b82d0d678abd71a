//! # Relay Settlement Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs          # in-memory indexer shared by the flows
//!     ├── nonce_safety.rs      # concurrent sends against one account
//!     └── ticket_redemption.rs # ticket issue → win check → redeem transaction
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p rs-tests
//! cargo bench -p rs-tests
//! ```

#![allow(dead_code)]

pub mod integration;

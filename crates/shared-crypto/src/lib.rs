//! # Shared Crypto - Settlement Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256 | Ticket hashes, challenges, secret chains |
//! | `ecdsa` | secp256k1 (recoverable) | Ticket signatures, account identity |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic nonces, low-S normalization (EIP-2)
//! - **Addresses**: last 20 bytes of keccak256 over the uncompressed public key

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{
    address_from_public_key, recover_address, RecoverableSignature, Secp256k1KeyPair,
    Secp256k1PublicKey,
};
pub use errors::CryptoError;
pub use hashing::{keccak256, keccak256_many, Hash};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! # Account Agent Subsystem (RS-02)
//!
//! Issues signed transactions for one account without nonce collisions,
//! lost transactions or double submission.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): ledger, nonce allocator, templates, balance cache
//! - **Ports Layer** (`ports/`): `AccountApi` (inbound); `ChainClient`,
//!   `ChainIndexer`, `BalanceSource` (outbound)
//! - **Service Layer** (`service.rs`): `AccountAgent`
//! - **Adapters** (`adapters/`): `InMemoryChain`
//!
//! ## Nonce Safety
//!
//! ```text
//! acquire(address) ── waits for the per-address lock (FIFO)
//!    │
//!    ├── next = max(on-chain count, max confirmed + 1, max fresh pending + 1)
//!    │
//!    └── held across sign → broadcast → add_pending, then released
//! ```
//!
//! Pending records older than `NonceConfig::stale_after_ms` do not count, so
//! a nonce whose transaction was dropped by the network is reused.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryChain, ScriptedOutcome};
pub use config::{AgentConfig, BalanceCacheConfig, NonceConfig};
pub use domain::cache::BalanceCache;
pub use domain::errors::{NonceError, SendError, TemplateError};
pub use domain::ledger::{NonceRecord, TransactionLedger};
pub use domain::nonce::{BlockSource, NonceAllocator, NonceLock};
pub use domain::template::{TransactionRequest, TransactionTemplate};
pub use ports::inbound::AccountApi;
pub use ports::outbound::{
    BalanceSource, BroadcastOutcome, ChainClient, ChainIndexer, SignedTransaction,
    TransactionReceipt,
};
pub use service::{AccountAgent, ChainPorts, SentTransaction, TransactionStatus, DUPLICATE_MARKER};

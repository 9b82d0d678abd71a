//! # Domain Layer - Account Agent
//!
//! ## Components
//!
//! - `ledger`: pending/confirmed transaction records
//! - `nonce`: per-address nonce locks and high-water-mark computation
//! - `template`: transaction templates and their validation
//! - `cache`: time-boxed balance cache
//! - `errors`: NonceError, TemplateError, SendError

pub mod cache;
pub mod errors;
pub mod ledger;
pub mod nonce;
pub mod template;

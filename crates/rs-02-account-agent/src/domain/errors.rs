//! # Account Agent Errors

use shared_types::{to_hex, ChainError, Hash};
use thiserror::Error;

/// Errors while computing the next nonce.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NonceError {
    /// Reading the transaction count or latest block failed.
    #[error("Chain error while computing nonce: {0}")]
    Chain(#[from] ChainError),
}

/// A transaction template that cannot be sent as is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// Gas budget of zero.
    #[error("Gas budget must be positive")]
    ZeroGas,

    /// No recipient and no data.
    #[error("Transaction has neither a recipient nor data")]
    EmptyTransaction,

    /// Template targets another chain.
    #[error("Chain id mismatch: expected {expected}, got {actual}")]
    ChainIdMismatch { expected: u64, actual: u64 },
}

/// Failure of `AccountAgent::send`, with the context gathered so far.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SendError {
    /// The template was rejected before a nonce was allocated.
    #[error("Invalid transaction template: {0}")]
    InvalidTemplate(#[from] TemplateError),

    /// No nonce could be allocated.
    #[error("Nonce allocation failed: {0}")]
    Nonce(#[from] NonceError),

    /// Signing failed, or the client could not reach the node.
    #[error("Chain error at nonce {nonce} (tx {}): {source}", display_hash(.hash))]
    Chain {
        nonce: u64,
        hash: Option<Hash>,
        source: ChainError,
    },

    /// The node refused the transaction or reported an error without a
    /// receipt. Nothing stays in the ledger for it.
    #[error("Broadcast rejected at nonce {nonce} (tx {}): {message}", to_hex(.hash))]
    BroadcastRejected {
        nonce: u64,
        hash: Hash,
        message: String,
    },

    /// The outcome channel closed before the node reported anything.
    #[error("Outcome of tx {} was never reported", to_hex(.0))]
    OutcomeLost(Hash),
}

fn display_hash(hash: &Option<Hash>) -> String {
    hash.as_ref().map(|h| to_hex(h)).unwrap_or_else(|| "unsigned".to_string())
}

//! # Error Types
//!
//! Errors reported by the external chain collaborators (indexer and client).

use thiserror::Error;

/// Failure of an external chain collaborator.
///
/// These are never retried inside the settlement core; they propagate to the
/// immediate caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    /// The RPC endpoint could not be reached or returned a transport error.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The indexer has not processed the requested data yet.
    #[error("Indexer unavailable: {0}")]
    IndexerUnavailable(String),

    /// The client refused to sign the transaction.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// The node rejected the raw transaction at submission time.
    #[error("Submission rejected: {0}")]
    Submission(String),
}

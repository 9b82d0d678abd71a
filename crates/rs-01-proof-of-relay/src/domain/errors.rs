//! # Proof-of-Relay Errors

use shared_crypto::CryptoError;
use shared_types::ChainError;
use thiserror::Error;

/// Errors while building, encoding or decoding a ticket.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TicketError {
    /// A numeric field does not fit its fixed-width slot.
    #[error("Field `{field}` does not fit in {width} bytes")]
    EncodingOverflow { field: &'static str, width: usize },

    /// Win probability is not a decimal percentage in [0, 100].
    #[error("Invalid win probability percentage: {0}")]
    InvalidWinProbability(String),

    /// Encoded ticket has the wrong length.
    #[error("Invalid encoded ticket length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Signing or signer recovery failed.
    #[error("Signature error: {0}")]
    Signature(#[from] CryptoError),
}

/// Errors from the proof-of-relay win check.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PorError {
    /// No committed secret exists on-chain for this account.
    #[error("On-chain secret is not initialized")]
    SecretNotInitialized,

    /// The committed secret is not a link of the local secret chain.
    #[error("No preimage found for committed secret {0}")]
    PreImageNotFound(String),

    /// The chain was exhausted by a terminal win; a new secret must be
    /// committed before further tickets can be checked.
    #[error("Secret chain exhausted, waiting for rotation")]
    RotationPending,

    /// Reading the committed secret from the indexer failed.
    #[error("Indexer error: {0}")]
    Indexer(#[from] ChainError),
}

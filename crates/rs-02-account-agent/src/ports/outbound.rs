//! # Outbound Ports
//!
//! The blockchain client and the chain-state indexer, consumed by the agent.
//! Implementations report failures as `ChainError` and never retry.

use crate::domain::template::TransactionRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_crypto::Secp256k1KeyPair;
use shared_types::{AccountId, Address, Balance, ChainError, ChannelEntry, Hash, NativeBalance};
use tokio::sync::oneshot;

/// A transaction signed by the client, ready for broadcast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub hash: Hash,
    pub from: Address,
    pub nonce: u64,
    /// Raw encoded transaction.
    pub raw: Vec<u8>,
}

/// Receipt of a mined transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_hash: Hash,
    pub block_number: u64,
    /// `false` if execution reverted.
    pub success: bool,
}

/// What the node eventually reported for a broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// The transaction was mined.
    Receipt(TransactionReceipt),
    /// The node reported an error, possibly with a receipt of a reverted
    /// transaction attached.
    Error {
        message: String,
        receipt: Option<TransactionReceipt>,
    },
}

/// Blockchain client.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Latest block as seen by the client.
    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Number of transactions sent from `address` up to `block`
    /// (latest when `None`).
    async fn get_transaction_count(
        &self,
        address: &Address,
        block: Option<u64>,
    ) -> Result<u64, ChainError>;

    /// Sign `request` with `signer`.
    async fn sign_transaction(
        &self,
        request: &TransactionRequest,
        signer: &Secp256k1KeyPair,
    ) -> Result<SignedTransaction, ChainError>;

    /// Submit a signed transaction.
    ///
    /// `Err` means the node refused it outright. Otherwise the receiver
    /// yields exactly one outcome once the node reports back.
    async fn send_signed_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<oneshot::Receiver<BroadcastOutcome>, ChainError>;
}

/// Chain-state indexer.
#[async_trait]
pub trait ChainIndexer: Send + Sync {
    /// Latest indexed block.
    async fn latest_block(&self) -> Result<u64, ChainError>;

    /// Channels funded by `source`.
    async fn channels_from(&self, source: &AccountId) -> Result<Vec<ChannelEntry>, ChainError>;
}

/// Token and native balance lookups.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn balance(&self, account: &AccountId) -> Result<Balance, ChainError>;

    async fn native_balance(&self, account: &AccountId) -> Result<NativeBalance, ChainError>;
}

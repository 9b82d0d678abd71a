//! # Inbound Port - AccountApi
//!
//! Driving port used by the node to send transactions and read balances.

use crate::domain::errors::SendError;
use crate::domain::template::TransactionTemplate;
use crate::service::SentTransaction;
use async_trait::async_trait;
use shared_types::{AccountId, Balance, ChainError, ChannelEntry, NativeBalance};

/// Account operations of the settlement layer.
///
/// # Example
///
/// ```rust,ignore
/// use rs_02_account_agent::{AccountApi, TransactionTemplate};
///
/// async fn redeem(agent: &impl AccountApi, channels: Address, call: Vec<u8>) {
///     let sent = agent.send(TransactionTemplate::call(channels, call)).await?;
///     let status = sent.outcome().await?;
/// }
/// ```
#[async_trait]
pub trait AccountApi: Send + Sync {
    /// Account the agent signs for.
    fn account(&self) -> AccountId;

    /// Sign and broadcast a transaction.
    ///
    /// Returns once the transaction is recorded as pending. The returned
    /// handle resolves when the node reports an outcome.
    ///
    /// # Errors
    /// - `InvalidTemplate`: template rejected before a nonce was taken
    /// - `Nonce`: chain facts for the nonce could not be read
    /// - `Chain`: signing or submission failed; nothing was recorded
    async fn send(&self, template: TransactionTemplate) -> Result<SentTransaction, SendError>;

    /// Channel-token balance, optionally from cache.
    async fn balance(&self, use_cache: bool) -> Result<Balance, ChainError>;

    /// Native coin balance, optionally from cache.
    async fn native_balance(&self, use_cache: bool) -> Result<NativeBalance, ChainError>;

    /// Channels funded by this account.
    async fn channels(&self) -> Result<Vec<ChannelEntry>, ChainError>;
}

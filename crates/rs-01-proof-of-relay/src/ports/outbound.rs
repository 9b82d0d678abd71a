//! # Outbound Ports
//!
//! Chain facts the proof-of-relay check depends on.

use async_trait::async_trait;
use shared_types::{AccountEntry, AccountId, ChainError};

/// Read access to the chain-state indexer.
#[async_trait]
pub trait AccountIndexer: Send + Sync {
    /// Account entry as last indexed, or `None` if the account never
    /// committed a secret.
    async fn get_account_entry(
        &self,
        account: &AccountId,
    ) -> Result<Option<AccountEntry>, ChainError>;
}

//! Shared fixtures for the integration flows.

use async_trait::async_trait;
use parking_lot::RwLock;
use rs_01_proof_of_relay::AccountIndexer;
use shared_types::{AccountEntry, AccountId, ChainError, Hash};
use std::collections::HashMap;

/// Route logs through the test harness and register metrics once.
pub fn setup() {
    settlement_telemetry::init_test_tracing();
    let _ = settlement_telemetry::register_metrics();
}

/// Account entries as an indexer would report them.
#[derive(Default)]
pub struct InMemoryAccountIndex {
    entries: RwLock<HashMap<AccountId, AccountEntry>>,
}

impl InMemoryAccountIndex {
    /// Record that `account` committed `secret`, bumping its counter.
    pub fn commit_secret(&self, account: AccountId, secret: Hash) {
        let mut entries = self.entries.write();
        let entry = entries.entry(account).or_insert(AccountEntry {
            counter: 0,
            hashed_secret: [0u8; 32],
        });
        entry.counter += 1;
        entry.hashed_secret = secret;
    }
}

#[async_trait]
impl AccountIndexer for InMemoryAccountIndex {
    async fn get_account_entry(
        &self,
        account: &AccountId,
    ) -> Result<Option<AccountEntry>, ChainError> {
        Ok(self.entries.read().get(account).copied())
    }
}

//! # Transaction Ledger
//!
//! Pending and confirmed transaction records of one account.
//!
//! ## Invariant
//!
//! A hash is in at most one of `pending` and `confirmed`.
//!
//! ```text
//! add_pending ──→ [pending] ──move_to_confirmed──→ [confirmed]
//!                     │
//!                  remove
//!                     ↓
//!                  (gone)
//! ```

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use settlement_telemetry::PENDING_TRANSACTIONS;
use shared_types::{Hash, TimeSource, Timestamp};
use std::collections::HashMap;
use std::sync::Arc;

/// Nonce and first-seen time of a broadcast transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceRecord {
    pub nonce: u64,
    /// Milliseconds since the epoch when the record was added.
    pub first_seen_at: Timestamp,
}

#[derive(Debug, Default)]
struct LedgerState {
    pending: HashMap<Hash, NonceRecord>,
    confirmed: HashMap<Hash, NonceRecord>,
}

/// In-memory record of the transactions an account has broadcast.
pub struct TransactionLedger {
    state: RwLock<LedgerState>,
    time: Arc<dyn TimeSource>,
}

impl TransactionLedger {
    /// Empty ledger stamping records with `time`.
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            time,
        }
    }

    /// Record a broadcast transaction as pending.
    ///
    /// Returns `false` and leaves the ledger untouched if the hash is already
    /// tracked.
    pub fn add_pending(&self, hash: Hash, nonce: u64) -> bool {
        let mut state = self.state.write();
        if state.pending.contains_key(&hash) || state.confirmed.contains_key(&hash) {
            return false;
        }
        let record = NonceRecord {
            nonce,
            first_seen_at: self.time.now(),
        };
        state.pending.insert(hash, record);
        PENDING_TRANSACTIONS.inc();
        true
    }

    /// Move a pending record to confirmed. No-op if it is not pending.
    pub fn move_to_confirmed(&self, hash: &Hash) -> bool {
        let mut state = self.state.write();
        match state.pending.remove(hash) {
            Some(record) => {
                state.confirmed.insert(*hash, record);
                PENDING_TRANSACTIONS.dec();
                true
            }
            None => false,
        }
    }

    /// Drop a pending record. No-op if it is not pending.
    pub fn remove(&self, hash: &Hash) -> bool {
        let removed = self.state.write().pending.remove(hash).is_some();
        if removed {
            PENDING_TRANSACTIONS.dec();
        }
        removed
    }

    pub fn pending_snapshot(&self) -> HashMap<Hash, NonceRecord> {
        self.state.read().pending.clone()
    }

    pub fn confirmed_snapshot(&self) -> HashMap<Hash, NonceRecord> {
        self.state.read().confirmed.clone()
    }

    /// Highest confirmed nonce.
    pub fn max_confirmed_nonce(&self) -> Option<u64> {
        self.state.read().confirmed.values().map(|r| r.nonce).max()
    }

    /// Highest pending nonce first seen within `stale_after_ms` of `now`.
    ///
    /// Stale records are skipped, not deleted.
    pub fn max_fresh_pending_nonce(&self, now: Timestamp, stale_after_ms: u64) -> Option<u64> {
        self.state
            .read()
            .pending
            .values()
            .filter(|r| now.saturating_sub(r.first_seen_at) <= stale_after_ms)
            .map(|r| r.nonce)
            .max()
    }
}

impl std::fmt::Debug for TransactionLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("TransactionLedger")
            .field("pending", &state.pending.len())
            .field("confirmed", &state.confirmed.len())
            .finish()
    }
}

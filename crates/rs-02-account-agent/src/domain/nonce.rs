//! # Nonce Allocator
//!
//! Hands out one `NonceLock` per address at a time.
//!
//! ```text
//! next = max(
//!     chain tx count at latest block,
//!     highest confirmed nonce + 1,
//!     highest fresh pending nonce + 1,
//! )
//! ```
//!
//! The lock is held by the caller until the transaction is in the ledger's
//! pending set or the attempt is abandoned. Dropping the lock releases it.

use super::errors::NonceError;
use super::ledger::TransactionLedger;
use crate::config::NonceConfig;
use crate::ports::outbound::{ChainClient, ChainIndexer};
use parking_lot::Mutex;
use shared_types::{to_hex, Address, TimeSource};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Where the latest block number is read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockSource {
    /// The chain indexer.
    Indexer,
    /// The chain client (local development chains).
    Client,
}

/// Per-address async locks. An entry lives only while someone holds or
/// waits on it.
#[derive(Default)]
struct LockTable {
    locks: Mutex<HashMap<Address, Arc<AsyncMutex<()>>>>,
}

impl LockTable {
    fn lock_for(&self, address: &Address) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.locks.lock().entry(*address).or_default())
    }

    /// Drop the entry for `address` if the table holds the only reference.
    fn prune(&self, address: &Address) {
        let mut locks = self.locks.lock();
        if locks
            .get(address)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(address);
        }
    }

    fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

/// Exclusive right to use `next_nonce` for `address`.
#[must_use = "the nonce is reserved only while the lock is held"]
pub struct NonceLock {
    address: Address,
    next_nonce: u64,
    guard: Option<OwnedMutexGuard<()>>,
    table: Arc<LockTable>,
}

impl NonceLock {
    pub fn next_nonce(&self) -> u64 {
        self.next_nonce
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Release the lock. Consumes the handle, so it happens at most once.
    pub fn release(self) {
        debug!(
            address = %to_hex(&self.address),
            nonce = self.next_nonce,
            "[rs-02] Nonce lock released"
        );
    }
}

impl Drop for NonceLock {
    fn drop(&mut self) {
        // The guard owns a reference to the table entry.
        self.guard.take();
        self.table.prune(&self.address);
    }
}

impl std::fmt::Debug for NonceLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceLock")
            .field("address", &to_hex(&self.address))
            .field("next_nonce", &self.next_nonce)
            .finish()
    }
}

/// Computes safe nonces and serializes allocation per address.
pub struct NonceAllocator {
    ledger: Arc<TransactionLedger>,
    client: Arc<dyn ChainClient>,
    indexer: Arc<dyn ChainIndexer>,
    time: Arc<dyn TimeSource>,
    config: NonceConfig,
    block_source: BlockSource,
    locks: Arc<LockTable>,
}

impl NonceAllocator {
    pub fn new(
        ledger: Arc<TransactionLedger>,
        client: Arc<dyn ChainClient>,
        indexer: Arc<dyn ChainIndexer>,
        time: Arc<dyn TimeSource>,
        config: NonceConfig,
        block_source: BlockSource,
    ) -> Self {
        Self {
            ledger,
            client,
            indexer,
            time,
            config,
            block_source,
            locks: Arc::default(),
        }
    }

    /// Wait for the lock on `address` and compute its next nonce.
    ///
    /// Waiters are admitted in arrival order. Other addresses are never
    /// blocked. On error the lock is released before returning.
    pub async fn acquire(&self, address: &Address) -> Result<NonceLock, NonceError> {
        let guard = self.locks.lock_for(address).lock_owned().await;
        let mut held = NonceLock {
            address: *address,
            next_nonce: 0,
            guard: Some(guard),
            table: Arc::clone(&self.locks),
        };

        held.next_nonce = self.next_nonce(address).await?;
        debug!(
            address = %to_hex(address),
            nonce = held.next_nonce,
            "[rs-02] Nonce lock acquired"
        );

        Ok(held)
    }

    /// Addresses with a lock currently held or awaited.
    pub fn locked_addresses(&self) -> usize {
        self.locks.len()
    }

    async fn next_nonce(&self, address: &Address) -> Result<u64, NonceError> {
        let block = match self.block_source {
            BlockSource::Indexer => self.indexer.latest_block().await?,
            BlockSource::Client => self.client.block_number().await?,
        };
        let on_chain = self.client.get_transaction_count(address, Some(block)).await?;

        let confirmed = self.ledger.max_confirmed_nonce().map(|n| n + 1);
        let pending = self
            .ledger
            .max_fresh_pending_nonce(self.time.now(), self.config.stale_after_ms)
            .map(|n| n + 1);

        Ok([confirmed, pending]
            .into_iter()
            .flatten()
            .fold(on_chain, u64::max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryChain;
    use shared_types::ManualTimeSource;
    use std::time::Duration;

    const ALICE: Address = [0xA1; 20];
    const BOB: Address = [0xB0; 20];

    struct Fixture {
        chain: Arc<InMemoryChain>,
        ledger: Arc<TransactionLedger>,
        time: Arc<ManualTimeSource>,
        allocator: Arc<NonceAllocator>,
    }

    fn fixture() -> Fixture {
        let chain = Arc::new(InMemoryChain::new(1337));
        let time = Arc::new(ManualTimeSource::new(1_000_000));
        let ledger = Arc::new(TransactionLedger::new(time.clone()));
        let allocator = Arc::new(NonceAllocator::new(
            ledger.clone(),
            chain.clone(),
            chain.clone(),
            time.clone(),
            NonceConfig::default(),
            BlockSource::Indexer,
        ));
        Fixture {
            chain,
            ledger,
            time,
            allocator,
        }
    }

    #[tokio::test]
    async fn test_on_chain_count_then_pending() {
        let f = fixture();
        f.chain.set_transaction_count(ALICE, 5);

        let lock = f.allocator.acquire(&ALICE).await.unwrap();
        assert_eq!(lock.next_nonce(), 5);
        f.ledger.add_pending([1; 32], lock.next_nonce());
        lock.release();

        let lock = f.allocator.acquire(&ALICE).await.unwrap();
        assert_eq!(lock.next_nonce(), 6);
    }

    #[tokio::test]
    async fn test_stale_pending_ignored() {
        let f = fixture();
        f.ledger.add_pending([7; 32], 7);
        f.time.advance(NonceConfig::default().stale_after_ms + 1);
        f.chain.set_transaction_count(ALICE, 6);

        let lock = f.allocator.acquire(&ALICE).await.unwrap();
        assert_eq!(lock.next_nonce(), 6);
    }

    #[tokio::test]
    async fn test_confirmed_high_water_mark() {
        let f = fixture();
        f.chain.set_transaction_count(ALICE, 2);
        f.ledger.add_pending([3; 32], 9);
        f.ledger.move_to_confirmed(&[3; 32]);

        let lock = f.allocator.acquire(&ALICE).await.unwrap();
        assert_eq!(lock.next_nonce(), 10);
    }

    #[tokio::test]
    async fn test_block_number_from_client() {
        let f = fixture();
        f.chain.set_transaction_count(ALICE, 4);
        let allocator = NonceAllocator::new(
            f.ledger.clone(),
            f.chain.clone(),
            f.chain.clone(),
            f.time.clone(),
            NonceConfig::default(),
            BlockSource::Client,
        );

        assert_eq!(allocator.acquire(&ALICE).await.unwrap().next_nonce(), 4);
    }

    #[tokio::test]
    async fn test_error_releases_lock() {
        let f = fixture();
        f.chain.fail_next_count("rpc down");

        assert!(matches!(
            f.allocator.acquire(&ALICE).await,
            Err(NonceError::Chain(_))
        ));
        let lock = tokio::time::timeout(Duration::from_secs(1), f.allocator.acquire(&ALICE))
            .await
            .expect("lock was not released on error");
        assert!(lock.is_ok());
    }

    #[tokio::test]
    async fn test_second_acquire_waits_for_release() {
        let f = fixture();
        let held = f.allocator.acquire(&ALICE).await.unwrap();

        let allocator = f.allocator.clone();
        let waiter = tokio::spawn(async move { allocator.acquire(&ALICE).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        held.release();
        let lock = waiter.await.unwrap().unwrap();
        assert_eq!(lock.next_nonce(), 0);
    }

    #[tokio::test]
    async fn test_lock_entries_dropped_when_unused() {
        let f = fixture();
        let held = f.allocator.acquire(&ALICE).await.unwrap();
        let _bob = f.allocator.acquire(&BOB).await.unwrap();
        assert_eq!(f.allocator.locked_addresses(), 2);

        let allocator = f.allocator.clone();
        let waiter = tokio::spawn(async move { allocator.acquire(&ALICE).await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        held.release();
        let next = waiter.await.unwrap().unwrap();
        // The waiter still owns ALICE's entry.
        assert_eq!(f.allocator.locked_addresses(), 2);

        next.release();
        assert_eq!(f.allocator.locked_addresses(), 1);
    }

    #[tokio::test]
    async fn test_failed_acquire_leaves_no_entry() {
        let f = fixture();
        f.chain.fail_next_count("rpc down");

        assert!(f.allocator.acquire(&ALICE).await.is_err());
        assert_eq!(f.allocator.locked_addresses(), 0);
    }

    #[tokio::test]
    async fn test_distinct_addresses_do_not_block() {
        let f = fixture();
        let _alice = f.allocator.acquire(&ALICE).await.unwrap();

        let bob = tokio::time::timeout(Duration::from_secs(1), f.allocator.acquire(&BOB)).await;
        assert!(bob.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_acquires_are_contiguous() {
        let f = fixture();
        f.chain.set_transaction_count(ALICE, 5);

        let handles: Vec<_> = (0..20u8)
            .map(|i| {
                let allocator = f.allocator.clone();
                let ledger = f.ledger.clone();
                tokio::spawn(async move {
                    let lock = allocator.acquire(&ALICE).await.unwrap();
                    let nonce = lock.next_nonce();
                    tokio::task::yield_now().await;
                    ledger.add_pending([i; 32], nonce);
                    lock.release();
                    nonce
                })
            })
            .collect();

        let mut nonces = Vec::new();
        for handle in handles {
            nonces.push(handle.await.unwrap());
        }
        nonces.sort_unstable();

        assert_eq!(nonces, (5..25).collect::<Vec<_>>());
    }
}

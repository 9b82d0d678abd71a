//! # Account Agent Service
//!
//! Signs and broadcasts transactions for one account and keeps the ledger in
//! step with what the node reports.
//!
//! ## Send Flow
//!
//! ```text
//! send(template)
//!   ├── validate template
//!   ├── acquire nonce lock ───────────────┐
//!   ├── merge nonce + defaults, sign      │ lock held
//!   ├── broadcast                         │
//!   │     refused "already known" → duplicate
//!   │     refused otherwise       → BroadcastRejected
//!   ├── ledger.add_pending(hash, nonce)   │
//!   └── release lock ─────────────────────┘
//!
//! outcome (background task)
//!   ├── receipt                  → confirmed
//!   ├── error "already known"    → duplicate, ledger untouched
//!   ├── error with receipt       → confirmed (reverted)
//!   └── error without receipt    → removed, BroadcastRejected
//! ```

use crate::config::AgentConfig;
use crate::domain::cache::BalanceCache;
use crate::domain::errors::SendError;
use crate::domain::ledger::TransactionLedger;
use crate::domain::nonce::{BlockSource, NonceAllocator};
use crate::domain::template::TransactionTemplate;
use crate::ports::inbound::AccountApi;
use crate::ports::outbound::{BalanceSource, BroadcastOutcome, ChainClient, ChainIndexer};
use async_trait::async_trait;
use settlement_telemetry::{metric_inc, TRANSACTIONS_SENT, TRANSACTION_OUTCOMES};
use shared_crypto::{Secp256k1KeyPair, Secp256k1PublicKey};
use shared_types::{
    to_hex, AccountId, Balance, ChainError, ChannelEntry, Hash, NativeBalance, TimeSource,
};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Error text nodes use for a transaction they already have.
pub const DUPLICATE_MARKER: &str = "already known";

/// Final state of a broadcast transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Mined and executed.
    Confirmed { block_number: u64 },
    /// Mined but reverted; the nonce is consumed.
    Reverted { block_number: u64 },
    /// The node already had this transaction.
    Duplicate,
}

/// Handle to a transaction that was broadcast and recorded as pending.
#[derive(Debug)]
pub struct SentTransaction {
    pub hash: Hash,
    pub nonce: u64,
    outcome: JoinHandle<Result<TransactionStatus, SendError>>,
}

impl SentTransaction {
    /// Wait for the node to report on the transaction.
    ///
    /// Dropping the handle instead does not stop ledger reconciliation.
    pub async fn outcome(self) -> Result<TransactionStatus, SendError> {
        self.outcome
            .await
            .unwrap_or(Err(SendError::OutcomeLost(self.hash)))
    }
}

/// Chain collaborators of an agent.
#[derive(Clone)]
pub struct ChainPorts {
    pub client: Arc<dyn ChainClient>,
    pub indexer: Arc<dyn ChainIndexer>,
    pub balances: Arc<dyn BalanceSource>,
}

/// Transaction and balance agent for one account.
pub struct AccountAgent {
    keypair: Secp256k1KeyPair,
    account: AccountId,
    config: AgentConfig,
    ledger: Arc<TransactionLedger>,
    allocator: NonceAllocator,
    ports: ChainPorts,
    balance_cache: BalanceCache<Balance>,
    native_balance_cache: BalanceCache<NativeBalance>,
}

impl AccountAgent {
    pub fn new(
        keypair: Secp256k1KeyPair,
        config: AgentConfig,
        ports: ChainPorts,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        let account = AccountId::new(keypair.address());
        let ledger = Arc::new(TransactionLedger::new(time.clone()));
        let block_source = if config.use_client_block_number {
            BlockSource::Client
        } else {
            BlockSource::Indexer
        };
        let allocator = NonceAllocator::new(
            ledger.clone(),
            ports.client.clone(),
            ports.indexer.clone(),
            time.clone(),
            config.nonce,
            block_source,
        );

        info!(
            account = %account,
            network = %config.network,
            chain_id = config.chain_id,
            "[rs-02] Account agent ready"
        );

        Self {
            keypair,
            account,
            ledger,
            allocator,
            balance_cache: BalanceCache::new(config.balance_cache, time.clone()),
            native_balance_cache: BalanceCache::new(config.balance_cache, time),
            config,
            ports,
        }
    }

    pub fn public_key(&self) -> Secp256k1PublicKey {
        self.keypair.public_key()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// The agent's transaction ledger.
    pub fn ledger(&self) -> &Arc<TransactionLedger> {
        &self.ledger
    }
}

#[async_trait]
impl AccountApi for AccountAgent {
    fn account(&self) -> AccountId {
        self.account
    }

    async fn send(&self, template: TransactionTemplate) -> Result<SentTransaction, SendError> {
        template.validate(&self.config)?;

        let lock = self.allocator.acquire(self.account.as_bytes()).await?;
        let nonce = lock.next_nonce();
        let request = template.resolve(nonce, &self.config)?;

        let signed = self
            .ports
            .client
            .sign_transaction(&request, &self.keypair)
            .await
            .map_err(|source| SendError::Chain {
                nonce,
                hash: None,
                source,
            })?;

        info!(
            nonce,
            tx_hash = %to_hex(&signed.hash),
            gas = request.gas,
            gas_price = ?request.gas_price,
            "[rs-02] Sending transaction"
        );

        let receiver = match self.ports.client.send_signed_transaction(&signed).await {
            Ok(receiver) => receiver,
            // The node holds this transaction already; track it like any
            // other broadcast so the nonce stays taken.
            Err(ChainError::Submission(message)) if message.contains(DUPLICATE_MARKER) => {
                let (sender, receiver) = oneshot::channel();
                let _ = sender.send(BroadcastOutcome::Error {
                    message,
                    receipt: None,
                });
                receiver
            }
            Err(ChainError::Submission(message)) => {
                metric_inc!(TRANSACTION_OUTCOMES, &["rejected"]);
                warn!(
                    nonce,
                    tx_hash = %to_hex(&signed.hash),
                    error = %message,
                    "[rs-02] Broadcast refused"
                );
                return Err(SendError::BroadcastRejected {
                    nonce,
                    hash: signed.hash,
                    message,
                });
            }
            Err(source) => {
                return Err(SendError::Chain {
                    nonce,
                    hash: Some(signed.hash),
                    source,
                })
            }
        };

        if !self.ledger.add_pending(signed.hash, nonce) {
            warn!(
                nonce,
                tx_hash = %to_hex(&signed.hash),
                "[rs-02] Transaction already tracked as pending"
            );
        }
        metric_inc!(TRANSACTIONS_SENT);
        lock.release();

        let outcome = tokio::spawn(reconcile(
            Arc::clone(&self.ledger),
            signed.hash,
            nonce,
            receiver,
        ));

        Ok(SentTransaction {
            hash: signed.hash,
            nonce,
            outcome,
        })
    }

    async fn balance(&self, use_cache: bool) -> Result<Balance, ChainError> {
        if use_cache {
            if let Some(balance) = self.balance_cache.get() {
                return Ok(balance);
            }
        }
        let balance = self.ports.balances.balance(&self.account).await?;
        self.balance_cache.set(balance);
        Ok(balance)
    }

    async fn native_balance(&self, use_cache: bool) -> Result<NativeBalance, ChainError> {
        if use_cache {
            if let Some(balance) = self.native_balance_cache.get() {
                return Ok(balance);
            }
        }
        let balance = self.ports.balances.native_balance(&self.account).await?;
        self.native_balance_cache.set(balance);
        Ok(balance)
    }

    async fn channels(&self) -> Result<Vec<ChannelEntry>, ChainError> {
        self.ports.indexer.channels_from(&self.account).await
    }
}

/// Apply the node's verdict on a broadcast to the ledger.
async fn reconcile(
    ledger: Arc<TransactionLedger>,
    hash: Hash,
    nonce: u64,
    receiver: oneshot::Receiver<BroadcastOutcome>,
) -> Result<TransactionStatus, SendError> {
    let Ok(outcome) = receiver.await else {
        warn!(nonce, tx_hash = %to_hex(&hash), "[rs-02] Broadcast outcome never arrived");
        return Err(SendError::OutcomeLost(hash));
    };

    match outcome {
        BroadcastOutcome::Receipt(receipt) => {
            ledger.move_to_confirmed(&hash);
            let block_number = receipt.block_number;
            if receipt.success {
                metric_inc!(TRANSACTION_OUTCOMES, &["confirmed"]);
                Ok(TransactionStatus::Confirmed { block_number })
            } else {
                metric_inc!(TRANSACTION_OUTCOMES, &["reverted"]);
                warn!(nonce, tx_hash = %to_hex(&hash), "[rs-02] Transaction reverted");
                Ok(TransactionStatus::Reverted { block_number })
            }
        }
        BroadcastOutcome::Error { message, .. } if message.contains(DUPLICATE_MARKER) => {
            metric_inc!(TRANSACTION_OUTCOMES, &["duplicate"]);
            info!(nonce, tx_hash = %to_hex(&hash), "[rs-02] Transaction already known to node");
            Ok(TransactionStatus::Duplicate)
        }
        BroadcastOutcome::Error {
            message,
            receipt: Some(receipt),
        } => {
            metric_inc!(TRANSACTION_OUTCOMES, &["reverted"]);
            warn!(
                nonce,
                tx_hash = %to_hex(&hash),
                error = %message,
                block = receipt.block_number,
                "[rs-02] Transaction failed with receipt"
            );
            ledger.move_to_confirmed(&hash);
            Ok(TransactionStatus::Reverted {
                block_number: receipt.block_number,
            })
        }
        BroadcastOutcome::Error {
            message,
            receipt: None,
        } => {
            metric_inc!(TRANSACTION_OUTCOMES, &["rejected"]);
            warn!(
                nonce,
                tx_hash = %to_hex(&hash),
                error = %message,
                "[rs-02] Transaction failed without receipt"
            );
            ledger.remove(&hash);
            Err(SendError::BroadcastRejected {
                nonce,
                hash,
                message,
            })
        }
    }
}

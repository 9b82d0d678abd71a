//! In-Memory Chain Adapter
//!
//! Implements `ChainClient`, `ChainIndexer` and `BalanceSource` against
//! local state. Broadcast outcomes are scripted per submission, which makes
//! it the backing chain for tests and local simulations.

use crate::domain::template::TransactionRequest;
use crate::ports::outbound::{
    BalanceSource, BroadcastOutcome, ChainClient, ChainIndexer, SignedTransaction,
    TransactionReceipt,
};
use crate::service::ChainPorts;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_crypto::{keccak256, Secp256k1KeyPair};
use shared_types::{
    to_hex, AccountId, Address, Balance, ChainError, ChannelEntry, Hash, NativeBalance,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

/// How the next submitted transaction is answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptedOutcome {
    /// Mined; `success = false` means it reverted.
    Mined { success: bool },
    /// Node reports an error after accepting the submission.
    Error {
        message: String,
        with_receipt: bool,
    },
    /// Node refuses the submission outright.
    Refuse(ChainError),
    /// Outcome is withheld until `resolve_held` is called.
    Hold,
}

#[derive(Default)]
struct ChainState {
    block_number: u64,
    indexed_block: u64,
    tx_counts: HashMap<Address, u64>,
    count_failures: VecDeque<String>,
    sign_failures: VecDeque<String>,
    script: VecDeque<ScriptedOutcome>,
    held: HashMap<Hash, oneshot::Sender<BroadcastOutcome>>,
    submitted: Vec<SignedTransaction>,
    channels: Vec<ChannelEntry>,
    balances: HashMap<AccountId, Balance>,
    native_balances: HashMap<AccountId, NativeBalance>,
    balance_reads: u64,
}

/// A single-node chain kept in memory.
pub struct InMemoryChain {
    chain_id: u64,
    state: RwLock<ChainState>,
}

impl InMemoryChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            state: RwLock::new(ChainState::default()),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn set_transaction_count(&self, address: Address, count: u64) {
        self.state.write().tx_counts.insert(address, count);
    }

    /// Advance the client's block and, when `indexed`, the indexer's too.
    pub fn mine_empty_block(&self, indexed: bool) {
        let mut state = self.state.write();
        state.block_number += 1;
        if indexed {
            state.indexed_block = state.block_number;
        }
    }

    /// Make the next transaction-count read fail.
    pub fn fail_next_count(&self, message: &str) {
        self.state.write().count_failures.push_back(message.to_string());
    }

    /// Make the next signing request fail.
    pub fn fail_next_sign(&self, message: &str) {
        self.state.write().sign_failures.push_back(message.to_string());
    }

    /// Queue the outcome of the next submission. Unscripted submissions are mined.
    pub fn push_outcome(&self, outcome: ScriptedOutcome) {
        self.state.write().script.push_back(outcome);
    }

    /// Deliver the outcome of a held transaction. Returns `false` if it was
    /// not held.
    pub fn resolve_held(&self, hash: &Hash, outcome: BroadcastOutcome) -> bool {
        let sender = self.state.write().held.remove(hash);
        match sender {
            Some(sender) => sender.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Every transaction accepted for broadcast, in submission order.
    pub fn submitted(&self) -> Vec<SignedTransaction> {
        self.state.read().submitted.clone()
    }

    pub fn add_channel(&self, channel: ChannelEntry) {
        self.state.write().channels.push(channel);
    }

    pub fn set_balance(&self, account: AccountId, balance: Balance) {
        self.state.write().balances.insert(account, balance);
    }

    pub fn set_native_balance(&self, account: AccountId, balance: NativeBalance) {
        self.state.write().native_balances.insert(account, balance);
    }

    /// Number of balance lookups served so far.
    pub fn balance_reads(&self) -> u64 {
        self.state.read().balance_reads
    }

    fn mine(state: &mut ChainState, tx: &SignedTransaction, success: bool) -> TransactionReceipt {
        state.block_number += 1;
        state.indexed_block = state.block_number;
        let count = state.tx_counts.entry(tx.from).or_insert(0);
        *count = (*count).max(tx.nonce + 1);
        TransactionReceipt {
            transaction_hash: tx.hash,
            block_number: state.block_number,
            success,
        }
    }
}

fn encode_request(request: &TransactionRequest, chain_id: u64) -> Vec<u8> {
    let mut raw = Vec::with_capacity(128 + request.data.len());
    let mut word = [0u8; 32];

    raw.extend_from_slice(&chain_id.to_be_bytes());
    raw.extend_from_slice(&request.nonce.to_be_bytes());
    raw.extend_from_slice(&request.gas.to_be_bytes());
    request.gas_price.unwrap_or_default().to_big_endian(&mut word);
    raw.extend_from_slice(&word);
    raw.extend_from_slice(&request.to.unwrap_or_default());
    request.value.to_big_endian(&mut word);
    raw.extend_from_slice(&word);
    raw.extend_from_slice(&request.data);
    raw
}

impl ChainPorts {
    /// All three ports served by one in-memory chain.
    pub fn in_memory(chain: Arc<InMemoryChain>) -> Self {
        Self {
            client: chain.clone(),
            indexer: chain.clone(),
            balances: chain,
        }
    }
}

#[async_trait]
impl ChainClient for InMemoryChain {
    async fn block_number(&self) -> Result<u64, ChainError> {
        Ok(self.state.read().block_number)
    }

    async fn get_transaction_count(
        &self,
        address: &Address,
        _block: Option<u64>,
    ) -> Result<u64, ChainError> {
        let mut state = self.state.write();
        if let Some(message) = state.count_failures.pop_front() {
            return Err(ChainError::Rpc(message));
        }
        Ok(state.tx_counts.get(address).copied().unwrap_or(0))
    }

    async fn sign_transaction(
        &self,
        request: &TransactionRequest,
        signer: &Secp256k1KeyPair,
    ) -> Result<SignedTransaction, ChainError> {
        if let Some(message) = self.state.write().sign_failures.pop_front() {
            return Err(ChainError::Signing(message));
        }
        if request.chain_id != self.chain_id {
            return Err(ChainError::Signing(format!(
                "chain id {} does not match {}",
                request.chain_id, self.chain_id
            )));
        }

        let mut raw = encode_request(request, self.chain_id);
        let signature = signer
            .sign_prehash(&keccak256(&raw))
            .map_err(|e| ChainError::Signing(e.to_string()))?;
        raw.extend_from_slice(&signature.to_bytes());

        Ok(SignedTransaction {
            hash: keccak256(&raw),
            from: signer.address(),
            nonce: request.nonce,
            raw,
        })
    }

    async fn send_signed_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<oneshot::Receiver<BroadcastOutcome>, ChainError> {
        let mut state = self.state.write();
        let script = state
            .script
            .pop_front()
            .unwrap_or(ScriptedOutcome::Mined { success: true });

        if let ScriptedOutcome::Refuse(error) = &script {
            return Err(error.clone());
        }

        debug!(
            tx_hash = %to_hex(&transaction.hash),
            nonce = transaction.nonce,
            "[rs-02] In-memory chain accepted transaction"
        );
        state.submitted.push(transaction.clone());

        let (sender, receiver) = oneshot::channel();
        let outcome = match script {
            ScriptedOutcome::Mined { success } => {
                BroadcastOutcome::Receipt(Self::mine(&mut state, transaction, success))
            }
            ScriptedOutcome::Error {
                message,
                with_receipt,
            } => BroadcastOutcome::Error {
                message,
                receipt: with_receipt.then(|| Self::mine(&mut state, transaction, false)),
            },
            ScriptedOutcome::Hold | ScriptedOutcome::Refuse(_) => {
                state.held.insert(transaction.hash, sender);
                return Ok(receiver);
            }
        };

        // The receiver is returned below, so this send cannot fail.
        let _ = sender.send(outcome);
        Ok(receiver)
    }
}

#[async_trait]
impl ChainIndexer for InMemoryChain {
    async fn latest_block(&self) -> Result<u64, ChainError> {
        Ok(self.state.read().indexed_block)
    }

    async fn channels_from(&self, source: &AccountId) -> Result<Vec<ChannelEntry>, ChainError> {
        Ok(self
            .state
            .read()
            .channels
            .iter()
            .filter(|c| c.source == source.0)
            .copied()
            .collect())
    }
}

#[async_trait]
impl BalanceSource for InMemoryChain {
    async fn balance(&self, account: &AccountId) -> Result<Balance, ChainError> {
        let mut state = self.state.write();
        state.balance_reads += 1;
        Ok(state.balances.get(account).copied().unwrap_or_default())
    }

    async fn native_balance(&self, account: &AccountId) -> Result<NativeBalance, ChainError> {
        let mut state = self.state.write();
        state.balance_reads += 1;
        Ok(state.native_balances.get(account).copied().unwrap_or_default())
    }
}

impl std::fmt::Debug for InMemoryChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("InMemoryChain")
            .field("chain_id", &self.chain_id)
            .field("block_number", &state.block_number)
            .field("submitted", &state.submitted.len())
            .finish()
    }
}

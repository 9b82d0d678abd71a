//! # Proof-of-Relay Service
//!
//! Owns the chain head for one account and runs win checks against it.
//!
//! ## Check Flow
//!
//! ```text
//! check_ticket(ack)
//!   ├── lock chain state (one check at a time, FIFO)
//!   ├── resolve head: cached, or committed secret → find_pre_image
//!   ├── is_winning_ticket(hash, response, head, threshold)
//!   ├── loss → head unchanged
//!   └── win  → attach preimage
//!              ├── iteration 0 → rotation_needed, chain exhausted
//!              └── otherwise   → head moves one link toward the root
//! ```

use crate::domain::entities::{AcknowledgedTicket, PreImage, TicketVerdict};
use crate::domain::errors::PorError;
use crate::domain::secret_chain::HashedSecretChain;
use crate::domain::win::is_winning_ticket;
use crate::ports::inbound::ProofOfRelayApi;
use crate::ports::outbound::AccountIndexer;
use async_trait::async_trait;
use settlement_telemetry::{metric_inc, SECRET_ROTATIONS_SIGNALLED, TICKETS_CHECKED, TICKETS_WON};
use shared_types::{to_hex, AccountId, Hash, EMPTY_HASH};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Snapshot of the chain state, for inspection and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainHead {
    /// Committed secret as last read or set.
    pub committed_secret: Option<Hash>,
    /// Preimage the next win will reveal.
    pub head: Option<PreImage>,
    /// A terminal win happened and rotation has not completed yet.
    pub exhausted: bool,
}

struct ChainState {
    secrets: HashedSecretChain,
    committed_secret: Option<Hash>,
    head: Option<PreImage>,
    exhausted: bool,
}

impl ChainState {
    fn reset(&mut self, committed_secret: Option<Hash>) {
        self.committed_secret = committed_secret;
        self.head = None;
        self.exhausted = false;
    }
}

/// Proof-of-relay state object for one account.
///
/// The inner `tokio::sync::Mutex` is the single-slot rendezvous: it queues
/// callers in arrival order and admits exactly one check at a time.
pub struct ProofOfRelayChain<I: AccountIndexer> {
    account: AccountId,
    indexer: Arc<I>,
    state: Mutex<ChainState>,
}

impl<I: AccountIndexer> ProofOfRelayChain<I> {
    /// Create a checker for `account` whose commitments come from `secrets`.
    pub fn new(account: AccountId, secrets: HashedSecretChain, indexer: Arc<I>) -> Self {
        Self {
            account,
            indexer,
            state: Mutex::new(ChainState {
                secrets,
                committed_secret: None,
                head: None,
                exhausted: false,
            }),
        }
    }

    /// Account this chain belongs to.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Current state snapshot.
    pub async fn head(&self) -> ChainHead {
        let state = self.state.lock().await;
        ChainHead {
            committed_secret: state.committed_secret,
            head: state.head,
            exhausted: state.exhausted,
        }
    }

    /// Committed secret, read from the indexer on first use.
    pub async fn committed_secret(&self) -> Result<Option<Hash>, PorError> {
        let mut state = self.state.lock().await;
        if state.committed_secret.is_none() {
            state.committed_secret = self.read_committed_secret().await?;
        }
        Ok(state.committed_secret)
    }

    /// Install a new local secret chain and return the commitment to
    /// publish on-chain.
    ///
    /// The committed secret is cleared; it is re-read from the indexer on
    /// the next check unless `update_committed_secret` is called first.
    pub async fn rotate_secret(&self, secrets: HashedSecretChain) -> Hash {
        let mut state = self.state.lock().await;
        let commitment = secrets.initial_commitment();
        state.secrets = secrets;
        state.reset(None);
        info!(
            account = %self.account,
            commitment = %to_hex(&commitment),
            "[rs-01] Installed new secret chain"
        );
        commitment
    }

    async fn read_committed_secret(&self) -> Result<Option<Hash>, PorError> {
        let entry = self.indexer.get_account_entry(&self.account).await?;
        Ok(entry.and_then(|e| e.committed_secret()))
    }
}

#[async_trait]
impl<I: AccountIndexer> ProofOfRelayApi for ProofOfRelayChain<I> {
    async fn check_ticket(
        &self,
        ticket: &mut AcknowledgedTicket,
    ) -> Result<TicketVerdict, PorError> {
        let mut state = self.state.lock().await;

        if state.exhausted {
            return Err(PorError::RotationPending);
        }

        let cached_head = state.head;
        let head = match cached_head {
            Some(head) => head,
            None => {
                let committed = match state.committed_secret {
                    Some(committed) => committed,
                    None => self
                        .read_committed_secret()
                        .await?
                        .ok_or(PorError::SecretNotInitialized)?,
                };
                let head = state.secrets.find_pre_image(&committed)?;
                state.committed_secret = Some(committed);
                state.head = Some(head);
                head
            }
        };

        let signed = &ticket.signed_ticket;
        let won = is_winning_ticket(
            signed.hash(),
            &ticket.response,
            &head.pre_image,
            signed.ticket().win_probability,
        );
        metric_inc!(TICKETS_CHECKED);

        if !won {
            debug!(iteration = head.iteration, "[rs-01] Ticket did not win");
            return Ok(TicketVerdict {
                won: false,
                pre_image: None,
                iteration: head.iteration,
                rotation_needed: false,
            });
        }

        metric_inc!(TICKETS_WON);
        let rotation_needed = head.iteration == 0;

        if rotation_needed {
            state.exhausted = true;
            metric_inc!(SECRET_ROTATIONS_SIGNALLED);
            warn!(
                account = %self.account,
                "[rs-01] Secret chain exhausted, on-chain secret must be rotated"
            );
        } else {
            state.head = Some(state.secrets.find_pre_image(&head.pre_image)?);
            debug!(iteration = head.iteration, "[rs-01] Ticket won, head advanced");
        }

        ticket.pre_image = Some(head.pre_image);

        Ok(TicketVerdict {
            won: true,
            pre_image: Some(head.pre_image),
            iteration: head.iteration,
            rotation_needed,
        })
    }

    async fn update_committed_secret(&self, committed: Hash) {
        let mut state = self.state.lock().await;
        let committed = (committed != EMPTY_HASH).then_some(committed);
        state.reset(committed);
        info!(account = %self.account, "[rs-01] Committed secret updated");
    }

    async fn ticket_epoch(&self) -> Result<u64, PorError> {
        let entry = self.indexer.get_account_entry(&self.account).await?;
        Ok(entry.map(|e| e.counter).unwrap_or(0))
    }
}

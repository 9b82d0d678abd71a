//! # Inbound Port - ProofOfRelayApi
//!
//! Driving port used by the protocol layer when an acknowledgement arrives.

use crate::domain::entities::{AcknowledgedTicket, TicketVerdict};
use crate::domain::errors::PorError;
use async_trait::async_trait;
use shared_types::Hash;

/// Win checks and secret rotation for one account.
///
/// # Example
///
/// ```rust,ignore
/// use rs_01_proof_of_relay::ProofOfRelayApi;
///
/// async fn on_acknowledgement(por: &impl ProofOfRelayApi, mut ack: AcknowledgedTicket) {
///     let verdict = por.check_ticket(&mut ack).await?;
///     if verdict.won {
///         // ack.pre_image is set, hand the ticket to redemption
///     }
/// }
/// ```
#[async_trait]
pub trait ProofOfRelayApi: Send + Sync {
    /// Decide whether `ticket` wins, attaching the preimage on a win.
    ///
    /// Checks are serialized: a second caller waits until the first verdict
    /// has been produced.
    ///
    /// # Errors
    /// - `SecretNotInitialized`: no committed secret on-chain
    /// - `RotationPending`: the chain was exhausted and not yet rotated
    /// - `PreImageNotFound`: the committed secret is not on the local chain
    async fn check_ticket(&self, ticket: &mut AcknowledgedTicket)
        -> Result<TicketVerdict, PorError>;

    /// Record a secret committed on-chain after a rotation.
    async fn update_committed_secret(&self, committed: Hash);

    /// Account counter from the indexer (0 if the account is unknown).
    async fn ticket_epoch(&self) -> Result<u64, PorError>;
}

//! # Domain Entities
//!
//! Tickets as issued by a sender, as signed on the wire, and as acknowledged
//! by the next hop.

use super::codec::{COUNTERPARTY_SECRET_WIDTH, ENCODED_TICKET_LEN};
use super::errors::TicketError;
use serde::{Deserialize, Serialize};
use shared_crypto::{recover_address, RecoverableSignature};
use shared_types::{Address, Hash, U256};

/// Default channel iteration for freshly opened channels.
pub const DEFAULT_CHANNEL_ITERATION: u64 = 1;

/// Inputs to the ticket codec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketParams {
    /// Next hop that may redeem the ticket.
    pub receiver: Address,
    /// Proof-of-relay secret; the ticket carries only its hash.
    pub por_secret: Vec<u8>,
    /// Ticket value in channel-token units (at most 12 bytes).
    pub amount: U256,
    /// Ticket counter within the channel (at most 3 bytes).
    pub counter: u64,
    /// Win probability as a decimal percentage, e.g. `"50"` or `"12.5"`.
    pub win_probability_percent: String,
    /// Channel iteration (at most 3 bytes).
    pub channel_iteration: u64,
    /// Optional secret shared with the counterparty.
    pub counterparty_secret: Option<[u8; COUNTERPARTY_SECRET_WIDTH]>,
}

impl TicketParams {
    /// Params for the first channel iteration without a counterparty secret.
    pub fn new(
        receiver: Address,
        por_secret: impl Into<Vec<u8>>,
        amount: U256,
        counter: u64,
        win_probability_percent: impl Into<String>,
    ) -> Self {
        Self {
            receiver,
            por_secret: por_secret.into(),
            amount,
            counter,
            win_probability_percent: win_probability_percent.into(),
            channel_iteration: DEFAULT_CHANNEL_ITERATION,
            counterparty_secret: None,
        }
    }

    /// Set the channel iteration.
    pub fn with_channel_iteration(mut self, channel_iteration: u64) -> Self {
        self.channel_iteration = channel_iteration;
        self
    }

    /// Attach a counterparty secret.
    pub fn with_counterparty_secret(mut self, secret: [u8; COUNTERPARTY_SECRET_WIDTH]) -> Self {
        self.counterparty_secret = Some(secret);
        self
    }
}

/// The signed-over fields of a ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Receiver address (20 bytes).
    pub receiver: Address,
    /// keccak256 of the proof-of-relay secret.
    pub challenge: Hash,
    /// Ticket counter (3 bytes).
    pub counter: u64,
    /// Ticket value (12 bytes).
    pub amount: U256,
    /// Win threshold scaled to `U256::MAX`.
    pub win_probability: U256,
    /// Channel iteration (3 bytes).
    pub channel_iteration: u64,
}

/// A ticket together with its canonical encoding and signature.
///
/// Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTicket {
    ticket: Ticket,
    encoded: [u8; ENCODED_TICKET_LEN],
    hash: Hash,
    signature: RecoverableSignature,
}

impl SignedTicket {
    /// Assemble from already validated parts. Used by the codec.
    pub(crate) fn from_parts(
        ticket: Ticket,
        encoded: [u8; ENCODED_TICKET_LEN],
        hash: Hash,
        signature: RecoverableSignature,
    ) -> Self {
        Self {
            ticket,
            encoded,
            hash,
            signature,
        }
    }

    /// Rebuild a signed ticket received from a peer.
    pub fn from_wire(ticket: Ticket, signature: RecoverableSignature) -> Result<Self, TicketError> {
        let encoded = ticket.encode()?;
        let hash = shared_crypto::keccak256(&encoded);
        Ok(Self::from_parts(ticket, encoded, hash, signature))
    }

    /// Ticket fields.
    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    /// The 102-byte canonical encoding.
    pub fn encoded(&self) -> &[u8; ENCODED_TICKET_LEN] {
        &self.encoded
    }

    /// Lowercase hex of the canonical encoding, `0x`-prefixed.
    pub fn encoded_hex(&self) -> String {
        shared_types::to_hex(&self.encoded)
    }

    /// keccak256 of the canonical encoding; the digest that was signed.
    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    /// Signature over `hash()`.
    pub fn signature(&self) -> &RecoverableSignature {
        &self.signature
    }

    /// Recover the address that signed this ticket.
    pub fn recover_signer(&self) -> Result<Address, TicketError> {
        Ok(recover_address(&self.hash, &self.signature)?)
    }
}

/// Output of the ticket codec: the signed ticket plus channel bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedTicket {
    /// The signed ticket to hand to the next hop.
    pub signed: SignedTicket,
    /// Identifier of the channel between signer and receiver.
    pub channel_id: Hash,
    /// Truncated hash of the counterparty secret, if one was given.
    pub hashed_counterparty_secret: Option<[u8; COUNTERPARTY_SECRET_WIDTH]>,
}

/// A relay receipt: a signed ticket plus the hop's response.
///
/// `pre_image` is filled in by the win check when the ticket wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcknowledgedTicket {
    /// Ticket as signed by the sender.
    pub signed_ticket: SignedTicket,
    /// Proof-of-relay response.
    pub response: Hash,
    /// Preimage attached on a win, needed for on-chain redemption.
    pub pre_image: Option<Hash>,
}

impl AcknowledgedTicket {
    /// New acknowledgement without a preimage.
    pub fn new(signed_ticket: SignedTicket, response: Hash) -> Self {
        Self {
            signed_ticket,
            response,
            pre_image: None,
        }
    }
}

/// A link of the secret chain and its position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreImage {
    /// The link whose hash is the next link (or the committed secret).
    pub pre_image: Hash,
    /// Position in the chain; 0 is the root.
    pub iteration: u64,
}

/// Result of a win check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TicketVerdict {
    /// Whether the ticket wins.
    pub won: bool,
    /// Preimage revealed for redemption (only on a win).
    pub pre_image: Option<Hash>,
    /// Chain position used for the check.
    pub iteration: u64,
    /// The chain is exhausted and a new secret must be committed on-chain.
    pub rotation_needed: bool,
}

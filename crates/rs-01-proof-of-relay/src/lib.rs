//! # Proof-of-Relay Subsystem (RS-01)
//!
//! Issues payment tickets and decides which acknowledged tickets are winning.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): ticket codec, win check, hashed secret chain; no I/O
//! - **Ports Layer** (`ports/`): `ProofOfRelayApi` (inbound), `AccountIndexer` (outbound)
//! - **Service Layer** (`service.rs`): `ProofOfRelayChain`, the per-account chain head
//!
//! ## Ticket Wire Format
//!
//! ```text
//! receiver(20) ‖ challenge(32) ‖ counter(3) ‖ amount(12) ‖ win_prob(32) ‖ channel_iteration(3)
//! = 102 bytes, big-endian, zero-left-padded
//! ```
//!
//! ## Secret Chain
//!
//! ```text
//! root = link[0] ──keccak──→ link[1] ──keccak──→ ... ──keccak──→ link[n] (committed on-chain)
//! ```
//!
//! A winning ticket reveals the preimage of the current head. The head then
//! moves one link toward the root; revealing `link[0]` exhausts the chain and
//! signals that a new secret must be committed.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::codec::{
    channel_id, decode_ticket, hash_counterparty_secret, win_probability_from_percent,
    TicketBuilder, COUNTERPARTY_SECRET_WIDTH, ENCODED_TICKET_LEN,
};
pub use domain::entities::{
    AcknowledgedTicket, IssuedTicket, PreImage, SignedTicket, Ticket, TicketParams, TicketVerdict,
};
pub use domain::errors::{PorError, TicketError};
pub use domain::secret_chain::{HashedSecretChain, DEFAULT_CHAIN_LENGTH, MAX_CHAIN_LENGTH};
pub use domain::win::is_winning_ticket;
pub use ports::inbound::ProofOfRelayApi;
pub use ports::outbound::AccountIndexer;
pub use service::{ChainHead, ProofOfRelayChain};

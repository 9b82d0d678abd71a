//! # Domain Layer - Proof-of-Relay
//!
//! ## Components
//!
//! - `entities`: Ticket, SignedTicket, AcknowledgedTicket, TicketVerdict
//! - `codec`: canonical 102-byte encoding, win probability scaling, signing
//! - `secret_chain`: keccak hash chain of the committed secret
//! - `win`: the winning-ticket predicate
//! - `errors`: TicketError, PorError

pub mod codec;
pub mod entities;
pub mod errors;
pub mod secret_chain;
pub mod win;

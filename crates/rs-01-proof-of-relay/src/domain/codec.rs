//! # Ticket Codec
//!
//! Canonical byte encoding and signing of payment tickets.
//!
//! ## Layout
//!
//! | Field | Width | Kind |
//! |-------|-------|------|
//! | receiver | 20 | bytes |
//! | challenge | 32 | bytes |
//! | counter | 3 | uint |
//! | amount | 12 | uint |
//! | win_probability | 32 | uint |
//! | channel_iteration | 3 | uint |
//!
//! Integers are big-endian and zero-left-padded. A value wider than its slot
//! is rejected with `EncodingOverflow`; nothing is ever truncated.

use super::entities::{IssuedTicket, SignedTicket, Ticket, TicketParams};
use super::errors::TicketError;
use primitive_types::U512;
use shared_crypto::{keccak256, keccak256_many, Secp256k1KeyPair};
use shared_types::{Address, Hash, U256};

/// Length of the canonical ticket encoding.
pub const ENCODED_TICKET_LEN: usize = 102;

/// Width of a counterparty secret and of its truncated hash.
pub const COUNTERPARTY_SECRET_WIDTH: usize = 27;

const RECEIVER_WIDTH: usize = 20;
const CHALLENGE_WIDTH: usize = 32;
const COUNTER_WIDTH: usize = 3;
const AMOUNT_WIDTH: usize = 12;
const WIN_PROB_WIDTH: usize = 32;
const ITERATION_WIDTH: usize = 3;

/// Upper bound on fractional digits accepted in a percentage.
const MAX_PERCENT_DECIMALS: usize = 60;

// =============================================================================
// ENCODING
// =============================================================================

impl Ticket {
    /// Canonical 102-byte encoding.
    pub fn encode(&self) -> Result<[u8; ENCODED_TICKET_LEN], TicketError> {
        let mut out = [0u8; ENCODED_TICKET_LEN];
        let mut writer = FieldWriter::new(&mut out);

        writer.put_bytes(&self.receiver);
        writer.put_bytes(&self.challenge);
        writer.put_uint("counter", U256::from(self.counter), COUNTER_WIDTH)?;
        writer.put_uint("amount", self.amount, AMOUNT_WIDTH)?;
        writer.put_uint("win_probability", self.win_probability, WIN_PROB_WIDTH)?;
        writer.put_uint(
            "channel_iteration",
            U256::from(self.channel_iteration),
            ITERATION_WIDTH,
        )?;

        debug_assert_eq!(writer.offset, ENCODED_TICKET_LEN);
        Ok(out)
    }
}

/// Decode a canonical encoding back into ticket fields.
pub fn decode_ticket(bytes: &[u8]) -> Result<Ticket, TicketError> {
    if bytes.len() != ENCODED_TICKET_LEN {
        return Err(TicketError::InvalidLength {
            expected: ENCODED_TICKET_LEN,
            actual: bytes.len(),
        });
    }

    let mut reader = FieldReader { bytes, offset: 0 };
    let mut receiver = [0u8; RECEIVER_WIDTH];
    receiver.copy_from_slice(reader.take(RECEIVER_WIDTH));
    let mut challenge = [0u8; CHALLENGE_WIDTH];
    challenge.copy_from_slice(reader.take(CHALLENGE_WIDTH));

    Ok(Ticket {
        receiver,
        challenge,
        counter: reader.take_uint(COUNTER_WIDTH).low_u64(),
        amount: reader.take_uint(AMOUNT_WIDTH),
        win_probability: reader.take_uint(WIN_PROB_WIDTH),
        channel_iteration: reader.take_uint(ITERATION_WIDTH).low_u64(),
    })
}

struct FieldWriter<'a> {
    out: &'a mut [u8],
    offset: usize,
}

impl<'a> FieldWriter<'a> {
    fn new(out: &'a mut [u8]) -> Self {
        Self { out, offset: 0 }
    }

    fn put_bytes(&mut self, bytes: &[u8]) {
        self.out[self.offset..self.offset + bytes.len()].copy_from_slice(bytes);
        self.offset += bytes.len();
    }

    fn put_uint(&mut self, field: &'static str, value: U256, width: usize) -> Result<(), TicketError> {
        if value.bits() > width * 8 {
            return Err(TicketError::EncodingOverflow { field, width });
        }
        let mut buf = [0u8; 32];
        value.to_big_endian(&mut buf);
        self.put_bytes(&buf[32 - width..]);
        Ok(())
    }
}

struct FieldReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> FieldReader<'a> {
    fn take(&mut self, width: usize) -> &'a [u8] {
        let slice = &self.bytes[self.offset..self.offset + width];
        self.offset += width;
        slice
    }

    fn take_uint(&mut self, width: usize) -> U256 {
        U256::from_big_endian(self.take(width))
    }
}

// =============================================================================
// FIELD DERIVATIONS
// =============================================================================

/// Convert a decimal percentage in `[0, 100]` into a win threshold.
///
/// Computes `floor(percent * U256::MAX / 100)` exactly, so `"100"` maps to
/// `U256::MAX` and `"0"` to zero.
pub fn win_probability_from_percent(percent: &str) -> Result<U256, TicketError> {
    let invalid = || TicketError::InvalidWinProbability(percent.to_string());

    let trimmed = percent.trim();
    let (int_part, frac_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) || frac_part.len() > MAX_PERCENT_DECIMALS {
        return Err(invalid());
    }

    let numerator = U512::from_dec_str(&format!("{int_part}{frac_part}")).map_err(|_| invalid())?;
    let denominator = U512::from(100u8) * U512::exp10(frac_part.len());
    if numerator > denominator {
        return Err(invalid());
    }

    let scaled = numerator * U512::from(U256::MAX) / denominator;
    U256::try_from(scaled).map_err(|_| invalid())
}

/// Channel identifier: keccak256 of the two parties in ascending order.
pub fn channel_id(party_a: &Address, party_b: &Address) -> Hash {
    let (low, high) = if party_a <= party_b {
        (party_a, party_b)
    } else {
        (party_b, party_a)
    };
    keccak256_many(&[low.as_slice(), high.as_slice()])
}

/// First 27 bytes of keccak256 over a counterparty secret.
pub fn hash_counterparty_secret(
    secret: &[u8; COUNTERPARTY_SECRET_WIDTH],
) -> [u8; COUNTERPARTY_SECRET_WIDTH] {
    let hash = keccak256(secret);
    let mut out = [0u8; COUNTERPARTY_SECRET_WIDTH];
    out.copy_from_slice(&hash[..COUNTERPARTY_SECRET_WIDTH]);
    out
}

// =============================================================================
// TICKET BUILDER
// =============================================================================

/// Builds and signs tickets on behalf of one sender.
///
/// Pure: the output depends only on the params and the signing key.
pub struct TicketBuilder<'a> {
    signer: &'a Secp256k1KeyPair,
}

impl<'a> TicketBuilder<'a> {
    /// Builder signing with `signer`.
    pub fn new(signer: &'a Secp256k1KeyPair) -> Self {
        Self { signer }
    }

    /// Encode and sign a ticket.
    pub fn build(&self, params: &TicketParams) -> Result<IssuedTicket, TicketError> {
        let ticket = Ticket {
            receiver: params.receiver,
            challenge: keccak256(&params.por_secret),
            counter: params.counter,
            amount: params.amount,
            win_probability: win_probability_from_percent(&params.win_probability_percent)?,
            channel_iteration: params.channel_iteration,
        };

        let encoded = ticket.encode()?;
        let hash = keccak256(&encoded);
        let signature = self.signer.sign_prehash(&hash)?;

        Ok(IssuedTicket {
            signed: SignedTicket::from_parts(ticket, encoded, hash, signature),
            channel_id: channel_id(&self.signer.address(), &params.receiver),
            hashed_counterparty_secret: params
                .counterparty_secret
                .as_ref()
                .map(hash_counterparty_secret),
        })
    }
}

//! Winning-ticket predicate.

use shared_crypto::keccak256_many;
use shared_types::{Hash, U256};

/// Whether a ticket wins.
///
/// The verdict value is keccak256(ticket_hash ‖ pre_image ‖ response) read as
/// a big-endian 256-bit integer. The ticket wins when that value is at most
/// `win_probability`, so a threshold of `U256::MAX` always wins.
pub fn is_winning_ticket(
    ticket_hash: &Hash,
    response: &Hash,
    pre_image: &Hash,
    win_probability: U256,
) -> bool {
    let digest = keccak256_many(&[ticket_hash.as_slice(), pre_image.as_slice(), response.as_slice()]);
    U256::from_big_endian(&digest) <= win_probability
}

//! # Hashed Secret Chain
//!
//! ```text
//! link[0] = root
//! link[i + 1] = keccak256(link[i])
//! link[length] = initial on-chain commitment
//! ```

use super::entities::PreImage;
use super::errors::PorError;
use shared_crypto::keccak256;
use shared_types::{to_hex, Hash};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Default number of links derived from a root secret.
pub const DEFAULT_CHAIN_LENGTH: u64 = 1000;

/// Longest chain that will be materialized.
pub const MAX_CHAIN_LENGTH: u64 = 1 << 20;

/// A one-way hash chain grown from a locally held root secret.
pub struct HashedSecretChain {
    root: Hash,
    length: u64,
    links: OnceLock<ChainLinks>,
}

struct ChainLinks {
    links: Vec<Hash>,
    position: HashMap<Hash, u64>,
}

impl HashedSecretChain {
    /// Chain of `length` hashing steps starting at `root`, clamped to
    /// `1..=MAX_CHAIN_LENGTH`.
    pub fn new(root: Hash, length: u64) -> Self {
        Self {
            root,
            length: length.clamp(1, MAX_CHAIN_LENGTH),
            links: OnceLock::new(),
        }
    }

    /// Number of hashing steps between the root and the commitment.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// The value to publish on-chain when (re)initializing the secret.
    pub fn initial_commitment(&self) -> Hash {
        self.links().links[self.length as usize]
    }

    /// Find the link that hashes to `target`.
    pub fn find_pre_image(&self, target: &Hash) -> Result<PreImage, PorError> {
        let chain = self.links();
        match chain.position.get(target) {
            Some(&k) if k > 0 => Ok(PreImage {
                pre_image: chain.links[(k - 1) as usize],
                iteration: k - 1,
            }),
            _ => Err(PorError::PreImageNotFound(to_hex(target))),
        }
    }

    fn links(&self) -> &ChainLinks {
        self.links.get_or_init(|| {
            let mut links = Vec::with_capacity(self.length as usize + 1);
            let mut position = HashMap::with_capacity(self.length as usize + 1);
            let mut current = self.root;
            for i in 0..=self.length {
                links.push(current);
                position.entry(current).or_insert(i);
                current = keccak256(&current);
            }
            ChainLinks { links, position }
        })
    }
}

impl fmt::Debug for HashedSecretChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedSecretChain")
            .field("root", &"[REDACTED]")
            .field("length", &self.length)
            .finish()
    }
}

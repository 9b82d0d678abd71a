//! # ECDSA Signatures (secp256k1, recoverable)
//!
//! Ethereum-compatible signing for tickets and account identity.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization (EIP-2)
//! - Signatures carry a recovery byte so the signer address can be derived
//!   from `(digest, signature)` alone
//!
//! ## Address Derivation
//!
//! ```text
//! address = keccak256(uncompressed_pubkey[1..65])[12..32]
//! ```

use crate::hashing::{keccak256, Hash};
use crate::CryptoError;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};

/// Ethereum-style address (last 20 bytes of keccak256(pubkey)).
pub type Address = [u8; 20];

/// Offset added to the recovery id in the legacy Ethereum `v` encoding.
const V_OFFSET: u8 = 27;

/// Compressed secp256k1 public key (33 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Secp256k1PublicKey([u8; 33]);

impl Secp256k1PublicKey {
    /// Create from compressed bytes (33 bytes, starting with 0x02 or 0x03).
    pub fn from_bytes(bytes: [u8; 33]) -> Result<Self, CryptoError> {
        VerifyingKey::from_sec1_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Get raw compressed bytes.
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    /// Derive the account address of this key.
    pub fn to_address(&self) -> Result<Address, CryptoError> {
        let verifying_key =
            VerifyingKey::from_sec1_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(address_from_verifying_key(&verifying_key))
    }
}

/// Recoverable ECDSA signature in `(r, s, v)` form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecoverableSignature {
    /// R component (32 bytes)
    pub r: [u8; 32],
    /// S component (32 bytes, low-S)
    pub s: [u8; 32],
    /// Recovery byte (27 or 28)
    pub v: u8,
}

impl RecoverableSignature {
    /// Serialized length: `r ‖ s ‖ v`.
    pub const LEN: usize = 65;

    /// Serialize as `r ‖ s ‖ v`.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    /// Parse `r ‖ s ‖ v`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != Self::LEN {
            return Err(CryptoError::InvalidSignatureFormat);
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }
}

/// secp256k1 ECDSA keypair.
///
/// The secret scalar is zeroized when the inner `SigningKey` drops.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Get public key (compressed, 33 bytes).
    pub fn public_key(&self) -> Secp256k1PublicKey {
        let sec1_bytes = self.signing_key.verifying_key().to_sec1_bytes();
        // SEC1 compressed keys are always 33 bytes
        let mut bytes = [0u8; 33];
        bytes.copy_from_slice(&sec1_bytes[..33]);
        Secp256k1PublicKey(bytes)
    }

    /// Address of this keypair.
    pub fn address(&self) -> Address {
        address_from_verifying_key(self.signing_key.verifying_key())
    }

    /// Sign a 32-byte digest, returning a recoverable low-S signature.
    pub fn sign_prehash(&self, digest: &Hash) -> Result<RecoverableSignature, CryptoError> {
        let (mut signature, mut recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        if let Some(normalized) = signature.normalize_s() {
            signature = normalized;
            recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
        }

        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        Ok(RecoverableSignature {
            r,
            s,
            v: V_OFFSET + recovery_id.to_byte(),
        })
    }

    /// Get secret key bytes (for handing to an external transaction signer).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }
}

impl std::fmt::Debug for Secp256k1KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secp256k1KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Derive an address from a compressed public key.
pub fn address_from_public_key(public_key: &Secp256k1PublicKey) -> Result<Address, CryptoError> {
    public_key.to_address()
}

/// Recover the signer's address from a digest and its signature.
pub fn recover_address(
    digest: &Hash,
    signature: &RecoverableSignature,
) -> Result<Address, CryptoError> {
    let recovery_id = parse_recovery_id(signature.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);
    let sig = Signature::from_slice(&sig_bytes).map_err(|_| CryptoError::InvalidSignatureFormat)?;

    let recovered = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;

    Ok(address_from_verifying_key(&recovered))
}

fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    // Skip the 0x04 uncompressed prefix
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

fn parse_recovery_id(v: u8) -> Result<RecoveryId, CryptoError> {
    let id = match v {
        0 | 1 => v,
        27 | 28 => v - V_OFFSET,
        _ => return Err(CryptoError::InvalidRecoveryId(v)),
    };
    RecoveryId::from_byte(id).ok_or(CryptoError::InvalidRecoveryId(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_recover_roundtrip() {
        let keypair = Secp256k1KeyPair::generate();
        let digest = keccak256(b"Hello, secp256k1!");

        let signature = keypair.sign_prehash(&digest).unwrap();
        let recovered = recover_address(&digest, &signature).unwrap();

        assert_eq!(recovered, keypair.address());
    }

    #[test]
    fn test_wrong_digest_recovers_other_address() {
        let keypair = Secp256k1KeyPair::generate();
        let signature = keypair.sign_prehash(&keccak256(b"message1")).unwrap();

        let recovered = recover_address(&keccak256(b"message2"), &signature);
        assert_ne!(recovered.ok(), Some(keypair.address()));
    }

    #[test]
    fn test_deterministic_signatures() {
        let keypair = Secp256k1KeyPair::from_bytes([0xABu8; 32]).unwrap();
        let digest = keccak256(b"deterministic test");

        let sig1 = keypair.sign_prehash(&digest).unwrap();
        let sig2 = keypair.sign_prehash(&digest).unwrap();

        assert_eq!(sig1, sig2);
        assert!(sig1.v == 27 || sig1.v == 28);
    }

    #[test]
    fn test_known_address_derivation() {
        // Private key 1 maps to the well-known generator-point address.
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let keypair = Secp256k1KeyPair::from_bytes(secret).unwrap();

        assert_eq!(
            hex::encode(keypair.address()),
            "7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
        assert_eq!(
            address_from_public_key(&keypair.public_key()).unwrap(),
            keypair.address()
        );
    }

    #[test]
    fn test_signature_bytes_roundtrip() {
        let keypair = Secp256k1KeyPair::generate();
        let signature = keypair.sign_prehash(&keccak256(b"bytes")).unwrap();

        let parsed = RecoverableSignature::from_bytes(&signature.to_bytes()).unwrap();
        assert_eq!(parsed, signature);
        assert!(RecoverableSignature::from_bytes(&[0u8; 64]).is_err());
    }

    #[test]
    fn test_invalid_recovery_id_rejected() {
        let keypair = Secp256k1KeyPair::generate();
        let digest = keccak256(b"v");
        let mut signature = keypair.sign_prehash(&digest).unwrap();
        signature.v = 5;

        assert_eq!(
            recover_address(&digest, &signature),
            Err(CryptoError::InvalidRecoveryId(5))
        );
    }

    #[test]
    fn test_zero_private_key_rejected() {
        assert!(matches!(
            Secp256k1KeyPair::from_bytes([0u8; 32]),
            Err(CryptoError::InvalidPrivateKey)
        ));
    }
}

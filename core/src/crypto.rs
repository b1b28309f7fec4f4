//! Cryptographic primitives shared by every other module.
//!
//! Hashing is Blake2b-512 truncated to the leading 32 bytes, matching the
//! truncation strategy already used for block and transaction identity
//! elsewhere in this codebase. Two secondary digests, [`sha3_256`] and
//! [`ripemd160`], exist purely so a VM collaborator (e.g. an EVM-compatible
//! adapter) can be handed the digest shapes it expects without this crate
//! taking on a hard dependency on any particular VM.

use blake2::{Blake2b512, Digest as _};
use ed25519_dalek::{Keypair, PublicKey, SecretKey, Signature, Signer, Verifier};
use ripemd::Ripemd160;
use sha3::Sha3_256;

/// A 256-bit content hash. Used as block identity, transaction identity,
/// and code identity.
pub type Hash = [u8; 32];

/// Returns the all-zero digest, the legal "no value" sentinel used for
/// genesis's predecessor hash and for "no code" (an externally-owned
/// account's `code_hash`).
pub fn null_hash() -> Hash {
    [0u8; 32]
}

/// Computes the crate's primary content hash of `bytes`.
pub fn hash(bytes: &[u8]) -> Hash {
    let digest = Blake2b512::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..32]);
    out
}

/// Computes a 256-bit Keccak-family digest, for VM collaborators that
/// expect Ethereum-style hashing.
pub fn sha3_256(bytes: &[u8]) -> [u8; 32] {
    let digest = Sha3_256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Computes a 160-bit RIPEMD digest, for VM collaborators that expect
/// Bitcoin-style `hash160`-shaped addressing.
pub fn ripemd160(bytes: &[u8]) -> [u8; 20] {
    let digest = Ripemd160::digest(bytes);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest);
    out
}

/// Generates a fresh Ed25519 keypair using the operating system RNG.
pub fn generate_keypair() -> Keypair {
    let mut csprng = rand::rngs::OsRng {};
    Keypair::generate(&mut csprng)
}

/// Reconstructs a keypair from a raw 32-byte secret. Exposed for test
/// fixtures and for the key-vault collaborator, which owns the actual
/// secret-storage concern.
pub fn keypair_from_secret(secret: &[u8; 32]) -> Keypair {
    let secret = SecretKey::from_bytes(secret).expect("secret key is always 32 bytes");
    let public = PublicKey::from(&secret);
    Keypair { secret, public }
}

/// Signs `message` with `keypair`, returning the raw signature bytes.
pub fn sign(keypair: &Keypair, message: &[u8]) -> Signature {
    keypair.sign(message)
}

/// Verifies that `signature` over `message` was produced by `public_key`.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    public_key.verify(message, signature).is_ok()
}

/// Derives the 20-byte address of a public key: hash the encoded key and
/// keep the leading 20 bytes.
pub fn address_bytes_of(public_key: &PublicKey) -> [u8; 20] {
    let digest = hash(public_key.as_bytes());
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[..20]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash(b"obscura"), hash(b"obscura"));
        assert_ne!(hash(b"obscura"), hash(b"obscura2"));
    }

    #[test]
    fn null_hash_is_all_zero() {
        assert_eq!(null_hash(), [0u8; 32]);
    }

    #[test]
    fn address_of_is_pure_function_of_key() {
        let kp = keypair_from_secret(&[7u8; 32]);
        let a1 = address_bytes_of(&kp.public);
        let a2 = address_bytes_of(&kp.public);
        assert_eq!(a1, a2);
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let kp = generate_keypair();
        let msg = b"a signed message";
        let sig = sign(&kp, msg);
        assert!(verify(&kp.public, msg, &sig));
        assert!(!verify(&kp.public, b"tampered", &sig));
    }
}

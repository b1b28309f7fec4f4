//! Obscura wallet: key generation and the hex-encoded secret format used by
//! the CLI's `wallet` subcommand. Signing and address derivation already
//! live on `obscura-core`'s `Transaction`/`crypto` modules; this crate only
//! owns the secret material itself.

use ed25519_dalek::{Keypair, PublicKey, SecretKey};

/// Generates a fresh keypair using the operating system RNG.
pub fn generate_keypair() -> Keypair {
    let mut csprng = rand::rngs::OsRng {};
    Keypair::generate(&mut csprng)
}

/// Encodes a keypair's secret as lowercase hex, for writing to a wallet
/// file.
pub fn secret_to_hex(keypair: &Keypair) -> String {
    hex::encode(keypair.secret.as_bytes())
}

/// Reconstructs a keypair from a hex-encoded 32-byte secret.
pub fn keypair_from_hex(hex_secret: &str) -> Result<Keypair, WalletError> {
    let bytes = hex::decode(hex_secret).map_err(|_| WalletError::InvalidSecret)?;
    let secret = SecretKey::from_bytes(&bytes).map_err(|_| WalletError::InvalidSecret)?;
    let public = PublicKey::from(&secret);
    Ok(Keypair { secret, public })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("invalid wallet secret")]
    InvalidSecret,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_roundtrips_through_hex() {
        let kp = generate_keypair();
        let hex_secret = secret_to_hex(&kp);
        let restored = keypair_from_hex(&hex_secret).unwrap();
        assert_eq!(restored.public.as_bytes(), kp.public.as_bytes());
    }

    #[test]
    fn invalid_hex_is_rejected() {
        assert!(keypair_from_hex("not hex").is_err());
    }
}

//! The 20-byte [`Address`] type and its canonical base58 textual form.
//!
//! `spec.md` notes that the original source carried two incompatible
//! address designs (20-byte fixed vs. variable `Bytes`, base58 vs. base64);
//! this crate implements only the normalized design it settled on.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Byte length of an [`Address`].
pub const ADDRESS_LENGTH: usize = 20;

/// A 20-byte account/contract identifier derived from a public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

impl Address {
    /// Wraps a raw 20-byte array.
    pub fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// The distinguished all-zero address: coinbase on genesis, and the
    /// required `to` of a `CONTRACT_CREATION` transaction.
    pub fn null() -> Self {
        Self([0u8; ADDRESS_LENGTH])
    }

    /// `true` if this is the all-zero address.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }

    /// Raw bytes of the address.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Canonical base58 textual form.
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    /// Parses the canonical base58 textual form produced by
    /// [`Address::to_base58`].
    pub fn from_base58(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| Error::InvalidArgument(format!("bad base58 address: {e}")))?;
        if bytes.len() != ADDRESS_LENGTH {
            return Err(Error::InvalidArgument(format!(
                "address must be {ADDRESS_LENGTH} bytes, got {}",
                bytes.len()
            )));
        }
        let mut out = [0u8; ADDRESS_LENGTH];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_address_is_idempotent() {
        assert_eq!(Address::null(), Address::null());
        assert!(Address::null().is_null());
    }

    #[test]
    fn base58_roundtrips() {
        let addr = Address::new([7u8; ADDRESS_LENGTH]);
        let text = addr.to_base58();
        assert_eq!(Address::from_base58(&text).unwrap(), addr);
    }

    #[test]
    fn rejects_wrong_length() {
        let text = bs58::encode([1u8, 2, 3]).into_string();
        assert!(Address::from_base58(&text).is_err());
    }
}

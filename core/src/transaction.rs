//! The [`Transaction`] entity.
//!
//! A transaction is immutable once constructed: every field but `signature`
//! is set at construction, the signature binds the canonical byte image of
//! the rest to the `from` key, and the transaction's identity is the hash
//! of its own canonical byte image (signature included — once signed, a
//! transaction's hash is stable).

use ed25519_dalek::{Keypair, PublicKey, Signature};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::codec;
use crate::crypto::{self, Hash};
use crate::error::{Error, Result};

/// Discriminates between a plain value transfer and a contract-creation
/// transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxKind {
    MessageCall,
    ContractCreation,
}

/// `data` payload of a `ContractCreation` transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCreationData {
    pub code: Vec<u8>,
    pub init_args: Vec<u8>,
}

impl ContractCreationData {
    /// Decodes a `ContractCreation` transaction's `data` field.
    pub fn decode(data: &[u8]) -> Result<Self> {
        Ok(codec::decode(data)?)
    }

    /// Encodes this payload for storage in a transaction's `data` field.
    pub fn encode(&self) -> Vec<u8> {
        codec::encode(self)
    }
}

/// The fields of a transaction that the signature covers. Kept separate
/// from [`Transaction`] so the signing message never includes the
/// signature field itself.
#[derive(Clone, Serialize, Deserialize)]
struct SignedFields {
    from: Address,
    to: Address,
    amount: u64,
    fee: u64,
    timestamp: u64,
    kind: TxKind,
    data: Vec<u8>,
}

/// An immutable, signed transfer of value or contract-creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub from: Address,
    pub to: Address,
    pub amount: u64,
    pub fee: u64,
    pub timestamp: u64,
    pub kind: TxKind,
    pub data: Vec<u8>,
    pub signature: Vec<u8>,
}

impl Transaction {
    fn signed_fields(&self) -> SignedFields {
        SignedFields {
            from: self.from,
            to: self.to,
            amount: self.amount,
            fee: self.fee,
            timestamp: self.timestamp,
            kind: self.kind,
            data: self.data.clone(),
        }
    }

    /// The canonical byte image that a signature binds to the `from` key.
    pub fn signing_message(&self) -> Vec<u8> {
        codec::encode(&self.signed_fields())
    }

    /// Builds and signs a new transaction. `CONTRACT_CREATION` transactions
    /// must target [`Address::null`]; this is enforced by the caller's
    /// choice of `to`, not re-validated here (validation happens at
    /// admission, see [`crate::account_state::AccountStateEngine::check_transaction`]).
    pub fn new_signed(
        keypair: &Keypair,
        to: Address,
        amount: u64,
        fee: u64,
        timestamp: u64,
        kind: TxKind,
        data: Vec<u8>,
    ) -> Self {
        let from = Address::new(crypto::address_bytes_of(&keypair.public));
        let mut tx = Transaction {
            from,
            to,
            amount,
            fee,
            timestamp,
            kind,
            data,
            signature: Vec::new(),
        };
        let msg = tx.signing_message();
        let sig = crypto::sign(keypair, &msg);
        tx.signature = sig.to_bytes().to_vec();
        tx
    }

    /// Verifies `signature` against `from`'s implied public key. Because an
    /// [`Address`] does not itself carry the public key, verification
    /// requires the caller to supply it (RPC/network layers recover it
    /// from the transaction's accompanying key material; the genesis
    /// transaction and tests pass it directly).
    pub fn verify_signature(&self, public_key: &PublicKey) -> bool {
        if Address::new(crypto::address_bytes_of(public_key)) != self.from {
            return false;
        }
        let sig = match Signature::from_bytes(&self.signature) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        crypto::verify(public_key, &self.signing_message(), &sig)
    }

    /// The transaction's identity: the hash of its full canonical byte
    /// image, signature included.
    pub fn hash(&self) -> Hash {
        crypto::hash(&codec::encode(self))
    }

    /// `true` for the genesis credit and any other transaction that is not
    /// cryptographically signed (used only for the fixed genesis
    /// transaction, which has no real signer).
    pub fn is_unsigned(&self) -> bool {
        self.signature.is_empty()
    }

    /// Decodes and validates shape constraints for a `ContractCreation`
    /// transaction's payload.
    pub fn contract_creation_data(&self) -> Result<ContractCreationData> {
        if self.kind != TxKind::ContractCreation {
            return Err(Error::InvalidArgument(
                "not a contract-creation transaction".into(),
            ));
        }
        if !self.to.is_null() {
            return Err(Error::InvalidArgument(
                "contract-creation transaction must target the null address".into(),
            ));
        }
        ContractCreationData::decode(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::generate_keypair;

    #[test]
    fn signed_transaction_verifies() {
        let kp = generate_keypair();
        let to = Address::new([9u8; 20]);
        let tx = Transaction::new_signed(&kp, to, 100, 10, 1, TxKind::MessageCall, vec![]);
        assert!(tx.verify_signature(&kp.public));
    }

    #[test]
    fn tampered_transaction_fails_verification() {
        let kp = generate_keypair();
        let to = Address::new([9u8; 20]);
        let mut tx = Transaction::new_signed(&kp, to, 100, 10, 1, TxKind::MessageCall, vec![]);
        tx.amount = 999;
        assert!(!tx.verify_signature(&kp.public));
    }

    #[test]
    fn hash_is_deterministic_and_depends_on_contents() {
        let kp = generate_keypair();
        let to = Address::new([9u8; 20]);
        let tx1 = Transaction::new_signed(&kp, to, 100, 10, 1, TxKind::MessageCall, vec![]);
        let tx2 = Transaction::new_signed(&kp, to, 200, 10, 1, TxKind::MessageCall, vec![]);
        assert_eq!(tx1.hash(), tx1.hash());
        assert_ne!(tx1.hash(), tx2.hash());
    }

    #[test]
    fn contract_creation_requires_null_destination() {
        let kp = generate_keypair();
        let data = ContractCreationData { code: vec![1, 2, 3], init_args: vec![] }.encode();
        let tx = Transaction::new_signed(
            &kp,
            Address::new([1u8; 20]),
            0,
            5,
            1,
            TxKind::ContractCreation,
            data,
        );
        assert!(tx.contract_creation_data().is_err());
    }
}

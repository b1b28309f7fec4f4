//! The [`OutcomeCache`]: a `tx_hash -> execution outcome` map.
//!
//! Writes happen only on the commit path (account-state application);
//! reads happen from RPC threads and from
//! [`crate::facade::Core::add_pending_and_wait`]. The cache is unbounded in
//! this reference implementation — `spec.md` §4.8 leaves boundedness as an
//! implementation choice, and an LRU-bounded variant is a drop-in swap of
//! the `RwLock<HashMap<..>>` below should memory pressure ever demand it.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::address::Address;
use crate::codec;
use crate::crypto::Hash;

/// The serializable outcome of applying a single transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutcome {
    pub success: bool,
    /// Set only for a successful `CONTRACT_CREATION`.
    pub contract_address: Option<Address>,
    pub output: Vec<u8>,
    pub gas_left: u64,
}

/// Maps transaction hash to the codec image of its [`TxOutcome`].
#[derive(Default)]
pub struct OutcomeCache {
    entries: RwLock<HashMap<Hash, Vec<u8>>>,
}

impl OutcomeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `outcome` for `tx_hash`. Only called from the commit path.
    pub fn record(&self, tx_hash: Hash, outcome: &TxOutcome) {
        self.entries.write().insert(tx_hash, codec::encode(outcome));
    }

    /// Returns the codec image of `tx_hash`'s outcome, or empty bytes if
    /// unknown, per `spec.md` §4.8.
    pub fn get(&self, tx_hash: &Hash) -> Vec<u8> {
        self.entries.read().get(tx_hash).cloned().unwrap_or_default()
    }

    /// Decodes the outcome for `tx_hash`, if present and well-formed.
    pub fn get_decoded(&self, tx_hash: &Hash) -> Option<TxOutcome> {
        let bytes = self.entries.read().get(tx_hash).cloned()?;
        codec::decode(&bytes).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_hash_returns_empty_bytes() {
        let cache = OutcomeCache::new();
        assert!(cache.get(&[0u8; 32]).is_empty());
    }

    #[test]
    fn recorded_outcome_is_retrievable() {
        let cache = OutcomeCache::new();
        let outcome = TxOutcome { success: true, contract_address: None, output: vec![1, 2], gas_left: 7 };
        cache.record([1u8; 32], &outcome);
        assert_eq!(cache.get_decoded(&[1u8; 32]), Some(outcome));
    }
}

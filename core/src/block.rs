//! The [`Block`] entity.
//!
//! A block's identity is the hash of its canonical byte image, which
//! includes `nonce` — so mining (mutating `nonce` until some external
//! difficulty target is met) changes a block's identity. This crate does
//! not itself enforce a difficulty target; that is the miner collaborator's
//! concern (see `SPEC_FULL.md` REDESIGN FLAGS).

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::codec;
use crate::crypto::{self, Hash};
use crate::transactions_set::TransactionsSet;

/// Maximum number of transactions a single block may carry.
pub const MAX_TXS_PER_BLOCK: usize = 100;

/// A hash-linked record of a bounded batch of transactions extending the
/// chain by one depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub depth: u64,
    pub nonce: u64,
    pub prev_block_hash: Hash,
    pub timestamp: u64,
    pub coinbase: Address,
    pub txs: TransactionsSet,
}

impl Block {
    /// Constructs a new block. `nonce` starts at zero; the miner
    /// collaborator mutates it and re-hashes while solving its
    /// proof-of-work puzzle — this crate does not perform that search.
    pub fn new(
        depth: u64,
        prev_block_hash: Hash,
        timestamp: u64,
        coinbase: Address,
        txs: TransactionsSet,
    ) -> Self {
        Self { depth, nonce: 0, prev_block_hash, timestamp, coinbase, txs }
    }

    /// The block's identity: the hash of its full canonical byte image.
    pub fn hash(&self) -> Hash {
        crypto::hash(&codec::encode(self))
    }

    /// `true` if this block's `txs` is within the per-block cap and
    /// duplicate-free (duplicate-freedom is structural: [`TransactionsSet`]
    /// cannot hold the same transaction twice).
    pub fn has_valid_shape(&self) -> bool {
        self.txs.len() <= MAX_TXS_PER_BLOCK
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}
impl Eq for Block {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::null_hash;

    #[test]
    fn hash_depends_on_nonce() {
        let mut block = Block::new(1, null_hash(), 0, Address::null(), TransactionsSet::new());
        let h1 = block.hash();
        block.nonce = 1;
        let h2 = block.hash();
        assert_ne!(h1, h2);
    }

    #[test]
    fn empty_block_has_valid_shape() {
        let block = Block::new(0, null_hash(), 0, Address::null(), TransactionsSet::new());
        assert!(block.has_valid_shape());
    }

    #[test]
    fn codec_roundtrip() {
        let block = Block::new(3, null_hash(), 42, Address::new([5u8; 20]), TransactionsSet::new());
        let bytes = codec::encode(&block);
        let back: Block = codec::decode(&bytes).unwrap();
        assert_eq!(block, back);
        assert_eq!(block.depth, back.depth);
        assert_eq!(block.timestamp, back.timestamp);
    }
}

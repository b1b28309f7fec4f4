//! [`ChainStore`]: the linear, hash-linked block database with secondary
//! indexes, durable through a [`PersistentKv`] collaborator.
//!
//! Writes are single-threaded (serialized by the caller through
//! [`crate::facade::Core`]'s commit path); reads are concurrent, protected
//! only by the `RwLock` that guards the in-memory indexes.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::block::Block;
use crate::codec;
use crate::crypto::Hash;
use crate::kv::{self, PersistentKv, NS_BLOCK, NS_BY_DEPTH, NS_BY_TX};

struct Indexes {
    by_hash: HashMap<Hash, Block>,
    by_depth: HashMap<u64, Hash>,
    by_tx: HashMap<Hash, Hash>,
    top: Option<Hash>,
}

impl Indexes {
    fn empty() -> Self {
        Self { by_hash: HashMap::new(), by_depth: HashMap::new(), by_tx: HashMap::new(), top: None }
    }
}

/// The block database. Genesis is added as the very first call to
/// [`ChainStore::try_add_block`] during `Core` initialization.
pub struct ChainStore {
    kv: Arc<dyn PersistentKv>,
    indexes: RwLock<Indexes>,
}

impl ChainStore {
    /// Wraps a fresh or pre-populated `PersistentKv` collaborator. Callers
    /// that are resuming from disk should follow this with [`ChainStore::load`].
    pub fn new(kv: Arc<dyn PersistentKv>) -> Self {
        Self { kv, indexes: RwLock::new(Indexes::empty()) }
    }

    /// Rehydrates the in-memory indexes from the `PersistentKv`
    /// collaborator. Called once at startup after [`ChainStore::new`].
    pub fn load(&self) -> crate::error::Result<()> {
        let rows = kv::scan_namespaced(self.kv.as_ref(), NS_BLOCK)?;
        let mut indexes = self.indexes.write();
        for (_key, value) in rows {
            let block: Block = codec::decode(&value)?;
            self.index_block_locked(&mut indexes, block);
        }
        Ok(())
    }

    fn index_block_locked(&self, indexes: &mut Indexes, block: Block) {
        let hash = block.hash();
        let depth = block.depth;
        for tx in block.txs.iter() {
            indexes.by_tx.insert(tx.hash(), hash);
        }
        indexes.by_depth.insert(depth, hash);
        if indexes.top.map_or(true, |top| {
            indexes.by_hash.get(&top).map_or(true, |t| t.depth < depth)
        }) {
            indexes.top = Some(hash);
        }
        indexes.by_hash.insert(hash, block);
    }

    /// Attempts to append `block` to the chain. Succeeds iff `block`
    /// extends the current tip (matching `prev_block_hash` and exactly
    /// `top.depth + 1`) and is not already present by any index. On
    /// success, persists `block` and updates every index.
    pub fn try_add_block(&self, block: Block) -> crate::error::Result<bool> {
        let hash = block.hash();
        {
            let indexes = self.indexes.read();
            if indexes.by_hash.contains_key(&hash) {
                debug!(?hash, "rejecting block: already present");
                return Ok(false);
            }
            match indexes.top {
                None => {
                    if block.depth != 0 {
                        debug!(depth = block.depth, "rejecting non-genesis first block");
                        return Ok(false);
                    }
                }
                Some(top_hash) => {
                    let top = indexes.by_hash.get(&top_hash).expect("top is always indexed");
                    if block.prev_block_hash != top_hash || block.depth != top.depth + 1 {
                        debug!(
                            depth = block.depth,
                            expected_depth = top.depth + 1,
                            "rejecting block with bad linkage"
                        );
                        return Ok(false);
                    }
                }
            }
        }

        self.persist_block(&block)?;

        let mut indexes = self.indexes.write();
        // Re-check under the write lock: two concurrent callers could both
        // pass the read-lock check above for the same depth.
        if indexes.by_hash.contains_key(&hash) {
            return Ok(false);
        }
        self.index_block_locked(&mut indexes, block);
        Ok(true)
    }

    fn persist_block(&self, block: &Block) -> crate::error::Result<()> {
        let hash = block.hash();
        let bytes = codec::encode(block);
        kv::put_namespaced(self.kv.as_ref(), NS_BLOCK, &hash, &bytes).map_err(|e| {
            warn!(?hash, error = %e, "storage failure persisting block");
            e
        })?;
        kv::put_namespaced(self.kv.as_ref(), NS_BY_DEPTH, &block.depth.to_be_bytes(), &hash)?;
        for tx in block.txs.iter() {
            kv::put_namespaced(self.kv.as_ref(), NS_BY_TX, &tx.hash(), &hash)?;
        }
        Ok(())
    }

    /// Looks up a block by its hash.
    pub fn find_block(&self, hash: &Hash) -> Option<Block> {
        self.indexes.read().by_hash.get(hash).cloned()
    }

    /// Looks up the hash of the block at `depth`.
    pub fn find_block_hash_by_depth(&self, depth: u64) -> Option<Hash> {
        self.indexes.read().by_depth.get(&depth).copied()
    }

    /// Looks up the hash of the block containing `tx_hash`, if any.
    pub fn find_transaction(&self, tx_hash: &Hash) -> Option<Hash> {
        self.indexes.read().by_tx.get(tx_hash).copied()
    }

    /// The current chain tip. Panics if genesis has not yet been added —
    /// callers must always add genesis before calling `top_block`
    /// (`Core::new` enforces this).
    pub fn top_block(&self) -> Block {
        let indexes = self.indexes.read();
        let top_hash = indexes.top.expect("genesis must be added before querying top_block");
        indexes.by_hash.get(&top_hash).cloned().expect("top hash is always indexed")
    }

    /// `true` once genesis has been committed.
    pub fn has_genesis(&self) -> bool {
        self.indexes.read().top.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::crypto::null_hash;
    use crate::kv::MemoryKv;
    use crate::transactions_set::TransactionsSet;

    fn genesis_block() -> Block {
        Block::new(0, null_hash(), 0, Address::null(), TransactionsSet::new())
    }

    #[test]
    fn genesis_is_accepted_as_first_block() {
        let store = ChainStore::new(MemoryKv::new());
        assert!(store.try_add_block(genesis_block()).unwrap());
        assert_eq!(store.top_block().depth, 0);
    }

    #[test]
    fn rejects_depth_one_as_first_block() {
        let store = ChainStore::new(MemoryKv::new());
        let mut bad = genesis_block();
        bad.depth = 1;
        assert!(!store.try_add_block(bad).unwrap());
    }

    #[test]
    fn rejects_duplicate_block() {
        let store = ChainStore::new(MemoryKv::new());
        let genesis = genesis_block();
        assert!(store.try_add_block(genesis.clone()).unwrap());
        assert!(!store.try_add_block(genesis).unwrap());
    }

    #[test]
    fn rejects_wrong_linkage() {
        let store = ChainStore::new(MemoryKv::new());
        store.try_add_block(genesis_block()).unwrap();
        let top_hash = store.top_block().hash();
        let mut good = Block::new(1, top_hash, 1, Address::null(), TransactionsSet::new());
        good.prev_block_hash = null_hash(); // wrong linkage
        assert!(!store.try_add_block(good).unwrap());
    }

    #[test]
    fn accepts_properly_linked_block() {
        let store = ChainStore::new(MemoryKv::new());
        store.try_add_block(genesis_block()).unwrap();
        let top_hash = store.top_block().hash();
        let next = Block::new(1, top_hash, 1, Address::null(), TransactionsSet::new());
        assert!(store.try_add_block(next).unwrap());
        assert_eq!(store.top_block().depth, 1);
    }

    #[test]
    fn load_rehydrates_indexes_from_kv() {
        let kv = MemoryKv::new();
        {
            let store = ChainStore::new(kv.clone());
            store.try_add_block(genesis_block()).unwrap();
        }
        let store2 = ChainStore::new(kv);
        store2.load().unwrap();
        assert_eq!(store2.top_block().depth, 0);
    }
}

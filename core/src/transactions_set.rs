//! [`TransactionsSet`]: an ordered, hash-indexed collection of transactions
//! shared by block contents and the mempool.
//!
//! Insertion preserves insertion order; removal is by value or by batch;
//! equality is by the multiset of transactions (order does not matter for
//! `==`, only for iteration).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::crypto::Hash;
use crate::transaction::Transaction;

/// An ordered collection of transactions, indexable by hash in O(1).
///
/// The canonical on-wire/on-disk form is just the ordered `Vec`; the hash
/// index is rebuilt on deserialization (via `#[serde(from/into)]`) rather
/// than carried over the wire.
#[derive(Debug, Clone, Default)]
pub struct TransactionsSet {
    order: Vec<Transaction>,
    index: HashMap<Hash, usize>,
}

impl Serialize for TransactionsSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.order.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TransactionsSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let order = Vec::<Transaction>::deserialize(deserializer)?;
        Ok(TransactionsSet::from_vec(order))
    }
}

impl TransactionsSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from an ordered vector of transactions, ignoring
    /// duplicates-by-hash beyond the first occurrence.
    pub fn from_vec(txs: Vec<Transaction>) -> Self {
        let mut set = Self::new();
        for tx in txs {
            set.add(tx);
        }
        set
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, tx) in self.order.iter().enumerate() {
            self.index.insert(tx.hash(), i);
        }
    }

    /// Inserts `tx` at the end, preserving insertion order. Duplicate
    /// detection beyond identity is the caller's responsibility (the
    /// mempool, for instance, re-checks before inserting; see
    /// `spec.md` §4.5).
    pub fn add(&mut self, tx: Transaction) {
        if self.index.contains_key(&tx.hash()) {
            return;
        }
        let idx = self.order.len();
        self.index.insert(tx.hash(), idx);
        self.order.push(tx);
    }

    /// Removes a single transaction by value (matched by hash). Idempotent:
    /// removing an absent transaction is a no-op.
    pub fn remove_one(&mut self, tx: &Transaction) {
        self.remove_by_hash(&tx.hash());
    }

    /// Removes a single transaction by hash. Idempotent.
    pub fn remove_by_hash(&mut self, hash: &Hash) {
        if self.index.remove(hash).is_none() {
            return;
        }
        self.order.retain(|tx| &tx.hash() != hash);
        self.rebuild_index();
    }

    /// Removes every transaction in `batch`. Idempotent per element.
    pub fn remove_batch(&mut self, batch: &[Transaction]) {
        if batch.is_empty() {
            return;
        }
        let hashes: std::collections::HashSet<Hash> = batch.iter().map(Transaction::hash).collect();
        self.order.retain(|tx| !hashes.contains(&tx.hash()));
        self.rebuild_index();
    }

    /// `true` if `tx` (matched by hash) is present.
    pub fn find(&self, tx: &Transaction) -> bool {
        self.index.contains_key(&tx.hash())
    }

    /// Looks up a transaction by hash.
    pub fn find_by_hash(&self, hash: &Hash) -> Option<&Transaction> {
        self.index.get(hash).map(|&i| &self.order[i])
    }

    /// Number of transactions currently held.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// `true` if empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.order.iter()
    }

    /// Returns the first `n` transactions in insertion order, cloned. Used
    /// by `block_template` to bound a mempool snapshot to the per-block
    /// transaction cap.
    pub fn take_ordered(&self, n: usize) -> Vec<Transaction> {
        self.order.iter().take(n).cloned().collect()
    }

    /// The ordered transactions as a plain slice.
    pub fn as_slice(&self) -> &[Transaction] {
        &self.order
    }
}

impl PartialEq for TransactionsSet {
    fn eq(&self, other: &Self) -> bool {
        use std::collections::HashSet;
        if self.order.len() != other.order.len() {
            return false;
        }
        let a: HashSet<Hash> = self.order.iter().map(Transaction::hash).collect();
        let b: HashSet<Hash> = other.order.iter().map(Transaction::hash).collect();
        a == b
    }
}
impl Eq for TransactionsSet {}

impl FromIterator<Transaction> for TransactionsSet {
    fn from_iter<I: IntoIterator<Item = Transaction>>(iter: I) -> Self {
        let mut set = Self::new();
        for tx in iter {
            set.add(tx);
        }
        set
    }
}

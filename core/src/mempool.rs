//! [`Mempool`]: the set of pending, admitted transactions awaiting a block.
//!
//! Admission is the caller's responsibility (`crate::facade::Core` checks
//! signature and [`crate::account_state::AccountStateEngine::check_transaction`]
//! before ever calling [`Mempool::add`]); this module only owns the set
//! itself and the projected-balance view used to admit the next
//! transaction from the same sender before the current one is mined.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::address::Address;
use crate::crypto::Hash;
use crate::transaction::Transaction;
use crate::transactions_set::TransactionsSet;

/// The pending-transaction pool. Protected by a single `RwLock`; writers
/// (`add`, `remove`) are serialized through `Core`'s commit path, readers
/// (RPC, `block_template`) run concurrently.
#[derive(Default)]
pub struct Mempool {
    pending: RwLock<TransactionsSet>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `tx`, ignoring it if an identical transaction (by hash) is
    /// already pending.
    pub fn add(&self, tx: Transaction) {
        self.pending.write().add(tx);
    }

    /// Removes a single transaction, matched by hash. Idempotent.
    pub fn remove(&self, tx: &Transaction) {
        self.pending.write().remove_one(tx);
    }

    /// Removes every transaction in `batch`. Used to prune the pool of
    /// transactions that just got mined into a committed block.
    pub fn remove_batch(&self, batch: &[Transaction]) {
        self.pending.write().remove_batch(batch);
    }

    /// `true` if `tx` (matched by hash) is currently pending.
    pub fn find(&self, tx: &Transaction) -> bool {
        self.pending.read().find(tx)
    }

    /// Looks up a pending transaction by hash.
    pub fn find_by_hash(&self, hash: &Hash) -> Option<Transaction> {
        self.pending.read().find_by_hash(hash).cloned()
    }

    /// Number of pending transactions.
    pub fn len(&self) -> usize {
        self.pending.read().len()
    }

    /// `true` if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.pending.read().is_empty()
    }

    /// Up to `n` pending transactions in insertion order, for
    /// `block_template` to fill a new block with.
    pub fn take_ordered(&self, n: usize) -> Vec<Transaction> {
        self.pending.read().take_ordered(n)
    }

    /// Net pending balance delta per address implied by every transaction
    /// currently in the pool: `-amount - fee` at the sender, `+amount` at
    /// the recipient. Used to admit a sender's next transaction against
    /// their committed balance plus whatever the pool already commits them
    /// to spend, without waiting for a block.
    pub fn projected_balances(&self) -> HashMap<Address, i64> {
        let mut deltas: HashMap<Address, i64> = HashMap::new();
        for tx in self.pending.read().iter() {
            let spend = tx.amount as i64 + tx.fee as i64;
            *deltas.entry(tx.from).or_insert(0) -= spend;
            *deltas.entry(tx.to).or_insert(0) += tx.amount as i64;
        }
        deltas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::generate_keypair;
    use crate::transaction::TxKind;

    fn sample_tx(amount: u64, fee: u64) -> Transaction {
        let kp = generate_keypair();
        Transaction::new_signed(&kp, Address::new([9u8; 20]), amount, fee, 0, TxKind::MessageCall, vec![])
    }

    #[test]
    fn add_and_find_roundtrip() {
        let pool = Mempool::new();
        let tx = sample_tx(10, 1);
        assert!(!pool.find(&tx));
        pool.add(tx.clone());
        assert!(pool.find(&tx));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn remove_batch_prunes_mined_transactions() {
        let pool = Mempool::new();
        let txs: Vec<_> = (0..3).map(|_| sample_tx(1, 1)).collect();
        for tx in &txs {
            pool.add(tx.clone());
        }
        pool.remove_batch(&txs[..2]);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn projected_balances_reflect_pending_spend() {
        let pool = Mempool::new();
        let kp = generate_keypair();
        let sender = Address::new(crate::crypto::address_bytes_of(&kp.public));
        let recipient = Address::new([2u8; 20]);
        let tx = Transaction::new_signed(&kp, recipient, 50, 5, 0, TxKind::MessageCall, vec![]);
        pool.add(tx);

        let deltas = pool.projected_balances();
        assert_eq!(deltas[&sender], -55);
        assert_eq!(deltas[&recipient], 50);
    }

    #[test]
    fn duplicate_add_is_noop() {
        let pool = Mempool::new();
        let tx = sample_tx(1, 1);
        pool.add(tx.clone());
        pool.add(tx);
        assert_eq!(pool.len(), 1);
    }
}

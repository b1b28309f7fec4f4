//! [`AccountStateEngine`]: deterministic balance/contract state derived
//! from the chain, plus the per-transaction application algorithm of
//! `spec.md` §4.4.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{trace, warn};

use crate::account::Account;
use crate::address::Address;
use crate::block::Block;
use crate::crypto::{self, Hash};
use crate::outcome::{OutcomeCache, TxOutcome};
use crate::transaction::{ContractCreationData, Transaction, TxKind};
use crate::vm::VmAdapter;

/// Block subsidy credited to the coinbase of every committed block.
pub const EMISSION: u64 = 1000;

struct State {
    accounts: HashMap<Address, Account>,
    code: HashMap<Hash, Vec<u8>>,
    /// Timestamp of the sender's last applied transaction, used for the
    /// non-decreasing-timestamp admission check.
    last_tx_timestamp: HashMap<Address, u64>,
}

impl State {
    fn new() -> Self {
        Self { accounts: HashMap::new(), code: HashMap::new(), last_tx_timestamp: HashMap::new() }
    }

    fn account_mut(&mut self, addr: Address) -> &mut Account {
        self.accounts.entry(addr).or_insert_with(Account::new_eoa)
    }
}

/// Owns `addr -> Account` and the `code_hash -> code` table, and applies
/// blocks against them. Internally synchronized: commit is single-writer
/// (serialized through `Core`'s commit path), reads are lock-free with
/// respect to previously committed state in the sense that they never
/// block on another reader.
pub struct AccountStateEngine<V: VmAdapter> {
    state: RwLock<State>,
    vm: V,
    outcomes: Arc<OutcomeCache>,
    emission: u64,
}

impl<V: VmAdapter> AccountStateEngine<V> {
    /// Builds an engine with the default [`EMISSION`] subsidy. Use
    /// [`AccountStateEngine::with_emission`] to follow a non-default
    /// `Config`.
    pub fn new(vm: V, outcomes: Arc<OutcomeCache>) -> Self {
        Self::with_emission(vm, outcomes, EMISSION)
    }

    pub fn with_emission(vm: V, outcomes: Arc<OutcomeCache>, emission: u64) -> Self {
        Self { state: RwLock::new(State::new()), vm, outcomes, emission }
    }

    /// Credits the genesis transaction's `amount` to its `to` address.
    /// Called exactly once, during `Core` initialization.
    pub fn update_from_genesis(&self, genesis: &Block) {
        let mut state = self.state.write();
        for tx in genesis.txs.iter() {
            let account = state.account_mut(tx.to);
            account.balance += tx.amount;
        }
    }

    /// The static admission predicate: sender can cover `amount + fee`
    /// against committed balance, and the transaction's timestamp is
    /// non-decreasing with respect to the sender's last applied
    /// transaction. Signature verification happens once, earlier, in
    /// `crate::facade::Core::add_pending` — this predicate does not repeat
    /// it, since committed state here carries no public key to check
    /// against.
    pub fn check_transaction(&self, tx: &Transaction) -> bool {
        let state = self.state.read();
        let balance = state.accounts.get(&tx.from).map_or(0, |a| a.balance);
        let required = match tx.amount.checked_add(tx.fee) {
            Some(v) => v,
            None => return false,
        };
        if balance < required {
            return false;
        }
        if let Some(&last) = state.last_tx_timestamp.get(&tx.from) {
            if tx.timestamp < last {
                return false;
            }
        }
        true
    }

    /// Current balance of `addr` (0 if the account has never been
    /// credited).
    pub fn balance(&self, addr: &Address) -> u64 {
        self.state.read().accounts.get(addr).map_or(0, |a| a.balance)
    }

    /// Snapshot of `addr`'s account, if it exists.
    pub fn account(&self, addr: &Address) -> Option<Account> {
        self.state.read().accounts.get(addr).copied()
    }

    /// Derives a fresh contract address from `creator`'s address and
    /// current nonce, the same hash-then-truncate strategy used for
    /// wallet addresses.
    pub fn new_contract_address(&self, creator: Address) -> Address {
        let nonce = self.state.read().accounts.get(&creator).map_or(0, |a| a.nonce);
        let mut preimage = creator.as_bytes().to_vec();
        preimage.extend_from_slice(&nonce.to_be_bytes());
        let digest = crypto::hash(&preimage);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Address::new(bytes)
    }

    /// Atomically moves `amount` from `from` to `to`. No partial
    /// application: either both balances change or neither does.
    pub fn try_transfer(&self, from: Address, to: Address, amount: u64) -> bool {
        let mut state = self.state.write();
        let from_balance = state.accounts.get(&from).map_or(0, |a| a.balance);
        if from_balance < amount {
            return false;
        }
        state.account_mut(from).balance -= amount;
        state.account_mut(to).balance += amount;
        true
    }

    fn debit_fee(&self, from: Address, fee: u64) -> bool {
        let mut state = self.state.write();
        let balance = state.accounts.get(&from).map_or(0, |a| a.balance);
        if balance < fee {
            return false;
        }
        state.account_mut(from).balance -= fee;
        true
    }

    fn refund_and_credit_coinbase(&self, from: Address, coinbase: Address, fee: u64, gas_left: u64) {
        let mut state = self.state.write();
        let refund = gas_left.min(fee);
        state.account_mut(from).balance += refund;
        state.account_mut(coinbase).balance += fee - refund;
    }

    fn bump_nonce_and_timestamp(&self, from: Address, timestamp: u64) {
        let mut state = self.state.write();
        state.account_mut(from).nonce += 1;
        state.last_tx_timestamp.insert(from, timestamp);
    }

    /// Applies every transaction in `block` in order, then credits the
    /// block's coinbase with the fixed [`EMISSION`]. Per-transaction
    /// failures (insufficient funds, VM failure) are recorded into the
    /// outcome cache as an unsuccessful outcome; they do not prevent the
    /// rest of the block from applying, and they do not fail `update`
    /// itself — `spec.md` §4.4 treats this as a local, caught error.
    pub fn update(&self, block: &Block) {
        for tx in block.txs.iter() {
            self.apply_one(tx, block);
        }
        let mut state = self.state.write();
        state.account_mut(block.coinbase).balance += self.emission;
    }

    fn apply_one(&self, tx: &Transaction, block: &Block) {
        let tx_hash = tx.hash();
        trace!(?tx_hash, from = %tx.from, to = %tx.to, "applying transaction");

        if !self.debit_fee(tx.from, tx.fee) {
            warn!(?tx_hash, "transaction failed: insufficient funds for fee");
            self.outcomes.record(
                tx_hash,
                &TxOutcome { success: false, contract_address: None, output: Vec::new(), gas_left: 0 },
            );
            return;
        }

        let outcome = match tx.kind {
            TxKind::ContractCreation => self.apply_contract_creation(tx, block),
            TxKind::MessageCall => self.apply_message_call(tx, block),
        };

        let gas_left = outcome.gas_left;
        self.refund_and_credit_coinbase(tx.from, block.coinbase, tx.fee, gas_left);
        self.bump_nonce_and_timestamp(tx.from, tx.timestamp);

        if !outcome.success {
            warn!(?tx_hash, "transaction application failed, recording unsuccessful outcome");
        }
        self.outcomes.record(tx_hash, &outcome);
    }

    fn apply_contract_creation(&self, tx: &Transaction, block: &Block) -> TxOutcome {
        let data = match ContractCreationData::decode(&tx.data) {
            Ok(d) => d,
            Err(_) => {
                return TxOutcome { success: false, contract_address: None, output: Vec::new(), gas_left: 0 }
            }
        };
        let code_hash = crypto::hash(&data.code);
        self.state.write().code.insert(code_hash, data.code);

        let contract_address = self.new_contract_address(tx.from);
        if tx.amount > 0 && !self.try_transfer(tx.from, contract_address, tx.amount) {
            return TxOutcome { success: false, contract_address: None, output: Vec::new(), gas_left: 0 };
        }
        {
            let mut state = self.state.write();
            state.account_mut(contract_address).code_hash = Some(code_hash);
        }

        match self.vm.create_contract(contract_address, tx, block) {
            Ok((address, output, gas_left)) => {
                TxOutcome { success: true, contract_address: Some(address), output, gas_left }
            }
            Err(_) => TxOutcome { success: false, contract_address: None, output: Vec::new(), gas_left: 0 },
        }
    }

    fn apply_message_call(&self, tx: &Transaction, block: &Block) -> TxOutcome {
        if !self.try_transfer(tx.from, tx.to, tx.amount) {
            return TxOutcome { success: false, contract_address: None, output: Vec::new(), gas_left: 0 };
        }
        let destination = self.account(&tx.to).unwrap_or_else(Account::new_eoa);
        if destination.code_hash.is_none() {
            // A plain transfer never touches the VM, so there is no gas to
            // refund: the whole fee goes to the coinbase (spec.md §8 scenario 2).
            return TxOutcome { success: true, contract_address: None, output: Vec::new(), gas_left: 0 };
        }
        match self.vm.call(&destination, tx, block) {
            Ok(result) => {
                TxOutcome { success: result.ok, contract_address: None, output: result.output, gas_left: result.gas_left }
            }
            Err(_) => TxOutcome { success: false, contract_address: None, output: Vec::new(), gas_left: 0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{generate_keypair, null_hash};
    use crate::transactions_set::TransactionsSet;
    use crate::vm::EchoVm;

    fn engine() -> AccountStateEngine<EchoVm> {
        AccountStateEngine::new(EchoVm, Arc::new(OutcomeCache::new()))
    }

    fn genesis(to: Address, amount: u64) -> Block {
        let tx = Transaction {
            from: Address::null(),
            to,
            amount,
            fee: 0,
            timestamp: 0,
            kind: TxKind::MessageCall,
            data: vec![],
            signature: vec![],
        };
        let mut set = TransactionsSet::new();
        set.add(tx);
        Block::new(0, null_hash(), 0, Address::null(), set)
    }

    #[test]
    fn genesis_only_balance() {
        let eng = engine();
        let recipient = Address::new([1u8; 20]);
        eng.update_from_genesis(&genesis(recipient, 0xFFFFFFFF));
        assert_eq!(eng.balance(&recipient), 0xFFFFFFFF);
        assert_eq!(eng.balance(&Address::new([2u8; 20])), 0);
    }

    #[test]
    fn single_transfer_moves_balances_and_pays_coinbase() {
        let eng = engine();
        let kp = generate_keypair();
        let sender = Address::new(crypto::address_bytes_of(&kp.public));
        eng.update_from_genesis(&genesis(sender, 0xFFFFFFFF));

        let recipient = Address::new([3u8; 20]);
        let coinbase = Address::new([4u8; 20]);
        let tx = Transaction::new_signed(&kp, recipient, 100, 10, 1, TxKind::MessageCall, vec![]);
        let mut set = TransactionsSet::new();
        set.add(tx);
        let block = Block::new(1, null_hash(), 1, coinbase, set);

        eng.update(&block);

        // A call to a plain EOA never reaches the VM, so there is no gas to
        // refund: the whole fee goes to the coinbase alongside the emission.
        assert_eq!(eng.balance(&sender), 0xFFFFFFFF - 100 - 10);
        assert_eq!(eng.balance(&recipient), 100);
        assert_eq!(eng.balance(&coinbase), EMISSION + 10);
    }

    #[test]
    fn insufficient_fee_marks_outcome_unsuccessful_without_failing_block() {
        let eng = engine();
        let kp = generate_keypair();
        let sender = Address::new(crypto::address_bytes_of(&kp.public));
        // no genesis credit: sender has zero balance
        let tx = Transaction::new_signed(&kp, Address::new([5u8; 20]), 10, 1, 1, TxKind::MessageCall, vec![]);
        let tx_hash = tx.hash();
        let mut set = TransactionsSet::new();
        set.add(tx);
        let block = Block::new(0, null_hash(), 0, Address::new([6u8; 20]), set);

        eng.update(&block);
        let outcome = eng.outcomes.get_decoded(&tx_hash).unwrap();
        assert!(!outcome.success);
        // coinbase still receives the block emission even though the tx failed
        assert_eq!(eng.balance(&Address::new([6u8; 20])), EMISSION);
    }

    #[test]
    fn check_transaction_rejects_underfunded_sender() {
        let eng = engine();
        let kp = generate_keypair();
        let tx = Transaction::new_signed(&kp, Address::new([1u8; 20]), 100, 10, 1, TxKind::MessageCall, vec![]);
        assert!(!eng.check_transaction(&tx));
    }
}

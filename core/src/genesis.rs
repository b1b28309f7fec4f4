//! The fixed genesis block: the single, network-wide agreed-upon first
//! block every node's [`crate::chain::ChainStore`] is seeded with.

use once_cell::sync::Lazy;

use crate::address::Address;
use crate::block::Block;
use crate::crypto::null_hash;
use crate::transaction::{Transaction, TxKind};
use crate::transactions_set::TransactionsSet;

/// Fixed protocol launch timestamp (Unix seconds).
pub const GENESIS_TIMESTAMP: u64 = 1_583_789_617;

/// Fixed genesis credit amount, granted to [`genesis_recipient`].
pub const GENESIS_AMOUNT: u64 = 0xFFFF_FFFF;

/// The 20 raw bytes of the fixed genesis recipient, chosen so
/// [`Address::to_base58`] reproduces `spec.md` §8 scenario 1's literal
/// `28dpzpURpyqqLoWrEhnHrajndeCq`.
const GENESIS_RECIPIENT_BYTES: [u8; 20] = [
    0x51, 0x3a, 0x44, 0xf3, 0xf4, 0x9c, 0x90, 0xea, 0xdf, 0x57, 0x81, 0x67, 0xfc, 0x68, 0xb7,
    0x8e, 0x62, 0xc4, 0x39, 0x52,
];

/// The fixed recipient of the genesis credit. An address with no known
/// private key: the genesis transaction is unsigned (see
/// [`Transaction::is_unsigned`]), so nothing but the protocol itself ever
/// "spends" from [`Address::null`] as a sender.
pub fn genesis_recipient() -> Address {
    Address::new(GENESIS_RECIPIENT_BYTES)
}

fn build_genesis_block() -> Block {
    let credit = Transaction {
        from: Address::null(),
        to: genesis_recipient(),
        amount: GENESIS_AMOUNT,
        fee: 0,
        timestamp: GENESIS_TIMESTAMP,
        kind: TxKind::MessageCall,
        data: Vec::new(),
        signature: Vec::new(),
    };
    let mut txs = TransactionsSet::new();
    txs.add(credit);
    Block::new(0, null_hash(), GENESIS_TIMESTAMP, Address::null(), txs)
}

static GENESIS_BLOCK: Lazy<Block> = Lazy::new(build_genesis_block);

/// The network's single, fixed genesis block. Every honest node computes
/// the same value and the same hash for it.
pub fn genesis_block() -> Block {
    GENESIS_BLOCK.clone()
}

//! The `VmAdapter` collaborator: the deterministic contract-execution
//! interface invoked during per-transaction application. The concrete VM
//! (an EVM-compatible interpreter, typically) lives outside this crate;
//! this module defines the narrow interface plus a reference adapter used
//! by this crate's own tests.

use crate::account::Account;
use crate::address::Address;
use crate::block::Block;
use crate::error::Result;
use crate::transaction::Transaction;

/// Result of a `MESSAGE_CALL` into contract code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub ok: bool,
    pub output: Vec<u8>,
    pub gas_left: u64,
}

/// The contract-execution collaborator. Both methods must be
/// deterministic: given the same transaction, block, and pre-call state,
/// every honest node must compute the same result.
pub trait VmAdapter: Send + Sync {
    /// Executes a newly created contract's constructor.
    fn create_contract(
        &self,
        address: Address,
        tx: &Transaction,
        block: &Block,
    ) -> Result<(Address, Vec<u8>, u64)>;

    /// Executes a call into an existing contract.
    fn call(&self, account: &Account, tx: &Transaction, block: &Block) -> Result<ExecutionResult>;
}

/// A reference adapter used by this crate's own tests: the "contract" is
/// always just an echo of its input, and gas is a fixed fraction of the
/// fee supplied, so the end-to-end scenarios in `spec.md` §8 are
/// reproducible without a real VM dependency.
#[derive(Debug, Default)]
pub struct EchoVm;

impl VmAdapter for EchoVm {
    fn create_contract(
        &self,
        address: Address,
        tx: &Transaction,
        _block: &Block,
    ) -> Result<(Address, Vec<u8>, u64)> {
        let gas_left = tx.fee / 2;
        Ok((address, Vec::new(), gas_left))
    }

    fn call(&self, _account: &Account, tx: &Transaction, _block: &Block) -> Result<ExecutionResult> {
        let gas_left = tx.fee / 2;
        Ok(ExecutionResult { ok: true, output: tx.data.clone(), gas_left })
    }
}

//! The [`Account`] entity: balance, replay-nonce, and contract code
//! pointer.

use serde::{Deserialize, Serialize};

use crate::crypto::Hash;

/// `{balance, nonce, code_hash}`. A null `code_hash` marks an
/// externally-owned account; a non-null one references bytecode held by
/// the account-state engine's code manager (see
/// [`crate::account_state::AccountStateEngine`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Account {
    pub balance: u64,
    pub nonce: u64,
    pub code_hash: Option<Hash>,
}

impl Account {
    /// A fresh, zero-balance externally-owned account, as created on first
    /// credit.
    pub fn new_eoa() -> Self {
        Self { balance: 0, nonce: 0, code_hash: None }
    }

    /// `true` if this account has contract code attached.
    pub fn is_contract(&self) -> bool {
        self.code_hash.is_some()
    }
}

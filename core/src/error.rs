//! Error types for the **Obscura** core crate.
//!
//! All high-level operations return [`crate::Result`], a convenient alias for
//! `core::result::Result<T, Error>`. The variants correspond one-to-one to
//! the semantic error kinds of the admission and commit protocols: most of
//! the public API collapses these into a boolean and only logs the kind
//! (see module docs on [`crate::facade`]), but the kind is always available
//! to callers who need it (tests, the storage-failure exit path).
//!
//! # Examples
//!
//! ```
//! use obscura_core::{Error, Result};
//!
//! fn demo_fn(fail: bool) -> Result<()> {
//!     if fail {
//!         Err(Error::ChainLink)
//!     } else {
//!         Ok(())
//!     }
//! }
//! ```

use thiserror::Error;

/// Core crate error type.
#[derive(Debug, Error, Clone)]
pub enum Error {
    /// User-supplied data was syntactically invalid (bad address string,
    /// malformed hex, wrong-length byte slice).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Transaction admission failed the signature check.
    #[error("signature verification failed")]
    InvalidSignature,

    /// The transaction is already on-chain or already pending, or the block
    /// is already present in the chain store.
    #[error("duplicate")]
    Duplicate,

    /// Sender's balance (on-chain, minus already-pending debits) cannot
    /// cover `amount + fee`.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Block does not extend the current chain tip (wrong `prev_block_hash`
    /// or non-sequential `depth`).
    #[error("block does not extend chain tip")]
    ChainLink,

    /// The VM collaborator returned a non-success result for a transaction.
    /// Caught per-transaction; never fails the enclosing block.
    #[error("vm execution failed: {0}")]
    VmFailure(String),

    /// The `PersistentKv` collaborator returned an error. Fatal to the
    /// commit in progress; callers are expected to treat this as fatal to
    /// the node process.
    #[error("storage failure: {0}")]
    StorageFailure(String),

    /// Deserialization of an untrusted byte stream failed.
    #[error("codec error: {0}")]
    Codec(#[from] crate::codec::CodecError),
}

/// Convenient result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

//! Runtime configuration for **Obscura** core.
//!
//! The [`Config`] struct centralises tunable parameters: the persistent-
//! store tuning knobs, the per-block transaction cap, and the coinbase
//! emission. It is constructed via the [`ConfigBuilder`] fluent builder so
//! callers override only the fields they care about while keeping sensible
//! defaults. Mining/difficulty knobs are deliberately absent — proof-of-work
//! is an external miner collaborator's concern, not this crate's (see
//! `SPEC_FULL.md` REDESIGN FLAGS).
//!
//! ```
//! use obscura_core::config::Config;
//!
//! let cfg = Config::default();
//! assert_eq!(cfg.max_txs_per_block, 100);
//! ```

use serde::{Deserialize, Serialize};

use crate::account_state::EMISSION;
use crate::block::MAX_TXS_PER_BLOCK;
use crate::kv::{BLOCK_CACHE_SIZE, DATA_BLOCK_SIZE, WRITE_BUFFER_SIZE};

/// Runtime configuration shared across the crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Human-readable name identifying the network (e.g. "main", "test").
    pub network: String,

    /// Maximum transactions a single block may carry.
    pub max_txs_per_block: usize,

    /// Coinbase emission credited on every committed block.
    pub emission: u64,

    /// `rocksdb-backend`'s write buffer size, in bytes.
    pub kv_write_buffer_size: usize,

    /// `rocksdb-backend`'s data block size, in bytes.
    pub kv_data_block_size: usize,

    /// `rocksdb-backend`'s block cache size, in bytes.
    pub kv_block_cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: "main".into(),
            max_txs_per_block: MAX_TXS_PER_BLOCK,
            emission: EMISSION,
            kv_write_buffer_size: WRITE_BUFFER_SIZE,
            kv_data_block_size: DATA_BLOCK_SIZE,
            kv_block_cache_size: BLOCK_CACHE_SIZE,
        }
    }
}

/// Fluent builder for [`Config`].
pub struct ConfigBuilder {
    inner: Config,
}

impl ConfigBuilder {
    /// Starts a new builder pre-populated with [`Config::default`].
    pub fn new() -> Self {
        Self { inner: Config::default() }
    }

    pub fn network<S: Into<String>>(mut self, name: S) -> Self {
        self.inner.network = name.into();
        self
    }

    pub fn max_txs_per_block(mut self, n: usize) -> Self {
        self.inner.max_txs_per_block = n;
        self
    }

    pub fn emission(mut self, amount: u64) -> Self {
        self.inner.emission = amount;
        self
    }

    pub fn kv_write_buffer_size(mut self, bytes: usize) -> Self {
        self.inner.kv_write_buffer_size = bytes;
        self
    }

    pub fn kv_data_block_size(mut self, bytes: usize) -> Self {
        self.inner.kv_data_block_size = bytes;
        self
    }

    pub fn kv_block_cache_size(mut self, bytes: usize) -> Self {
        self.inner.kv_block_cache_size = bytes;
        self
    }

    /// Consumes the builder returning an immutable configuration value.
    pub fn finish(self) -> Config {
        self.inner
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_fields() {
        let cfg = ConfigBuilder::new()
            .network("test")
            .max_txs_per_block(10)
            .emission(5)
            .finish();
        assert_eq!(cfg.network, "test");
        assert_eq!(cfg.max_txs_per_block, 10);
        assert_eq!(cfg.emission, 5);
    }

    #[test]
    fn defaults_match_protocol_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.max_txs_per_block, MAX_TXS_PER_BLOCK);
        assert_eq!(cfg.emission, EMISSION);
    }
}

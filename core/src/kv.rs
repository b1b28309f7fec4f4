//! The `PersistentKv` collaborator: a minimal key/value interface the
//! chain store uses for durability. The concrete store (an embedded
//! database, a remote service, whatever the node binary wires up) lives
//! outside this crate's hard dependency graph — this module only defines
//! the trait plus two reference implementations: an in-memory map for
//! tests, and an optional `rocksdb`-backed store (behind the
//! `rocksdb-backend` feature) configured to the tuning values `spec.md`
//! §6 fixes for compatibility across nodes.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};

/// 50 MB write buffer, per `spec.md` §6.
pub const WRITE_BUFFER_SIZE: usize = 50 * 1024 * 1024;
/// 10 KB data block size, per `spec.md` §6.
pub const DATA_BLOCK_SIZE: usize = 10 * 1024;
/// 50 MB block cache, per `spec.md` §6.
pub const BLOCK_CACHE_SIZE: usize = 50 * 1024 * 1024;

/// A namespaced, ordered key/value collaborator. `scan` returns every
/// `(key, value)` pair whose key starts with `prefix`, in key order.
pub trait PersistentKv: Send + Sync {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    fn scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
}

/// Key namespace for block-by-hash entries.
pub const NS_BLOCK: &[u8] = b"block/";
/// Key namespace for hash-by-depth entries.
pub const NS_BY_DEPTH: &[u8] = b"by_depth/";
/// Key namespace for block-hash-by-transaction-hash entries.
pub const NS_BY_TX: &[u8] = b"by_tx/";

fn namespaced(ns: &[u8], key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ns.len() + key.len());
    out.extend_from_slice(ns);
    out.extend_from_slice(key);
    out
}

/// Writes `value` under `ns`-namespaced `key`. Writes are idempotent: a
/// repeat `put` of the same key/value pair is a no-op from the caller's
/// perspective.
pub fn put_namespaced(kv: &dyn PersistentKv, ns: &[u8], key: &[u8], value: &[u8]) -> Result<()> {
    kv.put(&namespaced(ns, key), value)
}

/// Reads the value under `ns`-namespaced `key`.
pub fn get_namespaced(kv: &dyn PersistentKv, ns: &[u8], key: &[u8]) -> Result<Option<Vec<u8>>> {
    kv.get(&namespaced(ns, key))
}

/// Scans every value under `ns`, stripping the namespace prefix from the
/// returned keys.
pub fn scan_namespaced(kv: &dyn PersistentKv, ns: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
    let rows = kv.scan(ns)?;
    Ok(rows
        .into_iter()
        .map(|(k, v)| (k[ns.len()..].to_vec(), v))
        .collect())
}

/// An in-memory reference implementation, used by default and by every
/// test in this crate. Durability is obviously not provided; callers who
/// need it wire in the `rocksdb-backend` feature's store instead.
#[derive(Default)]
pub struct MemoryKv {
    map: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryKv {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl PersistentKv for MemoryKv {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.map.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .map
            .read()
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// A `rocksdb`-backed store tuned to the constants `spec.md` §6 fixes:
/// 50 MB write buffer, 10 KB data block, 50 MB block cache, no
/// compression. Gated behind the `rocksdb-backend` feature so the default
/// build of this crate stays free of a C++ toolchain dependency.
#[cfg(feature = "rocksdb-backend")]
pub struct RocksDbKv {
    db: rocksdb::DB,
}

#[cfg(feature = "rocksdb-backend")]
impl RocksDbKv {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let mut opts = rocksdb::Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(WRITE_BUFFER_SIZE);
        opts.set_compression_type(rocksdb::DBCompressionType::None);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_block_size(DATA_BLOCK_SIZE);
        let cache = rocksdb::Cache::new_lru_cache(BLOCK_CACHE_SIZE);
        block_opts.set_block_cache(&cache);
        opts.set_block_based_table_factory(&block_opts);

        let db = rocksdb::DB::open(&opts, path)
            .map_err(|e| Error::StorageFailure(e.to_string()))?;
        Ok(Self { db })
    }
}

#[cfg(feature = "rocksdb-backend")]
impl PersistentKv for RocksDbKv {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.db.put(key, value).map_err(|e| Error::StorageFailure(e.to_string()))
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.db
            .get(key)
            .map_err(|e| Error::StorageFailure(e.to_string()))
    }

    fn scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let iter = self.db.prefix_iterator(prefix);
        let mut out = Vec::new();
        for item in iter {
            let (k, v) = item.map_err(|e| Error::StorageFailure(e.to_string()))?;
            if !k.starts_with(prefix) {
                break;
            }
            out.push((k.to_vec(), v.to_vec()));
        }
        Ok(out)
    }
}

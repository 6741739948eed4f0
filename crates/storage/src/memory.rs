//! MemoryStore: in-memory transactional store
//!
//! This module implements the transaction traits from `strata-core` using:
//! - A copy-on-write namespace [`Tree`] as the committed state
//! - `parking_lot::RwLock` to publish a new committed state atomically
//! - A writer `parking_lot::Mutex` so at most one write transaction is open
//! - `AtomicU64` counting committed write transactions
//!
//! # Isolation
//!
//! Read transactions pin the committed state they started from and never
//! observe later commits (snapshot isolation). Write transactions are
//! serialised: each one works on a private copy of the latest state and
//! publishes it on commit. A write transaction that is dropped without
//! `commit` is rolled back.
//!
//! # Cost model
//!
//! Copy-on-write works per namespace. The first write a transaction makes
//! to a namespace copies that namespace's entries (and every namespace on
//! the path to it), so it costs O(n) in the namespace size; later writes to
//! the same namespace in the same transaction are O(log n). Namespaces the
//! transaction does not write stay shared with the committed state.
//! Batch many small writes into one transaction when namespaces are large.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::{debug, trace};

use strata_core::{Entry, NamespacePath, ReadTransaction, Result, Seek, WriteTransaction};

use crate::tree::Tree;

#[derive(Debug, Default)]
struct Inner {
    /// Latest committed state
    committed: RwLock<Arc<Tree>>,
    /// Serialises write transactions
    writer: Mutex<()>,
    /// Number of committed write transactions
    version: AtomicU64,
}

/// In-memory ordered key-value store with snapshot transactions
///
/// Cloning a `MemoryStore` yields another handle to the same data. Each
/// write transaction copies the namespaces it writes to, see the
/// [module docs](self) for the cost model.
///
/// # Example
///
/// ```
/// use strata_core::{NamespacePath, ReadTransaction, WriteTransaction};
/// use strata_storage::MemoryStore;
///
/// let store = MemoryStore::new();
/// let ns = NamespacePath::root("greetings");
///
/// store.update(|tx| {
///     tx.create_namespace_if_missing(&ns)?;
///     tx.put(&ns, b"hello", b"world".to_vec())
/// }).unwrap();
///
/// let value = store.view(|tx| tx.get(&ns, b"hello")).unwrap();
/// assert_eq!(value, Some(b"world".to_vec()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a read-only transaction on the latest committed state
    pub fn begin_read(&self) -> ReadTxn {
        let snapshot = self.inner.committed.read().clone();
        ReadTxn { snapshot }
    }

    /// Start a write transaction
    ///
    /// Blocks while another write transaction is open.
    pub fn begin_write(&self) -> WriteTxn<'_> {
        let guard = self.inner.writer.lock();
        let working = (**self.inner.committed.read()).clone();
        trace!(target: "strata::storage", "Write transaction started");
        WriteTxn {
            inner: &self.inner,
            _guard: guard,
            working,
            committed: false,
        }
    }

    /// Run `f` in a read transaction
    pub fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ReadTxn) -> Result<T>,
    {
        let tx = self.begin_read();
        f(&tx)
    }

    /// Run `f` in a write transaction
    ///
    /// Commits if `f` returns `Ok`, rolls back if it returns `Err`.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut WriteTxn<'_>) -> Result<T>,
    {
        let mut tx = self.begin_write();
        let value = f(&mut tx)?;
        tx.commit();
        Ok(value)
    }

    /// Number of committed write transactions
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }
}

/// Read-only transaction over a pinned snapshot
#[derive(Debug, Clone)]
pub struct ReadTxn {
    snapshot: Arc<Tree>,
}

impl ReadTxn {
    /// Number of entries in a namespace
    pub fn entry_count(&self, path: &NamespacePath) -> Result<usize> {
        Ok(self.snapshot.require(path)?.len())
    }
}

impl ReadTransaction for ReadTxn {
    fn namespace_exists(&self, path: &NamespacePath) -> bool {
        self.snapshot.bucket(path).is_some()
    }

    fn get(&self, path: &NamespacePath, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.snapshot.require(path)?.get(key).cloned())
    }

    fn seek(&self, path: &NamespacePath, seek: Seek<'_>) -> Result<Option<Entry>> {
        Ok(self.snapshot.require(path)?.seek(seek))
    }
}

/// Read-write transaction over a private copy of the latest state
#[derive(Debug)]
pub struct WriteTxn<'a> {
    inner: &'a Inner,
    _guard: MutexGuard<'a, ()>,
    working: Tree,
    committed: bool,
}

impl WriteTxn<'_> {
    /// Publish this transaction's writes
    pub fn commit(mut self) {
        let working = std::mem::take(&mut self.working);
        *self.inner.committed.write() = Arc::new(working);
        let version = self.inner.version.fetch_add(1, Ordering::SeqCst) + 1;
        self.committed = true;
        debug!(target: "strata::storage", version, "Write transaction committed");
    }

    /// Discard this transaction's writes
    pub fn rollback(self) {
        // Drop does the work
    }

    /// Number of entries in a namespace, including uncommitted writes
    pub fn entry_count(&self, path: &NamespacePath) -> Result<usize> {
        Ok(self.working.require(path)?.len())
    }
}

impl Drop for WriteTxn<'_> {
    fn drop(&mut self) {
        if !self.committed {
            debug!(target: "strata::storage", "Write transaction rolled back");
        }
    }
}

impl ReadTransaction for WriteTxn<'_> {
    fn namespace_exists(&self, path: &NamespacePath) -> bool {
        self.working.bucket(path).is_some()
    }

    fn get(&self, path: &NamespacePath, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.working.require(path)?.get(key).cloned())
    }

    fn seek(&self, path: &NamespacePath, seek: Seek<'_>) -> Result<Option<Entry>> {
        Ok(self.working.require(path)?.seek(seek))
    }
}

impl WriteTransaction for WriteTxn<'_> {
    fn create_namespace_if_missing(&mut self, path: &NamespacePath) -> Result<()> {
        if self.working.create(path)? {
            trace!(target: "strata::storage", namespace = %path, "Namespace created");
        }
        Ok(())
    }

    fn put(&mut self, path: &NamespacePath, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.working.require_mut(path)?.insert(key, value);
        Ok(())
    }

    fn delete(&mut self, path: &NamespacePath, key: &[u8]) -> Result<()> {
        self.working.require_mut(path)?.remove(key);
        Ok(())
    }
}

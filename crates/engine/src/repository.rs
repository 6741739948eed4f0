//! IndexedRepository: records plus secondary indexes
//!
//! ## Design
//!
//! IndexedRepository is a stateless facade over a caller-supplied
//! transaction. It holds the record type's schema and configuration, and
//! nothing else: every read and write goes through the transaction passed
//! into the call, and no namespace or cursor handle outlives it.
//!
//! ## Layout
//!
//! ```text
//! <Type>            key_of(id)        -> encoded record
//! <Type>/<field>    encode(value)     -> encoded KeySet of primary keys
//! ```
//!
//! ## Index maintenance
//!
//! ```text
//! put(record)
//!     1. encode record and every indexed value (fail before writing)
//!     2. if replacing: read previous record, drop its key from changed values
//!     3. add key to each value's KeySet
//!     4. write record
//!
//! delete(key)
//!     1. read previous record (KeyNotFound if absent)
//!     2. drop key from each value's KeySet
//!     3. delete record
//! ```
//!
//! Index entries are always written before the record entry and removed
//! before it, so an interrupted sequence leaves a dangling index reference
//! rather than a record no index can reach. Lookups skip dangling
//! references; [`IndexedRepository::rebuild_indexes`] repairs them.
//!
//! A stored record that no longer decodes cannot be deleted (its index
//! values are unknown) and makes consistency checks fail. `put` overwrites
//! it without index cleanup, after which delete and rebuild work again.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace, warn};

use strata_core::codec;
use strata_core::{
    Entry, Error, KeySet, NamespacePath, PrimaryKey, ReadTransaction, Record, Result, Schema,
    SchemaDescriptor, Seek, WriteTransaction,
};

use crate::config::RepositoryConfig;
use crate::cursor::RecordCursor;

/// Stores records of type `R` and keeps their secondary indexes consistent
///
/// # Example
///
/// ```ignore
/// let store = MemoryStore::new();
/// let customers = IndexedRepository::<Customer>::new()?;
///
/// store.update(|tx| {
///     customers.create_schema(tx)?;
///     customers.put(tx, &Customer { id: 1, company: "ACME".into() })
/// })?;
///
/// let acme = store.view(|tx| customers.get_by_index(tx, "company", "ACME"))?;
/// ```
pub struct IndexedRepository<R: Record> {
    schema: Arc<Schema<R>>,
    config: RepositoryConfig,
    namespace: NamespacePath,
    /// One path per indexed field, in declaration order
    index_paths: Vec<NamespacePath>,
}

impl<R: Record> IndexedRepository<R> {
    /// Repository for `R` using its cached schema and the default configuration
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if `R`'s schema declaration is invalid.
    pub fn new() -> Result<Self> {
        Ok(Self::from_schema(Schema::<R>::cached()?))
    }

    /// Repository for `R` using an explicitly built schema
    pub fn with_schema(schema: Schema<R>) -> Self {
        Self::from_schema(Arc::new(schema))
    }

    fn from_schema(schema: Arc<Schema<R>>) -> Self {
        let namespace = NamespacePath::root(schema.descriptor().primary_namespace());
        let index_paths = schema
            .descriptor()
            .indexed_fields()
            .iter()
            .map(|field| namespace.child(field))
            .collect();
        Self {
            schema,
            config: RepositoryConfig::default(),
            namespace,
            index_paths,
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: RepositoryConfig) -> Self {
        self.config = config;
        self
    }

    /// The record type's schema
    pub fn schema(&self) -> &Schema<R> {
        &self.schema
    }

    /// The record type's schema descriptor
    pub fn descriptor(&self) -> &SchemaDescriptor {
        self.schema.descriptor()
    }

    /// Active configuration
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Path of the primary namespace
    pub fn namespace_path(&self) -> &NamespacePath {
        &self.namespace
    }

    /// Path of the index namespace for `field`
    ///
    /// The path is computed for any name; it only exists in storage for
    /// declared indexed fields after [`IndexedRepository::create_schema`].
    pub fn index_path(&self, field: &str) -> NamespacePath {
        self.namespace.child(field)
    }

    /// Encode a record with the record codec
    pub fn encode(&self, record: &R) -> Result<Vec<u8>> {
        codec::encode(record)
    }

    /// Decode a record with the record codec
    pub fn decode(&self, bytes: &[u8]) -> Result<R> {
        codec::decode(bytes)
    }

    // ========== Schema ==========

    /// Create the primary namespace and every index namespace if absent
    ///
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the engine fails to create a namespace.
    pub fn create_schema<T>(&self, tx: &mut T) -> Result<()>
    where
        T: WriteTransaction + ?Sized,
    {
        tx.create_namespace_if_missing(&self.namespace)?;
        for path in &self.index_paths {
            tx.create_namespace_if_missing(path)?;
        }
        debug!(
            target: "strata::repo",
            namespace = %self.namespace,
            indexes = self.index_paths.len(),
            "Schema created"
        );
        Ok(())
    }

    // ========== Writes ==========

    /// Store a record and add its primary key to every indexed value
    ///
    /// Overwrites any record with the same primary key. With
    /// `replace_stale_index_entries` enabled (the default) the previous
    /// record's key is removed from index values that changed; otherwise
    /// stale entries stay until the caller deletes the record.
    ///
    /// # Errors
    ///
    /// - `CodecError` if the record or an indexed value fails to encode
    /// - `StorageError` if a namespace is missing or a write fails
    pub fn put<T>(&self, tx: &mut T, record: &R) -> Result<()>
    where
        T: WriteTransaction + ?Sized,
    {
        let key = record.key();
        let data = self.encode(record)?;
        let values = self.schema.index_values(record)?;

        let previous = if self.config.replace_stale_index_entries {
            self.previous_index_values(tx, &key)?
        } else {
            None
        };

        for (i, (field, value)) in values.iter().enumerate() {
            let path = &self.index_paths[i];
            if let Some(old_values) = &previous {
                let old_value = &old_values[i].1;
                if old_value != value {
                    trace!(target: "strata::repo", field, "Indexed value changed");
                    self.remove_from_index(tx, path, old_value, &key)?;
                }
            }
            self.add_to_index(tx, path, value, &key)?;
        }

        tx.put(&self.namespace, &key, data)?;
        debug!(
            target: "strata::repo",
            namespace = %self.namespace,
            id = ?record.id(),
            replaced = previous.is_some(),
            "Record stored"
        );
        Ok(())
    }

    /// Index values of the record currently stored under `key`
    ///
    /// A stored record that no longer decodes yields `None`, so `put` can
    /// still overwrite it; its index entries stay behind as dangling
    /// references until [`IndexedRepository::rebuild_indexes`] runs.
    fn previous_index_values<T>(
        &self,
        tx: &T,
        key: &[u8],
    ) -> Result<Option<Vec<(&str, Vec<u8>)>>>
    where
        T: ReadTransaction + ?Sized,
    {
        let bytes = match tx.get(&self.namespace, key)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        match self.decode(&bytes) {
            Ok(previous) => self.schema.index_values(&previous).map(Some),
            Err(e) => {
                warn!(
                    target: "strata::repo",
                    namespace = %self.namespace,
                    error = %e,
                    "Previous record unreadable, overwriting without index cleanup"
                );
                Ok(None)
            }
        }
    }

    /// Remove a record and its primary key from every indexed value
    ///
    /// Returns the removed record. Index entries are cleaned before the
    /// record itself is deleted; a key already missing from a key set is
    /// ignored.
    ///
    /// # Errors
    ///
    /// - `KeyNotFound` if no record is stored under `key`
    /// - `CodecError` if the stored record or a key set fails to decode
    /// - `StorageError` if a namespace is missing or a write fails
    pub fn delete<T>(&self, tx: &mut T, key: &[u8]) -> Result<R>
    where
        T: WriteTransaction + ?Sized,
    {
        let bytes = tx
            .get(&self.namespace, key)?
            .ok_or_else(|| Error::key_not_found(&self.namespace, key))?;
        let record = self.decode(&bytes)?;

        for (i, (_, value)) in self.schema.index_values(&record)?.iter().enumerate() {
            self.remove_from_index(tx, &self.index_paths[i], value, key)?;
        }

        tx.delete(&self.namespace, key)?;
        debug!(
            target: "strata::repo",
            namespace = %self.namespace,
            id = ?record.id(),
            "Record deleted"
        );
        Ok(record)
    }

    /// Delete by primary identifier
    pub fn delete_by_id<T>(&self, tx: &mut T, id: R::Id) -> Result<R>
    where
        T: WriteTransaction + ?Sized,
    {
        self.delete(tx, &id.to_key_bytes())
    }

    fn add_to_index<T>(&self, tx: &mut T, path: &NamespacePath, value: &[u8], key: &[u8]) -> Result<()>
    where
        T: WriteTransaction + ?Sized,
    {
        let mut keys = self.load_key_set(tx, path, value)?;
        if keys.add(key) {
            tx.put(path, value, keys.encode()?)?;
            trace!(target: "strata::repo", index = %path, members = keys.len(), "Key added to index");
        }
        Ok(())
    }

    fn remove_from_index<T>(
        &self,
        tx: &mut T,
        path: &NamespacePath,
        value: &[u8],
        key: &[u8],
    ) -> Result<()>
    where
        T: WriteTransaction + ?Sized,
    {
        let mut keys = self.load_key_set(tx, path, value)?;
        if !keys.remove(key) {
            trace!(target: "strata::repo", index = %path, "Key already absent from index");
            return Ok(());
        }
        if keys.is_empty() && self.config.prune_empty_key_sets {
            tx.delete(path, value)?;
            trace!(target: "strata::repo", index = %path, "Empty index entry pruned");
        } else {
            tx.put(path, value, keys.encode()?)?;
            trace!(target: "strata::repo", index = %path, members = keys.len(), "Key removed from index");
        }
        Ok(())
    }

    fn load_key_set<T>(&self, tx: &T, path: &NamespacePath, value: &[u8]) -> Result<KeySet>
    where
        T: ReadTransaction + ?Sized,
    {
        match tx.get(path, value)? {
            Some(bytes) => KeySet::decode(&bytes),
            None => Ok(KeySet::new()),
        }
    }

    // ========== Reads ==========

    /// Record stored under `key`, or `None` if absent
    ///
    /// # Errors
    ///
    /// - `CodecError` if the stored bytes fail to decode
    /// - `StorageError` if the primary namespace is missing
    pub fn get<T>(&self, tx: &T, key: &[u8]) -> Result<Option<R>>
    where
        T: ReadTransaction + ?Sized,
    {
        match tx.get(&self.namespace, key)? {
            Some(bytes) => Ok(Some(self.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Record with primary identifier `id`, or `None` if absent
    pub fn get_by_id<T>(&self, tx: &T, id: R::Id) -> Result<Option<R>>
    where
        T: ReadTransaction + ?Sized,
    {
        self.get(tx, &id.to_key_bytes())
    }

    /// True if a record is stored under `key`
    pub fn exists<T>(&self, tx: &T, key: &[u8]) -> Result<bool>
    where
        T: ReadTransaction + ?Sized,
    {
        Ok(tx.get(&self.namespace, key)?.is_some())
    }

    /// Primary keys indexed under `value` for `field`
    ///
    /// `value` must have the field's native type (`&str` and `String` are
    /// interchangeable). An unknown value yields an empty set.
    ///
    /// # Errors
    ///
    /// - `StorageError` if `field` has no index namespace
    /// - `CodecError` if `value` fails to encode or the key set fails to decode
    pub fn index_keys<T, V>(&self, tx: &T, field: &str, value: &V) -> Result<KeySet>
    where
        T: ReadTransaction + ?Sized,
        V: Serialize + ?Sized,
    {
        let path = self.index_path(field);
        if !tx.namespace_exists(&path) {
            return Err(Error::StorageError(format!(
                "no index namespace for field '{}' ({})",
                field, path
            )));
        }
        let encoded = codec::encode(value)?;
        self.load_key_set(tx, &path, &encoded)
    }

    /// Records whose `field` equals `value`, in primary key order
    ///
    /// Index references whose record no longer exists are skipped.
    ///
    /// # Errors
    ///
    /// - `StorageError` if `field` has no index namespace
    /// - `CodecError` if `value`, the key set or a referenced record fails
    ///   to encode/decode
    pub fn get_by_index<T, V>(&self, tx: &T, field: &str, value: &V) -> Result<Vec<R>>
    where
        T: ReadTransaction + ?Sized,
        V: Serialize + ?Sized,
    {
        let keys = self.index_keys(tx, field, value)?;
        let mut records = Vec::with_capacity(keys.len());
        for key in keys.iter() {
            match self.get(tx, key)? {
                Some(record) => records.push(record),
                None => warn!(
                    target: "strata::repo",
                    namespace = %self.namespace,
                    field,
                    "Skipping dangling index reference"
                ),
            }
        }
        Ok(records)
    }

    /// Number of stored records
    pub fn count<T>(&self, tx: &T) -> Result<usize>
    where
        T: ReadTransaction + ?Sized,
    {
        Ok(scan(tx, &self.namespace)?.len())
    }

    // ========== Traversal ==========

    /// Record with the smallest primary key
    pub fn first<T>(&self, tx: &T) -> Result<Option<R>>
    where
        T: ReadTransaction + ?Sized,
    {
        self.seek_record(tx, Seek::First)
    }

    /// Record with the largest primary key
    pub fn last<T>(&self, tx: &T) -> Result<Option<R>>
    where
        T: ReadTransaction + ?Sized,
    {
        self.seek_record(tx, Seek::Last)
    }

    /// Record following `key` in primary key order
    ///
    /// `key` need not exist. For repeated traversal prefer
    /// [`IndexedRepository::cursor`].
    pub fn next<T>(&self, tx: &T, key: &[u8]) -> Result<Option<R>>
    where
        T: ReadTransaction + ?Sized,
    {
        self.seek_record(tx, Seek::After(key))
    }

    /// Record preceding `key` in primary key order
    pub fn prev<T>(&self, tx: &T, key: &[u8]) -> Result<Option<R>>
    where
        T: ReadTransaction + ?Sized,
    {
        self.seek_record(tx, Seek::Before(key))
    }

    /// Explicit cursor over the primary namespace, bound to `tx`
    pub fn cursor<'tx, T>(&self, tx: &'tx T) -> RecordCursor<'tx, '_, R, T>
    where
        T: ReadTransaction + ?Sized,
    {
        RecordCursor::new(self, tx)
    }

    pub(crate) fn seek_entry<T>(&self, tx: &T, seek: Seek<'_>) -> Result<Option<Entry>>
    where
        T: ReadTransaction + ?Sized,
    {
        tx.seek(&self.namespace, seek)
    }

    fn seek_record<T>(&self, tx: &T, seek: Seek<'_>) -> Result<Option<R>>
    where
        T: ReadTransaction + ?Sized,
    {
        match self.seek_entry(tx, seek)? {
            Some((_, value)) => Ok(Some(self.decode(&value)?)),
            None => Ok(None),
        }
    }

    // ========== Consistency ==========

    /// Compare stored index entries against the records they describe
    ///
    /// Read-only. Reports references to records that are missing or no
    /// longer hold the indexed value (dangling), and records whose key is
    /// absent from their value's key set (missing).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if a namespace is missing, `CodecError` if a
    /// record or key set fails to decode.
    pub fn check_consistency<T>(&self, tx: &T) -> Result<IndexReport>
    where
        T: ReadTransaction + ?Sized,
    {
        Ok(self.diff(tx)?.report)
    }

    /// Rewrite every index namespace from the primary namespace
    ///
    /// Creates missing namespaces first. Afterwards each index holds
    /// exactly the entries derived from the stored records. The returned
    /// report describes the drift that was repaired.
    pub fn rebuild_indexes<T>(&self, tx: &mut T) -> Result<IndexReport>
    where
        T: WriteTransaction + ?Sized,
    {
        self.create_schema(tx)?;
        let diff = self.diff(tx)?;

        for (i, path) in self.index_paths.iter().enumerate() {
            let expected = &diff.expected[i];
            let stored = &diff.stored[i];
            for value in stored.keys() {
                if !expected.contains_key(value) {
                    tx.delete(path, value)?;
                }
            }
            for (value, keys) in expected {
                if stored.get(value) != Some(keys) {
                    tx.put(path, value, keys.encode()?)?;
                }
            }
        }

        if diff.report.is_consistent() {
            debug!(target: "strata::repo", namespace = %self.namespace, "Indexes rebuilt, no drift");
        } else {
            warn!(
                target: "strata::repo",
                namespace = %self.namespace,
                dangling = diff.report.dangling.len(),
                missing = diff.report.missing.len(),
                "Indexes rebuilt, drift repaired"
            );
        }
        Ok(diff.report)
    }

    fn diff<T>(&self, tx: &T) -> Result<IndexDiff>
    where
        T: ReadTransaction + ?Sized,
    {
        let fields = self.descriptor().indexed_fields();
        let mut expected: Vec<BTreeMap<Vec<u8>, KeySet>> = vec![BTreeMap::new(); fields.len()];

        let records = scan(tx, &self.namespace)?;
        for (key, bytes) in &records {
            let record = self.decode(bytes)?;
            for (i, (_, value)) in self.schema.index_values(&record)?.into_iter().enumerate() {
                expected[i].entry(value).or_default().add(key);
            }
        }

        let mut stored = Vec::with_capacity(fields.len());
        for path in &self.index_paths {
            let mut entries = BTreeMap::new();
            for (value, bytes) in scan(tx, path)? {
                entries.insert(value, KeySet::decode(&bytes)?);
            }
            stored.push(entries);
        }

        let mut report = IndexReport {
            records: records.len(),
            index_entries: expected.iter().map(BTreeMap::len).sum(),
            ..IndexReport::default()
        };
        for (i, field) in fields.iter().enumerate() {
            for (value, keys) in &stored[i] {
                for key in keys.iter() {
                    let valid = expected[i].get(value).map_or(false, |s| s.contains(key));
                    if !valid {
                        report.dangling.push(IndexRef::new(field, value, key));
                    }
                }
            }
            for (value, keys) in &expected[i] {
                for key in keys.iter() {
                    let present = stored[i].get(value).map_or(false, |s| s.contains(key));
                    if !present {
                        report.missing.push(IndexRef::new(field, value, key));
                    }
                }
            }
        }

        Ok(IndexDiff {
            expected,
            stored,
            report,
        })
    }
}

impl<R: Record> Clone for IndexedRepository<R> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            config: self.config.clone(),
            namespace: self.namespace.clone(),
            index_paths: self.index_paths.clone(),
        }
    }
}

impl<R: Record> std::fmt::Debug for IndexedRepository<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedRepository")
            .field("descriptor", self.descriptor())
            .field("config", &self.config)
            .finish()
    }
}

/// Every entry of a namespace, in key order
fn scan<T>(tx: &T, path: &NamespacePath) -> Result<Vec<Entry>>
where
    T: ReadTransaction + ?Sized,
{
    let mut entries = Vec::new();
    let mut next = tx.seek(path, Seek::First)?;
    while let Some(entry) = next {
        next = tx.seek(path, Seek::After(&entry.0))?;
        entries.push(entry);
    }
    Ok(entries)
}

struct IndexDiff {
    expected: Vec<BTreeMap<Vec<u8>, KeySet>>,
    stored: Vec<BTreeMap<Vec<u8>, KeySet>>,
    report: IndexReport,
}

/// One primary key referenced (or expected) under one index value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRef {
    /// Indexed field name
    pub field: String,
    /// Encoded field value
    pub value: Vec<u8>,
    /// Primary key
    pub key: Vec<u8>,
}

impl IndexRef {
    fn new(field: &str, value: &[u8], key: &[u8]) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_vec(),
            key: key.to_vec(),
        }
    }
}

/// Result of comparing index namespaces with the primary namespace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Records scanned
    pub records: usize,
    /// Index entries (field value -> key set) derived from the records
    pub index_entries: usize,
    /// References to records that are absent or hold a different value
    pub dangling: Vec<IndexRef>,
    /// Records missing from their value's key set
    pub missing: Vec<IndexRef>,
}

impl IndexReport {
    /// True if no drift was found
    pub fn is_consistent(&self) -> bool {
        self.dangling.is_empty() && self.missing.is_empty()
    }
}

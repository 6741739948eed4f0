//! Namespace tree: the data behind one committed state
//!
//! A `Tree` is a set of top-level buckets; each bucket holds ordered
//! key/value entries and any number of nested buckets. Buckets are shared
//! through `Arc` and copied on first write, so cloning a tree to start a
//! write transaction only copies the root map. The copy is a whole bucket:
//! the first write to a shared bucket is O(n) in its entry count.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use strata_core::{Entry, Error, NamespacePath, Result, Seek};

/// One namespace: ordered entries plus nested namespaces
#[derive(Debug, Clone, Default)]
pub(crate) struct Bucket {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    children: BTreeMap<Vec<u8>, Arc<Bucket>>,
}

impl Bucket {
    pub(crate) fn get(&self, key: &[u8]) -> Option<&Vec<u8>> {
        self.entries.get(key)
    }

    pub(crate) fn insert(&mut self, key: &[u8], value: Vec<u8>) {
        self.entries.insert(key.to_vec(), value);
    }

    pub(crate) fn remove(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.remove(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn seek(&self, seek: Seek<'_>) -> Option<Entry> {
        let found = match seek {
            Seek::First => self.entries.iter().next(),
            Seek::Last => self.entries.iter().next_back(),
            Seek::After(key) => self
                .entries
                .range::<[u8], _>((Bound::Excluded(key), Bound::Unbounded))
                .next(),
            Seek::Before(key) => self
                .entries
                .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(key)))
                .next_back(),
            Seek::AtOrAfter(key) => self
                .entries
                .range::<[u8], _>((Bound::Included(key), Bound::Unbounded))
                .next(),
        };
        found.map(|(k, v)| (k.clone(), v.clone()))
    }
}

/// All namespaces of one committed (or in-progress) state
#[derive(Debug, Clone, Default)]
pub(crate) struct Tree {
    roots: BTreeMap<Vec<u8>, Arc<Bucket>>,
}

impl Tree {
    /// Resolve a path for reading
    pub(crate) fn bucket(&self, path: &NamespacePath) -> Option<&Bucket> {
        let (first, rest) = path.segments().split_first()?;
        let mut bucket: &Bucket = self.roots.get(first)?;
        for segment in rest {
            bucket = bucket.children.get(segment)?;
        }
        Some(bucket)
    }

    /// Resolve a path for writing, copying shared buckets along the way
    pub(crate) fn bucket_mut(&mut self, path: &NamespacePath) -> Option<&mut Bucket> {
        let (first, rest) = path.segments().split_first()?;
        let mut bucket = Arc::make_mut(self.roots.get_mut(first)?);
        for segment in rest {
            bucket = Arc::make_mut(bucket.children.get_mut(segment)?);
        }
        Some(bucket)
    }

    pub(crate) fn require(&self, path: &NamespacePath) -> Result<&Bucket> {
        self.bucket(path).ok_or_else(|| Error::namespace_missing(path))
    }

    pub(crate) fn require_mut(&mut self, path: &NamespacePath) -> Result<&mut Bucket> {
        self.bucket_mut(path).ok_or_else(|| Error::namespace_missing(path))
    }

    /// Create a namespace; its parent must already exist
    ///
    /// Returns `true` if the namespace was created, `false` if it existed.
    pub(crate) fn create(&mut self, path: &NamespacePath) -> Result<bool> {
        if path.segments().iter().any(|s| s.is_empty()) {
            return Err(Error::StorageError(format!(
                "invalid namespace name: '{}'",
                path
            )));
        }
        if self.bucket(path).is_some() {
            return Ok(false);
        }

        let (name, siblings) = match path.parent() {
            None => (&path.segments()[0], &mut self.roots),
            Some(parent) => {
                let parent_bucket = self.bucket_mut(&parent).ok_or_else(|| {
                    Error::StorageError(format!(
                        "cannot create {}: parent namespace {} not found",
                        path, parent
                    ))
                })?;
                let name = &path.segments()[path.depth() - 1];
                (name, &mut parent_bucket.children)
            }
        };
        siblings.insert(name.clone(), Arc::new(Bucket::default()));
        Ok(true)
    }
}

//! Storage transaction traits
//!
//! The repository never talks to a storage engine directly. It is handed an
//! open transaction implementing these traits and performs every read and
//! write through it. Page management, logging, recovery and isolation all
//! belong to the engine behind the trait.
//!
//! Namespaces are addressed by [`NamespacePath`]; index namespaces are
//! nested one level below their record namespace. Nested namespaces are
//! not entries of their parent: `get` and `seek` only ever see key/value
//! pairs.

use std::fmt;

use crate::error::Result;

/// Path of a namespace, outermost segment first
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespacePath {
    segments: Vec<Vec<u8>>,
}

impl NamespacePath {
    /// A top-level namespace
    pub fn root(name: impl AsRef<[u8]>) -> Self {
        Self {
            segments: vec![name.as_ref().to_vec()],
        }
    }

    /// A namespace nested directly under this one
    pub fn child(&self, name: impl AsRef<[u8]>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.as_ref().to_vec());
        Self { segments }
    }

    /// The enclosing namespace, or `None` for a top-level one
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Name segments, outermost first
    pub fn segments(&self) -> &[Vec<u8>] {
        &self.segments
    }

    /// Nesting depth (1 for a top-level namespace)
    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for NamespacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(&String::from_utf8_lossy(segment))?;
        }
        Ok(())
    }
}

/// Cursor positioning request
///
/// Each variant resolves to at most one entry, in byte-lexicographic key
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seek<'a> {
    /// Smallest key
    First,
    /// Largest key
    Last,
    /// Smallest key strictly greater than the given one
    After(&'a [u8]),
    /// Largest key strictly less than the given one
    Before(&'a [u8]),
    /// Smallest key greater than or equal to the given one
    AtOrAfter(&'a [u8]),
}

/// A key/value pair returned by a seek
pub type Entry = (Vec<u8>, Vec<u8>);

/// Read access within an open transaction
pub trait ReadTransaction {
    /// True if the namespace exists
    fn namespace_exists(&self, path: &NamespacePath) -> bool;

    /// Value stored at `key`, or `None` if absent
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the namespace does not exist.
    fn get(&self, path: &NamespacePath, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Entry selected by `seek`, or `None` if there is none
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the namespace does not exist.
    fn seek(&self, path: &NamespacePath, seek: Seek<'_>) -> Result<Option<Entry>>;
}

/// Write access within an open transaction
pub trait WriteTransaction: ReadTransaction {
    /// Create the namespace unless it already exists
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the parent of a nested path does not exist
    /// or the engine refuses the name.
    fn create_namespace_if_missing(&mut self, path: &NamespacePath) -> Result<()>;

    /// Store `value` at `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the namespace does not exist or the write fails.
    fn put(&mut self, path: &NamespacePath, key: &[u8], value: Vec<u8>) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the namespace does not exist or the write fails.
    fn delete(&mut self, path: &NamespacePath, key: &[u8]) -> Result<()>;
}

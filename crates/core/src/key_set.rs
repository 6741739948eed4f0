//! Key sets stored per index value
//!
//! An index namespace maps an encoded field value to a `KeySet`: the primary
//! keys of every record holding that value. The set is rewritten as a whole
//! on every mutation; there are no partial updates.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_bytes::{ByteBuf, Bytes};

use crate::codec;
use crate::error::Result;

/// Ordered, duplicate-free set of primary keys
///
/// Enumeration is always ascending by byte value, independent of insertion
/// order. `add` and `remove` are idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeySet {
    keys: BTreeSet<ByteBuf>,
}

impl KeySet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key, returning `true` if it was not already present
    pub fn add(&mut self, key: &[u8]) -> bool {
        self.keys.insert(ByteBuf::from(key))
    }

    /// Remove a key, returning `true` if it was present
    pub fn remove(&mut self, key: &[u8]) -> bool {
        self.keys.remove(Bytes::new(key))
    }

    /// Check membership
    pub fn contains(&self, key: &[u8]) -> bool {
        self.keys.contains(Bytes::new(key))
    }

    /// All members, sorted ascending by byte value
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.keys.iter().map(|k| k.to_vec()).collect()
    }

    /// Iterate members in ascending order without copying
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.keys.iter().map(|k| k.as_slice())
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if the set has no members
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Serialize through the record codec
    pub fn encode(&self) -> Result<Vec<u8>> {
        codec::encode(self)
    }

    /// Deserialize bytes produced by [`KeySet::encode`]
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        codec::decode(bytes)
    }
}

impl<K: AsRef<[u8]>> FromIterator<K> for KeySet {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = KeySet::new();
        for key in iter {
            set.add(key.as_ref());
        }
        set
    }
}

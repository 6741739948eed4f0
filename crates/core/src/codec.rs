//! Record codec
//!
//! Every value the repository persists (records, key sets, index values)
//! goes through the same codec: MessagePack via `rmp-serde` with struct
//! fields written by name.
//!
//! ## Format notes
//!
//! - Self-describing: a type mismatch between the stored bytes and the
//!   target type fails with `CodecError` instead of producing garbage.
//! - Named fields: a field appended to a record type later decodes older
//!   rows as long as it carries `#[serde(default)]`.
//! - Deterministic for a given value, so encoded index values can be
//!   compared byte-for-byte. Types whose serialization order is not stable
//!   (e.g. `HashMap`) must not be used as index values.
//! - The whole input must be consumed; trailing bytes are an error.

use std::io::Cursor;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::key::PrimaryKey;
use crate::schema::SchemaBuilder;

/// Encode a value with the record codec
///
/// # Errors
///
/// Returns `CodecError` if the value cannot be serialized.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(value)?)
}

/// Decode a value with the record codec
///
/// # Errors
///
/// Returns `CodecError` on truncated or malformed input, on a type
/// mismatch, or when bytes remain after the value.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut cursor = Cursor::new(bytes);
    let value = rmp_serde::from_read(&mut cursor)?;
    let consumed = cursor.position() as usize;
    if consumed != bytes.len() {
        return Err(Error::CodecError(format!(
            "{} trailing bytes after encoded value",
            bytes.len() - consumed
        )));
    }
    Ok(value)
}

/// An application record stored under a primary key
///
/// Implementors declare their schema explicitly: which fields exist, which
/// of them are indexed (with an accessor for each), and optionally the
/// namespace name.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use strata_core::{Record, SchemaBuilder};
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// struct Customer {
///     id: u64,
///     company: String,
/// }
///
/// impl Record for Customer {
///     type Id = u64;
///
///     fn id(&self) -> u64 {
///         self.id
///     }
///
///     fn schema() -> SchemaBuilder<Self> {
///         SchemaBuilder::new()
///             .fields(["id", "company"])
///             .index("company", |c: &Customer| c.company.clone())
///     }
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Primary identifier type
    type Id: PrimaryKey;

    /// The record's primary identifier
    fn id(&self) -> Self::Id;

    /// Schema declaration for this record type
    fn schema() -> SchemaBuilder<Self>;

    /// The record's primary key bytes
    fn key(&self) -> Vec<u8> {
        self.id().to_key_bytes()
    }
}

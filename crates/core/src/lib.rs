//! Core types and traits for Strata secondary indexes
//!
//! This crate defines the foundational pieces the repository is built from:
//! - Error: Error type hierarchy
//! - Key: fixed-width big-endian primary key encoding
//! - Codec: record codec and the `Record` trait
//! - KeySet: ordered set of primary keys stored per index value
//! - Schema: schema declarations, descriptors and the schema registry
//! - Traits: storage transaction interface (ReadTransaction, WriteTransaction)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod key;
pub mod key_set;
pub mod schema;
pub mod traits;

pub use codec::Record;
pub use error::{Error, Result};
pub use key::{id_of, key_of, PrimaryKey};
pub use key_set::KeySet;
pub use schema::{Schema, SchemaBuilder, SchemaDescriptor};
pub use traits::{Entry, NamespacePath, ReadTransaction, Seek, WriteTransaction};

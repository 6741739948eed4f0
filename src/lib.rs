//! Strata Index - secondary indexes over an ordered transactional key-value store
//!
//! Records are stored in a primary namespace keyed by their fixed-width
//! primary key. Every declared indexed field gets a nested namespace that
//! maps the field's encoded value to the set of primary keys holding it.
//!
//! # Quick Start
//!
//! ```ignore
//! use serde::{Deserialize, Serialize};
//! use strata_index::{IndexedRepository, MemoryStore, Record, SchemaBuilder};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Customer {
//!     id: u64,
//!     company: String,
//! }
//!
//! impl Record for Customer {
//!     type Id = u64;
//!
//!     fn id(&self) -> u64 {
//!         self.id
//!     }
//!
//!     fn schema() -> SchemaBuilder<Self> {
//!         SchemaBuilder::new()
//!             .fields(["id", "company"])
//!             .index("company", |c: &Customer| c.company.clone())
//!     }
//! }
//!
//! let store = MemoryStore::new();
//! let customers = IndexedRepository::<Customer>::new()?;
//!
//! store.update(|tx| {
//!     customers.create_schema(tx)?;
//!     customers.put(tx, &Customer { id: 1, company: "ACME".into() })
//! })?;
//!
//! let acme = store.view(|tx| customers.get_by_index(tx, "company", "ACME"))?;
//! ```
//!
//! # Architecture
//!
//! - `strata-core`: errors, key and record codecs, schemas, transaction traits
//! - `strata-storage`: [`MemoryStore`], the in-memory reference engine
//! - `strata-engine`: [`IndexedRepository`], [`RecordCursor`], [`RepositoryConfig`]
//!
//! The repository works with any engine whose transactions implement
//! [`ReadTransaction`] and [`WriteTransaction`].

pub use strata_core::codec::{decode, encode};
pub use strata_core::{
    id_of, key_of, Entry, Error, KeySet, NamespacePath, PrimaryKey, ReadTransaction, Record,
    Result, Schema, SchemaBuilder, SchemaDescriptor, Seek, WriteTransaction,
};
pub use strata_engine::{
    IndexRef, IndexReport, IndexedRepository, RecordCursor, RepositoryConfig, CONFIG_FILE_NAME,
};
pub use strata_storage::{MemoryStore, ReadTxn, WriteTxn};

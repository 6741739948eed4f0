//! Storage layer for Strata secondary indexes
//!
//! This crate provides the reference storage engine the repository runs on:
//! - MemoryStore: ordered, namespaced key-value store with snapshot reads
//!   and serialised write transactions
//! - ReadTxn / WriteTxn: implementations of the `strata-core` transaction traits
//!
//! Any other engine can be used by implementing `ReadTransaction` and
//! `WriteTransaction` for its transaction type.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
mod tree;

pub use memory::{MemoryStore, ReadTxn, WriteTxn};

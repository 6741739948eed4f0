//! Indexed repository engine for Strata
//!
//! This crate orchestrates the lower layers:
//! - IndexedRepository: Put/Get/GetByIndex/Delete with secondary index maintenance
//! - RecordCursor: explicit, stateful traversal in primary key order
//! - RepositoryConfig: index maintenance policy loaded from `strata-index.toml`
//! - IndexReport: drift detection and index rebuilds
//!
//! The engine never opens transactions itself. Every operation takes the
//! caller's transaction (`ReadTransaction` or `WriteTransaction`) and
//! performs all of its reads and writes through it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod cursor;
pub mod repository;

pub use config::{RepositoryConfig, CONFIG_FILE_NAME};
pub use cursor::RecordCursor;
pub use repository::{IndexRef, IndexReport, IndexedRepository};

//! Error types for the indexed repository
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! The core never retries. Every variant is propagated to the caller, who
//! owns the transaction and decides whether to abort it.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for repository operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the indexed repository
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or underspecified record schema (fatal at setup)
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Record, key set or index value failed to encode or decode
    #[error("Codec error: {0}")]
    CodecError(String),

    /// Namespace missing or underlying engine failure
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Delete of a primary key that has no record
    #[error("Key not found in {namespace}: {key}")]
    KeyNotFound {
        /// Namespace that was searched
        namespace: String,
        /// Raw primary key bytes
        key: KeyBytes,
    },

    /// Configuration file could not be parsed or validated
    #[error("Config error: {0}")]
    ConfigError(String),

    /// I/O error (configuration files)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

impl Error {
    /// Build a `KeyNotFound` error for the given namespace and key
    pub fn key_not_found(namespace: impl fmt::Display, key: &[u8]) -> Self {
        Error::KeyNotFound {
            namespace: namespace.to_string(),
            key: KeyBytes(key.to_vec()),
        }
    }

    /// Build a `StorageError` for a namespace that does not exist
    pub fn namespace_missing(namespace: impl fmt::Display) -> Self {
        Error::StorageError(format!("namespace not found: {}", namespace))
    }

    /// True for `KeyNotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound { .. })
    }

    /// True for `CodecError`
    pub fn is_codec(&self) -> bool {
        matches!(self, Error::CodecError(_))
    }

    /// True for `StorageError`
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::StorageError(_))
    }

    /// True for `SchemaError`
    pub fn is_schema(&self) -> bool {
        matches!(self, Error::SchemaError(_))
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Error::CodecError(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for Error {
    fn from(e: rmp_serde::decode::Error) -> Self {
        Error::CodecError(e.to_string())
    }
}

/// Raw key bytes carried by errors, displayed as lowercase hex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBytes(pub Vec<u8>);

impl fmt::Display for KeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

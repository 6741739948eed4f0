//! Primary key encoding
//!
//! Record identifiers are unsigned integers stored as fixed-width big-endian
//! bytes. Under that encoding, byte-lexicographic order (the order the
//! storage engine iterates a namespace in) equals numeric order.
//!
//! ## Contract
//!
//! The key layout is part of the persisted format and is FROZEN:
//! - Width is exactly `size_of::<Id>()` bytes
//! - Most significant byte first
//! - No prefix, tag or terminator

use crate::error::{Error, Result};

/// An identifier that can serve as a record's primary key
///
/// Implementations must be injective and order-preserving:
/// `a < b` implies `a.to_key_bytes() < b.to_key_bytes()` lexicographically.
pub trait PrimaryKey: Copy + Ord + std::fmt::Debug + Send + Sync + 'static {
    /// Width of the encoded key in bytes
    const WIDTH: usize;

    /// Encode as fixed-width big-endian bytes
    fn to_key_bytes(&self) -> Vec<u8>;

    /// Decode from bytes produced by [`PrimaryKey::to_key_bytes`]
    ///
    /// # Errors
    ///
    /// Returns `CodecError` if `bytes` is not exactly [`PrimaryKey::WIDTH`] long.
    fn from_key_bytes(bytes: &[u8]) -> Result<Self>;
}

macro_rules! impl_primary_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PrimaryKey for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn to_key_bytes(&self) -> Vec<u8> {
                    self.to_be_bytes().to_vec()
                }

                fn from_key_bytes(bytes: &[u8]) -> Result<Self> {
                    let raw: [u8; std::mem::size_of::<$ty>()] = bytes.try_into().map_err(|_| {
                        Error::CodecError(format!(
                            "primary key must be {} bytes, got {}",
                            Self::WIDTH,
                            bytes.len()
                        ))
                    })?;
                    Ok(<$ty>::from_be_bytes(raw))
                }
            }
        )*
    };
}

impl_primary_key!(u8, u16, u32, u64, u128);

/// Encode a primary identifier as its storage key
///
/// # Examples
///
/// ```
/// use strata_core::key::key_of;
///
/// assert_eq!(key_of(1u64), vec![0, 0, 0, 0, 0, 0, 0, 1]);
/// assert!(key_of(255u64) < key_of(256u64));
/// ```
pub fn key_of<K: PrimaryKey>(id: K) -> Vec<u8> {
    id.to_key_bytes()
}

/// Decode a storage key back into its primary identifier
pub fn id_of<K: PrimaryKey>(key: &[u8]) -> Result<K> {
    K::from_key_bytes(key)
}

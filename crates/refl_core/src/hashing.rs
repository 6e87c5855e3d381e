//! The one string hash every identity in the database is derived from.
//!
//! Hashes end up in serialized databases, so both functions here are part of
//! the on-disk format: changing either one requires bumping
//! [`FORMAT_VERSION`](crate::consts::FORMAT_VERSION).

#[inline]
pub fn hash_name(text: &str) -> u64 { xxhash_rust::xxh3::xxh3_64(text.as_bytes()) }

/// Order-sensitive combine of two hashes. `mix_hashes(a, b) != mix_hashes(b, a)`
/// for `a != b` with overwhelming probability.
#[inline]
pub fn mix_hashes(a: u64, b: u64) -> u64 {
    let mut buf = [0u8; 16];
    buf[..8].copy_from_slice(&a.to_le_bytes());
    buf[8..].copy_from_slice(&b.to_le_bytes());
    xxhash_rust::xxh3::xxh3_64(&buf)
}

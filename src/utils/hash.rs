//! Content hashing using FxHash.
//!
//! Fast, deterministic, non-cryptographic: used to detect whether a file's
//! content actually changed (e.g. `kiln.toml` on reload).

use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Compute 64-bit hash from byte data.
#[inline]
pub fn compute<T: AsRef<[u8]> + ?Sized>(data: &T) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(data.as_ref());
    hasher.finish()
}

//! Hash functions: the pluggable `HashFunction` seam and the default djb2.

use core::hash::{BuildHasher, Hasher};

const DJB2_SEED: u64 = 5381;

/// Maps a key to a 64-bit digest.
///
/// Implementations must be deterministic: the same key bytes always produce
/// the same digest for the lifetime of a table. Stability across processes
/// is not required.
///
/// Any `Fn(&str) -> u64` is a `HashFunction`, so plain functions can be
/// passed to `ChainTable::with_hasher`.
pub trait HashFunction {
    fn digest(&self, key: &str) -> u64;
}

impl<F> HashFunction for F
where
    F: Fn(&str) -> u64,
{
    #[inline]
    fn digest(&self, key: &str) -> u64 {
        self(key)
    }
}

/// Bernstein's djb2: `h = h * 33 + byte`, seeded with 5381, wrapping on
/// overflow.
#[inline]
pub fn djb2(key: &str) -> u64 {
    fold(DJB2_SEED, key.as_bytes())
}

#[inline]
fn fold(seed: u64, bytes: &[u8]) -> u64 {
    bytes.iter().fold(seed, |h, &c| {
        (h << 5).wrapping_add(h).wrapping_add(u64::from(c))
    })
}

/// The default hash function of `ChainTable`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Djb2;

impl HashFunction for Djb2 {
    #[inline]
    fn digest(&self, key: &str) -> u64 {
        djb2(key)
    }
}

/// Adapts a std `BuildHasher` (e.g. `RandomState`) into a `HashFunction`.
///
/// The digest is `hash_one(key)`, so it follows `str`'s `Hash` impl and
/// differs from hashing the raw bytes.
#[derive(Clone, Debug, Default)]
pub struct StdHash<S>(pub S);

impl<S: BuildHasher> HashFunction for StdHash<S> {
    #[inline]
    fn digest(&self, key: &str) -> u64 {
        self.0.hash_one(key)
    }
}

/// djb2 as a streaming `Hasher`. `write` folds bytes exactly like `djb2`.
#[derive(Copy, Clone, Debug)]
pub struct Djb2Hasher {
    digest: u64,
}

impl Default for Djb2Hasher {
    fn default() -> Self {
        Self { digest: DJB2_SEED }
    }
}

impl Hasher for Djb2Hasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.digest = fold(self.digest, bytes);
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.digest
    }
}

/// `BuildHasher` for `Djb2Hasher`, usable with std and hashbrown maps.
#[derive(Copy, Clone, Debug, Default)]
pub struct BuildDjb2;

impl BuildHasher for BuildDjb2 {
    type Hasher = Djb2Hasher;

    fn build_hasher(&self) -> Self::Hasher {
        Djb2Hasher::default()
    }
}

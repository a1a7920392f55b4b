//! Debug check that a hash function never calls back into its own table.
//!
//! `HashFunction::digest` is the only user code a `ChainTable` runs while it
//! serves a keyed operation. Every digest goes through `HashGuard::digest`,
//! which records the operation that is hashing; a nested digest panics and
//! names both operations. Release builds keep only the `!Send`/`!Sync`
//! marker.

use crate::hash::HashFunction;
#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug)]
pub(crate) struct HashGuard {
    #[cfg(debug_assertions)]
    hashing: Cell<Option<&'static str>>,
    _single_thread: PhantomData<*mut ()>,
}

impl HashGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            hashing: Cell::new(None),
            _single_thread: PhantomData,
        }
    }

    /// Hash `key` with `hash` on behalf of the table operation `op`.
    #[inline]
    pub(crate) fn digest<H: HashFunction>(&self, op: &'static str, hash: &H, key: &str) -> u64 {
        #[cfg(debug_assertions)]
        let _scope = self.enter(op);
        #[cfg(not(debug_assertions))]
        let _ = op;
        hash.digest(key)
    }

    #[cfg(debug_assertions)]
    fn enter(&self, op: &'static str) -> Scope<'_> {
        if let Some(outer) = self.hashing.replace(Some(op)) {
            panic!("chain table re-entered by `{op}` while hashing a key for `{outer}`");
        }
        Scope {
            hashing: &self.hashing,
        }
    }
}

/// Clears the in-progress operation when the digest returns or unwinds.
#[cfg(debug_assertions)]
struct Scope<'a> {
    hashing: &'a Cell<Option<&'static str>>,
}

#[cfg(debug_assertions)]
impl Drop for Scope<'_> {
    fn drop(&mut self) {
        self.hashing.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::HashGuard;
    use crate::hash::djb2;

    #[test]
    fn digest_passes_through() {
        let g = HashGuard::new();
        assert_eq!(g.digest("get", &djb2, "a"), djb2("a"));
        assert_eq!(g.digest("put", &djb2, "a"), djb2("a"));
    }

    /// Invariant (debug-only): a nested digest panics naming the inner and
    /// outer operations, and the guard is usable again afterwards.
    #[cfg(debug_assertions)]
    #[test]
    fn nested_digest_names_both_operations() {
        let g = HashGuard::new();
        let calls_back = |k: &str| -> u64 { g.digest("contains_key", &djb2, k) };
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            g.digest("unput", &calls_back, "a")
        }));
        let payload = res.expect_err("nested digest must panic in debug builds");
        let msg = payload
            .downcast_ref::<String>()
            .expect("formatted panic message");
        assert!(msg.contains("`contains_key`"), "{msg}");
        assert!(msg.contains("`unput`"), "{msg}");

        assert_eq!(g.digest("get", &djb2, "b"), djb2("b"));
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn nested_digest_is_unchecked_in_release() {
        let g = HashGuard::new();
        let calls_back = |k: &str| -> u64 { g.digest("contains_key", &djb2, k) };
        assert_eq!(g.digest("unput", &calls_back, "a"), djb2("a"));
    }
}

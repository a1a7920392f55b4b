//! ChainTable: fixed bucket array, separate chaining, entries in a slot arena.

use crate::bucket::Bucket;
use crate::error::{PutError, TableError};
use crate::hash::{Djb2, HashFunction};
use crate::hash_guard::HashGuard;
use core::fmt;
use core::mem;
use log::{debug, trace, warn};
use slotmap::{DefaultKey, SlotMap};

/// Stable reference to one entry, valid until that entry is removed.
///
/// Handles are generational: a handle to a removed entry never resolves,
/// even after its arena slot is reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub fn key<'a, V, H>(&self, table: &'a ChainTable<V, H>) -> Option<&'a str> {
        table.entries.get(self.0).map(|e| &*e.key)
    }

    pub fn value<'a, V, H>(&self, table: &'a ChainTable<V, H>) -> Option<&'a V> {
        table.entries.get(self.0).map(|e| &e.value)
    }

    pub fn value_mut<'a, V, H>(&self, table: &'a mut ChainTable<V, H>) -> Option<&'a mut V> {
        table.entries.get_mut(self.0).map(|e| &mut e.value)
    }
}

#[derive(Debug)]
struct Entry<V> {
    key: Box<str>,
    value: V,
    digest: u64,
}

/// Whether a bucket slot has been allocated yet.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BucketState {
    /// No key has ever hashed to this slot.
    Unallocated,
    /// The bucket exists; `len` may be zero after removals.
    Allocated { len: usize },
}

/// String-keyed hash table with a fixed number of buckets.
///
/// Keys are copied on first insert and owned by the table. Values are moved
/// in and handed back by `put` (on replace), `unput`, `drain` and
/// `destroy_with`; whatever is still stored when the table is dropped is
/// dropped with it.
pub struct ChainTable<V, H = Djb2> {
    hash: H,
    buckets: Vec<Option<Bucket<DefaultKey>>>,
    entries: SlotMap<DefaultKey, Entry<V>>,
    guard: HashGuard,
}

impl<V> ChainTable<V> {
    /// Create a table with `bucket_count` buckets, hashing with djb2.
    pub fn new(bucket_count: usize) -> Result<Self, TableError> {
        Self::with_hasher(bucket_count, Djb2)
    }
}

impl<V, H> ChainTable<V, H> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Stored entries per bucket. Observed only; the table never resizes.
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.bucket_count() as f64
    }

    pub fn hash_function(&self) -> &H {
        &self.hash
    }

    /// `None` when `index` is out of range.
    pub fn bucket_state(&self, index: usize) -> Option<BucketState> {
        let slot = self.buckets.get(index)?;
        Some(match slot {
            None => BucketState::Unallocated,
            Some(bucket) => BucketState::Allocated { len: bucket.len() },
        })
    }

    /// Iterate over all entries. Order is unspecified.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            it: self.entries.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut {
            it: self.entries.iter_mut(),
        }
    }

    /// Remove every entry, yielding owned keys and values. Allocated buckets
    /// stay allocated.
    pub fn drain(&mut self) -> Drain<V> {
        let mut out = Vec::with_capacity(self.entries.len());
        for bucket in self.buckets.iter_mut().flatten() {
            for k in bucket.drain() {
                if let Some(entry) = self.entries.remove(k) {
                    out.push((entry.key, entry.value));
                }
            }
        }
        debug_assert!(self.entries.is_empty());
        Drain {
            it: out.into_iter(),
        }
    }

    /// Destroy the table, dropping every stored value.
    pub fn destroy(self) {
        self.destroy_with(drop)
    }

    /// Destroy the table, handing every stored value to `destructor` exactly
    /// once, bucket by bucket in chain order.
    pub fn destroy_with<F>(self, mut destructor: F)
    where
        F: FnMut(V),
    {
        let Self {
            buckets,
            mut entries,
            ..
        } = self;
        let mut released = 0usize;
        for bucket in buckets.into_iter().flatten() {
            bucket.destroy(|k| {
                if let Some(entry) = entries.remove(k) {
                    destructor(entry.value);
                    released += 1;
                }
            });
        }
        debug_assert!(entries.is_empty());
        debug!("destroyed chain table, released {} entries", released);
    }
}

impl<V, H: HashFunction> ChainTable<V, H> {
    /// Create a table with `bucket_count` buckets and a custom hash function.
    pub fn with_hasher(bucket_count: usize, hash: H) -> Result<Self, TableError> {
        if bucket_count == 0 {
            return Err(TableError::ZeroBuckets);
        }
        let mut buckets = Vec::new();
        if buckets.try_reserve_exact(bucket_count).is_err() {
            warn!("could not allocate {} bucket slots", bucket_count);
            return Err(TableError::AllocFailed);
        }
        buckets.resize_with(bucket_count, || None);
        debug!("created chain table with {} buckets", bucket_count);
        Ok(Self {
            hash,
            buckets,
            entries: SlotMap::with_key(),
            guard: HashGuard::new(),
        })
    }

    #[inline]
    fn slot_of(&self, digest: u64) -> usize {
        (digest % self.buckets.len() as u64) as usize
    }

    /// The bucket index `key` hashes to.
    pub fn bucket_index(&self, key: &str) -> usize {
        self.slot_of(self.guard.digest("bucket_index", &self.hash, key))
    }

    fn locate(&self, op: &'static str, key: &str) -> Option<DefaultKey> {
        if key.is_empty() {
            return None;
        }
        let digest = self.guard.digest(op, &self.hash, key);
        let bucket = self.buckets[self.slot_of(digest)].as_ref()?;
        bucket.find(|k| self.entries.get(k).is_some_and(|e| &*e.key == key))
    }

    pub fn find(&self, key: &str) -> Option<Handle> {
        self.locate("find", key).map(Handle)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.locate("contains_key", key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let k = self.locate("get", key)?;
        self.entries.get(k).map(|e| &e.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let k = self.locate("get_mut", key)?;
        self.entries.get_mut(k).map(|e| &mut e.value)
    }

    pub fn get_key_value(&self, key: &str) -> Option<(&str, &V)> {
        let k = self.locate("get_key_value", key)?;
        self.entries.get(k).map(|e| (&*e.key, &e.value))
    }

    /// Insert or replace. Returns the previous value for `key`, if any; the
    /// table never drops a replaced value itself.
    pub fn put(&mut self, key: &str, value: V) -> Result<Option<V>, TableError> {
        self.try_put(key, value).map_err(|e| e.error)
    }

    /// Like `put`, but a rejected value is returned inside the error.
    pub fn try_put(&mut self, key: &str, value: V) -> Result<Option<V>, PutError<V>> {
        self.put_reserving(key, value, 1)
    }

    /// Insert path shared by `put` and `try_put`. A new key first reserves
    /// `additional` chain slots; nothing is mutated if that fails, and a
    /// bucket that did not exist before the call is not left behind.
    fn put_reserving(
        &mut self,
        key: &str,
        value: V,
        additional: usize,
    ) -> Result<Option<V>, PutError<V>> {
        if key.is_empty() {
            return Err(PutError::new(TableError::EmptyKey, value));
        }
        let digest = self.guard.digest("put", &self.hash, key);
        let slot = self.slot_of(digest);

        let entries = &mut self.entries;
        let existing = &mut self.buckets[slot];
        if let Some(bucket) = existing.as_ref() {
            let found = bucket.find(|k| entries.get(k).is_some_and(|e| &*e.key == key));
            if let Some(entry) = found.and_then(|k| entries.get_mut(k)) {
                return Ok(Some(mem::replace(&mut entry.value, value)));
            }
        }

        // Grow the chain (or build the first one) before touching the arena.
        let reserved = match existing {
            Some(bucket) => bucket.try_reserve(additional),
            None => {
                let mut fresh = Bucket::new();
                let res = fresh.try_reserve(additional);
                if res.is_ok() {
                    trace!("allocating bucket {}", slot);
                    *existing = Some(fresh);
                }
                res
            }
        };
        if let Err(error) = reserved {
            warn!("allocation failed while growing bucket {}", slot);
            return Err(PutError::new(error, value));
        }

        let k = entries.insert(Entry {
            key: Box::from(key),
            value,
            digest,
        });
        existing.get_or_insert_with(Bucket::new).append(k);
        Ok(None)
    }

    /// Remove `key`, returning its value. The bucket stays allocated.
    pub fn unput(&mut self, key: &str) -> Option<V> {
        self.unput_entry(key).map(|(_, v)| v)
    }

    /// Remove `key`, returning the table's copy of the key and the value.
    pub fn unput_entry(&mut self, key: &str) -> Option<(Box<str>, V)> {
        if key.is_empty() {
            return None;
        }
        let digest = self.guard.digest("unput", &self.hash, key);
        let slot = self.slot_of(digest);

        let entries = &mut self.entries;
        let bucket = self.buckets[slot].as_mut()?;
        let k = bucket.find(|k| entries.get(k).is_some_and(|e| &*e.key == key))?;
        let unlinked = bucket.remove_element(k);
        debug_assert!(unlinked);
        let entry = entries.remove(k)?;
        debug_assert_eq!(entry.digest, digest);
        trace!("removed entry from bucket {}", slot);
        Some((entry.key, entry.value))
    }

    /// Check every structural invariant; panics on violation.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        use std::collections::HashSet;

        let mut linked = 0;
        for (slot, bucket) in self.buckets.iter().enumerate() {
            let Some(bucket) = bucket else { continue };
            let mut keys = HashSet::new();
            for k in bucket.iter() {
                let e = self.entries.get(k).expect("bucket links a live entry");
                assert!(!e.key.is_empty(), "stored key is empty");
                assert_eq!(e.digest, self.hash.digest(&e.key), "stale digest");
                assert_eq!(self.slot_of(e.digest), slot, "entry in wrong bucket");
                assert!(keys.insert(e.key.clone()), "duplicate key in bucket");
                linked += 1;
            }
        }
        assert_eq!(linked, self.entries.len(), "unlinked arena entries");
    }
}

impl<V: fmt::Debug, H> fmt::Debug for ChainTable<V, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over `(key, &value)` pairs of a `ChainTable`.
pub struct Iter<'a, V> {
    it: slotmap::basic::Iter<'a, DefaultKey, Entry<V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (&*e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Iterator over `(key, &mut value)` pairs of a `ChainTable`.
pub struct IterMut<'a, V> {
    it: slotmap::basic::IterMut<'a, DefaultKey, Entry<V>>,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = (&'a str, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (&*e.key, &mut e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, V, H> IntoIterator for &'a ChainTable<V, H> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning iterator returned by `ChainTable::drain`.
pub struct Drain<V> {
    it: std::vec::IntoIter<(Box<str>, V)>,
}

impl<V> Iterator for Drain<V> {
    type Item = (Box<str>, V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

//! chain-table: a string-keyed hash table with a fixed number of buckets,
//! separate chaining and a pluggable hash function.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small, predictable associative container whose only tuning
//!   knob is the bucket count chosen at creation.
//! - Layers:
//!   - HashFunction: `&str -> u64`, djb2 by default. Any `Fn(&str) -> u64`
//!     plugs in; `StdHash` adapts a std `BuildHasher`.
//!   - Bucket: an ordered chain of entry handles; collisions are resolved
//!     by scanning it from the front.
//!   - ChainTable: `digest(key) % bucket_count` selects a bucket slot;
//!     entries live in a generational slot arena and buckets link them.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync`; no locking.
//! - Fixed bucket count; the table never rehashes. Long chains under heavy
//!   collision are a known cost, not something the table mitigates.
//! - Bucket slots are allocated lazily on first insert and kept allocated
//!   (possibly empty) until the table is destroyed.
//! - Keys are non-empty and copied into the table on first insert; a
//!   replace never re-copies the key.
//! - Iteration order is unspecified.
//!
//! Ownership
//! - The table owns the slot array, buckets, entries and key copies.
//! - Values are moved in. `put` on an existing key hands the old value
//!   back, `unput` hands the removed value back, and `destroy_with` passes
//!   every remaining value to a caller-supplied destructor exactly once.
//!   Store `&T`, `Rc<T>` or a pointer type for non-owning values.
//!
//! Errors
//! - Creation and insertion return `Result<_, TableError>`; a rejected
//!   insert leaves the table unchanged. Absent keys are `None`, never an
//!   error.
//!
//! Reentrancy policy
//! - The only user code run mid-operation is `HashFunction::digest`. A
//!   debug-only guard panics if it re-enters the same table.

mod bucket;
pub mod chain_table;
mod chain_table_proptest;
mod error;
pub mod hash;
mod hash_guard;

// Public surface
pub use chain_table::{BucketState, ChainTable, Handle};
pub use error::{PutError, TableError};
pub use hash::{djb2, BuildDjb2, Djb2, Djb2Hasher, HashFunction, StdHash};

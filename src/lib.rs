//! probemap: a generic, resizable hash map built on open addressing with
//! linear probing and tombstone (lazy) deletion.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a drop-in associative container whose collision-resolution and
//!   slot-lifecycle machinery is small enough to reason about slot by slot.
//! - Layers:
//!   - RawTable<K, V>: hash-agnostic storage. Owns a single array of tagged
//!     slots (free / tombstone / live) plus the occupancy counters, and
//!     implements the probe, placement, growth, and removal primitives.
//!     Callers pass precomputed `u64` hashes and equality closures.
//!   - ProbeMap<K, V, S>: public API. Owns the `BuildHasher` and routes
//!     every operation through the raw primitives; exposes iterators and
//!     the standard construction/conversion traits.
//!
//! Slot lifecycle
//! - A slot moves free -> live on placement, live -> tombstone on removal,
//!   and tombstone -> live again only if the *same* key is reinserted
//!   (resurrection). Tombstones keep probe chains intact so keys placed
//!   past them stay reachable.
//! - Growth doubles capacity whenever occupied slots (live + tombstoned)
//!   would exceed 50%, re-places live entries only, and discards all
//!   tombstones; this bounds expected probe length at O(1).
//!
//! Constraints
//! - Single-threaded, in-memory, synchronous; no suspension points and no
//!   background work.
//! - No runtime dependencies; hashing goes through the standard
//!   `BuildHasher` trait with `RandomState` as the default.
//! - Exactly one fallible operation (`try_get` on an absent key); every
//!   other "failure" is a defined no-op.
//!
//! Why this split?
//! - Localize invariants: the raw layer owns the counter discipline and
//!   probe correctness; the map layer owns hashing and borrowing rules.
//! - The raw layer never calls user code except `K: Eq` during probing,
//!   and only while the structure is fully consistent.
//! - Iterator soundness is structural: iterators borrow the map, so
//!   mutation during traversal is a compile error rather than a documented
//!   hazard.
//!
//! Notes and non-goals
//! - Not thread-safe; no persistence or serialization; no custom
//!   allocators; no ordering guarantees (iteration is slot order and
//!   unstable across growths).
//! - Capacity only ever grows, and only doubles. `clear` is the one way to
//!   release storage.

mod probe_map;
mod probe_map_proptest;
mod raw_table;

// Public surface
pub use probe_map::{IntoIter, Iter, IterMut, LookupError, ProbeMap};

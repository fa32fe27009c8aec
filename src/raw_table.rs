//! RawTable: hash-agnostic slot storage with linear probing and tombstones.
//!
//! This layer owns the backing array and the occupancy counters but never
//! hashes anything itself: callers pass precomputed `u64` hashes and
//! equality closures, so the `BuildHasher` lives one layer up.

use core::mem;

/// A single cell of the backing array.
///
/// `Tombstone` retains its key so a later insert of the same key can
/// resurrect the slot in place instead of consuming a fresh one, and so
/// probes for that key can stop at it.
#[derive(Clone)]
pub(crate) enum Slot<K, V> {
    /// Never used; a probe sequence may stop here.
    Free,
    /// Logically deleted; occupied for probing, invisible to lookups.
    Tombstone(K),
    /// A live entry.
    Live(K, V),
}

/// Outcome of a single placement.
pub(crate) enum Placed<V> {
    /// A new logical entry was created (fresh slot or resurrected tombstone).
    New,
    /// An existing live key's value was overwritten; the old value is here.
    Replaced(V),
}

/// Open-addressing table with capacity zero or a power of two.
///
/// `filled` counts slots reported as new logical entries since the last
/// growth and drives the growth trigger; `live` counts live entries.
/// `live <= filled` always, and `filled * 2 <= capacity` whenever the table
/// is non-empty.
#[derive(Clone)]
pub(crate) struct RawTable<K, V> {
    slots: Vec<Slot<K, V>>,
    filled: usize,
    live: usize,
}

impl<K, V> RawTable<K, V> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            filled: 0,
            live: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[cfg(test)]
    pub(crate) fn filled(&self) -> usize {
        self.filled
    }

    pub(crate) fn slots(&self) -> &[Slot<K, V>] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Slot<K, V>] {
        &mut self.slots
    }

    pub(crate) fn into_slots(self) -> Vec<Slot<K, V>> {
        self.slots
    }

    /// Growth trigger: occupied slots must stay at or below half capacity.
    fn needs_grow(&self) -> bool {
        (self.filled + 1) * 2 > self.slots.len()
    }

    /// Debug-build structural check after every mutation.
    #[inline]
    fn check(&self) {
        debug_assert!(self.live <= self.filled);
        debug_assert!(self.filled <= self.slots.len());
        debug_assert!(self.slots.is_empty() || self.filled * 2 <= self.slots.len());
    }

    /// Probe for the live slot whose key satisfies `eq`.
    ///
    /// Walks forward from `hash mod capacity`, wrapping at the end. A `Free`
    /// slot ends the search; a tombstoned match is terminal too, since a
    /// key's slot (live or tombstoned) is unique within its probe chain.
    pub(crate) fn find(&self, hash: u64, mut eq: impl FnMut(&K) -> bool) -> Option<usize> {
        if self.live == 0 {
            return None;
        }
        let mask = self.slots.len() - 1;
        let mut index = (hash as usize) & mask;
        loop {
            match &self.slots[index] {
                Slot::Free => return None,
                Slot::Tombstone(key) => {
                    if eq(key) {
                        return None;
                    }
                }
                Slot::Live(key, _) => {
                    if eq(key) {
                        return Some(index);
                    }
                }
            }
            index = (index + 1) & mask;
        }
    }

    /// Place `(key, value)` into an arbitrary slot buffer, used both for
    /// live inserts and for migration during growth.
    ///
    /// A matching tombstone is resurrected and counts as a new logical
    /// entry; a matching live slot has its value replaced with no counter
    /// change; otherwise the first free slot takes the pair.
    fn place(slots: &mut [Slot<K, V>], hash: u64, key: K, value: V) -> (usize, Placed<V>)
    where
        K: Eq,
    {
        let mask = slots.len() - 1;
        let mut index = (hash as usize) & mask;
        loop {
            match &slots[index] {
                Slot::Free => break,
                Slot::Tombstone(existing) | Slot::Live(existing, _) if *existing == key => break,
                _ => index = (index + 1) & mask,
            }
        }
        let placed = match mem::replace(&mut slots[index], Slot::Free) {
            Slot::Free | Slot::Tombstone(_) => {
                slots[index] = Slot::Live(key, value);
                Placed::New
            }
            Slot::Live(existing, old) => {
                slots[index] = Slot::Live(existing, value);
                Placed::Replaced(old)
            }
        };
        (index, placed)
    }

    /// Double capacity (minimum 2) and re-place every live entry, hashing
    /// with `hasher`. Tombstones are not migrated, so occupancy collapses
    /// back to the live count; this is the only point where `filled` drops.
    pub(crate) fn grow(&mut self, mut hasher: impl FnMut(&K) -> u64)
    where
        K: Eq,
    {
        let new_capacity = if self.slots.is_empty() {
            2
        } else {
            self.slots.len() * 2
        };
        let mut buffer: Vec<Slot<K, V>> = Vec::with_capacity(new_capacity);
        buffer.resize_with(new_capacity, || Slot::Free);
        for slot in self.slots.drain(..) {
            if let Slot::Live(key, value) = slot {
                let hash = hasher(&key);
                let (_, placed) = Self::place(&mut buffer, hash, key, value);
                debug_assert!(matches!(placed, Placed::New));
            }
        }
        self.slots = buffer;
        self.filled = self.live;
        self.check();
    }

    /// Insert, growing first if the occupancy bound would be exceeded.
    ///
    /// Returns the slot index and, for an already-live key, the replaced
    /// value. `hasher` is only invoked when growth migrates entries.
    pub(crate) fn insert(
        &mut self,
        hash: u64,
        key: K,
        value: V,
        hasher: impl FnMut(&K) -> u64,
    ) -> (usize, Option<V>)
    where
        K: Eq,
    {
        if self.needs_grow() {
            self.grow(hasher);
        }
        let (index, placed) = Self::place(&mut self.slots, hash, key, value);
        let replaced = match placed {
            Placed::New => {
                self.filled += 1;
                self.live += 1;
                None
            }
            Placed::Replaced(old) => Some(old),
        };
        self.check();
        (index, replaced)
    }

    /// Downgrade the matching live slot to a tombstone.
    ///
    /// The slot stays occupied so other keys probing through it remain
    /// reachable; only the live count drops. Absent keys are a no-op.
    pub(crate) fn remove(&mut self, hash: u64, eq: impl FnMut(&K) -> bool) -> Option<V> {
        let index = self.find(hash, eq)?;
        let Slot::Live(key, value) = mem::replace(&mut self.slots[index], Slot::Free) else {
            unreachable!("find returned a non-live slot");
        };
        self.slots[index] = Slot::Tombstone(key);
        self.live -= 1;
        self.check();
        Some(value)
    }

    /// Reset to the empty state, releasing the backing storage.
    pub(crate) fn clear(&mut self) {
        self.slots = Vec::new();
        self.filled = 0;
        self.live = 0;
    }

    /// Entry access for an index known to hold a live slot.
    pub(crate) fn entry(&self, index: usize) -> (&K, &V) {
        match &self.slots[index] {
            Slot::Live(key, value) => (key, value),
            _ => unreachable!("index does not refer to a live slot"),
        }
    }

    pub(crate) fn entry_mut(&mut self, index: usize) -> (&K, &mut V) {
        match &mut self.slots[index] {
            Slot::Live(key, value) => (&*key, value),
            _ => unreachable!("index does not refer to a live slot"),
        }
    }
}

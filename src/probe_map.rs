//! ProbeMap: the public map API over `RawTable`.

use crate::raw_table::{RawTable, Slot};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use std::collections::hash_map::RandomState;

/// A hash map built on open addressing with linear probing and tombstone
/// deletion.
///
/// Insertion order is not preserved and iteration order is unstable across
/// growths. Lookups accept any borrowed form of the key (store `String`,
/// query with `&str`). The hasher is stored for the map's lifetime and
/// exposed via [`hasher`](ProbeMap::hasher).
#[derive(Clone)]
pub struct ProbeMap<K, V, S = RandomState> {
    hasher: S,
    table: RawTable<K, V>,
}

/// Error returned by fallible lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    KeyNotFound,
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::KeyNotFound => f.write_str("key not found"),
        }
    }
}

impl std::error::Error for LookupError {}

impl<K, V> ProbeMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V> Default for ProbeMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ProbeMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            table: RawTable::new(),
        }
    }

    /// The `BuildHasher` this map was constructed with.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Total slot count, zero or a power of two. Live entries never exceed
    /// half of it.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Resets to the empty state and releases the backing storage.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.table.slots().iter(),
            remaining: self.table.len(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let remaining = self.table.len();
        IterMut {
            slots: self.table.slots_mut().iter_mut(),
            remaining,
        }
    }

    #[cfg(test)]
    pub(crate) fn filled(&self) -> usize {
        self.table.filled()
    }
}

impl<K, V, S> ProbeMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Inserts `key -> value`, growing first if occupied slots would exceed
    /// half of capacity. Last write wins: for an already-live key the value
    /// is overwritten and the previous one returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        self.table
            .insert(hash, key, value, |k| self.hasher.hash_one(k))
            .1
    }

    /// Removes `key`, leaving a tombstone so other keys in the same probe
    /// chain stay reachable. Returns the removed value; removing an absent
    /// key is a no-op.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(key);
        self.table.remove(hash, |k| k.borrow() == key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(key);
        let index = self.table.find(hash, |k| k.borrow() == key)?;
        Some(self.table.entry(index).1)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(key);
        let index = self.table.find(hash, |k| k.borrow() == key)?;
        Some(self.table.entry_mut(index).1)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).is_some()
    }

    /// Fallible lookup: the map's one explicit failure mode. Never mutates.
    pub fn try_get<Q>(&self, key: &Q) -> Result<&V, LookupError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).ok_or(LookupError::KeyNotFound)
    }

    /// Read-or-insert: returns a mutable reference to the live value for
    /// `key`, inserting `default()` first if absent. The closure runs only
    /// on absence.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let hash = self.make_hash(&key);
        let index = match self.table.find(hash, |k| *k == key) {
            Some(index) => index,
            None => {
                self.table
                    .insert(hash, key, default(), |k| self.hasher.hash_one(k))
                    .0
            }
        };
        self.table.entry_mut(index).1
    }

    /// [`get_or_insert_with`](ProbeMap::get_or_insert_with) specialized to
    /// `V::default()`; the index-operator semantics of standard associative
    /// containers.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }
}

impl<K, V, S> fmt::Debug for ProbeMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for ProbeMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ProbeMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ProbeMap<K, V>
where
    K: Eq + Hash,
{
    /// Later duplicates win, consistent with the single insert path.
    fn from(pairs: [(K, V); N]) -> Self {
        Self::from_iter(pairs)
    }
}

/// Iterator over `(&K, &V)` in slot order, skipping free and tombstoned
/// slots. The key is read-only through the view.
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Slot::Live(key, value) = self.slots.next()? {
                self.remaining -= 1;
                return Some((key, value));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)`: values are mutable, keys are not.
pub struct IterMut<'a, K, V> {
    slots: core::slice::IterMut<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Slot::Live(key, value) = self.slots.next()? {
                self.remaining -= 1;
                return Some((&*key, value));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator over `(K, V)`.
pub struct IntoIter<K, V> {
    slots: std::vec::IntoIter<Slot<K, V>>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Slot::Live(key, value) = self.slots.next()? {
                self.remaining -= 1;
                return Some((key, value));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K, V, S> IntoIterator for ProbeMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        let remaining = self.table.len();
        IntoIter {
            slots: self.table.into_slots().into_iter(),
            remaining,
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a ProbeMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ProbeMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::Hasher;
    use std::cell::Cell;
    use std::collections::BTreeSet;

    /// Invariant: unique-key inserts are all retrievable and counted.
    #[test]
    fn insert_and_get() {
        let mut m: ProbeMap<String, i32> = ProbeMap::new();
        for (i, k) in ["a", "b", "c"].iter().enumerate() {
            assert!(m.insert((*k).to_string(), i as i32).is_none());
        }
        assert_eq!(m.len(), 3);
        assert_eq!(m.get("b"), Some(&1));
        assert_eq!(m.get("missing"), None);
    }

    /// Invariant: inserting an existing key overwrites the value, returns
    /// the old one, and leaves `len` unchanged.
    #[test]
    fn duplicate_insert_overwrites() {
        let mut m: ProbeMap<String, i32> = ProbeMap::new();
        assert!(m.insert("k".to_string(), 1).is_none());
        assert_eq!(m.insert("k".to_string(), 2), Some(1));
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("k"), Some(&2));
    }

    /// Invariant: borrowed lookup works (store `String`, query with `&str`)
    /// across every accessor.
    #[test]
    fn borrowed_lookup_with_str() {
        let mut m: ProbeMap<String, i32> = ProbeMap::new();
        m.insert("hello".to_string(), 1);
        assert!(m.contains_key("hello"));
        assert!(!m.contains_key("world"));
        assert_eq!(m.get_mut("hello").map(|v| *v), Some(1));
        assert_eq!(m.try_get("hello"), Ok(&1));
        assert_eq!(m.remove("hello"), Some(1));
        assert!(m.is_empty());
    }

    /// Invariant: `try_get` fails with `KeyNotFound` for an absent key and
    /// never mutates the map.
    #[test]
    fn try_get_absent_is_an_error() {
        let mut m: ProbeMap<String, i32> = ProbeMap::new();
        m.insert("k".to_string(), 1);
        let (len, cap) = (m.len(), m.capacity());
        assert_eq!(m.try_get("other"), Err(LookupError::KeyNotFound));
        assert_eq!((m.len(), m.capacity()), (len, cap));
        assert_eq!(m.try_get("other").unwrap_err().to_string(), "key not found");
    }

    /// Invariant: `get_or_insert_with` runs the default closure exactly
    /// once on absence and never on a present key.
    #[test]
    fn get_or_insert_with_is_lazy() {
        let mut m: ProbeMap<String, i32> = ProbeMap::new();
        let calls = Cell::new(0);

        let v = m.get_or_insert_with("k".to_string(), || {
            calls.set(calls.get() + 1);
            7
        });
        assert_eq!(*v, 7);
        assert_eq!(calls.get(), 1);
        assert_eq!(m.len(), 1);

        let v = m.get_or_insert_with("k".to_string(), || {
            calls.set(calls.get() + 1);
            9
        });
        assert_eq!(*v, 7, "present key keeps its value");
        assert_eq!(calls.get(), 1, "default must not run on a present key");
        assert_eq!(m.len(), 1);
    }

    /// Invariant: mutation through the `get_or_insert_default` reference is
    /// visible to subsequent lookups.
    #[test]
    fn get_or_insert_default_mutates_in_place() {
        let mut m: ProbeMap<String, i32> = ProbeMap::new();
        *m.get_or_insert_default("n".to_string()) += 5;
        *m.get_or_insert_default("n".to_string()) += 5;
        assert_eq!(m.get("n"), Some(&10));
        assert_eq!(m.len(), 1);
    }

    /// Invariant: iteration yields each live entry exactly once and skips
    /// removed ones; `iter_mut` updates are observed by later lookups.
    #[test]
    fn iteration_and_mutation() {
        let mut m: ProbeMap<String, i32> = ProbeMap::new();
        for (i, k) in ["k1", "k2", "k3", "k4"].iter().enumerate() {
            m.insert((*k).to_string(), i as i32);
        }
        m.remove("k2");

        let it = m.iter();
        assert_eq!(it.len(), 3);
        let seen: BTreeSet<String> = it.map(|(k, _)| k.clone()).collect();
        let expected: BTreeSet<String> =
            ["k1", "k3", "k4"].iter().map(|s| (*s).to_string()).collect();
        assert_eq!(seen, expected);

        for (_, v) in m.iter_mut() {
            *v += 10;
        }
        assert_eq!(m.get("k3"), Some(&12));
    }

    /// Invariant: lookups and removals work under total hash collision;
    /// equality alone resolves the probe chain.
    #[test]
    fn collision_handling_with_const_hasher() {
        #[derive(Clone, Default)]
        struct ConstBuildHasher;
        struct ConstHasher;
        impl BuildHasher for ConstBuildHasher {
            type Hasher = ConstHasher;
            fn build_hasher(&self) -> Self::Hasher {
                ConstHasher
            }
        }
        impl Hasher for ConstHasher {
            fn write(&mut self, _bytes: &[u8]) {}
            fn finish(&self) -> u64 {
                0
            }
        }

        let mut m: ProbeMap<String, i32, ConstBuildHasher> =
            ProbeMap::with_hasher(ConstBuildHasher);
        for (i, k) in ["a", "b", "c", "d"].iter().enumerate() {
            m.insert((*k).to_string(), i as i32);
        }
        // Remove the head of the chain; the rest must stay reachable.
        assert_eq!(m.remove("a"), Some(0));
        assert_eq!(m.get("b"), Some(&1));
        assert_eq!(m.get("c"), Some(&2));
        assert_eq!(m.get("d"), Some(&3));
        assert_eq!(m.get("a"), None);
    }

    /// Invariant: `clear` returns to the freshly-constructed state.
    #[test]
    fn clear_then_reuse() {
        let mut m: ProbeMap<String, i32> = ProbeMap::new();
        for i in 0..32 {
            m.insert(format!("k{i}"), i);
        }
        m.clear();
        assert_eq!(m.len(), 0);
        assert!(m.is_empty());
        assert_eq!(m.capacity(), 0);
        assert_eq!(m.get("k3"), None);

        m.insert("again".to_string(), 1);
        assert_eq!(m.get("again"), Some(&1));
    }

    /// Invariant: construction from pairs routes through the insert path,
    /// so later duplicates win.
    #[test]
    fn from_pairs_last_write_wins() {
        let m = ProbeMap::from([(1, 1), (1, 2)]);
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(&1), Some(&2));

        let m: ProbeMap<&str, i32> = [("x", 1), ("y", 2), ("x", 3)].into_iter().collect();
        assert_eq!(m.len(), 2);
        assert_eq!(m.get("x"), Some(&3));
    }

    /// Invariant: the owning iterator hands back each live pair once.
    #[test]
    fn into_iter_yields_owned_pairs() {
        let mut m: ProbeMap<String, i32> = ProbeMap::new();
        m.insert("a".to_string(), 1);
        m.insert("b".to_string(), 2);
        m.remove("a");

        let pairs: Vec<(String, i32)> = m.into_iter().collect();
        assert_eq!(pairs, vec![("b".to_string(), 2)]);
    }

    /// Invariant: Debug output lists live entries only.
    #[test]
    fn debug_shows_live_entries() {
        let mut m: ProbeMap<&str, i32> = ProbeMap::new();
        m.insert("a", 1);
        m.insert("b", 2);
        m.remove("a");
        assert_eq!(format!("{m:?}"), r#"{"b": 2}"#);
    }
}

//! Concurrent linear-hash maps.
//!
//! This crate implements a concurrent associative array based on *linear hashing*: instead of
//! doubling the whole table in one rehash step, it grows one bucket at a time, round-robin,
//! driven by a moving split pointer. Each bucket carries its own reader/writer lock, and the
//! table as a whole carries one more, so that lookups on different buckets never contend and
//! growth only ever blocks the (rare) operations that are genuinely racing with it.
//!
//! The API derives from `std::collections::HashMap` where it makes sense, but `get`/`get_mut`
//! return RAII guards rather than references tied to `&self`, since the underlying locks need
//! somewhere to live.

extern crate owning_ref;
extern crate parking_lot;

mod addr;
mod bucket;
mod error;
mod guard;
mod iter;
mod table;
#[cfg(test)]
mod tests;

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::fmt::Write as _;
use std::hash::{Hash, Hasher};
use std::mem;
use std::sync::atomic::{self, AtomicUsize};

use parking_lot::RwLock;

pub use crate::error::Error;
pub use crate::guard::{ReadGuard, WriteGuard};
pub use crate::iter::Iter;

use crate::bucket::Bucket;
use crate::table::TableState;

/// The atomic ordering used for `num_elem`, matching the rest of the crate's locking: no
/// relaxed-ordering cleverness, just a single consistent choice.
const ORDERING: atomic::Ordering = atomic::Ordering::SeqCst;

/// The default initial bucket count, per the external-interface defaults.
const DEFAULT_INIT_SIZE: usize = 2;
/// The default maximum load factor, per the external-interface defaults.
const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.75;

/// Hash a key with the crate-wide hasher.
///
/// The host is only required to supply *a* well-distributed hash; cryptographic strength is out
/// of scope. `SipHash` via `DefaultHasher` is a convenient, dependency-free choice.
fn hash<K: Hash + ?Sized>(key: &K) -> u64 {
    let mut h = DefaultHasher::new();
    key.hash(&mut h);
    h.finish()
}

/// A concurrent linear-hash map.
///
/// Growth happens one bucket at a time: whenever an insert of a genuinely new key pushes the
/// load factor (`len() / capacity()`) past `max_load_factor`, exactly one bucket is split. This
/// bounds the tail latency of any single insert, at the cost of the table being only
/// *approximately* under the load factor at any given instant under sustained write pressure.
pub struct LinearHashMap<K, V> {
    /// Addressing state and bucket storage, behind the map's single reader/writer lock.
    state: RwLock<TableState<K, V>>,
    /// Total live entry count. Updated atomically; never requires the table lock to read.
    num_elem: AtomicUsize,
    /// Immutable: the table's bucket count before any splits have happened.
    init_size: usize,
    /// Immutable: the load factor past which an insert of a new key triggers a split.
    max_load_factor: f64,
}

impl<K, V> LinearHashMap<K, V> {
    /// Create a map with an explicit initial bucket count and load factor.
    ///
    /// `init_size` must be a nonzero power of two; `max_load_factor` must be positive. Either
    /// violation is reported as an [`Error`] rather than a panic, since this is the one place in
    /// the crate where caller-supplied arguments can be outright invalid.
    pub fn with_options(init_size: usize, max_load_factor: f64) -> Result<LinearHashMap<K, V>, Error> {
        if init_size == 0 || !init_size.is_power_of_two() {
            return Err(Error::InvalidInitSize(init_size));
        }
        if !(max_load_factor > 0.0) {
            return Err(Error::InvalidLoadFactor(max_load_factor));
        }

        log::debug!(
            "new LinearHashMap: init_size={}, max_load_factor={}",
            init_size,
            max_load_factor
        );

        Ok(LinearHashMap {
            state: RwLock::new(TableState::new(init_size)),
            num_elem: AtomicUsize::new(0),
            init_size,
            max_load_factor,
        })
    }

    /// Create a map with the default initial bucket count (2) and load factor (0.75).
    ///
    /// The defaults are always valid, so this never fails.
    pub fn new() -> LinearHashMap<K, V> {
        LinearHashMap::with_options(DEFAULT_INIT_SIZE, DEFAULT_MAX_LOAD_FACTOR)
            .expect("default parameters are always valid")
    }

    /// The number of live entries.
    ///
    /// This is a single atomic load; it never takes the table lock.
    pub fn len(&self) -> usize {
        self.num_elem.load(ORDERING)
    }

    /// Is the map empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The current number of buckets.
    ///
    /// Takes a momentary shared read of the table lock; the returned value is a snapshot with no
    /// causal relationship to any other observation the caller might make.
    pub fn capacity(&self) -> usize {
        self.state.read().buckets.len()
    }

    /// The index of the next bucket scheduled for splitting.
    ///
    /// Same snapshot caveat as [`LinearHashMap::capacity`].
    pub fn split_ptr(&self) -> usize {
        self.state.read().split_ptr
    }

    /// A single-pass, forward iterator over all entries, skipping empty buckets.
    ///
    /// # Safety contract
    ///
    /// The map must not be mutated while any iterator derived from this call is alive — see
    /// [`Iter`]. This is a documented precondition, not a compile-time or run-time enforced one.
    pub fn iter(&self) -> Iter<'_, K, V> {
        // SAFETY: the caller is responsible for not mutating `self` for the iterator's lifetime;
        // this mirrors the raw-pointer reads `get`/`get_mut` perform under the table's own lock.
        let state = unsafe { &*self.state.data_ptr() };
        Iter::new(state)
    }
}

impl<K: Hash + Eq, V> LinearHashMap<K, V> {
    /// Insert a value for `key`, returning the previous value if one existed.
    ///
    /// Overwriting an existing key never counts toward the load factor and never triggers a
    /// split; only the insertion of a genuinely new key can do that, and then at most one split
    /// step runs, bounding this call's worst-case latency.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let h = hash(&key);

        let (old, should_split) = {
            let state = self.state.read();
            let idx = state.locate(h, self.init_size);
            let mut entries = state.buckets[idx].entries.write();

            let old = match entries.iter().position(|(k, _)| *k == key) {
                Some(pos) => Some(mem::replace(&mut entries[pos].1, value)),
                None => {
                    entries.push((key, value));
                    self.num_elem.fetch_add(1, ORDERING);
                    None
                }
            };
            drop(entries);

            let should_split = old.is_none() && self.load_factor(&state) > self.max_load_factor;
            (old, should_split)
        };

        if should_split {
            self.try_split();
        }

        old
    }

    /// Look up `key`, returning a read guard over its value if present.
    pub fn get(&self, key: &K) -> Option<ReadGuard<'_, K, V>> {
        use owning_ref::{OwningHandle, OwningRef};

        let h = hash(key);
        let init_size = self.init_size;

        let outer = OwningHandle::new(self.state.read(), |x| {
            // SAFETY: `x` points at the `TableState` behind the `RwLockReadGuard` this handle
            // owns; it stays valid for as long as that guard (and hence this handle) is alive.
            let state = unsafe { &*x };
            let idx = state.locate(h, init_size);
            state.buckets[idx].entries.read()
        });

        OwningRef::new(outer)
            .try_map(|entries| entries.iter().find(|(k, _)| k == key).map(|(_, v)| v).ok_or(()))
            .ok()
            .map(|inner| ReadGuard { inner })
    }

    /// Look up `key`, returning a write guard over its value if present.
    pub fn get_mut(&self, key: &K) -> Option<WriteGuard<'_, K, V>> {
        use owning_ref::OwningHandle;

        let h = hash(key);
        let init_size = self.init_size;

        let outer = OwningHandle::new(self.state.read(), |x| {
            // SAFETY: see `get`.
            let state = unsafe { &*x };
            let idx = state.locate(h, init_size);
            state.buckets[idx].entries.write()
        });

        OwningHandle::try_new(outer, |x| {
            // SAFETY: `x` points at the `Vec` behind the `RwLockWriteGuard` `outer` owns; we
            // have exclusive access to it for as long as that guard is held.
            let entries = unsafe { &mut *(x as *mut Vec<(K, V)>) };
            entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v).ok_or(())
        })
        .ok()
        .map(|inner| WriteGuard { inner })
    }

    /// Does the map contain `key`?
    pub fn contains_key(&self, key: &K) -> bool {
        let h = hash(key);
        let state = self.state.read();
        let idx = state.locate(h, self.init_size);
        state.buckets[idx].entries.read().iter().any(|(k, _)| k == key)
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove(&self, key: &K) -> Option<V> {
        let h = hash(key);
        let state = self.state.read();
        let idx = state.locate(h, self.init_size);
        let mut entries = state.buckets[idx].entries.write();

        let pos = Bucket::<K, V>::position_no_lock(&entries, key)?;
        let (_, value) = entries.swap_remove(pos);
        self.num_elem.fetch_sub(1, ORDERING);
        Some(value)
    }

    /// `num_elem / bucket count`, computed under an already-held table lock.
    fn load_factor(&self, state: &TableState<K, V>) -> f64 {
        self.num_elem.load(ORDERING) as f64 / state.buckets.len() as f64
    }

    /// Re-check the load factor under the exclusive table lock and, if it still holds, execute
    /// exactly one split step.
    ///
    /// The re-check is required: between releasing the bucket write lock in `insert` and
    /// acquiring the table's exclusive lock here, another thread may already have split the
    /// table out from under us. Double-checking avoids an unnecessary extra split; it does not
    /// guarantee a split happens for every threshold crossing, since a concurrent thread may have
    /// already handled it — subsequent inserts will simply re-trigger if the table is still
    /// overloaded.
    fn try_split(&self) {
        let mut state = self.state.write();
        if self.load_factor(&state) > self.max_load_factor {
            let before = (state.depth, state.split_ptr, state.buckets.len());
            state.split_step(self.init_size);
            log::trace!(
                "split: depth {}->{}, split_ptr {}->{}, capacity {}->{}",
                before.0,
                state.depth,
                before.1,
                state.split_ptr,
                before.2,
                state.buckets.len()
            );
        }
    }
}

impl<K: Hash + Eq, V: Clone> LinearHashMap<K, V> {
    /// Convenience wrapper around [`LinearHashMap::get`] for callers who'd rather clone the
    /// value out than hold a guard.
    pub fn get_cloned(&self, key: &K) -> Option<V> {
        self.get(key).map(|guard| (*guard).clone())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> LinearHashMap<K, V> {
    /// Render every bucket as `Bucket i: [k:v][k:v]…`, one line per bucket, for interactive
    /// debugging. Acquires the exclusive table lock for the duration of the dump, so the result
    /// is a genuinely consistent snapshot (unlike the other accessors).
    pub fn dump(&self) -> String {
        let state = self.state.write();
        let mut out = String::new();

        for (i, bucket) in state.buckets.iter().enumerate() {
            write!(out, "Bucket {}: ", i).unwrap();
            for (k, v) in bucket.entries.read().iter() {
                write!(out, "[{:?}:{:?}]", k, v).unwrap();
            }
            out.push('\n');
        }

        out
    }
}

impl<K, V> Default for LinearHashMap<K, V> {
    fn default() -> LinearHashMap<K, V> {
        LinearHashMap::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for LinearHashMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.dump())
    }
}

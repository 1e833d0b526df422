//! The forward iterator (C6).
//!
//! Produces a lazy, single-pass view over every live entry, skipping physically empty buckets.
//! It holds no RAII lock guard at all — not even a shared one — so it compiles down to the same
//! raw-pointer escape hatch the map's own `get`/`get_mut` already use internally. That makes its
//! safety contract explicit rather than implicit: iterating while another thread mutates the map
//! is undefined behavior, full stop, and is never silently made safe by an extra lock underneath.

use crate::table::TableState;
use crate::LinearHashMap;

/// A single-pass, forward-only view over a map's entries.
///
/// # Safety contract
///
/// The map must not be mutated (`insert`, `remove`, or a split triggered by either) for as long
/// as any `Iter` derived from it is alive. The iterator does not enforce this; violating it is
/// undefined behavior, as documented on [`LinearHashMap::iter`].
pub struct Iter<'a, K, V> {
    state: &'a TableState<K, V>,
    bucket_idx: usize,
    entry_idx: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(state: &'a TableState<K, V>) -> Iter<'a, K, V> {
        Iter {
            state,
            bucket_idx: 0,
            entry_idx: 0,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.bucket_idx >= self.state.buckets.len() {
                return None;
            }

            // SAFETY: the caller upholds `Iter`'s safety contract (no concurrent mutation), so
            // no writer can be resizing or mutating this bucket's entry vector right now.
            let entries = unsafe { &*self.state.buckets[self.bucket_idx].entries.data_ptr() };

            if self.entry_idx < entries.len() {
                let (k, v) = &entries[self.entry_idx];
                self.entry_idx += 1;
                return Some((k, v));
            }

            self.bucket_idx += 1;
            self.entry_idx = 0;
        }
    }
}

impl<'a, K, V> IntoIterator for &'a LinearHashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

//! The table: the growable, exclusively-owned sequence of buckets, and the split engine.

use std::hash::Hash;

use crate::addr::addr;
use crate::bucket::Bucket;
use crate::hash;

/// The addressing and storage state protected by the map's single reader/writer lock.
///
/// Buckets are boxed so that appending a new one during a split never relocates an existing
/// bucket's lock: the outer `Vec` may reallocate and move the `Box` pointers around, but the
/// heap allocation each `Box` points to — and the `RwLock` living inside it — stays put. Any
/// code holding the table's lock (shared or exclusive) can safely index into `buckets` and rely
/// on the addressed bucket never having moved since the lock was taken.
pub(crate) struct TableState<K, V> {
    pub(crate) buckets: Vec<Box<Bucket<K, V>>>,
    pub(crate) depth: u32,
    pub(crate) split_ptr: usize,
}

impl<K, V> TableState<K, V> {
    /// Build the initial table of `init_size` empty buckets.
    pub(crate) fn new(init_size: usize) -> TableState<K, V> {
        let mut buckets = Vec::with_capacity(init_size);
        for _ in 0..init_size {
            buckets.push(Box::new(Bucket::new()));
        }

        TableState {
            buckets,
            depth: 0,
            split_ptr: 0,
        }
    }

    /// Resolve the bucket index for a precomputed hash, under the addressing state as it stands
    /// right now. Callers must hold the table lock (shared is enough) for the duration of the
    /// bucket access that follows, or the result may name a bucket that a concurrent split has
    /// already rerouted around.
    #[inline]
    pub(crate) fn locate(&self, h: u64, init_size: usize) -> usize {
        addr(h, init_size, self.depth, self.split_ptr)
    }

    /// The current pre-expansion size, `init_size << depth`.
    #[inline]
    fn pre_expansion_size(&self, init_size: usize) -> usize {
        init_size << self.depth
    }
}

impl<K: Hash + Eq, V> TableState<K, V> {
    /// Execute a single split step: append one bucket, redistribute the entries of the bucket at
    /// `split_ptr`, advance `split_ptr`, and wrap `depth` if a full round finished.
    ///
    /// Requires `&mut self`, i.e. the table's exclusive lock: no other operation can be
    /// addressing or reading the affected buckets while this runs.
    pub(crate) fn split_step(&mut self, init_size: usize) {
        let l = self.pre_expansion_size(init_size);

        self.buckets.push(Box::new(Bucket::new()));
        let dst_idx = self.buckets.len() - 1;
        let src_idx = self.split_ptr;
        debug_assert!(src_idx < dst_idx);

        let hi_bit = l as u64;
        let (left, right) = self.buckets.split_at_mut(dst_idx);
        let src = left[src_idx].entries.get_mut();
        let dst = right[0].entries.get_mut();

        // `src` and `dst` can't be borrowed together through a single index, so the surviving
        // entries are rebuilt into a fresh `Vec` that replaces `src` wholesale.
        let mut retained = Vec::with_capacity(src.len());
        for (key, value) in src.drain(..) {
            if hash(&key) & hi_bit != 0 {
                dst.push((key, value));
            } else {
                retained.push((key, value));
            }
        }
        *src = retained;

        self.split_ptr += 1;
        if self.split_ptr == l {
            self.split_ptr = 0;
            self.depth += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_step_preserves_every_key_across_the_two_buckets() {
        let init_size = 2usize;
        let mut state = TableState::<u64, u64>::new(init_size);

        for k in 0..50u64 {
            let idx = state.locate(hash(&k), init_size);
            state.buckets[idx].entries.get_mut().push((k, k));
        }

        state.split_step(init_size);

        assert_eq!(state.buckets.len(), init_size + 1);
        assert_eq!(state.split_ptr, 1);
        assert_eq!(state.depth, 0);

        let total: usize = state.buckets.iter().map(|b| b.entries.read().len()).sum();
        assert_eq!(total, 50);

        for k in 0..50u64 {
            let idx = state.locate(hash(&k), init_size);
            assert!(state.buckets[idx].entries.read().iter().any(|(key, _)| *key == k));
        }
    }

    #[test]
    fn full_round_of_splits_advances_depth_and_resets_split_ptr() {
        let init_size = 2usize;
        let mut state = TableState::<u64, u64>::new(init_size);
        for k in 0..200u64 {
            let idx = state.locate(hash(&k), init_size);
            state.buckets[idx].entries.get_mut().push((k, k));
        }

        // A full round is `init_size << depth` splits.
        for _ in 0..init_size {
            state.split_step(init_size);
        }

        assert_eq!(state.split_ptr, 0);
        assert_eq!(state.depth, 1);
        assert_eq!(state.buckets.len(), init_size * 2);
    }
}

//! Buckets: the unordered, lock-protected entry sequences the table is built from.

use parking_lot::RwLock;

/// A single slot of the table.
///
/// A bucket owns an unordered `Vec` of key/value pairs and its own reader/writer lock, so that
/// two threads addressing different buckets never contend with each other. Entries within a
/// bucket have distinct keys; uniqueness is enforced by the operations in `lib.rs`; the bucket
/// itself does no deduplication.
pub(crate) struct Bucket<K, V> {
    pub(crate) entries: RwLock<Vec<(K, V)>>,
}

impl<K, V> Bucket<K, V> {
    /// Create a fresh, empty bucket.
    pub(crate) fn new() -> Bucket<K, V> {
        Bucket {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl<K: PartialEq, V> Bucket<K, V> {
    /// Look up `key`'s position among already-locked `entries`.
    ///
    /// Takes the entry slice directly rather than the bucket itself: the only caller is
    /// `remove()`, which already holds the bucket's write-lock guard and derefs it down to a
    /// slice before calling this, so there's no lock left for this function to take.
    pub(crate) fn position_no_lock(entries: &[(K, V)], key: &K) -> Option<usize> {
        entries.iter().position(|(k, _)| k == key)
    }
}

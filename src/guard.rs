//! RAII guards returned by `get`/`get_mut`.
//!
//! These compose the table's shared lock with the addressed bucket's lock via `owning_ref`,
//! exactly as the teacher crate's own `ReadGuard`/`WriteGuard` do — the only difference is that
//! the inner lookup addresses a single bucket instead of scanning an open-addressing cluster.

use std::cmp;
use std::fmt;
use std::ops;

use owning_ref::{OwningHandle, OwningRef};
use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::table::TableState;

type BucketReadGuard<'a, K, V> =
    OwningHandle<RwLockReadGuard<'a, TableState<K, V>>, RwLockReadGuard<'a, Vec<(K, V)>>>;
type BucketWriteGuard<'a, K, V> =
    OwningHandle<RwLockReadGuard<'a, TableState<K, V>>, RwLockWriteGuard<'a, Vec<(K, V)>>>;

/// A RAII guard for reading a single entry's value.
///
/// Holds the table's shared lock and the addressed bucket's shared lock for as long as it's
/// alive. Other threads may still read or write unrelated buckets, and may even read this same
/// bucket, but a writer on this bucket will block until the guard is dropped.
pub struct ReadGuard<'a, K, V> {
    pub(crate) inner: OwningRef<BucketReadGuard<'a, K, V>, V>,
}

impl<'a, K, V> ops::Deref for ReadGuard<'a, K, V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.inner
    }
}

impl<'a, K, V: PartialEq> cmp::PartialEq for ReadGuard<'a, K, V> {
    fn eq(&self, other: &ReadGuard<'a, K, V>) -> bool {
        **self == **other
    }
}
impl<'a, K, V: Eq> cmp::Eq for ReadGuard<'a, K, V> {}

impl<'a, K, V: fmt::Debug> fmt::Debug for ReadGuard<'a, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ReadGuard({:?})", &*self.inner)
    }
}

/// A RAII guard for reading and writing a single entry's value in place.
///
/// Holds the table's shared lock and the addressed bucket's *exclusive* lock for as long as it's
/// alive, blocking both readers and writers of that one bucket; unrelated buckets are unaffected.
pub struct WriteGuard<'a, K, V> {
    pub(crate) inner: OwningHandle<BucketWriteGuard<'a, K, V>, &'a mut V>,
}

impl<'a, K, V> ops::Deref for WriteGuard<'a, K, V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.inner
    }
}

impl<'a, K, V> ops::DerefMut for WriteGuard<'a, K, V> {
    fn deref_mut(&mut self) -> &mut V {
        &mut self.inner
    }
}

impl<'a, K, V: PartialEq> cmp::PartialEq for WriteGuard<'a, K, V> {
    fn eq(&self, other: &WriteGuard<'a, K, V>) -> bool {
        **self == **other
    }
}
impl<'a, K, V: Eq> cmp::Eq for WriteGuard<'a, K, V> {}

impl<'a, K, V: fmt::Debug> fmt::Debug for WriteGuard<'a, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "WriteGuard({:?})", &**self)
    }
}

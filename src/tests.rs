use std::sync::Arc;
use std::thread;

use crate::{Error, LinearHashMap};

/// Mirrors the teacher pack's test-setup convention of enabling `log` output for the duration of
/// a test run (`env_logger::try_init().ok()`), so `RUST_LOG=trace cargo test -- --nocapture`
/// shows split/construction diagnostics. Safe to call from every test: `try_init` no-ops after
/// the first successful call.
fn init_logging() {
    env_logger::try_init().ok();
}

#[test]
fn rejects_zero_init_size() {
    init_logging();
    assert_eq!(
        LinearHashMap::<u32, u32>::with_options(0, 0.75).unwrap_err(),
        Error::InvalidInitSize(0)
    );
}

#[test]
fn rejects_non_power_of_two_init_size() {
    init_logging();
    assert_eq!(
        LinearHashMap::<u32, u32>::with_options(3, 0.75).unwrap_err(),
        Error::InvalidInitSize(3)
    );
}

#[test]
fn rejects_non_positive_load_factor() {
    init_logging();
    assert_eq!(
        LinearHashMap::<u32, u32>::with_options(2, 0.0).unwrap_err(),
        Error::InvalidLoadFactor(0.0)
    );
    assert_eq!(
        LinearHashMap::<u32, u32>::with_options(2, -1.0).unwrap_err(),
        Error::InvalidLoadFactor(-1.0)
    );
}

#[test]
fn initial_state() {
    init_logging();
    let m: LinearHashMap<u32, u32> = LinearHashMap::with_options(2, 0.75).unwrap();
    assert_eq!(m.len(), 0);
    assert_eq!(m.capacity(), 2);
    assert_eq!(m.split_ptr(), 0);
    assert!(m.is_empty());
}

#[test]
fn incremental_split() {
    init_logging();
    let m: LinearHashMap<u32, u32> = LinearHashMap::with_options(2, 0.5).unwrap();

    m.insert(1, 1);
    assert_eq!(m.capacity(), 2);
    assert_eq!(m.split_ptr(), 0);

    m.insert(2, 2);
    assert_eq!(m.capacity(), 3);
    assert_eq!(m.split_ptr(), 1);

    m.insert(3, 3);
    assert_eq!(m.capacity(), 4);
    assert_eq!(m.split_ptr(), 0);
}

#[test]
fn overwrite_replaces_value_without_growing_len() {
    init_logging();
    let m = LinearHashMap::new();
    assert_eq!(m.insert(1, 100), None);
    assert_eq!(m.insert(1, 999), Some(100));
    assert_eq!(m.len(), 1);
    assert_eq!(m.get_cloned(&1), Some(999));
}

#[test]
fn overwrite_does_not_trigger_a_split() {
    init_logging();
    let m: LinearHashMap<u32, u32> = LinearHashMap::with_options(2, 0.5).unwrap();
    m.insert(1, 1);
    let capacity_before = m.capacity();
    let split_ptr_before = m.split_ptr();

    m.insert(1, 2);

    assert_eq!(m.capacity(), capacity_before);
    assert_eq!(m.split_ptr(), split_ptr_before);
}

#[test]
fn remove_restores_num_elem_and_absence() {
    init_logging();
    let m = LinearHashMap::new();
    m.insert(1, "a");
    assert_eq!(m.remove(&1), Some("a"));
    assert_eq!(m.len(), 0);
    assert!(!m.contains_key(&1));
    assert_eq!(m.remove(&1), None);
}

#[test]
fn get_returns_none_for_absent_key() {
    init_logging();
    let m: LinearHashMap<u32, u32> = LinearHashMap::new();
    assert!(m.get(&1).is_none());
    assert_eq!(m.get_cloned(&1), None);
}

#[test]
fn get_mut_mutates_in_place() {
    init_logging();
    let m = LinearHashMap::new();
    m.insert(5, 14);
    match m.get_mut(&5) {
        None => panic!("expected entry to exist"),
        Some(mut guard) => *guard = 100,
    }
    assert_eq!(m.get_cloned(&5), Some(100));
}

#[test]
fn scale_tracks_len_and_capacity_across_many_splits() {
    init_logging();
    let m: LinearHashMap<u32, u32> = LinearHashMap::with_options(2, 0.8).unwrap();

    const N: u32 = 20_000;
    for k in 0..N {
        m.insert(k, k);
    }

    assert_eq!(m.len(), N as usize);
    assert!(m.capacity() > 2);
    assert_eq!(m.get_cloned(&0), Some(0));
    assert_eq!(m.get_cloned(&(N - 1)), Some(N - 1));

    for k in 0..N {
        assert_eq!(m.get_cloned(&k), Some(k));
    }
}

#[test]
fn sequential_insert_get_remove_roundtrip() {
    init_logging();
    let m = LinearHashMap::new();

    for _ in 0..3 {
        assert!(m.is_empty());

        for i in 1..1001u32 {
            assert_eq!(m.insert(i, i), None);

            for j in 1..=i {
                assert_eq!(m.get_cloned(&j), Some(j));
            }
            for j in (i + 1)..1001 {
                assert_eq!(m.get_cloned(&j), None);
            }
        }

        for i in 1..1001u32 {
            assert_eq!(m.remove(&i), Some(i));
            for j in 1..=i {
                assert!(!m.contains_key(&j));
            }
            for j in (i + 1)..1001 {
                assert!(m.contains_key(&j));
            }
        }
    }
}

#[test]
fn iter_visits_every_live_entry_exactly_once() {
    init_logging();
    let m = LinearHashMap::new();
    for k in 0..200u32 {
        m.insert(k, k * 2);
    }
    m.remove(&5);
    m.remove(&150);

    let mut seen: Vec<u32> = m.iter().map(|(k, _)| *k).collect();
    seen.sort_unstable();

    let mut expected: Vec<u32> = (0..200).filter(|k| *k != 5 && *k != 150).collect();
    expected.sort_unstable();

    assert_eq!(seen, expected);
    for (k, v) in m.iter() {
        assert_eq!(*v, *k * 2);
    }
}

#[test]
fn dump_lists_every_bucket() {
    init_logging();
    let m: LinearHashMap<u32, u32> = LinearHashMap::with_options(2, 0.75).unwrap();
    m.insert(1, 10);
    m.insert(2, 20);

    let text = m.dump();
    assert!(text.lines().count() >= 2);
    assert!(text.contains("Bucket 0:"));
    assert!(text.contains("Bucket 1:"));
}

#[test]
fn concurrent_unique_inserts() {
    init_logging();
    let m = Arc::new(LinearHashMap::new());
    let mut joins = Vec::new();

    for t in 0..8u32 {
        let m = m.clone();
        joins.push(thread::spawn(move || {
            for i in t * 5000..(t + 1) * 5000 {
                m.insert(i, i);
            }
        }));
    }

    for j in joins {
        j.join().unwrap();
    }

    assert_eq!(m.len(), 40_000);
    for i in 0..40_000u32 {
        assert!(m.contains_key(&i));
    }
}

#[test]
fn concurrent_same_key_storm_never_splits() {
    init_logging();
    let m: Arc<LinearHashMap<u32, u32>> = Arc::new(LinearHashMap::with_options(2, 0.75).unwrap());
    let mut joins = Vec::new();

    for t in 0..8u32 {
        let m = m.clone();
        joins.push(thread::spawn(move || {
            for _ in 0..5000 {
                m.insert(0, t);
            }
        }));
    }

    for j in joins {
        j.join().unwrap();
    }

    assert_eq!(m.len(), 1);
    assert_eq!(m.capacity(), 2);
}

#[test]
fn reader_writer_mix() {
    init_logging();
    let m: Arc<LinearHashMap<u32, u32>> = Arc::new(LinearHashMap::new());
    for k in 0..1000u32 {
        m.insert(k, k);
    }

    let mut joins = Vec::new();

    for _ in 0..4 {
        let m = m.clone();
        joins.push(thread::spawn(move || {
            for k in 0..1000u32 {
                assert_eq!(m.get_cloned(&k), Some(k));
            }
        }));
    }

    for t in 0..4u32 {
        let m = m.clone();
        joins.push(thread::spawn(move || {
            for k in (10000 + t * 1000)..(11000 + t * 1000) {
                m.insert(k, k);
            }
        }));
    }

    for j in joins {
        j.join().unwrap();
    }

    assert_eq!(m.len(), 5000);
}

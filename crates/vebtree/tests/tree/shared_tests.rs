use std::sync::{Arc, Barrier};
use std::thread;
use test_log::test;
use vebtree::SharedVebTree;

#[test]
fn concurrent_writers_insert_disjoint_ranges() {
    let tree = SharedVebTree::new(1 << 16).unwrap();
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4u64)
        .map(|worker| {
            let tree = tree.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for value in (worker * 1000)..(worker * 1000 + 1000) {
                    assert_eq!(tree.insert(value), Ok(true));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer thread panicked");
    }

    assert_eq!(tree.len(), 4000);
    assert_eq!(tree.minimum(), Some(0));
    assert_eq!(tree.maximum(), Some(3999));
    assert_eq!(tree.to_vec(), (0..4000).collect::<Vec<_>>());
}

#[test]
fn concurrent_pop_min_hands_out_each_value_once() {
    let tree = SharedVebTree::new(10_000).unwrap();
    tree.insert_batch(&(0..5000).collect::<Vec<_>>()).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let tree = tree.clone();
            thread::spawn(move || {
                let mut taken = Vec::new();
                while let Some(value) = tree.pop_min() {
                    taken.push(value);
                }
                taken
            })
        })
        .collect();

    let mut all: Vec<u64> = Vec::new();
    for handle in handles {
        let taken = handle.join().expect("consumer thread panicked");
        // Each consumer sees strictly increasing minimums
        assert!(taken.windows(2).all(|w| w[0] < w[1]));
        all.extend(taken);
    }
    all.sort_unstable();
    assert_eq!(all, (0..5000).collect::<Vec<_>>());
    assert!(tree.is_empty());
}

#[test]
fn readers_observe_consistent_snapshots_during_writes() {
    let tree = SharedVebTree::new(1 << 12).unwrap();
    let writer = {
        let tree = tree.clone();
        thread::spawn(move || {
            for value in 0..2000 {
                tree.insert(value).unwrap();
                if value % 2 == 1 {
                    tree.delete(value - 1);
                }
            }
        })
    };

    for _ in 0..200 {
        let snapshot = tree.snapshot();
        assert_eq!(snapshot.len, snapshot.values.len() as u64);
        assert!(snapshot.values.windows(2).all(|w| w[0] < w[1]));
    }

    writer.join().expect("writer thread panicked");
    assert_eq!(tree.len(), 1000);
    assert!(tree.to_vec().iter().all(|v| v % 2 == 1));
}

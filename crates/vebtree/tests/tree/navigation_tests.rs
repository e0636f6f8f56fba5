use super::test_utilities::{ValueStream, assert_matches_model, tree_and_model};
use std::collections::BTreeSet;
use test_log::test;
use vebtree::VebTree;

fn model_next(model: &BTreeSet<u64>, x: u64) -> Option<u64> {
    model.range(x.saturating_add(1)..).next().copied().filter(|&v| v > x)
}

fn model_prev(model: &BTreeSet<u64>, x: u64) -> Option<u64> {
    model.range(..x).next_back().copied()
}

#[test]
fn find_next_and_prev_match_btreeset_for_every_query() {
    for universe in [2u64, 3, 5, 10, 16, 17, 100, 255, 256, 1000] {
        let values: Vec<u64> = ValueStream::new(universe, universe)
            .take((universe / 3 + 1) as usize)
            .collect();
        let (tree, model) = tree_and_model(universe, &values);
        assert_matches_model(&tree, &model);

        for x in 0..universe + 3 {
            assert_eq!(
                tree.find_next(x),
                model_next(&model, x),
                "find_next({x}) in universe {universe}"
            );
            assert_eq!(
                tree.find_prev(x),
                model_prev(&model, x),
                "find_prev({x}) in universe {universe}"
            );
        }
    }
}

#[test]
fn navigation_survives_interleaved_deletes() {
    let universe = 4096;
    let values: Vec<u64> = ValueStream::new(7, universe).take(1500).collect();
    let (mut tree, mut model) = tree_and_model(universe, &values);

    for (step, value) in ValueStream::new(99, universe).take(3000).enumerate() {
        if step % 3 == 0 {
            assert_eq!(tree.insert(value), model.insert(value));
        } else {
            assert_eq!(tree.delete(value), model.remove(&value));
        }
        if step % 250 == 0 {
            assert_matches_model(&tree, &model);
            for probe in ValueStream::new(step as u64 + 1, universe).take(50) {
                assert_eq!(tree.find_next(probe), model_next(&model, probe));
                assert_eq!(tree.find_prev(probe), model_prev(&model, probe));
                assert_eq!(tree.contains(probe), model.contains(&probe));
            }
        }
    }
    assert_matches_model(&tree, &model);
}

#[test]
fn sparse_values_in_a_huge_universe() {
    let universe = 1u64 << 48;
    let values: Vec<u64> = ValueStream::new(12345, universe).take(2000).collect();
    let (tree, model) = tree_and_model(universe, &values);
    assert_matches_model(&tree, &model);

    for probe in ValueStream::new(54321, universe).take(500) {
        assert_eq!(tree.find_next(probe), model_next(&model, probe));
        assert_eq!(tree.find_prev(probe), model_prev(&model, probe));
    }
}

#[test]
fn draining_from_the_minimum_walks_every_value() {
    let mut tree = VebTree::with_values(1 << 12, (0..4096).step_by(7)).unwrap();
    let mut expected: Vec<u64> = (0..4096).step_by(7).collect();
    expected.reverse();

    while let Some(min) = tree.minimum() {
        assert_eq!(Some(min), expected.pop());
        assert!(tree.delete(min));
    }
    assert!(expected.is_empty());
    assert_eq!(tree.len(), 0);
}

#[test]
fn draining_from_the_maximum_walks_every_value() {
    let mut tree = VebTree::with_values(1000, (0..1000).filter(|v| v % 3 == 1)).unwrap();
    let mut previous = u64::MAX;
    let mut count = 0;
    while let Some(max) = tree.maximum() {
        assert!(max < previous);
        previous = max;
        assert!(tree.delete(max));
        count += 1;
    }
    assert_eq!(count, 333);
}

#[test]
fn non_power_of_two_universe_edges() {
    // 10 pads to 16 internally
    let mut tree = VebTree::new(10).unwrap();
    tree.insert(9);
    tree.insert(0);
    assert_eq!(tree.find_next(0), Some(9));
    assert_eq!(tree.find_next(9), None);
    assert_eq!(tree.find_prev(9), Some(0));
    assert_eq!(tree.find_prev(12), Some(9));
    assert!(!tree.contains(12));
    assert!(!tree.delete(12));
}

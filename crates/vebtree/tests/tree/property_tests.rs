use proptest::prelude::*;
use std::collections::BTreeSet;
use vebtree::VebTree;

#[derive(Debug, Clone)]
enum Op {
    Insert(u64),
    Delete(u64),
    Next(u64),
    Prev(u64),
}

fn op_strategy(universe: u64) -> impl Strategy<Value = Op> {
    let probe = 0..universe + 4;
    prop_oneof![
        (0..universe).prop_map(Op::Insert),
        (0..universe).prop_map(Op::Delete),
        probe.clone().prop_map(Op::Next),
        probe.prop_map(Op::Prev),
    ]
}

fn universe_and_ops() -> impl Strategy<Value = (u64, Vec<Op>)> {
    prop_oneof![2u64..64, 64u64..5000, Just(1u64 << 40)].prop_flat_map(|universe| {
        (
            Just(universe),
            prop::collection::vec(op_strategy(universe), 1..200),
        )
    })
}

proptest! {
    #[test]
    fn behaves_like_btreeset((universe, ops) in universe_and_ops()) {
        let mut tree = VebTree::new(universe).unwrap();
        let mut model = BTreeSet::new();

        for op in ops {
            match op {
                Op::Insert(x) => prop_assert_eq!(tree.insert(x), model.insert(x)),
                Op::Delete(x) => prop_assert_eq!(tree.delete(x), model.remove(&x)),
                Op::Next(x) => prop_assert_eq!(
                    tree.find_next(x),
                    model.range(x.saturating_add(1)..).next().copied().filter(|&v| v > x)
                ),
                Op::Prev(x) => prop_assert_eq!(tree.find_prev(x), model.range(..x).next_back().copied()),
            }
            prop_assert_eq!(tree.len(), model.len() as u64);
            prop_assert_eq!(tree.minimum(), model.first().copied());
            prop_assert_eq!(tree.maximum(), model.last().copied());
        }

        prop_assert!(tree.iter().eq(model.iter().copied()));
        prop_assert!(tree.iter().rev().eq(model.iter().rev().copied()));
    }
}

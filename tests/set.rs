mod common;

use cordyceps_avl::{AvlSet, NodeInfo};
use proptest::prelude::*;

const SAMPLE: [i32; 7] = [50, 25, 75, 10, 30, 60, 85];

fn sample() -> AvlSet {
    SAMPLE.into_iter().collect()
}

#[test]
fn ascending_inserts_keep_height_bound() {
    common::init_tracing();
    let mut set = AvlSet::new();

    for key in 1..=7 {
        assert!(set.insert(key));
        assert!(set.is_valid_avl());
        assert!(set.height() <= 2, "height {} after inserting {key}", set.height());
    }

    assert_eq!(set.in_order(), [1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(set.height(), 2);
}

#[test]
fn search_reports_neighbourhood() {
    common::init_tracing();
    let set = sample();

    let info = set.search(30);
    assert!(info.is_present());
    assert_eq!(info.key, Some(30));
    assert_eq!(info.parent, Some(25));
    assert_eq!(info.left, None);
    assert_eq!(info.right, None);
    assert_eq!(info.height, 0);

    let missing = set.search(99);
    assert!(!missing.is_present());
    assert_eq!(missing, NodeInfo::empty());
    assert_eq!(missing.height, -1);
}

#[test]
fn remove_everything_in_any_order() {
    common::init_tracing();

    let orders: [[i32; 7]; 4] = [
        SAMPLE,
        [10, 25, 30, 50, 60, 75, 85],
        [85, 75, 60, 50, 30, 25, 10],
        [50, 10, 85, 25, 75, 30, 60],
    ];

    for order in orders {
        let mut set = sample();

        for (removed, key) in order.into_iter().enumerate() {
            assert!(set.remove(key), "{key} should be present");
            assert!(set.is_valid_avl());
            assert_eq!(set.len(), SAMPLE.len() - removed - 1);
            assert!(!set.contains(key));
        }

        assert!(set.is_empty());
        assert_eq!(set.height(), -1);
        assert_eq!(set.balance_factor(), 0);
    }
}

#[test]
fn remove_root_of_three() {
    common::init_tracing();
    let mut set: AvlSet = [50, 25, 75].into_iter().collect();

    assert!(set.remove(50));
    assert!(set.is_valid_avl());
    assert_eq!(set.len(), 2);
    assert_eq!(set.height(), 1);

    let pre = set.pre_order();
    let root = pre[0];
    assert!(root == 25 || root == 75, "unexpected root {root}");

    let info = set.search(root);
    assert_eq!(info.parent, None);
    let children: Vec<i32> = info.left.into_iter().chain(info.right).collect();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0], if root == 25 { 75 } else { 25 });
}

#[test]
fn duplicate_insert_changes_nothing() {
    common::init_tracing();
    let mut set = sample();
    let (order, len, height) = (set.in_order(), set.len(), set.height());

    assert!(!set.insert(30));
    assert_eq!(set.in_order(), order);
    assert_eq!(set.len(), len);
    assert_eq!(set.height(), height);
}

#[test]
fn remove_absent_changes_nothing() {
    common::init_tracing();
    let mut set = sample();

    assert!(!set.remove(31));
    assert_eq!(set.in_order(), [10, 25, 30, 50, 60, 75, 85]);
    assert_eq!(set.len(), 7);
}

#[test]
fn traversals() {
    let set = sample();

    assert_eq!(set.pre_order(), [50, 25, 10, 30, 75, 60, 85]);
    assert_eq!(set.post_order(), [10, 30, 25, 60, 85, 75, 50]);
    assert_eq!(set.reverse_in_order(), [85, 75, 60, 50, 30, 25, 10]);
    assert_eq!(set.iter().rev().collect::<Vec<_>>(), set.reverse_in_order());
}

#[test]
fn structural_pre_order_levels_are_complete() {
    let set: AvlSet = [2, 1, 3, 4].into_iter().collect();
    let height = set.height() as usize;

    let mut levels = vec![Vec::new(); height + 1];
    set.structural_pre_order(height + 5, |key, depth, bound| {
        assert_eq!(bound, height);
        levels[depth].push(key)
    });

    assert_eq!(levels[0], [Some(2)]);
    assert_eq!(levels[1], [Some(1), Some(3)]);
    assert_eq!(levels[2], [None, None, None, Some(4)]);
}

#[test]
fn clear_then_reuse() {
    let mut set = sample();

    set.clear();
    assert!(set.is_empty());
    assert_eq!(set.len(), 0);
    assert_eq!(set.height(), -1);

    set.extend([3, 2, 1]);
    assert_eq!(set.pre_order(), [2, 1, 3]);
}

#[derive(Clone, Debug)]
enum SetOp {
    Insert(i32),
    Remove(i32),
}

fn set_op() -> impl Strategy<Value = SetOp> {
    prop_oneof![
        3 => (1..=9999).prop_map(SetOp::Insert),
        2 => (1..=9999).prop_map(SetOp::Remove),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn distinct_inserts_stay_sorted(keys in proptest::collection::vec(1..=9999i32, 0..300)) {
        common::init_tracing();
        let mut set = AvlSet::new();
        let mut distinct = std::collections::BTreeSet::new();

        for key in keys {
            prop_assert_eq!(set.insert(key), distinct.insert(key));
            prop_assert!(set.is_valid_avl());
            prop_assert_eq!(set.len(), distinct.len());
        }

        let expected: Vec<i32> = distinct.into_iter().collect();
        prop_assert_eq!(set.in_order(), expected);
    }

    #[test]
    fn mixed_operations_respect_height_bound(ops in proptest::collection::vec(set_op(), 0..2000)) {
        common::init_tracing();
        let mut set = AvlSet::new();

        for op in ops {
            match op {
                SetOp::Insert(key) => {
                    let present = set.contains(key);
                    prop_assert_eq!(set.insert(key), !present);
                }
                SetOp::Remove(key) => {
                    let before = set.in_order();
                    let removed = set.remove(key);
                    prop_assert_eq!(removed, before.binary_search(&key).is_ok());

                    let after = set.in_order();
                    if removed {
                        prop_assert_eq!(after.len(), before.len() - 1);
                        prop_assert!(after.binary_search(&key).is_err());
                    } else {
                        prop_assert_eq!(after, before);
                    }
                }
            }

            prop_assert!(set.validate().is_ok(), "{:?}", set.validate());
            prop_assert!(f64::from(set.height()) <= common::max_height(set.len()));

            let mut reversed = set.in_order();
            reversed.reverse();
            prop_assert_eq!(set.reverse_in_order(), reversed);
        }
    }
}

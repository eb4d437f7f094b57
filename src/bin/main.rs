use cordyceps_avl::AvlSet;

fn main() {
    let mut set = AvlSet::new();

    // Ascending inserts are the worst case for an unbalanced tree.
    for key in 1..=7 {
        set.insert(key);
        set.validate().expect("tree invariants must hold");
        println!(
            "insert {key}: height {} in-order {:?} pre-order {:?}",
            set.height(),
            set.in_order(),
            set.pre_order()
        );
    }

    assert!(!set.insert(4), "duplicates are rejected");

    let info = set.search(2);
    println!(
        "search 2: parent {:?} left {:?} right {:?} height {}",
        info.parent, info.left, info.right, info.height
    );

    let mut levels: Vec<Vec<String>> = Vec::new();
    set.structural_pre_order(usize::MAX, |key, depth, bound| {
        levels.resize_with(bound + 1, Vec::new);
        levels[depth].push(key.map_or_else(|| "-".to_owned(), |k| k.to_string()));
    });
    for (depth, level) in levels.iter().enumerate() {
        println!("depth {depth}: {}", level.join(" "));
    }

    set.remove(4);
    set.validate().expect("tree invariants must hold");
    println!(
        "remove 4: root balance {} post-order {:?} reverse {:?}",
        set.balance_factor(),
        set.post_order(),
        set.reverse_in_order()
    );

    let first = set.pop_first();
    assert_eq!(first, Some(1));

    set.clear();
    assert!(set.is_empty());
}

mod common;

use cordyceps_avl::AvlMap;

#[test]
fn map_behaves_like_an_ordered_map() {
    common::init_tracing();
    let mut map = AvlMap::new();

    for key in [50, 25, 75, 10, 30, 60, 85] {
        map.insert(key, format!("v{key}")).unwrap();
    }

    assert_eq!(map.len(), 7);
    assert_eq!(map.height(), 2);
    assert_eq!(map.get(&60).map(String::as_str), Some("v60"));
    assert_eq!(
        map.insert(60, "other".to_owned()),
        Err((60, "other".to_owned()))
    );

    map.get_mut(&60).unwrap().push('!');
    assert_eq!(map.get(&60).map(String::as_str), Some("v60!"));

    assert_eq!(map.remove(&50).as_deref(), Some("v50"));
    assert_eq!(map.remove(&50), None);

    let keys: Vec<i32> = map.iter().map(|(&k, _)| k).collect();
    assert_eq!(keys, [10, 25, 30, 60, 75, 85]);

    assert_eq!(map.pop_first(), Some((10, "v10".to_owned())));
    assert_eq!(map.last_key_value().map(|(&k, _)| k), Some(85));

    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.first_key_value(), None);
}

#[test]
fn drop_releases_values() {
    use std::rc::Rc;

    let value = Rc::new(());
    {
        let mut map = AvlMap::new();
        for key in 0..64 {
            map.insert(key, Rc::clone(&value)).unwrap();
        }
        assert_eq!(Rc::strong_count(&value), 65);
    }

    assert_eq!(Rc::strong_count(&value), 1);
}

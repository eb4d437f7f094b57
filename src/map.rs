extern crate alloc;

use alloc::boxed::Box;
use core::{borrow::Borrow, fmt, ptr::NonNull};

use cordyceps::Linked;

use crate::{AvlTree, Iter, Links, TreeNode};

/// An ordered map based on an [AVL tree].
///
/// Unlike [`BTreeMap`], inserting a key that is already present leaves the map unchanged and hands
/// the rejected pair back.
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
/// [`BTreeMap`]: std::collections::BTreeMap
pub struct AvlMap<K: Ord + fmt::Debug, V> {
    tree: AvlTree<MapNode<K, V>>,
}

struct MapNode<K, V> {
    links: Links<MapNode<K, V>>,
    key: K,
    value: V,
}

unsafe impl<K, V> Linked<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Handle = Box<Self>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<MapNode<K, V>>> {
        let ptr = ptr.as_ptr();
        unsafe { NonNull::new_unchecked(core::ptr::addr_of_mut!((*ptr).links)) }
    }
}

impl<K: Ord + fmt::Debug, V> TreeNode<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Key = K;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

impl<K: Ord + fmt::Debug, V> AvlMap<K, V> {
    /// Creates a new, empty `AvlMap`.
    pub const fn new() -> Self {
        Self {
            tree: AvlTree::new(),
        }
    }

    /// Returns `true` if the map contains no elements.
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the map.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the height of the underlying tree, or `-1` if the map is empty.
    pub fn height(&self) -> i32 {
        self.tree.height()
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contains `key`, the map is not modified and the pair is returned as the
    /// error.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), (K, V)> {
        let node = Box::new(MapNode {
            links: Links::new(),
            key,
            value,
        });

        match self.tree.insert(node) {
            None => Ok(()),
            Some(rejected) => {
                let MapNode { key, value, .. } = *rejected;
                Err((key, value))
            }
        }
    }

    /// Returns `true` if the map contains a value associated with `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.tree.contains_key(key)
    }

    /// Returns a reference to the value associated with `key`.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.tree.get(key).map(|node| &node.get_ref().value)
    }

    /// Returns a mutable reference to the value associated with `key`.
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.tree
            .get_mut(key)
            // SAFETY: Pinning is not structural for `node.value`.
            .map(|node| unsafe { &mut node.get_unchecked_mut().value })
    }

    /// Returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first().map(|node| {
            let node = node.get_ref();
            (&node.key, &node.value)
        })
    }

    /// Removes and returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first().map(|node| {
            let MapNode { key, value, .. } = *node;
            (key, value)
        })
    }

    /// Returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last().map(|node| {
            let node = node.get_ref();
            (&node.key, &node.value)
        })
    }

    /// Removes and returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last().map(|node| {
            let MapNode { key, value, .. } = *node;
            (key, value)
        })
    }

    /// Removes the value associated with `key` from the map.
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.tree.remove(key).map(|node| node.value)
    }

    /// Returns an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> MapIter<'_, K, V> {
        MapIter {
            inner: self.tree.iter(),
        }
    }

    /// Clears the map, removing all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<K: Ord + fmt::Debug, V> Default for AvlMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for AvlMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// An iterator over the entries of an [`AvlMap`], sorted by key.
pub struct MapIter<'a, K: Ord + fmt::Debug, V> {
    inner: Iter<'a, MapNode<K, V>>,
}

impl<'a, K: Ord + fmt::Debug, V> Iterator for MapIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|node| (&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K: Ord + fmt::Debug, V> DoubleEndedIterator for MapIter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|node| (&node.key, &node.value))
    }
}

impl<'a, K: Ord + fmt::Debug, V> ExactSizeIterator for MapIter<'a, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_rejects_duplicates() {
        let mut map = AvlMap::new();

        assert_eq!(map.insert(1, "one"), Ok(()));
        assert_eq!(map.insert(1, "uno"), Err((1, "uno")));
        assert_eq!(map.get(&1), Some(&"one"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn get_mut_updates_value() {
        let mut map = AvlMap::new();
        map.insert(3, 30).unwrap();

        *map.get_mut(&3).unwrap() += 1;
        assert_eq!(map.get(&3), Some(&31));
        assert_eq!(map.get_mut(&4), None);
    }

    #[test]
    fn first_last_pop() {
        let mut map = AvlMap::new();
        for key in [5, 1, 9, 3, 7] {
            map.insert(key, key * 10).unwrap();
        }

        assert_eq!(map.first_key_value(), Some((&1, &10)));
        assert_eq!(map.last_key_value(), Some((&9, &90)));
        assert_eq!(map.pop_first(), Some((1, 10)));
        assert_eq!(map.pop_last(), Some((9, 90)));
        assert_eq!(map.len(), 3);
        map.tree.assert_invariants();
    }

    #[test]
    fn iter_is_sorted_both_ways() {
        let mut map = AvlMap::new();
        for key in [4, 2, 6, 1, 3, 5, 7] {
            map.insert(key, ()).unwrap();
        }

        let forward: Vec<i32> = map.iter().map(|(&k, _)| k).collect();
        let backward: Vec<i32> = map.iter().rev().map(|(&k, _)| k).collect();

        assert_eq!(forward, [1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(backward, [7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(map.iter().len(), 7);
    }

    #[test]
    fn string_keys_borrow_as_str() {
        let mut map: AvlMap<String, usize> = AvlMap::new();
        map.insert("b".to_owned(), 2).unwrap();
        map.insert("a".to_owned(), 1).unwrap();

        assert!(map.contains_key("a"));
        assert_eq!(map.remove("b"), Some(2));
        assert_eq!(map.remove("b"), None);
        assert_eq!(format!("{map:?}"), r#"{"a": 1}"#);
    }
}

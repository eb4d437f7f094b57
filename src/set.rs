extern crate alloc;

use alloc::{boxed::Box, vec::Vec};
use core::{fmt, ptr::NonNull};

use cordyceps::Linked;

use crate::{AvlTree, InvariantViolation, Links, NodeInfo, TreeNode};

/// An ordered set of `i32` keys based on an [`AvlTree`].
///
/// Every operation reports failure through its return value: inserting a present key or removing
/// an absent one returns `false` and leaves the set untouched.
///
/// ```
/// use cordyceps_avl::AvlSet;
///
/// let mut set: AvlSet = [50, 25, 75, 10, 30].into_iter().collect();
/// assert!(!set.insert(30));
/// assert_eq!(set.in_order(), [10, 25, 30, 50, 75]);
///
/// let info = set.search(30);
/// assert_eq!(info.parent, Some(25));
/// assert_eq!(info.height, 0);
/// ```
#[derive(Default)]
pub struct AvlSet {
    tree: AvlTree<SetNode>,
}

#[derive(Debug)]
#[repr(C)]
struct SetNode {
    links: Links<SetNode>,
    key: i32,
}

impl SetNode {
    fn new(key: i32) -> Box<SetNode> {
        Box::new(SetNode {
            links: Links::new(),
            key,
        })
    }
}

unsafe impl Linked<Links<SetNode>> for SetNode {
    type Handle = Box<SetNode>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<SetNode>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl TreeNode<Links<SetNode>> for SetNode {
    type Key = i32;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

impl AvlSet {
    /// Creates a new, empty `AvlSet`.
    pub const fn new() -> Self {
        Self {
            tree: AvlTree::new(),
        }
    }

    /// Inserts `key`, returning `false` if it was already present.
    pub fn insert(&mut self, key: i32) -> bool {
        self.tree.insert(SetNode::new(key)).is_none()
    }

    /// Removes `key`, returning `false` if it was not present.
    pub fn remove(&mut self, key: i32) -> bool {
        self.tree.remove(&key).is_some()
    }

    pub fn contains(&self, key: i32) -> bool {
        self.tree.contains_key(&key)
    }

    /// Returns a snapshot of the node holding `key`.
    ///
    /// If `key` is absent, the snapshot is empty and its height is `-1`.
    pub fn search(&self, key: i32) -> NodeInfo<i32> {
        self.tree.search(&key)
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the height of the tree, or `-1` if the set is empty.
    pub fn height(&self) -> i32 {
        self.tree.height()
    }

    /// Returns the balance factor of the root, or `0` if the set is empty.
    pub fn balance_factor(&self) -> i32 {
        self.tree.balance_factor()
    }

    /// Returns `true` if the underlying tree satisfies every AVL invariant.
    pub fn is_valid_avl(&self) -> bool {
        self.tree.is_valid_avl()
    }

    /// Checks every invariant of the underlying tree.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        self.tree.validate()
    }

    /// Returns the keys in ascending order.
    pub fn in_order(&self) -> Vec<i32> {
        let mut keys = Vec::with_capacity(self.len());
        self.tree.for_each_in_order(|node| keys.push(node.key));
        keys
    }

    /// Returns the keys in descending order.
    pub fn reverse_in_order(&self) -> Vec<i32> {
        let mut keys = Vec::with_capacity(self.len());
        self.tree
            .for_each_reverse_in_order(|node| keys.push(node.key));
        keys
    }

    /// Returns the keys in pre-order (node, left subtree, right subtree).
    pub fn pre_order(&self) -> Vec<i32> {
        let mut keys = Vec::with_capacity(self.len());
        self.tree.for_each_pre_order(|node| keys.push(node.key));
        keys
    }

    /// Returns the keys in post-order (left subtree, right subtree, node).
    pub fn post_order(&self) -> Vec<i32> {
        let mut keys = Vec::with_capacity(self.len());
        self.tree.for_each_post_order(|node| keys.push(node.key));
        keys
    }

    /// Walks the set in pre-order, calling `visit` with each key, its depth and the effective
    /// depth bound, and with `None` for each missing child position.
    ///
    /// The bound is the smaller of `max_depth` and the height of the set. See
    /// [`AvlTree::structural_pre_order`].
    pub fn structural_pre_order<F>(&self, max_depth: usize, mut visit: F)
    where
        F: FnMut(Option<i32>, usize, usize),
    {
        self.tree.structural_pre_order(max_depth, |node, depth, bound| {
            visit(node.map(|n| n.key), depth, bound)
        });
    }

    /// Returns the minimum key.
    pub fn first(&self) -> Option<i32> {
        self.tree.first().map(|node| node.key)
    }

    /// Returns the maximum key.
    pub fn last(&self) -> Option<i32> {
        self.tree.last().map(|node| node.key)
    }

    /// Removes and returns the minimum key.
    pub fn pop_first(&mut self) -> Option<i32> {
        self.tree.pop_first().map(|node| node.key)
    }

    /// Removes and returns the maximum key.
    pub fn pop_last(&mut self) -> Option<i32> {
        self.tree.pop_last().map(|node| node.key)
    }

    /// Returns an iterator over the keys in ascending order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = i32> + ExactSizeIterator + '_ {
        self.tree.iter().map(|node| node.key)
    }
}

impl fmt::Debug for AvlSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Extend<i32> for AvlSet {
    fn extend<I: IntoIterator<Item = i32>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl FromIterator<i32> for AvlSet {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        let mut set = AvlSet::new();
        set.extend(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut set = AvlSet::new();

        assert!(set.insert(7));
        assert!(!set.insert(7));
        assert_eq!(set.len(), 1);
        assert_eq!(set.height(), 0);
    }

    #[test]
    fn empty_set() {
        let mut set = AvlSet::new();

        assert!(set.is_empty());
        assert_eq!(set.height(), -1);
        assert_eq!(set.balance_factor(), 0);
        assert!(set.is_valid_avl());
        assert!(!set.remove(1));
        assert_eq!(set.search(1), NodeInfo::empty());
        assert_eq!(set.first(), None);
        assert_eq!(set.pop_last(), None);
        assert!(set.in_order().is_empty());
    }

    #[test]
    fn clear_resets_len() {
        let mut set: AvlSet = (1..=100).collect();
        assert_eq!(set.len(), 100);

        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set.height(), -1);

        assert!(set.insert(5));
        assert_eq!(set.in_order(), [5]);
    }

    #[test]
    fn debug_lists_keys_in_order() {
        let set: AvlSet = [3, 1, 2].into_iter().collect();
        assert_eq!(format!("{set:?}"), "{1, 2, 3}");
    }
}

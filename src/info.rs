use core::{borrow::Borrow, ptr::NonNull};

use crate::{AvlTree, Link, Links, TreeNode};

/// A read-only snapshot of a node and its immediate neighbourhood.
///
/// Snapshots are copies, so holding one never borrows the tree. A search that finds nothing
/// produces the empty snapshot: every key is `None` and the height is `-1`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeInfo<K> {
    pub key: Option<K>,
    pub parent: Option<K>,
    pub left: Option<K>,
    pub right: Option<K>,
    pub height: i32,
}

impl<K> NodeInfo<K> {
    /// Returns the snapshot of a missing node.
    pub const fn empty() -> Self {
        NodeInfo {
            key: None,
            parent: None,
            left: None,
            right: None,
            height: -1,
        }
    }

    /// Returns `true` if this snapshot describes a node present in the tree.
    pub const fn is_present(&self) -> bool {
        self.key.is_some()
    }

    /// Returns `true` if the described node has no children.
    pub const fn is_leaf(&self) -> bool {
        self.key.is_some() && self.left.is_none() && self.right.is_none()
    }

    /// Maps every key of the snapshot with `f`.
    pub fn map<U, F: FnMut(K) -> U>(self, mut f: F) -> NodeInfo<U> {
        NodeInfo {
            key: self.key.map(&mut f),
            parent: self.parent.map(&mut f),
            left: self.left.map(&mut f),
            right: self.right.map(&mut f),
            height: self.height,
        }
    }
}

impl<K: Copy> Copy for NodeInfo<K> {}

impl<K> Default for NodeInfo<K> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
    T::Key: Clone,
{
    /// Returns a snapshot of the node with the given key, or [`NodeInfo::empty`] if there is no
    /// such node.
    pub fn search<Q>(&self, key: &Q) -> NodeInfo<T::Key>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let Some(node) = self.get_raw(key) else {
            return NodeInfo::empty();
        };

        fn key_of<T>(node: Link<T>) -> Option<T::Key>
        where
            T: TreeNode<Links<T>> + ?Sized,
            T::Key: Clone,
        {
            node.map(|n: NonNull<T>| unsafe { n.as_ref().key().clone() })
        }

        unsafe {
            let links = T::links(node).as_ref();

            NodeInfo {
                key: Some(node.as_ref().key().clone()),
                parent: key_of(links.parent()),
                left: key_of(links.left()),
                right: key_of(links.right()),
                height: i32::from(links.height()),
            }
        }
    }
}

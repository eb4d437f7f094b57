//! An intrusive AVL tree.
//#![no_std]

// Conventions used in comments:
// - The height of a node `x` is denoted `h(x)`. A missing child has height -1, so a leaf has
//   height 0.
// - The parent of a node `x` is denoted `p(x)`.
// - The balance factor of a node `x` is `h(left(x)) - h(right(x))`.
//
// The invariants of an AVL tree are:
// 1. Every left descendant of `x` orders before `x`, every right descendant after it.
// 2. The balance factor of every node is -1, 0 or 1.
// 3. `h(x) = 1 + max(h(left(x)), h(right(x)))`.
//
// Corollaries:
// 4. A tree of height `h` has at least `F(h + 3) - 1` nodes, where `F` is the Fibonacci
//    sequence. Thus `h < 1.4405 * log2(n + 2) - 0.3277`.
//
// 5. After a single insertion or removal, every node whose balance factor leaves [-1, 1] is an
//    ancestor of the changed position and has a balance factor of exactly -2 or 2.
//
//    Proof sketch: a subtree's height changes by at most one per structural change, and only
//    the subtrees on the path to the root contain the changed position.

use core::{
    cell::UnsafeCell, cmp::Ordering, fmt, marker::PhantomPinned, mem, ops::Not, pin::Pin,
    ptr::NonNull,
};
use std::borrow::Borrow;

use cordyceps::Linked;

#[macro_use]
mod tracing_helpers;

mod error;
mod info;
mod iter;
pub mod map;
pub mod set;
mod traverse;

#[cfg(any(test, feature = "model"))]
pub mod model;


pub use error::InvariantViolation;
pub use info::NodeInfo;
pub use iter::Iter;
pub use map::AvlMap;
pub use set::AvlSet;

pub trait TreeNode<L>: Linked<L> {
    type Key: Ord + fmt::Debug;

    fn key(&self) -> &Self::Key;
}

/// An intrusive AVL tree.
///
/// Every node caches the height of the subtree rooted at it. After each insertion or removal the
/// ancestors of the changed position are rebalanced bottom-up with single or double rotations,
/// so the heights of any node's two subtrees never differ by more than one.
pub struct AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    root: Link<T>,
    len: usize,
}

pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    height: i8,
    _unpin: PhantomPinned,
}

type Link<T> = Option<NonNull<T>>;

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<T> {
        AvlTree { root: None, len: 0 }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the height of the tree, or `-1` if the tree is empty.
    ///
    /// This reads the height cached at the root and completes in _O(1)_ time.
    pub fn height(&self) -> i32 {
        unsafe { i32::from(height_of(self.root)) }
    }

    /// Returns the balance factor of the root, or `0` if the tree is empty.
    pub fn balance_factor(&self) -> i32 {
        match self.root {
            Some(root) => unsafe { i32::from(balance_of(root)) },
            None => 0,
        }
    }

    /// Checks every invariant of the tree, returning the first violation found.
    ///
    /// This operation completes in _O(n)_ time and is meant for diagnostics; insertion and removal
    /// maintain the invariants incrementally.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        error::validate(self.root, self.len)
    }

    /// Returns `true` if every invariant of the tree holds.
    pub fn is_valid_avl(&self) -> bool {
        self.validate().is_ok()
    }

    #[doc(hidden)]
    #[track_caller]
    pub fn assert_invariants(&self) {
        if let Err(violation) = self.validate() {
            panic!("AVL invariant violated: {violation}");
        }
    }

    /// Returns `true` if the tree contains an item with the given key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.get_raw(key).is_some()
    }

    /// Returns a reference to the node corresponding to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    /// Returns a pinned mutable reference to the node corresponding to `key`.
    ///
    /// Callers must not change the node's key in a way that alters its ordering.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<Pin<&mut T>>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let mut ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_mut())) }
    }

    fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;

            unsafe {
                match key.cmp(cur.as_ref().key().borrow()) {
                    Ordering::Less => opt_cur = T::links(cur).as_ref().left(),
                    Ordering::Equal => return Some(cur),
                    Ordering::Greater => opt_cur = T::links(cur).as_ref().right(),
                }
            }
        }
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<Pin<&T>> {
        let root = self.root?;

        unsafe {
            let (first, _) = self.extreme_in_subtree(root, Dir::Left);
            Some(Pin::new_unchecked(first.as_ref()))
        }
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<Pin<&T>> {
        let root = self.root?;

        unsafe {
            let (last, _) = self.extreme_in_subtree(root, Dir::Right);
            Some(Pin::new_unchecked(last.as_ref()))
        }
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let root = self.root?;

        unsafe {
            let (first, _) = self.extreme_in_subtree(root, Dir::Left);
            Some(self.remove_at(first))
        }
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T::Handle> {
        let root = self.root?;

        unsafe {
            let (last, _) = self.extreme_in_subtree(root, Dir::Right);
            Some(self.remove_at(last))
        }
    }

    /// Returns an iterator over the elements of the tree, in ascending key order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    unsafe fn maybe_set_parent(&mut self, opt_node: Link<T>, parent: Link<T>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe { T::links(node).as_mut().set_parent(parent) };
    }

    #[inline]
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        match parent {
            Some(parent) => unsafe { self.replace_child(parent, old_child, new_child) },
            None => self.root = new_child,
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that the following conditions hold:
    // - `old_child` is a child node of `parent`.
    // - `new_child` is not a child node of `parent`.
    unsafe fn replace_child(
        &mut self,
        parent: NonNull<T>,
        old_child: NonNull<T>,
        new_child: Option<NonNull<T>>,
    ) {
        unsafe {
            let dir = self.which_child(parent, old_child);

            debug_assert_eq!(
                T::links(parent).as_ref().child(dir),
                Some(old_child),
                "`old_child` must be a child of `parent`"
            );
            debug_assert!(
                new_child.is_none() || T::links(parent).as_ref().child(!dir) != new_child,
                "`new_child` must not be a child of `parent`"
            );

            T::links(parent).as_mut().set_child(dir, new_child);
        }
    }

    // Performs a rotation, moving `up` up and its parent `down` down.
    //
    // - `down` becomes the `dir` child of `up`.
    // - `across` goes from the `dir` child of `up` to the `!dir` child of `down`.
    //
    // The heights of `down` and then `up` are recomputed, in that order, since `down` ends up
    // below `up`.
    unsafe fn rotate_at(&mut self, down: NonNull<T>, up: NonNull<T>) {
        unsafe {
            let dir = if T::links(down).as_ref().right() == Some(up) {
                Dir::Left
            } else {
                Dir::Right
            };

            debug_assert_eq!(T::links(up).as_ref().parent(), Some(down));
            trace_log!(pivot = ?down.as_ref().key(), direction = ?dir, "rotate");

            let across = T::links(up).as_ref().child(dir);
            T::links(down).as_mut().set_child(!dir, across);
            self.maybe_set_parent(across, Some(down));

            T::links(up).as_mut().set_child(dir, Some(down));
            let parent = T::links(down).as_mut().set_parent(Some(up));
            T::links(up).as_mut().set_parent(parent);

            self.replace_child_or_set_root(parent, down, Some(up));

            self.update_height(down);
            self.update_height(up);
        }
    }

    // Rotates `pivot` down to the right, raising its left child.
    #[inline]
    unsafe fn rotate_right(&mut self, pivot: NonNull<T>) {
        unsafe {
            if let Some(left) = T::links(pivot).as_ref().left() {
                self.rotate_at(pivot, left);
            }
        }
    }

    // Rotates `pivot` down to the left, raising its right child.
    #[inline]
    unsafe fn rotate_left(&mut self, pivot: NonNull<T>) {
        unsafe {
            if let Some(right) = T::links(pivot).as_ref().right() {
                self.rotate_at(pivot, right);
            }
        }
    }

    // Restores the AVL balance at `node`, assuming both of its subtrees are balanced and their
    // heights differ by at most two.
    unsafe fn rebalance(&mut self, node: NonNull<T>) {
        unsafe {
            self.update_height(node);

            let balance = balance_of(node);
            match balance {
                // Right subtree is too tall.
                -2 => {
                    trace_log!(key = ?node.as_ref().key(), balance, "rebalance");

                    if let Some(right) = T::links(node).as_ref().right() {
                        // Right-left case: straighten the chain first.
                        if balance_of(right) == 1 {
                            self.rotate_right(right);
                        }
                    }

                    self.rotate_left(node);
                }

                // Left subtree is too tall.
                2 => {
                    trace_log!(key = ?node.as_ref().key(), balance, "rebalance");

                    if let Some(left) = T::links(node).as_ref().left() {
                        // Left-right case.
                        if balance_of(left) == -1 {
                            self.rotate_left(left);
                        }
                    }

                    self.rotate_right(node);
                }

                _ => debug_assert!((-1..=1).contains(&balance)),
            }
        }
    }

    // Rebalances `start` and each of its ancestors, up to and including the root.
    //
    // A rotation at `node` makes its replacement `p(node)`, so the walk revisits that replacement
    // before ascending further. Its height is already correct and it is balanced, so the visit
    // only recomputes its height.
    unsafe fn rebalance_upward(&mut self, start: Link<T>) {
        let mut opt_cur = start;

        while let Some(cur) = opt_cur {
            unsafe {
                self.rebalance(cur);
                opt_cur = T::links(cur).as_ref().parent();
            }
        }
    }

    /// Inserts an item into the tree.
    ///
    /// If the tree already contains an item with an equal key, the tree is not modified and `item`
    /// is handed back to the caller.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, item: T::Handle) -> Option<T::Handle> {
        let ptr = T::into_ptr(item);

        unsafe { T::links(ptr).as_mut().clear() };

        let root = match self.root {
            Some(root) => root,
            None => {
                // Tree is empty. Set `item` as the root and return.
                self.root = Some(ptr);
                self.len += 1;
                return None;
            }
        };

        let mut parent = root;

        // Descend the tree, looking for a free slot.
        loop {
            let ordering = unsafe { ptr.as_ref().key().cmp(parent.as_ref().key()) };

            let dir = match ordering {
                Ordering::Less => Dir::Left,
                Ordering::Equal => {
                    debug_log!(key = ?unsafe { ptr.as_ref().key() }, "duplicate key rejected");
                    return Some(unsafe { T::from_ptr(ptr) });
                }
                Ordering::Greater => Dir::Right,
            };

            unsafe {
                let parent_links = T::links(parent).as_mut();
                match parent_links.child(dir) {
                    // Descend.
                    Some(child) => parent = child,

                    // Set `item` as child.
                    None => {
                        parent_links.set_child(dir, Some(ptr));
                        T::links(ptr).as_mut().set_parent(Some(parent));
                        break;
                    }
                }
            }
        }

        self.len += 1;

        // The new leaf is trivially balanced; every ancestor may not be.
        unsafe { self.rebalance_upward(Some(parent)) };

        None
    }

    // Returns the extreme node in the `dir` direction of the subtree.
    //
    // If the subtree root is not the extreme node, also returns the extreme node's parent.
    #[inline]
    unsafe fn extreme_in_subtree(
        &self,
        root: NonNull<T>,
        dir: Dir,
    ) -> (NonNull<T>, Option<NonNull<T>>) {
        let mut parent = None;
        let mut cur = root;

        while let Some(next) = unsafe { T::links(cur).as_ref().child(dir) } {
            parent = Some(cur);
            cur = next;
        }

        (cur, parent)
    }

    // Returns the minimum node in the subtree.
    //
    // If the subtree root is not the minimum, also returns the minimum node's parent.
    #[inline]
    unsafe fn min_in_subtree(&self, root: NonNull<T>) -> (NonNull<T>, Option<NonNull<T>>) {
        unsafe { self.extreme_in_subtree(root, Dir::Left) }
    }

    // Returns the in-order neighbour of `node` in the `dir` direction: the successor for
    // `Dir::Right`, the predecessor for `Dir::Left`.
    pub(crate) unsafe fn neighbour_raw(&self, node: NonNull<T>, dir: Dir) -> Link<T> {
        unsafe {
            if let Some(child) = T::links(node).as_ref().child(dir) {
                let (next, _) = self.extreme_in_subtree(child, !dir);
                return Some(next);
            }

            // Ascend until `cur` is reached from the opposite side.
            let mut cur = node;
            loop {
                let parent = T::links(cur).as_ref().parent()?;

                if self.which_child(parent, cur) == !dir {
                    return Some(parent);
                }

                cur = parent;
            }
        }
    }

    /// Removes the item with the given key from the tree and returns it.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let Some(node) = self.get_raw(key) else {
            debug_log!(len = self.len, "remove of absent key ignored");
            return None;
        };

        Some(unsafe { self.remove_at(node) })
    }

    /// Removes an arbitrary node from the tree.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`, and not any
    /// other tree.
    pub unsafe fn remove_at(&mut self, node: NonNull<T>) -> T::Handle {
        // There are three possible cases:
        //
        // 1. `node` has two children.
        //
        //    In this case `node`'s successor[^1] assumes `node`'s place, children and height. The
        //    successor's right child is elevated to replace it. The successor has no left child,
        //    so this is the same shape as copying the successor's key into `node` and then
        //    removing the successor by case 2 or 3.
        //
        // 2. `node` has one child.
        //
        //    The child is elevated to replace `node`. If `node` was the root, the child becomes
        //    the new root.
        //
        // 3. `node` is a leaf.
        //
        //    `node` is detached from its parent, or the tree becomes empty.
        //
        // In every case, only ancestors of the detached position can have become unbalanced, so
        // they are rebalanced bottom-up.
        //
        // [^1]: The successor of a node `a` is the least node in `a`'s right subtree.

        unsafe {
            let parent = T::links(node).as_ref().parent();
            let left = T::links(node).as_ref().left();
            let right = T::links(node).as_ref().right();

            let rebalance_from = match (left, right) {
                (Some(left), Some(right)) => {
                    let (successor, successor_parent) = self.min_in_subtree(right);

                    if let Some(successor_parent) = successor_parent {
                        // Elevate the successor's right child to replace it.
                        let successor_right = T::links(successor).as_ref().right();
                        T::links(successor_parent)
                            .as_mut()
                            .set_left(successor_right);
                        self.maybe_set_parent(successor_right, Some(successor_parent));

                        T::links(successor).as_mut().set_right(Some(right));
                        T::links(right).as_mut().set_parent(Some(successor));
                    }
                    // Otherwise the successor is `right`, and keeps its right subtree.

                    self.replace_child_or_set_root(parent, node, Some(successor));

                    // Transfer the position of `node` to `successor`.
                    let node_height = T::links(node).as_ref().height();
                    T::links(successor).as_mut().set_parent(parent);
                    T::links(successor).as_mut().set_height(node_height);
                    T::links(successor).as_mut().set_left(Some(left));
                    T::links(left).as_mut().set_parent(Some(successor));

                    Some(successor_parent.unwrap_or(successor))
                }

                (Some(child), None) | (None, Some(child)) => {
                    self.replace_child_or_set_root(parent, node, Some(child));
                    T::links(child).as_mut().set_parent(parent);

                    parent
                }

                (None, None) => {
                    self.replace_child_or_set_root(parent, node, None);

                    parent
                }
            };

            self.rebalance_upward(rebalance_from);

            T::links(node).as_mut().clear();
            self.len -= 1;

            T::from_ptr(node)
        }
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        let dropped = self.len;
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend to the minimum node.
                let (cur, parent) = self.min_in_subtree(cur);
                let parent = parent.or_else(|| T::links(cur).as_ref().parent());

                let right = T::links(cur).as_ref().right();

                // Elevate the node's right child (which may be None).
                self.replace_child_or_set_root(parent, cur, right);
                self.maybe_set_parent(right, parent);

                // Drop the node.
                T::links(cur).as_mut().clear();
                drop(T::from_ptr(cur));
                self.len -= 1;

                // If the node had no right child, climb to the parent. If the node had no parent,
                // the tree is empty.
                opt_cur = right.or(parent);
            }
        }

        if dropped > 0 {
            debug_log!(dropped, "cleared tree");
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len(), 0);
    }

    // Support methods ========================================================

    #[inline]
    unsafe fn update_height(&mut self, node: NonNull<T>) {
        unsafe {
            let links = T::links(node).as_mut();
            let height = 1 + height_of(links.left()).max(height_of(links.right()));
            links.set_height(height);
        }
    }

    #[inline]
    pub(crate) unsafe fn which_child(&self, parent: NonNull<T>, child: NonNull<T>) -> Dir {
        if unsafe { T::links(parent).as_ref().left() } == Some(child) {
            Dir::Left
        } else {
            Dir::Right
        }
    }
}

impl<T> Default for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

/// Returns the height of the pointed-to node, or `-1` for a missing node.
#[inline]
unsafe fn height_of<T: ?Sized>(node: Link<T>) -> i8
where
    T: Linked<Links<T>>,
{
    node.map(|n| unsafe { T::links(n).as_ref().height() })
        .unwrap_or(-1)
}

/// Returns `h(left) - h(right)` for the pointed-to node.
#[inline]
unsafe fn balance_of<T: ?Sized>(node: NonNull<T>) -> i8
where
    T: Linked<Links<T>>,
{
    unsafe {
        let links = T::links(node).as_ref();
        height_of(links.left()) - height_of(links.right())
    }
}

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                height: 0,
                _unpin: PhantomPinned,
            }),
        }
    }

    /// Returns `true` if this node is currently linked into a tree with other nodes.
    pub fn is_linked(&self) -> bool {
        self.parent().is_some() || !self.is_leaf()
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.left().is_none() && self.right().is_none()
    }

    #[inline]
    fn height(&self) -> i8 {
        unsafe { (*self.inner.get()).height }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    fn set_left(&mut self, left: Link<T>) -> Link<T> {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    fn set_right(&mut self, right: Link<T>) -> Link<T> {
        self.set_child(Dir::Right, right)
    }

    #[inline]
    fn set_height(&mut self, height: i8) {
        self.inner.get_mut().height = height;
    }

    // Resets the links to those of a detached leaf.
    #[inline]
    fn clear(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = None;
        inner.children = [None; 2];
        inner.height = 0;
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("parent", &self.parent())
            .field("left", &self.left())
            .field("right", &self.right())
            .field("height", &self.height())
            .finish()
    }
}

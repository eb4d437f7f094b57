//! Depth-first traversals.
//!
//! Recursion depth is bounded by the height of the tree, which is logarithmic in its length.

use crate::{AvlTree, Link, Links, TreeNode};

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Calls `f` on every element, in ascending key order.
    pub fn for_each_in_order<'a, F: FnMut(&'a T)>(&'a self, mut f: F) {
        unsafe { in_order(self.root, &mut f) }
    }

    /// Calls `f` on every element, in descending key order.
    pub fn for_each_reverse_in_order<'a, F: FnMut(&'a T)>(&'a self, mut f: F) {
        unsafe { reverse_in_order(self.root, &mut f) }
    }

    /// Calls `f` on every element, visiting each node before its left and then right subtree.
    pub fn for_each_pre_order<'a, F: FnMut(&'a T)>(&'a self, mut f: F) {
        unsafe { pre_order(self.root, &mut f) }
    }

    /// Calls `f` on every element, visiting each node after its left and then right subtree.
    pub fn for_each_post_order<'a, F: FnMut(&'a T)>(&'a self, mut f: F) {
        unsafe { post_order(self.root, &mut f) }
    }

    /// Walks the tree in pre-order, reporting missing children too.
    ///
    /// The walk stops at the effective depth bound, which is the smaller of `max_depth` and the
    /// height of the tree. `f` is called with the element, its depth (the root has depth 0) and
    /// the effective bound for every node, and with `None` for every missing child position down
    /// to and including that bound. Below a missing position both of its (also missing) child
    /// positions are reported, so every level up to the bound is reported in full.
    ///
    /// An empty tree reports nothing.
    pub fn structural_pre_order<'a, F>(&'a self, max_depth: usize, mut f: F)
    where
        F: FnMut(Option<&'a T>, usize, usize),
    {
        let Ok(height) = usize::try_from(self.height()) else {
            return;
        };

        let max_depth = max_depth.min(height);
        unsafe { structural_pre_order(self.root, 0, max_depth, &mut f) }
    }
}

unsafe fn in_order<'a, T, F>(link: Link<T>, f: &mut F)
where
    T: TreeNode<Links<T>> + ?Sized + 'a,
    F: FnMut(&'a T),
{
    let Some(node) = link else {
        return;
    };

    unsafe {
        let links = T::links(node).as_ref();
        in_order(links.left(), f);
        f(node.as_ref());
        in_order(links.right(), f);
    }
}

unsafe fn reverse_in_order<'a, T, F>(link: Link<T>, f: &mut F)
where
    T: TreeNode<Links<T>> + ?Sized + 'a,
    F: FnMut(&'a T),
{
    let Some(node) = link else {
        return;
    };

    unsafe {
        let links = T::links(node).as_ref();
        reverse_in_order(links.right(), f);
        f(node.as_ref());
        reverse_in_order(links.left(), f);
    }
}

unsafe fn pre_order<'a, T, F>(link: Link<T>, f: &mut F)
where
    T: TreeNode<Links<T>> + ?Sized + 'a,
    F: FnMut(&'a T),
{
    let Some(node) = link else {
        return;
    };

    unsafe {
        let links = T::links(node).as_ref();
        f(node.as_ref());
        pre_order(links.left(), f);
        pre_order(links.right(), f);
    }
}

unsafe fn post_order<'a, T, F>(link: Link<T>, f: &mut F)
where
    T: TreeNode<Links<T>> + ?Sized + 'a,
    F: FnMut(&'a T),
{
    let Some(node) = link else {
        return;
    };

    unsafe {
        let links = T::links(node).as_ref();
        post_order(links.left(), f);
        post_order(links.right(), f);
        f(node.as_ref());
    }
}

unsafe fn structural_pre_order<'a, T, F>(
    link: Link<T>,
    depth: usize,
    max_depth: usize,
    f: &mut F,
) where
    T: TreeNode<Links<T>> + ?Sized + 'a,
    F: FnMut(Option<&'a T>, usize, usize),
{
    if depth > max_depth {
        return;
    }

    unsafe {
        match link {
            Some(node) => {
                let links = T::links(node).as_ref();
                f(Some(node.as_ref()), depth, max_depth);
                structural_pre_order(links.left(), depth + 1, max_depth, f);
                structural_pre_order(links.right(), depth + 1, max_depth, f);
            }

            // Keep the slots of the missing subtree so that every level is complete.
            None => {
                f(None, depth, max_depth);
                structural_pre_order::<T, F>(None, depth + 1, max_depth, f);
                structural_pre_order::<T, F>(None, depth + 1, max_depth, f);
            }
        }
    }
}

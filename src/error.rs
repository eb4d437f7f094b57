use core::ptr::NonNull;

use thiserror::Error;

use crate::{height_of, Link, Links, TreeNode};

/// A broken invariant, as reported by [`AvlTree::validate`].
///
/// Keys are reported through their `Debug` representation.
///
/// [`AvlTree::validate`]: crate::AvlTree::validate
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("key {key} is out of order with respect to its ancestors")]
    Unordered { key: String },

    #[error("node {key} has balance factor {balance}")]
    Unbalanced { key: String, balance: i32 },

    #[error("node {key} caches height {cached} but has height {actual}")]
    StaleHeight {
        key: String,
        cached: i32,
        actual: i32,
    },

    #[error("a child of node {key} does not link back to it")]
    BrokenParentLink { key: String },

    #[error("the root has a parent link")]
    RootHasParent,

    #[error("tree reports {len} elements but {reachable} are reachable")]
    LengthMismatch { len: usize, reachable: usize },
}

fn describe<K: core::fmt::Debug + ?Sized>(key: &K) -> String {
    format!("{key:?}")
}

pub(crate) fn validate<T>(root: Link<T>, len: usize) -> Result<(), InvariantViolation>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    let reachable = match root {
        Some(root) => unsafe {
            if T::links(root).as_ref().parent().is_some() {
                return Err(InvariantViolation::RootHasParent);
            }

            validate_at(root, None, None)?.1
        },
        None => 0,
    };

    if reachable != len {
        return Err(InvariantViolation::LengthMismatch { len, reachable });
    }

    Ok(())
}

// Validates the subtree rooted at `node`, whose keys must lie strictly between `lower` and
// `upper`. Returns the recomputed height and the number of nodes in the subtree.
unsafe fn validate_at<'a, T>(
    node: NonNull<T>,
    lower: Option<&'a T::Key>,
    upper: Option<&'a T::Key>,
) -> Result<(i32, usize), InvariantViolation>
where
    T: TreeNode<Links<T>> + ?Sized + 'a,
{
    unsafe {
        let key = node.as_ref().key();

        if lower.is_some_and(|lower| key <= lower) || upper.is_some_and(|upper| key >= upper) {
            return Err(InvariantViolation::Unordered { key: describe(key) });
        }

        let links = T::links(node).as_ref();

        let mut heights = [-1; 2];
        let mut count = 1;

        for (i, (child, lower, upper)) in [
            (links.left(), lower, Some(key)),
            (links.right(), Some(key), upper),
        ]
        .into_iter()
        .enumerate()
        {
            let Some(child) = child else {
                continue;
            };

            if T::links(child).as_ref().parent() != Some(node) {
                return Err(InvariantViolation::BrokenParentLink { key: describe(key) });
            }

            let (height, size) = validate_at(child, lower, upper)?;
            heights[i] = height;
            count += size;
        }

        let [left, right] = heights;
        let actual = 1 + left.max(right);
        let cached = i32::from(height_of(Some(node)));

        if cached != actual {
            return Err(InvariantViolation::StaleHeight {
                key: describe(key),
                cached,
                actual,
            });
        }

        let balance = left - right;
        if !(-1..=1).contains(&balance) {
            return Err(InvariantViolation::Unbalanced {
                key: describe(key),
                balance,
            });
        }

        Ok((actual, count))
    }
}

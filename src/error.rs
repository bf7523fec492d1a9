//! Error type shared by every container in this crate.
//!
//! Lookups that may legitimately miss (`find`, `get`, `contains`) report
//! absence through their return value. Operations that need the element to
//! exist, and every dereference or movement of a [`Position`], report
//! failure through [`TreeError`].
//!
//! [`Position`]: crate::Position

use thiserror::Error;

/// Failure of a tree, map or set operation.
///
/// A failed operation never modifies the container.
///
/// # Examples
///
/// ```rust
/// use multitree::{OrderedMultiTree, TreeError};
///
/// let mut tree: OrderedMultiTree<i32, &str> = OrderedMultiTree::new();
/// assert_eq!(tree.erase(&1), Err(TreeError::NotFound));
/// assert_eq!(tree.entry(tree.end()), Err(TreeError::InvalidPosition));
/// assert_eq!(TreeError::NotFound.to_string(), "key not found");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum TreeError {
    /// No element has the requested key.
    #[error("key not found")]
    NotFound,
    /// The position is the end position, or its element has been erased.
    #[error("position does not refer to a live element")]
    InvalidPosition,
}

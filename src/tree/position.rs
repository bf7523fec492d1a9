//! Positions and cursors over an [`OrderedMultiTree`].
//!
//! A [`Position`] is a detached, `Copy` handle naming one element of a tree
//! or the end state one past the last element. It does not borrow the tree,
//! so it survives insertions and the erasure of *other* elements. Using a
//! position after its own element has been erased, or with a tree other than
//! the one that issued it, is detected and reported as
//! [`TreeError::InvalidPosition`]. A tree replaced by assignment counts as a
//! different tree.
//!
//! A [`Cursor`] pairs a position with a shared borrow of its tree and offers
//! prefix (`move_*`) and postfix (`step_*`) movement.

use std::fmt;

use super::OrderedMultiTree;
use super::node::NodeId;
use crate::TreeError;

// =============================================================================
// Position Definition
// =============================================================================

/// A handle to an element of an [`OrderedMultiTree`], or the end position.
///
/// Two positions are equal when they name the same element, or are both the
/// end position.
///
/// # Examples
///
/// ```rust
/// use multitree::{OrderedMultiTree, Position};
///
/// let mut tree = OrderedMultiTree::new();
/// tree.insert(2, "two");
/// tree.insert(1, "one");
///
/// let position = tree.begin();
/// assert_eq!(tree.entry(position), Ok((&1, &"one")));
///
/// let position = tree.next_position(position).unwrap();
/// assert_eq!(tree.entry(position), Ok((&2, &"two")));
///
/// assert_eq!(tree.next_position(position), Ok(Position::end()));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Position {
    node: Option<NodeId>,
}

impl Position {
    /// Returns the end position, one past the last element of any tree.
    #[inline]
    #[must_use]
    pub const fn end() -> Self {
        Self { node: None }
    }

    /// Returns `true` if this is the end position.
    #[inline]
    #[must_use]
    pub const fn is_end(self) -> bool {
        self.node.is_none()
    }

    #[inline]
    pub(crate) const fn at(id: NodeId) -> Self {
        Self { node: Some(id) }
    }

    #[inline]
    pub(crate) const fn from_node(node: Option<NodeId>) -> Self {
        Self { node }
    }

    #[inline]
    pub(crate) const fn node(self) -> Option<NodeId> {
        self.node
    }
}

impl Default for Position {
    #[inline]
    fn default() -> Self {
        Self::end()
    }
}

// =============================================================================
// Cursor Definition
// =============================================================================

/// A position bound to the tree it walks.
///
/// # Examples
///
/// ```rust
/// use multitree::OrderedMultiTree;
///
/// let tree: OrderedMultiTree<i32, char> =
///     [(1, 'a'), (2, 'b'), (3, 'c')].into_iter().collect();
///
/// let mut cursor = tree.cursor(tree.begin());
/// let before = cursor.step_next().unwrap();
/// assert_eq!(before.key(), Ok(&1));
/// assert_eq!(cursor.key(), Ok(&2));
///
/// cursor.move_next().unwrap();
/// assert_eq!(cursor.value(), Ok(&'c'));
///
/// cursor.move_next().unwrap();
/// assert!(cursor.is_end());
/// assert!(cursor.move_next().is_err());
/// ```
pub struct Cursor<'a, K, V> {
    tree: &'a OrderedMultiTree<K, V>,
    position: Position,
}

impl<'a, K, V> Cursor<'a, K, V> {
    pub(crate) const fn new(tree: &'a OrderedMultiTree<K, V>, position: Position) -> Self {
        Self { tree, position }
    }

    /// Returns the position the cursor is on.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Returns `true` if the cursor is past the last element.
    #[inline]
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.position.is_end()
    }

    /// Returns the key and value under the cursor.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidPosition`] if the cursor is at the end or its
    /// element has been erased.
    pub fn entry(&self) -> Result<(&'a K, &'a V), TreeError> {
        self.tree.entry(self.position)
    }

    /// Returns the key under the cursor.
    ///
    /// # Errors
    ///
    /// See [`entry`](Self::entry).
    pub fn key(&self) -> Result<&'a K, TreeError> {
        self.entry().map(|(key, _)| key)
    }

    /// Returns the value under the cursor.
    ///
    /// # Errors
    ///
    /// See [`entry`](Self::entry).
    pub fn value(&self) -> Result<&'a V, TreeError> {
        self.entry().map(|(_, value)| value)
    }

    /// Moves to the in-order successor (prefix increment).
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidPosition`] if the cursor is at the end or stale;
    /// the cursor does not move.
    pub fn move_next(&mut self) -> Result<(), TreeError> {
        self.position = self.tree.next_position(self.position)?;
        Ok(())
    }

    /// Moves to the in-order predecessor (prefix decrement).
    ///
    /// Moving back from the first element lands on the end position.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidPosition`] if the cursor is at the end or stale;
    /// the cursor does not move.
    pub fn move_prev(&mut self) -> Result<(), TreeError> {
        self.position = self.tree.prev_position(self.position)?;
        Ok(())
    }

    /// Moves to the successor and returns the cursor as it was before moving
    /// (postfix increment).
    ///
    /// # Errors
    ///
    /// See [`move_next`](Self::move_next).
    pub fn step_next(&mut self) -> Result<Self, TreeError> {
        let before = *self;
        self.move_next()?;
        Ok(before)
    }

    /// Moves to the predecessor and returns the cursor as it was before
    /// moving (postfix decrement).
    ///
    /// # Errors
    ///
    /// See [`move_prev`](Self::move_prev).
    pub fn step_prev(&mut self) -> Result<Self, TreeError> {
        let before = *self;
        self.move_prev()?;
        Ok(before)
    }
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Cursor<'_, K, V> {}

impl<K, V> PartialEq for Cursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.position == other.position
    }
}

impl<K, V> Eq for Cursor<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Cursor<'_, K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Cursor")
            .field("position", &self.position)
            .field("entry", &self.entry().ok())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

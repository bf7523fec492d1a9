//! Ordered multi-map based on an unbalanced binary search tree.
//!
//! This module provides [`OrderedMultiTree`], a mutable ordered container
//! that keeps every inserted key/value pair, including pairs whose keys
//! repeat.
//!
//! # Overview
//!
//! `OrderedMultiTree` is a plain binary search tree with parent links:
//!
//! - O(h) insert, erase, find, `equal_range`, `lower_bound`, `upper_bound`
//! - O(h) amortized successor / predecessor steps
//! - O(1) len and `is_empty`
//!
//! where h is the height of the tree. The tree never rebalances, so h
//! ranges from log N for random insertion orders up to N for sorted ones.
//!
//! # Examples
//!
//! ```rust
//! use multitree::OrderedMultiTree;
//!
//! let mut tree = OrderedMultiTree::new();
//! tree.insert(66, "sleeve");
//! tree.insert(1, "cat");
//! tree.insert(66, "fossil");
//!
//! // Duplicates are kept, in insertion order among equal keys
//! let entries: Vec<(&i32, &&str)> = tree.iter().collect();
//! assert_eq!(entries, vec![(&1, &"cat"), (&66, &"sleeve"), (&66, &"fossil")]);
//!
//! // The equal range spans both entries for 66
//! assert_eq!(tree.range_iter(&66).count(), 2);
//! ```
//!
//! # Internal Structure
//!
//! The tree maintains the following invariants:
//! 1. Every key in a node's left subtree is `<` the node's key
//! 2. Every key in a node's right subtree is `>=` the node's key
//! 3. Every child names its node as parent; only the root has no parent
//! 4. The stored length equals the number of nodes reachable from the root

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::iter::FromIterator;

use smallvec::SmallVec;

use super::iter::{IntoIter, Iter, IterMut};
use super::node::{Node, NodeArena, NodeId};
use super::position::{Cursor, Position};
use crate::TreeError;

/// Inline capacity of the explicit traversal stacks.
const STACK_INLINE_CAPACITY: usize = 32;

type TraversalStack<T> = SmallVec<[T; STACK_INLINE_CAPACITY]>;

// =============================================================================
// OrderedMultiTree Definition
// =============================================================================

/// An ordered container of key/value pairs that allows duplicate keys.
///
/// Keys must implement `Ord`. Entries are kept in non-decreasing key order;
/// entries with equal keys keep their insertion order.
///
/// Elements are addressed through detached [`Position`] handles, which play
/// the role of bidirectional iterators: they can be dereferenced with
/// [`entry`](Self::entry) and moved with
/// [`next_position`](Self::next_position) /
/// [`prev_position`](Self::prev_position). Borrowing iterators are
/// available through [`iter`](Self::iter) and friends.
///
/// # Time Complexity
///
/// | Operation                    | Complexity |
/// |------------------------------|------------|
/// | `new`                        | O(1)       |
/// | `insert`                     | O(h)       |
/// | `erase`                      | O(h)       |
/// | `find`                       | O(h)       |
/// | `equal_range`                | O(h)       |
/// | `min`/`max`                  | O(h + k)   |
/// | `next_position`/`prev_position` | O(h)    |
/// | `len`                        | O(1)       |
/// | `clear`                      | O(N)       |
///
/// # Examples
///
/// ```rust
/// use multitree::{OrderedMultiTree, TreeError};
///
/// let mut tree = OrderedMultiTree::new();
/// tree.insert(5, "a");
/// tree.insert(5, "b");
/// tree.insert(3, "c");
/// assert_eq!(tree.len(), 3);
///
/// assert_eq!(tree.erase(&5), Ok((5, "a")));
/// assert_eq!(tree.erase(&4), Err(TreeError::NotFound));
/// assert_eq!(tree.len(), 2);
/// ```
pub struct OrderedMultiTree<K, V> {
    /// Storage of every live node
    pub(crate) nodes: NodeArena<K, V>,
    /// Root node of the tree
    root: Option<NodeId>,
    /// Number of entries
    length: usize,
}

impl<K, V> OrderedMultiTree<K, V> {
    /// Creates a new empty tree.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use multitree::OrderedMultiTree;
    ///
    /// let tree: OrderedMultiTree<i32, String> = OrderedMultiTree::new();
    /// assert!(tree.is_empty());
    /// assert_eq!(tree.begin(), tree.end());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: NodeArena::new(),
            root: None,
            length: 0,
        }
    }

    /// Returns the number of entries in the tree.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the tree contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the position of the first entry in key order, or the end
    /// position if the tree is empty.
    #[must_use]
    pub fn begin(&self) -> Position {
        Position::from_node(self.root.map(|root| self.leftmost(root)))
    }

    /// Returns the end position.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> Position {
        Position::end()
    }

    /// Returns the position of the last entry in key order, or the end
    /// position if the tree is empty.
    #[must_use]
    pub fn last_position(&self) -> Position {
        Position::from_node(self.root.map(|root| self.rightmost(root)))
    }

    /// Dereferences a position.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidPosition`] if `position` is the end position or
    /// its entry has been erased.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use multitree::{OrderedMultiTree, TreeError};
    ///
    /// let mut tree = OrderedMultiTree::new();
    /// let position = tree.insert(1, "one");
    /// assert_eq!(tree.entry(position), Ok((&1, &"one")));
    ///
    /// tree.erase(&1).unwrap();
    /// assert_eq!(tree.entry(position), Err(TreeError::InvalidPosition));
    /// assert_eq!(tree.entry(tree.end()), Err(TreeError::InvalidPosition));
    /// ```
    pub fn entry(&self, position: Position) -> Result<(&K, &V), TreeError> {
        let node = position
            .node()
            .and_then(|id| self.nodes.get(id))
            .ok_or(TreeError::InvalidPosition)?;
        Ok((&node.key, &node.value))
    }

    /// Returns a mutable reference to the value at `position`.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidPosition`] if `position` is the end position or
    /// its entry has been erased.
    pub fn value_mut(&mut self, position: Position) -> Result<&mut V, TreeError> {
        position
            .node()
            .and_then(|id| self.nodes.get_mut(id))
            .map(|node| &mut node.value)
            .ok_or(TreeError::InvalidPosition)
    }

    /// Returns the position after `position` in key order (prefix
    /// increment). The successor of the last entry is the end position.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidPosition`] if `position` is the end position or
    /// its entry has been erased.
    pub fn next_position(&self, position: Position) -> Result<Position, TreeError> {
        let id = self.live_node(position)?;
        Ok(Position::from_node(self.successor(id)))
    }

    /// Returns the position before `position` in key order (prefix
    /// decrement). The predecessor of the first entry is the end position.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidPosition`] if `position` is the end position or
    /// its entry has been erased.
    pub fn prev_position(&self, position: Position) -> Result<Position, TreeError> {
        let id = self.live_node(position)?;
        Ok(Position::from_node(self.predecessor(id)))
    }

    /// Returns a cursor starting at `position`.
    #[inline]
    #[must_use]
    pub const fn cursor(&self, position: Position) -> Cursor<'_, K, V> {
        Cursor::new(self, position)
    }

    /// Returns the first entry in key order.
    #[must_use]
    pub fn first(&self) -> Option<(&K, &V)> {
        self.entry(self.begin()).ok()
    }

    /// Returns the last entry in key order.
    #[must_use]
    pub fn last(&self) -> Option<(&K, &V)> {
        self.entry(self.last_position()).ok()
    }

    /// Returns an in-order iterator over all entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use multitree::OrderedMultiTree;
    ///
    /// let tree: OrderedMultiTree<i32, &str> =
    ///     [(3, "c"), (1, "a"), (2, "b")].into_iter().collect();
    ///
    /// let keys: Vec<&i32> = tree.iter().map(|(key, _)| key).collect();
    /// assert_eq!(keys, vec![&1, &2, &3]);
    ///
    /// let reversed: Vec<&i32> = tree.iter().rev().map(|(key, _)| key).collect();
    /// assert_eq!(reversed, vec![&3, &2, &1]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(
            self,
            self.root.map(|root| self.leftmost(root)),
            self.root.map(|root| self.rightmost(root)),
            self.length,
        )
    }

    /// Returns an in-order iterator with mutable access to the values.
    ///
    /// Unlike [`iter`](Self::iter) this is not lazy: the in-order sequence of
    /// mutable borrows is collected before the first item is yielded, which
    /// walks the whole tree and allocates O(slot capacity) memory even if
    /// only `next()` is called once.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let order: Vec<usize> = self.iter_ids().map(NodeId::slot_index).collect();
        let mut by_slot: Vec<Option<(&K, &mut V)>> = Vec::new();
        for (index, node) in self.nodes.occupied_mut() {
            if by_slot.len() <= index {
                by_slot.resize_with(index + 1, || None);
            }
            by_slot[index] = Some((&node.key, &mut node.value));
        }
        let entries = order
            .into_iter()
            .filter_map(|index| by_slot.get_mut(index).and_then(Option::take))
            .collect();
        IterMut::new(entries)
    }

    /// Returns an in-order iterator over the keys. Repeated keys are yielded
    /// once per entry.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an in-order iterator over the values.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator {
        self.iter().map(|(_, value)| value)
    }

    /// Removes the entry at `position`.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidPosition`] if `position` is the end position or
    /// its entry has already been erased. The tree is left unchanged.
    pub fn erase_at(&mut self, position: Position) -> Result<(K, V), TreeError> {
        let id = self.live_node(position)?;
        let node = self.unlink(id);
        Ok((node.key, node.value))
    }

    /// Removes and returns the first entry in key order.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.erase_at(self.begin()).ok()
    }

    /// Removes and returns the last entry in key order.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.erase_at(self.last_position()).ok()
    }

    /// Removes every entry.
    ///
    /// Nodes are released children-first with an explicit stack, so clearing
    /// a degenerate (list-shaped) tree never recurses.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use multitree::OrderedMultiTree;
    ///
    /// let mut tree: OrderedMultiTree<i32, i32> = (0..1000).map(|key| (key, key)).collect();
    /// tree.clear();
    /// assert!(tree.is_empty());
    /// assert_eq!(tree.begin(), tree.end());
    /// ```
    pub fn clear(&mut self) {
        let released = self.release_post_order();
        tracing::debug!(released, "cleared tree");
    }

    /// Returns the number of nodes on the longest root-to-leaf path.
    ///
    /// An empty tree has height 0.
    #[must_use]
    pub fn height(&self) -> usize {
        let mut stack: TraversalStack<(NodeId, usize)> = SmallVec::new();
        stack.extend(self.root.map(|root| (root, 1)));
        let mut height = 0;
        while let Some((id, depth)) = stack.pop() {
            height = height.max(depth);
            let node = &self.nodes[id];
            stack.extend(node.left.map(|left| (left, depth + 1)));
            stack.extend(node.right.map(|right| (right, depth + 1)));
        }
        height
    }

    // -------------------------------------------------------------------------
    // Structural helpers
    // -------------------------------------------------------------------------

    /// Resolves a position to a live node.
    fn live_node(&self, position: Position) -> Result<NodeId, TreeError> {
        position
            .node()
            .filter(|&id| self.nodes.get(id).is_some())
            .ok_or(TreeError::InvalidPosition)
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.nodes[id].left {
            id = left;
        }
        id
    }

    fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let Some(right) = self.nodes[id].right {
            id = right;
        }
        id
    }

    /// In-order successor: the leftmost node of the right subtree, or else
    /// the first ancestor reached from a left child.
    pub(crate) fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self.nodes[id].right {
            return Some(self.leftmost(right));
        }
        let mut current = id;
        let mut parent = self.nodes[id].parent;
        while let Some(parent_id) = parent {
            if self.nodes[parent_id].right != Some(current) {
                break;
            }
            current = parent_id;
            parent = self.nodes[parent_id].parent;
        }
        parent
    }

    /// In-order predecessor, the mirror image of [`successor`](Self::successor).
    pub(crate) fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(left) = self.nodes[id].left {
            return Some(self.rightmost(left));
        }
        let mut current = id;
        let mut parent = self.nodes[id].parent;
        while let Some(parent_id) = parent {
            if self.nodes[parent_id].left != Some(current) {
                break;
            }
            current = parent_id;
            parent = self.nodes[parent_id].parent;
        }
        parent
    }

    fn iter_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.root.map(|root| self.leftmost(root)), |&id| {
            self.successor(id)
        })
    }

    /// Puts `replacement` into the slot of `target`'s parent that held
    /// `target`, and re-parents `replacement`. `target`'s own links are left
    /// untouched.
    fn splice(&mut self, target: NodeId, replacement: Option<NodeId>) {
        let parent = self.nodes[target].parent;
        match parent {
            None => self.root = replacement,
            Some(parent_id) => {
                let parent_node = &mut self.nodes[parent_id];
                if parent_node.left == Some(target) {
                    parent_node.left = replacement;
                } else {
                    parent_node.right = replacement;
                }
            }
        }
        if let Some(replacement_id) = replacement {
            self.nodes[replacement_id].parent = parent;
        }
    }

    /// Detaches `target` from the tree, restores every parent/child pair and
    /// only then releases the node.
    fn unlink(&mut self, target: NodeId) -> Node<K, V> {
        let (left, right) = {
            let node = &self.nodes[target];
            (node.left, node.right)
        };
        match (left, right) {
            (None, right) => {
                self.splice(target, right);
                tracing::trace!(case = "no_left_child", "erased node");
            }
            (Some(left), None) => {
                self.splice(target, Some(left));
                tracing::trace!(case = "no_right_child", "erased node");
            }
            (Some(left), Some(right)) => {
                let successor = self.leftmost(right);
                if successor != right {
                    let successor_right = self.nodes[successor].right;
                    self.splice(successor, successor_right);
                    self.nodes[successor].right = Some(right);
                    self.nodes[right].parent = Some(successor);
                }
                self.splice(target, Some(successor));
                self.nodes[successor].left = Some(left);
                self.nodes[left].parent = Some(successor);
                tracing::trace!(
                    case = "two_children",
                    successor_was_right_child = successor == right,
                    "erased node"
                );
            }
        }
        let node = self.nodes.remove(target);
        self.length -= 1;
        node
    }

    /// Releases every node children-first and empties the tree. Returns the
    /// number of released nodes.
    fn release_post_order(&mut self) -> usize {
        let mut stack: TraversalStack<(NodeId, bool)> = SmallVec::new();
        stack.extend(self.root.take().map(|root| (root, false)));
        let mut released = 0;
        while let Some((id, children_released)) = stack.pop() {
            if children_released {
                self.nodes.remove(id);
                released += 1;
                continue;
            }
            stack.push((id, true));
            let node = &self.nodes[id];
            stack.extend(node.right.map(|right| (right, false)));
            stack.extend(node.left.map(|left| (left, false)));
        }
        debug_assert_eq!(released, self.length, "length out of sync with nodes");
        self.length = 0;
        released
    }
}

impl<K: Ord, V> OrderedMultiTree<K, V> {
    /// Inserts a key-value pair and returns its position.
    ///
    /// An entry whose key equals existing keys is placed after all of them.
    /// Insertion never fails.
    ///
    /// # Complexity
    ///
    /// O(h)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use multitree::OrderedMultiTree;
    ///
    /// let mut tree = OrderedMultiTree::new();
    /// tree.insert(5, "a");
    /// let second = tree.insert(5, "b");
    ///
    /// assert_eq!(tree.len(), 2);
    /// assert_eq!(tree.entry(second), Ok((&5, &"b")));
    /// assert_eq!(tree.prev_position(second).map(|p| tree.entry(p)), Ok(Ok((&5, &"a"))));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Position {
        Position::at(self.insert_node(key, value))
    }

    pub(crate) fn insert_node(&mut self, key: K, value: V) -> NodeId {
        let Some(mut current) = self.root else {
            let id = self.nodes.allocate(Node::leaf(key, value, None));
            self.root = Some(id);
            self.length += 1;
            return id;
        };

        loop {
            let node = &self.nodes[current];
            let goes_right = key >= node.key;
            let child = if goes_right { node.right } else { node.left };
            match child {
                Some(next) => current = next,
                None => {
                    let id = self.nodes.allocate(Node::leaf(key, value, Some(current)));
                    let parent = &mut self.nodes[current];
                    if goes_right {
                        parent.right = Some(id);
                    } else {
                        parent.left = Some(id);
                    }
                    self.length += 1;
                    return id;
                }
            }
        }
    }

    /// Removes one entry with the given key and returns it.
    ///
    /// The removed entry is the first one met by descending from the root,
    /// which is the first entry with that key in key order.
    ///
    /// # Errors
    ///
    /// [`TreeError::NotFound`] if no entry has the key. The tree is left
    /// unchanged.
    ///
    /// # Complexity
    ///
    /// O(h)
    pub fn erase<Q>(&mut self, key: &Q) -> Result<(K, V), TreeError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.find_node(key).ok_or(TreeError::NotFound)?;
        let node = self.unlink(id);
        Ok((node.key, node.value))
    }

    /// Removes every entry with the given key and returns how many were
    /// removed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use multitree::OrderedMultiTree;
    ///
    /// let mut tree: OrderedMultiTree<i32, char> =
    ///     [(1, 'a'), (2, 'b'), (2, 'c'), (3, 'd')].into_iter().collect();
    /// assert_eq!(tree.erase_all(&2), 2);
    /// assert_eq!(tree.erase_all(&2), 0);
    /// assert_eq!(tree.len(), 2);
    /// ```
    pub fn erase_all<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut removed = 0;
        while let Some(id) = self.find_node(key) {
            self.unlink(id);
            removed += 1;
        }
        removed
    }

    /// Returns the position of an entry with the given key, or the end
    /// position if there is none.
    ///
    /// # Complexity
    ///
    /// O(h)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use multitree::OrderedMultiTree;
    ///
    /// let mut tree = OrderedMultiTree::new();
    /// tree.insert("apple".to_string(), 3);
    ///
    /// let position = tree.find("apple");
    /// assert_eq!(tree.entry(position).map(|(_, count)| *count), Ok(3));
    /// assert_eq!(tree.find("pear"), tree.end());
    /// ```
    #[must_use]
    pub fn find<Q>(&self, key: &Q) -> Position
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Position::from_node(self.find_node(key))
    }

    pub(crate) fn find_node<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.nodes[id];
            current = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    /// Returns the position of the first entry whose key is not less than
    /// `key`, or the end position.
    #[must_use]
    pub fn lower_bound<Q>(&self, key: &Q) -> Position
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut candidate = None;
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.nodes[id];
            if node.key.borrow() < key {
                current = node.right;
            } else {
                candidate = Some(id);
                current = node.left;
            }
        }
        Position::from_node(candidate)
    }

    /// Returns the position of the first entry whose key is greater than
    /// `key`, or the end position.
    #[must_use]
    pub fn upper_bound<Q>(&self, key: &Q) -> Position
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut candidate = None;
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.nodes[id];
            if node.key.borrow() > key {
                candidate = Some(id);
                current = node.left;
            } else {
                current = node.right;
            }
        }
        Position::from_node(candidate)
    }

    /// Returns the half-open range `[first, last)` of entries with the given
    /// key.
    ///
    /// When no entry has the key the range is empty and both positions name
    /// the first entry with a greater key, or the end position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use multitree::OrderedMultiTree;
    ///
    /// let tree: OrderedMultiTree<i32, &str> =
    ///     [(40, "a"), (60, "b"), (60, "c"), (70, "d")].into_iter().collect();
    ///
    /// let (first, last) = tree.equal_range(&60);
    /// assert_eq!(tree.entry(first), Ok((&60, &"b")));
    /// assert_eq!(tree.entry(last), Ok((&70, &"d")));
    ///
    /// let (first, last) = tree.equal_range(&50);
    /// assert_eq!(first, last);
    /// assert_eq!(tree.entry(first), Ok((&60, &"b")));
    /// ```
    #[must_use]
    pub fn equal_range<Q>(&self, key: &Q) -> (Position, Position)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        (self.lower_bound(key), self.upper_bound(key))
    }

    /// Returns an in-order iterator over the entries with the given key.
    #[must_use]
    pub fn range_iter<Q>(&self, key: &Q) -> Iter<'_, K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (first, last) = self.equal_range(key);
        let front = first.node();
        let back = match last.node() {
            Some(id) => self.predecessor(id),
            None => self.root.map(|root| self.rightmost(root)),
        };
        let remaining = std::iter::successors(front, |&id| self.successor(id))
            .take_while(|&id| Some(id) != last.node())
            .count();
        Iter::new(self, front, back, remaining)
    }

    /// Returns the number of entries with the given key.
    #[must_use]
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.range_iter(key).len()
    }

    /// Returns `true` if at least one entry has the given key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key).is_some()
    }

    /// Returns the value of the first entry with the given key.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key).map(|id| &self.nodes[id].value)
    }

    /// Returns a mutable reference to the value of the first entry with the
    /// given key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key).map(|id| &mut self.nodes[id].value)
    }

    /// Returns the position holding the smallest value among the entries with
    /// the given key. Ties go to the earliest entry in key order.
    ///
    /// # Errors
    ///
    /// [`TreeError::NotFound`] if no entry has the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use multitree::{OrderedMultiTree, TreeError};
    ///
    /// let tree: OrderedMultiTree<i32, i32> =
    ///     [(1, 30), (1, 10), (1, 20), (2, 5)].into_iter().collect();
    ///
    /// let position = tree.min(&1).unwrap();
    /// assert_eq!(tree.entry(position), Ok((&1, &10)));
    /// assert_eq!(tree.min(&3), Err(TreeError::NotFound));
    /// ```
    pub fn min<Q>(&self, key: &Q) -> Result<Position, TreeError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        V: PartialOrd,
    {
        self.select_in_range(key, |candidate, best| candidate < best)
    }

    /// Returns the position holding the largest value among the entries with
    /// the given key. Ties go to the earliest entry in key order.
    ///
    /// # Errors
    ///
    /// [`TreeError::NotFound`] if no entry has the key.
    pub fn max<Q>(&self, key: &Q) -> Result<Position, TreeError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        V: PartialOrd,
    {
        self.select_in_range(key, |candidate, best| candidate > best)
    }

    /// Scans the equal range of `key`, replacing the current pick only when
    /// `prefer` holds strictly.
    fn select_in_range<Q, F>(&self, key: &Q, prefer: F) -> Result<Position, TreeError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        F: Fn(&V, &V) -> bool,
    {
        let (first, last) = self.equal_range(key);
        if first == last {
            return Err(TreeError::NotFound);
        }
        let first_id = first.node().ok_or(TreeError::NotFound)?;
        let best = std::iter::successors(Some(first_id), |&id| self.successor(id))
            .take_while(|&id| Some(id) != last.node())
            .fold(first_id, |best, id| {
                if prefer(&self.nodes[id].value, &self.nodes[best].value) {
                    id
                } else {
                    best
                }
            });
        Ok(Position::at(best))
    }

    /// Checks every structural invariant of the tree: parent/child links are
    /// mutually consistent, left subtrees hold smaller keys, right subtrees
    /// hold keys that are not smaller, and the length matches the node count.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use multitree::OrderedMultiTree;
    ///
    /// let mut tree: OrderedMultiTree<i32, ()> = [5, 3, 8, 5, 1].into_iter().map(|key| (key, ())).collect();
    /// tree.erase(&5).unwrap();
    /// assert!(tree.is_well_formed());
    /// ```
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        if let Some(root) = self.root
            && self.nodes.get(root).is_none_or(|node| node.parent.is_some())
        {
            return false;
        }

        let mut stack: TraversalStack<NodeId> = SmallVec::new();
        stack.extend(self.root);
        let mut reachable = 0;
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                return false;
            };
            reachable += 1;
            for child in [node.left, node.right].into_iter().flatten() {
                if self.nodes.get(child).is_none_or(|child| child.parent != Some(id)) {
                    return false;
                }
                stack.push(child);
            }
            // The largest key on the left must be strictly smaller.
            if let Some(left) = node.left
                && self.nodes[self.rightmost(left)].key >= node.key
            {
                return false;
            }
        }
        if reachable != self.length {
            return false;
        }

        let mut ids = self.iter_ids();
        let Some(mut previous) = ids.next() else {
            return true;
        };
        for id in ids {
            if self.nodes[id].key < self.nodes[previous].key {
                return false;
            }
            previous = id;
        }
        true
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Default for OrderedMultiTree<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for OrderedMultiTree<K, V> {
    fn drop(&mut self) {
        self.release_post_order();
    }
}

/// Cloning re-inserts every entry of the source in key order, producing an
/// independent tree that need not share the source's shape.
impl<K: Clone + Ord, V: Clone> Clone for OrderedMultiTree<K, V> {
    fn clone(&self) -> Self {
        self.iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn clone_from(&mut self, source: &Self) {
        self.clear();
        for (key, value) in source {
            self.insert(key.clone(), value.clone());
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for OrderedMultiTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord, V> Extend<(K, V)> for OrderedMultiTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> IntoIterator for OrderedMultiTree<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, K, V> IntoIterator for &'a OrderedMultiTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut OrderedMultiTree<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Two trees are equal when their in-order entry sequences are equal,
/// whatever their shapes.
impl<K: PartialEq, V: PartialEq> PartialEq for OrderedMultiTree<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for OrderedMultiTree<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedMultiTree<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for OrderedMultiTree<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        let mut first = true;
        for (key, value) in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{key}: {value}")?;
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V> serde::Serialize for OrderedMultiTree<K, V>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut sequence = serializer.serialize_seq(Some(self.len()))?;
        for entry in self {
            sequence.serialize_element(&entry)?;
        }
        sequence.end()
    }
}

#[cfg(feature = "serde")]
struct OrderedMultiTreeVisitor<K, V> {
    marker: std::marker::PhantomData<(K, V)>,
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::de::Visitor<'de> for OrderedMultiTreeVisitor<K, V>
where
    K: serde::Deserialize<'de> + Ord,
    V: serde::Deserialize<'de>,
{
    type Value = OrderedMultiTree<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence of key-value pairs")
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut tree = OrderedMultiTree::new();
        while let Some((key, value)) = access.next_element()? {
            tree.insert(key, value);
        }
        Ok(tree)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::Deserialize<'de> for OrderedMultiTree<K, V>
where
    K: serde::Deserialize<'de> + Ord,
    V: serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(OrderedMultiTreeVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn keys_of<V>(tree: &OrderedMultiTree<i32, V>) -> Vec<i32> {
        tree.keys().copied().collect()
    }

    /// Builds
    ///
    /// ```text
    ///         50
    ///       /    \
    ///     30      70
    ///            /  \
    ///          60    90
    ///            \   /
    ///            65 80
    ///               /
    ///             75
    /// ```
    fn two_child_tree() -> OrderedMultiTree<i32, i32> {
        [50, 30, 70, 60, 90, 65, 80, 75]
            .into_iter()
            .map(|key| (key, key * 10))
            .collect()
    }

    // =========================================================================
    // Display Tests
    // =========================================================================

    #[rstest]
    fn test_display_empty_tree() {
        let tree: OrderedMultiTree<i32, String> = OrderedMultiTree::new();
        assert_eq!(format!("{tree}"), "{}");
    }

    #[rstest]
    fn test_display_with_duplicates() {
        let tree: OrderedMultiTree<i32, &str> =
            [(2, "b"), (1, "a"), (2, "c")].into_iter().collect();
        assert_eq!(format!("{tree}"), "{1: a, 2: b, 2: c}");
    }

    #[rstest]
    fn test_debug_lists_pairs() {
        let tree: OrderedMultiTree<i32, &str> = [(1, "a"), (1, "b")].into_iter().collect();
        assert_eq!(format!("{tree:?}"), r#"[(1, "a"), (1, "b")]"#);
    }

    // =========================================================================
    // Structure Tests
    // =========================================================================

    #[rstest]
    fn test_insert_links_parent() {
        let mut tree = OrderedMultiTree::new();
        let root = tree.insert(10, ());
        let child = tree.insert(5, ());
        let root_id = root.node().unwrap();
        let child_id = child.node().unwrap();

        assert_eq!(tree.nodes[child_id].parent, Some(root_id));
        assert_eq!(tree.nodes[root_id].left, Some(child_id));
        assert!(tree.is_well_formed());
    }

    #[rstest]
    fn test_duplicate_goes_right() {
        let mut tree = OrderedMultiTree::new();
        let first = tree.insert(10, 'a').node().unwrap();
        let second = tree.insert(10, 'b').node().unwrap();
        assert_eq!(tree.nodes[first].right, Some(second));
    }

    #[rstest]
    fn test_erase_leaf() {
        let mut tree = two_child_tree();
        assert_eq!(tree.erase(&75), Ok((75, 750)));
        assert_eq!(keys_of(&tree), vec![30, 50, 60, 65, 70, 80, 90]);
        assert!(tree.is_well_formed());
    }

    #[rstest]
    fn test_erase_node_with_only_right_child() {
        let mut tree = two_child_tree();
        tree.erase(&60).unwrap();
        assert_eq!(keys_of(&tree), vec![30, 50, 65, 70, 75, 80, 90]);
        assert!(tree.is_well_formed());
    }

    #[rstest]
    fn test_erase_node_with_only_left_child() {
        let mut tree = two_child_tree();
        tree.erase(&90).unwrap();
        assert_eq!(keys_of(&tree), vec![30, 50, 60, 65, 70, 75, 80]);
        assert!(tree.is_well_formed());
    }

    #[rstest]
    fn test_erase_two_children_successor_is_right_child() {
        let mut tree: OrderedMultiTree<i32, ()> =
            [20, 10, 30, 40].into_iter().map(|key| (key, ())).collect();
        tree.erase(&20).unwrap();

        let root = tree.root.unwrap();
        assert_eq!(tree.nodes[root].key, 30);
        assert_eq!(keys_of(&tree), vec![10, 30, 40]);
        assert!(tree.is_well_formed());
    }

    #[rstest]
    fn test_erase_two_children_deep_successor() {
        let mut tree = two_child_tree();
        tree.erase(&70).unwrap();

        // 75 is the leftmost node under 90 and is promoted into 70's place.
        let root = tree.root.unwrap();
        let promoted = tree.nodes[root].right.unwrap();
        assert_eq!(tree.nodes[promoted].key, 75);
        assert_eq!(keys_of(&tree), vec![30, 50, 60, 65, 75, 80, 90]);
        assert_eq!(tree.len(), 7);
        assert!(tree.is_well_formed());
    }

    #[rstest]
    fn test_erase_root_until_empty() {
        let mut tree = two_child_tree();
        while let Some(root) = tree.root {
            let key = tree.nodes[root].key;
            tree.erase(&key).unwrap();
            assert!(tree.is_well_formed());
        }
        assert!(tree.is_empty());
        assert_eq!(tree.begin(), tree.end());
    }

    #[rstest]
    fn test_failed_erase_leaves_tree_unchanged() {
        let mut tree = two_child_tree();
        let before = keys_of(&tree);
        assert_eq!(tree.erase(&55), Err(TreeError::NotFound));
        assert_eq!(keys_of(&tree), before);
        assert_eq!(tree.len(), 8);
    }

    #[rstest]
    fn test_erase_at_stale_position() {
        let mut tree = two_child_tree();
        let position = tree.find(&60);
        tree.erase_at(position).unwrap();
        assert_eq!(tree.erase_at(position), Err(TreeError::InvalidPosition));
        assert_eq!(tree.len(), 7);
    }

    #[rstest]
    fn test_stale_position_not_revived_by_slot_reuse() {
        let mut tree = OrderedMultiTree::new();
        let stale = tree.insert(1, "one");
        tree.erase(&1).unwrap();
        let fresh = tree.insert(1, "uno");

        assert_ne!(stale, fresh);
        assert_eq!(tree.entry(stale), Err(TreeError::InvalidPosition));
        assert_eq!(tree.entry(fresh), Ok((&1, &"uno")));
    }

    // =========================================================================
    // Navigation Tests
    // =========================================================================

    #[rstest]
    fn test_successor_walks_up_from_right_spine() {
        let tree = two_child_tree();
        let position = tree.find(&65);
        let next = tree.next_position(position).unwrap();
        assert_eq!(tree.entry(next), Ok((&70, &700)));
    }

    #[rstest]
    fn test_successor_of_last_is_end() {
        let tree = two_child_tree();
        assert_eq!(tree.next_position(tree.last_position()), Ok(tree.end()));
    }

    #[rstest]
    fn test_predecessor_walks_up_from_left_spine() {
        let tree = two_child_tree();
        let position = tree.find(&75);
        let previous = tree.prev_position(position).unwrap();
        assert_eq!(tree.entry(previous), Ok((&70, &700)));
    }

    #[rstest]
    fn test_end_position_cannot_move() {
        let tree = two_child_tree();
        assert_eq!(
            tree.next_position(tree.end()),
            Err(TreeError::InvalidPosition)
        );
        assert_eq!(
            tree.prev_position(tree.end()),
            Err(TreeError::InvalidPosition)
        );
    }

    #[rstest]
    fn test_value_mut_through_position() {
        let mut tree = two_child_tree();
        let position = tree.find(&80);
        *tree.value_mut(position).unwrap() = 0;
        assert_eq!(tree.get(&80), Some(&0));
        assert_eq!(tree.value_mut(tree.end()), Err(TreeError::InvalidPosition));
    }

    // =========================================================================
    // Range Tests
    // =========================================================================

    #[rstest]
    #[case(10, 0)]
    #[case(60, 3)]
    #[case(95, 0)]
    #[case(70, 1)]
    fn test_count(#[case] key: i32, #[case] expected: usize) {
        let tree: OrderedMultiTree<i32, ()> =
            [50, 60, 60, 70, 60, 40].into_iter().map(|key| (key, ())).collect();
        assert_eq!(tree.count(&key), expected);
    }

    #[rstest]
    fn test_equal_range_below_all_keys() {
        let tree = two_child_tree();
        let (first, last) = tree.equal_range(&1);
        assert_eq!(first, last);
        assert_eq!(first, tree.begin());
    }

    #[rstest]
    fn test_equal_range_above_all_keys() {
        let tree = two_child_tree();
        assert_eq!(tree.equal_range(&100), (tree.end(), tree.end()));
    }

    #[rstest]
    fn test_equal_range_on_empty_tree() {
        let tree: OrderedMultiTree<i32, ()> = OrderedMultiTree::new();
        assert_eq!(tree.equal_range(&1), (tree.end(), tree.end()));
        assert_eq!(tree.range_iter(&1).count(), 0);
    }

    #[rstest]
    fn test_range_iter_reverse() {
        let tree: OrderedMultiTree<i32, char> =
            [(1, 'a'), (2, 'b'), (2, 'c'), (2, 'd'), (3, 'e')]
                .into_iter()
                .collect();
        let values: String = tree.range_iter(&2).rev().map(|(_, value)| *value).collect();
        assert_eq!(values, "dcb");
    }

    #[rstest]
    fn test_max_ties_prefer_first() {
        let tree: OrderedMultiTree<i32, i32> = [(1, 5), (1, 9), (1, 9)].into_iter().collect();
        let second = tree.next_position(tree.find(&1)).unwrap();
        assert_eq!(tree.max(&1), Ok(second));
    }

    #[rstest]
    fn test_min_ties_prefer_first() {
        let tree: OrderedMultiTree<i32, i32> = [(1, 2), (1, 2), (0, 0)].into_iter().collect();
        let position = tree.min(&1).unwrap();
        assert_eq!(position, tree.find(&1));
    }

    // =========================================================================
    // Lifecycle Tests
    // =========================================================================

    #[rstest]
    fn test_clear_degenerate_tree() {
        let mut tree: OrderedMultiTree<i32, i32> = (0..10_000).map(|key| (key, key)).collect();
        assert_eq!(tree.height(), 10_000);
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert!(tree.is_well_formed());
    }

    #[rstest]
    fn test_clone_from_replaces_contents() {
        let source = two_child_tree();
        let mut target: OrderedMultiTree<i32, i32> = [(1, 1)].into_iter().collect();
        target.clone_from(&source);
        assert_eq!(target, source);
        assert!(target.is_well_formed());
    }

    #[rstest]
    fn test_take_leaves_source_empty() {
        let mut source = two_child_tree();
        let moved = std::mem::take(&mut source);
        assert!(source.is_empty());
        assert_eq!(source.begin(), source.end());
        assert_eq!(moved.len(), 8);
    }

    #[rstest]
    fn test_pop_first_and_last() {
        let mut tree = two_child_tree();
        assert_eq!(tree.pop_first(), Some((30, 300)));
        assert_eq!(tree.pop_last(), Some((90, 900)));
        assert_eq!(tree.first(), Some((&50, &500)));
        assert_eq!(tree.last(), Some((&80, &800)));
        assert!(tree.is_well_formed());
    }
}

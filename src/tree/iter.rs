//! Iterators over [`OrderedMultiTree`].
//!
//! All iterators walk the tree purely by shape: forward steps follow the
//! in-order successor, backward steps the in-order predecessor.

use std::iter::FusedIterator;

use super::OrderedMultiTree;
use super::node::NodeId;

// =============================================================================
// Borrowing Iterator
// =============================================================================

/// An in-order iterator over the entries of an [`OrderedMultiTree`].
///
/// Returned by [`OrderedMultiTree::iter`] and
/// [`OrderedMultiTree::range_iter`].
pub struct Iter<'a, K, V> {
    tree: &'a OrderedMultiTree<K, V>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) const fn new(
        tree: &'a OrderedMultiTree<K, V>,
        front: Option<NodeId>,
        back: Option<NodeId>,
        remaining: usize,
    ) -> Self {
        Self {
            tree,
            front,
            back,
            remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        self.remaining -= 1;
        self.front = self.tree.successor(id);
        let node = &self.tree.nodes[id];
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        self.remaining -= 1;
        self.back = self.tree.predecessor(id);
        let node = &self.tree.nodes[id];
        Some((&node.key, &node.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

// =============================================================================
// Mutable Iterator
// =============================================================================

/// An in-order iterator yielding shared keys and mutable values.
///
/// Returned by [`OrderedMultiTree::iter_mut`]. Keys stay immutable so the
/// ordering invariant cannot be broken through this iterator.
pub struct IterMut<'a, K, V> {
    entries: std::vec::IntoIter<(&'a K, &'a mut V)>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(entries: Vec<(&'a K, &'a mut V)>) -> Self {
        Self {
            entries: entries.into_iter(),
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.entries.next_back()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {
    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

// =============================================================================
// Owning Iterator
// =============================================================================

/// An owning in-order iterator over the entries of an [`OrderedMultiTree`].
///
/// Each step detaches the current extreme node from the tree, so no entry is
/// cloned.
pub struct IntoIter<K, V> {
    tree: OrderedMultiTree<K, V>,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) const fn new(tree: OrderedMultiTree<K, V>) -> Self {
        Self { tree }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.tree.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.tree.len(), Some(self.tree.len()))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.tree.pop_last()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {
    fn len(&self) -> usize {
        self.tree.len()
    }
}

impl<K, V> FusedIterator for IntoIter<K, V> {}

//! Ordered map with unique keys.
//!
//! [`UniqueMap`] is a thin policy layer over [`OrderedMultiTree`]: inserting
//! a key that is already present overwrites its value in place instead of
//! adding a second entry. Every other operation delegates to the tree, and
//! the tree's positions, cursors and iterators are re-exposed unchanged.
//!
//! # Examples
//!
//! ```rust
//! use multitree::UniqueMap;
//!
//! let mut map = UniqueMap::new();
//! assert_eq!(map.insert(3, "x"), None);
//! assert_eq!(map.insert(3, "y"), Some("x"));
//!
//! assert_eq!(map.len(), 1);
//! assert_eq!(map.get(&3), Some(&"y"));
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::iter::FromIterator;

use super::iter::{IntoIter, Iter, IterMut};
use super::multitree::OrderedMultiTree;
use super::position::{Cursor, Position};
use crate::TreeError;

/// An ordered map in which every key appears at most once.
///
/// # Examples
///
/// ```rust
/// use multitree::{TreeError, UniqueMap};
///
/// let mut scores: UniqueMap<String, u32> = UniqueMap::new();
/// *scores.get_or_insert_default("alice".to_string()) += 10;
/// *scores.get_or_insert_default("alice".to_string()) += 5;
///
/// assert_eq!(scores.value_of("alice"), Ok(&15));
/// assert_eq!(scores.value_of("bob"), Err(TreeError::NotFound));
/// ```
pub struct UniqueMap<K, V> {
    tree: OrderedMultiTree<K, V>,
}

impl<K, V> UniqueMap<K, V> {
    /// Creates a new empty map.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: OrderedMultiTree::new(),
        }
    }

    /// Returns the number of entries in the map.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the position of the entry with the smallest key.
    #[must_use]
    pub fn begin(&self) -> Position {
        self.tree.begin()
    }

    /// Returns the end position.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> Position {
        self.tree.end()
    }

    /// Dereferences a position.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidPosition`] if `position` is the end position or
    /// its entry has been erased.
    pub fn entry(&self, position: Position) -> Result<(&K, &V), TreeError> {
        self.tree.entry(position)
    }

    /// Returns the position after `position` in key order.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidPosition`] if `position` is the end position or
    /// its entry has been erased.
    pub fn next_position(&self, position: Position) -> Result<Position, TreeError> {
        self.tree.next_position(position)
    }

    /// Returns the position before `position` in key order.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidPosition`] if `position` is the end position or
    /// its entry has been erased.
    pub fn prev_position(&self, position: Position) -> Result<Position, TreeError> {
        self.tree.prev_position(position)
    }

    /// Returns a cursor starting at `position`.
    #[must_use]
    pub const fn cursor(&self, position: Position) -> Cursor<'_, K, V> {
        self.tree.cursor(position)
    }

    /// Returns an iterator over the entries in key order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.tree.iter()
    }

    /// Returns an iterator over the entries in key order with mutable
    /// values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.tree.iter_mut()
    }

    /// Returns an iterator over the keys in order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator {
        self.tree.keys()
    }

    /// Returns an iterator over the values in key order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator {
        self.tree.values()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Borrows the underlying tree.
    #[inline]
    #[must_use]
    pub const fn as_tree(&self) -> &OrderedMultiTree<K, V> {
        &self.tree
    }
}

impl<K: Ord, V> UniqueMap<K, V> {
    /// Inserts a key-value pair.
    ///
    /// If the key is already present its value is replaced in place and the
    /// previous value is returned; otherwise a new entry is added.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.tree.get_mut(&key) {
            return Some(std::mem::replace(slot, value));
        }
        self.tree.insert(key, value);
        None
    }

    /// Removes the entry with the given key and returns its value.
    ///
    /// # Errors
    ///
    /// [`TreeError::NotFound`] if the key is absent.
    pub fn erase<Q>(&mut self, key: &Q) -> Result<V, TreeError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.erase(key).map(|(_, value)| value)
    }

    /// Returns the position of the entry with the given key, or the end
    /// position.
    #[must_use]
    pub fn find<Q>(&self, key: &Q) -> Position
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find(key)
    }

    /// Returns `true` if the map contains the key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains_key(key)
    }

    /// Returns the value for the key, if present.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get(key)
    }

    /// Returns a mutable reference to the value for the key, if present.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get_mut(key)
    }

    /// Read-only indexed access.
    ///
    /// # Errors
    ///
    /// [`TreeError::NotFound`] if the key is absent. Nothing is inserted.
    pub fn value_of<Q>(&self, key: &Q) -> Result<&V, TreeError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get(key).ok_or(TreeError::NotFound)
    }

    /// Mutable indexed access: returns the value for `key`, first inserting
    /// `V::default()` if the key is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let id = match self.tree.find_node(&key) {
            Some(id) => id,
            None => self.tree.insert_node(key, V::default()),
        };
        &mut self.tree.nodes[id].value
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Default for UniqueMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Ord, V: Clone> Clone for UniqueMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.tree.clone_from(&source.tree);
    }
}

/// Later pairs overwrite earlier pairs with the same key.
impl<K: Ord, V> FromIterator<(K, V)> for UniqueMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for UniqueMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> IntoIterator for UniqueMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.tree.into_iter()
    }
}

impl<'a, K, V> IntoIterator for &'a UniqueMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for UniqueMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl<K: Eq, V: Eq> Eq for UniqueMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for UniqueMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for UniqueMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.tree, formatter)
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V> serde::Serialize for UniqueMap<K, V>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct UniqueMapVisitor<K, V> {
    marker: std::marker::PhantomData<(K, V)>,
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::de::Visitor<'de> for UniqueMapVisitor<K, V>
where
    K: serde::Deserialize<'de> + Ord,
    V: serde::Deserialize<'de>,
{
    type Value = UniqueMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut map = UniqueMap::new();
        while let Some((key, value)) = access.next_entry()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::Deserialize<'de> for UniqueMap<K, V>
where
    K: serde::Deserialize<'de> + Ord,
    V: serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(UniqueMapVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

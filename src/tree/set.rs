//! Ordered set of unique elements.
//!
//! [`UniqueSet`] stores each element as both key and value of a
//! [`UniqueMap`], so it inherits the map's overwrite-on-insert policy and the
//! tree's positions and in-order traversal.
//!
//! # Examples
//!
//! ```rust
//! use multitree::UniqueSet;
//!
//! let mut set = UniqueSet::new();
//! assert!(set.insert(3));
//! assert!(set.insert(1));
//! assert!(!set.insert(3));
//!
//! assert!(set.contains(&1));
//! assert!(!set.contains(&2));
//!
//! let sorted: Vec<&i32> = set.iter().collect();
//! assert_eq!(sorted, vec![&1, &3]);
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::iter::FromIterator;

use super::map::UniqueMap;
use super::position::{Cursor, Position};
use crate::TreeError;

/// An ordered set in which every element appears at most once.
pub struct UniqueSet<T> {
    map: UniqueMap<T, T>,
}

impl<T> UniqueSet<T> {
    /// Creates a new empty set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: UniqueMap::new(),
        }
    }

    /// Returns the number of elements in the set.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the set contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the position of the smallest element.
    #[must_use]
    pub fn begin(&self) -> Position {
        self.map.begin()
    }

    /// Returns the end position.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> Position {
        self.map.end()
    }

    /// Dereferences a position.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidPosition`] if `position` is the end position or
    /// its element has been erased.
    pub fn element(&self, position: Position) -> Result<&T, TreeError> {
        self.map.entry(position).map(|(element, _)| element)
    }

    /// Returns the position after `position` in order.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidPosition`] if `position` is the end position or
    /// its element has been erased.
    pub fn next_position(&self, position: Position) -> Result<Position, TreeError> {
        self.map.next_position(position)
    }

    /// Returns the position before `position` in order. The predecessor of
    /// the smallest element is the end position.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidPosition`] if `position` is the end position or
    /// its element has been erased.
    pub fn prev_position(&self, position: Position) -> Result<Position, TreeError> {
        self.map.prev_position(position)
    }

    /// Returns a cursor starting at `position`. The cursor's key and value
    /// are both the element.
    #[must_use]
    pub const fn cursor(&self, position: Position) -> Cursor<'_, T, T> {
        self.map.cursor(position)
    }

    /// Returns the smallest element.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.map.as_tree().first().map(|(element, _)| element)
    }

    /// Returns the largest element.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.map.as_tree().last().map(|(element, _)| element)
    }

    /// Returns an iterator over the elements in order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.map.keys()
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}

impl<T: Clone + Ord> UniqueSet<T> {
    /// Adds an element. Returns `true` if it was not already present.
    pub fn insert(&mut self, value: T) -> bool {
        self.map.insert(value.clone(), value).is_none()
    }

    /// Removes an element and returns it.
    ///
    /// # Errors
    ///
    /// [`TreeError::NotFound`] if the element is absent.
    pub fn erase<Q>(&mut self, value: &Q) -> Result<T, TreeError>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.map.erase(value)
    }

    /// Returns the position of the element, or the end position.
    #[must_use]
    pub fn find<Q>(&self, value: &Q) -> Position
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.map.find(value)
    }

    /// Returns `true` if the set contains the element.
    #[must_use]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        !self.find(value).is_end()
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Default for UniqueSet<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Ord> Clone for UniqueSet<T> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.map.clone_from(&source.map);
    }
}

impl<T: Clone + Ord> FromIterator<T> for UniqueSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T: Clone + Ord> Extend<T> for UniqueSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T> IntoIterator for UniqueSet<T> {
    type Item = T;
    type IntoIter = std::iter::Map<super::iter::IntoIter<T, T>, fn((T, T)) -> T>;

    fn into_iter(self) -> Self::IntoIter {
        let element_of: fn((T, T)) -> T = |(element, _)| element;
        self.map.into_iter().map(element_of)
    }
}

impl<T: PartialEq> PartialEq for UniqueSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<T: Eq> Eq for UniqueSet<T> {}

impl<T: fmt::Debug> fmt::Debug for UniqueSet<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for UniqueSet<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        let mut first = true;
        for element in self.iter() {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for UniqueSet<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for UniqueSet<T>
where
    T: serde::Deserialize<'de> + Clone + Ord,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let elements: Vec<T> = Vec::deserialize(deserializer)?;
        Ok(elements.into_iter().collect())
    }
}

// =============================================================================
// Tests
// =============================================================================

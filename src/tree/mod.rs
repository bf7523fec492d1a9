//! Ordered containers built on an unbalanced binary search tree.
//!
//! - [`OrderedMultiTree`]: ordered key/value container that keeps duplicate
//!   keys
//! - [`UniqueMap`]: ordered map; inserting an existing key overwrites its
//!   value
//! - [`UniqueSet`]: ordered set of unique elements
//!
//! The map is a policy layer over the tree and the set is a policy layer
//! over the map. All three share the tree's [`Position`] handles, its
//! [`Cursor`] and its in-order iterators.
//!
//! # Examples
//!
//! ## `OrderedMultiTree`
//!
//! ```rust
//! use multitree::OrderedMultiTree;
//!
//! let mut tree = OrderedMultiTree::new();
//! tree.insert(5, "a");
//! tree.insert(5, "b");
//! tree.insert(1, "c");
//!
//! let (first, last) = tree.equal_range(&5);
//! assert_eq!(tree.entry(first), Ok((&5, &"a")));
//! assert_eq!(last, tree.end());
//! ```
//!
//! ## `UniqueMap`
//!
//! ```rust
//! use multitree::UniqueMap;
//!
//! let mut map = UniqueMap::new();
//! map.insert("key", 1);
//! map.insert("key", 2);
//! assert_eq!(map.len(), 1);
//! assert_eq!(map.get("key"), Some(&2));
//! ```
//!
//! ## `UniqueSet`
//!
//! ```rust
//! use multitree::UniqueSet;
//!
//! let set: UniqueSet<i32> = [3, 1, 3, 2].into_iter().collect();
//! assert_eq!(set.len(), 3);
//! assert!(set.contains(&2));
//! ```

mod iter;
mod map;
mod multitree;
mod node;
mod position;
mod set;

pub use iter::IntoIter;
pub use iter::Iter;
pub use iter::IterMut;
pub use map::UniqueMap;
pub use multitree::OrderedMultiTree;
pub use position::Cursor;
pub use position::Position;
pub use set::UniqueSet;

static_assertions::assert_impl_all!(OrderedMultiTree<i32, String>: Send, Sync, Default, Clone);
static_assertions::assert_impl_all!(UniqueMap<String, Vec<u8>>: Send, Sync, Default, Clone);
static_assertions::assert_impl_all!(UniqueSet<i64>: Send, Sync, Default, Clone);
static_assertions::assert_impl_all!(Position: Copy, Send, Sync, Eq, std::hash::Hash);
static_assertions::assert_not_impl_any!(OrderedMultiTree<std::rc::Rc<i32>, ()>: Send, Sync);

//! # multitree
//!
//! Ordered in-memory containers built on an unbalanced binary search tree
//! with parent links.
//!
//! ## Overview
//!
//! - **`OrderedMultiTree`**: ordered key/value container that keeps
//!   duplicate keys, with bidirectional in-order positions and equal-range
//!   queries
//! - **`UniqueMap`**: ordered map with overwrite-on-insert semantics
//! - **`UniqueSet`**: ordered set with direct membership tests
//!
//! Nodes live in an arena owned by the tree and link to each other through
//! generation-checked handles, so the crate contains no `unsafe` code and a
//! [`Position`] whose element was erased is reported as
//! [`TreeError::InvalidPosition`] instead of being dereferenced.
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` for all containers
//!
//! ## Logging
//!
//! Structural events are emitted through [`tracing`] at `trace` (each erase
//! and the splice it performed) and `debug` (whole-tree teardown) levels.
//! The crate never installs a subscriber.
//!
//! ## Example
//!
//! ```rust
//! use multitree::prelude::*;
//!
//! let mut tree = OrderedMultiTree::new();
//! tree.insert(2, "dog");
//! tree.insert(1, "cat");
//! tree.insert(2, "wolf");
//! tree.erase(&2)?;
//!
//! let entries: Vec<(&i32, &&str)> = tree.iter().collect();
//! assert_eq!(entries, vec![(&1, &"cat"), (&2, &"wolf")]);
//! # Ok::<(), TreeError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports the containers, their handles and the error type.
///
/// # Usage
///
/// ```rust
/// use multitree::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::TreeError;
    pub use crate::tree::*;
}

mod error;
pub mod tree;

pub use error::TreeError;
pub use tree::{Cursor, OrderedMultiTree, Position, UniqueMap, UniqueSet};

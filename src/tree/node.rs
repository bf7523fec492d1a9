//! Node storage for [`OrderedMultiTree`](super::OrderedMultiTree).
//!
//! Nodes live in an arena of slots owned by the tree. Structural links
//! (`parent`, `left`, `right`) are [`NodeId`] handles into that arena, so no
//! node owns another and parent back-links never form ownership cycles.
//!
//! Every slot carries a generation counter that is bumped when the slot is
//! released. A [`NodeId`] records the generation it was issued with, which
//! lets the tree tell a live handle from one whose node has been erased even
//! after the slot has been recycled. A slot whose generation counter is
//! exhausted is retired instead of recycled.
//!
//! Every arena also draws a process-unique id at construction, and each
//! [`NodeId`] carries the id of the arena that issued it. A handle presented
//! to a different arena, including the fresh arena of a tree that was
//! replaced by assignment, never resolves.

use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of arena ids.
static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(0);

// =============================================================================
// NodeId Definition
// =============================================================================

/// Stable handle of a node inside a [`NodeArena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct NodeId {
    arena: u64,
    index: usize,
    generation: u32,
}

// =============================================================================
// Node Definition
// =============================================================================

/// A key/value pair plus its non-owning structural links.
#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
}

impl<K, V> Node<K, V> {
    /// Creates a leaf node hanging below `parent`.
    pub(crate) const fn leaf(key: K, value: V, parent: Option<NodeId>) -> Self {
        Self {
            key,
            value,
            parent,
            left: None,
            right: None,
        }
    }
}

// =============================================================================
// NodeArena Definition
// =============================================================================

#[derive(Debug)]
struct Slot<K, V> {
    generation: u32,
    node: Option<Node<K, V>>,
}

/// Slot storage for tree nodes with a free list for recycling.
#[derive(Debug)]
pub(crate) struct NodeArena<K, V> {
    id: u64,
    slots: Vec<Slot<K, V>>,
    free: Vec<usize>,
}

impl<K, V> NodeArena<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Stores `node` and returns its handle, reusing a released slot when one
    /// is available.
    pub(crate) fn allocate(&mut self, node: Node<K, V>) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            debug_assert!(slot.node.is_none(), "free list holds an occupied slot");
            slot.node = Some(node);
            return NodeId {
                arena: self.id,
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len();
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            arena: self.id,
            index,
            generation: 0,
        }
    }

    /// Takes the node out of its slot and retires the handle.
    ///
    /// The slot goes back on the free list with a bumped generation. Once the
    /// generation reaches `u32::MAX` the slot stays vacant for the life of
    /// the arena, so no handle it ever issued can match again.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not name a live node.
    pub(crate) fn remove(&mut self, id: NodeId) -> Node<K, V> {
        let Some(slot) = self
            .slots
            .get_mut(id.index)
            .filter(|slot| id.arena == self.id && slot.generation == id.generation)
        else {
            panic!("node {id:?} is not live in this arena");
        };
        let Some(node) = slot.node.take() else {
            panic!("node {id:?} is not live in this arena");
        };
        if let Some(next) = slot.generation.checked_add(1) {
            slot.generation = next;
            self.free.push(id.index);
        }
        node
    }

    /// Returns the node named by `id`, or `None` if the handle is stale or
    /// was issued by another arena.
    pub(crate) fn get(&self, id: NodeId) -> Option<&Node<K, V>> {
        if id.arena != self.id {
            return None;
        }
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    /// Mutable counterpart of [`get`](Self::get).
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<K, V>> {
        if id.arena != self.id {
            return None;
        }
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Yields the slot index and node of every occupied slot.
    ///
    /// Used to hand out disjoint mutable borrows without `unsafe`.
    pub(crate) fn occupied_mut(&mut self) -> impl Iterator<Item = (usize, &mut Node<K, V>)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| slot.node.as_mut().map(|node| (index, node)))
    }
}

impl NodeId {
    pub(crate) const fn slot_index(self) -> usize {
        self.index
    }
}

impl<K, V> Index<NodeId> for NodeArena<K, V> {
    type Output = Node<K, V>;

    fn index(&self, id: NodeId) -> &Self::Output {
        match self.get(id) {
            Some(node) => node,
            None => panic!("node {id:?} is not live in this arena"),
        }
    }
}

impl<K, V> IndexMut<NodeId> for NodeArena<K, V> {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("node {id:?} is not live in this arena"),
        }
    }
}

//! # Node and Invariant Model
//!
//! Nodes are stored in an [`Arena`] and refer to each other by [`NodeId`]
//! (an index into the arena) instead of by pointer. A parent link is therefore
//! just another index and the child/parent cycle carries no ownership: the
//! arena owns every node, and the tree owns the arena.
//!
//! ```text
//!  slots: [ Occupied(5,B) | Vacant(gen 3) | Occupied(3,R) | Occupied(8,R) ]
//!               ▲   │  │       │                ▲   │          ▲   │
//!               │   │  └───────┼────────────────┼───┼──────────┘   │
//!               │   └──────────┼────────────────┘   │              │
//!               └──────────────┼────── parent ──────┴──────────────┘
//!                              └──► free list
//! ```
//!
//! ## Red-black invariants
//!
//! After every mutating tree operation completes:
//!
//! 1. Every node is [`Color::Red`] or [`Color::Black`]. This is a type-level
//!    property: there is no third variant to store.
//! 2. The root is black.
//! 3. An absent child counts as black ([`Arena::color_of`]).
//! 4. A red node has no red child.
//! 5. Every path from a node down to an absent child crosses the same number
//!    of black nodes.
//! 6. Keys are in strict comparator order in-order, with no duplicates.
//!
//! ## Slot generations
//!
//! Each slot carries a generation counter that is bumped when its node is
//! removed. A [`Handle`](crate::Handle) records the generation it was issued
//! for, so a handle to a removed node never resolves to whichever node later
//! reuses the slot.

use std::collections::TryReserveError;

/// Link to another node in the same arena. `None` is an absent (black) leaf.
pub(crate) type Link = Option<NodeId>;

/// Index of a node slot within an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl NodeId {
	#[inline]
	pub(crate) fn index(self) -> usize {
		self.0
	}
}

/// Color of a stored node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
	/// A red node. Freshly inserted nodes start red.
	Red,
	/// A black node. Absent leaves count as black.
	Black,
}

/// Which child of its parent a node is, or which way a rotation turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
	Left,
	Right,
}

impl Side {
	#[inline]
	pub(crate) fn opposite(self) -> Side {
		match self {
			Side::Left => Side::Right,
			Side::Right => Side::Left,
		}
	}
}

/// One stored element together with its color and links.
pub(crate) struct Node<K, V> {
	pub(crate) key: K,
	pub(crate) value: V,
	pub(crate) color: Color,
	pub(crate) left: Link,
	pub(crate) right: Link,
	pub(crate) parent: Link,
	pub(crate) generation: u32,
}

impl<K, V> Node<K, V> {
	#[inline]
	pub(crate) fn child(&self, side: Side) -> Link {
		match side {
			Side::Left => self.left,
			Side::Right => self.right,
		}
	}

	#[inline]
	fn child_mut(&mut self, side: Side) -> &mut Link {
		match side {
			Side::Left => &mut self.left,
			Side::Right => &mut self.right,
		}
	}
}

enum Slot<K, V> {
	Occupied(Node<K, V>),
	Vacant {
		generation: u32,
		next_free: Link,
	},
}

/// Slot storage for the nodes of one tree.
///
/// Vacant slots form an intrusive free list so that removal never shrinks or
/// shifts the slot vector: a node keeps its [`NodeId`] for its whole life.
pub(crate) struct Arena<K, V> {
	slots: Vec<Slot<K, V>>,
	free_head: Link,
	occupied: usize,
}

impl<K, V> Default for Arena<K, V> {
	fn default() -> Self {
		Arena::new()
	}
}

impl<K, V> Arena<K, V> {
	pub(crate) fn new() -> Self {
		Arena {
			slots: Vec::new(),
			free_head: None,
			occupied: 0,
		}
	}

	pub(crate) fn with_capacity(capacity: usize) -> Self {
		Arena {
			slots: Vec::with_capacity(capacity),
			free_head: None,
			occupied: 0,
		}
	}

	/// Number of occupied slots.
	#[inline]
	pub(crate) fn occupied(&self) -> usize {
		self.occupied
	}

	// -----------------------------------------------------------------------
	// Slot Management
	// -----------------------------------------------------------------------

	/// Makes sure the next [`insert`](Self::insert) cannot fail.
	pub(crate) fn reserve(&mut self) -> Result<(), TryReserveError> {
		if self.free_head.is_none() {
			self.slots.try_reserve(1)?;
		}
		Ok(())
	}

	/// Stores a new red, unlinked-below node and returns its id.
	///
	/// Callers reserve first; this never reallocates after a successful
	/// [`reserve`](Self::reserve).
	pub(crate) fn insert(&mut self, key: K, value: V, parent: Link) -> NodeId {
		let mut node = Node {
			key,
			value,
			color: Color::Red,
			left: None,
			right: None,
			parent,
			generation: 0,
		};
		self.occupied += 1;

		match self.free_head {
			Some(id) => {
				let slot = &mut self.slots[id.index()];
				if let Slot::Vacant {
					generation,
					next_free,
				} = *slot
				{
					node.generation = generation;
					self.free_head = next_free;
				} else {
					unreachable!("free list points at occupied slot {:?}", id);
				}
				*slot = Slot::Occupied(node);
				id
			}
			None => {
				let id = NodeId(self.slots.len());
				self.slots.push(Slot::Occupied(node));
				id
			}
		}
	}

	/// Vacates the slot of `id` and returns the node that lived there.
	pub(crate) fn remove(&mut self, id: NodeId) -> Node<K, V> {
		let generation = self.node(id).generation.wrapping_add(1);
		let vacant = Slot::Vacant {
			generation,
			next_free: self.free_head,
		};
		let Slot::Occupied(node) = std::mem::replace(&mut self.slots[id.index()], vacant) else {
			unreachable!("removing vacant slot {:?}", id);
		};
		self.free_head = Some(id);
		self.occupied -= 1;
		node
	}

	// -----------------------------------------------------------------------
	// Node Access
	// -----------------------------------------------------------------------

	/// Returns the node for a live link.
	///
	/// Links held by the tree always point at occupied slots; reaching a vacant
	/// one means the tree's structure is corrupt.
	#[inline]
	pub(crate) fn node(&self, id: NodeId) -> &Node<K, V> {
		match &self.slots[id.index()] {
			Slot::Occupied(node) => node,
			Slot::Vacant {
				..
			} => unreachable!("link to vacant slot {:?}", id),
		}
	}

	#[inline]
	pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
		match &mut self.slots[id.index()] {
			Slot::Occupied(node) => node,
			Slot::Vacant {
				..
			} => unreachable!("link to vacant slot {:?}", id),
		}
	}

	/// Returns the id at `index` if it is occupied with the given generation.
	pub(crate) fn resolve(&self, index: usize, generation: u32) -> Link {
		match self.slots.get(index)? {
			Slot::Occupied(node) if node.generation == generation => Some(NodeId(index)),
			_ => None,
		}
	}

	#[inline]
	pub(crate) fn entry(&self, id: NodeId) -> (&K, &V) {
		let node = self.node(id);
		(&node.key, &node.value)
	}

	// -----------------------------------------------------------------------
	// Link Queries
	// -----------------------------------------------------------------------

	#[inline]
	pub(crate) fn parent(&self, id: NodeId) -> Link {
		self.node(id).parent
	}

	#[inline]
	pub(crate) fn left(&self, id: NodeId) -> Link {
		self.node(id).left
	}

	#[inline]
	pub(crate) fn right(&self, id: NodeId) -> Link {
		self.node(id).right
	}

	#[inline]
	pub(crate) fn child(&self, id: NodeId, side: Side) -> Link {
		self.node(id).child(side)
	}

	#[inline]
	pub(crate) fn set_child(&mut self, id: NodeId, side: Side, child: Link) {
		*self.node_mut(id).child_mut(side) = child;
	}

	#[inline]
	pub(crate) fn set_parent(&mut self, id: NodeId, parent: Link) {
		self.node_mut(id).parent = parent;
	}

	/// Sets the parent of `link` if it is a node; absent leaves have none.
	#[inline]
	pub(crate) fn set_parent_of(&mut self, link: Link, parent: Link) {
		if let Some(id) = link {
			self.set_parent(id, parent);
		}
	}

	// -----------------------------------------------------------------------
	// Colors
	// -----------------------------------------------------------------------

	#[inline]
	pub(crate) fn color(&self, id: NodeId) -> Color {
		self.node(id).color
	}

	#[inline]
	pub(crate) fn set_color(&mut self, id: NodeId, color: Color) {
		self.node_mut(id).color = color;
	}

	/// Color of a link, treating an absent leaf as black.
	#[inline]
	pub(crate) fn color_of(&self, link: Link) -> Color {
		match link {
			Some(id) => self.color(id),
			None => Color::Black,
		}
	}

	#[inline]
	pub(crate) fn is_red(&self, link: Link) -> bool {
		self.color_of(link) == Color::Red
	}

	// -----------------------------------------------------------------------
	// Family Queries
	// -----------------------------------------------------------------------

	/// Returns `true` if `id` is the left child of its parent.
	///
	/// A root is neither a left nor a right child.
	pub(crate) fn is_left_child(&self, id: NodeId) -> bool {
		match self.parent(id) {
			Some(parent) => self.left(parent) == Some(id),
			None => false,
		}
	}

	/// Which side of its parent `id` hangs from. Must not be called on a root.
	#[inline]
	pub(crate) fn side_of(&self, id: NodeId) -> Side {
		if self.is_left_child(id) {
			Side::Left
		} else {
			Side::Right
		}
	}

	pub(crate) fn grandparent(&self, id: NodeId) -> Link {
		self.parent(id).and_then(|parent| self.parent(parent))
	}

	pub(crate) fn sibling(&self, id: NodeId) -> Link {
		let parent = self.parent(id)?;
		if self.left(parent) == Some(id) {
			self.right(parent)
		} else {
			self.left(parent)
		}
	}

	pub(crate) fn uncle(&self, id: NodeId) -> Link {
		self.parent(id).and_then(|parent| self.sibling(parent))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Builds `2(B)` with children `1(R)` and `3(R)`, and `4(R)` under `3`.
	fn family() -> (Arena<i32, ()>, [NodeId; 4]) {
		let mut arena = Arena::new();
		let two = arena.insert(2, (), None);
		let one = arena.insert(1, (), Some(two));
		let three = arena.insert(3, (), Some(two));
		let four = arena.insert(4, (), Some(three));
		arena.set_child(two, Side::Left, Some(one));
		arena.set_child(two, Side::Right, Some(three));
		arena.set_child(three, Side::Right, Some(four));
		arena.set_color(two, Color::Black);
		(arena, [one, two, three, four])
	}

	#[test]
	fn new_nodes_are_red() {
		let mut arena: Arena<i32, ()> = Arena::new();
		let id = arena.insert(1, (), None);
		assert_eq!(arena.color(id), Color::Red);
		assert_eq!(arena.left(id), None);
		assert_eq!(arena.right(id), None);
	}

	#[test]
	fn absent_leaves_are_black() {
		let arena: Arena<i32, ()> = Arena::new();
		assert_eq!(arena.color_of(None), Color::Black);
		assert!(!arena.is_red(None));
	}

	#[test]
	fn family_queries() {
		let (arena, [one, two, three, four]) = family();

		assert!(arena.is_left_child(one));
		assert!(!arena.is_left_child(three));
		assert!(!arena.is_left_child(two));
		assert_eq!(arena.side_of(three), Side::Right);

		assert_eq!(arena.sibling(one), Some(three));
		assert_eq!(arena.sibling(three), Some(one));
		assert_eq!(arena.sibling(two), None);

		assert_eq!(arena.grandparent(four), Some(two));
		assert_eq!(arena.grandparent(three), None);

		assert_eq!(arena.uncle(four), Some(one));
		assert_eq!(arena.uncle(one), None);
	}

	#[test]
	fn removed_slots_are_reused_with_new_generation() {
		let mut arena: Arena<i32, ()> = Arena::new();
		let a = arena.insert(1, (), None);
		let generation = arena.node(a).generation;

		let node = arena.remove(a);
		assert_eq!(node.key, 1);
		assert_eq!(arena.occupied(), 0);
		assert_eq!(arena.resolve(a.index(), generation), None);

		let b = arena.insert(2, (), None);
		assert_eq!(a, b);
		assert_eq!(arena.node(b).generation, generation + 1);
		assert_eq!(arena.resolve(b.index(), generation), None);
		assert_eq!(arena.resolve(b.index(), generation + 1), Some(b));
		assert_eq!(arena.entry(b), (&2, &()));
	}

	#[test]
	fn reserve_is_free_when_a_slot_is_vacant() {
		let mut arena: Arena<i32, ()> = Arena::with_capacity(0);
		let a = arena.insert(1, (), None);
		arena.remove(a);
		let capacity = arena.slots.capacity();
		arena.reserve().unwrap();
		assert_eq!(arena.slots.capacity(), capacity);
	}

	#[test]
	fn side_opposite() {
		assert_eq!(Side::Left.opposite(), Side::Right);
		assert_eq!(Side::Right.opposite(), Side::Left);
	}
}

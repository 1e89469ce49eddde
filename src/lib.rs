//! # Redtree: An Ordered Associative Container Core
//!
//! This crate provides a red-black tree engine for ordered maps and sets: a
//! self-balancing binary search tree supporting insertion, deletion, lookup,
//! and bidirectional in-order iteration, with an injectable comparator and an
//! injectable node allocator.
//!
//! ## Design Overview
//!
//! ### Key Concepts
//!
//! **Arena-backed nodes**: Nodes are stored in a slot arena owned by the tree
//! and refer to each other by index. Parent links are plain indices, so the
//! parent/child cycle carries no ownership and needs no `unsafe`.
//!
//! **Handles**: A [`Handle`] names one node and records the generation of the
//! slot it was issued for. Removing a node bumps its slot's generation, so a
//! handle to a removed element is detectably stale while handles to every
//! other element remain valid.
//!
//! **Comparators**: Every ordering decision goes through a
//! [`Comparator`](compare::Comparator) applied to keys only. Two keys are the
//! same key when neither precedes the other.
//!
//! **Allocators**: Every node is granted by a
//! [`NodeAllocator`](alloc::NodeAllocator) before it is constructed. A refusal
//! is the only error an operation can report, and it leaves the tree as it
//! was.
//!
//! ### Tree Structure
//!
//! ```text
//!                    ┌──────────────┐
//!                    │   10 (B)     │  <- root is always black
//!                    └──────┬───────┘
//!                 ┌─────────┴─────────┐
//!                 ▼                   ▼
//!          ┌────────────┐      ┌────────────┐
//!          │   5 (B)    │      │   20 (B)   │
//!          └─────┬──────┘      └─────┬──────┘
//!           ┌────┘                ┌──┘
//!           ▼                     ▼
//!     ┌──────────┐          ┌──────────┐
//!     │  3 (R)   │          │  15 (R)  │   <- red nodes never have red children
//!     └──────────┘          └──────────┘
//! ```
//!
//! Every path from a node down to an absent leaf crosses the same number of
//! black nodes, which bounds the height at `2·log2(n + 1)`.
//!
//! ## Basic Usage
//!
//! ```
//! use redtree::Tree;
//!
//! let mut tree = Tree::new();
//!
//! // Insert key-value pairs; duplicates are not stored twice
//! let (_, inserted) = tree.insert("key1", "value1").unwrap();
//! assert!(inserted);
//! let (_, inserted) = tree.insert("key1", "other").unwrap();
//! assert!(!inserted);
//!
//! tree.insert("key2", "value2").unwrap();
//!
//! assert_eq!(tree.get(&"key1"), Some(&"value1"));
//!
//! // Iterate in key order, either direction
//! let keys: Vec<_> = tree.iter().rev().map(|(k, _)| *k).collect();
//! assert_eq!(keys, ["key2", "key1"]);
//!
//! // Remove entries
//! assert_eq!(tree.remove(&"key1"), Some("value1"));
//! ```
//!
//! ## Thread Safety
//!
//! The tree has no interior mutability and no synchronization. Mutation needs
//! `&mut`, and the tree is `Send`/`Sync` exactly when its keys, values,
//! comparator and allocator are.

use std::alloc::Layout;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Bound, RangeBounds};

use smallvec::{smallvec, SmallVec};

pub mod alloc;
pub mod compare;
pub mod error;
pub mod iter;
pub mod map;
mod node;
pub mod set;
#[cfg(any(test, feature = "test-utils"))]
pub mod util;

use alloc::{Global, NodeAllocator};
use compare::{Comparator, Natural};
use node::{Arena, Link, Node, NodeId, Side};

pub use map::OrderedMap;
pub use node::Color;
pub use set::OrderedSet;

// ---------------------------------------------------------------------------
// Public Type Aliases
// ---------------------------------------------------------------------------

/// A red-black tree ordered by [`Ord`] with the default allocator.
///
/// This is the recommended type for most use cases. For a custom ordering or
/// allocation policy, use [`GenericTree`] directly.
pub type Tree<K, V> = GenericTree<K, V, Natural, Global>;

// ---------------------------------------------------------------------------
// Core Tree Structure
// ---------------------------------------------------------------------------

/// A red-black tree with a configurable comparator and node allocator.
///
/// # Type Parameters
///
/// - `K`: The key type. Ordered only through `C`.
/// - `V`: The value type. Use `()` for set semantics.
/// - `C`: The [`Comparator`] deciding key order. Default [`Natural`].
/// - `A`: The [`NodeAllocator`] granting node storage. Default [`Global`].
///
/// # Internal Structure
///
/// - An **arena** of node slots, addressed by index, with a free list.
/// - A **root** link, absent when the tree is empty.
/// - A **length** counter, kept equal to the number of reachable nodes.
pub struct GenericTree<K, V, C = Natural, A: NodeAllocator = Global> {
	arena: Arena<K, V>,
	root: Link,
	len: usize,
	comparator: C,
	allocator: A,
}

/// Stable, generation-checked location of one element of a tree.
///
/// A handle stays valid until its element is removed. Removing other elements,
/// inserting, and rebalancing never invalidate it. A stale handle resolves to
/// nothing rather than to whichever element later reuses its storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
	index: usize,
	generation: u32,
}

impl<K, V, C: Default, A: NodeAllocator + Default> Default for GenericTree<K, V, C, A> {
	fn default() -> Self {
		Self::new()
	}
}

// ---------------------------------------------------------------------------
// Internal Helper Types
// ---------------------------------------------------------------------------

/// Outcome of a descent looking for a key.
enum Search {
	/// A node with an equivalent key exists.
	Found(NodeId),
	/// No such node; a new one would hang from `parent` on `side`.
	Vacant {
		parent: Link,
		side: Side,
	},
}

/// Progress of the deletion fixup.
///
/// `DoubleBlack` marks the node that is short one black on its paths. It is
/// the only place the third color exists; it is never stored on a node.
enum Deficit {
	DoubleBlack(NodeId),
	Resolved,
}

// ---------------------------------------------------------------------------
// GenericTree Implementation
// ---------------------------------------------------------------------------

impl<K, V, C, A: NodeAllocator> GenericTree<K, V, C, A> {
	// -----------------------------------------------------------------------
	// Construction
	// -----------------------------------------------------------------------

	/// Creates a new, empty tree.
	///
	/// No node storage is allocated until the first insertion.
	///
	/// # Example
	///
	/// ```
	/// use redtree::Tree;
	///
	/// let tree: Tree<String, i32> = Tree::new();
	/// assert!(tree.is_empty());
	/// assert_eq!(tree.height(), 0);
	/// ```
	pub fn new() -> Self
	where
		C: Default,
		A: Default,
	{
		Self::new_in(C::default(), A::default())
	}

	/// Creates a new, empty tree ordered by `comparator`.
	///
	/// # Example
	///
	/// ```
	/// use redtree::compare::Reverse;
	/// use redtree::GenericTree;
	///
	/// let mut tree: GenericTree<i32, (), Reverse> = GenericTree::with_comparator(Reverse);
	/// tree.insert(1, ()).unwrap();
	/// tree.insert(2, ()).unwrap();
	/// assert_eq!(tree.first_key_value(), Some((&2, &())));
	/// ```
	pub fn with_comparator(comparator: C) -> Self
	where
		A: Default,
	{
		Self::new_in(comparator, A::default())
	}

	/// Creates a new, empty tree with an explicit comparator and allocator.
	pub fn new_in(comparator: C, allocator: A) -> Self {
		GenericTree {
			arena: Arena::new(),
			root: None,
			len: 0,
			comparator,
			allocator,
		}
	}

	// -----------------------------------------------------------------------
	// Tree Metadata
	// -----------------------------------------------------------------------

	/// Returns the number of entries in the tree. O(1).
	#[inline]
	pub fn len(&self) -> usize {
		self.len
	}

	/// Returns `true` if the tree contains no entries.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Returns the comparator ordering this tree.
	pub fn comparator(&self) -> &C {
		&self.comparator
	}

	/// Returns the allocator granting this tree's nodes.
	pub fn allocator(&self) -> &A {
		&self.allocator
	}

	/// Returns the allocator mutably, for adjusting its policy in place.
	pub fn allocator_mut(&mut self) -> &mut A {
		&mut self.allocator
	}

	/// Returns the number of nodes on the longest root-to-leaf path.
	///
	/// - Height 0: empty tree
	/// - Height 1: a single root node
	///
	/// The red-black invariants keep this at most `2·log2(len + 1)`.
	pub fn height(&self) -> usize {
		let mut deepest = 0;
		let mut stack: SmallVec<[(NodeId, usize); 64]> = SmallVec::new();
		if let Some(root) = self.root {
			stack.push((root, 1));
		}

		while let Some((id, depth)) = stack.pop() {
			deepest = deepest.max(depth);
			let node = self.arena.node(id);
			for child in [node.left, node.right].into_iter().flatten() {
				stack.push((child, depth + 1));
			}
		}
		deepest
	}

	/// Returns the number of black nodes on every root-to-leaf path,
	/// the root included. 0 for an empty tree.
	pub fn black_height(&self) -> usize {
		let mut count = 0;
		let mut cursor = self.root;
		while let Some(id) = cursor {
			if self.arena.color(id) == Color::Black {
				count += 1;
			}
			cursor = self.arena.left(id);
		}
		count
	}

	/// Returns a handle to the root node, if any.
	pub fn root(&self) -> Option<Handle> {
		self.root.map(|id| self.handle(id))
	}

	// -----------------------------------------------------------------------
	// Handles
	// -----------------------------------------------------------------------

	#[inline]
	fn handle(&self, id: NodeId) -> Handle {
		Handle {
			index: id.index(),
			generation: self.arena.node(id).generation,
		}
	}

	#[inline]
	pub(crate) fn resolve(&self, handle: Handle) -> Link {
		self.arena.resolve(handle.index, handle.generation)
	}

	/// Returns `true` if `handle` refers to an element still in this tree.
	pub fn contains_handle(&self, handle: Handle) -> bool {
		self.resolve(handle).is_some()
	}

	/// Returns the entry a handle refers to, or `None` if it was removed.
	pub fn key_value_at(&self, handle: Handle) -> Option<(&K, &V)> {
		self.resolve(handle).map(|id| self.arena.entry(id))
	}

	/// Returns a mutable reference to the value a handle refers to.
	pub fn value_at_mut(&mut self, handle: Handle) -> Option<&mut V> {
		let id = self.resolve(handle)?;
		Some(&mut self.arena.node_mut(id).value)
	}

	/// Returns the color of the node a handle refers to.
	pub fn color_at(&self, handle: Handle) -> Option<Color> {
		self.resolve(handle).map(|id| self.arena.color(id))
	}

	// -----------------------------------------------------------------------
	// Traversal
	// -----------------------------------------------------------------------

	pub(crate) fn first_node(&self) -> Link {
		self.root.map(|root| self.arena.minimum(root))
	}

	pub(crate) fn last_node(&self) -> Link {
		self.root.map(|root| self.arena.maximum(root))
	}

	/// Returns the handle of the smallest entry.
	pub fn first(&self) -> Option<Handle> {
		self.first_node().map(|id| self.handle(id))
	}

	/// Returns the handle of the largest entry.
	pub fn last(&self) -> Option<Handle> {
		self.last_node().map(|id| self.handle(id))
	}

	/// Returns the smallest entry.
	pub fn first_key_value(&self) -> Option<(&K, &V)> {
		self.first_node().map(|id| self.arena.entry(id))
	}

	/// Returns the largest entry.
	pub fn last_key_value(&self) -> Option<(&K, &V)> {
		self.last_node().map(|id| self.arena.entry(id))
	}

	/// Returns the smallest entry of the subtree rooted at `handle`.
	pub fn minimum(&self, handle: Handle) -> Option<Handle> {
		self.resolve(handle).map(|id| self.handle(self.arena.minimum(id)))
	}

	/// Returns the largest entry of the subtree rooted at `handle`.
	pub fn maximum(&self, handle: Handle) -> Option<Handle> {
		self.resolve(handle).map(|id| self.handle(self.arena.maximum(id)))
	}

	/// Returns the next entry in key order, or `None` past the last entry
	/// (or for a stale handle).
	pub fn successor(&self, handle: Handle) -> Option<Handle> {
		let id = self.resolve(handle)?;
		self.arena.successor(id).map(|next| self.handle(next))
	}

	/// Returns the previous entry in key order, or `None` before the first
	/// entry (or for a stale handle).
	pub fn predecessor(&self, handle: Handle) -> Option<Handle> {
		let id = self.resolve(handle)?;
		self.arena.predecessor(id).map(|prev| self.handle(prev))
	}

	// -----------------------------------------------------------------------
	// Search
	// -----------------------------------------------------------------------

	/// Descends from the root comparing `key` against each node.
	fn search<Q>(&self, key: &Q) -> Search
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		let mut parent = None;
		let mut side = Side::Left;
		let mut cursor = self.root;

		while let Some(id) = cursor {
			let node = self.arena.node(id);
			side = match self.comparator.compare(key, node.key.borrow()) {
				Ordering::Less => Side::Left,
				Ordering::Greater => Side::Right,
				Ordering::Equal => return Search::Found(id),
			};
			parent = Some(id);
			cursor = node.child(side);
		}

		Search::Vacant {
			parent,
			side,
		}
	}

	pub(crate) fn find_node<Q>(&self, key: &Q) -> Link
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		match self.search(key) {
			Search::Found(id) => Some(id),
			Search::Vacant {
				..
			} => None,
		}
	}

	/// First node whose key is not ordered before `key`.
	pub(crate) fn lower_bound_node<Q>(&self, key: &Q) -> Link
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		let mut best = None;
		let mut cursor = self.root;
		while let Some(id) = cursor {
			let node = self.arena.node(id);
			let node_key: &Q = node.key.borrow();
			if self.comparator.less(node_key, key) {
				cursor = node.right;
			} else {
				best = Some(id);
				cursor = node.left;
			}
		}
		best
	}

	/// First node whose key is ordered after `key`.
	pub(crate) fn upper_bound_node<Q>(&self, key: &Q) -> Link
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		let mut best = None;
		let mut cursor = self.root;
		while let Some(id) = cursor {
			let node = self.arena.node(id);
			let node_key: &Q = node.key.borrow();
			if self.comparator.less(key, node_key) {
				best = Some(id);
				cursor = node.left;
			} else {
				cursor = node.right;
			}
		}
		best
	}

	/// Returns the handle of the entry with an equivalent key.
	pub fn find<Q>(&self, key: &Q) -> Option<Handle>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.find_node(key).map(|id| self.handle(id))
	}

	/// Returns a reference to the value for `key`.
	///
	/// # Example
	///
	/// ```
	/// use redtree::Tree;
	///
	/// let mut tree: Tree<String, i32> = Tree::new();
	/// tree.insert("one".to_string(), 1).unwrap();
	///
	/// assert_eq!(tree.get("one"), Some(&1));
	/// assert_eq!(tree.get("two"), None);
	/// ```
	pub fn get<Q>(&self, key: &Q) -> Option<&V>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.find_node(key).map(|id| &self.arena.node(id).value)
	}

	/// Returns a mutable reference to the value for `key`.
	pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		let id = self.find_node(key)?;
		Some(&mut self.arena.node_mut(id).value)
	}

	/// Returns the stored key and value for `key`.
	pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.find_node(key).map(|id| self.arena.entry(id))
	}

	/// Returns `true` if the tree contains an equivalent key.
	pub fn contains_key<Q>(&self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.find_node(key).is_some()
	}

	/// Returns the number of entries with an equivalent key: 0 or 1.
	pub fn count<Q>(&self, key: &Q) -> usize
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		usize::from(self.contains_key(key))
	}

	/// Returns a cursor at the first entry not ordered before `key`, or at the
	/// end if there is none.
	pub fn lower_bound<Q>(&self, key: &Q) -> iter::Cursor<'_, K, V, C, A>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		iter::Cursor::new(self, self.lower_bound_node(key))
	}

	/// Returns a cursor at the first entry ordered after `key`, or at the end
	/// if there is none.
	pub fn upper_bound<Q>(&self, key: &Q) -> iter::Cursor<'_, K, V, C, A>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		iter::Cursor::new(self, self.upper_bound_node(key))
	}

	/// Returns `(lower_bound(key), upper_bound(key))`.
	///
	/// The two cursors are equal when the key is absent, and one step apart
	/// when it is present.
	pub fn equal_range<Q>(
		&self,
		key: &Q,
	) -> (iter::Cursor<'_, K, V, C, A>, iter::Cursor<'_, K, V, C, A>)
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		(self.lower_bound(key), self.upper_bound(key))
	}

	// -----------------------------------------------------------------------
	// Public API: Write Operations
	// -----------------------------------------------------------------------

	/// Inserts a key-value pair into the tree.
	///
	/// If an equivalent key already exists the tree is left untouched, `key`
	/// and `value` are dropped, and the existing entry's handle is returned
	/// with `false`. Otherwise the new entry's handle is returned with `true`.
	///
	/// # Errors
	///
	/// Returns an error if node storage could not be obtained. The tree is
	/// then exactly as it was before the call.
	///
	/// # Algorithm
	///
	/// 1. Descend from the root to the vacant position for `key`
	/// 2. Allocate a red node and link it there
	/// 3. Restore the red-black invariants bottom-up (`insert_fixup`)
	///
	/// # Example
	///
	/// ```
	/// use redtree::Tree;
	///
	/// let mut tree: Tree<i32, &str> = Tree::new();
	///
	/// let (first, inserted) = tree.insert(1, "one").unwrap();
	/// assert!(inserted);
	///
	/// let (again, inserted) = tree.insert(1, "uno").unwrap();
	/// assert!(!inserted);
	/// assert_eq!(first, again);
	/// assert_eq!(tree.get(&1), Some(&"one"));
	/// ```
	pub fn insert(&mut self, key: K, value: V) -> error::Result<(Handle, bool)>
	where
		C: Comparator<K>,
	{
		let (parent, side) = match self.search(&key) {
			Search::Found(id) => return Ok((self.handle(id), false)),
			Search::Vacant {
				parent,
				side,
			} => (parent, side),
		};

		let id = self.allocate_node(key, value, parent)?;
		match parent {
			Some(parent) => self.arena.set_child(parent, side, Some(id)),
			None => self.root = Some(id),
		}
		self.len += 1;

		self.insert_fixup(id);
		Ok((self.handle(id), true))
	}

	/// Removes a key from the tree, returning its value if it existed.
	///
	/// # Example
	///
	/// ```
	/// use redtree::Tree;
	///
	/// let mut tree: Tree<i32, &str> = Tree::new();
	/// tree.insert(1, "one").unwrap();
	///
	/// assert_eq!(tree.remove(&1), Some("one"));
	/// assert_eq!(tree.remove(&1), None); // Already removed
	/// ```
	pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.remove_entry(key).map(|(_, v)| v)
	}

	/// Removes a key from the tree, returning the stored key and value.
	pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		let id = self.find_node(key)?;
		Some(self.remove_node(id))
	}

	/// Removes the element a handle refers to.
	///
	/// Returns `None` if the handle is stale.
	pub fn remove_at(&mut self, handle: Handle) -> Option<(K, V)> {
		let id = self.resolve(handle)?;
		Some(self.remove_node(id))
	}

	/// Removes and returns the smallest entry.
	pub fn pop_first(&mut self) -> Option<(K, V)> {
		let id = self.first_node()?;
		Some(self.remove_node(id))
	}

	/// Removes and returns the largest entry.
	pub fn pop_last(&mut self) -> Option<(K, V)> {
		let id = self.last_node()?;
		Some(self.remove_node(id))
	}

	/// Removes all entries from the tree.
	///
	/// Nodes are released bottom-up, children before their parent, by walking
	/// parent links; no recursion and no auxiliary stack are needed.
	pub fn clear(&mut self) {
		let released = self.len;
		let mut cursor = self.root.take();

		while let Some(id) = cursor {
			let node = self.arena.node(id);
			if let Some(child) = node.left.or(node.right) {
				cursor = Some(child);
				continue;
			}

			let parent = node.parent;
			if let Some(parent) = parent {
				let side = self.arena.side_of(id);
				self.arena.set_child(parent, side, None);
			}
			self.release_node(id);
			cursor = parent;
		}

		self.len = 0;
		if released > 0 {
			log::debug!("cleared tree of {} nodes", released);
		}
	}

	/// Creates a deep copy of the tree with the same shape, keys, values and
	/// colors.
	///
	/// Nodes of the copy are granted by a clone of this tree's allocator.
	/// Handles issued by this tree do not refer into the copy.
	///
	/// # Errors
	///
	/// Returns an error if the allocator refuses a node; the partial copy is
	/// released before returning.
	pub fn try_clone(&self) -> error::Result<Self>
	where
		K: Clone,
		V: Clone,
		C: Clone,
		A: Clone,
	{
		let mut clone = GenericTree {
			arena: Arena::with_capacity(self.len),
			root: None,
			len: 0,
			comparator: self.comparator.clone(),
			allocator: self.allocator.clone(),
		};

		let Some(root) = self.root else {
			return Ok(clone);
		};

		// (node in self, parent in clone, side under that parent)
		let mut stack: SmallVec<[(NodeId, Link, Side); 64]> = smallvec![(root, None, Side::Left)];
		while let Some((source, parent, side)) = stack.pop() {
			let node = self.arena.node(source);
			let id = clone.allocate_node(node.key.clone(), node.value.clone(), parent)?;
			clone.arena.set_color(id, node.color);
			match parent {
				Some(parent) => clone.arena.set_child(parent, side, Some(id)),
				None => clone.root = Some(id),
			}
			clone.len += 1;

			if let Some(right) = node.right {
				stack.push((right, Some(id), Side::Right));
			}
			if let Some(left) = node.left {
				stack.push((left, Some(id), Side::Left));
			}
		}

		Ok(clone)
	}

	// -----------------------------------------------------------------------
	// Iteration
	// -----------------------------------------------------------------------

	/// Returns a double-ended iterator over the entries in key order.
	pub fn iter(&self) -> iter::Iter<'_, K, V> {
		iter::Iter::new(&self.arena, self.first_node(), self.last_node(), self.len)
	}

	/// Returns a double-ended iterator over the entries whose keys fall in
	/// `range`.
	///
	/// An inverted or empty range yields nothing.
	///
	/// # Example
	///
	/// ```
	/// use redtree::Tree;
	///
	/// let mut tree: Tree<i32, ()> = Tree::new();
	/// for k in 0..10 {
	///     tree.insert(k, ()).unwrap();
	/// }
	///
	/// let keys: Vec<i32> = tree.range(3..6).map(|(k, _)| *k).collect();
	/// assert_eq!(keys, [3, 4, 5]);
	/// ```
	pub fn range<Q, R>(&self, range: R) -> iter::Range<'_, K, V>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
		R: RangeBounds<Q>,
	{
		let (front, back) = self.range_ends(range);
		iter::Range::new(&self.arena, front, back)
	}

	/// Inclusive first and last nodes within `range`, both absent if none.
	fn range_ends<Q, R>(&self, range: R) -> (Link, Link)
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
		R: RangeBounds<Q>,
	{
		let front = match range.start_bound() {
			Bound::Included(key) => self.lower_bound_node(key),
			Bound::Excluded(key) => self.upper_bound_node(key),
			Bound::Unbounded => self.first_node(),
		};
		let back = match range.end_bound() {
			Bound::Included(key) => match self.upper_bound_node(key) {
				Some(id) => self.arena.predecessor(id),
				None => self.last_node(),
			},
			Bound::Excluded(key) => match self.lower_bound_node(key) {
				Some(id) => self.arena.predecessor(id),
				None => self.last_node(),
			},
			Bound::Unbounded => self.last_node(),
		};

		match (front, back) {
			(Some(front), Some(back)) => {
				let front_key: &Q = self.arena.node(front).key.borrow();
				let back_key: &Q = self.arena.node(back).key.borrow();
				if self.comparator.less(back_key, front_key) {
					(None, None)
				} else {
					(Some(front), Some(back))
				}
			}
			_ => (None, None),
		}
	}

	/// Removes every entry whose key falls in `range` and returns how many
	/// were removed.
	///
	/// The doomed nodes are collected before the first removal, so
	/// rebalancing during the erase cannot skip or revisit an entry.
	pub fn remove_range<Q, R>(&mut self, range: R) -> usize
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
		R: RangeBounds<Q>,
	{
		let (front, back) = self.range_ends(range);
		let mut doomed: SmallVec<[NodeId; 16]> = SmallVec::new();
		let mut cursor = front;
		while let Some(id) = cursor {
			doomed.push(id);
			cursor = if cursor == back {
				None
			} else {
				self.arena.successor(id)
			};
		}

		// Node ids survive removal of other nodes.
		for &id in &doomed {
			self.remove_node(id);
		}
		doomed.len()
	}

	/// Keeps only the entries for which `keep` returns `true`, visiting them
	/// in key order.
	pub fn retain<F>(&mut self, mut keep: F)
	where
		F: FnMut(&K, &mut V) -> bool,
	{
		let mut doomed = Vec::new();
		let mut cursor = self.first_node();
		while let Some(id) = cursor {
			cursor = self.arena.successor(id);
			let node = self.arena.node_mut(id);
			if !keep(&node.key, &mut node.value) {
				doomed.push(id);
			}
		}
		for id in doomed {
			self.remove_node(id);
		}
	}

	/// Returns a cursor at the first entry (the end cursor if empty).
	pub fn begin(&self) -> iter::Cursor<'_, K, V, C, A> {
		iter::Cursor::new(self, self.first_node())
	}

	/// Returns the one-past-the-end cursor.
	pub fn end(&self) -> iter::Cursor<'_, K, V, C, A> {
		iter::Cursor::new(self, None)
	}

	/// Returns a cursor at the element a handle refers to.
	pub fn cursor_at(&self, handle: Handle) -> Option<iter::Cursor<'_, K, V, C, A>> {
		self.resolve(handle).map(|id| iter::Cursor::new(self, Some(id)))
	}

	/// Returns a seekable shared iterator, initially positioned at the end.
	///
	/// # Example
	///
	/// ```
	/// use redtree::Tree;
	///
	/// let mut tree: Tree<i32, &str> = Tree::new();
	/// tree.insert(1, "one").unwrap();
	/// tree.insert(2, "two").unwrap();
	///
	/// let mut iter = tree.raw_iter();
	/// iter.seek_to_first();
	///
	/// while let Some((k, v)) = iter.next() {
	///     println!("{}: {}", k, v);
	/// }
	/// ```
	pub fn raw_iter(&self) -> iter::RawIter<'_, K, V, C, A> {
		iter::RawIter::new(self)
	}

	/// Returns a seekable exclusive iterator, initially positioned at the end.
	///
	/// # Example
	///
	/// ```
	/// use redtree::Tree;
	///
	/// let mut tree: Tree<i32, i32> = Tree::new();
	/// tree.insert(1, 10).unwrap();
	/// tree.insert(2, 20).unwrap();
	///
	/// let mut iter = tree.raw_iter_mut();
	/// iter.seek_to_first();
	///
	/// // Modify values during iteration
	/// while let Some((_k, v)) = iter.next() {
	///     *v *= 2;
	/// }
	/// drop(iter);
	/// assert_eq!(tree.get(&2), Some(&40));
	/// ```
	pub fn raw_iter_mut(&mut self) -> iter::RawIterMut<'_, K, V, C, A> {
		iter::RawIterMut::new(self)
	}

	// -----------------------------------------------------------------------
	// Node Lifecycle
	// -----------------------------------------------------------------------

	/// Obtains storage for a node and constructs it, red and childless.
	///
	/// Both fallible steps happen before anything is linked.
	fn allocate_node(&mut self, key: K, value: V, parent: Link) -> error::Result<NodeId> {
		let layout = Layout::new::<Node<K, V>>();
		self.allocator.allocate(layout)?;

		if let Err(err) = self.arena.reserve() {
			self.allocator.deallocate(layout);
			log::debug!("node arena could not grow: {}", err);
			return Err(err.into());
		}

		Ok(self.arena.insert(key, value, parent))
	}

	/// Destroys an already unlinked node and returns its storage.
	fn release_node(&mut self, id: NodeId) -> Node<K, V> {
		let node = self.arena.remove(id);
		self.allocator.deallocate(Layout::new::<Node<K, V>>());
		node
	}

	// -----------------------------------------------------------------------
	// Rotations
	// -----------------------------------------------------------------------

	/// Points whatever referred to `old` (its parent's child link, or the
	/// root) at `new`. Does not touch `new`'s parent link.
	fn replace_child(&mut self, parent: Link, old: NodeId, new: Link) {
		match parent {
			Some(parent) => {
				let side = if self.arena.left(parent) == Some(old) {
					Side::Left
				} else {
					Side::Right
				};
				self.arena.set_child(parent, side, new);
			}
			None => self.root = new,
		}
	}

	/// Rotates `pivot` down towards `side`.
	///
	/// `rotate(x, Side::Left)` is a left rotation: the right child of `x`
	/// takes its place and `x` becomes that child's left child. The inner
	/// grandchild changes parent. In-order sequence is preserved and no
	/// colors change.
	///
	/// ```text
	///       x                 y
	///      / \               / \
	///     a   y     ==>     x   c
	///        / \           / \
	///       b   c         a   b
	/// ```
	fn rotate(&mut self, pivot: NodeId, side: Side) {
		let other = side.opposite();
		let Some(riser) = self.arena.child(pivot, other) else {
			unreachable!("rotation at {:?} without a child to raise", pivot);
		};

		let inner = self.arena.child(riser, side);
		self.arena.set_child(pivot, other, inner);
		self.arena.set_parent_of(inner, Some(pivot));

		let parent = self.arena.parent(pivot);
		self.arena.set_parent(riser, parent);
		self.replace_child(parent, pivot, Some(riser));

		self.arena.set_child(riser, side, Some(pivot));
		self.arena.set_parent(pivot, Some(riser));
		log::trace!("rotated {:?} {:?}, {:?} raised", pivot, side, riser);
	}

	// -----------------------------------------------------------------------
	// Insertion Fixup
	// -----------------------------------------------------------------------

	/// Restores the invariants after `node` was linked as a red leaf.
	///
	/// The only invariant a red leaf can break is "no red child of a red
	/// node". Each pass either pushes the violation two levels up (Case A)
	/// or removes it with at most two rotations (Cases B and C).
	fn insert_fixup(&mut self, mut node: NodeId) {
		while let Some(mut parent) = self.arena.parent(node) {
			if self.arena.color(parent) == Color::Black {
				break;
			}
			// A red parent is never the root, so the grandparent exists.
			let Some(grandparent) = self.arena.grandparent(node) else {
				break;
			};
			let side = self.arena.side_of(parent);
			let uncle = self.arena.uncle(node);

			// Case A: red uncle. Recolor and continue from the grandparent.
			if let Some(uncle) = uncle.filter(|&uncle| self.arena.color(uncle) == Color::Red) {
				log::trace!("insert fixup: red uncle, recoloring at {:?}", grandparent);
				self.arena.set_color(parent, Color::Black);
				self.arena.set_color(uncle, Color::Black);
				self.arena.set_color(grandparent, Color::Red);
				node = grandparent;
				continue;
			}

			// Case B: inner grandchild. Rotate it into its parent's place.
			if self.arena.side_of(node) != side {
				log::trace!("insert fixup: inner grandchild, rotating at {:?}", parent);
				self.rotate(parent, side);
				std::mem::swap(&mut node, &mut parent);
			}

			// Case C: outer grandchild with a black uncle.
			log::trace!("insert fixup: outer grandchild, rotating at {:?}", grandparent);
			self.arena.set_color(parent, Color::Black);
			self.arena.set_color(grandparent, Color::Red);
			self.rotate(grandparent, side.opposite());
			break;
		}

		if let Some(root) = self.root {
			self.arena.set_color(root, Color::Black);
		}
	}

	// -----------------------------------------------------------------------
	// Deletion
	// -----------------------------------------------------------------------

	/// Unlinks and destroys `id`, rebalancing as needed.
	///
	/// # Algorithm
	///
	/// 1. If `id` has two children, swap its position in the tree with its
	///    in-order successor. Both nodes keep their entries and ids; only
	///    links and colors are exchanged. `id` now has at most one child.
	/// 2. A red node with at most one child is a leaf: unlink it.
	/// 3. A black node with one child: that child is red. Paint it black
	///    and splice it into the node's place.
	/// 4. A black leaf: resolve the black deficit its removal will cause
	///    while it is still linked (`remove_fixup`), then unlink it.
	pub(crate) fn remove_node(&mut self, id: NodeId) -> (K, V) {
		if self.arena.left(id).is_some() {
			if let Some(right) = self.arena.right(id) {
				let successor = self.arena.minimum(right);
				self.swap_with_successor(id, successor);
			}
		}

		let child = self.arena.left(id).or(self.arena.right(id));
		if self.arena.color(id) == Color::Black {
			match child {
				Some(child) => self.arena.set_color(child, Color::Black),
				None => self.remove_fixup(id),
			}
		}

		let parent = self.arena.parent(id);
		self.replace_child(parent, id, child);
		self.arena.set_parent_of(child, parent);
		self.len -= 1;

		let node = self.release_node(id);
		(node.key, node.value)
	}

	/// Exchanges the tree positions of `upper` and `lower`, its in-order
	/// successor, along with their colors.
	///
	/// `lower` is the minimum of `upper`'s right subtree, so it has no left
	/// child and is either `upper`'s right child or a left child deeper down.
	fn swap_with_successor(&mut self, upper: NodeId, lower: NodeId) {
		let upper_parent = self.arena.parent(upper);
		let upper_left = self.arena.left(upper);
		let upper_right = self.arena.right(upper);
		let lower_parent = self.arena.parent(lower);
		let lower_right = self.arena.right(lower);

		// `lower` moves up into `upper`'s place.
		self.replace_child(upper_parent, upper, Some(lower));
		self.arena.set_parent(lower, upper_parent);
		self.arena.set_child(lower, Side::Left, upper_left);
		self.arena.set_parent_of(upper_left, Some(lower));

		if lower_parent == Some(upper) {
			self.arena.set_child(lower, Side::Right, Some(upper));
			self.arena.set_parent(upper, Some(lower));
		} else {
			self.arena.set_child(lower, Side::Right, upper_right);
			self.arena.set_parent_of(upper_right, Some(lower));
			if let Some(lower_parent) = lower_parent {
				self.arena.set_child(lower_parent, Side::Left, Some(upper));
			}
			self.arena.set_parent(upper, lower_parent);
		}

		// `upper` moves down into `lower`'s place.
		self.arena.set_child(upper, Side::Left, None);
		self.arena.set_child(upper, Side::Right, lower_right);
		self.arena.set_parent_of(lower_right, Some(upper));

		let upper_color = self.arena.color(upper);
		let lower_color = self.arena.color(lower);
		self.arena.set_color(upper, lower_color);
		self.arena.set_color(lower, upper_color);
	}

	// -----------------------------------------------------------------------
	// Deletion Fixup
	// -----------------------------------------------------------------------

	/// Resolves the black deficit left by removing the black leaf `node`.
	///
	/// `node` stays linked for the duration; no case rotates at `node`
	/// itself, so it is still a leaf when the caller unlinks it.
	fn remove_fixup(&mut self, node: NodeId) {
		let mut deficit = Deficit::DoubleBlack(node);
		while let Deficit::DoubleBlack(id) = deficit {
			deficit = self.resolve_deficit(id);
		}
	}

	/// Runs one case of the deletion fixup for the double-black node `id`.
	fn resolve_deficit(&mut self, id: NodeId) -> Deficit {
		let Some(parent) = self.arena.parent(id) else {
			// The root absorbs the deficit.
			self.arena.set_color(id, Color::Black);
			return Deficit::Resolved;
		};
		let side = self.arena.side_of(id);
		let Some(sibling) = self.arena.sibling(id) else {
			unreachable!("double-black node {:?} has no sibling", id);
		};

		// Red sibling: rotate it above the parent so the sibling is black.
		if self.arena.color(sibling) == Color::Red {
			log::trace!("remove fixup: red sibling, rotating at {:?}", parent);
			self.arena.set_color(sibling, Color::Black);
			self.arena.set_color(parent, Color::Red);
			self.rotate(parent, side);
			return Deficit::DoubleBlack(id);
		}

		let near = self.arena.child(sibling, side);
		let far = self.arena.child(sibling, side.opposite());

		// Far nephew red: one rotation at the parent settles it.
		if let Some(far) = far.filter(|&far| self.arena.color(far) == Color::Red) {
			log::trace!("remove fixup: red far nephew, rotating at {:?}", parent);
			let parent_color = self.arena.color(parent);
			self.arena.set_color(sibling, parent_color);
			self.arena.set_color(parent, Color::Black);
			self.arena.set_color(far, Color::Black);
			self.rotate(parent, side);
			return Deficit::Resolved;
		}

		// Near nephew red, far nephew black: turn it into the far case.
		if let Some(near) = near.filter(|&near| self.arena.color(near) == Color::Red) {
			log::trace!("remove fixup: red near nephew, rotating at {:?}", sibling);
			self.arena.set_color(near, Color::Black);
			self.arena.set_color(sibling, Color::Red);
			self.rotate(sibling, side.opposite());
			return Deficit::DoubleBlack(id);
		}

		// Both nephews black: push the deficit up to the parent.
		log::trace!("remove fixup: black nephews, recoloring {:?}", sibling);
		debug_assert!(!self.arena.is_red(near) && !self.arena.is_red(far));
		self.arena.set_color(sibling, Color::Red);
		if self.arena.color(parent) == Color::Red {
			self.arena.set_color(parent, Color::Black);
			Deficit::Resolved
		} else {
			Deficit::DoubleBlack(parent)
		}
	}
}

// ---------------------------------------------------------------------------
// Arena Traversal
// ---------------------------------------------------------------------------

impl<K, V> Arena<K, V> {
	/// Leftmost node of the subtree rooted at `id`.
	pub(crate) fn minimum(&self, mut id: NodeId) -> NodeId {
		while let Some(left) = self.left(id) {
			id = left;
		}
		id
	}

	/// Rightmost node of the subtree rooted at `id`.
	pub(crate) fn maximum(&self, mut id: NodeId) -> NodeId {
		while let Some(right) = self.right(id) {
			id = right;
		}
		id
	}

	/// Next node in key order, or `None` past the end.
	pub(crate) fn successor(&self, id: NodeId) -> Link {
		if let Some(right) = self.right(id) {
			return Some(self.minimum(right));
		}
		let mut child = id;
		let mut parent = self.parent(id);
		while let Some(ancestor) = parent {
			if self.right(ancestor) != Some(child) {
				break;
			}
			child = ancestor;
			parent = self.parent(ancestor);
		}
		parent
	}

	/// Previous node in key order, or `None` before the beginning.
	pub(crate) fn predecessor(&self, id: NodeId) -> Link {
		if let Some(left) = self.left(id) {
			return Some(self.maximum(left));
		}
		let mut child = id;
		let mut parent = self.parent(id);
		while let Some(ancestor) = parent {
			if self.left(ancestor) != Some(child) {
				break;
			}
			child = ancestor;
			parent = self.parent(ancestor);
		}
		parent
	}
}

// ---------------------------------------------------------------------------
// Trait Implementations
// ---------------------------------------------------------------------------

impl<K, V, C, A: NodeAllocator> Drop for GenericTree<K, V, C, A> {
	fn drop(&mut self) {
		self.clear();
	}
}

impl<K, V, C, A> Clone for GenericTree<K, V, C, A>
where
	K: Clone,
	V: Clone,
	C: Clone,
	A: NodeAllocator + Clone,
{
	/// Deep-copies the tree. See [`GenericTree::try_clone`].
	///
	/// # Panics
	///
	/// Panics if the allocator refuses a node.
	fn clone(&self) -> Self {
		match self.try_clone() {
			Ok(tree) => tree,
			Err(err) => panic!("failed to clone tree: {}", err),
		}
	}
}

impl<K: fmt::Debug, V: fmt::Debug, C, A: NodeAllocator> fmt::Debug for GenericTree<K, V, C, A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.iter()).finish()
	}
}

impl<'t, K, V, C, A: NodeAllocator> IntoIterator for &'t GenericTree<K, V, C, A> {
	type Item = (&'t K, &'t V);
	type IntoIter = iter::Iter<'t, K, V>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

impl<K, V, C, A: NodeAllocator> IntoIterator for GenericTree<K, V, C, A> {
	type Item = (K, V);
	type IntoIter = iter::IntoIter<K, V>;

	/// Moves the entries out in key order, releasing every node.
	fn into_iter(mut self) -> Self::IntoIter {
		let mut order = Vec::with_capacity(self.len);
		let mut cursor = self.first_node();
		while let Some(id) = cursor {
			order.push(id);
			cursor = self.arena.successor(id);
		}

		// Nothing is read through links once releasing starts.
		let mut entries = Vec::with_capacity(order.len());
		for id in order {
			let node = self.release_node(id);
			entries.push((node.key, node.value));
		}
		self.root = None;
		self.len = 0;

		iter::IntoIter::new(entries)
	}
}

// ---------------------------------------------------------------------------
// Invariant Checking
// ---------------------------------------------------------------------------

#[cfg(any(test, feature = "test-utils"))]
impl<K: fmt::Debug, V, C: Comparator<K>, A: NodeAllocator> GenericTree<K, V, C, A> {
	/// Validates all tree invariants. Panics with diagnostic info if any
	/// invariant is violated.
	///
	/// # Invariants Checked
	///
	/// 1. Root color: the root is black and has no parent
	/// 2. Red rule: no red node has a red child
	/// 3. Black height: equal on both sides of every node
	/// 4. Parent links: every child points back at its parent
	/// 5. Key ordering: every key lies strictly between its ancestors' bounds,
	///    and in-order traversal is strictly increasing both ways
	/// 6. Length consistency: `len` matches reachable and stored nodes
	pub fn assert_invariants(&self) {
		assert_eq!(
			self.len,
			self.arena.occupied(),
			"len {} != occupied slots {}",
			self.len,
			self.arena.occupied()
		);

		let Some(root) = self.root else {
			assert_eq!(self.len, 0, "Empty tree has len {}", self.len);
			return;
		};

		// Invariant 1: Root color
		assert_eq!(self.arena.parent(root), None, "Root {:?} has a parent", self.arena.node(root).key);
		assert_eq!(
			self.arena.color(root),
			Color::Black,
			"Root {:?} is red",
			self.arena.node(root).key
		);

		let mut reachable = 0;
		self.validate_node_recursive(root, None, None, &mut reachable);

		// Invariant 6: Length consistency
		assert_eq!(reachable, self.len, "Reachable nodes {} != len {}", reachable, self.len);

		// Invariant 5: Forward and reverse traversal
		let mut forward = 0;
		let mut prev: Link = None;
		let mut cursor = self.first_node();
		while let Some(id) = cursor {
			if let Some(prev) = prev {
				let (a, b) = (&self.arena.node(prev).key, &self.arena.node(id).key);
				assert!(self.comparator.less(a, b), "In-order keys not increasing: {:?} then {:?}", a, b);
			}
			forward += 1;
			prev = Some(id);
			cursor = self.arena.successor(id);
		}
		assert_eq!(forward, self.len, "Forward traversal visited {} of {}", forward, self.len);

		let mut backward = 0;
		let mut cursor = self.last_node();
		while let Some(id) = cursor {
			backward += 1;
			cursor = self.arena.predecessor(id);
		}
		assert_eq!(backward, self.len, "Reverse traversal visited {} of {}", backward, self.len);
	}

	/// Recursively validates a subtree and returns its black height.
	///
	/// # Arguments
	/// * `id` - Root of the subtree to validate
	/// * `lower` - Exclusive lower bound from ancestors, None if leftmost
	/// * `upper` - Exclusive upper bound from ancestors, None if rightmost
	/// * `reachable` - Running count of visited nodes
	fn validate_node_recursive(
		&self,
		id: NodeId,
		lower: Option<&K>,
		upper: Option<&K>,
		reachable: &mut usize,
	) -> usize {
		*reachable += 1;
		let node = self.arena.node(id);

		// Invariant 5: Key ordering against ancestor bounds
		if let Some(lower) = lower {
			assert!(
				self.comparator.less(lower, &node.key),
				"Key {:?} not greater than ancestor bound {:?}",
				node.key,
				lower
			);
		}
		if let Some(upper) = upper {
			assert!(
				self.comparator.less(&node.key, upper),
				"Key {:?} not less than ancestor bound {:?}",
				node.key,
				upper
			);
		}

		// Invariant 2: Red rule
		if node.color == Color::Red {
			assert!(
				!self.arena.is_red(node.left) && !self.arena.is_red(node.right),
				"Red node {:?} has a red child",
				node.key
			);
		}

		let mut heights = [0usize; 2];
		for (height, side) in heights.iter_mut().zip([Side::Left, Side::Right]) {
			if let Some(child) = node.child(side) {
				// Invariant 4: Parent links
				assert_eq!(
					self.arena.parent(child),
					Some(id),
					"Child {:?} of {:?} does not point back at it",
					self.arena.node(child).key,
					node.key
				);
				let (child_lower, child_upper) = match side {
					Side::Left => (lower, Some(&node.key)),
					Side::Right => (Some(&node.key), upper),
				};
				*height = self.validate_node_recursive(child, child_lower, child_upper, reachable);
			}
		}

		// Invariant 3: Black height
		assert_eq!(
			heights[0], heights[1],
			"Black height mismatch under {:?}: left {} vs right {}",
			node.key, heights[0], heights[1]
		);

		heights[0] + usize::from(node.color == Color::Black)
	}
}

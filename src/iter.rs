//! Iterators and cursors for the `GenericTree` data structure
//!
//! Every position in a tree is either an element or the single one-past-the-end
//! position. Positions are plain node links, so moving is a successor or
//! predecessor walk over parent links and never allocates.
//!
//! - [`Cursor`]: a copyable position that can move both ways and be compared.
//! - [`RawIter`] / [`RawIterMut`]: seekable iterators in the style of a
//!   storage engine iterator; the exclusive one can also insert and remove.
//! - [`Iter`], [`Range`], [`IntoIter`]: standard double-ended iterators.
use std::borrow::Borrow;
use std::fmt;
use std::iter::FusedIterator;
use std::ptr;

use crate::alloc::NodeAllocator;
use crate::compare::Comparator;
use crate::node::{Arena, Link};
use crate::{error, GenericTree, Handle};

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// A position in a tree: an element, or the end.
///
/// Moving past the last element lands on the end; moving forward from the end
/// stays there. Moving backward from the end lands on the last element, and
/// moving backward from the first element also lands on the end, so the end
/// acts as a ghost position between the last and the first element.
///
/// Two cursors are equal when they are on the same tree at the same position.
pub struct Cursor<'t, K, V, C, A: NodeAllocator> {
	tree: &'t GenericTree<K, V, C, A>,
	node: Link,
}

impl<'t, K, V, C, A: NodeAllocator> Cursor<'t, K, V, C, A> {
	pub(crate) fn new(tree: &'t GenericTree<K, V, C, A>, node: Link) -> Self {
		Cursor {
			tree,
			node,
		}
	}

	/// Returns `true` at the one-past-the-end position.
	#[inline]
	pub fn is_end(&self) -> bool {
		self.node.is_none()
	}

	/// Key at the current position, `None` at the end.
	pub fn key(&self) -> Option<&'t K> {
		self.key_value().map(|(k, _)| k)
	}

	/// Value at the current position, `None` at the end.
	pub fn value(&self) -> Option<&'t V> {
		self.key_value().map(|(_, v)| v)
	}

	/// Entry at the current position, `None` at the end.
	pub fn key_value(&self) -> Option<(&'t K, &'t V)> {
		let tree = self.tree;
		self.node.map(|id| tree.arena.entry(id))
	}

	/// Handle of the element at the current position, `None` at the end.
	pub fn handle(&self) -> Option<Handle> {
		self.node.map(|id| self.tree.handle(id))
	}

	/// Moves to the next element in key order.
	pub fn move_next(&mut self) {
		if let Some(id) = self.node {
			self.node = self.tree.arena.successor(id);
		}
	}

	/// Moves to the previous element in key order.
	pub fn move_prev(&mut self) {
		self.node = match self.node {
			Some(id) => self.tree.arena.predecessor(id),
			None => self.tree.last_node(),
		};
	}

	/// Returns the entry [`move_next`](Self::move_next) would land on.
	pub fn peek_next(&self) -> Option<(&'t K, &'t V)> {
		let mut next = *self;
		next.move_next();
		next.key_value()
	}

	/// Returns the entry [`move_prev`](Self::move_prev) would land on.
	pub fn peek_prev(&self) -> Option<(&'t K, &'t V)> {
		let mut prev = *self;
		prev.move_prev();
		prev.key_value()
	}
}

impl<K, V, C, A: NodeAllocator> Clone for Cursor<'_, K, V, C, A> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<K, V, C, A: NodeAllocator> Copy for Cursor<'_, K, V, C, A> {}

impl<K, V, C, A: NodeAllocator> PartialEq for Cursor<'_, K, V, C, A> {
	fn eq(&self, other: &Self) -> bool {
		ptr::eq(self.tree, other.tree) && self.node == other.node
	}
}

impl<K, V, C, A: NodeAllocator> Eq for Cursor<'_, K, V, C, A> {}

impl<K: fmt::Debug, V: fmt::Debug, C, A: NodeAllocator> fmt::Debug for Cursor<'_, K, V, C, A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Cursor").field(&self.key_value()).finish()
	}
}

// ---------------------------------------------------------------------------
// Raw Iterators
// ---------------------------------------------------------------------------

/// Raw shared iterator over the entries of the tree.
///
/// The iterator sits *between* entries: [`next`](Self::next) returns the entry
/// after the gap and [`prev`](Self::prev) the entry before it. A new iterator
/// sits after the last entry.
pub struct RawIter<'t, K, V, C, A: NodeAllocator> {
	tree: &'t GenericTree<K, V, C, A>,
	next: Link,
}

impl<'t, K, V, C, A: NodeAllocator> RawIter<'t, K, V, C, A> {
	pub(crate) fn new(tree: &'t GenericTree<K, V, C, A>) -> Self {
		RawIter {
			tree,
			next: None,
		}
	}

	/// Sets the iterator cursor immediately before the position for this key.
	pub fn seek<Q>(&mut self, key: &Q)
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.next = self.tree.lower_bound_node(key);
	}

	/// Sets the iterator cursor immediately after the position for this key.
	pub fn seek_for_prev<Q>(&mut self, key: &Q)
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.next = self.tree.upper_bound_node(key);
	}

	/// Sets the iterator cursor immediately before the position for this key, returning `true` if
	/// the next entry matches the provided key.
	pub fn seek_exact<Q>(&mut self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.seek(key);
		match self.next {
			Some(id) => self.tree.comparator.equivalent(key, self.tree.arena.node(id).key.borrow()),
			None => false,
		}
	}

	/// Sets the iterator cursor immediately before the first key in the tree.
	pub fn seek_to_first(&mut self) {
		self.next = self.tree.first_node();
	}

	/// Sets the iterator cursor immediately after the last key in the tree.
	pub fn seek_to_last(&mut self) {
		self.next = None;
	}

	/// Returns the next entry from the current cursor position.
	#[inline]
	#[allow(clippy::should_implement_trait)]
	pub fn next(&mut self) -> Option<(&'t K, &'t V)> {
		let tree = self.tree;
		let id = self.next?;
		self.next = tree.arena.successor(id);
		Some(tree.arena.entry(id))
	}

	/// Returns the previous entry from the current cursor position.
	#[inline]
	pub fn prev(&mut self) -> Option<(&'t K, &'t V)> {
		let tree = self.tree;
		let id = match self.next {
			Some(next) => tree.arena.predecessor(next)?,
			None => tree.last_node()?,
		};
		self.next = Some(id);
		Some(tree.arena.entry(id))
	}
}

/// Raw exclusive iterator over the entries of the tree.
///
/// Like [`RawIter`], but yields mutable values and can insert or remove
/// entries without giving up its borrow of the tree.
pub struct RawIterMut<'t, K, V, C, A: NodeAllocator> {
	tree: &'t mut GenericTree<K, V, C, A>,
	next: Link,
}

impl<'t, K, V, C, A: NodeAllocator> RawIterMut<'t, K, V, C, A> {
	pub(crate) fn new(tree: &'t mut GenericTree<K, V, C, A>) -> Self {
		RawIterMut {
			tree,
			next: None,
		}
	}

	/// Sets the iterator cursor immediately before the position for this key.
	pub fn seek<Q>(&mut self, key: &Q)
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.next = self.tree.lower_bound_node(key);
	}

	/// Sets the iterator cursor immediately after the position for this key.
	pub fn seek_for_prev<Q>(&mut self, key: &Q)
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.next = self.tree.upper_bound_node(key);
	}

	/// Sets the iterator cursor immediately before the position for this key, returning `true` if
	/// the next entry matches the provided key.
	pub fn seek_exact<Q>(&mut self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.seek(key);
		match self.next {
			Some(id) => self.tree.comparator.equivalent(key, self.tree.arena.node(id).key.borrow()),
			None => false,
		}
	}

	/// Sets the iterator cursor immediately before the first key in the tree.
	pub fn seek_to_first(&mut self) {
		self.next = self.tree.first_node();
	}

	/// Sets the iterator cursor immediately after the last key in the tree.
	pub fn seek_to_last(&mut self) {
		self.next = None;
	}

	/// Inserts the key value pair in the tree, leaving the cursor immediately
	/// before it.
	///
	/// Returns `false` (and drops `key` and `value`) if an equivalent key was
	/// already present; the cursor then sits before the existing entry.
	///
	/// # Errors
	///
	/// Returns an error if node storage could not be obtained. Neither the
	/// tree nor the cursor position change.
	pub fn insert(&mut self, key: K, value: V) -> error::Result<bool>
	where
		C: Comparator<K>,
	{
		let (handle, inserted) = self.tree.insert(key, value)?;
		self.next = self.tree.resolve(handle);
		Ok(inserted)
	}

	/// Removes the entry associated with this key from the tree, leaving the
	/// cursor immediately before the entry that followed it.
	pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		let id = self.tree.find_node(key)?;
		// Removal never moves other nodes between slots, so this stays valid.
		let after = self.tree.arena.successor(id);
		let entry = self.tree.remove_node(id);
		self.next = after;
		Some(entry)
	}

	/// Returns the next entry from the current cursor position.
	#[inline]
	#[allow(clippy::should_implement_trait)]
	pub fn next(&mut self) -> Option<(&K, &mut V)> {
		let id = self.next?;
		self.next = self.tree.arena.successor(id);
		let node = self.tree.arena.node_mut(id);
		Some((&node.key, &mut node.value))
	}

	/// Returns the previous entry from the current cursor position.
	#[inline]
	pub fn prev(&mut self) -> Option<(&K, &mut V)> {
		let id = match self.next {
			Some(next) => self.tree.arena.predecessor(next)?,
			None => self.tree.last_node()?,
		};
		self.next = Some(id);
		let node = self.tree.arena.node_mut(id);
		Some((&node.key, &mut node.value))
	}
}

// ---------------------------------------------------------------------------
// Standard Iterators
// ---------------------------------------------------------------------------

/// An iterator over the entries of a tree, in key order.
///
/// Created by [`GenericTree::iter`].
pub struct Iter<'t, K, V> {
	arena: &'t Arena<K, V>,
	front: Link,
	back: Link,
	remaining: usize,
}

impl<'t, K, V> Iter<'t, K, V> {
	pub(crate) fn new(arena: &'t Arena<K, V>, front: Link, back: Link, remaining: usize) -> Self {
		Iter {
			arena,
			front,
			back,
			remaining,
		}
	}
}

impl<'t, K, V> Iterator for Iter<'t, K, V> {
	type Item = (&'t K, &'t V);

	fn next(&mut self) -> Option<Self::Item> {
		if self.remaining == 0 {
			return None;
		}
		let id = self.front?;
		self.remaining -= 1;
		self.front = self.arena.successor(id);
		Some(self.arena.entry(id))
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
		self.back = self.arena.predecessor(id);
		Some(self.arena.entry(id))
	}
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
	fn clone(&self) -> Self {
		Iter {
			arena: self.arena,
			front: self.front,
			back: self.back,
			remaining: self.remaining,
		}
	}
}

/// An iterator over a sub-range of the entries of a tree.
///
/// Created by [`GenericTree::range`].
pub struct Range<'t, K, V> {
	arena: &'t Arena<K, V>,
	front: Link,
	back: Link,
}

impl<'t, K, V> Range<'t, K, V> {
	/// `front` and `back` are both inclusive, and both present or both absent.
	pub(crate) fn new(arena: &'t Arena<K, V>, front: Link, back: Link) -> Self {
		Range {
			arena,
			front,
			back,
		}
	}

	fn finish(&mut self) {
		self.front = None;
		self.back = None;
	}
}

impl<'t, K, V> Iterator for Range<'t, K, V> {
	type Item = (&'t K, &'t V);

	fn next(&mut self) -> Option<Self::Item> {
		let id = self.front?;
		if self.front == self.back {
			self.finish();
		} else {
			self.front = self.arena.successor(id);
		}
		Some(self.arena.entry(id))
	}
}

impl<K, V> DoubleEndedIterator for Range<'_, K, V> {
	fn next_back(&mut self) -> Option<Self::Item> {
		let id = self.back?;
		if self.front == self.back {
			self.finish();
		} else {
			self.back = self.arena.predecessor(id);
		}
		Some(self.arena.entry(id))
	}
}

impl<K, V> FusedIterator for Range<'_, K, V> {}

impl<K, V> Clone for Range<'_, K, V> {
	fn clone(&self) -> Self {
		Range {
			arena: self.arena,
			front: self.front,
			back: self.back,
		}
	}
}

/// An owning iterator over the entries of a tree, in key order.
///
/// Created by [`IntoIterator::into_iter`] on a tree. Every node has already
/// been released to the allocator; the entries are held in a buffer.
pub struct IntoIter<K, V> {
	entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> IntoIter<K, V> {
	pub(crate) fn new(entries: Vec<(K, V)>) -> Self {
		IntoIter {
			entries: entries.into_iter(),
		}
	}
}

impl<K, V> Iterator for IntoIter<K, V> {
	type Item = (K, V);

	#[inline]
	fn next(&mut self) -> Option<Self::Item> {
		self.entries.next()
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.entries.size_hint()
	}
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
	#[inline]
	fn next_back(&mut self) -> Option<Self::Item> {
		self.entries.next_back()
	}
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

#[cfg(test)]
mod tests {
	use crate::Tree;

	fn sample() -> Tree<i32, &'static str> {
		let mut tree = Tree::new();
		for (k, v) in [(2, "two"), (4, "four"), (6, "six"), (8, "eight")] {
			tree.insert(k, v).unwrap();
		}
		tree
	}

	#[test]
	fn cursor_walks_both_ways_through_end() {
		let tree = sample();
		let mut cursor = tree.begin();
		assert_eq!(cursor.key(), Some(&2));

		for expected in [4, 6, 8] {
			cursor.move_next();
			assert_eq!(cursor.key(), Some(&expected));
		}

		cursor.move_next();
		assert!(cursor.is_end());
		assert_eq!(cursor, tree.end());
		assert_eq!(cursor.value(), None);

		// Advancing the end position stays there.
		cursor.move_next();
		assert!(cursor.is_end());

		cursor.move_prev();
		assert_eq!(cursor.key(), Some(&8));
	}

	#[test]
	fn cursor_before_first_lands_on_end() {
		let tree = sample();
		let mut cursor = tree.begin();
		cursor.move_prev();
		assert!(cursor.is_end());
		assert_eq!(cursor.peek_next(), None);
		assert_eq!(cursor.peek_prev(), Some((&8, &"eight")));
	}

	#[test]
	fn cursor_on_empty_tree() {
		let tree: Tree<i32, i32> = Tree::new();
		let mut cursor = tree.begin();
		assert_eq!(cursor, tree.end());
		cursor.move_prev();
		assert!(cursor.is_end());
		cursor.move_next();
		assert!(cursor.is_end());
	}

	#[test]
	fn cursors_on_different_trees_differ() {
		let a = sample();
		let b = sample();
		assert_ne!(a.end(), b.end());
		assert_eq!(a.end(), a.end());
	}

	#[test]
	fn bounds() {
		let tree = sample();
		assert_eq!(tree.lower_bound(&4).key(), Some(&4));
		assert_eq!(tree.lower_bound(&5).key(), Some(&6));
		assert_eq!(tree.upper_bound(&4).key(), Some(&6));
		assert_eq!(tree.lower_bound(&1).key(), Some(&2));
		assert!(tree.lower_bound(&9).is_end());
		assert!(tree.upper_bound(&8).is_end());

		let (lo, hi) = tree.equal_range(&5);
		assert_eq!(lo, hi);
		let (mut lo, hi) = tree.equal_range(&6);
		assert_ne!(lo, hi);
		lo.move_next();
		assert_eq!(lo, hi);
	}

	#[test]
	fn cursor_at_handle() {
		let tree = sample();
		let handle = tree.find(&6).unwrap();
		let cursor = tree.cursor_at(handle).unwrap();
		assert_eq!(cursor.key_value(), Some((&6, &"six")));
		assert_eq!(cursor.handle(), Some(handle));
	}

	#[test]
	fn iter_meets_in_the_middle() {
		let tree = sample();
		let mut iter = tree.iter();
		assert_eq!(iter.len(), 4);
		assert_eq!(iter.next().map(|(k, _)| *k), Some(2));
		assert_eq!(iter.next_back().map(|(k, _)| *k), Some(8));
		assert_eq!(iter.next().map(|(k, _)| *k), Some(4));
		assert_eq!(iter.next_back().map(|(k, _)| *k), Some(6));
		assert_eq!(iter.next(), None);
		assert_eq!(iter.next_back(), None);
	}

	#[test]
	fn range_bounds() {
		fn keys(range: super::Range<'_, i32, &str>) -> Vec<i32> {
			range.map(|(k, _)| *k).collect()
		}

		let tree = sample();

		assert_eq!(keys(tree.range(3..7)), [4, 6]);
		assert_eq!(keys(tree.range(4..=8)), [4, 6, 8]);
		assert_eq!(keys(tree.range(..6)), [2, 4]);
		assert_eq!(keys(tree.range(5..)), [6, 8]);
		assert_eq!(keys(tree.range::<i32, _>(..)), [2, 4, 6, 8]);
		assert_eq!(keys(tree.range(5..6)), Vec::<i32>::new());
		assert_eq!(keys(tree.range(9..)), Vec::<i32>::new());
		assert_eq!(tree.range(4..=6).rev().map(|(k, _)| *k).collect::<Vec<_>>(), [6, 4]);
	}

	#[test]
	fn range_with_excluded_start() {
		use std::ops::Bound;
		let tree = sample();
		let keys: Vec<i32> =
			tree.range((Bound::Excluded(4), Bound::Included(8))).map(|(k, _)| *k).collect();
		assert_eq!(keys, [6, 8]);
		let empty: Vec<i32> =
			tree.range((Bound::Excluded(4), Bound::Excluded(6))).map(|(k, _)| *k).collect();
		assert!(empty.is_empty());
	}

	#[test]
	fn raw_iter_seek() {
		let tree = sample();
		let mut iter = tree.raw_iter();

		iter.seek(&5);
		assert_eq!(iter.next(), Some((&6, &"six")));

		iter.seek_for_prev(&5);
		assert_eq!(iter.prev(), Some((&4, &"four")));

		iter.seek_for_prev(&4);
		assert_eq!(iter.prev(), Some((&4, &"four")));

		assert!(iter.seek_exact(&8));
		assert!(!iter.seek_exact(&7));

		iter.seek_to_first();
		assert_eq!(iter.prev(), None);
		assert_eq!(iter.next(), Some((&2, &"two")));

		iter.seek_to_last();
		assert_eq!(iter.next(), None);
		assert_eq!(iter.prev(), Some((&8, &"eight")));
	}

	#[test]
	fn raw_iter_mut_edits_in_place() {
		let mut tree = sample();
		let mut iter = tree.raw_iter_mut();

		assert!(iter.insert(5, "five").unwrap());
		assert_eq!(iter.next().map(|(k, _)| *k), Some(5));
		assert_eq!(iter.next().map(|(k, _)| *k), Some(6));

		assert_eq!(iter.remove(&4), Some((4, "four")));
		assert_eq!(iter.next().map(|(k, _)| *k), Some(5));

		iter.seek(&8);
		if let Some((_, v)) = iter.next() {
			*v = "EIGHT";
		}
		drop(iter);

		tree.assert_invariants();
		assert_eq!(tree.get(&8), Some(&"EIGHT"));
		assert!(!tree.contains_key(&4));
		assert_eq!(tree.len(), 4);
	}

	#[test]
	fn raw_iter_mut_insert_existing() {
		let mut tree = sample();
		let mut iter = tree.raw_iter_mut();
		assert!(!iter.insert(6, "SIX").unwrap());
		assert_eq!(iter.next(), Some((&6, &mut "six")));
	}
}

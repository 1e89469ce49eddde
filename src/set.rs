//! An ordered set built on the red-black tree engine.
//!
//! [`OrderedSet`] stores its elements as keys of a [`GenericTree`] with `()`
//! values, so the element *is* the key and the comparator sees it whole.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;
use std::ops::RangeBounds;

use crate::alloc::{Global, NodeAllocator};
use crate::compare::{Comparator, Natural};
use crate::iter::{self, Cursor};
use crate::{error, GenericTree, Handle};

/// An ordered set of unique elements.
///
/// # Example
///
/// ```
/// use redtree::OrderedSet;
///
/// let mut primes = OrderedSet::new();
/// for p in [7, 2, 5, 3, 2] {
///     primes.insert(p).unwrap();
/// }
///
/// assert_eq!(primes.len(), 4);
/// assert_eq!(primes.iter().copied().collect::<Vec<_>>(), [2, 3, 5, 7]);
/// assert_eq!(primes.lower_bound(&4).key(), Some(&5));
/// ```
pub struct OrderedSet<T, C = Natural, A: NodeAllocator = Global> {
	tree: GenericTree<T, (), C, A>,
}

impl<T> OrderedSet<T> {
	/// Creates an empty set ordered by [`Ord`].
	pub fn new() -> Self {
		OrderedSet {
			tree: GenericTree::new(),
		}
	}
}

impl<T, C, A: NodeAllocator> OrderedSet<T, C, A> {
	/// Creates an empty set ordered by `comparator`.
	pub fn with_comparator(comparator: C) -> Self
	where
		A: Default,
	{
		OrderedSet {
			tree: GenericTree::with_comparator(comparator),
		}
	}

	/// Creates an empty set with an explicit comparator and allocator.
	pub fn new_in(comparator: C, allocator: A) -> Self {
		OrderedSet {
			tree: GenericTree::new_in(comparator, allocator),
		}
	}

	/// Returns the underlying tree.
	pub fn as_tree(&self) -> &GenericTree<T, (), C, A> {
		&self.tree
	}

	/// Returns the comparator ordering the elements.
	pub fn key_comp(&self) -> &C {
		self.tree.comparator()
	}

	/// Returns the number of elements in the set.
	pub fn len(&self) -> usize {
		self.tree.len()
	}

	/// Returns `true` if the set contains no elements.
	pub fn is_empty(&self) -> bool {
		self.tree.is_empty()
	}

	/// Adds `value` unless an equivalent element is present.
	///
	/// Returns whether the value was newly inserted.
	pub fn insert(&mut self, value: T) -> error::Result<bool>
	where
		C: Comparator<T>,
	{
		Ok(self.tree.insert(value, ())?.1)
	}

	/// Adds `value` unless an equivalent element is present, returning the
	/// handle of the element now in the set.
	pub fn insert_handle(&mut self, value: T) -> error::Result<(Handle, bool)>
	where
		C: Comparator<T>,
	{
		self.tree.insert(value, ())
	}

	/// Returns `true` if the set contains an element equivalent to `value`.
	pub fn contains<Q>(&self, value: &Q) -> bool
	where
		T: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.contains_key(value)
	}

	/// Returns the stored element equivalent to `value`.
	pub fn get<Q>(&self, value: &Q) -> Option<&T>
	where
		T: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.get_key_value(value).map(|(k, _)| k)
	}

	/// Number of elements equivalent to `value`: 0 or 1.
	pub fn count<Q>(&self, value: &Q) -> usize
	where
		T: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.count(value)
	}

	/// Returns the handle of the element equivalent to `value`.
	pub fn find<Q>(&self, value: &Q) -> Option<Handle>
	where
		T: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.find(value)
	}

	/// Returns a cursor at the first element not ordered before `value`.
	pub fn lower_bound<Q>(&self, value: &Q) -> Cursor<'_, T, (), C, A>
	where
		T: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.lower_bound(value)
	}

	/// Returns a cursor at the first element ordered after `value`.
	pub fn upper_bound<Q>(&self, value: &Q) -> Cursor<'_, T, (), C, A>
	where
		T: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.upper_bound(value)
	}

	/// Returns `(lower_bound(value), upper_bound(value))`.
	pub fn equal_range<Q>(&self, value: &Q) -> (Cursor<'_, T, (), C, A>, Cursor<'_, T, (), C, A>)
	where
		T: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.equal_range(value)
	}

	/// Removes the element equivalent to `value`, returning whether it was
	/// present.
	pub fn remove<Q>(&mut self, value: &Q) -> bool
	where
		T: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.remove_entry(value).is_some()
	}

	/// Removes and returns the element equivalent to `value`.
	pub fn take<Q>(&mut self, value: &Q) -> Option<T>
	where
		T: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.remove_entry(value).map(|(k, _)| k)
	}

	/// Returns the element a handle refers to, or `None` if it was removed.
	pub fn get_at(&self, handle: Handle) -> Option<&T> {
		self.tree.key_value_at(handle).map(|(k, _)| k)
	}

	/// Removes and returns the element a handle refers to. Returns `None` if
	/// the handle is stale.
	pub fn remove_at(&mut self, handle: Handle) -> Option<T> {
		self.tree.remove_at(handle).map(|(k, _)| k)
	}

	/// Removes every element in `range`, returning the count.
	pub fn remove_range<Q, R>(&mut self, range: R) -> usize
	where
		T: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
		R: RangeBounds<Q>,
	{
		self.tree.remove_range(range)
	}

	/// Keeps only the elements for which `keep` returns `true`.
	pub fn retain<F>(&mut self, mut keep: F)
	where
		F: FnMut(&T) -> bool,
	{
		self.tree.retain(|k, _| keep(k))
	}

	/// Returns the smallest element.
	pub fn first(&self) -> Option<&T> {
		self.tree.first_key_value().map(|(k, _)| k)
	}

	/// Returns the largest element.
	pub fn last(&self) -> Option<&T> {
		self.tree.last_key_value().map(|(k, _)| k)
	}

	/// Removes and returns the smallest element.
	pub fn pop_first(&mut self) -> Option<T> {
		self.tree.pop_first().map(|(k, _)| k)
	}

	/// Removes and returns the largest element.
	pub fn pop_last(&mut self) -> Option<T> {
		self.tree.pop_last().map(|(k, _)| k)
	}

	/// Removes all elements.
	pub fn clear(&mut self) {
		self.tree.clear()
	}

	/// Returns an iterator over the elements, in order.
	pub fn iter(&self) -> Iter<'_, T> {
		Iter {
			inner: self.tree.iter(),
		}
	}

	/// Returns an iterator over the elements that fall in `range`.
	pub fn range<Q, R>(&self, range: R) -> Range<'_, T>
	where
		T: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
		R: RangeBounds<Q>,
	{
		Range {
			inner: self.tree.range(range),
		}
	}

	/// Returns a cursor at the first element (the end cursor if empty).
	pub fn begin(&self) -> Cursor<'_, T, (), C, A> {
		self.tree.begin()
	}

	/// Returns the one-past-the-end cursor.
	pub fn end(&self) -> Cursor<'_, T, (), C, A> {
		self.tree.end()
	}

	/// Deep-copies the set. See [`GenericTree::try_clone`].
	pub fn try_clone(&self) -> error::Result<Self>
	where
		T: Clone,
		C: Clone,
		A: Clone,
	{
		Ok(OrderedSet {
			tree: self.tree.try_clone()?,
		})
	}
}

// ---------------------------------------------------------------------------
// Iterators
// ---------------------------------------------------------------------------

/// An iterator over the elements of a set, in order.
pub struct Iter<'s, T> {
	inner: iter::Iter<'s, T, ()>,
}

impl<'s, T> Iterator for Iter<'s, T> {
	type Item = &'s T;

	fn next(&mut self) -> Option<&'s T> {
		self.inner.next().map(|(k, _)| k)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.inner.size_hint()
	}
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
	fn next_back(&mut self) -> Option<Self::Item> {
		self.inner.next_back().map(|(k, _)| k)
	}
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// An iterator over a sub-range of the elements of a set.
pub struct Range<'s, T> {
	inner: iter::Range<'s, T, ()>,
}

impl<'s, T> Iterator for Range<'s, T> {
	type Item = &'s T;

	fn next(&mut self) -> Option<&'s T> {
		self.inner.next().map(|(k, _)| k)
	}
}

impl<T> DoubleEndedIterator for Range<'_, T> {
	fn next_back(&mut self) -> Option<Self::Item> {
		self.inner.next_back().map(|(k, _)| k)
	}
}

impl<T> FusedIterator for Range<'_, T> {}

/// An owning iterator over the elements of a set, in order.
pub struct IntoIter<T> {
	inner: iter::IntoIter<T, ()>,
}

impl<T> Iterator for IntoIter<T> {
	type Item = T;

	fn next(&mut self) -> Option<T> {
		self.inner.next().map(|(k, _)| k)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.inner.size_hint()
	}
}

impl<T> DoubleEndedIterator for IntoIter<T> {
	fn next_back(&mut self) -> Option<T> {
		self.inner.next_back().map(|(k, _)| k)
	}
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

// ---------------------------------------------------------------------------
// Trait Implementations
// ---------------------------------------------------------------------------

impl<T, C: Default, A: NodeAllocator + Default> Default for OrderedSet<T, C, A> {
	fn default() -> Self {
		OrderedSet {
			tree: GenericTree::default(),
		}
	}
}

impl<T: Clone, C: Clone, A: NodeAllocator + Clone> Clone for OrderedSet<T, C, A> {
	fn clone(&self) -> Self {
		OrderedSet {
			tree: self.tree.clone(),
		}
	}
}

impl<T: fmt::Debug, C, A: NodeAllocator> fmt::Debug for OrderedSet<T, C, A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.iter()).finish()
	}
}

impl<T, C, A> Extend<T> for OrderedSet<T, C, A>
where
	C: Comparator<T>,
	A: NodeAllocator,
{
	/// # Panics
	///
	/// Panics if node storage cannot be obtained.
	fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
		for value in iter {
			if let Err(err) = self.tree.insert(value, ()) {
				panic!("failed to extend set: {}", err);
			}
		}
	}
}

impl<T, C, A> FromIterator<T> for OrderedSet<T, C, A>
where
	C: Comparator<T> + Default,
	A: NodeAllocator + Default,
{
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		let mut set = OrderedSet::default();
		set.extend(iter);
		set
	}
}

impl<T: Ord, const N: usize> From<[T; N]> for OrderedSet<T> {
	fn from(values: [T; N]) -> Self {
		values.into_iter().collect()
	}
}

impl<'s, T, C, A: NodeAllocator> IntoIterator for &'s OrderedSet<T, C, A> {
	type Item = &'s T;
	type IntoIter = Iter<'s, T>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

impl<T, C, A: NodeAllocator> IntoIterator for OrderedSet<T, C, A> {
	type Item = T;
	type IntoIter = IntoIter<T>;

	fn into_iter(self) -> Self::IntoIter {
		IntoIter {
			inner: self.tree.into_iter(),
		}
	}
}

// Whole-set comparisons are lexicographic over the elements in order.

impl<T: PartialEq, C, A: NodeAllocator> PartialEq for OrderedSet<T, C, A> {
	fn eq(&self, other: &Self) -> bool {
		self.len() == other.len() && self.iter().eq(other.iter())
	}
}

impl<T: Eq, C, A: NodeAllocator> Eq for OrderedSet<T, C, A> {}

impl<T: PartialOrd, C, A: NodeAllocator> PartialOrd for OrderedSet<T, C, A> {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		self.iter().partial_cmp(other.iter())
	}
}

impl<T: Ord, C, A: NodeAllocator> Ord for OrderedSet<T, C, A> {
	fn cmp(&self, other: &Self) -> Ordering {
		self.iter().cmp(other.iter())
	}
}

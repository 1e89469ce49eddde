//! An ordered map built on the red-black tree engine.
//!
//! [`OrderedMap`] is a thin facade: every operation forwards to
//! [`GenericTree`], adding only map conveniences (insert-or-get, indexing,
//! whole-map comparison).

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Index, RangeBounds};

use crate::alloc::{Global, NodeAllocator};
use crate::compare::{Comparator, Natural};
use crate::iter::{Cursor, IntoIter, Iter, Range};
use crate::{error, GenericTree, Handle};

/// An ordered map with unique keys.
///
/// # Example
///
/// ```
/// use redtree::OrderedMap;
///
/// let mut scores = OrderedMap::new();
/// scores.insert("carol", 72).unwrap();
/// scores.insert("alice", 90).unwrap();
/// scores.insert("bob", 85).unwrap();
///
/// let names: Vec<_> = scores.keys().copied().collect();
/// assert_eq!(names, ["alice", "bob", "carol"]);
/// assert_eq!(scores["bob"], 85);
/// ```
pub struct OrderedMap<K, V, C = Natural, A: NodeAllocator = Global> {
	tree: GenericTree<K, V, C, A>,
}

impl<K, V> OrderedMap<K, V> {
	/// Creates an empty map ordered by [`Ord`].
	pub fn new() -> Self {
		OrderedMap {
			tree: GenericTree::new(),
		}
	}
}

impl<K, V, C, A: NodeAllocator> OrderedMap<K, V, C, A> {
	/// Creates an empty map ordered by `comparator`.
	pub fn with_comparator(comparator: C) -> Self
	where
		A: Default,
	{
		OrderedMap {
			tree: GenericTree::with_comparator(comparator),
		}
	}

	/// Creates an empty map with an explicit comparator and allocator.
	pub fn new_in(comparator: C, allocator: A) -> Self {
		OrderedMap {
			tree: GenericTree::new_in(comparator, allocator),
		}
	}

	/// Returns the underlying tree.
	pub fn as_tree(&self) -> &GenericTree<K, V, C, A> {
		&self.tree
	}

	/// Unwraps the underlying tree.
	pub fn into_tree(self) -> GenericTree<K, V, C, A> {
		self.tree
	}

	/// Returns the comparator ordering the keys.
	pub fn key_comp(&self) -> &C {
		self.tree.comparator()
	}

	/// Returns the number of entries in the map.
	pub fn len(&self) -> usize {
		self.tree.len()
	}

	/// Returns `true` if the map contains no entries.
	pub fn is_empty(&self) -> bool {
		self.tree.is_empty()
	}

	/// Inserts `key` with `value` unless an equivalent key is present.
	///
	/// Returns the handle of the entry now holding the key, and whether it
	/// was newly inserted. An existing value is never overwritten; use
	/// [`get_mut`](Self::get_mut) for that.
	pub fn insert(&mut self, key: K, value: V) -> error::Result<(Handle, bool)>
	where
		C: Comparator<K>,
	{
		self.tree.insert(key, value)
	}

	/// Returns the value for `key`, inserting `make()` first if absent.
	///
	/// # Errors
	///
	/// Returns an error if the key was absent and node storage could not be
	/// obtained.
	///
	/// # Example
	///
	/// ```
	/// use redtree::OrderedMap;
	///
	/// let mut counts: OrderedMap<char, usize> = OrderedMap::new();
	/// for c in "hello".chars() {
	///     *counts.get_or_insert_with(c, || 0).unwrap() += 1;
	/// }
	/// assert_eq!(counts.get(&'l'), Some(&2));
	/// ```
	pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> error::Result<&mut V>
	where
		C: Comparator<K>,
		F: FnOnce() -> V,
	{
		let handle = match self.tree.find(&key) {
			Some(handle) => handle,
			None => self.tree.insert(key, make())?.0,
		};
		match self.tree.value_at_mut(handle) {
			Some(value) => Ok(value),
			None => unreachable!("handle {:?} issued by this call is stale", handle),
		}
	}

	/// Returns a reference to the value for `key`.
	pub fn get<Q>(&self, key: &Q) -> Option<&V>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.get(key)
	}

	/// Returns a mutable reference to the value for `key`.
	pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.get_mut(key)
	}

	/// Returns the stored key and value for `key`.
	pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.get_key_value(key)
	}

	/// Returns `true` if the map contains an equivalent key.
	pub fn contains_key<Q>(&self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.contains_key(key)
	}

	/// Number of entries with an equivalent key: 0 or 1.
	pub fn count<Q>(&self, key: &Q) -> usize
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.count(key)
	}

	/// Returns the handle of the entry with an equivalent key.
	pub fn find<Q>(&self, key: &Q) -> Option<Handle>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.find(key)
	}

	/// Returns a cursor at the first entry not ordered before `key`.
	pub fn lower_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V, C, A>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.lower_bound(key)
	}

	/// Returns a cursor at the first entry ordered after `key`.
	pub fn upper_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V, C, A>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.upper_bound(key)
	}

	/// Returns `(lower_bound(key), upper_bound(key))`.
	pub fn equal_range<Q>(&self, key: &Q) -> (Cursor<'_, K, V, C, A>, Cursor<'_, K, V, C, A>)
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.equal_range(key)
	}

	/// Removes `key`, returning its value if it was present.
	pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.remove(key)
	}

	/// Removes `key`, returning the stored key and value.
	pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
	{
		self.tree.remove_entry(key)
	}

	/// Returns the entry a handle refers to, or `None` if it was removed.
	pub fn key_value_at(&self, handle: Handle) -> Option<(&K, &V)> {
		self.tree.key_value_at(handle)
	}

	/// Returns a mutable reference to the value a handle refers to.
	pub fn value_at_mut(&mut self, handle: Handle) -> Option<&mut V> {
		self.tree.value_at_mut(handle)
	}

	/// Removes the entry a handle refers to. Returns `None` if the handle is
	/// stale.
	///
	/// # Example
	///
	/// ```
	/// use redtree::OrderedMap;
	///
	/// let mut map = OrderedMap::from([(1, "one"), (2, "two")]);
	/// let handle = map.find(&1).unwrap();
	///
	/// assert_eq!(map.remove_at(handle), Some((1, "one")));
	/// assert_eq!(map.remove_at(handle), None);
	/// ```
	pub fn remove_at(&mut self, handle: Handle) -> Option<(K, V)> {
		self.tree.remove_at(handle)
	}

	/// Removes every entry whose key falls in `range`, returning the count.
	pub fn remove_range<Q, R>(&mut self, range: R) -> usize
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
		R: RangeBounds<Q>,
	{
		self.tree.remove_range(range)
	}

	/// Keeps only the entries for which `keep` returns `true`.
	pub fn retain<F>(&mut self, keep: F)
	where
		F: FnMut(&K, &mut V) -> bool,
	{
		self.tree.retain(keep)
	}

	/// Returns the entry with the smallest key.
	pub fn first_key_value(&self) -> Option<(&K, &V)> {
		self.tree.first_key_value()
	}

	/// Returns the entry with the largest key.
	pub fn last_key_value(&self) -> Option<(&K, &V)> {
		self.tree.last_key_value()
	}

	/// Removes and returns the entry with the smallest key.
	pub fn pop_first(&mut self) -> Option<(K, V)> {
		self.tree.pop_first()
	}

	/// Removes and returns the entry with the largest key.
	pub fn pop_last(&mut self) -> Option<(K, V)> {
		self.tree.pop_last()
	}

	/// Removes all entries.
	pub fn clear(&mut self) {
		self.tree.clear()
	}

	/// Returns an iterator over the entries, in key order.
	pub fn iter(&self) -> Iter<'_, K, V> {
		self.tree.iter()
	}

	/// Returns an iterator over the keys, in order.
	pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
		self.tree.iter().map(|(k, _)| k)
	}

	/// Returns an iterator over the values, in key order.
	pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
		self.tree.iter().map(|(_, v)| v)
	}

	/// Returns an iterator over the entries whose keys fall in `range`.
	pub fn range<Q, R>(&self, range: R) -> Range<'_, K, V>
	where
		K: Borrow<Q>,
		C: Comparator<Q>,
		Q: ?Sized,
		R: RangeBounds<Q>,
	{
		self.tree.range(range)
	}

	/// Returns a cursor at the first entry (the end cursor if empty).
	pub fn begin(&self) -> Cursor<'_, K, V, C, A> {
		self.tree.begin()
	}

	/// Returns the one-past-the-end cursor.
	pub fn end(&self) -> Cursor<'_, K, V, C, A> {
		self.tree.end()
	}

	/// Deep-copies the map. See [`GenericTree::try_clone`].
	pub fn try_clone(&self) -> error::Result<Self>
	where
		K: Clone,
		V: Clone,
		C: Clone,
		A: Clone,
	{
		Ok(OrderedMap {
			tree: self.tree.try_clone()?,
		})
	}
}

impl<K, V, C: Default, A: NodeAllocator + Default> Default for OrderedMap<K, V, C, A> {
	fn default() -> Self {
		OrderedMap {
			tree: GenericTree::default(),
		}
	}
}

impl<K: Clone, V: Clone, C: Clone, A: NodeAllocator + Clone> Clone for OrderedMap<K, V, C, A> {
	fn clone(&self) -> Self {
		OrderedMap {
			tree: self.tree.clone(),
		}
	}
}

impl<K: fmt::Debug, V: fmt::Debug, C, A: NodeAllocator> fmt::Debug for OrderedMap<K, V, C, A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&self.tree, f)
	}
}

impl<K, V, C, A> Extend<(K, V)> for OrderedMap<K, V, C, A>
where
	C: Comparator<K>,
	A: NodeAllocator,
{
	/// Inserts every pair; keys already present keep their value.
	///
	/// # Panics
	///
	/// Panics if node storage cannot be obtained.
	fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
		for (key, value) in iter {
			if let Err(err) = self.tree.insert(key, value) {
				panic!("failed to extend map: {}", err);
			}
		}
	}
}

impl<K, V, C, A> FromIterator<(K, V)> for OrderedMap<K, V, C, A>
where
	C: Comparator<K> + Default,
	A: NodeAllocator + Default,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut map = OrderedMap::default();
		map.extend(iter);
		map
	}
}

impl<K, V, const N: usize> From<[(K, V); N]> for OrderedMap<K, V>
where
	K: Ord,
{
	fn from(entries: [(K, V); N]) -> Self {
		entries.into_iter().collect()
	}
}

impl<K, V, C, A, Q> Index<&Q> for OrderedMap<K, V, C, A>
where
	K: Borrow<Q>,
	C: Comparator<Q>,
	A: NodeAllocator,
	Q: ?Sized,
{
	type Output = V;

	/// # Panics
	///
	/// Panics if the key is not present.
	fn index(&self, key: &Q) -> &V {
		match self.get(key) {
			Some(value) => value,
			None => panic!("key not found in map"),
		}
	}
}

impl<'m, K, V, C, A: NodeAllocator> IntoIterator for &'m OrderedMap<K, V, C, A> {
	type Item = (&'m K, &'m V);
	type IntoIter = Iter<'m, K, V>;

	fn into_iter(self) -> Self::IntoIter {
		self.tree.iter()
	}
}

impl<K, V, C, A: NodeAllocator> IntoIterator for OrderedMap<K, V, C, A> {
	type Item = (K, V);
	type IntoIter = IntoIter<K, V>;

	fn into_iter(self) -> Self::IntoIter {
		self.tree.into_iter()
	}
}

// Whole-map comparisons are lexicographic over the entries in key order.

impl<K: PartialEq, V: PartialEq, C, A: NodeAllocator> PartialEq for OrderedMap<K, V, C, A> {
	fn eq(&self, other: &Self) -> bool {
		self.len() == other.len() && self.iter().eq(other.iter())
	}
}

impl<K: Eq, V: Eq, C, A: NodeAllocator> Eq for OrderedMap<K, V, C, A> {}

impl<K: PartialOrd, V: PartialOrd, C, A: NodeAllocator> PartialOrd for OrderedMap<K, V, C, A> {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		self.iter().partial_cmp(other.iter())
	}
}

impl<K: Ord, V: Ord, C, A: NodeAllocator> Ord for OrderedMap<K, V, C, A> {
	fn cmp(&self, other: &Self) -> Ordering {
		self.iter().cmp(other.iter())
	}
}

//! Ordering capabilities injected into the tree.
//!
//! The tree never compares keys with `<` directly. Every ordering decision is
//! made by a [`Comparator`], which answers one question: does `a` strictly
//! precede `b`? Two keys are *equivalent* when neither precedes the other, and
//! equivalent keys are treated as the same key by the tree.
//!
//! The comparator only ever sees keys. Values stored alongside a key take no
//! part in ordering.

use std::cmp::Ordering;
use std::fmt;

/// A strict weak order over `T`.
///
/// Implementations must be irreflexive (`less(a, a)` is `false`), transitive,
/// and equivalence (`!less(a, b) && !less(b, a)`) must itself be transitive.
/// A comparator that breaks these rules will not cause memory unsafety, but
/// lookups and iteration order become unspecified.
pub trait Comparator<T: ?Sized> {
	/// Returns `true` if `a` is ordered strictly before `b`.
	fn less(&self, a: &T, b: &T) -> bool;

	/// Three-way comparison derived from [`less`](Self::less).
	///
	/// Override this when a cheaper direct comparison is available.
	#[inline]
	fn compare(&self, a: &T, b: &T) -> Ordering {
		if self.less(a, b) {
			Ordering::Less
		} else if self.less(b, a) {
			Ordering::Greater
		} else {
			Ordering::Equal
		}
	}

	/// Returns `true` if neither key precedes the other.
	#[inline]
	fn equivalent(&self, a: &T, b: &T) -> bool {
		self.compare(a, b) == Ordering::Equal
	}
}

/// Ascending order as defined by [`Ord`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Natural;

impl<T: Ord + ?Sized> Comparator<T> for Natural {
	#[inline]
	fn less(&self, a: &T, b: &T) -> bool {
		a < b
	}

	#[inline]
	fn compare(&self, a: &T, b: &T) -> Ordering {
		a.cmp(b)
	}
}

/// Descending order as defined by [`Ord`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reverse;

impl<T: Ord + ?Sized> Comparator<T> for Reverse {
	#[inline]
	fn less(&self, a: &T, b: &T) -> bool {
		b < a
	}

	#[inline]
	fn compare(&self, a: &T, b: &T) -> Ordering {
		b.cmp(a)
	}
}

/// A comparator backed by a `less`-style closure.
///
/// Created with [`from_fn`].
#[derive(Clone, Copy)]
pub struct FnComparator<F>(F);

/// Wraps a closure answering "does `a` precede `b`?" as a [`Comparator`].
///
/// ```
/// use redtree::compare::{self, Comparator};
///
/// let by_len = compare::from_fn(|a: &&str, b: &&str| a.len() < b.len());
/// assert!(by_len.less(&"ab", &"abc"));
/// assert!(by_len.equivalent(&"ab", &"xy"));
/// ```
pub fn from_fn<F>(less: F) -> FnComparator<F> {
	FnComparator(less)
}

impl<T: ?Sized, F> Comparator<T> for FnComparator<F>
where
	F: Fn(&T, &T) -> bool,
{
	#[inline]
	fn less(&self, a: &T, b: &T) -> bool {
		(self.0)(a, b)
	}
}

impl<F> fmt::Debug for FnComparator<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FnComparator").finish_non_exhaustive()
	}
}

/// Orders keys by a projection of each key.
///
/// Created with [`by_key`]. Useful for sets of records ordered by one field.
#[derive(Clone, Copy)]
pub struct ByKey<F>(F);

/// Orders keys by the [`Ord`] of `project(key)`.
///
/// ```
/// use redtree::compare::{self, Comparator};
///
/// let by_abs = compare::by_key(|v: &i32| v.abs());
/// assert!(by_abs.less(&1, &-2));
/// assert!(by_abs.equivalent(&3, &-3));
/// ```
pub fn by_key<F>(project: F) -> ByKey<F> {
	ByKey(project)
}

impl<T: ?Sized, B: Ord, F> Comparator<T> for ByKey<F>
where
	F: Fn(&T) -> B,
{
	#[inline]
	fn less(&self, a: &T, b: &T) -> bool {
		(self.0)(a) < (self.0)(b)
	}

	#[inline]
	fn compare(&self, a: &T, b: &T) -> Ordering {
		(self.0)(a).cmp(&(self.0)(b))
	}
}

impl<F> fmt::Debug for ByKey<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ByKey").finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn natural_orders_ascending() {
		assert!(Natural.less(&1, &2));
		assert!(!Natural.less(&2, &1));
		assert!(!Natural.less(&2, &2));
		assert_eq!(Natural.compare(&"a", &"b"), Ordering::Less);
	}

	#[test]
	fn reverse_orders_descending() {
		assert!(Reverse.less(&2, &1));
		assert!(!Reverse.less(&1, &2));
		assert_eq!(Reverse.compare(&1, &2), Ordering::Greater);
	}

	#[test]
	fn compare_is_derived_from_less() {
		let cmp = from_fn(|a: &i32, b: &i32| a < b);
		assert_eq!(cmp.compare(&1, &2), Ordering::Less);
		assert_eq!(cmp.compare(&2, &1), Ordering::Greater);
		assert_eq!(cmp.compare(&2, &2), Ordering::Equal);
	}

	#[test]
	fn equivalence_is_mutual_non_precedence() {
		// Case-insensitive order makes distinct strings equivalent.
		let cmp = from_fn(|a: &String, b: &String| a.to_lowercase() < b.to_lowercase());
		assert!(cmp.equivalent(&"Key".to_string(), &"kEY".to_string()));
		assert!(!cmp.equivalent(&"key".to_string(), &"kez".to_string()));
	}

	#[test]
	fn by_key_projects_before_comparing() {
		let cmp = by_key(|pair: &(u32, &str)| pair.0);
		assert!(cmp.less(&(1, "z"), &(2, "a")));
		assert!(cmp.equivalent(&(7, "x"), &(7, "y")));
	}
}

//! Node allocation policies.
//!
//! Nodes live in an arena owned by the tree, but every node the arena holds is
//! first granted by a [`NodeAllocator`]. The allocator decides *whether* a node
//! may exist; the arena decides *where* it lives. The tree calls
//! [`allocate`](NodeAllocator::allocate) exactly once before a node is
//! constructed and [`deallocate`](NodeAllocator::deallocate) exactly once after
//! it is destroyed, always with the node's [`Layout`].
//!
//! Three policies are provided:
//!
//! - [`Global`]: never refuses. The default.
//! - [`Bounded`]: refuses once a fixed number of nodes are live.
//! - [`Tracking`]: wraps another policy and records allocation counts and
//!   bytes into counters shared between clones, for leak detection.
//!
//! # Usage
//!
//! ```
//! use redtree::alloc::Tracking;
//! use redtree::compare::Natural;
//! use redtree::GenericTree;
//!
//! let tracking: Tracking = Tracking::default();
//! let mut tree = GenericTree::<i32, i32, _, _>::new_in(Natural, tracking.clone());
//!
//! tree.insert(1, 10).unwrap();
//! tree.insert(2, 20).unwrap();
//! assert_eq!(tracking.stats().live_nodes(), 2);
//!
//! drop(tree);
//! tracking.check_no_leaks();
//! ```

use std::alloc::Layout;
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{self, Error};

/// Grants and reclaims node-sized blocks.
///
/// `allocate` may refuse, in which case the tree reports the error to its
/// caller and leaves itself unchanged. `deallocate` must accept every layout
/// previously granted.
pub trait NodeAllocator {
	/// Requests a block for one node with the given layout.
	fn allocate(&mut self, layout: Layout) -> error::Result<()>;

	/// Returns a block previously granted by [`allocate`](Self::allocate).
	fn deallocate(&mut self, layout: Layout);
}

/// The default policy: every request is granted.
///
/// The arena still reports [`Error::ArenaGrowth`] if the process cannot grow
/// its backing storage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Global;

impl NodeAllocator for Global {
	#[inline]
	fn allocate(&mut self, _layout: Layout) -> error::Result<()> {
		Ok(())
	}

	#[inline]
	fn deallocate(&mut self, _layout: Layout) {}
}

/// Refuses allocation once `limit` nodes are live.
///
/// Cloning a `Bounded` gives the clone its own budget with the same limit and
/// no live nodes, ready to back a freshly cloned tree.
#[derive(Debug, PartialEq, Eq)]
pub struct Bounded {
	limit: usize,
	live: usize,
}

impl Clone for Bounded {
	fn clone(&self) -> Self {
		Bounded::new(self.limit)
	}
}

impl Bounded {
	/// Creates a policy allowing at most `limit` live nodes.
	pub fn new(limit: usize) -> Self {
		Bounded {
			limit,
			live: 0,
		}
	}

	/// Maximum number of live nodes.
	pub fn limit(&self) -> usize {
		self.limit
	}

	/// Number of nodes currently granted.
	pub fn live(&self) -> usize {
		self.live
	}

	/// Changes the limit. Nodes already granted are unaffected.
	pub fn set_limit(&mut self, limit: usize) {
		self.limit = limit;
	}
}

impl NodeAllocator for Bounded {
	fn allocate(&mut self, layout: Layout) -> error::Result<()> {
		if self.live >= self.limit {
			log::debug!("bounded allocator refused node: {} of {} live", self.live, self.limit);
			return Err(Error::AllocationFailure {
				size: layout.size(),
			});
		}
		self.live += 1;
		Ok(())
	}

	fn deallocate(&mut self, _layout: Layout) {
		self.live = self.live.saturating_sub(1);
	}
}

#[derive(Debug, Default)]
struct Counters {
	alloc_count: AtomicUsize,
	dealloc_count: AtomicUsize,
	bytes_allocated: AtomicIsize,
	peak_bytes: AtomicUsize,
}

/// Records every grant and release made through an inner policy.
///
/// Clones share their counters, so a test can hand one clone to a tree and
/// keep another to inspect after the tree is gone.
#[derive(Debug, Clone, Default)]
pub struct Tracking<A = Global> {
	inner: A,
	counters: Arc<Counters>,
}

impl<A> Tracking<A> {
	/// Wraps `inner`, starting with zeroed counters.
	pub fn new(inner: A) -> Self {
		Tracking {
			inner,
			counters: Arc::default(),
		}
	}

	/// Returns the wrapped policy.
	pub fn inner(&self) -> &A {
		&self.inner
	}

	/// Returns the wrapped policy mutably.
	pub fn inner_mut(&mut self) -> &mut A {
		&mut self.inner
	}

	/// Resets all counters to zero.
	pub fn reset_counters(&self) {
		self.counters.alloc_count.store(0, Ordering::SeqCst);
		self.counters.dealloc_count.store(0, Ordering::SeqCst);
		self.counters.bytes_allocated.store(0, Ordering::SeqCst);
		self.counters.peak_bytes.store(0, Ordering::SeqCst);
	}

	/// Returns the current allocation statistics.
	pub fn stats(&self) -> AllocationStats {
		AllocationStats {
			alloc_count: self.counters.alloc_count.load(Ordering::SeqCst),
			dealloc_count: self.counters.dealloc_count.load(Ordering::SeqCst),
			bytes_allocated: self.counters.bytes_allocated.load(Ordering::SeqCst),
			peak_bytes: self.counters.peak_bytes.load(Ordering::SeqCst),
		}
	}

	/// Checks that every granted node has been released.
	///
	/// # Panics
	///
	/// Panics if there are unmatched allocations or bytes still allocated.
	pub fn check_no_leaks(&self) {
		let stats = self.stats();
		let diff = stats.alloc_count as isize - stats.dealloc_count as isize;

		if diff != 0 {
			panic!(
				"Node leak detected!\n\
				 Allocations: {}\n\
				 Deallocations: {}\n\
				 Difference: {}\n\
				 Bytes still allocated: {}",
				stats.alloc_count, stats.dealloc_count, diff, stats.bytes_allocated
			);
		}

		if stats.bytes_allocated != 0 {
			panic!(
				"Node leak detected!\n\
				 Bytes still allocated: {}\n\
				 (alloc_count == dealloc_count but bytes != 0, possible layout mismatch)",
				stats.bytes_allocated
			);
		}
	}
}

impl<A: NodeAllocator> NodeAllocator for Tracking<A> {
	fn allocate(&mut self, layout: Layout) -> error::Result<()> {
		// Refusals are not counted.
		self.inner.allocate(layout)?;

		self.counters.alloc_count.fetch_add(1, Ordering::Relaxed);
		let size = layout.size() as isize;
		let current = self.counters.bytes_allocated.fetch_add(size, Ordering::Relaxed) + size;
		self.counters.peak_bytes.fetch_max(current.max(0) as usize, Ordering::Relaxed);
		Ok(())
	}

	fn deallocate(&mut self, layout: Layout) {
		self.counters.dealloc_count.fetch_add(1, Ordering::Relaxed);
		self.counters.bytes_allocated.fetch_sub(layout.size() as isize, Ordering::Relaxed);
		self.inner.deallocate(layout);
	}
}

/// Allocation statistics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationStats {
	/// Total number of node grants since reset.
	pub alloc_count: usize,
	/// Total number of node releases since reset.
	pub dealloc_count: usize,
	/// Bytes currently granted.
	pub bytes_allocated: isize,
	/// Peak bytes granted since reset.
	pub peak_bytes: usize,
}

impl AllocationStats {
	/// Nodes granted and not yet released.
	pub fn live_nodes(&self) -> usize {
		self.alloc_count.saturating_sub(self.dealloc_count)
	}
}

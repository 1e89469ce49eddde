//! # Error Types for the Red-Black Tree
//!
//! This module defines the error type returned by the operations that have to
//! find storage for a new node.
//!
//! ## Error Handling Strategy
//!
//! Almost nothing in the tree can fail. Structural corrections (rotations and
//! recolorings) are the mechanism the tree uses to stay valid, so they never
//! surface to the caller. The outcomes that look like failures in other
//! container libraries are ordinary return values here:
//!
//! | Situation                    | Signalled as                          |
//! |------------------------------|---------------------------------------|
//! | Key already present          | `Ok((handle, false))` from `insert`   |
//! | Key not present              | `None` from `get`, `find`, `remove`   |
//! | Cursor moved past the end    | the end position, `None` on access    |
//! | Node storage unavailable     | `Err(Error)`                          |
//!
//! ## Error Flow
//!
//! ```text
//! insert(key, value)
//!      │
//!      ▼
//! Descend to the vacant slot ─────► key exists ───► Ok((existing, false))
//!      │
//!      ▼
//! allocator.allocate(layout) ─────► Err(AllocationFailure) ─┐
//!      │                                                    │
//!      ▼                                                    │
//! arena.reserve() ────────────────► Err(ArenaGrowth) ───────┤
//!      │                                                    ▼
//!      ▼                                       tree left exactly as it was
//! Link node, run fixup
//!      │
//!      ▼
//! Ok((new, true))
//! ```
//!
//! Both failure points are reached before the tree is touched, which is what
//! gives insertion its all-or-nothing guarantee.

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors that can occur during tree operations.
///
/// Every variant is an allocation failure of some kind. When one is returned
/// the tree is guaranteed to be in the state it was in before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// The tree's [`NodeAllocator`](crate::alloc::NodeAllocator) refused to
	/// provide a block for a new node.
	///
	/// This is what a bounded or instrumented allocator returns when its
	/// budget is exhausted.
	#[error("node allocator refused a block of {size} bytes")]
	AllocationFailure {
		/// Size in bytes of the node that could not be allocated.
		size: usize,
	},

	/// The node arena could not grow to make room for another node.
	///
	/// The allocator had already granted the block; it is handed back before
	/// this error is returned.
	#[error("node arena could not grow: {0}")]
	ArenaGrowth(#[from] TryReserveError),
}

/// A Result type alias using our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for the arena allocator.

use thiserror::Error;

/// Errors returned by [`FixedArena`](crate::FixedArena) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
  /// No free segment can hold the request once alignment padding is added.
  #[error("out of memory: no free segment fits {size} bytes aligned to {align}")]
  OutOfMemory { size: usize, align: usize },

  /// The pointer is not a live allocation of this arena (foreign or already released).
  #[error("invalid free: {address:#x} is not a live allocation")]
  InvalidFree { address: usize },

  /// Alignment must be a non-zero power of two.
  #[error("invalid alignment: {0} is not a power of two")]
  InvalidAlignment(usize),

  /// Rounding the requested capacity up to the maximum alignment overflowed.
  #[error("capacity overflow: {0} bytes cannot be rounded to the maximum alignment")]
  CapacityOverflow(usize),

  /// The system allocator refused to reserve the arena buffer.
  #[error("failed to reserve an arena of {0} bytes")]
  ReserveFailed(usize),
}

/// A broken free-list or registry invariant, found by
/// [`FixedArena::check_invariants`](crate::FixedArena::check_invariants).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
  #[error("free segment at {offset} is empty")]
  EmptySegment { offset: usize },

  #[error("free segment at {offset} overlaps or precedes the one at {next}")]
  Unordered { offset: usize, next: usize },

  #[error("free segments at {offset} and {next} touch but were not merged")]
  Uncoalesced { offset: usize, next: usize },

  #[error("range [{offset}, {end}) exceeds capacity {capacity}")]
  OutOfBounds {
    offset: usize,
    end: usize,
    capacity: usize,
  },

  #[error("byte range at {offset} is not covered by any segment or allocation")]
  Gap { offset: usize },

  #[error("byte range at {offset} is covered twice")]
  Overlap { offset: usize },

  #[error("allocation record for {address:#x} does not point inside its carved range")]
  BadRecord { address: usize },
}

/// Result type for arena operations.
pub type Result<T> = std::result::Result<T, ArenaError>;

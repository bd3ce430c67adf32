//! # rarena - A Fixed-Capacity Arena Allocator
//!
//! This crate provides a **first-fit arena allocator**: one buffer is reserved
//! up front and variable-sized, arbitrarily aligned blocks are carved out of it
//! and handed back later.
//!
//! ## Overview
//!
//! ```text
//!   Arena Layout:
//!
//!   base_address
//!   ▼
//!   ┌──────┬────┬────────┬──────────┬─────┬────────────────────────────┐
//!   │  A1  │pad │   A2   │   free   │ A3  │           free             │
//!   └──────┴────┴────────┴──────────┴─────┴────────────────────────────┘
//!   0                     ▲                ▲                          total_size
//!                         │                │
//!                  Segment {offset, size}  Segment {offset, size}
//!
//!   Free list:  [ (o1, s1), (o2, s2) ]   sorted by offset, never touching
//!   Registry:   { addr(A1) -> record, addr(A2) -> record, addr(A3) -> record }
//! ```
//!
//! Free segments and live allocations always partition `[0, total_size)`
//! exactly. Alignment padding in front of a block belongs to that block's
//! record and returns to the free list with it.
//!
//! ## Crate Structure
//!
//! ```text
//!   rarena
//!   ├── align        - Alignment macros (align!, align_to!) and MAX_ALIGN
//!   ├── segment      - Segment and AllocationRecord value types
//!   ├── free_list    - First-fit carving and coalescing release
//!   ├── arena        - FixedArena implementation
//!   ├── resource     - MemoryResource trait for allocator-aware containers
//!   ├── diagnostics  - Invalid-free and leak reporting sinks
//!   └── error        - ArenaError and InvariantViolation
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rarena::FixedArena;
//!
//! let mut arena = FixedArena::new(1024)?;
//!
//! let block = arena.allocate(8, 8)?;
//! unsafe { (block.as_ptr() as *mut u64).write(42) };
//! assert_eq!(42, unsafe { (block.as_ptr() as *const u64).read() });
//!
//! arena.deallocate(block, 8, 8)?;
//! assert_eq!(arena.capacity(), arena.free_bytes());
//! # Ok::<(), rarena::ArenaError>(())
//! ```
//!
//! ## How It Works
//!
//! Allocation walks the free list from the lowest offset and takes the first
//! segment where `padding + size` fits:
//!
//! ```text
//!   Before:   ┌──────────────────── segment (3, 29) ───────────────────┐
//!   alloc(4, align 4):
//!   After:    ┌pad┬──────┬───────────── segment (8, 24) ───────────────┐
//!              3   4..8
//!                  ▲
//!                  └── Pointer returned to user
//! ```
//!
//! Release puts the carved range back in sorted position and merges it with
//! the previous and next segment when they touch:
//!
//! ```text
//!   [ (0,16) ]  [ released (16,16) ]  [ (32,16) ]   ──►   [ (0,48) ]
//! ```
//!
//! ## Diagnostics
//!
//! Releasing an unknown pointer and dropping an arena with live blocks are
//! caller bugs, not failures. They are reported to a [`DiagnosticSink`]
//! ([`TracingSink`] by default, [`RecordingSink`] for tests) and never panic.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization primitives
//! - **Fixed capacity**: the arena never grows
//! - **First-fit only**: no best-fit or size classes, no compaction
//! - **Unix-only**: the buffer comes from `posix_memalign`
//!
//! ## Safety
//!
//! Allocation and release are safe calls; the arena only does arithmetic on
//! the pointers it hands out. Reading or writing through those pointers is
//! `unsafe` and only valid between `allocate` and the matching `deallocate`.

pub mod align;
mod arena;
mod diagnostics;
mod error;
mod free_list;
mod resource;
mod segment;

pub use align::MAX_ALIGN;
pub use arena::FixedArena;
pub use diagnostics::{Diagnostic, DiagnosticSink, RecordingSink, TracingSink};
pub use error::{ArenaError, InvariantViolation, Result};
pub use resource::MemoryResource;
pub use segment::{AllocationRecord, Segment};

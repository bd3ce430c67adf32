use std::{
  collections::BTreeMap,
  fmt,
  ptr::{self, NonNull},
};

use crate::{
  align::{MAX_ALIGN, checked_align_up},
  diagnostics::{Diagnostic, DiagnosticSink, TracingSink},
  error::{ArenaError, InvariantViolation, Result},
  free_list::FreeList,
  segment::{AllocationRecord, Segment},
};

/// A fixed-capacity allocator carving first-fit blocks out of one buffer.
///
/// The buffer is reserved once in [`FixedArena::new`] and released on drop.
/// Free space is a sorted list of segments; every release is merged with its
/// neighbours immediately. Live blocks are tracked by address so that a
/// release can be validated and reversed.
pub struct FixedArena {
  buffer: *mut u8,
  capacity: usize,
  free: FreeList,
  live: BTreeMap<usize, AllocationRecord>,
  sink: Box<dyn DiagnosticSink>,
}

impl FixedArena {
  /// Reserves an arena of `total_bytes` rounded up to [`MAX_ALIGN`].
  /// Diagnostics go to a [`TracingSink`].
  pub fn new(total_bytes: usize) -> Result<Self> {
    Self::with_sink(total_bytes, Box::new(TracingSink))
  }

  pub fn with_sink(
    total_bytes: usize,
    sink: Box<dyn DiagnosticSink>,
  ) -> Result<Self> {
    let capacity = checked_align_up(total_bytes, MAX_ALIGN).ok_or(ArenaError::CapacityOverflow(total_bytes))?;

    let buffer = if capacity == 0 {
      ptr::null_mut()
    } else {
      reserve(capacity)?
    };

    tracing::debug!(requested = total_bytes, capacity, "arena reserved");

    Ok(Self {
      buffer,
      capacity,
      free: FreeList::new(capacity),
      live: BTreeMap::new(),
      sink,
    })
  }

  /// Returns a block of at least `size` bytes aligned to `alignment`.
  ///
  /// The lowest free segment that fits `padding + size` is used and shrinks
  /// from its low end by that amount. A zero-byte request is served as a
  /// one-byte request so every live block has its own address; it therefore
  /// needs `padding + 1` bytes and does not fit a segment holding only the
  /// padding.
  pub fn allocate(
    &mut self,
    size: usize,
    alignment: usize,
  ) -> Result<NonNull<u8>> {
    if !alignment.is_power_of_two() {
      return Err(ArenaError::InvalidAlignment(alignment));
    }

    let request = size.max(1);
    let base = self.base_address();
    let carve = self
      .free
      .carve(base, request, alignment)
      .ok_or(ArenaError::OutOfMemory { size, align: alignment })?;

    let data_offset = carve.data_offset();
    // SAFETY: the carve lies inside `[0, capacity)`, and a carve can only
    // succeed when the buffer is non-null.
    let pointer = unsafe { NonNull::new_unchecked(self.buffer.add(data_offset)) };

    self.live.insert(
      pointer.as_ptr().addr(),
      AllocationRecord {
        pointer,
        size: request,
        offset: carve.offset,
        span: carve.span,
      },
    );

    tracing::trace!(
      offset = data_offset,
      size = request,
      padding = carve.padding,
      alignment,
      "allocate"
    );

    Ok(pointer)
  }

  /// Returns a block to the free list.
  ///
  /// The recorded range is authoritative; `size` and `alignment` are only
  /// used for diagnostics. An unknown or already released pointer is reported
  /// to the sink and leaves the arena untouched.
  pub fn deallocate(
    &mut self,
    pointer: NonNull<u8>,
    size: usize,
    _alignment: usize,
  ) -> Result<()> {
    let address = pointer.as_ptr().addr();

    let Some(record) = self.live.remove(&address) else {
      self.sink.report(&Diagnostic::InvalidFree { address, size });
      return Err(ArenaError::InvalidFree { address });
    };

    if record.size != size.max(1) {
      tracing::debug!(
        offset = record.offset,
        recorded = record.size,
        given = size,
        "deallocate size differs from allocation"
      );
    }

    let merged = self.free.release(record.as_segment());

    tracing::trace!(
      offset = record.offset,
      span = record.span,
      merged_offset = merged.offset,
      merged_size = merged.size,
      "deallocate"
    );

    Ok(())
  }

  /// Identity: two arenas are equal only if they are the same instance.
  pub fn is_equal(
    &self,
    other: &FixedArena,
  ) -> bool {
    ptr::eq(self, other)
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn base_address(&self) -> usize {
    self.buffer.addr()
  }

  pub fn free_bytes(&self) -> usize {
    self.free.free_bytes()
  }

  /// Bytes held by live blocks, padding included.
  pub fn used_bytes(&self) -> usize {
    self.live.values().map(|r| r.span).sum()
  }

  pub fn live_count(&self) -> usize {
    self.live.len()
  }

  pub fn free_segments(&self) -> &[Segment] {
    self.free.segments()
  }

  /// Live blocks in ascending address order.
  pub fn live_allocations(&self) -> impl Iterator<Item = &AllocationRecord> {
    self.live.values()
  }

  pub fn record_for(
    &self,
    pointer: NonNull<u8>,
  ) -> Option<&AllocationRecord> {
    self.live.get(&pointer.as_ptr().addr())
  }

  /// Whether `pointer` lies inside the arena buffer.
  pub fn contains(
    &self,
    pointer: *const u8,
  ) -> bool {
    let address = pointer.addr();
    let base = self.base_address();
    self.capacity > 0 && address >= base && address - base < self.capacity
  }

  /// Checks that free segments are sorted and coalesced, that every record
  /// points inside its own range, and that free and live ranges together
  /// cover `[0, capacity)` exactly once.
  pub fn check_invariants(&self) -> std::result::Result<(), InvariantViolation> {
    self.free.check(self.capacity)?;

    let base = self.base_address();
    let mut ranges: Vec<(usize, usize)> = self.free.segments().iter().map(|s| (s.offset, s.end())).collect();

    for record in self.live.values() {
      let address = record.pointer.as_ptr().addr();
      if record.span < record.size || address != base + record.offset + record.padding() {
        return Err(InvariantViolation::BadRecord { address });
      }
      ranges.push((record.offset, record.offset + record.span));
    }

    ranges.sort_unstable();

    let mut cursor = 0;
    for (start, end) in ranges {
      if start > cursor {
        return Err(InvariantViolation::Gap { offset: cursor });
      }
      if start < cursor {
        return Err(InvariantViolation::Overlap { offset: start });
      }
      if end > self.capacity {
        return Err(InvariantViolation::OutOfBounds {
          offset: start,
          end,
          capacity: self.capacity,
        });
      }
      cursor = end;
    }

    if cursor != self.capacity {
      return Err(InvariantViolation::Gap { offset: cursor });
    }

    Ok(())
  }
}

fn reserve(capacity: usize) -> Result<*mut u8> {
  let mut memory: *mut libc::c_void = ptr::null_mut();

  let status = unsafe { libc::posix_memalign(&mut memory, MAX_ALIGN, capacity) };

  if status != 0 || memory.is_null() {
    return Err(ArenaError::ReserveFailed(capacity));
  }

  Ok(memory.cast())
}

impl Drop for FixedArena {
  fn drop(&mut self) {
    if !self.live.is_empty() {
      self.sink.report(&Diagnostic::Leak {
        blocks: self.live.len(),
        bytes: self.used_bytes(),
      });
    }

    if !self.buffer.is_null() {
      unsafe { libc::free(self.buffer.cast()) };
    }
  }
}

impl fmt::Debug for FixedArena {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("FixedArena")
      .field("base", &self.buffer)
      .field("capacity", &self.capacity)
      .field("free", &self.free.segments())
      .field("live", &self.live.len())
      .finish()
  }
}

use std::ptr::NonNull;

/// A free byte range `[offset, offset + size)` relative to the arena base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
  pub offset: usize,
  pub size: usize,
}

impl Segment {
  pub fn new(
    offset: usize,
    size: usize,
  ) -> Self {
    Self { offset, size }
  }

  /// One past the last byte of the segment.
  pub fn end(&self) -> usize {
    self.offset + self.size
  }
}

/// Bookkeeping for one live allocation.
///
/// `offset` is where the carved range starts, so it includes any alignment
/// padding in front of `pointer`. `span` is the carved length
/// (`padding + size`) and is what goes back to the free list on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationRecord {
  pub pointer: NonNull<u8>,
  pub size: usize,
  pub offset: usize,
  pub span: usize,
}

impl AllocationRecord {
  /// Bytes skipped in front of the returned pointer.
  pub fn padding(&self) -> usize {
    self.span - self.size
  }

  /// The carved range as a segment, ready to be handed back to the free list.
  pub fn as_segment(&self) -> Segment {
    Segment::new(self.offset, self.span)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_record_to_segment() {
    let record = AllocationRecord {
      pointer: NonNull::dangling(),
      size: 10,
      offset: 32,
      span: 14,
    };

    assert_eq!(4, record.padding());
    assert_eq!(Segment::new(32, 14), record.as_segment());
    assert_eq!(46, record.as_segment().end());
  }
}

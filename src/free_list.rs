use crate::{align::checked_align_up, error::InvariantViolation, segment::Segment};

/// Where a request landed inside a free segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Carve {
  /// Start of the consumed range (the old segment offset).
  pub offset: usize,
  pub padding: usize,
  /// `padding + size`: how far the segment advanced.
  pub span: usize,
}

impl Carve {
  /// Offset of the aligned block handed to the caller.
  pub fn data_offset(&self) -> usize {
    self.offset + self.padding
  }
}

/// Free ranges of an arena, sorted by offset, never overlapping and never
/// touching.
#[derive(Debug)]
pub struct FreeList {
  segments: Vec<Segment>,
}

impl FreeList {
  /// A list holding one segment that covers `[0, capacity)`.
  pub fn new(capacity: usize) -> Self {
    let segments = if capacity == 0 {
      Vec::new()
    } else {
      vec![Segment::new(0, capacity)]
    };
    Self { segments }
  }

  pub fn segments(&self) -> &[Segment] {
    &self.segments
  }

  pub fn free_bytes(&self) -> usize {
    self.segments.iter().map(|s| s.size).sum()
  }

  /// First-fit: takes `size` bytes aligned to `alignment` from the lowest
  /// segment that can hold them once padding is added. `base` is the arena
  /// start address and only matters for computing padding.
  ///
  /// The chosen segment is removed on an exact fit, otherwise it shrinks from
  /// its low end by `padding + size`.
  pub fn carve(
    &mut self,
    base: usize,
    size: usize,
    alignment: usize,
  ) -> Option<Carve> {
    let (index, carve) = self
      .segments
      .iter()
      .enumerate()
      .find_map(|(index, segment)| Self::fit(base, segment, size, alignment).map(|c| (index, c)))?;

    let segment = &mut self.segments[index];
    if carve.span == segment.size {
      self.segments.remove(index);
    } else {
      segment.offset += carve.span;
      segment.size -= carve.span;
    }

    Some(carve)
  }

  fn fit(
    base: usize,
    segment: &Segment,
    size: usize,
    alignment: usize,
  ) -> Option<Carve> {
    let start = base.checked_add(segment.offset)?;
    let aligned = checked_align_up(start, alignment)?;
    let padding = aligned - start;
    let span = padding.checked_add(size)?;

    (span <= segment.size).then_some(Carve {
      offset: segment.offset,
      padding,
      span,
    })
  }

  /// Puts a range back in sorted position and merges it with the previous
  /// and/or next segment when they touch. Returns the segment that now holds
  /// the released bytes.
  pub fn release(
    &mut self,
    segment: Segment,
  ) -> Segment {
    let mut index = self.segments.partition_point(|s| s.offset < segment.offset);
    self.segments.insert(index, segment);

    if index > 0 && self.segments[index - 1].end() == segment.offset {
      self.segments[index - 1].size += segment.size;
      self.segments.remove(index);
      index -= 1;
    }

    if index + 1 < self.segments.len() && self.segments[index].end() == self.segments[index + 1].offset {
      let next = self.segments.remove(index + 1);
      self.segments[index].size += next.size;
    }

    self.segments[index]
  }

  /// Verifies ordering, non-adjacency and bounds against `capacity`.
  pub fn check(
    &self,
    capacity: usize,
  ) -> Result<(), InvariantViolation> {
    for (index, segment) in self.segments.iter().enumerate() {
      if segment.size == 0 {
        return Err(InvariantViolation::EmptySegment { offset: segment.offset });
      }
      if segment.end() > capacity {
        return Err(InvariantViolation::OutOfBounds {
          offset: segment.offset,
          end: segment.end(),
          capacity,
        });
      }
      if let Some(next) = self.segments.get(index + 1) {
        if segment.end() > next.offset {
          return Err(InvariantViolation::Unordered {
            offset: segment.offset,
            next: next.offset,
          });
        }
        if segment.end() == next.offset {
          return Err(InvariantViolation::Uncoalesced {
            offset: segment.offset,
            next: next.offset,
          });
        }
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn list(segments: &[(usize, usize)]) -> FreeList {
    FreeList {
      segments: segments.iter().map(|&(o, s)| Segment::new(o, s)).collect(),
    }
  }

  fn pairs(list: &FreeList) -> Vec<(usize, usize)> {
    list.segments().iter().map(|s| (s.offset, s.size)).collect()
  }

  #[test]
  fn test_carve_is_first_fit() {
    let mut free = list(&[(0, 16), (32, 16)]);

    let carve = free.carve(0, 8, 1).unwrap();

    assert_eq!(0, carve.data_offset());
    assert_eq!(vec![(8, 8), (32, 16)], pairs(&free));
  }

  #[test]
  fn test_carve_skips_segments_too_small_after_padding() {
    // base 0: offset 1 needs 7 bytes of padding for alignment 8
    let mut free = list(&[(1, 10), (24, 8)]);

    let carve = free.carve(0, 8, 8).unwrap();

    assert_eq!(24, carve.data_offset());
    assert_eq!(0, carve.padding);
    assert_eq!(vec![(1, 10)], pairs(&free));
  }

  #[test]
  fn test_carve_absorbs_padding_into_segment_advance() {
    let mut free = list(&[(3, 29)]);

    let carve = free.carve(0, 4, 4).unwrap();

    assert_eq!(Carve { offset: 3, padding: 1, span: 5 }, carve);
    assert_eq!(4, carve.data_offset());
    assert_eq!(vec![(8, 24)], pairs(&free));
  }

  #[test]
  fn test_carve_uses_base_address_for_padding() {
    let mut free = list(&[(0, 32)]);

    let carve = free.carve(0x1004, 8, 16).unwrap();

    assert_eq!(12, carve.padding);
    assert_eq!(vec![(20, 12)], pairs(&free));
  }

  #[test]
  fn test_carve_exact_fit_removes_segment() {
    let mut free = list(&[(0, 16), (32, 16)]);

    free.carve(0, 16, 1).unwrap();

    assert_eq!(vec![(32, 16)], pairs(&free));
  }

  #[test]
  fn test_carve_none_when_nothing_fits() {
    let mut free = list(&[(0, 16), (32, 16)]);

    assert_eq!(None, free.carve(0, 17, 1));
    assert_eq!(None, free.carve(usize::MAX - 4, 4, 16));
    assert_eq!(vec![(0, 16), (32, 16)], pairs(&free));
  }

  #[test]
  fn test_release_merges_both_neighbours() {
    let mut free = list(&[(0, 16), (32, 16)]);

    let merged = free.release(Segment::new(16, 16));

    assert_eq!(Segment::new(0, 48), merged);
    assert_eq!(vec![(0, 48)], pairs(&free));
  }

  #[test]
  fn test_release_merges_with_previous_only() {
    let mut free = list(&[(0, 16), (40, 8)]);

    free.release(Segment::new(16, 8));

    assert_eq!(vec![(0, 24), (40, 8)], pairs(&free));
  }

  #[test]
  fn test_release_merges_with_next_only() {
    let mut free = list(&[(0, 8), (32, 16)]);

    free.release(Segment::new(24, 8));

    assert_eq!(vec![(0, 8), (24, 24)], pairs(&free));
  }

  #[test]
  fn test_release_keeps_order_without_merge() {
    let mut free = list(&[(8, 8), (40, 8)]);

    free.release(Segment::new(24, 4));
    free.release(Segment::new(0, 4));
    free.release(Segment::new(60, 4));

    assert_eq!(vec![(0, 4), (8, 8), (24, 4), (40, 8), (60, 4)], pairs(&free));
    assert!(free.check(64).is_ok());
  }

  #[test]
  fn test_release_into_empty_list() {
    let mut free = list(&[]);

    free.release(Segment::new(16, 16));

    assert_eq!(vec![(16, 16)], pairs(&free));
  }

  #[test]
  fn test_check_reports_violations() {
    assert_eq!(
      Err(InvariantViolation::Uncoalesced { offset: 0, next: 8 }),
      list(&[(0, 8), (8, 8)]).check(64)
    );
    assert_eq!(
      Err(InvariantViolation::Unordered { offset: 16, next: 0 }),
      list(&[(16, 8), (0, 8)]).check(64)
    );
    assert_eq!(
      Err(InvariantViolation::OutOfBounds {
        offset: 60,
        end: 68,
        capacity: 64
      }),
      list(&[(60, 8)]).check(64)
    );
    assert_eq!(Err(InvariantViolation::EmptySegment { offset: 4 }), list(&[(4, 0)]).check(64));
  }

  #[test]
  fn test_new_zero_capacity_is_empty() {
    let free = FreeList::new(0);

    assert!(free.segments().is_empty());
    assert_eq!(0, free.free_bytes());
  }
}

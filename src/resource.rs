use std::{
  alloc::Layout,
  ptr::{self, NonNull},
};

use crate::{arena::FixedArena, error::Result};

/// The allocation contract consumed by allocator-aware containers.
///
/// Containers hold a `&mut dyn MemoryResource` (or a generic `R`) and request
/// one block per node; they use [`is_equal`](MemoryResource::is_equal) to
/// decide whether memory from one resource may be released into another.
pub trait MemoryResource {
  fn allocate(
    &mut self,
    size: usize,
    alignment: usize,
  ) -> Result<NonNull<u8>>;

  fn deallocate(
    &mut self,
    pointer: NonNull<u8>,
    size: usize,
    alignment: usize,
  ) -> Result<()>;

  fn is_equal(
    &self,
    other: &dyn MemoryResource,
  ) -> bool;

  fn allocate_layout(
    &mut self,
    layout: Layout,
  ) -> Result<NonNull<u8>> {
    self.allocate(layout.size(), layout.align())
  }

  fn deallocate_layout(
    &mut self,
    pointer: NonNull<u8>,
    layout: Layout,
  ) -> Result<()> {
    self.deallocate(pointer, layout.size(), layout.align())
  }
}

impl MemoryResource for FixedArena {
  fn allocate(
    &mut self,
    size: usize,
    alignment: usize,
  ) -> Result<NonNull<u8>> {
    FixedArena::allocate(self, size, alignment)
  }

  fn deallocate(
    &mut self,
    pointer: NonNull<u8>,
    size: usize,
    alignment: usize,
  ) -> Result<()> {
    FixedArena::deallocate(self, pointer, size, alignment)
  }

  fn is_equal(
    &self,
    other: &dyn MemoryResource,
  ) -> bool {
    ptr::addr_eq(self as *const Self, other as *const dyn MemoryResource)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ArenaError;

  struct Node {
    value: u64,
    next: Option<NonNull<Node>>,
  }

  /// Pushes each value as a heap node taken from `resource`, newest first.
  fn push_all<R: MemoryResource + ?Sized>(
    resource: &mut R,
    values: &[u64],
  ) -> Result<Option<NonNull<Node>>> {
    let mut head = None;
    for &value in values {
      let node = resource.allocate_layout(Layout::new::<Node>())?.cast::<Node>();
      unsafe { node.as_ptr().write(Node { value, next: head }) };
      head = Some(node);
    }
    Ok(head)
  }

  fn pop_all<R: MemoryResource + ?Sized>(
    resource: &mut R,
    mut head: Option<NonNull<Node>>,
  ) -> Vec<u64> {
    let mut values = Vec::new();
    while let Some(node) = head {
      let Node { value, next } = unsafe { node.as_ptr().read() };
      resource.deallocate_layout(node.cast(), Layout::new::<Node>()).unwrap();
      values.push(value);
      head = next;
    }
    values
  }

  #[test]
  fn test_node_container_through_trait_object() {
    let mut arena = FixedArena::new(4096).unwrap();
    let resource: &mut dyn MemoryResource = &mut arena;

    let head = push_all(resource, &[1, 2, 3]).unwrap();
    assert_eq!(vec![3, 2, 1], pop_all(resource, head));

    let head = push_all(resource, &[10, 20]).unwrap();
    assert_eq!(vec![20, 10], pop_all(resource, head));

    assert_eq!(0, arena.live_count());
    assert_eq!(arena.capacity(), arena.free_bytes());
  }

  #[test]
  fn test_node_container_runs_out_of_memory() {
    let mut arena = FixedArena::new(64).unwrap();

    let result = push_all(&mut arena, &[42; 16]);

    assert!(matches!(result, Err(ArenaError::OutOfMemory { .. })));
    assert!(arena.check_invariants().is_ok());
  }

  #[test]
  fn test_is_equal_through_trait() {
    let first = FixedArena::new(64).unwrap();
    let second = FixedArena::new(64).unwrap();

    assert!(MemoryResource::is_equal(&first, &first));
    assert!(!MemoryResource::is_equal(&first, &second));
  }

  #[test]
  fn test_layout_alignment_is_honoured() {
    let mut arena = FixedArena::new(256).unwrap();
    let resource: &mut dyn MemoryResource = &mut arena;

    resource.allocate(1, 1).unwrap();
    let layout = Layout::from_size_align(32, 32).unwrap();
    let block = resource.allocate_layout(layout).unwrap();

    assert_eq!(0, block.as_ptr().addr() % 32);
    resource.deallocate_layout(block, layout).unwrap();
  }
}

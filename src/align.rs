use std::mem;

use static_assertions::const_assert;

/// The platform's maximum fundamental alignment (`alignof(max_align_t)`).
pub const MAX_ALIGN: usize = mem::align_of::<libc::max_align_t>();

const_assert!(MAX_ALIGN.is_power_of_two());
const_assert!(MAX_ALIGN >= mem::align_of::<usize>());

/// Rounds the given size up to the platform's maximum fundamental alignment.
///
/// # Examples
///
/// ```rust
/// use rarena::{MAX_ALIGN, align};
///
/// assert_eq!(align!(1), MAX_ALIGN);
/// assert_eq!(align!(MAX_ALIGN), MAX_ALIGN);
/// assert_eq!(align!(MAX_ALIGN + 1), 2 * MAX_ALIGN);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, $crate::MAX_ALIGN)
  };
}

/// Rounds `value` up to the next multiple of `alignment`, which must be a
/// power of two.
///
/// ```rust
/// use rarena::align_to;
///
/// assert_eq!(align_to!(13, 8), 16);
/// assert_eq!(align_to!(16, 8), 16);
/// assert_eq!(align_to!(5, 1), 5);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $alignment:expr) => {
    ($value + $alignment - 1) & !($alignment - 1)
  };
}

/// Overflow-checked form of [`align_to!`]. Returns `None` when `alignment` is
/// not a power of two or the rounded value does not fit in a `usize`.
pub fn checked_align_up(
  value: usize,
  alignment: usize,
) -> Option<usize> {
  if !alignment.is_power_of_two() {
    return None;
  }
  let mask = alignment - 1;
  value.checked_add(mask).map(|v| v & !mask)
}

/*
 * Kernel Collections
 *
 * Containers that cannot lean on `alloc` because they sit underneath the
 * kernel heap itself.
 */

pub mod ordered_array;

pub use ordered_array::{LessThan, OrderedArray, OrderedArrayError, StandardLessThan};

/*
 * Solo Kernel - early-boot memory management
 *
 * The pieces of the kernel that have to work before the heap does:
 *
 * - `collections::OrderedArray`: sorted fixed-capacity array, the index the
 *   kernel heap keeps its free blocks in. It can be placed over raw memory
 *   so it is usable before any allocator exists
 * - `memory`: the kmalloc interface plus the placement (bump) allocator used
 *   during early boot and the free-list heap that replaces it
 * - `utils::debug`: `log` backend writing into an in-memory ring buffer
 * - `tests`: boot-time self tests run against the live allocators
 *
 * The crate is `no_std`; unit tests build against std on the host.
 */

#![cfg_attr(not(test), no_std)]

pub mod collections;
pub mod config;
pub mod memory;
pub mod tests;
pub mod utils;

pub use collections::{LessThan, OrderedArray, OrderedArrayError, StandardLessThan};
pub use memory::{AllocError, AllocFlags, KernelAllocator};

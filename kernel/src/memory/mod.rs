/*
 * Memory Management
 *
 * High-level module that ties together:
 *  - The kmalloc interface every memory source implements (kmalloc)
 *  - Early-boot bump allocation before any heap exists (placement)
 *  - Kernel free-list heap (heap)
 */

pub mod heap;
pub mod kmalloc;
pub mod placement;

pub use heap::LockedHeapAllocator;
pub use kmalloc::{AllocError, AllocFlags, KernelAllocator};
pub use placement::PlacementAllocator;

/*
 * Kernel Allocation Interface
 *
 * The contract every kernel memory source implements so that data structures
 * (the ordered heap index in particular) can obtain and return backing
 * storage without caring whether it came from the early-boot placement
 * region or the free-list heap.
 *
 * Design:
 * - `allocate` hands out a block for a `Layout` or reports why it cannot
 * - `release` gives a block back; sources that never reclaim make it a no-op
 * - `AllocFlags` layers page alignment and zero-filling on top of `allocate`
 */

use crate::config::PAGE_SIZE;
use bitflags::bitflags;
use core::alloc::Layout;
use core::ptr::{self, NonNull};

bitflags! {
    /// Modifiers for `KernelAllocator::allocate_with`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AllocFlags: u32 {
        /// Align the block to a page boundary
        const PAGE_ALIGNED = 1 << 0;
        /// Zero-fill the block before handing it out
        const ZEROED = 1 << 1;
    }
}

impl AllocFlags {
    /// The layout that is actually requested from the allocator for `layout`.
    ///
    /// Callers that allocate with `PAGE_ALIGNED` must release with this
    /// layout, not the one they started from.
    pub fn effective_layout(self, layout: Layout) -> Result<Layout, AllocError> {
        if self.contains(AllocFlags::PAGE_ALIGNED) {
            layout
                .align_to(PAGE_SIZE)
                .map_err(|_| AllocError::OutOfMemory {
                    requested: layout.size(),
                })
        } else {
            Ok(layout)
        }
    }
}

/// Allocation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The allocator has not been given a memory region yet
    NotInitialized,
    /// No block large enough is left
    OutOfMemory { requested: usize },
    /// Zero-byte requests are refused
    ZeroSized,
}

impl core::fmt::Display for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AllocError::NotInitialized => write!(f, "Allocator not initialized"),
            AllocError::OutOfMemory { requested } => {
                write!(f, "Out of memory ({} bytes requested)", requested)
            }
            AllocError::ZeroSized => write!(f, "Zero-sized allocation"),
        }
    }
}

/// A source of kernel memory
///
/// Implementations are free to never reclaim memory (early boot), but must
/// accept `release` calls for every block they handed out.
pub trait KernelAllocator {
    /// Allocate a block that satisfies `layout`
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Return a block to the allocator
    ///
    /// # Safety
    /// `ptr` must have been returned by `allocate` on this allocator with the
    /// same `layout`, and must not be used afterwards.
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout);

    /// Allocate with extra placement requirements
    ///
    /// The block must later be released with
    /// `flags.effective_layout(layout)`.
    fn allocate_with(&self, layout: Layout, flags: AllocFlags) -> Result<NonNull<u8>, AllocError> {
        let layout = flags.effective_layout(layout)?;
        let block = self.allocate(layout)?;

        if flags.contains(AllocFlags::ZEROED) {
            // SAFETY: the allocator just handed us `layout.size()` writable bytes
            unsafe {
                ptr::write_bytes(block.as_ptr(), 0, layout.size());
            }
        }

        Ok(block)
    }
}

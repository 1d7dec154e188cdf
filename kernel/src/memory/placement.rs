/*
 * Early-Boot Placement Allocator
 *
 * Bump allocator over a fixed address range, used before the kernel heap
 * exists. Every allocation advances the placement address; nothing is ever
 * given back, so `release` only records the call.
 */

use super::kmalloc::{AllocError, KernelAllocator};
use core::alloc::Layout;
use core::ptr::NonNull;
use spin::Mutex;
use x86_64::VirtAddr;

struct Placement {
    /// Next free address
    next: u64,
    /// Bytes left between `next` and the end of the region
    remaining: u64,
    initialized: bool,
}

/// Bump allocator handing out memory from `[start, start + size)`
pub struct PlacementAllocator {
    inner: Mutex<Placement>,
}

impl PlacementAllocator {
    /// Create an allocator with no region yet
    pub const fn empty() -> Self {
        Self {
            inner: Mutex::new(Placement {
                next: 0,
                remaining: 0,
                initialized: false,
            }),
        }
    }

    /// Hand the allocator its region
    ///
    /// The region may end exactly at the top of the address space.
    ///
    /// # Safety
    /// `[start, start + size)` must be mapped, writable, unused by anything
    /// else, and stay valid for as long as any block handed out lives.
    pub unsafe fn init(&self, start: VirtAddr, size: u64) {
        let mut placement = self.inner.lock();
        placement.next = start.as_u64();
        placement.remaining = size;
        placement.initialized = true;

        log::info!(
            "Placement allocator range: 0x{:x} - 0x{:x} ({} KiB)",
            start.as_u64(),
            start.as_u64().wrapping_add(size.saturating_sub(1)),
            size / 1024
        );
    }

    /// Address the next allocation will start from (before alignment)
    pub fn placement_address(&self) -> VirtAddr {
        VirtAddr::new_truncate(self.inner.lock().next)
    }

    /// Bytes left in the region
    pub fn remaining(&self) -> u64 {
        self.inner.lock().remaining
    }
}

impl KernelAllocator for PlacementAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if layout.size() == 0 {
            return Err(AllocError::ZeroSized);
        }

        let mut placement = self.inner.lock();
        if !placement.initialized {
            return Err(AllocError::NotInitialized);
        }

        let out_of_memory = AllocError::OutOfMemory {
            requested: layout.size(),
        };

        let align_mask = layout.align() as u64 - 1;
        let size = layout.size() as u64;

        let start = placement
            .next
            .checked_add(align_mask)
            .ok_or(out_of_memory)?
            & !align_mask;
        let consumed = (start - placement.next)
            .checked_add(size)
            .filter(|&consumed| consumed <= placement.remaining)
            .ok_or(out_of_memory)?;

        // Both ends of the block must be canonical
        VirtAddr::try_new(start).map_err(|_| out_of_memory)?;
        let last = start.checked_add(size - 1).ok_or(out_of_memory)?;
        VirtAddr::try_new(last).map_err(|_| out_of_memory)?;

        // Wraps to 0 only when the block ends the address space, and then
        // nothing is left to hand out
        placement.next = start.wrapping_add(size);
        placement.remaining -= consumed;
        log::trace!(
            "placement: {} bytes at 0x{:x} (align {})",
            layout.size(),
            start,
            layout.align()
        );

        NonNull::new(start as *mut u8).ok_or(out_of_memory)
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        // Early boot memory is never reclaimed
        log::trace!(
            "placement: ignoring release of {} bytes at {:p}",
            layout.size(),
            ptr
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C, align(4096))]
    struct Region([u8; 8192]);

    fn placement_over(region: &mut Region) -> PlacementAllocator {
        let allocator = PlacementAllocator::empty();
        unsafe { allocator.init(VirtAddr::from_ptr(region.0.as_mut_ptr()), 8192) };
        allocator
    }

    #[test]
    fn test_not_initialized() {
        let allocator = PlacementAllocator::empty();
        let layout = Layout::new::<u64>();
        assert_eq!(allocator.allocate(layout), Err(AllocError::NotInitialized));
    }

    #[test]
    fn test_bump_and_align() {
        let mut region = Box::new(Region([0; 8192]));
        let base = region.0.as_ptr() as u64;
        let allocator = placement_over(&mut region);

        let a = allocator.allocate(Layout::from_size_align(3, 1).unwrap()).unwrap();
        assert_eq!(a.as_ptr() as u64, base);

        let b = allocator.allocate(Layout::from_size_align(16, 8).unwrap()).unwrap();
        assert_eq!(b.as_ptr() as u64, base + 8);
        assert_eq!(allocator.placement_address().as_u64(), base + 24);
        assert_eq!(allocator.remaining(), 8192 - 24);
    }

    #[test]
    fn test_exhaustion() {
        let mut region = Box::new(Region([0; 8192]));
        let allocator = placement_over(&mut region);

        allocator
            .allocate(Layout::from_size_align(8000, 8).unwrap())
            .unwrap();
        let err = allocator
            .allocate(Layout::from_size_align(512, 8).unwrap())
            .unwrap_err();
        assert_eq!(err, AllocError::OutOfMemory { requested: 512 });

        // The failed request must not have moved the placement address
        assert_eq!(allocator.remaining(), 192);
    }

    #[test]
    fn test_region_at_top_of_address_space() {
        let allocator = PlacementAllocator::empty();
        unsafe { allocator.init(VirtAddr::new(0xffff_ffff_ffff_f000), 0x1000) };

        let block = allocator
            .allocate(Layout::from_size_align(0xff9, 1).unwrap())
            .unwrap();
        assert_eq!(block.as_ptr() as u64, 0xffff_ffff_ffff_f000);
        assert_eq!(allocator.remaining(), 7);

        // Aligning up would run past 2^64
        assert_eq!(
            allocator.allocate(Layout::from_size_align(1, 16).unwrap()),
            Err(AllocError::OutOfMemory { requested: 1 })
        );

        // The last byte of the address space is still usable
        let last = allocator
            .allocate(Layout::from_size_align(7, 1).unwrap())
            .unwrap();
        assert_eq!(last.as_ptr() as u64, 0xffff_ffff_ffff_fff9);
        assert_eq!(allocator.remaining(), 0);
        assert_eq!(
            allocator.allocate(Layout::from_size_align(1, 1).unwrap()),
            Err(AllocError::OutOfMemory { requested: 1 })
        );
    }

    #[test]
    fn test_block_crossing_canonical_hole() {
        let allocator = PlacementAllocator::empty();
        unsafe { allocator.init(VirtAddr::new(0x0000_7fff_ffff_f000), 0x2000) };

        assert_eq!(
            allocator.allocate(Layout::from_size_align(0x1800, 8).unwrap()),
            Err(AllocError::OutOfMemory { requested: 0x1800 })
        );
        assert_eq!(allocator.remaining(), 0x2000);
    }

    #[test]
    fn test_release_is_noop() {
        let mut region = Box::new(Region([0; 8192]));
        let allocator = placement_over(&mut region);
        let layout = Layout::from_size_align(64, 8).unwrap();

        let block = allocator.allocate(layout).unwrap();
        let before = allocator.remaining();
        unsafe { allocator.release(block, layout) };
        assert_eq!(allocator.remaining(), before);
    }
}

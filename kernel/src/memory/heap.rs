/*
 * Kernel Heap Allocator
 *
 * Free-list heap built on linked_list_allocator::Heap, guarded by a spin
 * lock. Unlike the placement allocator it reclaims released blocks, so
 * structures created on it hand their storage back when dropped.
 */

use super::kmalloc::{AllocError, KernelAllocator};
use core::alloc::Layout;
use core::ptr::NonNull;
use linked_list_allocator::Heap;
use spin::Mutex;

/// Spin-locked free-list heap
pub struct LockedHeapAllocator {
    heap: Mutex<Heap>,
}

impl LockedHeapAllocator {
    /// Create a heap with no backing region yet
    pub const fn empty() -> Self {
        Self {
            heap: Mutex::new(Heap::empty()),
        }
    }

    /// Initialize the heap over `[start, start + size)`
    ///
    /// # Safety
    /// The range must be mapped, writable and unused, and this must be called
    /// at most once.
    pub unsafe fn init(&self, start: *mut u8, size: usize) {
        log::info!("Initializing kernel heap...");
        log::info!(
            "Heap range: 0x{:x} - 0x{:x} ({} KiB)",
            start as usize,
            last_byte(start as usize, size),
            size / 1024
        );

        // SAFETY: forwarded from the caller
        unsafe {
            self.heap.lock().init(start, size);
        }

        log::info!("Kernel heap initialized successfully");
    }

    /// Bytes currently handed out
    pub fn used(&self) -> usize {
        self.heap.lock().used()
    }

    /// Bytes still available
    pub fn free(&self) -> usize {
        self.heap.lock().free()
    }
}

/// Address of the last byte of `[start, start + size)`, for a region that
/// may end at the top of the address space
fn last_byte(start: usize, size: usize) -> usize {
    start.wrapping_add(size.saturating_sub(1))
}

impl KernelAllocator for LockedHeapAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if layout.size() == 0 {
            return Err(AllocError::ZeroSized);
        }

        let mut heap = self.heap.lock();
        if heap.size() == 0 {
            return Err(AllocError::NotInitialized);
        }

        heap.allocate_first_fit(layout)
            .map_err(|()| AllocError::OutOfMemory {
                requested: layout.size(),
            })
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: the caller guarantees `ptr`/`layout` came from `allocate`
        unsafe {
            self.heap.lock().deallocate(ptr, layout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C, align(4096))]
    struct Arena([u8; 16 * 1024]);

    fn heap_over(arena: &mut Arena) -> LockedHeapAllocator {
        let heap = LockedHeapAllocator::empty();
        unsafe { heap.init(arena.0.as_mut_ptr(), arena.0.len()) };
        heap
    }

    #[test]
    fn test_not_initialized() {
        let heap = LockedHeapAllocator::empty();
        assert_eq!(
            heap.allocate(Layout::new::<u64>()),
            Err(AllocError::NotInitialized)
        );
    }

    #[test]
    fn test_allocate_and_release() {
        let mut arena = Box::new(Arena([0; 16 * 1024]));
        let heap = heap_over(&mut arena);
        let layout = Layout::from_size_align(256, 8).unwrap();

        let free_before = heap.free();

        let block = heap.allocate(layout).unwrap();
        assert!(heap.used() >= 256);
        assert!(heap.free() <= free_before - 256);

        unsafe { heap.release(block, layout) };
        assert_eq!(heap.used(), 0);
        assert_eq!(heap.free(), free_before);
    }

    #[test]
    fn test_last_byte_at_top_of_address_space() {
        assert_eq!(last_byte(0x1000, 0x1000), 0x1fff);
        assert_eq!(last_byte(usize::MAX - 0xfff, 0x1000), usize::MAX);
        assert_eq!(last_byte(0x1000, 0), 0x1000);
    }

    #[test]
    fn test_out_of_memory() {
        let mut arena = Box::new(Arena([0; 16 * 1024]));
        let heap = heap_over(&mut arena);
        let layout = Layout::from_size_align(32 * 1024, 8).unwrap();

        assert_eq!(
            heap.allocate(layout),
            Err(AllocError::OutOfMemory {
                requested: 32 * 1024
            })
        );
    }
}

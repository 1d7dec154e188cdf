/*
 * Ordered Slot Array
 *
 * A fixed-capacity array that keeps its elements sorted at all times. The
 * kernel heap uses it as the index of its free blocks, which is why it must
 * work before the heap exists: it can either take storage from any
 * `KernelAllocator`, or be placed over a region the caller already owns.
 *
 * Design:
 * - Order is defined by a `LessThan` strategy bound at construction
 * - Insertion is a linear scan plus a shift; the array is expected to hold
 *   free-list sized collections, not bulk data
 * - Equal elements are inserted after the ones already present
 * - Allocated storage is released on drop, placed storage never is
 *
 * The array is not synchronized. Callers that share one across contexts
 * must provide their own exclusion.
 */

use crate::memory::{AllocError, AllocFlags, KernelAllocator};
use core::alloc::Layout;
use core::fmt;
use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::ptr::{self, NonNull};
use core::slice;

/// Ordering predicate for an `OrderedArray`
///
/// Must be pure: the same pair must always compare the same way for as long
/// as the array lives.
pub trait LessThan<T> {
    fn less_than(&self, a: &T, b: &T) -> bool;
}

impl<T, F> LessThan<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    fn less_than(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}

/// Numeric `a < b`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardLessThan;

impl<T: PartialOrd> LessThan<T> for StandardLessThan {
    fn less_than(&self, a: &T, b: &T) -> bool {
        a < b
    }
}

/// Ordered array errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderedArrayError {
    /// Insert into an array that already holds `capacity` elements
    CapacityExceeded { capacity: usize },
    /// Lookup or removal at `index` when only `len` elements are held
    IndexOutOfRange { index: usize, len: usize },
    /// The backing allocator could not provide storage
    AllocationFailure(AllocError),
    /// Zero capacity, a zero-sized element type, or a capacity whose byte
    /// size does not fit in memory
    InvalidCapacity,
}

impl fmt::Display for OrderedArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderedArrayError::CapacityExceeded { capacity } => {
                write!(f, "Ordered array full (capacity {})", capacity)
            }
            OrderedArrayError::IndexOutOfRange { index, len } => {
                write!(f, "Index {} out of range (length {})", index, len)
            }
            OrderedArrayError::AllocationFailure(err) => {
                write!(f, "Ordered array allocation failed: {}", err)
            }
            OrderedArrayError::InvalidCapacity => write!(f, "Invalid capacity"),
        }
    }
}

impl From<AllocError> for OrderedArrayError {
    fn from(err: AllocError) -> Self {
        OrderedArrayError::AllocationFailure(err)
    }
}

/// Where the slots came from, and so what happens to them on drop
#[derive(Clone, Copy)]
enum Backing<'a> {
    /// Obtained from `allocator` with `layout`; released on drop
    Allocated {
        allocator: &'a dyn KernelAllocator,
        layout: Layout,
    },
    /// Owned by whoever placed the array; never released
    Placed,
}

/// Sorted, fixed-capacity array of `T`
pub struct OrderedArray<'a, T: Copy, P: LessThan<T> = StandardLessThan> {
    slots: NonNull<MaybeUninit<T>>,
    capacity: usize,
    len: usize,
    less_than: P,
    backing: Backing<'a>,
    _storage: PhantomData<&'a mut [MaybeUninit<T>]>,
}

impl<'a, T: Copy + PartialOrd> OrderedArray<'a, T, StandardLessThan> {
    /// `create` with the numeric ordering
    pub fn create_standard(
        capacity: usize,
        allocator: &'a dyn KernelAllocator,
    ) -> Result<Self, OrderedArrayError> {
        Self::create(capacity, StandardLessThan, allocator)
    }
}

impl<'a, T: Copy, P: LessThan<T>> OrderedArray<'a, T, P> {
    /// Create an array whose storage is taken from `allocator`
    ///
    /// The storage is zero-filled and handed back to the same allocator when
    /// the array is dropped.
    pub fn create(
        capacity: usize,
        less_than: P,
        allocator: &'a dyn KernelAllocator,
    ) -> Result<Self, OrderedArrayError> {
        let layout = Self::slots_layout(capacity)?;
        let block = allocator.allocate_with(layout, AllocFlags::ZEROED)?;

        log::debug!(
            "ordered array: {} slots ({} bytes) allocated at {:p}",
            capacity,
            layout.size(),
            block
        );

        Ok(Self {
            slots: block.cast(),
            capacity,
            len: 0,
            less_than,
            backing: Backing::Allocated { allocator, layout },
            _storage: PhantomData,
        })
    }

    /// Place an array over a region the caller owns
    ///
    /// The capacity is the length of `region`. The region is zero-filled and
    /// is not released when the array is dropped.
    pub fn place(
        region: &'a mut [MaybeUninit<T>],
        less_than: P,
    ) -> Result<Self, OrderedArrayError> {
        let capacity = region.len();
        let addr = NonNull::from(region).cast::<u8>();

        // SAFETY: the exclusive borrow keeps the region valid and unaliased for 'a
        unsafe { Self::place_at(addr, capacity, less_than) }
    }

    /// Place an array at a raw address
    ///
    /// This is how the heap index is built before any allocator exists.
    ///
    /// # Safety
    /// `addr` must be aligned for `T` and point to at least `capacity`
    /// writable slots that nothing else touches and that stay valid for `'a`.
    /// None of this is checked.
    pub unsafe fn place_at(
        addr: NonNull<u8>,
        capacity: usize,
        less_than: P,
    ) -> Result<Self, OrderedArrayError> {
        let layout = Self::slots_layout(capacity)?;
        let slots = addr.cast::<MaybeUninit<T>>();
        debug_assert!(slots.as_ptr().is_aligned(), "misaligned ordered array region");

        // SAFETY: the caller guarantees `capacity` writable slots at `addr`
        unsafe {
            ptr::write_bytes(slots.as_ptr(), 0, capacity);
        }

        log::debug!(
            "ordered array: {} slots ({} bytes) placed at {:p}",
            capacity,
            layout.size(),
            slots
        );

        Ok(Self {
            slots,
            capacity,
            len: 0,
            less_than,
            backing: Backing::Placed,
            _storage: PhantomData,
        })
    }

    /// Drop the array, releasing its storage if it was allocated
    pub fn destroy(self) {
        drop(self);
    }

    /// Insert `item` at its sorted position
    ///
    /// Returns the rank the item now has. Fails without touching the array
    /// when it is full.
    pub fn insert(&mut self, item: T) -> Result<usize, OrderedArrayError> {
        if self.is_full() {
            return Err(OrderedArrayError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let len = self.len;
        // First slot holding something greater than `item`, so equal
        // elements keep their insertion order
        let rank = self
            .occupied()
            .iter()
            .position(|existing| self.less_than.less_than(&item, existing))
            .unwrap_or(len);

        let slots = self.slots_mut();
        slots.copy_within(rank..len, rank + 1);
        slots[rank] = MaybeUninit::new(item);
        self.len += 1;

        Ok(rank)
    }

    /// Element at rank `index`
    pub fn lookup(&self, index: usize) -> Result<T, OrderedArrayError> {
        self.occupied()
            .get(index)
            .copied()
            .ok_or(OrderedArrayError::IndexOutOfRange {
                index,
                len: self.len,
            })
    }

    /// Remove and return the element at rank `index`
    pub fn remove(&mut self, index: usize) -> Result<T, OrderedArrayError> {
        let removed = self.lookup(index)?;
        let len = self.len;

        // Removing the last element needs no shift
        if index + 1 < len {
            self.slots_mut().copy_within(index + 1..len, index);
        }
        self.len -= 1;

        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// True if the storage belongs to the caller rather than an allocator
    pub fn is_placed(&self) -> bool {
        matches!(self.backing, Backing::Placed)
    }

    fn slots_layout(capacity: usize) -> Result<Layout, OrderedArrayError> {
        if capacity == 0 || core::mem::size_of::<T>() == 0 {
            return Err(OrderedArrayError::InvalidCapacity);
        }
        Layout::array::<T>(capacity).map_err(|_| OrderedArrayError::InvalidCapacity)
    }

    fn occupied(&self) -> &[T] {
        // SAFETY: slots [0, len) have all been written by `insert`
        unsafe { slice::from_raw_parts(self.slots.as_ptr().cast::<T>(), self.len) }
    }

    fn slots_mut(&mut self) -> &mut [MaybeUninit<T>] {
        // SAFETY: `slots` points to `capacity` slots owned by this array for 'a
        unsafe { slice::from_raw_parts_mut(self.slots.as_ptr(), self.capacity) }
    }
}

impl<'a, T: Copy, P: LessThan<T>> Drop for OrderedArray<'a, T, P> {
    fn drop(&mut self) {
        match self.backing {
            Backing::Allocated { allocator, layout } => {
                // SAFETY: `slots` was returned by `allocator` for `layout`
                unsafe {
                    allocator.release(self.slots.cast(), layout);
                }
                log::debug!(
                    "ordered array: released {} bytes at {:p}",
                    layout.size(),
                    self.slots
                );
            }
            Backing::Placed => {
                log::trace!("ordered array: placed storage at {:p} left to its owner", self.slots);
            }
        }
    }
}

impl<'a, T: Copy + fmt::Debug, P: LessThan<T>> fmt::Debug for OrderedArray<'a, T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedArray")
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("placed", &self.is_placed())
            .field("elements", &self.occupied())
            .finish()
    }
}

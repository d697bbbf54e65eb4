use std::alloc::Layout;
use std::cell::Cell;
use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::ptr::{self, NonNull};

use super::{AllocError, Allocator, dangling_for};

/// A bump allocator over a caller supplied buffer.
///
/// Allocations are carved off the front of the remaining space. Only the most recent allocation
/// can be given back early: deallocating it rewinds the arena, and resizing it happens in place
/// if the buffer has room. Everything else is reclaimed all at once by [`Arena::reset`] (which
/// needs exclusive access, so no container can still be using the memory).
///
/// Arenas are stateful, so an arena is only equal to itself. Containers normally hold them by
/// reference, using the blanket [`Allocator`] implementation for `&A`.
///
/// # Examples
/// ```
/// # use std::mem::MaybeUninit;
/// # use foundation_lib::alloc::Arena;
/// # use foundation_lib::collections::contiguous::Stack;
/// let mut buf = [MaybeUninit::uninit(); 256];
/// let arena = Arena::new(&mut buf);
///
/// let mut stack = Stack::new_in(&arena);
/// stack.try_push(1_u32).unwrap();
/// assert!(arena.used() >= 4);
/// ```
pub struct Arena<'a> {
    start: NonNull<u8>,
    capacity: usize,
    offset: Cell<usize>,
    /// The offset at which the most recent live allocation begins, if there is one.
    last: Cell<Option<usize>>,
    _phantom: PhantomData<&'a mut [MaybeUninit<u8>]>,
}

impl<'a> Arena<'a> {
    /// Creates an Arena which hands out memory from `buf`.
    pub const fn new(buf: &'a mut [MaybeUninit<u8>]) -> Arena<'a> {
        Arena {
            // SAFETY: Slice pointers are never null.
            start: unsafe { NonNull::new_unchecked(buf.as_mut_ptr().cast()) },
            capacity: buf.len(),
            offset: Cell::new(0),
            last: Cell::new(None),
            _phantom: PhantomData,
        }
    }

    /// Returns the total size of the backing buffer in bytes.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of bytes currently handed out, including alignment padding.
    pub fn used(&self) -> usize {
        self.offset.get()
    }

    /// Returns the number of bytes that haven't been handed out yet.
    pub fn remaining(&self) -> usize {
        self.capacity - self.offset.get()
    }

    /// Reclaims every allocation at once.
    pub fn reset(&mut self) {
        self.offset.set(0);
        self.last.set(None);
    }

    /// Returns the offset of `ptr` from the start of the buffer.
    fn offset_of(&self, ptr: NonNull<u8>) -> usize {
        let offset = (ptr.as_ptr() as usize).wrapping_sub(self.start.as_ptr() as usize);
        debug_assert!(offset <= self.capacity, "Pointer does not belong to this Arena!");
        offset
    }
}

// SAFETY: Allocations are disjoint ranges of the borrowed buffer, which outlives the Arena. Memory
// is only reused after the owning allocation has been deallocated or the Arena has been reset.
unsafe impl Allocator for Arena<'_> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if layout.size() == 0 {
            return Ok(dangling_for(layout));
        }

        let addr = self.start.as_ptr() as usize + self.offset.get();
        let padding = addr.next_multiple_of(layout.align()) - addr;
        let begin = self.offset.get() + padding;

        match begin.checked_add(layout.size()) {
            Some(end) if end <= self.capacity => {
                self.offset.set(end);
                self.last.set(Some(begin));
                // SAFETY: begin is within the bounds of the buffer.
                Ok(unsafe { self.start.add(begin) })
            },
            _ => {
                tracing::debug!(
                    size = layout.size(),
                    remaining = self.remaining(),
                    "arena exhausted"
                );
                Err(AllocError::for_layout(layout))
            },
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }

        let begin = self.offset_of(ptr);
        debug_assert!(begin + layout.size() <= self.offset.get());

        // Only the most recent allocation can be rewound, the rest waits for a reset.
        if self.last.get() == Some(begin) {
            self.offset.set(begin);
            self.last.set(None);
        }
    }

    unsafe fn resize(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        let begin = self.offset_of(ptr);

        match begin.checked_add(new_size) {
            Some(end) if self.last.get() == Some(begin) && end <= self.capacity && new_size > 0 => {
                self.offset.set(end);
                Ok(ptr)
            },
            _ => Err(AllocError {
                size: new_size,
                align: old_layout.align(),
            }),
        }
    }
}

impl PartialEq for Arena<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl Eq for Arena<'_> {}

impl Debug for Arena<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("used", &self.used())
            .field("capacity", &self.capacity)
            .finish()
    }
}

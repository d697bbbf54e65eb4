use std::alloc::{self, Layout};
use std::ptr::NonNull;

use super::{AllocError, Allocator, dangling_for};

/// The process heap, as provided by [`std::alloc`].
///
/// Global is a zero sized, stateless allocator, so every instance is equal to every other one and
/// buffers can always move between containers that use it. [`resize`](Allocator::resize) is
/// backed by [`alloc::realloc`], which may grow in place or move the allocation itself.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Global;

// SAFETY: Global forwards to the registered global allocator, which upholds the same requirements.
unsafe impl Allocator for Global {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if layout.size() == 0 {
            return Ok(dangling_for(layout));
        }

        // SAFETY: Zero sized layouts have been guarded against.
        NonNull::new(unsafe { alloc::alloc(layout) }).ok_or(AllocError::for_layout(layout))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }

        // SAFETY: The caller guarantees that ptr was allocated with this layout.
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }

    unsafe fn resize(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        let failure = AllocError {
            size: new_size,
            align: old_layout.align(),
        };

        // realloc doesn't accept zero sized layouts on either side.
        if old_layout.size() == 0 || new_size == 0 {
            return Err(failure);
        }

        // SAFETY: The caller guarantees that ptr was allocated with old_layout and that new_size
        // doesn't overflow isize::MAX once aligned. Both sizes are non-zero.
        NonNull::new(unsafe { alloc::realloc(ptr.as_ptr(), old_layout, new_size) }).ok_or(failure)
    }
}

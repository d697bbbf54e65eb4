use std::alloc::Layout;
use std::ptr::NonNull;

use super::AllocError;

/// A source of raw memory, parameterized by size and alignment.
///
/// Allocators never panic or abort on exhaustion, they return an [`AllocError`] and leave it to
/// the caller to decide what happens next. Alignment is carried by [`Layout`], so a
/// non-power-of-two alignment can't reach an allocator in the first place.
///
/// Equality has a specific meaning here: two allocators compare equal if memory allocated by one
/// can be deallocated (or resized) by the other. Stateless allocators are always equal to each
/// other. Containers use this to decide whether a buffer can change hands without copying.
///
/// # Safety
/// Implementors must ensure that:
/// - Memory returned by [`allocate`](Allocator::allocate) is valid for reads and writes of
///   `layout.size()` bytes and aligned to `layout.align()`, until it is deallocated or resized.
/// - Memory stays valid when the allocator is moved, and for as long as any allocator which
///   compares equal to it is alive.
/// - A successful [`resize`](Allocator::resize) preserves the first `min(old, new)` bytes at the
///   returned address. A failed one has no effect at all. Resizing never partially succeeds.
pub unsafe trait Allocator: PartialEq {
    /// Attempts to allocate a block of memory fitting `layout`.
    ///
    /// Zero sized layouts may be answered with a dangling, well aligned pointer. Containers in
    /// this crate never request them.
    ///
    /// # Errors
    /// Returns an [`AllocError`] describing the request if it can't be satisfied.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Releases a block of memory.
    ///
    /// # Safety
    /// `ptr` must have been returned by this allocator (or one equal to it), must still be
    /// allocated and `layout` must be the exact layout it was allocated or last resized with.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Attempts to change the size of an existing allocation, keeping `old_layout.align()`.
    ///
    /// This is purely a performance hint. The default implementation always fails, and callers
    /// must behave identically (apart from speed) whether it succeeds or not.
    ///
    /// # Errors
    /// Returns an [`AllocError`] for the new layout if the allocation couldn't be resized, in
    /// which case the original allocation is untouched.
    ///
    /// # Safety
    /// `ptr` and `old_layout` must satisfy the same requirements as for
    /// [`deallocate`](Allocator::deallocate) and `new_size` rounded up to `old_layout.align()`
    /// must not exceed [`isize::MAX`]. On success, `ptr` must no longer be used.
    unsafe fn resize(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        let _ = ptr;
        Err(AllocError {
            size: new_size,
            align: old_layout.align(),
        })
    }
}

// SAFETY: All requirements are forwarded to the referenced allocator, which outlives the reference.
unsafe impl<A: Allocator + ?Sized> Allocator for &A {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        (**self).allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: Forwarded to the caller.
        unsafe { (**self).deallocate(ptr, layout) }
    }

    unsafe fn resize(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        // SAFETY: Forwarded to the caller.
        unsafe { (**self).resize(ptr, old_layout, new_size) }
    }
}

/// Returns a dangling pointer which is correctly aligned for `layout`, for use as the address of
/// zero sized allocations.
pub(crate) const fn dangling_for(layout: Layout) -> NonNull<u8> {
    // SAFETY: Layout alignments are never zero.
    unsafe { NonNull::new_unchecked(std::ptr::without_provenance_mut(layout.align())) }
}

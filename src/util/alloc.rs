use std::alloc::Layout;
use std::cell::{Cell, RefCell};
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::rc::Rc;

use crate::alloc::{AllocError, Allocator, Global};

/// A type with no size, for exercising the zero sized paths of each collection.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ZeroSizedType;

/// Increments a shared counter when dropped.
#[derive(Debug, Clone)]
pub struct CountedDrop(pub Rc<RefCell<usize>>);

impl CountedDrop {
    /// Creates a new counter starting at `value`.
    pub fn new(value: usize) -> CountedDrop {
        CountedDrop(Rc::new(RefCell::new(value)))
    }
}

impl Deref for CountedDrop {
    type Target = Rc<RefCell<usize>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for CountedDrop {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Drop for CountedDrop {
    fn drop(&mut self) {
        self.0.replace_with(|v| *v + 1);
    }
}

/// A [`Global`] backed allocator that counts what passes through it and fails on request.
#[derive(Debug, Default)]
pub struct TrackingAllocator {
    live: Cell<usize>,
    allocations: Cell<usize>,
    resizes: Cell<usize>,
    remaining: Cell<Option<usize>>,
    resize_in_place: Cell<bool>,
}

impl TrackingAllocator {
    /// Creates an allocator which never fails and doesn't support resizing.
    pub fn new() -> TrackingAllocator {
        TrackingAllocator::default()
    }

    /// Creates an allocator which also supports [`Allocator::resize`].
    pub fn resizing() -> TrackingAllocator {
        let alloc = TrackingAllocator::default();
        alloc.resize_in_place.set(true);
        alloc
    }

    /// The number of allocations which haven't been deallocated yet.
    pub fn live(&self) -> usize {
        self.live.get()
    }

    /// The number of successful calls to allocate.
    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }

    /// The number of successful calls to resize.
    pub fn resizes(&self) -> usize {
        self.resizes.get()
    }

    /// Allows `count` more allocations or resizes to succeed before every request fails.
    pub fn fail_after(&self, count: usize) {
        self.remaining.set(Some(count));
    }

    /// Removes any failure budget set by [`fail_after`](TrackingAllocator::fail_after).
    pub fn never_fail(&self) {
        self.remaining.set(None);
    }

    fn take_budget(&self, layout: Layout) -> Result<(), AllocError> {
        match self.remaining.get() {
            Some(0) => Err(AllocError::for_layout(layout)),
            Some(count) => {
                self.remaining.set(Some(count - 1));
                Ok(())
            },
            None => Ok(()),
        }
    }
}

// SAFETY: Every request is forwarded to Global.
unsafe impl Allocator for TrackingAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        self.take_budget(layout)?;
        let ptr = Global.allocate(layout)?;
        self.live.set(self.live.get() + 1);
        self.allocations.set(self.allocations.get() + 1);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        assert!(self.live.get() > 0, "Deallocated more often than allocated!");
        self.live.set(self.live.get() - 1);
        // SAFETY: Forwarded to the caller.
        unsafe { Global.deallocate(ptr, layout) }
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
        if !self.resize_in_place.get() {
            return Err(failure);
        }
        self.take_budget(old_layout).map_err(|_| failure)?;
        // SAFETY: Forwarded to the caller.
        let new_ptr = unsafe { Global.resize(ptr, old_layout, new_size) }?;
        self.resizes.set(self.resizes.get() + 1);
        Ok(new_ptr)
    }
}

impl PartialEq for TrackingAllocator {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

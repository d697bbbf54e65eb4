use std::alloc::Layout;
use std::fmt::{self, Debug, Formatter};
use std::iter::FusedIterator;
use std::ptr::{self, NonNull};
use std::slice;

use crate::alloc::{Allocator, Global};

/// An owned iterator over the values of a [`Stack`](super::Stack). The buffer is returned to the
/// allocator once the iterator is dropped.
pub struct IntoIter<T, A: Allocator = Global> {
    pub(crate) ptr: NonNull<T>,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) cap: usize,
    pub(crate) alloc: A,
}

impl<T, A: Allocator> IntoIter<T, A> {
    /// Returns the values which haven't been yielded yet as a slice.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: Values from start to end are initialized and still owned by the iterator.
        unsafe { slice::from_raw_parts(self.ptr.add(self.start).as_ptr(), self.end - self.start) }
    }
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.start == self.end {
            return None;
        }
        // SAFETY: start < end, so the value is initialized. Incrementing start gives up ownership.
        let value = unsafe { self.ptr.add(self.start).read() };
        self.start += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len(), Some(self.len()))
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.start == self.end {
            return None;
        }
        self.end -= 1;
        // SAFETY: end has been decremented and is still >= start, so the value is initialized.
        Some(unsafe { self.ptr.add(self.end).read() })
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

impl<T, A: Allocator> FusedIterator for IntoIter<T, A> {}

impl<T, A: Allocator> Drop for IntoIter<T, A> {
    fn drop(&mut self) {
        // SAFETY: The remaining values are initialized and owned by the iterator.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.ptr.add(self.start).as_ptr(),
                self.end - self.start,
            ));
        }

        if self.cap > 0 && size_of::<T>() > 0 {
            // SAFETY: The buffer was owned by a Stack with this capacity, which validated the
            // layout when allocating it.
            unsafe {
                self.alloc.deallocate(
                    self.ptr.cast(),
                    Layout::from_size_align_unchecked(size_of::<T>() * self.cap, align_of::<T>()),
                );
            }
        }
    }
}

impl<T: Debug, A: Allocator> Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

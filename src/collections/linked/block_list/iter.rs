use std::fmt::{self, Debug, Formatter};
use std::iter::{Flatten, FusedIterator};
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ptr;

use super::block::BlockPtr;
use super::BlockList;
use crate::alloc::{Allocator, Global};

/// Walks a run of linked blocks from both ends without borrowing them. The run is assumed to
/// contain exactly `remaining` blocks.
pub(crate) struct RawBlocks<T> {
    front: Option<BlockPtr<T>>,
    back: Option<BlockPtr<T>>,
    remaining: usize,
}

impl<T> RawBlocks<T> {
    pub const fn new(
        front: Option<BlockPtr<T>>,
        back: Option<BlockPtr<T>>,
        remaining: usize,
    ) -> RawBlocks<T> {
        RawBlocks {
            front,
            back,
            remaining,
        }
    }
}

impl<T> Clone for RawBlocks<T> {
    fn clone(&self) -> Self {
        RawBlocks::new(self.front, self.back, self.remaining)
    }
}

impl<T> Iterator for RawBlocks<T> {
    type Item = BlockPtr<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let block = self.front?;
        self.front = block.next();
        self.remaining -= 1;
        Some(block)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for RawBlocks<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let block = self.back?;
        self.back = block.prev();
        self.remaining -= 1;
        Some(block)
    }
}

impl<T> ExactSizeIterator for RawBlocks<T> {}

/// An iterator over the blocks of a [`BlockList`], yielding each block's items as a slice.
pub struct Blocks<'a, T> {
    raw: RawBlocks<T>,
    _phantom: PhantomData<&'a T>,
}

impl<T> Blocks<'_, T> {
    pub(crate) const fn new(raw: RawBlocks<T>) -> Self {
        Blocks {
            raw,
            _phantom: PhantomData,
        }
    }
}

impl<T> Clone for Blocks<'_, T> {
    fn clone(&self) -> Self {
        Blocks::new(self.raw.clone())
    }
}

impl<'a, T> Iterator for Blocks<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: Every block of the borrowed list is fully initialized and outlives 'a.
        self.raw.next().map(|block| unsafe { block.as_slice() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

impl<T> DoubleEndedIterator for Blocks<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        // SAFETY: Every block of the borrowed list is fully initialized and outlives 'a.
        self.raw.next_back().map(|block| unsafe { block.as_slice() })
    }
}

impl<T> ExactSizeIterator for Blocks<'_, T> {}

impl<T> FusedIterator for Blocks<'_, T> {}

/// An iterator over the blocks of a [`BlockList`], yielding each block's items as a mutable
/// slice.
pub struct BlocksMut<'a, T> {
    raw: RawBlocks<T>,
    _phantom: PhantomData<&'a mut T>,
}

impl<T> BlocksMut<'_, T> {
    pub(crate) const fn new(raw: RawBlocks<T>) -> Self {
        BlocksMut {
            raw,
            _phantom: PhantomData,
        }
    }
}

impl<'a, T> Iterator for BlocksMut<'a, T> {
    type Item = &'a mut [T];

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: The list is borrowed mutably for 'a and each block is yielded at most once.
        self.raw.next().map(|block| unsafe { block.as_mut_slice() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

impl<T> DoubleEndedIterator for BlocksMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        // SAFETY: The list is borrowed mutably for 'a and each block is yielded at most once.
        self.raw.next_back().map(|block| unsafe { block.as_mut_slice() })
    }
}

impl<T> ExactSizeIterator for BlocksMut<'_, T> {}

impl<T> FusedIterator for BlocksMut<'_, T> {}

/// An iterator over the items of a [`BlockList`], in order across blocks.
pub struct Iter<'a, T> {
    inner: Flatten<Blocks<'a, T>>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(blocks: Blocks<'a, T>, len: usize) -> Self {
        Iter {
            inner: blocks.flatten(),
            remaining: len,
        }
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let item = self.inner.next_back()?;
        self.remaining -= 1;
        Some(item)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// An iterator over mutable references to the items of a [`BlockList`].
pub struct IterMut<'a, T> {
    inner: Flatten<BlocksMut<'a, T>>,
    remaining: usize,
}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn new(blocks: BlocksMut<'a, T>, len: usize) -> Self {
        IterMut {
            inner: blocks.flatten(),
            remaining: len,
        }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let item = self.inner.next_back()?;
        self.remaining -= 1;
        Some(item)
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

/// An owned iterator over the items of a [`BlockList`]. Each block is returned to the allocator
/// as soon as its last item has been yielded.
pub struct IntoIter<T, A: Allocator = Global> {
    first: Option<BlockPtr<T>>,
    last: Option<BlockPtr<T>>,
    /// Items already taken from the start of the first block.
    front: usize,
    /// Items already taken from the end of the last block.
    back: usize,
    remaining: usize,
    alloc: A,
}

impl<T, A: Allocator> IntoIter<T, A> {
    pub(crate) fn new(list: BlockList<T, A>) -> Self {
        let list = ManuallyDrop::new(list);
        IntoIter {
            first: list.first,
            last: list.last,
            front: 0,
            back: 0,
            remaining: list.len,
            // SAFETY: The list is never used or dropped again, so the allocator is moved out.
            alloc: unsafe { ptr::read(&list.alloc) },
        }
    }

    /// Unlinks and deallocates the first block, whose items have all been taken.
    fn release_first(&mut self, block: BlockPtr<T>) {
        self.first = block.next();
        match self.first {
            // SAFETY: The next block is live and owned by this iterator.
            Some(next) => unsafe { next.set_prev(None) },
            None => {
                self.last = None;
                self.back = 0;
            },
        }
        self.front = 0;
        // SAFETY: Every item of the block has been moved out, and nothing refers to it anymore.
        unsafe { block.deallocate_in(&self.alloc) }
    }

    /// Unlinks and deallocates the last block, whose items have all been taken.
    fn release_last(&mut self, block: BlockPtr<T>) {
        self.last = block.prev();
        match self.last {
            // SAFETY: The previous block is live and owned by this iterator.
            Some(prev) => unsafe { prev.set_next(None) },
            None => {
                self.first = None;
                self.front = 0;
            },
        }
        self.back = 0;
        // SAFETY: Every item of the block has been moved out, and nothing refers to it anymore.
        unsafe { block.deallocate_in(&self.alloc) }
    }
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let block = self.first?;
            let end = if self.last == Some(block) {
                block.len() - self.back
            } else {
                block.len()
            };

            if self.front < end {
                // SAFETY: The item is initialized and hasn't been taken from either end.
                let item = unsafe { block.items().add(self.front).read() };
                self.front += 1;
                self.remaining -= 1;
                return Some(item);
            }
            self.release_first(block);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        loop {
            let block = self.last?;
            let start = if self.first == Some(block) {
                self.front
            } else {
                0
            };

            if block.len() - self.back > start {
                self.back += 1;
                // SAFETY: The item is initialized and hasn't been taken from either end.
                let item = unsafe { block.items().add(block.len() - self.back).read() };
                self.remaining -= 1;
                return Some(item);
            }
            self.release_last(block);
        }
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: Allocator> FusedIterator for IntoIter<T, A> {}

impl<T, A: Allocator> Drop for IntoIter<T, A> {
    fn drop(&mut self) {
        // Taking every remaining item drops it and releases each block along the way.
        while self.next().is_some() {}
    }
}

// SAFETY: The iterator owns its remaining blocks exclusively, like the list it came from.
unsafe impl<T: Send, A: Allocator + Send> Send for IntoIter<T, A> {}
// SAFETY: No interior mutability occurs through a shared reference.
unsafe impl<T: Sync, A: Allocator + Sync> Sync for IntoIter<T, A> {}

impl<T, A: Allocator> Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntoIter")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;
use std::mem;
use std::ptr;

use tracing::debug;

use super::block::{link_blocks, unlink_blocks, BlockHandle, BlockPtr};
use super::{Blocks, BlocksMut, IntoIter, Iter, IterMut, RawBlocks};
use crate::alloc::{Allocator, Global};
use crate::collections::error::ReserveError;
use crate::util::option::OptionExtension;
use crate::util::result::ResultExtension;

/// A doubly linked list of blocks, where every block is a single allocation holding a contiguous
/// run of items along with its links.
///
/// Items are pushed and popped a whole block at a time. Each push allocates exactly one block,
/// sized to the pushed items, and each pop hands a run of blocks to the caller as a new list
/// without copying or reallocating anything. Pushing an empty run allocates nothing, so every
/// block in a list holds at least one item.
///
/// Lists split off by [`pop_front`](BlockList::pop_front), [`pop_back`](BlockList::pop_back) or
/// [`pop_block`](BlockList::pop_block) own a clone of this list's allocator, which must be able
/// to deallocate the blocks of the original.
///
/// # Time Complexity
/// For this analysis of time complexity, variables are defined as follows:
/// - `b`: The number of blocks in the BlockList.
/// - `n`: The number of items in the BlockList.
/// - `m`: The number of items being pushed.
/// - `k`: The number of blocks being popped.
///
/// | Method | Complexity |
/// |-|-|
/// | `len/block_len` | `O(1)` |
/// | `push_front/back` | `O(m)` |
/// | `pop_front/back` | `O(k)` |
/// | `pop_block` | `O(1)` |
/// | `pop_block_at` | `O(b)` |
/// | `append/prepend` | `O(1)`*, `O(n)` |
/// | `item_at` | `O(b)` |
/// | `block_at/block_at_back` | `O(b)` |
///
/// \* When both lists use equal allocators.
pub struct BlockList<T, A: Allocator = Global> {
    pub(crate) first: Option<BlockPtr<T>>,
    pub(crate) last: Option<BlockPtr<T>>,
    pub(crate) block_len: usize,
    pub(crate) len: usize,
    pub(crate) alloc: A,
    pub(crate) _phantom: PhantomData<T>,
}

/// Cleans up a partially filled block if filling it panics.
struct FillGuard<'a, T, A: Allocator> {
    block: BlockPtr<T>,
    written: usize,
    alloc: &'a A,
}

impl<T, A: Allocator> Drop for FillGuard<'_, T, A> {
    fn drop(&mut self) {
        // SAFETY: Exactly the first `written` items have been initialized, and the block hasn't
        // been linked anywhere.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.block.items().as_ptr(),
                self.written,
            ));
            self.block.deallocate_in(self.alloc);
        }
    }
}

impl<T> BlockList<T, Global> {
    /// Creates a new, empty BlockList on the [`Global`] allocator.
    pub const fn new() -> BlockList<T, Global> {
        BlockList::new_in(Global)
    }
}

impl<T, A: Allocator> BlockList<T, A> {
    /// Creates a new, empty BlockList on the provided allocator. No memory is allocated until the
    /// first push.
    pub const fn new_in(alloc: A) -> BlockList<T, A> {
        BlockList {
            first: None,
            last: None,
            block_len: 0,
            len: 0,
            alloc,
            _phantom: PhantomData,
        }
    }

    /// Returns the total number of items across every block.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the number of blocks in the list.
    pub const fn block_len(&self) -> usize {
        self.block_len
    }

    pub const fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    pub const fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Returns a reference to the first item of the first block.
    pub fn front(&self) -> Option<&T> {
        self.block_at(0)?.first()
    }

    /// Returns a reference to the last item of the last block.
    pub fn back(&self) -> Option<&T> {
        self.block_at_back(0)?.last()
    }

    /// Moves every item yielded by `items` into a new block at the back of the list.
    ///
    /// If the allocation fails, the list is left unchanged and the items are dropped.
    ///
    /// # Panics
    /// Panics if `items` yields fewer items than its reported length.
    pub fn try_push_back<I>(&mut self, items: I) -> Result<(), ReserveError>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        if let Some(block) = self.try_new_block(items)? {
            // SAFETY: The new block is live and unlinked.
            unsafe { self.link_after(self.last, block, block, 1, block.len()) }
        }
        Ok(())
    }

    /// Moves every item yielded by `items` into a new block at the back of the list.
    ///
    /// # Panics
    /// Panics if the allocation fails, or `items` yields fewer items than its reported length.
    pub fn push_back<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        self.try_push_back(items).throw()
    }

    /// Moves every item yielded by `items` into a new block at the front of the list.
    ///
    /// If the allocation fails, the list is left unchanged and the items are dropped.
    ///
    /// # Panics
    /// Panics if `items` yields fewer items than its reported length.
    pub fn try_push_front<I>(&mut self, items: I) -> Result<(), ReserveError>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        if let Some(block) = self.try_new_block(items)? {
            // SAFETY: The new block is live and unlinked.
            unsafe { self.link_after(None, block, block, 1, block.len()) }
        }
        Ok(())
    }

    /// Moves every item yielded by `items` into a new block at the front of the list.
    ///
    /// # Panics
    /// Panics if the allocation fails, or `items` yields fewer items than its reported length.
    pub fn push_front<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        self.try_push_front(items).throw()
    }

    /// Clones the items of `slice` into a new block at the back of the list.
    pub fn try_push_back_slice(&mut self, slice: &[T]) -> Result<(), ReserveError>
    where
        T: Clone,
    {
        self.try_push_back(slice.iter().cloned())
    }

    pub fn push_back_slice(&mut self, slice: &[T])
    where
        T: Clone,
    {
        self.try_push_back_slice(slice).throw()
    }

    /// Clones the items of `slice` into a new block at the front of the list.
    pub fn try_push_front_slice(&mut self, slice: &[T]) -> Result<(), ReserveError>
    where
        T: Clone,
    {
        self.try_push_front(slice.iter().cloned())
    }

    pub fn push_front_slice(&mut self, slice: &[T])
    where
        T: Clone,
    {
        self.try_push_front_slice(slice).throw()
    }

    /// Removes up to `n` blocks from the front of the list, returning them in order as a new list.
    /// If `n` exceeds the number of blocks, every block is removed.
    ///
    /// # Examples
    /// ```
    /// # use foundation_lib::collections::linked::BlockList;
    /// let mut list = BlockList::new();
    /// list.push_back([1, 2, 3]);
    /// list.push_back([4, 5]);
    ///
    /// let popped = list.pop_front(1);
    /// assert_eq!(popped.block_at(0), Some(&[1, 2, 3][..]));
    /// assert_eq!(list.len(), 2);
    /// assert_eq!(list.block_len(), 1);
    /// ```
    pub fn pop_front(&mut self, n: usize) -> BlockList<T, A>
    where
        A: Clone,
    {
        let n = n.min(self.block_len);
        let Some(first) = self.first.filter(|_| n > 0) else {
            return BlockList::new_in(self.alloc.clone());
        };

        let mut last = first;
        let mut items = first.len();
        for _ in 1..n {
            // SAFETY: There are at least n blocks, so the first n - 1 are all followed by another.
            last = unsafe { last.next().unreachable() };
            items += last.len();
        }
        // SAFETY: The chain first..=last was just walked within this list.
        unsafe { self.detach(first, last, n, items) }
    }

    /// Removes up to `n` blocks from the back of the list, returning them in order as a new list.
    /// If `n` exceeds the number of blocks, every block is removed.
    pub fn pop_back(&mut self, n: usize) -> BlockList<T, A>
    where
        A: Clone,
    {
        let n = n.min(self.block_len);
        let Some(last) = self.last.filter(|_| n > 0) else {
            return BlockList::new_in(self.alloc.clone());
        };

        let mut first = last;
        let mut items = last.len();
        for _ in 1..n {
            // SAFETY: There are at least n blocks, so the last n - 1 are all preceded by another.
            first = unsafe { first.prev().unreachable() };
            items += first.len();
        }
        // SAFETY: The chain first..=last was just walked within this list.
        unsafe { self.detach(first, last, n, items) }
    }

    /// Removes the block named by `handle`, returning it as a new list containing only that block.
    /// Boundary blocks are popped through [`pop_front`](BlockList::pop_front) and
    /// [`pop_back`](BlockList::pop_back).
    ///
    /// # Safety
    /// `handle` must name a block which is currently part of this list.
    pub unsafe fn pop_block(&mut self, handle: BlockHandle<T>) -> BlockList<T, A>
    where
        A: Clone,
    {
        let block = handle.block;
        if self.first == Some(block) {
            self.pop_front(1)
        } else if self.last == Some(block) {
            self.pop_back(1)
        } else {
            // SAFETY: The caller guarantees that the block is part of this list.
            unsafe { self.detach(block, block, 1, block.len()) }
        }
    }

    /// Removes the block at `index`, returning it as a new list, or [`None`] if there are no more
    /// than `index` blocks.
    pub fn pop_block_at(&mut self, index: usize) -> Option<BlockList<T, A>>
    where
        A: Clone,
    {
        let handle = self.handle_at(index)?;
        // SAFETY: The handle was just found within this list.
        Some(unsafe { self.pop_block(handle) })
    }

    /// Returns a handle to the block at `index`, counting from the front.
    pub fn handle_at(&self, index: usize) -> Option<BlockHandle<T>> {
        self.block_ptrs()
            .nth(index)
            .map(|block| BlockHandle { block })
    }

    /// Returns true if `handle` names a block which is part of this list.
    pub fn contains_block(&self, handle: BlockHandle<T>) -> bool {
        self.block_ptrs().any(|block| block == handle.block)
    }

    /// Moves every block of `other` to the back of this list, leaving `other` empty. If the two
    /// lists use equal allocators, the blocks are relinked without touching their items.
    /// Otherwise, every block is reallocated on this list's allocator.
    ///
    /// If reallocating fails, both lists are left unchanged.
    pub fn try_append(&mut self, other: &mut BlockList<T, A>) -> Result<(), ReserveError> {
        self.try_splice(other, false)
    }

    pub fn append(&mut self, other: &mut BlockList<T, A>) {
        self.try_append(other).throw()
    }

    /// Moves every block of `other` to the front of this list, leaving `other` empty. See
    /// [`try_append`](BlockList::try_append).
    pub fn try_prepend(&mut self, other: &mut BlockList<T, A>) -> Result<(), ReserveError> {
        self.try_splice(other, true)
    }

    pub fn prepend(&mut self, other: &mut BlockList<T, A>) {
        self.try_prepend(other).throw()
    }

    /// Returns a reference to the item at `index`, counting across blocks. The search starts from
    /// whichever end of the list is nearer.
    pub fn item_at(&self, index: usize) -> Option<&T> {
        let (block, offset) = self.locate(index)?;
        // SAFETY: The offset is within the block, and the borrow is tied to the list.
        Some(unsafe { &*block.items().as_ptr().add(offset) })
    }

    pub fn item_at_mut(&mut self, index: usize) -> Option<&mut T> {
        let (block, offset) = self.locate(index)?;
        // SAFETY: The offset is within the block, and the list is borrowed mutably.
        Some(unsafe { &mut *block.items().as_ptr().add(offset) })
    }

    /// Returns the items of the block at `index`, counting from the front.
    pub fn block_at(&self, index: usize) -> Option<&[T]> {
        self.blocks().nth(index)
    }

    /// Returns the items of the block at `index`, counting from the back.
    pub fn block_at_back(&self, index: usize) -> Option<&[T]> {
        self.blocks().nth_back(index)
    }

    pub fn block_at_mut(&mut self, index: usize) -> Option<&mut [T]> {
        self.blocks_mut().nth(index)
    }

    /// Returns an iterator over the items of every block, as slices.
    pub fn blocks(&self) -> Blocks<'_, T> {
        Blocks::new(self.block_ptrs())
    }

    pub fn blocks_mut(&mut self) -> BlocksMut<'_, T> {
        BlocksMut::new(self.block_ptrs())
    }

    /// Returns an iterator over every item in the list, in order across blocks.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.blocks(), self.len)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        let len = self.len;
        IterMut::new(self.blocks_mut(), len)
    }

    /// Walks the whole chain, checking that every link agrees with its neighbour and that the
    /// recorded block and item counts match the blocks themselves.
    pub fn verify(&self) -> bool {
        let mut blocks = 0;
        let mut items = 0;
        let mut prev = None;
        let mut current = self.first;

        while let Some(block) = current {
            if blocks == self.block_len || block.prev() != prev {
                return false;
            }
            blocks += 1;
            items += block.len();
            prev = Some(block);
            current = block.next();
        }

        prev == self.last && blocks == self.block_len && items == self.len
    }

    /// Drops every item and deallocates every block, leaving the list empty.
    pub fn clear(&mut self) {
        let mut blocks = 0;
        let mut items = 0;
        let mut current = self.first.take();
        self.last = None;

        while let Some(block) = current {
            current = block.next();
            blocks += 1;
            items += block.len();
            // SAFETY: Every block in the chain is live, fully initialized and owned by this list.
            // It has already been unreachable from the list since the start of the walk.
            unsafe {
                block.drop_items();
                block.deallocate_in(&self.alloc);
            }
        }

        debug_assert_eq!(blocks, self.block_len, "Block count doesn't match the chain!");
        debug_assert_eq!(items, self.len, "Item count doesn't match the chain!");
        self.block_len = 0;
        self.len = 0;
    }

    /// Creates a copy of this list on a clone of the same allocator, with the same block
    /// boundaries and clones of every item.
    pub fn try_clone(&self) -> Result<BlockList<T, A>, ReserveError>
    where
        T: Clone,
        A: Clone,
    {
        let mut list = BlockList::new_in(self.alloc.clone());
        for block in self.blocks() {
            list.try_push_back_slice(block)?;
        }
        Ok(list)
    }

    pub(crate) fn block_ptrs(&self) -> RawBlocks<T> {
        RawBlocks::new(self.first, self.last, self.block_len)
    }

    fn try_new_block<I>(&self, items: I) -> Result<Option<BlockPtr<T>>, ReserveError>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let items = items.into_iter();
        let len = items.len();
        if len == 0 {
            return Ok(None);
        }

        let block = BlockPtr::allocate_in(len, &self.alloc)?;
        let mut guard = FillGuard {
            block,
            written: 0,
            alloc: &self.alloc,
        };
        for item in items.take(len) {
            // SAFETY: Fewer than len items have been written, so the slot is within the payload.
            unsafe { block.items().add(guard.written).write(item) }
            guard.written += 1;
        }
        assert_eq!(guard.written, len, "Iterator yielded fewer items than its length!");

        mem::forget(guard);
        Ok(Some(block))
    }

    /// Links the chain `first..=last` directly after `at`, or at the front if `at` is [`None`].
    ///
    /// # Safety
    /// `at` must be part of this list, and the chain must be live, unlinked at both ends and
    /// allocated by an allocator equal to this list's.
    unsafe fn link_after(
        &mut self,
        at: Option<BlockPtr<T>>,
        first: BlockPtr<T>,
        last: BlockPtr<T>,
        blocks: usize,
        items: usize,
    ) {
        let after = match at {
            Some(block) => block.next(),
            None => self.first,
        };
        // SAFETY: `at` and `after` are adjacent within this list.
        unsafe { link_blocks(at, first, last, after) }

        if at.is_none() {
            self.first = Some(first);
        }
        if after.is_none() {
            self.last = Some(last);
        }
        self.block_len += blocks;
        self.len += items;
    }

    /// Unlinks the chain `first..=last`, which holds `blocks` blocks and `items` items, returning
    /// it as a new list.
    ///
    /// # Safety
    /// The chain must be part of this list, and the counts must match it.
    unsafe fn detach(
        &mut self,
        first: BlockPtr<T>,
        last: BlockPtr<T>,
        blocks: usize,
        items: usize,
    ) -> BlockList<T, A>
    where
        A: Clone,
    {
        let before = first.prev();
        let after = last.next();
        // SAFETY: The chain sits between its own neighbours.
        unsafe { unlink_blocks(before, first, last, after) }

        if before.is_none() {
            self.first = after;
        }
        if after.is_none() {
            self.last = before;
        }
        self.block_len -= blocks;
        self.len -= items;

        BlockList {
            first: Some(first),
            last: Some(last),
            block_len: blocks,
            len: items,
            alloc: self.alloc.clone(),
            _phantom: PhantomData,
        }
    }

    fn locate(&self, index: usize) -> Option<(BlockPtr<T>, usize)> {
        if index >= self.len {
            return None;
        }

        if index < self.len / 2 {
            let mut offset = index;
            for block in self.block_ptrs() {
                if offset < block.len() {
                    return Some((block, offset));
                }
                offset -= block.len();
            }
        } else {
            let mut from_back = self.len - index;
            for block in self.block_ptrs().rev() {
                if from_back <= block.len() {
                    return Some((block, block.len() - from_back));
                }
                from_back -= block.len();
            }
        }
        None
    }

    fn try_splice(&mut self, other: &mut BlockList<T, A>, front: bool) -> Result<(), ReserveError> {
        let (Some(first), Some(last)) = (other.first, other.last) else {
            return Ok(());
        };
        let (first, last) = if self.alloc == other.alloc {
            (first, last)
        } else {
            self.try_migrate(other)?
        };

        let blocks = mem::take(&mut other.block_len);
        let items = mem::take(&mut other.len);
        other.first = None;
        other.last = None;

        let at = if front { None } else { self.last };
        // SAFETY: The chain now belongs to this list's allocator and isn't linked anywhere else.
        unsafe { self.link_after(at, first, last, blocks, items) }
        Ok(())
    }

    /// Moves the items of every block in `other` into new blocks on this list's allocator,
    /// returning the ends of the new chain. Every block of `other` is deallocated, but its
    /// fields are left for the caller to reset.
    fn try_migrate(
        &self,
        other: &BlockList<T, A>,
    ) -> Result<(BlockPtr<T>, BlockPtr<T>), ReserveError> {
        let mut chain: Option<(BlockPtr<T>, BlockPtr<T>)> = None;
        for source in other.block_ptrs() {
            let block = match BlockPtr::allocate_in(source.len(), &self.alloc) {
                Ok(block) => block,
                Err(err) => {
                    if let Some((first, _)) = chain {
                        // SAFETY: The new chain only holds empty blocks on this allocator.
                        unsafe { Self::deallocate_chain(first, &self.alloc) }
                    }
                    return Err(err);
                },
            };
            chain = Some(match chain {
                None => (block, block),
                Some((first, last)) => {
                    // SAFETY: Both blocks are live and last is the end of the new chain.
                    unsafe { link_blocks(Some(last), block, block, None) }
                    (first, block)
                },
            });
        }
        // SAFETY: The caller has checked that other holds at least one block.
        let (first, last) = unsafe { chain.unreachable() };

        let mut target = Some(first);
        let mut source = other.first;
        while let (Some(dst), Some(src)) = (target, source) {
            target = dst.next();
            source = src.next();
            // SAFETY: Both blocks were sized for the same number of items, and are distinct
            // allocations. The source items are moved, so the source block is only deallocated.
            unsafe {
                ptr::copy_nonoverlapping(src.items().as_ptr(), dst.items().as_ptr(), src.len());
                src.deallocate_in(&other.alloc);
            }
        }

        debug!(
            blocks = other.block_len,
            items = other.len,
            "migrated blocks between allocators"
        );
        Ok((first, last))
    }

    /// Deallocates every block in the chain starting at `first`, without dropping any items.
    ///
    /// # Safety
    /// Every block in the chain must be live, allocated by `alloc` and not used again.
    unsafe fn deallocate_chain(first: BlockPtr<T>, alloc: &A) {
        let mut current = Some(first);
        while let Some(block) = current {
            current = block.next();
            // SAFETY: Forwarded to the caller.
            unsafe { block.deallocate_in(alloc) }
        }
    }
}

impl<T, A: Allocator> Drop for BlockList<T, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, A: Allocator + Default> Default for BlockList<T, A> {
    fn default() -> Self {
        BlockList::new_in(A::default())
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for BlockList<T, A> {
    fn clone(&self) -> Self {
        self.try_clone().throw()
    }
}

impl<T, A: Allocator> IntoIterator for BlockList<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a BlockList<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut BlockList<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

// SAFETY: BlockLists own their blocks exclusively, so sending one sends every item with it.
unsafe impl<T: Send, A: Allocator + Send> Send for BlockList<T, A> {}
// SAFETY: No interior mutability occurs through a shared reference, apart from what the
// allocator itself allows.
unsafe impl<T: Sync, A: Allocator + Sync> Sync for BlockList<T, A> {}

/// BlockLists are equal if they hold equal items in the same order, regardless of how the items
/// are split into blocks.
impl<T: PartialEq, A: Allocator, B: Allocator> PartialEq<BlockList<T, B>> for BlockList<T, A> {
    fn eq(&self, other: &BlockList<T, B>) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq, A: Allocator> Eq for BlockList<T, A> {}

impl<T: Debug, A: Allocator> Debug for BlockList<T, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.blocks()).finish()
    }
}

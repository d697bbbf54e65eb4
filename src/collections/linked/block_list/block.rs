use std::alloc::Layout;
use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};
use std::slice;

use tracing::trace;

use crate::alloc::Allocator;
use crate::collections::error::{CapacityOverflow, ReserveError};
use crate::util::option::OptionExtension;

/// The header at the start of every block allocation. A block's items follow immediately, at
/// [`BlockPtr::PAYLOAD_OFFSET`].
#[repr(C)]
pub(crate) struct Header {
    pub next: Option<NonNull<Header>>,
    pub prev: Option<NonNull<Header>>,
    pub len: usize,
}

/// A pointer to a live block of `T`. Every BlockPtr is created by [`BlockPtr::allocate_in`] and
/// must not be used after [`BlockPtr::deallocate_in`].
pub(crate) struct BlockPtr<T> {
    ptr: NonNull<Header>,
    _phantom: PhantomData<T>,
}

impl<T> BlockPtr<T> {
    pub const PAYLOAD_OFFSET: usize =
        mem::size_of::<Header>().next_multiple_of(mem::align_of::<T>());

    /// The layout of a block holding `len` items: a header followed by the items, in one
    /// allocation.
    pub fn layout(len: usize) -> Result<Layout, CapacityOverflow> {
        let items = Layout::array::<T>(len).map_err(|_| CapacityOverflow)?;
        let (layout, offset) = Layout::new::<Header>()
            .extend(items)
            .map_err(|_| CapacityOverflow)?;
        debug_assert_eq!(offset, Self::PAYLOAD_OFFSET);
        Ok(layout)
    }

    /// Allocates an unlinked block with room for exactly `len` items. The header is initialized,
    /// but no items are.
    pub fn allocate_in<A: Allocator>(len: usize, alloc: &A) -> Result<BlockPtr<T>, ReserveError> {
        let layout = Self::layout(len)?;
        let ptr = alloc.allocate(layout)?.cast::<Header>();
        // SAFETY: The allocation is large enough for and aligned to a Header.
        unsafe {
            ptr.write(Header {
                next: None,
                prev: None,
                len,
            });
        }
        trace!(len, size = layout.size(), "allocated block");
        Ok(BlockPtr::from_header(ptr))
    }

    /// Deallocates this block without dropping its items.
    ///
    /// # Safety
    /// The block must have been allocated by `alloc` (or an equal allocator) and must not be used
    /// again.
    pub unsafe fn deallocate_in<A: Allocator>(self, alloc: &A) {
        // SAFETY: The same layout was valid when this block was allocated.
        let layout = unsafe { Self::layout(self.len()).ok().unreachable() };
        // SAFETY: Forwarded to the caller.
        unsafe { alloc.deallocate(self.ptr.cast(), layout) }
    }

    pub const fn from_header(ptr: NonNull<Header>) -> BlockPtr<T> {
        BlockPtr {
            ptr,
            _phantom: PhantomData,
        }
    }

    pub const fn header_ptr(self) -> NonNull<Header> {
        self.ptr
    }

    fn header(&self) -> &Header {
        // SAFETY: A BlockPtr always points to a live, initialized header.
        unsafe { self.ptr.as_ref() }
    }

    pub fn len(self) -> usize {
        self.header().len
    }

    pub fn next(self) -> Option<BlockPtr<T>> {
        self.header().next.map(BlockPtr::from_header)
    }

    pub fn prev(self) -> Option<BlockPtr<T>> {
        self.header().prev.map(BlockPtr::from_header)
    }

    /// # Safety
    /// No reference to this block's header may be live.
    pub unsafe fn set_next(mut self, next: Option<BlockPtr<T>>) {
        // SAFETY: The header is live and not otherwise borrowed.
        unsafe { self.ptr.as_mut().next = next.map(BlockPtr::header_ptr) }
    }

    /// # Safety
    /// No reference to this block's header may be live.
    pub unsafe fn set_prev(mut self, prev: Option<BlockPtr<T>>) {
        // SAFETY: The header is live and not otherwise borrowed.
        unsafe { self.ptr.as_mut().prev = prev.map(BlockPtr::header_ptr) }
    }

    /// Returns a pointer to the first item slot of this block.
    pub fn items(self) -> NonNull<T> {
        // SAFETY: The payload offset lies within (or at the end of) the block's allocation.
        unsafe { self.ptr.byte_add(Self::PAYLOAD_OFFSET).cast() }
    }

    /// # Safety
    /// Every item in the block must be initialized, and the slice must not outlive the block or
    /// alias a mutable borrow of it.
    pub unsafe fn as_slice<'a>(self) -> &'a [T] {
        // SAFETY: Forwarded to the caller.
        unsafe { slice::from_raw_parts(self.items().as_ptr(), self.len()) }
    }

    /// # Safety
    /// Every item in the block must be initialized, and the slice must not outlive the block or
    /// alias any other borrow of it.
    pub unsafe fn as_mut_slice<'a>(self) -> &'a mut [T] {
        // SAFETY: Forwarded to the caller.
        unsafe { slice::from_raw_parts_mut(self.items().as_ptr(), self.len()) }
    }

    /// Drops every item in this block, leaving the block itself allocated.
    ///
    /// # Safety
    /// Every item in the block must be initialized, and must not be used again.
    pub unsafe fn drop_items(self) {
        // SAFETY: Forwarded to the caller.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.items().as_ptr(),
                self.len(),
            ));
        }
    }
}

impl<T> Clone for BlockPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BlockPtr<T> {}

impl<T> PartialEq for BlockPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for BlockPtr<T> {}

impl<T> Debug for BlockPtr<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "BlockPtr({:p})", self.ptr)
    }
}

/// Links the chain `first..=last` between `before` and `after`, which must currently be adjacent.
/// The pointer equivalent of [`link_chain`](crate::collections::linked::index_list::link_chain).
///
/// # Safety
/// Every block must be live, and no references to their headers may be held.
pub(crate) unsafe fn link_blocks<T>(
    before: Option<BlockPtr<T>>,
    first: BlockPtr<T>,
    last: BlockPtr<T>,
    after: Option<BlockPtr<T>>,
) {
    debug_assert!(
        before.is_none_or(|b| b.next() == after) && after.is_none_or(|a| a.prev() == before),
        "Linking between blocks which aren't adjacent!"
    );
    // SAFETY: Forwarded to the caller.
    unsafe {
        if let Some(before) = before {
            before.set_next(Some(first));
        }
        first.set_prev(before);
        last.set_next(after);
        if let Some(after) = after {
            after.set_prev(Some(last));
        }
    }
}

/// Unlinks the chain `first..=last` from between `before` and `after`, leaving those two adjacent
/// and the chain's outer links cleared.
///
/// # Safety
/// Every block must be live, and no references to their headers may be held.
pub(crate) unsafe fn unlink_blocks<T>(
    before: Option<BlockPtr<T>>,
    first: BlockPtr<T>,
    last: BlockPtr<T>,
    after: Option<BlockPtr<T>>,
) {
    debug_assert!(
        first.prev() == before && last.next() == after,
        "Unlinking a chain which isn't linked between the provided blocks!"
    );
    // SAFETY: Forwarded to the caller.
    unsafe {
        if let Some(before) = before {
            before.set_next(after);
        }
        if let Some(after) = after {
            after.set_prev(before);
        }
        first.set_prev(None);
        last.set_next(None);
    }
}

/// A handle naming one block of a [`BlockList`](super::BlockList), used to pop that block in
/// `O(1)` through [`BlockList::pop_block`](super::BlockList::pop_block).
///
/// A handle doesn't borrow the list. It becomes stale as soon as its block leaves the list.
pub struct BlockHandle<T> {
    pub(crate) block: BlockPtr<T>,
}

impl<T> Clone for BlockHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BlockHandle<T> {}

impl<T> PartialEq for BlockHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.block == other.block
    }
}

impl<T> Eq for BlockHandle<T> {}

impl<T> Debug for BlockHandle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHandle({:p})", self.block.header_ptr())
    }
}

use std::alloc::Layout;
use std::borrow::{Borrow, BorrowMut};
use std::cmp;
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::mem::{ManuallyDrop, MaybeUninit};
use std::ops::{Deref, DerefMut, Range};
use std::ptr::{self, NonNull};
use std::slice;

use super::{GrowthPolicy, IntoIter};
use crate::alloc::{Allocator, Global};
use crate::collections::error::{CapacityOverflow, IndexOutOfBounds, ReserveError};
use crate::util::result::ResultExtension;

/// A growable, contiguous collection which gets its memory from an [`Allocator`].
///
/// A Stack owns exactly one buffer with room for `cap` elements, the first `len` of which are
/// initialized. When it runs out of room, the new capacity is picked by its [`GrowthPolicy`] and
/// the buffer is resized in place if the allocator allows, or moved to a fresh allocation
/// otherwise.
///
/// Every method that can allocate comes in two flavours: `try_*`, which returns a
/// [`ReserveError`] and leaves the Stack untouched on failure, and a shorthand which panics with
/// the error instead.
///
/// # Time Complexity
/// For this analysis of time complexity, variables are defined as follows:
/// - `n`: The number of items in the Stack.
/// - `i`: The index of the item in question.
/// - `m`: The number of items being added.
///
/// | Method | Complexity |
/// |-|-|
/// | `get` | `O(1)` |
/// | `len` | `O(1)` |
/// | `push` | `O(1)`*, `O(n)` |
/// | `pop` | `O(1)` |
/// | `insert` | `O(n-i)` |
/// | `remove` | `O(n-i)` |
/// | `swap_remove` | `O(1)` |
/// | `reserve` | `O(n)`**, `O(1)` |
/// | `extend_from_slice` | `O(m)`*, `O(n+m)` |
///
/// \* Amortized over many pushes, because capacity grows geometrically.
///
/// \** If the Stack already has enough capacity, or the allocator resizes in place.
pub struct Stack<T, A: Allocator = Global> {
    pub(crate) ptr: NonNull<T>,
    pub(crate) len: usize,
    pub(crate) cap: usize,
    pub(crate) alloc: A,
    pub(crate) growth: GrowthPolicy,
    pub(crate) _phantom: PhantomData<T>,
}

impl<T> Stack<T, Global> {
    /// Creates a new Stack on the [`Global`] allocator with length and capacity 0. Memory will be
    /// allocated when the capacity changes.
    ///
    /// # Examples
    /// ```
    /// # use foundation_lib::collections::contiguous::Stack;
    /// let stack: Stack<u8> = Stack::new();
    /// assert_eq!(stack.len(), 0);
    /// assert_eq!(stack.cap(), 0);
    /// ```
    pub const fn new() -> Stack<T, Global> {
        Stack::new_in(Global)
    }

    /// Creates a new Stack on the [`Global`] allocator with capacity exactly equal to `cap`.
    ///
    /// # Panics
    /// Panics if the allocation fails or its layout size exceeds [`isize::MAX`].
    pub fn with_cap(cap: usize) -> Stack<T, Global> {
        Stack::try_with_cap_in(cap, Global).throw()
    }
}

impl<T, A: Allocator> Stack<T, A> {
    const IS_ZST: bool = size_of::<T>() == 0;

    /// The largest capacity a Stack of `T` can have without its layout exceeding [`isize::MAX`].
    pub const MAX_CAP: usize = if Self::IS_ZST {
        usize::MAX
    } else {
        isize::MAX as usize / size_of::<T>()
    };

    /// Creates a new, empty Stack which will allocate from `alloc` once it needs memory.
    ///
    /// # Examples
    /// ```
    /// # use foundation_lib::alloc::Global;
    /// # use foundation_lib::collections::contiguous::Stack;
    /// let stack: Stack<u8> = Stack::new_in(Global);
    /// assert!(stack.data().is_none());
    /// ```
    pub const fn new_in(alloc: A) -> Stack<T, A> {
        Stack::with_growth_in(GrowthPolicy::DEFAULT, alloc)
    }

    /// Creates a new, empty Stack that grows according to `growth`.
    pub const fn with_growth_in(growth: GrowthPolicy, alloc: A) -> Stack<T, A> {
        Stack {
            ptr: NonNull::dangling(),
            len: 0,
            cap: 0,
            alloc,
            growth,
            _phantom: PhantomData,
        }
    }

    /// Creates a new Stack with capacity exactly equal to `cap`, allowing values to be added
    /// without reallocation.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the capacity overflows or the allocator fails.
    pub fn try_with_cap_in(cap: usize, alloc: A) -> Result<Stack<T, A>, ReserveError> {
        let mut stack = Stack::new_in(alloc);
        stack.try_set_capacity(cap)?;
        Ok(stack)
    }

    /// Like [`try_with_cap_in`](Stack::try_with_cap_in), but panics on failure.
    ///
    /// # Panics
    /// Panics if the allocation fails or its layout size exceeds [`isize::MAX`].
    pub fn with_cap_in(cap: usize, alloc: A) -> Stack<T, A> {
        Stack::try_with_cap_in(cap, alloc).throw()
    }

    /// Creates a Stack holding clones of every element in `items`, with exactly enough capacity.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the capacity overflows or the allocator fails.
    pub fn try_from_slice_in(items: &[T], alloc: A) -> Result<Stack<T, A>, ReserveError>
    where
        T: Clone,
    {
        let mut stack = Stack::try_with_cap_in(items.len(), alloc)?;
        stack.try_extend_from_slice(items)?;
        Ok(stack)
    }

    /// Returns the length of the Stack.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the Stack contains no elements.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the current capacity of the Stack.
    pub const fn cap(&self) -> usize {
        self.cap
    }

    /// Returns a reference to the allocator used by this Stack.
    pub const fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Returns the policy used when this Stack grows.
    pub const fn growth(&self) -> GrowthPolicy {
        self.growth
    }

    /// Returns a pointer to the start of the owned buffer, or `None` if the Stack doesn't own one.
    /// Zero sized types never need a buffer.
    pub const fn data(&self) -> Option<NonNull<T>> {
        if self.cap == 0 || Self::IS_ZST {
            None
        } else {
            Some(self.ptr)
        }
    }

    /// Returns a raw pointer to the start of the Stack's elements. The pointer is dangling if no
    /// buffer is owned.
    pub const fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Returns a mutable raw pointer to the start of the Stack's elements.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Push the provided value onto the end of the Stack, growing if required.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the Stack needed to grow and couldn't. `value` is dropped.
    ///
    /// # Examples
    /// ```
    /// # use foundation_lib::collections::contiguous::Stack;
    /// let mut stack = Stack::new();
    /// stack.try_push(1_u8).unwrap();
    /// assert_eq!(stack.cap(), 8);
    /// ```
    pub fn try_push(&mut self, value: T) -> Result<(), ReserveError> {
        if self.len == self.cap {
            self.try_reserve_extra(1)?;
        }
        // SAFETY: The capacity has just been adjusted to support the addition of the new item.
        unsafe { self.push_unchecked(value) }
        Ok(())
    }

    /// Like [`try_push`](Stack::try_push), but panics on failure.
    ///
    /// # Panics
    /// Panics if the Stack needed to grow and couldn't.
    pub fn push(&mut self, value: T) {
        self.try_push(value).throw()
    }

    /// Push the provided value onto the end of the Stack, assuming that there is enough capacity
    /// to do so.
    ///
    /// # Safety
    /// It is up to the caller to ensure that the Stack has enough capacity to add the provided
    /// value. Using this method on a Stack without enough capacity is undefined behavior.
    pub unsafe fn push_unchecked(&mut self, value: T) {
        // SAFETY: It is up to the caller to ensure that the Stack has enough capacity for this
        // push, so the write is in bounds of the buffer.
        unsafe { self.ptr.add(self.len).write(value) }
        self.len += 1;
    }

    /// Pops the last value off the end of the Stack, returning it if the Stack wasn't empty.
    ///
    /// # Examples
    /// ```
    /// # use foundation_lib::collections::contiguous::Stack;
    /// let mut stack: Stack<_> = (0..3).collect();
    /// assert_eq!(stack.pop(), Some(2));
    /// assert_eq!(stack.pop(), Some(1));
    /// assert_eq!(stack.pop(), Some(0));
    /// assert_eq!(stack.pop(), None);
    /// ```
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            // SAFETY: len has just been decremented, so it refers to the last initialized value,
            // which is no longer considered part of the Stack.
            Some(unsafe { self.ptr.add(self.len).read() })
        }
    }

    /// Inserts the provided value at `index`, moving all following elements back by one.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the Stack needed to grow and couldn't.
    ///
    /// # Panics
    /// Panics if `index > len`.
    ///
    /// # Examples
    /// ```
    /// # use foundation_lib::collections::contiguous::Stack;
    /// let mut stack: Stack<_> = (0..3).collect();
    /// stack.try_insert(1, 100).unwrap();
    /// stack.try_insert(4, 200).unwrap();
    /// assert_eq!(stack, [0, 100, 1, 2, 200]);
    /// ```
    pub fn try_insert(&mut self, index: usize, value: T) -> Result<(), ReserveError> {
        self.check_insert_index(index);
        if self.len == self.cap {
            self.try_reserve_extra(1)?;
        }

        // SAFETY: index <= len < cap. ptr::copy handles the overlap between the shifted ranges,
        // leaving slot free to be overwritten.
        unsafe {
            let slot = self.ptr.add(index);
            ptr::copy(slot.as_ptr(), slot.add(1).as_ptr(), self.len - index);
            slot.write(value);
        }
        self.len += 1;
        Ok(())
    }

    /// Like [`try_insert`](Stack::try_insert), but panics on failure.
    ///
    /// # Panics
    /// Panics if `index > len` or if the Stack needed to grow and couldn't.
    pub fn insert(&mut self, index: usize, value: T) {
        self.try_insert(index, value).throw()
    }

    /// Removes the element at `index`, moving all following elements forward to fill the gap.
    ///
    /// # Panics
    /// Panics if the provided index is out of bounds.
    ///
    /// # Examples
    /// ```
    /// # use foundation_lib::collections::contiguous::Stack;
    /// let mut stack: Stack<_> = "Hello world!".chars().collect();
    /// assert_eq!(stack.remove(1), 'e');
    /// assert_eq!(stack.remove(4), ' ');
    /// assert_eq!(stack, "Hlloworld!".chars().collect::<Stack<_>>());
    /// ```
    pub fn remove(&mut self, index: usize) -> T {
        self.check_index(index);

        // SAFETY: index < len, so the value is initialized. After reading it, the following
        // values are shifted forward over its slot, overlap is handled by ptr::copy.
        unsafe {
            let slot = self.ptr.add(index);
            let value = slot.read();
            ptr::copy(slot.add(1).as_ptr(), slot.as_ptr(), self.len - index - 1);
            self.len -= 1;
            value
        }
    }

    /// Removes the element at `index`, replacing it with the last element of the Stack.
    ///
    /// # Panics
    /// Panics if the provided index is out of bounds.
    pub fn swap_remove(&mut self, index: usize) -> T {
        self.check_index(index);
        let last = self.len - 1;
        self.swap(index, last);
        // SAFETY: The Stack has at least one element, because index is in bounds.
        unsafe { self.pop().unwrap_unchecked() }
    }

    /// Replaces the element at `index` with `new_value`, returning the old value.
    ///
    /// # Panics
    /// Panics if the provided index is out of bounds.
    pub fn replace(&mut self, index: usize, new_value: T) -> T {
        self.check_index(index);
        std::mem::replace(&mut self[index], new_value)
    }

    /// Ensures that the Stack has capacity for at least `target` elements, growing according to
    /// its [`GrowthPolicy`] if it doesn't already. Calling this again with the same value is a
    /// no-op.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the capacity overflows or the allocator fails, in which case
    /// the Stack is unchanged.
    pub fn try_reserve(&mut self, target: usize) -> Result<(), ReserveError> {
        if self.cap >= target {
            return Ok(());
        }
        if target > Self::MAX_CAP {
            return Err(CapacityOverflow.into());
        }

        let new_cap = cmp::min(self.growth.calculate_growth(self.cap, target), Self::MAX_CAP);
        self.try_set_capacity(new_cap)
    }

    /// Like [`try_reserve`](Stack::try_reserve), but panics on failure.
    ///
    /// # Panics
    /// Panics if the capacity overflows or the allocator fails.
    pub fn reserve(&mut self, target: usize) {
        self.try_reserve(target).throw()
    }

    /// Ensures that the Stack has capacity to hold an additional `extra` elements.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the capacity overflows or the allocator fails.
    pub fn try_reserve_extra(&mut self, extra: usize) -> Result<(), ReserveError> {
        self.try_reserve(self.len.checked_add(extra).ok_or(CapacityOverflow)?)
    }

    /// Sets the capacity of the Stack to exactly `new_cap`, dropping any elements which wouldn't
    /// fit.
    ///
    /// An in-place resize is attempted first. If the allocator can't do so, a new buffer is
    /// allocated, the kept elements are moved across and only then is the old buffer released, so
    /// an allocation failure never loses any data.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the capacity overflows or the allocator fails, in which case
    /// the Stack is unchanged.
    pub fn try_set_capacity(&mut self, new_cap: usize) -> Result<(), ReserveError> {
        if new_cap == self.cap {
            return Ok(());
        }
        if Self::IS_ZST {
            self.truncate(new_cap);
            self.cap = new_cap;
            return Ok(());
        }

        let new_layout = Layout::array::<T>(new_cap).map_err(|_| CapacityOverflow)?;

        if new_cap == 0 {
            self.clear();
            // SAFETY: The capacity was non-zero, so a buffer is owned.
            unsafe { self.release_buffer() };
            return Ok(());
        }

        if self.cap > 0 && new_cap >= self.len {
            // SAFETY: The buffer is owned and was allocated with the current layout. The new size
            // is a valid layout size for the same alignment.
            let resized = unsafe {
                self.alloc.resize(self.ptr.cast(), self.current_layout(), new_layout.size())
            };
            match resized {
                Ok(new_ptr) => {
                    tracing::trace!(old_cap = self.cap, new_cap, "stack resized");
                    self.ptr = new_ptr.cast();
                    self.cap = new_cap;
                    return Ok(());
                },
                Err(_) => tracing::trace!(old_cap = self.cap, new_cap, "stack resize declined"),
            }
        }

        let new_ptr: NonNull<T> = self.alloc.allocate(new_layout)
            .inspect_err(|err| tracing::debug!(%err, "stack allocation failed"))?
            .cast();
        tracing::trace!(old_cap = self.cap, new_cap, "stack reallocated");

        let kept = cmp::min(self.len, new_cap);
        let (old_ptr, old_len, old_cap) = (self.ptr, self.len, self.cap);

        debug_assert!(
            old_cap == 0 || !Self::overlaps(old_ptr, old_cap, new_ptr, new_cap),
            "Allocator returned a buffer overlapping a live one!"
        );

        // SAFETY: Both buffers are valid for kept elements and don't overlap. The moved values are
        // no longer considered part of the old buffer.
        unsafe { ptr::copy_nonoverlapping(old_ptr.as_ptr(), new_ptr.as_ptr(), kept) };

        self.ptr = new_ptr;
        self.len = kept;
        self.cap = new_cap;

        if old_cap > 0 {
            // SAFETY: Values from kept to old_len are still initialized in the old buffer and
            // aren't referenced by self anymore. The old buffer was allocated with this layout.
            unsafe {
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                    old_ptr.add(kept).as_ptr(),
                    old_len - kept,
                ));
                self.alloc.deallocate(old_ptr.cast(), Self::layout_unchecked(old_cap));
            }
        }

        Ok(())
    }

    /// Like [`try_set_capacity`](Stack::try_set_capacity), but panics on failure.
    ///
    /// # Panics
    /// Panics if the capacity overflows or the allocator fails.
    pub fn set_capacity(&mut self, new_cap: usize) {
        self.try_set_capacity(new_cap).throw()
    }

    /// Shrinks the Stack so that its capacity is equal to its length.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the allocator fails to provide the smaller buffer.
    pub fn try_shrink_to_fit(&mut self) -> Result<(), ReserveError> {
        self.try_set_capacity(self.len)
    }

    /// Like [`try_shrink_to_fit`](Stack::try_shrink_to_fit), but panics on failure.
    ///
    /// # Panics
    /// Panics if the allocator fails.
    pub fn shrink_to_fit(&mut self) {
        self.try_shrink_to_fit().throw()
    }

    /// Shortens the Stack to `len` elements, dropping the rest. Does nothing if the Stack is
    /// already shorter. The capacity is unchanged.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }

        let tail = ptr::slice_from_raw_parts_mut(
            // SAFETY: len < self.len, so the offset is within the buffer.
            unsafe { self.ptr.add(len).as_ptr() },
            self.len - len,
        );
        // Shorten first, so a panicking drop can't cause a double drop.
        self.len = len;
        // SAFETY: The tail values are initialized and no longer part of the Stack.
        unsafe { ptr::drop_in_place(tail) }
    }

    /// Drops every element of the Stack, keeping its capacity.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Resizes the Stack to `new_len`, filling new slots with clones of `fill` or dropping the
    /// truncated elements.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the Stack needed to grow and couldn't.
    pub fn try_resize(&mut self, new_len: usize, fill: T) -> Result<(), ReserveError>
    where
        T: Clone,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return Ok(());
        }

        self.try_reserve(new_len)?;
        while self.len + 1 < new_len {
            // SAFETY: The capacity has been reserved for new_len elements.
            unsafe { self.push_unchecked(fill.clone()) }
        }
        // SAFETY: As above, the final slot receives fill itself.
        unsafe { self.push_unchecked(fill) }
        Ok(())
    }

    /// Like [`try_resize`](Stack::try_resize), but panics on failure.
    ///
    /// # Panics
    /// Panics if the Stack needed to grow and couldn't.
    pub fn resize(&mut self, new_len: usize, fill: T)
    where
        T: Clone,
    {
        self.try_resize(new_len, fill).throw()
    }

    /// Resizes the Stack to `new_len`, filling new slots with values produced by `f`.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the Stack needed to grow and couldn't.
    pub fn try_resize_with<F: FnMut() -> T>(
        &mut self,
        new_len: usize,
        mut f: F,
    ) -> Result<(), ReserveError> {
        if new_len <= self.len {
            self.truncate(new_len);
            return Ok(());
        }

        self.try_reserve(new_len)?;
        while self.len < new_len {
            // SAFETY: The capacity has been reserved for new_len elements.
            unsafe { self.push_unchecked(f()) }
        }
        Ok(())
    }

    /// Resizes the Stack to `new_len` without initializing any new elements.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the Stack needed to grow and couldn't.
    ///
    /// # Safety
    /// Every element from the old length up to `new_len` must be written before it is read, for
    /// example through [`as_mut_ptr`](Stack::as_mut_ptr).
    pub unsafe fn resize_for_overwrite(&mut self, new_len: usize) -> Result<(), ReserveError>
    where
        T: Copy,
    {
        self.try_reserve(new_len)?;
        self.len = new_len;
        Ok(())
    }

    /// Returns the unused capacity of the Stack as a slice of uninitialized values.
    pub fn spare_capacity_mut(&mut self) -> &mut [MaybeUninit<T>] {
        // SAFETY: The range from len to cap is within the allocated buffer and MaybeUninit has no
        // validity requirements.
        unsafe {
            slice::from_raw_parts_mut(
                self.ptr.add(self.len).as_ptr().cast(),
                self.cap - self.len,
            )
        }
    }

    /// Sets the length of the Stack without dropping or initializing anything.
    ///
    /// # Safety
    /// `new_len` must not exceed the capacity and all elements below `new_len` must be
    /// initialized.
    pub unsafe fn set_len(&mut self, new_len: usize) {
        debug_assert!(new_len <= self.cap);
        self.len = new_len;
    }

    /// Appends clones of every element in `items`.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the Stack needed to grow and couldn't.
    pub fn try_extend_from_slice(&mut self, items: &[T]) -> Result<(), ReserveError>
    where
        T: Clone,
    {
        self.try_reserve_extra(items.len())?;
        for item in items {
            // SAFETY: Capacity has been reserved for every item.
            unsafe { self.push_unchecked(item.clone()) }
        }
        Ok(())
    }

    /// Inserts clones of every element in `items` at `index`, moving the following elements back.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the Stack needed to grow and couldn't.
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn try_insert_slice(&mut self, index: usize, items: &[T]) -> Result<(), ReserveError>
    where
        T: Clone,
    {
        self.check_insert_index(index);
        self.try_reserve_extra(items.len())?;

        let old_len = self.len;
        // SAFETY: Enough capacity is reserved to shift the tail back by items.len(). While the
        // gap is filled, len only covers the untouched front, so a panicking clone leaks the tail
        // rather than exposing uninitialized values.
        unsafe {
            let slot = self.ptr.add(index);
            ptr::copy(slot.as_ptr(), slot.add(items.len()).as_ptr(), old_len - index);
            self.len = index;
            for (offset, item) in items.iter().enumerate() {
                slot.add(offset).write(item.clone());
            }
        }
        self.len = old_len + items.len();
        Ok(())
    }

    /// Removes every element in `range`, moving the following elements forward.
    ///
    /// # Panics
    /// Panics if the range is decreasing or extends past the end of the Stack.
    pub fn remove_range(&mut self, range: Range<usize>) {
        let Range { start, end } = range;
        assert!(start <= end, "Range start {start} is greater than its end {end}!");
        if end > self.len {
            Err(IndexOutOfBounds { index: end, len: self.len }).throw()
        }

        let old_len = self.len;
        self.len = start;
        // SAFETY: start..end is initialized and dropped exactly once, then the tail is moved over
        // it. A panicking drop leaks the tail instead.
        unsafe {
            let gap = self.ptr.add(start);
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(gap.as_ptr(), end - start));
            ptr::copy(gap.add(end - start).as_ptr(), gap.as_ptr(), old_len - end);
        }
        self.len = old_len - (end - start);
    }

    /// Moves all elements of `other` onto the end of the Stack.
    ///
    /// If this Stack doesn't own a buffer yet and both allocators are equal, `other`'s buffer is
    /// taken over as is.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the Stack needed to grow and couldn't. `other` is untouched
    /// and handed back in that case.
    pub fn try_append(&mut self, mut other: Stack<T, A>) -> Result<(), (ReserveError, Stack<T, A>)> {
        if self.data().is_none() && !Self::IS_ZST && self.alloc == other.alloc {
            self.ptr = other.ptr;
            self.len = other.len;
            self.cap = other.cap;
            other.ptr = NonNull::dangling();
            other.len = 0;
            other.cap = 0;
            return Ok(());
        }

        if let Err(err) = self.try_reserve_extra(other.len) {
            return Err((err, other));
        }

        // SAFETY: Capacity is reserved for other.len more values and the buffers are distinct.
        // other forgets its values, so they are moved rather than copied.
        unsafe {
            ptr::copy_nonoverlapping(
                other.ptr.as_ptr(),
                self.ptr.add(self.len).as_ptr(),
                other.len,
            );
        }
        self.len += other.len;
        other.len = 0;
        Ok(())
    }

    /// Like [`try_append`](Stack::try_append), but panics on failure.
    ///
    /// # Panics
    /// Panics if the Stack needed to grow and couldn't.
    pub fn append(&mut self, other: Stack<T, A>) {
        self.try_append(other).map_err(|(err, _)| err).throw()
    }

    /// Creates a new Stack on a clone of the same allocator, containing clones of every element.
    /// The new buffer has exactly enough capacity and never aliases this one.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the allocation fails.
    pub fn try_clone(&self) -> Result<Stack<T, A>, ReserveError>
    where
        T: Clone,
        A: Clone,
    {
        let mut stack = Stack::with_growth_in(self.growth, self.alloc.clone());
        stack.try_set_capacity(self.len)?;
        stack.try_extend_from_slice(self)?;
        Ok(stack)
    }

    /// Decomposes the Stack into its buffer, length, capacity and allocator.
    pub fn into_parts(self) -> (NonNull<T>, usize, usize, A) {
        let stack = ManuallyDrop::new(self);
        // SAFETY: stack is never used or dropped again, so the allocator is moved out exactly once.
        let alloc = unsafe { ptr::read(&stack.alloc) };
        (stack.ptr, stack.len, stack.cap, alloc)
    }

    /// Checks that the provided index is within the bounds of self.
    ///
    /// # Panics
    /// Panics if the provided index is out of bounds.
    pub(crate) fn check_index(&self, index: usize) {
        if index >= self.len {
            Err(IndexOutOfBounds {
                index,
                len: self.len,
            }).throw()
        }
    }

    /// Checks that the provided index is a valid insertion point, which includes `len`.
    ///
    /// # Panics
    /// Panics if the provided index is out of bounds.
    pub(crate) fn check_insert_index(&self, index: usize) {
        if index > self.len {
            Err(IndexOutOfBounds {
                index,
                len: self.len,
            }).throw()
        }
    }

    /// The layout of the currently owned buffer.
    const fn current_layout(&self) -> Layout {
        Self::layout_unchecked(self.cap)
    }

    /// Creates the layout of a buffer for `cap` elements, which has already been checked.
    const fn layout_unchecked(cap: usize) -> Layout {
        // SAFETY: Every capacity passed here has previously been validated by Layout::array.
        unsafe { Layout::from_size_align_unchecked(size_of::<T>() * cap, align_of::<T>()) }
    }

    fn overlaps(a: NonNull<T>, a_cap: usize, b: NonNull<T>, b_cap: usize) -> bool {
        let a = a.as_ptr() as usize;
        let b = b.as_ptr() as usize;
        a < b + b_cap * size_of::<T>() && b < a + a_cap * size_of::<T>()
    }

    /// Returns the buffer to the allocator, leaving the Stack without one.
    ///
    /// # Safety
    /// The Stack must own a buffer and contain no initialized values.
    unsafe fn release_buffer(&mut self) {
        debug_assert!(self.len == 0);
        if self.cap > 0 && !Self::IS_ZST {
            // SAFETY: The buffer is owned and was allocated with the current layout.
            unsafe { self.alloc.deallocate(self.ptr.cast(), self.current_layout()) }
        }
        self.ptr = NonNull::dangling();
        self.cap = 0;
    }
}

impl<T, A: Allocator> Extend<T> for Stack<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve_for_hint(iter.size_hint().0);
        for item in iter {
            self.push(item);
        }
    }
}

impl<'a, T: Copy + 'a, A: Allocator> Extend<&'a T> for Stack<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied())
    }
}

impl<T, A: Allocator> Stack<T, A> {
    fn reserve_for_hint(&mut self, hint: usize) {
        if let Some(target) = self.len.checked_add(hint) {
            self.reserve(target);
        }
    }
}

impl<T, A: Allocator + Default> FromIterator<T> for Stack<T, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut stack = Stack::new_in(A::default());
        stack.extend(iter);
        stack
    }
}

impl<T, A: Allocator + Default> Default for Stack<T, A> {
    fn default() -> Self {
        Stack::new_in(A::default())
    }
}

impl<T, A: Allocator> Drop for Stack<T, A> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: The Stack has just been cleared, release_buffer checks for an owned buffer.
        unsafe { self.release_buffer() }
    }
}

impl<T, A: Allocator> IntoIterator for Stack<T, A> {
    type Item = T;

    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        let (ptr, len, cap, alloc) = self.into_parts();
        IntoIter {
            ptr,
            start: 0,
            end: len,
            cap,
            alloc,
        }
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a Stack<T, A> {
    type Item = &'a T;

    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut Stack<T, A> {
    type Item = &'a mut T;

    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, A: Allocator> Deref for Stack<T, A> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        // SAFETY: The Stack is valid as a slice for len values, which are all initialized. The
        // pointer is nonnull and properly aligned, even when dangling.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T, A: Allocator> DerefMut for Stack<T, A> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: As for deref, with uniqueness guaranteed by the &mut self receiver.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T, A: Allocator> AsRef<[T]> for Stack<T, A> {
    fn as_ref(&self) -> &[T] {
        self
    }
}

impl<T, A: Allocator> AsMut<[T]> for Stack<T, A> {
    fn as_mut(&mut self) -> &mut [T] {
        self
    }
}

impl<T, A: Allocator> Borrow<[T]> for Stack<T, A> {
    fn borrow(&self) -> &[T] {
        self
    }
}

impl<T, A: Allocator> BorrowMut<[T]> for Stack<T, A> {
    fn borrow_mut(&mut self) -> &mut [T] {
        self
    }
}

// SAFETY: A Stack uniquely owns its buffer, so it can be sent whenever its values and allocator
// can.
unsafe impl<T: Send, A: Allocator + Send> Send for Stack<T, A> {}
// SAFETY: The Stack's safe API obeys all rules of the borrow checker, so no interior mutability
// occurs through a shared reference, apart from what the allocator itself allows.
unsafe impl<T: Sync, A: Allocator + Sync> Sync for Stack<T, A> {}

impl<T: Clone, A: Allocator + Clone> Clone for Stack<T, A> {
    fn clone(&self) -> Self {
        self.try_clone().throw()
    }
}

impl<T: PartialEq, A: Allocator, B: Allocator> PartialEq<Stack<T, B>> for Stack<T, A> {
    fn eq(&self, other: &Stack<T, B>) -> bool {
        **self == **other
    }
}

impl<T: PartialEq, A: Allocator> PartialEq<[T]> for Stack<T, A> {
    fn eq(&self, other: &[T]) -> bool {
        **self == *other
    }
}

impl<T: PartialEq, A: Allocator, const N: usize> PartialEq<[T; N]> for Stack<T, A> {
    fn eq(&self, other: &[T; N]) -> bool {
        **self == *other
    }
}

impl<T: Eq, A: Allocator> Eq for Stack<T, A> {}

impl<T: Hash, A: Allocator> Hash for Stack<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (**self).hash(state);
    }
}

impl<T: Debug, A: Allocator> Debug for Stack<T, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("contents", &&**self)
            .field("len", &self.len)
            .field("cap", &self.cap)
            .finish()
    }
}

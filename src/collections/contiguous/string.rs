use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::str;

use super::Stack;
use crate::alloc::{Allocator, Global};
use crate::collections::error::{CapacityOverflow, IndexOutOfBounds, ReserveError};
use crate::util::option::OptionExtension;
use crate::util::result::ResultExtension;

/// A growable UTF-8 string stored in a [`Stack<u8>`](Stack), which always keeps a `0` byte after
/// its contents.
///
/// Whenever a buffer is owned, it has room for one more byte than [`capacity`] reports, and that
/// byte (at index `len`) is zero. This makes [`as_bytes_with_nul`](StackString::as_bytes_with_nul)
/// free, for handing the string to APIs that expect null termination.
///
/// [`capacity`]: StackString::capacity
///
/// # Examples
/// ```
/// # use foundation_lib::collections::contiguous::StackString;
/// let mut string = StackString::new();
/// string.try_push_str("hello").unwrap();
/// string.try_push('!').unwrap();
/// assert_eq!(string.as_str(), "hello!");
/// assert_eq!(string.as_bytes_with_nul(), b"hello!\0");
/// ```
pub struct StackString<A: Allocator = Global> {
    pub(crate) buf: Stack<u8, A>,
}

impl StackString<Global> {
    /// Creates a new, empty StackString on the [`Global`] allocator.
    pub const fn new() -> StackString<Global> {
        StackString::new_in(Global)
    }
}

impl<A: Allocator> StackString<A> {
    /// Creates a new, empty StackString which allocates from `alloc`.
    pub const fn new_in(alloc: A) -> StackString<A> {
        StackString {
            buf: Stack::new_in(alloc),
        }
    }

    /// Creates a StackString containing a copy of `value`.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the allocation fails.
    pub fn try_from_str_in(value: &str, alloc: A) -> Result<StackString<A>, ReserveError> {
        let mut string = StackString::new_in(alloc);
        string.try_push_str(value)?;
        Ok(string)
    }

    /// Returns the length of the string in bytes, excluding the terminator.
    pub const fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if the string contains no bytes.
    pub const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the number of bytes the string can hold without reallocating, excluding the slot
    /// reserved for the terminator.
    pub const fn capacity(&self) -> usize {
        self.buf.cap().saturating_sub(1)
    }

    /// Returns a reference to the allocator used by this string.
    pub const fn allocator(&self) -> &A {
        self.buf.allocator()
    }

    pub fn as_str(&self) -> &str {
        // SAFETY: Only whole UTF-8 sequences are ever written to or removed from the buffer.
        unsafe { str::from_utf8_unchecked(&self.buf) }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the contents of the string followed by its `0` terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        if self.buf.data().is_none() {
            return b"\0";
        }
        // SAFETY: An owned buffer always has an initialized terminator at index len.
        unsafe { std::slice::from_raw_parts(self.buf.as_ptr(), self.buf.len() + 1) }
    }

    /// Ensures that the string can hold at least `target` bytes, plus its terminator.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the capacity overflows or the allocator fails.
    pub fn try_reserve(&mut self, target: usize) -> Result<(), ReserveError> {
        self.buf.try_reserve(target.checked_add(1).ok_or(CapacityOverflow)?)?;
        // A fresh buffer only carries over the contents, not the old terminator.
        self.terminate();
        Ok(())
    }

    /// Appends a single character.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the string needed to grow and couldn't.
    pub fn try_push(&mut self, value: char) -> Result<(), ReserveError> {
        self.try_push_str(value.encode_utf8(&mut [0; 4]))
    }

    /// Like [`try_push`](StackString::try_push), but panics on failure.
    ///
    /// # Panics
    /// Panics if the string needed to grow and couldn't.
    pub fn push(&mut self, value: char) {
        self.try_push(value).throw()
    }

    /// Appends a string slice.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the string needed to grow and couldn't.
    pub fn try_push_str(&mut self, value: &str) -> Result<(), ReserveError> {
        self.try_reserve(self.len().checked_add(value.len()).ok_or(CapacityOverflow)?)?;
        self.buf.try_extend_from_slice(value.as_bytes())?;
        self.terminate();
        Ok(())
    }

    /// Like [`try_push_str`](StackString::try_push_str), but panics on failure.
    ///
    /// # Panics
    /// Panics if the string needed to grow and couldn't.
    pub fn push_str(&mut self, value: &str) {
        self.try_push_str(value).throw()
    }

    /// Removes the last character and returns it, if there is one.
    pub fn pop(&mut self) -> Option<char> {
        let value = self.as_str().chars().next_back()?;
        self.buf.truncate(self.len() - value.len_utf8());
        self.terminate();
        Some(value)
    }

    /// Inserts a character at the byte index `index`.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the string needed to grow and couldn't.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds or not on a character boundary.
    pub fn try_insert(&mut self, index: usize, value: char) -> Result<(), ReserveError> {
        self.try_insert_str(index, value.encode_utf8(&mut [0; 4]))
    }

    /// Inserts a string slice at the byte index `index`.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the string needed to grow and couldn't.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds or not on a character boundary.
    pub fn try_insert_str(&mut self, index: usize, value: &str) -> Result<(), ReserveError> {
        self.check_boundary(index);
        self.try_reserve(self.len().checked_add(value.len()).ok_or(CapacityOverflow)?)?;
        self.buf.try_insert_slice(index, value.as_bytes())?;
        self.terminate();
        Ok(())
    }

    /// Removes the character starting at the byte index `index` and returns it.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds or not on a character boundary.
    pub fn remove(&mut self, index: usize) -> char {
        if index >= self.len() {
            Err(IndexOutOfBounds { index, len: self.len() }).throw()
        }
        self.check_boundary(index);
        // SAFETY: index is a character boundary before the end of the string.
        let value = unsafe { self.as_str()[index..].chars().next().unreachable() };
        self.buf.remove_range(index..index + value.len_utf8());
        self.terminate();
        value
    }

    /// Shortens the string to `len` bytes.
    ///
    /// # Panics
    /// Panics if `len` isn't on a character boundary.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len() {
            return;
        }
        self.check_boundary(len);
        self.buf.truncate(len);
        self.terminate();
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Resizes the string to `new_len` bytes, padding with `fill`.
    ///
    /// # Errors
    /// Returns a [`ReserveError`] if the string needed to grow and couldn't.
    ///
    /// # Panics
    /// Panics if `fill` isn't ASCII, or if shrinking would split a character.
    pub fn try_resize(&mut self, new_len: usize, fill: u8) -> Result<(), ReserveError> {
        assert!(fill.is_ascii(), "Fill byte {fill:#x} isn't ASCII!");
        if new_len <= self.len() {
            self.truncate(new_len);
            return Ok(());
        }
        self.try_reserve(new_len)?;
        self.buf.try_resize(new_len, fill)?;
        self.terminate();
        Ok(())
    }

    /// Writes the terminator after the contents, if a buffer is owned.
    fn terminate(&mut self) {
        if self.buf.data().is_some() {
            debug_assert!(self.buf.cap() > self.buf.len());
            // SAFETY: Every method which grows the string reserves one extra slot, so index len
            // is within the buffer.
            unsafe { self.buf.as_mut_ptr().add(self.buf.len()).write(0) }
        }
    }

    /// # Panics
    /// Panics if `index` is out of bounds or not on a character boundary.
    fn check_boundary(&self, index: usize) {
        if index > self.len() {
            Err(IndexOutOfBounds { index, len: self.len() }).throw()
        }
        assert!(
            self.as_str().is_char_boundary(index),
            "Byte index {index} is not a character boundary!"
        );
    }
}

impl<A: Allocator + Default> Default for StackString<A> {
    fn default() -> Self {
        StackString::new_in(A::default())
    }
}

impl<A: Allocator + Clone> Clone for StackString<A> {
    fn clone(&self) -> Self {
        StackString::try_from_str_in(self, self.allocator().clone()).throw()
    }
}

impl<A: Allocator + Default> From<&str> for StackString<A> {
    fn from(value: &str) -> Self {
        StackString::try_from_str_in(value, A::default()).throw()
    }
}

impl<A: Allocator> Deref for StackString<A> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl<A: Allocator> AsRef<str> for StackString<A> {
    fn as_ref(&self) -> &str {
        self
    }
}

impl<A: Allocator> AsRef<[u8]> for StackString<A> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<A: Allocator> fmt::Write for StackString<A> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.try_push_str(s).map_err(|_| fmt::Error)
    }
}

impl<A: Allocator, B: Allocator> PartialEq<StackString<B>> for StackString<A> {
    fn eq(&self, other: &StackString<B>) -> bool {
        self.as_str() == other.as_str()
    }
}

impl<A: Allocator> PartialEq<str> for StackString<A> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<A: Allocator> PartialEq<&str> for StackString<A> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl<A: Allocator> Eq for StackString<A> {}

impl<A: Allocator> Hash for StackString<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl<A: Allocator> Debug for StackString<A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self.as_str(), f)
    }
}

impl<A: Allocator> Display for StackString<A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self.as_str(), f)
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write;
    use std::mem::MaybeUninit;

    use super::*;
    use crate::alloc::Arena;
    use crate::util::panic::assert_panics;

    #[test]
    fn test_terminator_is_maintained() {
        let mut string = StackString::new();
        assert_eq!(string.as_bytes_with_nul(), b"\0", "An empty string is still terminated.");

        string.push_str("abc");
        assert_eq!(string.as_bytes_with_nul(), b"abc\0");
        assert!(string.buf.cap() > string.len(), "A slot should be reserved for the terminator.");

        string.try_insert(1, 'é').unwrap();
        assert_eq!(string.as_bytes_with_nul(), "aébc\0".as_bytes());

        assert_eq!(string.remove(1), 'é');
        assert_eq!(string.pop(), Some('c'));
        assert_eq!(string.as_bytes_with_nul(), b"ab\0");

        string.try_resize(5, b'-').unwrap();
        assert_eq!(string.as_bytes_with_nul(), b"ab---\0");

        string.truncate(1);
        assert_eq!(string.as_bytes_with_nul(), b"a\0");

        string.clear();
        assert_eq!(string.as_bytes_with_nul(), b"\0");
        assert!(string.buf.data().is_some(), "Clearing keeps the buffer.");
    }

    #[test]
    fn test_capacity_excludes_terminator() {
        let mut string = StackString::new();
        string.try_reserve(7).unwrap();
        assert_eq!(string.buf.cap(), 8);
        assert_eq!(string.capacity(), 7);

        string.push_str("1234567");
        assert_eq!(string.buf.cap(), 8, "Filling the usable capacity shouldn't reallocate.");

        string.push('8');
        assert!(string.capacity() >= 8);
        assert_eq!(string, "12345678");
    }

    #[test]
    fn test_boundaries() {
        assert_panics!({
            let mut string: StackString = StackString::from("héllo");
            string.remove(2);
        });
        assert_panics!({
            let mut string: StackString = StackString::from("héllo");
            string.try_insert(10, 'x').unwrap();
        });

        let mut string: StackString = StackString::from("héllo");
        write!(string, " {}", 42).unwrap();
        assert_eq!(string, "héllo 42");
        assert_eq!(string.as_bytes_with_nul().last(), Some(&0));
    }

    #[test]
    fn test_failure_keeps_contents() {
        let mut buf = [MaybeUninit::uninit(); 16];
        let arena = Arena::new(&mut buf);
        let mut string = StackString::try_from_str_in("abc", &arena).unwrap();

        assert!(string.try_push_str("a much longer string than fits").is_err());
        assert_eq!(string.as_bytes_with_nul(), b"abc\0");
    }
}

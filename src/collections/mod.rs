//! Allocator aware collection types.
//!
//! # Method
//! Every collection here gets its memory from an [`Allocator`](crate::alloc::Allocator) chosen by
//! the caller. Contiguous types implement [`Deref<Target = [T]>`](std::ops::Deref) (and
//! DerefMut), so slice methods such as sorting and searching are available on them directly.

pub mod contiguous;
pub mod error;
pub mod linked;

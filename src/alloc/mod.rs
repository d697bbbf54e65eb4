//! Allocation primitives shared by every container in the crate.
//!
//! An [`Allocator`] hands out raw, aligned byte ranges and reports failure as an [`AllocError`]
//! value. Containers are generic over their allocator and never reach for one implicitly.
//!
//! Two allocators are provided:
//! - [`Global`], a stateless wrapper around the process heap.
//! - [`Arena`], a bump allocator over a caller supplied buffer, which is mostly useful for keeping
//!   short lived containers off the heap and for exercising allocation failure.

mod allocator;
mod arena;
mod error;
mod global;

pub use allocator::*;
pub use arena::*;
pub use error::*;
pub use global::*;

//! Linked collection types. This module holds two very different takes on linking:
//! - [`index_list`], primitives for threading doubly linked chains through nodes that live in a
//!   caller owned array, using indices rather than pointers.
//! - [`BlockList`], a list of individually allocated blocks, each holding a contiguous run of
//!   values.

pub mod block_list;
pub mod index_list;

#[doc(inline)]
pub use block_list::BlockList;
#[doc(inline)]
pub use index_list::{IndexChain, IndexNode, Links, OptIndex};

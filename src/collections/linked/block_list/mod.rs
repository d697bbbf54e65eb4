//! A module containing [`BlockList`] and associated types.
//!
//! A BlockList can be walked a block at a time with [`Blocks`] and [`BlocksMut`], or an item at a
//! time with [`Iter`], [`IterMut`] and [`IntoIter`]. A [`BlockHandle`] names a single block so
//! that it can be popped from the middle of a list.
//!
//! [`BlockList`] is also re-exported under the parent module.

mod block;
mod block_list;
mod iter;
mod tests;

pub use block::BlockHandle;
pub use block_list::*;
pub use iter::*;

//! Primitives for doubly linked chains threaded through a caller owned array.
//!
//! Nodes never move and are never allocated here. Each node embeds a set of [`Links`], naming its
//! neighbours by their index into the same array, with [`OptIndex::NULL`] standing in for "no
//! neighbour". An [`IndexChain`] records the first and last index of one chain, and the free
//! functions in this module rewrite links to insert or extract single nodes and whole runs.
//!
//! The functions trust their arguments. Index bounds are checked by slice indexing, which panics,
//! and adjacency preconditions are checked with debug assertions. Checks which need to walk a
//! whole chain are only performed when the `pedantic` feature is enabled. A chain corrupted by
//! misuse isn't undefined behaviour, but iterating it may never terminate.
//!
//! # Time Complexity
//! | Function | Complexity |
//! |-|-|
//! | `link_chain/unlink_chain` | `O(1)` |
//! | `insert_node/extract_node` | `O(1)` |
//! | `insert_chain/extract_chain` | `O(1)` |
//! | `is_isolated` | `O(1)` |
//! | `is_connected` | `O(n)` |

mod chain;
mod index;
mod tests;

pub use chain::*;
pub use index::*;

//! A small foundations library built around explicit, pluggable allocators.
//!
//! # Purpose
//! Every container in this crate gets its memory from an [`Allocator`](alloc::Allocator) that is
//! handed to it explicitly. There is no hidden global default: [`Global`](alloc::Global) is just
//! another (stateless) allocator, and containers that use it say so in their type.
//!
//! # Contents
//! - [`alloc`]: the [`Allocator`](alloc::Allocator) trait, the [`Global`](alloc::Global)
//!   allocator and a fixed-buffer [`Arena`](alloc::Arena).
//! - [`collections::contiguous`]: [`Stack`](collections::contiguous::Stack), a growable array,
//!   and [`StackString`](collections::contiguous::StackString), its null terminated text
//!   counterpart.
//! - [`collections::linked`]: intrusive index list primitives and
//!   [`BlockList`](collections::linked::BlockList), a linked list of contiguous blocks.
//! - [`fs`]: reading whole files into a [`Stack`](collections::contiguous::Stack).
//!
//! # Error Handling
//! Running out of memory is the only failure that callers are expected to recover from. Every
//! operation that can allocate has a `try_` form returning a [`Result`] with a strongly typed
//! error, and a panicking shorthand for when handling the error isn't worth it. Either way, a
//! failed operation leaves its container exactly as it was.
//!
//! Misuse, like indexing out of bounds or breaking the adjacency rules of the linking
//! primitives, is a bug in the caller rather than a runtime condition. Cheap checks for it panic,
//! expensive ones are only compiled in with the `pedantic` feature.
//!
//! # Dependencies
//! Errors derive their boilerplate with `derive_more`, allocation and file events are reported
//! through `tracing` and the [`fs`] module relies on `libc` for its syscalls.

#![warn(clippy::missing_safety_doc)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(clippy::missing_const_for_fn)]
#![warn(clippy::missing_panics_doc)]
#![warn(clippy::unwrap_used)]
#![allow(clippy::module_inception)]

pub mod alloc;
pub mod collections;
#[cfg(feature = "fs")]
pub mod fs;

pub(crate) mod util;

//! Reading files straight into allocator aware containers, using raw Linux system calls.

#![cfg(target_os = "linux")]

mod error;
mod fd;
mod read;

pub use error::*;
pub(crate) use fd::*;
pub use read::*;

use std::alloc::Layout;

use derive_more::{Display, Error};

/// The error returned when an [`Allocator`](super::Allocator) can't satisfy a request.
///
/// This is the only failure that containers treat as recoverable. It is passed up unchanged, so
/// the size and alignment always describe the request which originally failed.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("allocator failed to provide {size} bytes aligned to {align}")]
pub struct AllocError {
    pub size: usize,
    pub align: usize,
}

impl AllocError {
    pub const fn for_layout(layout: Layout) -> AllocError {
        AllocError {
            size: layout.size(),
            align: layout.align(),
        }
    }
}

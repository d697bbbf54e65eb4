use derive_more::{Display, Error, From, IsVariant};

#[doc(inline)]
pub use crate::alloc::AllocError;
#[doc(inline)]
pub use crate::util::error::{CapacityOverflow, IndexOutOfBounds};

/// The error returned when a container fails to acquire more memory.
///
/// Whenever this is returned, the container is left exactly as it was before the call.
#[derive(Debug, Display, Error, From, IsVariant, Clone, Copy, PartialEq, Eq)]
pub enum ReserveError {
    /// The requested capacity can't be represented as a valid memory layout.
    CapacityOverflow(CapacityOverflow),
    /// The allocator couldn't satisfy the request. The original error is passed through.
    AllocatorFailure(AllocError),
}

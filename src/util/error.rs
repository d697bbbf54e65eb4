use derive_more::{Display, Error};

/// An index was at or past the end of a collection.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("Index {index} out of bounds for collection with {len} elements!")]
pub struct IndexOutOfBounds {
    /// The offending index.
    pub index: usize,
    /// The collection's length at the time.
    pub len: usize,
}

/// A requested capacity would make a layout larger than [`isize::MAX`] bytes.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("Capacity overflow!")]
pub struct CapacityOverflow;

use derive_more::{Display, Error, From, IsVariant};
use libc::c_int;

use crate::collections::error::ReserveError;

/// The error returned by [`read_whole_file`](super::read_whole_file).
#[derive(Debug, Display, Error, From, IsVariant, Clone, Copy, PartialEq, Eq)]
pub enum ReadFileError {
    /// The buffer for the file's contents couldn't be allocated.
    #[display("out of memory while reading file: {_0}")]
    #[from]
    OutOfMemory(ReserveError),
    /// The path doesn't name an existing file.
    #[display("file not found")]
    NotFound,
    /// The file couldn't be opened or read. Holds the `errno` reported by the OS.
    #[display("error while reading file (os error {_0})")]
    ReadingError(#[error(not(source))] c_int),
}

impl ReadFileError {
    /// Maps an `errno` reported while opening a file.
    pub(crate) const fn from_open(err_no: c_int) -> ReadFileError {
        match err_no {
            libc::ENOENT | libc::ENOTDIR => ReadFileError::NotFound,
            other => ReadFileError::ReadingError(other),
        }
    }
}

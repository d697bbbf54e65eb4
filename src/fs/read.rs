use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use tracing::debug;

use super::{Fd, ReadFileError};
use crate::alloc::Allocator;
use crate::collections::contiguous::Stack;

/// The amount of extra capacity requested whenever a file turns out to be larger than `fstat`
/// claimed.
const READ_CHUNK: usize = 4096;

/// Reads the entire contents of the file at `path` into a new [`Stack`] on the provided allocator.
///
/// The buffer is sized from the file's reported size up front, leaving room for the final read
/// that detects the end of the file. Files which grow while being read, or which report a size of
/// 0 such as those under `/proc`, are read in further chunks until the end.
///
/// # Errors
/// - [`ReadFileError::NotFound`] if `path` doesn't name a file.
/// - [`ReadFileError::OutOfMemory`] if the buffer can't be allocated.
/// - [`ReadFileError::ReadingError`] for every other failure while opening or reading the file,
///   including a path containing a nul byte.
pub fn read_whole_file<P: AsRef<Path>, A: Allocator>(
    path: P,
    alloc: A,
) -> Result<Stack<u8, A>, ReadFileError> {
    let path = path.as_ref();
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| ReadFileError::ReadingError(libc::EINVAL))?;

    let fd = Fd::open(&c_path, libc::O_RDONLY).map_err(ReadFileError::from_open)?;
    let size = fd.size().map_err(ReadFileError::ReadingError)?;
    debug!(?path, size, "reading whole file");

    let mut buf = Stack::new_in(alloc);
    let initial = usize::try_from(size).unwrap_or(usize::MAX).saturating_add(1);
    buf.try_set_capacity(initial)?;

    loop {
        if buf.len() == buf.cap() {
            buf.try_reserve_extra(READ_CHUNK)?;
        }
        let count = fd
            .read(buf.spare_capacity_mut())
            .map_err(ReadFileError::ReadingError)?;
        if count == 0 {
            break;
        }
        // SAFETY: read initialized the first count bytes of the spare capacity.
        unsafe { buf.set_len(buf.len() + count) }
    }

    if buf.len() as u64 != size {
        debug!(?path, size, read = buf.len(), "file size changed while reading");
    }
    Ok(buf)
}

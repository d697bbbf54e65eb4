use std::ffi::CStr;
use std::io;
use std::mem::MaybeUninit;

use libc::{EINTR, c_int, stat as Stat};

use crate::util::option::OptionExtension;

pub(crate) fn err_no() -> c_int {
    // SAFETY: raw_os_error is always Some when constructed from last_os_error.
    unsafe { io::Error::last_os_error().raw_os_error().unreachable() }
}

/// An owned file descriptor, closed on drop.
#[derive(Debug)]
pub(crate) struct Fd(pub c_int);

impl Fd {
    pub fn open(path: &CStr, flags: c_int) -> Result<Fd, c_int> {
        // SAFETY: The path is a valid, nul terminated string.
        match unsafe { libc::open(path.as_ptr(), flags | libc::O_CLOEXEC) } {
            -1 => Err(err_no()),
            fd => Ok(Fd(fd)),
        }
    }

    /// Returns the size of the file in bytes, as reported by `fstat`.
    pub fn size(&self) -> Result<u64, c_int> {
        let mut raw_meta: MaybeUninit<Stat> = MaybeUninit::uninit();
        // SAFETY: fstat only writes to the provided buffer, which is large enough for a stat.
        if unsafe { libc::fstat(self.0, raw_meta.as_mut_ptr()) } == -1 {
            return Err(err_no());
        }
        // SAFETY: fstat succeeded, so the buffer has been initialized.
        let raw_meta = unsafe { raw_meta.assume_init() };
        Ok(raw_meta.st_size.max(0) as u64)
    }

    /// Reads as many bytes as possible into `buf`, retrying if interrupted by a signal. Returns
    /// the number of bytes read, which is 0 at the end of the file.
    pub fn read(&self, buf: &mut [MaybeUninit<u8>]) -> Result<usize, c_int> {
        loop {
            // SAFETY: read writes at most buf.len() bytes into the buffer.
            match unsafe { libc::read(self.0, buf.as_mut_ptr().cast(), buf.len()) } {
                -1 => match err_no() {
                    EINTR => continue,
                    err => return Err(err),
                },
                count => return Ok(count as usize),
            }
        }
    }
}

impl Drop for Fd {
    fn drop(&mut self) {
        // The descriptor is released even when close reports an error, so there's nothing left to
        // do with one.
        // SAFETY: The descriptor is owned by this Fd and not used again.
        let _ = unsafe { libc::close(self.0) };
    }
}

//! Advisory file locks for the shared status file
//!
//! `flock` on unix, no locking elsewhere. Interrupted calls are retried.

use std::fs::File;
use std::io;

/// Lock held on a file until dropped
#[derive(Debug)]
pub struct FileLock<'a> {
    file: &'a File,
}

impl Drop for FileLock<'_> {
    fn drop(&mut self) {
        if let Err(err) = unlock_file(self.file) {
            tracing::warn!(error = %err, "Failed to unlock status cache file");
        }
    }
}

/// Take a shared (`exclusive == false`) or exclusive lock, blocking
pub fn lock_file(file: &File, exclusive: bool) -> io::Result<FileLock<'_>> {
    sys::flock(file, if exclusive { sys::EXCLUSIVE } else { sys::SHARED })?;
    Ok(FileLock { file })
}

fn unlock_file(file: &File) -> io::Result<()> {
    sys::flock(file, sys::UNLOCK)
}

#[cfg(unix)]
mod sys {
    use std::fs::File;
    use std::io;
    use std::os::unix::io::AsRawFd;

    pub const SHARED: libc::c_int = libc::LOCK_SH;
    pub const EXCLUSIVE: libc::c_int = libc::LOCK_EX;
    pub const UNLOCK: libc::c_int = libc::LOCK_UN;

    pub fn flock(file: &File, operation: libc::c_int) -> io::Result<()> {
        loop {
            // SAFETY: the descriptor is owned by `file` and stays open for the call.
            let rc = unsafe { libc::flock(file.as_raw_fd(), operation) };
            if rc == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
}

#[cfg(not(unix))]
mod sys {
    use std::fs::File;
    use std::io;

    pub const SHARED: i32 = 0;
    pub const EXCLUSIVE: i32 = 1;
    pub const UNLOCK: i32 = 2;

    pub fn flock(_file: &File, _operation: i32) -> io::Result<()> {
        Ok(())
    }
}

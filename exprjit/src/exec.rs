//! Executable memory.
//!
//! This module is the only place where generated code is turned into
//! something the process can run. Everything before it works on plain
//! byte buffers.
use std::{fmt, io, mem, ptr, ptr::NonNull, slice};

use log::debug;

use crate::constants::DEFAULT_PAGE_SIZE;

/// Signature of generated functions.
type EntryFn = unsafe extern "sysv64" fn(i64) -> i64;

/// Private, anonymous memory mapping with execute permission.
///
/// The region starts out readable, writable and executable. Once
/// sealed it can't be written anymore. It is unmapped on drop.
pub struct ExecBuffer {
    ptr: NonNull<u8>,
    /// Size of the mapping in bytes, a multiple of the page size.
    size: usize,
    sealed: bool,
}

impl ExecBuffer {
    /// Map enough whole pages to hold `min_size` bytes, at least one.
    pub fn allocate(min_size: usize) -> io::Result<Self> {
        let page = page_size();
        let size = min_size.max(1).div_ceil(page) * page;

        // SAFETY: Requesting a fresh anonymous mapping doesn't
        //         touch any existing memory.
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE | libc::PROT_EXEC,
                libc::MAP_PRIVATE | libc::MAP_ANON,
                -1,
                0,
            )
        };

        if addr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        let ptr = NonNull::new(addr as *mut u8)
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "mmap returned a null pointer"))?;
        debug!("mapped {size} bytes of executable memory at {:p}", ptr);

        Ok(Self {
            ptr,
            size,
            sealed: false,
        })
    }

    /// Size of the mapping in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Copy code to the start of the region.
    pub fn write(&mut self, code: &[u8]) -> io::Result<()> {
        if self.sealed {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "executable buffer is sealed",
            ));
        }
        if code.len() > self.size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} bytes of code don't fit in {} byte buffer", code.len(), self.size),
            ));
        }

        // SAFETY: The destination is a writable mapping owned by this
        //         buffer, and the length was checked above.
        unsafe {
            ptr::copy_nonoverlapping(code.as_ptr(), self.ptr.as_ptr(), code.len());
        }

        Ok(())
    }

    /// Remove write permission from the region.
    pub fn seal(&mut self) -> io::Result<()> {
        // SAFETY: Only changes the protection of our own mapping.
        let ret = unsafe {
            libc::mprotect(
                self.ptr.as_ptr() as *mut libc::c_void,
                self.size,
                libc::PROT_READ | libc::PROT_EXEC,
            )
        };

        if ret != 0 {
            return Err(io::Error::last_os_error());
        }

        self.sealed = true;
        Ok(())
    }

    /// Read back the first `len` bytes of the region.
    fn bytes(&self, len: usize) -> &[u8] {
        // SAFETY: The mapping is readable for its whole size, and lives
        //         as long as the borrow of `self`.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), len.min(self.size)) }
    }
}

impl Drop for ExecBuffer {
    fn drop(&mut self) {
        // SAFETY: The mapping was created by `allocate` with this
        //         exact size, and nothing borrows it past `self`.
        unsafe {
            libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.size);
        }
    }
}

// The region is only written through `&mut self`.
unsafe impl Send for ExecBuffer {}
unsafe impl Sync for ExecBuffer {}

impl fmt::Debug for ExecBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecBuffer")
            .field("ptr", &self.ptr)
            .field("size", &self.size)
            .field("sealed", &self.sealed)
            .finish()
    }
}

/// Compiled function of one integer argument.
///
/// Owns the executable memory that holds its code.
pub struct JitFn {
    buffer: ExecBuffer,
    entry: EntryFn,
    /// Number of code bytes at the start of the buffer.
    len: usize,
}

impl JitFn {
    /// Map executable memory, copy the code in and expose it as a function.
    ///
    /// The code must be a complete function as produced by
    /// [`CodeGen`](crate::codegen::CodeGen), which is why this
    /// isn't public.
    pub(crate) fn load(code: &[u8]) -> io::Result<Self> {
        let mut buffer = ExecBuffer::allocate(code.len())?;
        buffer.write(code)?;
        buffer.seal()?;

        // SAFETY: The region holds a complete function that takes one
        //         integer argument in `rdi`, returns in `rax`, only uses
        //         caller saved registers and leaves the stack balanced.
        let entry = unsafe { mem::transmute::<*mut u8, EntryFn>(buffer.ptr.as_ptr()) };

        Ok(Self {
            buffer,
            entry,
            len: code.len(),
        })
    }

    /// Call the compiled function.
    ///
    /// Division by a value that is zero at runtime traps
    /// the way native integer division does.
    #[inline]
    pub fn call(&self, arg: i64) -> i64 {
        // SAFETY: See `load`. The buffer is sealed and kept alive by `self`.
        unsafe { (self.entry)(arg) }
    }

    /// Machine code of the function, read back from executable memory.
    pub fn code(&self) -> &[u8] {
        self.buffer.bytes(self.len)
    }

    pub fn buffer(&self) -> &ExecBuffer {
        &self.buffer
    }
}

impl fmt::Debug for JitFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JitFn")
            .field("buffer", &self.buffer)
            .field("len", &self.len)
            .finish()
    }
}

fn page_size() -> usize {
    // SAFETY: sysconf has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        DEFAULT_PAGE_SIZE
    }
}

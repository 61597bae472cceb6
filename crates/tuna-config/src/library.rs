//! Vendor library handles
//!
//! Vendor blobs are opened with `RTLD_LOCAL` so their symbols never leak into
//! the global namespace, where they would shadow the shim's own exports.

use std::ffi::{CStr, CString, c_void};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Failed to open {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("Invalid library path: {0}")]
    InvalidPath(PathBuf),
}

/// An open vendor library; closed on drop unless leaked
#[derive(Debug)]
pub struct VendorLibrary {
    handle: NonNull<c_void>,
    path: PathBuf,
}

// Safety: dlopen handles may be used and closed from any thread.
unsafe impl Send for VendorLibrary {}
unsafe impl Sync for VendorLibrary {}

impl VendorLibrary {
    /// `dlopen(path, RTLD_LAZY | RTLD_LOCAL)`
    pub fn open(path: &Path) -> Result<Self, LibraryError> {
        let c_path = path
            .to_str()
            .and_then(|s| CString::new(s).ok())
            .ok_or_else(|| LibraryError::InvalidPath(path.to_path_buf()))?;

        // Safety: valid NUL-terminated path.
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_LAZY | libc::RTLD_LOCAL) };
        let Some(handle) = NonNull::new(handle) else {
            return Err(LibraryError::Open {
                path: path.to_path_buf(),
                reason: last_dl_error(),
            });
        };

        tracing::debug!("Opened {} at {:p}", path.display(), handle);
        Ok(Self {
            handle,
            path: path.to_path_buf(),
        })
    }

    /// Address of an exported symbol
    pub fn symbol(&self, name: &str) -> Option<NonNull<c_void>> {
        let c_name = CString::new(name).ok()?;
        // Safety: `handle` is open for the lifetime of `self`.
        NonNull::new(unsafe { libc::dlsym(self.handle.as_ptr(), c_name.as_ptr()) })
    }

    /// Keep the library mapped for the rest of the process
    ///
    /// Function pointers and data taken from it stay valid after this.
    pub fn leak(self) {
        tracing::debug!("Keeping {} loaded", self.path.display());
        std::mem::forget(self);
    }
}

impl Drop for VendorLibrary {
    fn drop(&mut self) {
        // Safety: `handle` came from a successful dlopen and is closed once.
        if unsafe { libc::dlclose(self.handle.as_ptr()) } != 0 {
            tracing::warn!("dlclose({}) failed: {}", self.path.display(), last_dl_error());
        }
    }
}

fn last_dl_error() -> String {
    // Safety: dlerror returns null or a thread-local NUL-terminated string.
    let err = unsafe { libc::dlerror() };
    if err.is_null() {
        return "unknown dlopen error".to_string();
    }
    unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned()
}

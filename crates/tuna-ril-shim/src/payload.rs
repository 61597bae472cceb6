//! Borrowed views of the opaque buffers crossing the RIL boundary

use crate::ril::RilToken;
use std::ffi::c_void;
use std::marker::PhantomData;
use std::mem::size_of;
use std::ptr;

/// A request or response buffer: pointer plus length, never interpreted
/// unless a caller asks for a specific layout with [`Payload::read`]
#[derive(Debug, Clone, Copy)]
pub struct Payload<'a> {
    ptr: *const c_void,
    len: usize,
    _marker: PhantomData<&'a [u8]>,
}

impl<'a> Payload<'a> {
    /// The `NULL, 0` payload
    pub const fn empty() -> Self {
        Self {
            ptr: ptr::null(),
            len: 0,
            _marker: PhantomData,
        }
    }

    /// View a value as a payload of exactly its own size
    pub fn of<T>(value: &'a T) -> Self {
        Self {
            ptr: value as *const T as *const c_void,
            len: size_of::<T>(),
            _marker: PhantomData,
        }
    }

    /// Wrap a buffer received from C
    ///
    /// # Safety
    ///
    /// `ptr` must be null or valid for reads of `len` bytes for `'a`.
    pub unsafe fn from_raw(ptr: *const c_void, len: usize) -> Self {
        Self {
            ptr,
            len,
            _marker: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *const c_void {
        self.ptr
    }

    /// Pointer for C APIs that take a non-const `void *` they do not write through
    pub fn as_mut_ptr(&self) -> *mut c_void {
        self.ptr as *mut c_void
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// Copy the buffer out as a `T`, only if it is non-null and exactly `size_of::<T>()` long
    pub fn read<T: Copy>(&self) -> Option<T> {
        if self.ptr.is_null() || self.len != size_of::<T>() {
            return None;
        }
        // Safety: non-null and `len` readable bytes per the constructor contracts;
        // unaligned read since C callers give no alignment guarantee beyond their own.
        Some(unsafe { ptr::read_unaligned(self.ptr as *const T) })
    }
}

/// A libril request token, carried through the shim without being dereferenced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(RilToken);

// Safety: a token is an opaque handle; the shim never dereferences it outside
// `ril::request_number`, which libril permits from any thread.
unsafe impl Send for Token {}
unsafe impl Sync for Token {}

impl Token {
    pub const fn from_raw(raw: RilToken) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> RilToken {
        self.0
    }
}

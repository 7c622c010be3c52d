//! ArrayBuffer handles.

use crate::object::{Object, object_subtype};
use crate::runtime::Runtime;

#[derive(Debug)]
pub struct ArrayBuffer {
    object: Object,
}

object_subtype!(ArrayBuffer);

impl ArrayBuffer {
    /// A new buffer holding a copy of `data`.
    pub fn copy(rt: &dyn Runtime, data: &[u8]) -> Option<ArrayBuffer> {
        rt.create_array_buffer_copy(data)
    }

    /// A new buffer that takes ownership of `data`.
    pub fn from_vec(rt: &dyn Runtime, data: Vec<u8>) -> Option<ArrayBuffer> {
        rt.create_array_buffer_no_copy(data)
    }

    pub fn size(&self, rt: &dyn Runtime) -> usize {
        rt.array_buffer_size(self)
    }

    /// Raw pointer to the backing store. Null for empty or detached buffers.
    pub fn data(&self, rt: &dyn Runtime) -> *mut u8 {
        rt.array_buffer_data(self)
    }

    /// Borrow the backing store.
    ///
    /// # Safety
    /// The buffer must not be detached, resized or written from script while
    /// the slice is alive.
    pub unsafe fn as_slice<'a>(&'a self, rt: &dyn Runtime) -> &'a [u8] {
        let len = self.size(rt);
        let data = self.data(rt);
        if data.is_null() || len == 0 {
            return &[];
        }
        // SAFETY: the engine reports `len` readable bytes at `data`, kept
        // alive by this handle; the caller rules out concurrent mutation.
        unsafe { std::slice::from_raw_parts(data, len) }
    }

    pub fn to_vec(&self, rt: &dyn Runtime) -> Vec<u8> {
        // SAFETY: the slice is copied before returning to script.
        unsafe { self.as_slice(rt) }.to_vec()
    }
}

//! Engine string handles.

use crate::pointer::{Pointer, PointerValue};
use crate::runtime::Runtime;

/// A handle to a string in the engine heap.
#[derive(Debug)]
pub struct JsString {
    pointer: Pointer,
}

impl JsString {
    pub fn from_pointer(pointer: Pointer) -> Self {
        Self { pointer }
    }

    pub fn from_value(value: Box<dyn PointerValue>) -> Self {
        Self::from_pointer(Pointer::new(value))
    }

    pub fn create_from_ascii(rt: &dyn Runtime, ascii: &str) -> Self {
        debug_assert!(ascii.is_ascii(), "create_from_ascii called with non-ASCII input");
        rt.create_string_from_ascii(ascii)
    }

    pub fn create_from_utf8(rt: &dyn Runtime, utf8: &str) -> Self {
        rt.create_string_from_utf8(utf8.as_bytes())
    }

    pub fn utf8(&self, rt: &dyn Runtime) -> String {
        rt.string_to_utf8(self)
    }

    pub fn strict_equals(rt: &dyn Runtime, a: &JsString, b: &JsString) -> bool {
        rt.strict_equals_string(a, b)
    }

    pub fn clone_in(&self, rt: &dyn Runtime) -> JsString {
        let cloned = self.pointer.get().and_then(|pv| rt.clone_string(pv));
        JsString::from_pointer(Pointer::from_option(cloned))
    }

    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    pub fn into_pointer(self) -> Pointer {
        self.pointer
    }
}

//! Engine references behind the `otter-jsi` handles.

use std::any::Any;
use std::ptr;
use std::rc::Rc;

use otter_jsi::{Pointer, PointerValue};
use otter_jsvm_sys::*;

use crate::instance::JsvmContextWrapper;

/// A strong `JSVM_Ref` (refcount 1) deleted on drop.
///
/// Holds the context so the environment outlives every reference into it.
pub struct JsvmRef {
    reference: JSVM_Ref,
    context: Rc<JsvmContextWrapper>,
}

impl JsvmRef {
    /// Create a reference to `value`.
    ///
    /// # Safety
    /// `value` must be a live handle in `context`'s environment.
    pub(crate) unsafe fn new(context: &Rc<JsvmContextWrapper>, value: JSVM_Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        let mut reference: JSVM_Ref = ptr::null_mut();
        let status = unsafe { OH_JSVM_CreateReference(context.env(), value, 1, &mut reference) };
        if status != JSVM_OK || reference.is_null() {
            tracing::error!(status = status_name(status), "OH_JSVM_CreateReference failed");
            return None;
        }
        Some(Self {
            reference,
            context: Rc::clone(context),
        })
    }

    /// The referenced value, as a handle in the current handle scope.
    pub(crate) fn value(&self) -> Option<JSVM_Value> {
        let mut value: JSVM_Value = ptr::null_mut();
        // SAFETY: the reference is live until drop.
        let status = unsafe { OH_JSVM_GetReferenceValue(self.context.env(), self.reference, &mut value) };
        (status == JSVM_OK && !value.is_null()).then_some(value)
    }

    /// A second reference to the same value.
    pub(crate) fn duplicate(&self) -> Option<Self> {
        let value = self.value()?;
        // SAFETY: `value` was just read from this context.
        unsafe { Self::new(&self.context, value) }
    }
}

impl Drop for JsvmRef {
    fn drop(&mut self) {
        // SAFETY: created by `new` and deleted only here.
        unsafe { OH_JSVM_DeleteReference(self.context.env(), self.reference) };
    }
}

macro_rules! pointer_value {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name(pub(crate) JsvmRef);

        impl PointerValue for $name {
            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

pointer_value!(
    /// Backing value of a `Symbol` handle.
    JsvmSymbolValue
);
pointer_value!(
    /// Backing value of a `JsString` handle.
    JsvmStringValue
);
pointer_value!(
    /// Backing value of an `Object` handle and its subtypes.
    JsvmObjectValue
);

/// The engine reference behind any handle this backend created.
///
/// Property names are backed by either a string or a symbol.
pub(crate) fn reference_of(value: &dyn PointerValue) -> Option<&JsvmRef> {
    let any = value.as_any();
    if let Some(object) = any.downcast_ref::<JsvmObjectValue>() {
        return Some(&object.0);
    }
    if let Some(string) = any.downcast_ref::<JsvmStringValue>() {
        return Some(&string.0);
    }
    any.downcast_ref::<JsvmSymbolValue>().map(|symbol| &symbol.0)
}

pub(crate) fn pointer_reference(pointer: &Pointer) -> Option<&JsvmRef> {
    pointer.get().and_then(reference_of)
}

/// Duplicate a handle's backing value, keeping its kind.
pub(crate) fn duplicate(value: &dyn PointerValue) -> Option<Box<dyn PointerValue>> {
    let any = value.as_any();
    if let Some(object) = any.downcast_ref::<JsvmObjectValue>() {
        return Some(Box::new(JsvmObjectValue(object.0.duplicate()?)));
    }
    if let Some(string) = any.downcast_ref::<JsvmStringValue>() {
        return Some(Box::new(JsvmStringValue(string.0.duplicate()?)));
    }
    let symbol = any.downcast_ref::<JsvmSymbolValue>()?;
    Some(Box::new(JsvmSymbolValue(symbol.0.duplicate()?)))
}

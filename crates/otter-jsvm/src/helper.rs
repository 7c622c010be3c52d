//! Small wrappers around the C API shared by the runtime and the host
//! bridges.

use std::any::Any;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;

use otter_jsi::JsiNativeException;
use otter_jsvm_sys::*;

use crate::error::JsvmError;

/// Handle scope that closes when dropped.
///
/// Values created while it is open are released on drop unless a reference
/// keeps them alive.
pub(crate) struct HandleScope {
    env: JSVM_Env,
    scope: JSVM_HandleScope,
}

impl HandleScope {
    pub(crate) fn open(env: JSVM_Env) -> Self {
        let mut scope: JSVM_HandleScope = ptr::null_mut();
        // SAFETY: `env` belongs to a live context on this thread.
        let status = unsafe { OH_JSVM_OpenHandleScope(env, &mut scope) };
        if status != JSVM_OK {
            tracing::error!(status = status_name(status), "Failed to open handle scope");
            scope = ptr::null_mut();
        }
        Self { env, scope }
    }
}

impl Drop for HandleScope {
    fn drop(&mut self) {
        if !self.scope.is_null() {
            // SAFETY: opened by `open` on the same env; scopes nest strictly.
            unsafe { OH_JSVM_CloseHandleScope(self.env, self.scope) };
        }
    }
}

pub(crate) unsafe fn undefined(env: JSVM_Env) -> JSVM_Value {
    let mut value: JSVM_Value = ptr::null_mut();
    OH_JSVM_GetUndefined(env, &mut value);
    value
}

/// Create an engine string from UTF-8 bytes. Null on failure.
pub(crate) unsafe fn create_string(env: JSVM_Env, utf8: &[u8]) -> JSVM_Value {
    let mut value: JSVM_Value = ptr::null_mut();
    let status = OH_JSVM_CreateStringUtf8(env, utf8.as_ptr().cast::<c_char>(), utf8.len(), &mut value);
    if status != JSVM_OK {
        return ptr::null_mut();
    }
    value
}

/// Read an engine string as UTF-8. The value must already be a string.
pub(crate) unsafe fn read_string(env: JSVM_Env, value: JSVM_Value) -> Option<String> {
    let mut length = 0usize;
    if OH_JSVM_GetValueStringUtf8(env, value, ptr::null_mut(), 0, &mut length) != JSVM_OK {
        return None;
    }
    // Room for the terminator the engine always writes.
    let mut buffer = vec![0u8; length + 1];
    let mut written = 0usize;
    let status = OH_JSVM_GetValueStringUtf8(
        env,
        value,
        buffer.as_mut_ptr().cast::<c_char>(),
        buffer.len(),
        &mut written,
    );
    if status != JSVM_OK {
        return None;
    }
    buffer.truncate(written);
    Some(String::from_utf8_lossy(&buffer).into_owned())
}

/// `String(value)` without going through script.
pub(crate) unsafe fn coerce_to_string(env: JSVM_Env, value: JSVM_Value) -> Option<String> {
    let mut string: JSVM_Value = ptr::null_mut();
    if OH_JSVM_CoerceToString(env, value, &mut string) != JSVM_OK {
        return None;
    }
    read_string(env, string)
}

pub(crate) unsafe fn type_of(env: JSVM_Env, value: JSVM_Value) -> Option<JSVM_ValueType> {
    let mut value_type: JSVM_ValueType = JSVM_UNDEFINED;
    (OH_JSVM_Typeof(env, value, &mut value_type) == JSVM_OK).then_some(value_type)
}

pub(crate) unsafe fn named_property(env: JSVM_Env, object: JSVM_Value, name: &CStr) -> Option<JSVM_Value> {
    let mut value: JSVM_Value = ptr::null_mut();
    (OH_JSVM_GetNamedProperty(env, object, name.as_ptr(), &mut value) == JSVM_OK).then_some(value)
}

/// Property read for diagnostics: missing, `undefined` and unreadable all
/// come back as `None`.
unsafe fn string_property(env: JSVM_Env, object: JSVM_Value, name: &CStr) -> Option<String> {
    let value = named_property(env, object, name)?;
    match type_of(env, value)? {
        JSVM_UNDEFINED | JSVM_NULL => None,
        _ => coerce_to_string(env, value),
    }
}

/// Take the pending exception, leaving the env clean for further calls.
pub(crate) unsafe fn take_pending_exception(env: JSVM_Env) -> Option<JSVM_Value> {
    let mut pending = false;
    if OH_JSVM_IsExceptionPending(env, &mut pending) != JSVM_OK || !pending {
        return None;
    }
    let mut exception: JSVM_Value = ptr::null_mut();
    if OH_JSVM_GetAndClearLastException(env, &mut exception) != JSVM_OK || exception.is_null() {
        return None;
    }
    Some(exception)
}

/// Convert a thrown value into a script error.
///
/// Error objects contribute `name`, `message` and `stack`; any other thrown
/// value is stringified into the message.
pub(crate) unsafe fn exception_from_value(env: JSVM_Env, exception: JSVM_Value) -> JsiNativeException {
    let mut is_error = false;
    OH_JSVM_IsError(env, exception, &mut is_error);

    if !is_error {
        let message = coerce_to_string(env, exception).unwrap_or_else(|| "Unknown error".to_string());
        return JsiNativeException::js_error("Error", message, String::new());
    }

    let name = string_property(env, exception, c"name").unwrap_or_else(|| "Error".to_string());
    let message = string_property(env, exception, c"message").unwrap_or_default();
    let stack = string_property(env, exception, c"stack").unwrap_or_default();
    JsiNativeException::js_error(name, message, stack)
}

/// Message attached to the last failing call, if the engine recorded one.
pub(crate) unsafe fn last_error_message(env: JSVM_Env) -> Option<String> {
    let mut info: *const JSVM_ExtendedErrorInfo = ptr::null();
    if OH_JSVM_GetLastErrorInfo(env, &mut info) != JSVM_OK || info.is_null() {
        return None;
    }
    let message = (*info).errorMessage;
    if message.is_null() {
        return None;
    }
    Some(CStr::from_ptr(message).to_string_lossy().into_owned())
}

/// Describe a failing status as an engine exception.
pub(crate) unsafe fn status_exception(env: JSVM_Env, status: JSVM_Status, operation: &'static str) -> JsiNativeException {
    let message = last_error_message(env);
    JsvmError::Status {
        operation,
        status,
        message,
    }
    .into()
}

/// NUL-terminated copy of a name. Interior NULs truncate the name.
pub(crate) fn c_name(name: &str) -> CString {
    let end = name.find('\0').unwrap_or(name.len());
    CString::new(&name[..end]).unwrap_or_default()
}

/// Run the body of an engine callback, turning a panic into a thrown
/// `Error`. Unwinding must not cross into the engine.
pub(crate) unsafe fn catch_panic(env: JSVM_Env, body: impl FnOnce() -> JSVM_Value) -> JSVM_Value {
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => value,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(%message, "panic in native callback");
            let message = c_name(&format!("Native callback panicked: {message}"));
            OH_JSVM_ThrowError(env, ptr::null(), message.as_ptr());
            ptr::null_mut()
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Arguments up to this count are marshaled without allocating.
pub(crate) const INLINE_ARGS: usize = 8;

/// Engine-side argument vector for a call.
///
/// Each `Value` is converted straight into its engine slot; no intermediate
/// array of values is built. The engine call takes a contiguous argv, so all
/// slots are filled before the call starts.
pub(crate) struct ArgsConverter {
    inline: [JSVM_Value; INLINE_ARGS],
    heap: Vec<JSVM_Value>,
    len: usize,
}

impl ArgsConverter {
    /// Convert each argument by index. Fails if any conversion fails.
    pub(crate) fn new<T>(args: &[T], mut convert: impl FnMut(&T) -> Option<JSVM_Value>) -> Option<Self> {
        let mut converter = Self {
            inline: [ptr::null_mut(); INLINE_ARGS],
            heap: Vec::new(),
            len: args.len(),
        };
        if args.len() > INLINE_ARGS {
            converter.heap.reserve_exact(args.len());
            for arg in args {
                converter.heap.push(convert(arg)?);
            }
        } else {
            for (slot, arg) in converter.inline.iter_mut().zip(args) {
                *slot = convert(arg)?;
            }
        }
        Some(converter)
    }

    pub(crate) fn as_ptr(&self) -> *const JSVM_Value {
        if self.len > INLINE_ARGS {
            self.heap.as_ptr()
        } else {
            self.inline.as_ptr()
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

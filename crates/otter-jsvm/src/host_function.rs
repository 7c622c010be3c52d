//! Host functions: engine functions whose callback data is a boxed proxy.

use std::ffi::{CStr, c_void};
use std::ptr;
use std::sync::Arc;

use otter_jsi::{
    HostFunctionType, HostObjectWrapper, JsiNativeExceptionCollector, JsiResult, Value, jsi_frame,
};
use otter_jsvm_sys::*;

use crate::helper::{INLINE_ARGS, catch_panic, status_exception, undefined};
use crate::runtime::JsvmRuntime;

static HOST_FUNCTION_TAG_ANCHOR: u8 = 0;

/// Type tag carried by every host function.
pub(crate) fn host_function_tag() -> JSVM_TypeTag {
    JSVM_TypeTag {
        lower: ptr::addr_of!(HOST_FUNCTION_TAG_ANCHOR) as u64,
        upper: 0x6f74_7465_725f_6866,
    }
}

/// What a host function wraps. The engine keeps a pointer to `callback`,
/// so the proxy must not move once the function exists.
pub(crate) struct HostFunctionProxy {
    callback: JSVM_CallbackStruct,
    wrapper: HostObjectWrapper<JsvmRuntime, HostFunctionType>,
}

impl HostFunctionProxy {
    pub(crate) fn new(wrapper: HostObjectWrapper<JsvmRuntime, HostFunctionType>) -> Self {
        Self {
            callback: JSVM_CallbackStruct {
                callback: Some(host_function_trampoline),
                data: ptr::null_mut(),
            },
            wrapper,
        }
    }

    pub(crate) fn host(&self) -> Option<Arc<HostFunctionType>> {
        self.wrapper.get_runtime_and_host().map(|(_, func)| func)
    }

    unsafe fn invoke(&self, env: JSVM_Env, this: JSVM_Value, args: &[JSVM_Value]) -> JSVM_Value {
        let Some((rt, func)) = self.wrapper.get_runtime_and_host() else {
            tracing::warn!("host function called after its runtime or payload was released");
            return undefined(env);
        };

        let this = rt.from_jsvm(this).unwrap_or_default();
        let args: Vec<Value> = args.iter().map(|arg| rt.from_jsvm(*arg).unwrap_or_default()).collect();

        let scope = JsiNativeExceptionCollector::scope();
        let result = (*func)(&*rt, &this, &args);
        let pending = scope.take();
        drop(scope);

        match (result, pending) {
            (Err(err), _) | (Ok(_), Some(err)) => {
                if rt.raise_native_exception(jsi_frame!(err)) {
                    ptr::null_mut()
                } else {
                    undefined(env)
                }
            }
            (Ok(value), None) => rt.to_jsvm(&value).unwrap_or_else(|| undefined(env)),
        }
    }
}

/// Create a function named `name` backed by `proxy`.
///
/// `param_count` becomes the function's `length`.
pub(crate) unsafe fn create(
    env: JSVM_Env,
    name: &CStr,
    param_count: u32,
    proxy: HostFunctionProxy,
) -> JsiResult<JSVM_Value> {
    let raw = Box::into_raw(Box::new(proxy));
    (*raw).callback.data = raw.cast::<c_void>();

    let mut func: JSVM_Value = ptr::null_mut();
    let status = OH_JSVM_CreateFunction(
        env,
        name.as_ptr(),
        JSVM_AUTO_LENGTH,
        ptr::addr_of_mut!((*raw).callback),
        &mut func,
    );
    if status != JSVM_OK || func.is_null() {
        drop(Box::from_raw(raw));
        return Err(status_exception(env, status, "OH_JSVM_CreateFunction"));
    }

    let status = OH_JSVM_Wrap(
        env,
        func,
        raw.cast::<c_void>(),
        Some(finalize_host_function),
        ptr::null_mut(),
        ptr::null_mut(),
    );
    if status != JSVM_OK {
        // The function still points at the proxy, so it has to stay alive.
        tracing::error!(status = status_name(status), "OH_JSVM_Wrap failed; leaking host function proxy");
        return Err(status_exception(env, status, "OH_JSVM_Wrap"));
    }

    let tag = host_function_tag();
    let status = OH_JSVM_TypeTagObject(env, func, &tag);
    if status != JSVM_OK {
        return Err(status_exception(env, status, "OH_JSVM_TypeTagObject"));
    }

    set_length(env, func, param_count);
    Ok(func)
}

/// `length` is read-only but configurable, so it is redefined rather than
/// assigned.
unsafe fn set_length(env: JSVM_Env, func: JSVM_Value, param_count: u32) {
    let mut length: JSVM_Value = ptr::null_mut();
    if OH_JSVM_CreateDouble(env, f64::from(param_count), &mut length) != JSVM_OK {
        return;
    }
    let descriptor = JSVM_PropertyDescriptor {
        utf8name: c"length".as_ptr(),
        name: ptr::null_mut(),
        method: ptr::null_mut(),
        getter: ptr::null_mut(),
        setter: ptr::null_mut(),
        value: length,
        attributes: JSVM_CONFIGURABLE,
    };
    let status = OH_JSVM_DefineProperties(env, func, 1, &descriptor);
    if status != JSVM_OK {
        tracing::debug!(status = status_name(status), "could not set host function length");
    }
}

pub(crate) unsafe fn is_host_function(env: JSVM_Env, func: JSVM_Value) -> bool {
    let tag = host_function_tag();
    let mut tagged = false;
    OH_JSVM_CheckObjectTypeTag(env, func, &tag, &mut tagged) == JSVM_OK && tagged
}

/// The proxy behind a host function.
///
/// # Safety
/// The returned reference is valid while `func` is reachable.
pub(crate) unsafe fn proxy_of<'a>(env: JSVM_Env, func: JSVM_Value) -> Option<&'a HostFunctionProxy> {
    if !is_host_function(env, func) {
        return None;
    }
    let mut data: *mut c_void = ptr::null_mut();
    if OH_JSVM_Unwrap(env, func, &mut data) != JSVM_OK || data.is_null() {
        return None;
    }
    Some(&*data.cast::<HostFunctionProxy>())
}

unsafe extern "C" fn host_function_trampoline(env: JSVM_Env, info: JSVM_CallbackInfo) -> JSVM_Value {
    catch_panic(env, || {
        let mut argc = INLINE_ARGS;
        let mut inline = [ptr::null_mut(); INLINE_ARGS];
        let mut this: JSVM_Value = ptr::null_mut();
        let mut data: *mut c_void = ptr::null_mut();
        let status = OH_JSVM_GetCbInfo(env, info, &mut argc, inline.as_mut_ptr(), &mut this, &mut data);
        if status != JSVM_OK || data.is_null() {
            return ptr::null_mut();
        }

        let mut spilled = Vec::new();
        let args: &[JSVM_Value] = if argc > INLINE_ARGS {
            spilled.resize(argc, ptr::null_mut());
            let mut count = argc;
            OH_JSVM_GetCbInfo(env, info, &mut count, spilled.as_mut_ptr(), ptr::null_mut(), ptr::null_mut());
            &spilled
        } else {
            &inline[..argc]
        };

        // SAFETY: `data` is the proxy installed by `create`; the function
        // being called keeps it alive.
        let proxy = &*data.cast::<HostFunctionProxy>();
        proxy.invoke(env, this, args)
    })
}

unsafe extern "C" fn finalize_host_function(_env: JSVM_Env, data: *mut c_void, _hint: *mut c_void) {
    if !data.is_null() {
        // SAFETY: `data` is the proxy boxed by `create`; the function is
        // unreachable, so the engine no longer uses the callback struct.
        drop(Box::from_raw(data.cast::<HostFunctionProxy>()));
    }
}

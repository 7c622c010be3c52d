//! Host objects as instances of an engine class with named-property
//! interceptors.
//!
//! Every runtime defines one `HostObject` class. Each instance wraps a boxed
//! [`HostObjectProxy`]; the interceptors unwrap it and forward to the
//! payload. The engine drops the proxy from the wrap finalizer.

use std::ffi::c_void;
use std::ptr;
use std::sync::Arc;

use otter_jsi::{
    HostObject, HostObjectWrapper, JsiNativeException, JsiNativeExceptionCollector, JsiResult,
    jsi_frame,
};
use otter_jsvm_sys::*;

use crate::helper::{catch_panic, status_exception, undefined};
use crate::runtime::JsvmRuntime;

static HOST_OBJECT_TAG_ANCHOR: u8 = 0;

/// Type tag carried by every host object instance.
pub(crate) fn host_object_tag() -> JSVM_TypeTag {
    JSVM_TypeTag {
        lower: ptr::addr_of!(HOST_OBJECT_TAG_ANCHOR) as u64,
        upper: 0x6f74_7465_725f_686f,
    }
}

/// What a host object instance wraps.
pub(crate) struct HostObjectProxy {
    wrapper: HostObjectWrapper<JsvmRuntime, dyn HostObject>,
}

impl HostObjectProxy {
    pub(crate) fn new(wrapper: HostObjectWrapper<JsvmRuntime, dyn HostObject>) -> Self {
        Self { wrapper }
    }

    pub(crate) fn host(&self) -> Option<Arc<dyn HostObject>> {
        self.wrapper.get_runtime_and_host().map(|(_, host)| host)
    }

    unsafe fn get(&self, env: JSVM_Env, name: JSVM_Value) -> JSVM_Value {
        let Some((rt, host)) = self.wrapper.get_runtime_and_host() else {
            return undefined(env);
        };
        let Some(name) = rt.prop_name_from_jsvm(name) else {
            return ptr::null_mut();
        };

        let scope = JsiNativeExceptionCollector::scope();
        let value = host.get(&*rt, &name);
        if let Some(err) = scope.take() {
            drop(scope);
            return raise(&rt, env, jsi_frame!(err));
        }
        drop(scope);

        rt.to_jsvm(&value).unwrap_or_else(|| undefined(env))
    }

    unsafe fn set(&self, env: JSVM_Env, name: JSVM_Value, value: JSVM_Value) -> JSVM_Value {
        let Some((rt, host)) = self.wrapper.get_runtime_and_host() else {
            return value;
        };
        let (Some(name), Some(converted)) = (rt.prop_name_from_jsvm(name), rt.from_jsvm(value)) else {
            return value;
        };

        let scope = JsiNativeExceptionCollector::scope();
        let result = host.set(&*rt, &name, &converted);
        let pending = scope.take();
        drop(scope);

        match (result, pending) {
            (Err(err), _) | (Ok(()), Some(err)) => raise(&rt, env, jsi_frame!(err)),
            (Ok(()), None) => value,
        }
    }

    unsafe fn property_names(&self, env: JSVM_Env) -> JSVM_Value {
        let Some((rt, host)) = self.wrapper.get_runtime_and_host() else {
            return ptr::null_mut();
        };

        let scope = JsiNativeExceptionCollector::scope();
        let names = host.get_property_names(&*rt);
        if let Some(err) = scope.take() {
            drop(scope);
            return raise(&rt, env, jsi_frame!(err));
        }
        drop(scope);

        let mut array: JSVM_Value = ptr::null_mut();
        if OH_JSVM_CreateArrayWithLength(env, names.len(), &mut array) != JSVM_OK {
            return ptr::null_mut();
        }
        for (index, name) in names.iter().enumerate() {
            let Some(key) = rt.prop_name_to_jsvm(name) else {
                continue;
            };
            OH_JSVM_SetElement(env, array, index as u32, key);
        }
        array
    }
}

/// Throw (or report) an error raised by a payload. Returns the value the
/// interceptor hands back to the engine.
unsafe fn raise(rt: &JsvmRuntime, env: JSVM_Env, err: JsiNativeException) -> JSVM_Value {
    if rt.raise_native_exception(err) {
        ptr::null_mut()
    } else {
        undefined(env)
    }
}

/// Callback structs for the class. They must outlive the class, so the
/// runtime keeps them boxed for its whole life.
pub(crate) struct HostObjectClass {
    constructor: JSVM_CallbackStruct,
    handlers: JSVM_PropertyHandlerConfigurationStruct,
}

impl HostObjectClass {
    pub(crate) fn new() -> Self {
        Self {
            constructor: JSVM_CallbackStruct {
                callback: Some(host_object_constructor),
                data: ptr::null_mut(),
            },
            handlers: JSVM_PropertyHandlerConfigurationStruct {
                genericNamedPropertyGetterCallback: Some(host_object_getter),
                genericNamedPropertySetterCallback: Some(host_object_setter),
                genericNamedPropertyEnumeratorCallback: Some(host_object_enumerator),
                ..Default::default()
            },
        }
    }

    /// Define the class in `env`.
    ///
    /// # Safety
    /// `this` must stay at the same address for as long as the class lives.
    pub(crate) unsafe fn define(this: *mut Self, env: JSVM_Env) -> JsiResult<JSVM_Value> {
        let mut class: JSVM_Value = ptr::null_mut();
        let status = OH_JSVM_DefineClassWithPropertyHandler(
            env,
            c"HostObject".as_ptr(),
            JSVM_AUTO_LENGTH,
            ptr::addr_of_mut!((*this).constructor),
            0,
            ptr::null(),
            ptr::addr_of_mut!((*this).handlers),
            ptr::null_mut(),
            &mut class,
        );
        if status != JSVM_OK || class.is_null() {
            return Err(status_exception(env, status, "OH_JSVM_DefineClassWithPropertyHandler"));
        }
        Ok(class)
    }
}

/// Instantiate `class` and hand `proxy` to the engine.
///
/// # Safety
/// `class` must be the host object class of `env`.
pub(crate) unsafe fn instantiate(env: JSVM_Env, class: JSVM_Value, proxy: HostObjectProxy) -> JsiResult<JSVM_Value> {
    let mut object: JSVM_Value = ptr::null_mut();
    let status = OH_JSVM_NewInstance(env, class, 0, ptr::null(), &mut object);
    if status != JSVM_OK || object.is_null() {
        return Err(status_exception(env, status, "OH_JSVM_NewInstance"));
    }

    let raw = Box::into_raw(Box::new(proxy));
    let status = OH_JSVM_Wrap(
        env,
        object,
        raw.cast::<c_void>(),
        Some(finalize_host_object),
        ptr::null_mut(),
        ptr::null_mut(),
    );
    if status != JSVM_OK {
        // Not wrapped, so the engine never sees the proxy.
        drop(Box::from_raw(raw));
        return Err(status_exception(env, status, "OH_JSVM_Wrap"));
    }

    let tag = host_object_tag();
    let status = OH_JSVM_TypeTagObject(env, object, &tag);
    if status != JSVM_OK {
        return Err(status_exception(env, status, "OH_JSVM_TypeTagObject"));
    }
    Ok(object)
}

pub(crate) unsafe fn is_host_object(env: JSVM_Env, object: JSVM_Value) -> bool {
    let tag = host_object_tag();
    let mut tagged = false;
    OH_JSVM_CheckObjectTypeTag(env, object, &tag, &mut tagged) == JSVM_OK && tagged
}

/// The proxy wrapped by a host object instance.
///
/// # Safety
/// The returned reference is valid while `object` is reachable.
pub(crate) unsafe fn proxy_of<'a>(env: JSVM_Env, object: JSVM_Value) -> Option<&'a HostObjectProxy> {
    if !is_host_object(env, object) {
        return None;
    }
    let mut data: *mut c_void = ptr::null_mut();
    if OH_JSVM_Unwrap(env, object, &mut data) != JSVM_OK || data.is_null() {
        return None;
    }
    Some(&*data.cast::<HostObjectProxy>())
}

unsafe extern "C" fn host_object_constructor(env: JSVM_Env, info: JSVM_CallbackInfo) -> JSVM_Value {
    let mut this: JSVM_Value = ptr::null_mut();
    OH_JSVM_GetCbInfo(env, info, ptr::null_mut(), ptr::null_mut(), &mut this, ptr::null_mut());
    this
}

unsafe extern "C" fn host_object_getter(
    env: JSVM_Env,
    name: JSVM_Value,
    this_arg: JSVM_Value,
    _data: JSVM_Value,
) -> JSVM_Value {
    catch_panic(env, || match proxy_of(env, this_arg) {
        Some(proxy) => proxy.get(env, name),
        None => ptr::null_mut(),
    })
}

unsafe extern "C" fn host_object_setter(
    env: JSVM_Env,
    name: JSVM_Value,
    property: JSVM_Value,
    this_arg: JSVM_Value,
    _data: JSVM_Value,
) -> JSVM_Value {
    catch_panic(env, || match proxy_of(env, this_arg) {
        Some(proxy) => proxy.set(env, name, property),
        None => ptr::null_mut(),
    })
}

unsafe extern "C" fn host_object_enumerator(env: JSVM_Env, this_arg: JSVM_Value, _data: JSVM_Value) -> JSVM_Value {
    catch_panic(env, || match proxy_of(env, this_arg) {
        Some(proxy) => proxy.property_names(env),
        None => ptr::null_mut(),
    })
}

unsafe extern "C" fn finalize_host_object(_env: JSVM_Env, data: *mut c_void, _hint: *mut c_void) {
    if !data.is_null() {
        // SAFETY: `data` is the proxy boxed by `instantiate`; the engine
        // finalizes each wrap once.
        drop(Box::from_raw(data.cast::<HostObjectProxy>()));
    }
}

//! [`JsvmRuntime`]: the `otter-jsi` runtime contract on the JSVM C API.
//!
//! Every operation opens a handle scope, resolves its handles to engine
//! values, makes the C-API call and turns the result back into a reference.
//! A failing status is never ignored: the pending exception is taken and
//! cleared, reported to the exception handler and the operation yields
//! `None`, `false` or an empty handle.

use std::cell::{RefCell, UnsafeCell};
use std::ffi::{CStr, c_void};
use std::ptr;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use otter_jsi::{
    Array, ArrayBuffer, BigInt, Buffer, BytecodeGetter, ErrorCode, Function, GcBehavior, HostFunctionType,
    HostObject, HostObjectWrapper, JsString, JsiNativeException, JsiResult, Object, Pointer,
    PointerValue, PreparedJavaScript, PropNameId, Runtime, RuntimeCore, RuntimeKind, ScopeState,
    SourceJavaScriptPreparation, Symbol, Value, bigint, jsi_frame, json,
};
use otter_jsvm_sys::*;

use crate::config::JsvmOptions;
use crate::error::JsvmResult;
use crate::helper::{
    ArgsConverter, HandleScope, c_name, coerce_to_string, create_string, exception_from_value,
    named_property, read_string, status_exception, take_pending_exception, type_of,
};
use crate::host_function::{self, HostFunctionProxy};
use crate::host_object::{self, HostObjectClass, HostObjectProxy};
use crate::instance::JsvmContextWrapper;
use crate::pointer::{
    JsvmObjectValue, JsvmRef, JsvmStringValue, JsvmSymbolValue, duplicate, pointer_reference,
};
use crate::prepared::JsvmPreparedJavaScript;

/// Call a C-API function and check its status, naming the function in the
/// reported error.
macro_rules! checked {
    ($rt:expr, $func:ident($($arg:expr),* $(,)?)) => {
        $rt.check($func($($arg),*), stringify!($func))
    };
}

/// A native exception thrown into script, kept until the enclosing call
/// sees the engine exception it became.
struct StashedException {
    exception: JsiNativeException,
    thrown: JsvmRef,
}

/// A runtime backed by the JSVM VM and environment of its thread.
///
/// Runtimes created on the same thread share one environment, and so one
/// global object; each keeps its own registries and exception handler.
///
/// Created through [`JsvmRuntime::new`] or [`JsvmRuntime::with_options`],
/// which return an `Rc` so host bridges can hold weak back-references.
pub struct JsvmRuntime {
    core: RuntimeCore,
    self_weak: Weak<JsvmRuntime>,
    context: Rc<JsvmContextWrapper>,
    description: String,
    host_object_class: RefCell<Option<JsvmRef>>,
    class_callbacks: Box<UnsafeCell<HostObjectClass>>,
    pending_exception: RefCell<Option<StashedException>>,
    bytecode_getter: RefCell<Option<Arc<BytecodeGetter>>>,
}

impl JsvmRuntime {
    pub fn new() -> JsvmResult<Rc<Self>> {
        Self::with_options(JsvmOptions::default())
    }

    /// Initialize the engine if needed and create a VM and environment.
    pub fn with_options(options: JsvmOptions) -> JsvmResult<Rc<Self>> {
        let context = JsvmContextWrapper::shared(&options)?;
        let description = engine_description();
        tracing::debug!(%description, "JSVM runtime created");

        Ok(Rc::new_cyclic(|self_weak| Self {
            core: RuntimeCore::new(options.runtime),
            self_weak: self_weak.clone(),
            context,
            description,
            host_object_class: RefCell::new(None),
            class_callbacks: Box::new(UnsafeCell::new(HostObjectClass::new())),
            pending_exception: RefCell::new(None),
            bytecode_getter: RefCell::new(None),
        }))
    }

    /// Supply cached compilation data for `evaluate_javascript`, keyed by
    /// source URL. Ignored when the code cache is disabled.
    pub fn set_bytecode_getter(&self, getter: Arc<BytecodeGetter>) {
        *self.bytecode_getter.borrow_mut() = Some(getter);
    }

    pub fn context(&self) -> &Rc<JsvmContextWrapper> {
        &self.context
    }

    pub fn env(&self) -> JSVM_Env {
        self.context.env()
    }

    fn handle_scope(&self) -> HandleScope {
        HandleScope::open(self.env())
    }

    // Errors

    /// The exception behind a failing status. A pending engine exception
    /// is always cleared; if it is the one a host callback threw, the
    /// original native exception comes back intact.
    unsafe fn take_error(&self, status: JSVM_Status, operation: &'static str) -> JsiNativeException {
        let env = self.env();
        let stashed = self.pending_exception.borrow_mut().take();
        let Some(thrown) = take_pending_exception(env) else {
            let status = if status == JSVM_OK { JSVM_GENERIC_FAILURE } else { status };
            return status_exception(env, status, operation);
        };
        if let Some(stashed) = stashed
            && stashed.thrown.value().is_some_and(|value| strict_equals(env, value, thrown))
        {
            return stashed.exception;
        }
        exception_from_value(env, thrown)
    }

    unsafe fn check(&self, status: JSVM_Status, operation: &'static str) -> Option<()> {
        if status == JSVM_OK {
            return Some(());
        }
        let err = self.take_error(status, operation);
        self.report_jsi_exception(&err);
        None
    }

    /// Report an error from a bridge helper, clearing anything pending.
    unsafe fn report_failure(&self, err: JsiNativeException) {
        take_pending_exception(self.env());
        self.report_jsi_exception(&err);
    }

    /// Raise an error produced by a host callback.
    ///
    /// With `rethrow_native_exceptions` the error is thrown into script and
    /// stashed for the enclosing call; returns `true`. Otherwise it is
    /// reported and swallowed; returns `false`.
    pub(crate) unsafe fn raise_native_exception(&self, exception: JsiNativeException) -> bool {
        if !self.core.options().rethrow_native_exceptions {
            self.report_jsi_exception(&exception);
            return false;
        }

        let env = self.env();
        let message = create_string(env, exception.message().as_bytes());
        let mut error: JSVM_Value = ptr::null_mut();
        if message.is_null() || OH_JSVM_CreateError(env, ptr::null_mut(), message, &mut error) != JSVM_OK {
            let message = c_name(exception.message());
            OH_JSVM_ThrowError(env, ptr::null(), message.as_ptr());
            return true;
        }
        if exception.name() != "Error" {
            let name = create_string(env, exception.name().as_bytes());
            if !name.is_null() {
                OH_JSVM_SetNamedProperty(env, error, c"name".as_ptr(), name);
            }
        }

        let thrown = JsvmRef::new(&self.context, error);
        OH_JSVM_Throw(env, error);
        if let Some(thrown) = thrown {
            *self.pending_exception.borrow_mut() = Some(StashedException { exception, thrown });
        }
        true
    }

    // Conversions

    unsafe fn make_ref(&self, value: JSVM_Value) -> Option<JsvmRef> {
        JsvmRef::new(&self.context, value)
    }

    unsafe fn make_object(&self, value: JSVM_Value) -> Option<Object> {
        Some(Object::from_value(Box::new(JsvmObjectValue(self.make_ref(value)?))))
    }

    unsafe fn make_string(&self, value: JSVM_Value) -> Option<JsString> {
        Some(JsString::from_value(Box::new(JsvmStringValue(self.make_ref(value)?))))
    }

    unsafe fn make_symbol(&self, value: JSVM_Value) -> Option<Symbol> {
        Some(Symbol::from_value(Box::new(JsvmSymbolValue(self.make_ref(value)?))))
    }

    fn value_of(&self, pointer: &Pointer) -> Option<JSVM_Value> {
        pointer_reference(pointer)?.value()
    }

    pub(crate) unsafe fn to_jsvm(&self, value: &Value) -> Option<JSVM_Value> {
        let env = self.env();
        let mut result: JSVM_Value = ptr::null_mut();
        let status = match value {
            Value::Undefined => OH_JSVM_GetUndefined(env, &mut result),
            Value::Null => OH_JSVM_GetNull(env, &mut result),
            Value::Bool(b) => OH_JSVM_GetBoolean(env, *b, &mut result),
            Value::Number(n) => OH_JSVM_CreateDouble(env, *n, &mut result),
            Value::Symbol(symbol) => return self.value_of(symbol.pointer()),
            Value::String(string) => return self.value_of(string.pointer()),
            Value::Object(object) => return self.value_of(object.pointer()),
        };
        (status == JSVM_OK && !result.is_null()).then_some(result)
    }

    /// A successful call whose result cannot be turned back into a value is
    /// reported like a failing status.
    fn finish_call(&self, converted: Option<Value>, operation: &'static str) -> Option<Value> {
        if converted.is_none() {
            tracing::warn!(operation, "call result could not be converted");
            let err = JsiNativeException::engine(format!("{operation} returned a value that could not be converted"));
            self.report_jsi_exception(&jsi_frame!(err));
        }
        converted
    }

    pub(crate) unsafe fn from_jsvm(&self, value: JSVM_Value) -> Option<Value> {
        let env = self.env();
        Some(match type_of(env, value)? {
            JSVM_UNDEFINED => Value::Undefined,
            JSVM_NULL => Value::Null,
            JSVM_BOOLEAN => {
                let mut b = false;
                (OH_JSVM_GetValueBool(env, value, &mut b) == JSVM_OK).then_some(())?;
                Value::Bool(b)
            }
            JSVM_NUMBER => {
                let mut n = 0.0;
                (OH_JSVM_GetValueDouble(env, value, &mut n) == JSVM_OK).then_some(())?;
                Value::Number(n)
            }
            JSVM_STRING => Value::String(self.make_string(value)?),
            JSVM_SYMBOL => Value::Symbol(self.make_symbol(value)?),
            // Engine bigints stay engine values so identity and `typeof`
            // survive a round trip.
            _ => Value::Object(self.make_object(value)?),
        })
    }

    /// Property keys arrive as strings or symbols.
    pub(crate) unsafe fn prop_name_from_jsvm(&self, key: JSVM_Value) -> Option<PropNameId> {
        let env = self.env();
        match type_of(env, key)? {
            JSVM_STRING => Some(PropNameId::from_value(Box::new(JsvmStringValue(self.make_ref(key)?)))),
            JSVM_SYMBOL => Some(PropNameId::from_value(Box::new(JsvmSymbolValue(self.make_ref(key)?)))),
            _ => {
                let name = coerce_to_string(env, key)?;
                let key = create_string(env, name.as_bytes());
                Some(PropNameId::from_value(Box::new(JsvmStringValue(self.make_ref(key)?))))
            }
        }
    }

    pub(crate) fn prop_name_to_jsvm(&self, name: &PropNameId) -> Option<JSVM_Value> {
        self.value_of(name.pointer())
    }

    /// `String(symbol)`: the engine refuses to coerce symbols implicitly.
    unsafe fn describe_symbol(&self, symbol: JSVM_Value) -> Option<String> {
        let env = self.env();
        let mut global: JSVM_Value = ptr::null_mut();
        checked!(self, OH_JSVM_GetGlobal(env, &mut global))?;
        let string_ctor = named_property(env, global, c"String")?;
        let mut result: JSVM_Value = ptr::null_mut();
        checked!(self, OH_JSVM_CallFunction(env, global, string_ctor, 1, &symbol, &mut result))?;
        read_string(env, result)
    }

    unsafe fn host_object_class(&self) -> Option<JSVM_Value> {
        if let Some(class) = self.host_object_class.borrow().as_ref() {
            return class.value();
        }
        let class = match HostObjectClass::define(self.class_callbacks.get(), self.env()) {
            Ok(class) => class,
            Err(err) => {
                self.report_failure(err);
                return None;
            }
        };
        let reference = self.make_ref(class)?;
        *self.host_object_class.borrow_mut() = Some(reference);
        Some(class)
    }

    // Scripts

    unsafe fn compile(&self, source: &[u8], source_url: &str, cache: Option<&[u8]>) -> JsiResult<JSVM_Script> {
        // The engine only takes UTF-8 source text.
        if let Err(err) = std::str::from_utf8(source) {
            tracing::debug!(source_url, %err, "unrecognized script buffer");
            return Err(jsi_frame!(
                JsiNativeException::new(format!("'{source_url}' is not UTF-8 source text ({err})"))
                    .with_code(ErrorCode::NativeBinding)
            ));
        }
        let env = self.env();
        let code = create_string(env, source);
        if code.is_null() {
            return Err(self.take_error(JSVM_GENERIC_FAILURE, "OH_JSVM_CreateStringUtf8"));
        }

        let resource_name = c_name(source_url);
        let mut origin = JSVM_ScriptOrigin {
            sourceMapUrl: ptr::null(),
            resourceName: resource_name.as_ptr(),
            resourceLineOffset: 0,
            resourceColumnOffset: 0,
        };
        let (cache_data, cache_length) = cache.map_or((ptr::null(), 0), |cache| (cache.as_ptr(), cache.len()));
        let mut cache_rejected = false;
        let mut script: JSVM_Script = ptr::null_mut();
        let status = OH_JSVM_CompileScriptWithOrigin(
            env,
            code,
            cache_data,
            cache_length,
            false,
            &mut cache_rejected,
            &mut origin,
            &mut script,
        );
        if status != JSVM_OK || script.is_null() {
            return Err(self.take_error(status, "OH_JSVM_CompileScriptWithOrigin"));
        }
        if cache.is_some() && cache_rejected {
            tracing::debug!(source_url, "code cache rejected, compiled from source");
        }
        Ok(script)
    }

    unsafe fn run(&self, script: JSVM_Script, source_url: &str) -> JsiResult<Value> {
        let mut result: JSVM_Value = ptr::null_mut();
        let status = OH_JSVM_RunScript(self.env(), script, &mut result);
        self.core.inspector().on_script_evaluated(source_url);
        if status != JSVM_OK || result.is_null() {
            return Err(self.take_error(status, "OH_JSVM_RunScript"));
        }
        self.from_jsvm(result)
            .ok_or_else(|| JsiNativeException::engine(format!("Could not convert the result of '{source_url}'")))
    }

    fn cached_data_for(&self, source_url: &str) -> Option<Arc<dyn Buffer>> {
        if !self.core.options().enable_code_cache {
            return None;
        }
        let getter = self.bytecode_getter.borrow().clone()?;
        getter(source_url)
    }
}

impl Drop for JsvmRuntime {
    fn drop(&mut self) {
        self.core.mark_destroyed();
        self.pending_exception.get_mut().take();
        self.host_object_class.get_mut().take();
        tracing::debug!("JSVM runtime destroyed");
    }
}

unsafe fn strict_equals(env: JSVM_Env, a: JSVM_Value, b: JSVM_Value) -> bool {
    let mut equal = false;
    OH_JSVM_StrictEquals(env, a, b, &mut equal) == JSVM_OK && equal
}

fn engine_description() -> String {
    let mut info = JSVM_VMInfo {
        apiVersion: 0,
        engine: ptr::null(),
        version: ptr::null(),
        cachedDataVersionTag: 0,
    };
    // SAFETY: `info` is valid for writes; the strings it receives are static.
    if unsafe { OH_JSVM_GetVMInfo(&mut info) } != JSVM_OK || info.version.is_null() {
        return RuntimeKind::Jsvm.to_string();
    }
    let engine = if info.engine.is_null() {
        String::new()
    } else {
        // SAFETY: non-null, NUL-terminated and static.
        unsafe { CStr::from_ptr(info.engine) }.to_string_lossy().into_owned()
    };
    // SAFETY: as above.
    let version = unsafe { CStr::from_ptr(info.version) }.to_string_lossy();
    format!("{} ({engine} {version}, API {})", RuntimeKind::Jsvm, info.apiVersion)
}

impl Runtime for JsvmRuntime {
    fn core(&self) -> &RuntimeCore {
        &self.core
    }

    fn kind(&self) -> RuntimeKind {
        RuntimeKind::Jsvm
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn gc_behavior(&self) -> GcBehavior {
        GcBehavior::Asynchronous
    }

    fn evaluate_javascript(&self, buffer: Arc<dyn Buffer>, source_url: &str) -> JsiResult<Value> {
        let cached = self.cached_data_for(source_url);
        let _scope = self.handle_scope();
        // SAFETY: every handle below lives in the scope opened above.
        unsafe {
            let script = self.compile(buffer.data(), source_url, cached.as_ref().map(|c| c.data()))?;
            self.run(script, source_url)
        }
    }

    fn prepare_javascript(
        &self,
        buffer: Arc<dyn Buffer>,
        source_url: &str,
    ) -> JsiResult<Arc<dyn PreparedJavaScript>> {
        if !self.core.options().enable_code_cache {
            return Ok(Arc::new(SourceJavaScriptPreparation::new(buffer, source_url)));
        }

        let _scope = self.handle_scope();
        // SAFETY: handles live in the scope above; the cache pointer is
        // read before any further engine call.
        unsafe {
            let script = self.compile(buffer.data(), source_url, None)?;
            let mut data: *const u8 = ptr::null();
            let mut length = 0usize;
            let status = OH_JSVM_CreateCodeCache(self.env(), script, &mut data, &mut length);
            if status != JSVM_OK || data.is_null() {
                return Err(self.take_error(status, "OH_JSVM_CreateCodeCache"));
            }
            // The engine owns `data` and offers no C entry point to free it.
            let code_cache = std::slice::from_raw_parts(data, length).to_vec();
            tracing::debug!(source_url, bytes = length, "code cache created");
            Ok(Arc::new(JsvmPreparedJavaScript::new(buffer, source_url, code_cache)))
        }
    }

    fn evaluate_prepared_javascript(&self, prepared: &Arc<dyn PreparedJavaScript>) -> JsiResult<Value> {
        let any = prepared.as_any();
        if let Some(prepared) = any.downcast_ref::<JsvmPreparedJavaScript>() {
            let _scope = self.handle_scope();
            // SAFETY: handles live in the scope above.
            return unsafe {
                let script = self.compile(
                    prepared.source().data(),
                    prepared.source_url(),
                    Some(prepared.code_cache()),
                )?;
                self.run(script, prepared.source_url())
            };
        }
        match any.downcast_ref::<SourceJavaScriptPreparation>() {
            Some(source) => self.evaluate_javascript(Arc::clone(source.buffer()), source.source_url()),
            None => Err(JsiNativeException::new(format!(
                "'{}' was prepared by a different runtime",
                prepared.source_url()
            ))),
        }
    }

    fn global(&self) -> Object {
        let _scope = self.handle_scope();
        // SAFETY: the global lives in the scope above.
        unsafe {
            let mut global: JSVM_Value = ptr::null_mut();
            checked!(self, OH_JSVM_GetGlobal(self.env(), &mut global))
                .and_then(|()| self.make_object(global))
                .unwrap_or_else(|| Object::from_pointer(Pointer::empty()))
        }
    }

    fn clone_symbol(&self, pv: &dyn PointerValue) -> Option<Box<dyn PointerValue>> {
        let _scope = self.handle_scope();
        duplicate(pv)
    }

    fn clone_string(&self, pv: &dyn PointerValue) -> Option<Box<dyn PointerValue>> {
        let _scope = self.handle_scope();
        duplicate(pv)
    }

    fn clone_object(&self, pv: &dyn PointerValue) -> Option<Box<dyn PointerValue>> {
        let _scope = self.handle_scope();
        duplicate(pv)
    }

    fn clone_prop_name_id(&self, pv: &dyn PointerValue) -> Option<Box<dyn PointerValue>> {
        let _scope = self.handle_scope();
        duplicate(pv)
    }

    fn create_prop_name_id_from_utf8(&self, utf8: &[u8]) -> PropNameId {
        let _scope = self.handle_scope();
        // SAFETY: the string lives in the scope above.
        let reference = unsafe { self.make_ref(create_string(self.env(), utf8)) };
        match reference {
            Some(reference) => PropNameId::from_value(Box::new(JsvmStringValue(reference))),
            None => PropNameId::from_pointer(Pointer::empty()),
        }
    }

    fn create_prop_name_id_from_string(&self, string: &JsString) -> PropNameId {
        let _scope = self.handle_scope();
        PropNameId::from_pointer(Pointer::from_option(string.pointer().get().and_then(duplicate)))
    }

    fn create_prop_name_id_from_symbol(&self, symbol: &Symbol) -> PropNameId {
        let _scope = self.handle_scope();
        PropNameId::from_pointer(Pointer::from_option(symbol.pointer().get().and_then(duplicate)))
    }

    fn prop_name_id_to_utf8(&self, id: &PropNameId) -> String {
        let _scope = self.handle_scope();
        let Some(key) = self.prop_name_to_jsvm(id) else {
            return String::new();
        };
        // SAFETY: `key` lives in the scope above.
        let name = unsafe {
            match type_of(self.env(), key) {
                Some(JSVM_SYMBOL) => self.describe_symbol(key),
                _ => read_string(self.env(), key),
            }
        };
        name.unwrap_or_default()
    }

    fn compare_prop_name_ids(&self, a: &PropNameId, b: &PropNameId) -> bool {
        let _scope = self.handle_scope();
        match (self.value_of(a.pointer()), self.value_of(b.pointer())) {
            // SAFETY: both values live in the scope above.
            (Some(a), Some(b)) => unsafe { strict_equals(self.env(), a, b) },
            _ => false,
        }
    }

    fn symbol_to_string(&self, symbol: &Symbol) -> String {
        let _scope = self.handle_scope();
        self.value_of(symbol.pointer())
            // SAFETY: the symbol lives in the scope above.
            .and_then(|value| unsafe { self.describe_symbol(value) })
            .unwrap_or_default()
    }

    fn create_string_from_utf8(&self, utf8: &[u8]) -> JsString {
        let _scope = self.handle_scope();
        // SAFETY: the string lives in the scope above.
        let string = unsafe { self.make_string(create_string(self.env(), utf8)) };
        string.unwrap_or_else(|| JsString::from_pointer(Pointer::empty()))
    }

    fn string_to_utf8(&self, string: &JsString) -> String {
        let _scope = self.handle_scope();
        self.value_of(string.pointer())
            // SAFETY: the string lives in the scope above.
            .and_then(|value| unsafe { read_string(self.env(), value) })
            .unwrap_or_default()
    }

    fn create_big_int(&self, digits: &str) -> Option<BigInt> {
        bigint::create_big_int_object(self, digits).map(BigInt::from_object_unchecked)
    }

    fn create_value_from_json_utf8(&self, json: &[u8]) -> Option<Value> {
        json::parse_json_utf8(self, json)
    }

    fn create_object(&self) -> Object {
        let _scope = self.handle_scope();
        // SAFETY: the object lives in the scope above.
        unsafe {
            let mut object: JSVM_Value = ptr::null_mut();
            checked!(self, OH_JSVM_CreateObject(self.env(), &mut object))
                .and_then(|()| self.make_object(object))
                .unwrap_or_else(|| Object::from_pointer(Pointer::empty()))
        }
    }

    fn create_object_from_host_object(&self, host: Arc<dyn HostObject>) -> Option<Object> {
        let runtime = self.self_weak.upgrade()?;
        let _scope = self.handle_scope();
        // SAFETY: the class and the new instance live in the scope above.
        unsafe {
            let class = self.host_object_class()?;
            let proxy = HostObjectProxy::new(HostObjectWrapper::new(&runtime, &host));
            match host_object::instantiate(self.env(), class, proxy) {
                Ok(object) => self.make_object(object),
                Err(err) => {
                    self.report_failure(err);
                    None
                }
            }
        }
    }

    fn get_host_object(&self, object: &Object) -> Option<Arc<dyn HostObject>> {
        let _scope = self.handle_scope();
        let value = self.value_of(object.pointer())?;
        // SAFETY: the proxy is kept alive by `object`.
        unsafe { host_object::proxy_of(self.env(), value)?.host() }
    }

    fn get_host_function(&self, func: &Function) -> Option<Arc<HostFunctionType>> {
        let _scope = self.handle_scope();
        let value = self.value_of(func.pointer())?;
        // SAFETY: the proxy is kept alive by `func`.
        unsafe { host_function::proxy_of(self.env(), value)?.host() }
    }

    fn get_property(&self, object: &Object, name: &PropNameId) -> Option<Value> {
        let _scope = self.handle_scope();
        let target = self.value_of(object.pointer())?;
        let key = self.prop_name_to_jsvm(name)?;
        // SAFETY: all handles live in the scope above.
        unsafe {
            let mut result: JSVM_Value = ptr::null_mut();
            checked!(self, OH_JSVM_GetProperty(self.env(), target, key, &mut result))?;
            self.from_jsvm(result)
        }
    }

    fn get_property_by_str(&self, object: &Object, name: &str) -> Option<Value> {
        let _scope = self.handle_scope();
        let target = self.value_of(object.pointer())?;
        let name = c_name(name);
        // SAFETY: all handles live in the scope above.
        unsafe {
            let mut result: JSVM_Value = ptr::null_mut();
            checked!(self, OH_JSVM_GetNamedProperty(self.env(), target, name.as_ptr(), &mut result))?;
            self.from_jsvm(result)
        }
    }

    fn has_property(&self, object: &Object, name: &PropNameId) -> bool {
        let _scope = self.handle_scope();
        let (Some(target), Some(key)) = (self.value_of(object.pointer()), self.prop_name_to_jsvm(name)) else {
            return false;
        };
        let mut result = false;
        // SAFETY: all handles live in the scope above.
        let checked = unsafe { checked!(self, OH_JSVM_HasProperty(self.env(), target, key, &mut result)) };
        checked.is_some() && result
    }

    fn has_property_by_str(&self, object: &Object, name: &str) -> bool {
        let _scope = self.handle_scope();
        let Some(target) = self.value_of(object.pointer()) else {
            return false;
        };
        let name = c_name(name);
        let mut result = false;
        // SAFETY: all handles live in the scope above.
        let checked =
            unsafe { checked!(self, OH_JSVM_HasNamedProperty(self.env(), target, name.as_ptr(), &mut result)) };
        checked.is_some() && result
    }

    fn set_property_value(&self, object: &Object, name: &PropNameId, value: &Value) -> bool {
        let _scope = self.handle_scope();
        let (Some(target), Some(key)) = (self.value_of(object.pointer()), self.prop_name_to_jsvm(name)) else {
            return false;
        };
        // SAFETY: all handles live in the scope above.
        unsafe {
            let Some(value) = self.to_jsvm(value) else {
                return false;
            };
            checked!(self, OH_JSVM_SetProperty(self.env(), target, key, value)).is_some()
        }
    }

    fn set_property_value_by_str(&self, object: &Object, name: &str, value: &Value) -> bool {
        let _scope = self.handle_scope();
        let Some(target) = self.value_of(object.pointer()) else {
            return false;
        };
        let name = c_name(name);
        // SAFETY: all handles live in the scope above.
        unsafe {
            let Some(value) = self.to_jsvm(value) else {
                return false;
            };
            checked!(self, OH_JSVM_SetNamedProperty(self.env(), target, name.as_ptr(), value)).is_some()
        }
    }

    fn get_property_names(&self, object: &Object) -> Option<Array> {
        let _scope = self.handle_scope();
        let target = self.value_of(object.pointer())?;
        // SAFETY: all handles live in the scope above.
        let names = unsafe {
            let mut names: JSVM_Value = ptr::null_mut();
            checked!(self, OH_JSVM_GetPropertyNames(self.env(), target, &mut names))?;
            self.make_object(names)?
        };
        Some(names.get_array(self))
    }

    fn is_array(&self, object: &Object) -> bool {
        let _scope = self.handle_scope();
        let Some(value) = self.value_of(object.pointer()) else {
            return false;
        };
        let mut result = false;
        // SAFETY: `value` lives in the scope above.
        unsafe { OH_JSVM_IsArray(self.env(), value, &mut result) == JSVM_OK && result }
    }

    fn is_array_buffer(&self, object: &Object) -> bool {
        let _scope = self.handle_scope();
        let Some(value) = self.value_of(object.pointer()) else {
            return false;
        };
        let mut result = false;
        // SAFETY: `value` lives in the scope above.
        unsafe { OH_JSVM_IsArraybuffer(self.env(), value, &mut result) == JSVM_OK && result }
    }

    fn is_function(&self, object: &Object) -> bool {
        let _scope = self.handle_scope();
        self.value_of(object.pointer())
            // SAFETY: `value` lives in the scope above.
            .and_then(|value| unsafe { type_of(self.env(), value) })
            == Some(JSVM_FUNCTION)
    }

    fn is_big_int(&self, object: &Object) -> bool {
        let _scope = self.handle_scope();
        let native = self
            .value_of(object.pointer())
            // SAFETY: `value` lives in the scope above.
            .and_then(|value| unsafe { type_of(self.env(), value) })
            == Some(JSVM_BIGINT);
        native || self.has_property_by_str(object, bigint::DIGITS_PROPERTY)
    }

    fn is_host_object(&self, object: &Object) -> bool {
        let _scope = self.handle_scope();
        self.value_of(object.pointer())
            // SAFETY: `value` lives in the scope above.
            .is_some_and(|value| unsafe { host_object::is_host_object(self.env(), value) })
    }

    fn is_host_function(&self, func: &Function) -> bool {
        let _scope = self.handle_scope();
        self.value_of(func.pointer())
            // SAFETY: `value` lives in the scope above.
            .is_some_and(|value| unsafe { host_function::is_host_function(self.env(), value) })
    }

    fn create_array(&self, length: usize) -> Option<Array> {
        let _scope = self.handle_scope();
        // SAFETY: the array lives in the scope above.
        let array = unsafe {
            let mut array: JSVM_Value = ptr::null_mut();
            checked!(self, OH_JSVM_CreateArrayWithLength(self.env(), length, &mut array))?;
            self.make_object(array)?
        };
        Some(array.get_array(self))
    }

    fn array_size(&self, array: &Array) -> usize {
        let _scope = self.handle_scope();
        let Some(value) = self.value_of(array.pointer()) else {
            return 0;
        };
        let mut length = 0u32;
        // SAFETY: `value` lives in the scope above.
        match unsafe { checked!(self, OH_JSVM_GetArrayLength(self.env(), value, &mut length)) } {
            Some(()) => length as usize,
            None => 0,
        }
    }

    fn get_value_at_index(&self, array: &Array, index: usize) -> Option<Value> {
        let index = u32::try_from(index).ok()?;
        let _scope = self.handle_scope();
        let target = self.value_of(array.pointer())?;
        // SAFETY: all handles live in the scope above.
        unsafe {
            let mut result: JSVM_Value = ptr::null_mut();
            checked!(self, OH_JSVM_GetElement(self.env(), target, index, &mut result))?;
            self.from_jsvm(result)
        }
    }

    fn set_value_at_index(&self, array: &Array, index: usize, value: &Value) -> bool {
        let Ok(index) = u32::try_from(index) else {
            return false;
        };
        let _scope = self.handle_scope();
        let Some(target) = self.value_of(array.pointer()) else {
            return false;
        };
        // SAFETY: all handles live in the scope above.
        unsafe {
            let Some(value) = self.to_jsvm(value) else {
                return false;
            };
            checked!(self, OH_JSVM_SetElement(self.env(), target, index, value)).is_some()
        }
    }

    fn create_array_buffer_copy(&self, data: &[u8]) -> Option<ArrayBuffer> {
        let _scope = self.handle_scope();
        // SAFETY: the buffer lives in the scope above; `backing` points at
        // `data.len()` writable bytes.
        let buffer = unsafe {
            let mut backing: *mut c_void = ptr::null_mut();
            let mut buffer: JSVM_Value = ptr::null_mut();
            checked!(self, OH_JSVM_CreateArraybuffer(self.env(), data.len(), &mut backing, &mut buffer))?;
            if !data.is_empty() && !backing.is_null() {
                ptr::copy_nonoverlapping(data.as_ptr(), backing.cast::<u8>(), data.len());
            }
            self.make_object(buffer)?
        };
        Some(buffer.get_array_buffer(self))
    }

    /// The engine does not accept external backing stores, so the bytes are
    /// copied once into an engine-owned buffer.
    fn create_array_buffer_no_copy(&self, data: Vec<u8>) -> Option<ArrayBuffer> {
        self.create_array_buffer_copy(&data)
    }

    fn array_buffer_size(&self, buffer: &ArrayBuffer) -> usize {
        let _scope = self.handle_scope();
        let Some(value) = self.value_of(buffer.pointer()) else {
            return 0;
        };
        let mut data: *mut c_void = ptr::null_mut();
        let mut length = 0usize;
        // SAFETY: `value` lives in the scope above.
        match unsafe { checked!(self, OH_JSVM_GetArraybufferInfo(self.env(), value, &mut data, &mut length)) } {
            Some(()) => length,
            None => 0,
        }
    }

    fn array_buffer_data(&self, buffer: &ArrayBuffer) -> *mut u8 {
        let _scope = self.handle_scope();
        let Some(value) = self.value_of(buffer.pointer()) else {
            return ptr::null_mut();
        };
        let mut data: *mut c_void = ptr::null_mut();
        let mut length = 0usize;
        // SAFETY: `value` lives in the scope above.
        match unsafe { checked!(self, OH_JSVM_GetArraybufferInfo(self.env(), value, &mut data, &mut length)) } {
            Some(()) => data.cast::<u8>(),
            None => ptr::null_mut(),
        }
    }

    fn create_function_from_host_function(
        &self,
        name: &PropNameId,
        param_count: u32,
        func: Arc<HostFunctionType>,
    ) -> Option<Function> {
        let runtime = self.self_weak.upgrade()?;
        let name = c_name(&self.prop_name_id_to_utf8(name));
        let _scope = self.handle_scope();
        let proxy = HostFunctionProxy::new(HostObjectWrapper::new(&runtime, &func));
        // SAFETY: the function lives in the scope above.
        let func = unsafe {
            match host_function::create(self.env(), &name, param_count, proxy) {
                Ok(func) => self.make_object(func)?,
                Err(err) => {
                    self.report_failure(err);
                    return None;
                }
            }
        };
        Some(func.get_function(self))
    }

    fn call(&self, func: &Function, this: &Value, args: &[Value]) -> Option<Value> {
        let _scope = self.handle_scope();
        let target = self.value_of(func.pointer())?;
        // SAFETY: all handles live in the scope above.
        unsafe {
            let receiver = self.to_jsvm(this)?;
            let args = ArgsConverter::new(args, |arg| self.to_jsvm(arg))?;
            let mut result: JSVM_Value = ptr::null_mut();
            let status =
                OH_JSVM_CallFunction(self.env(), receiver, target, args.len(), args.as_ptr(), &mut result);
            if status != JSVM_OK || result.is_null() {
                let err = self.take_error(status, "OH_JSVM_CallFunction");
                self.report_jsi_exception(&err);
                return None;
            }
            self.finish_call(self.from_jsvm(result), "OH_JSVM_CallFunction")
        }
    }

    fn call_as_constructor(&self, func: &Function, args: &[Value]) -> Option<Value> {
        let _scope = self.handle_scope();
        let target = self.value_of(func.pointer())?;
        // SAFETY: all handles live in the scope above.
        unsafe {
            let args = ArgsConverter::new(args, |arg| self.to_jsvm(arg))?;
            let mut result: JSVM_Value = ptr::null_mut();
            let status = OH_JSVM_NewInstance(self.env(), target, args.len(), args.as_ptr(), &mut result);
            if status != JSVM_OK || result.is_null() {
                let err = self.take_error(status, "OH_JSVM_NewInstance");
                self.report_jsi_exception(&err);
                return None;
            }
            self.finish_call(self.from_jsvm(result), "OH_JSVM_NewInstance")
        }
    }

    fn push_scope(&self) -> Option<ScopeState> {
        Some(Box::new(self.handle_scope()))
    }

    fn pop_scope(&self, state: Option<ScopeState>) {
        match state.map(|state| state.downcast::<HandleScope>()) {
            Some(Ok(scope)) => drop(scope),
            Some(Err(_)) => tracing::warn!("pop_scope called with a foreign scope state"),
            None => {}
        }
    }

    fn strict_equals_symbol(&self, a: &Symbol, b: &Symbol) -> bool {
        self.strict_equals_pointers(a.pointer(), b.pointer())
    }

    fn strict_equals_string(&self, a: &JsString, b: &JsString) -> bool {
        self.strict_equals_pointers(a.pointer(), b.pointer())
    }

    fn strict_equals_object(&self, a: &Object, b: &Object) -> bool {
        self.strict_equals_pointers(a.pointer(), b.pointer())
    }

    fn instance_of(&self, object: &Object, ctor: &Function) -> Option<bool> {
        let _scope = self.handle_scope();
        let target = self.value_of(object.pointer())?;
        let ctor = self.value_of(ctor.pointer())?;
        let mut result = false;
        // SAFETY: all handles live in the scope above.
        let checked = unsafe { checked!(self, OH_JSVM_Instanceof(self.env(), target, ctor, &mut result)) };
        checked.map(|()| result)
    }

    /// A critical memory-pressure notification. The engine decides when to
    /// collect; finalizers may run later.
    fn request_gc(&self) {
        // SAFETY: the env is live.
        let status = unsafe { OH_JSVM_MemoryPressureNotification(self.env(), JSVM_CRITICAL_PRESSURE) };
        if status != JSVM_OK {
            tracing::warn!(status = status_name(status), "memory pressure notification failed");
        }
    }
}

impl JsvmRuntime {
    fn strict_equals_pointers(&self, a: &Pointer, b: &Pointer) -> bool {
        let _scope = self.handle_scope();
        match (self.value_of(a), self.value_of(b)) {
            // SAFETY: both values live in the scope above.
            (Some(a), Some(b)) => unsafe { strict_equals(self.env(), a, b) },
            _ => false,
        }
    }
}

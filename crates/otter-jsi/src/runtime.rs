//! The engine-agnostic runtime contract.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::array::Array;
use crate::array_buffer::ArrayBuffer;
use crate::buffer::{Buffer, PreparedJavaScript, SourceJavaScriptPreparation};
use crate::config::RuntimeOptions;
use crate::exception::{JsiNativeException, JsiResult};
use crate::function::Function;
use crate::host::{HostFunctionType, HostObject, HostRegistry};
use crate::object::Object;
use crate::pointer::PointerValue;
use crate::propnameid::PropNameId;
use crate::string::JsString;
use crate::symbol::Symbol;
use crate::value::Value;

/// Which engine backs a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeKind {
    V8,
    Jsc,
    QuickJs,
    Jsvm,
    /// A backend defined outside this workspace.
    Custom,
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuntimeKind::V8 => "V8",
            RuntimeKind::Jsc => "JavaScriptCore",
            RuntimeKind::QuickJs => "QuickJS",
            RuntimeKind::Jsvm => "JSVM",
            RuntimeKind::Custom => "custom",
        })
    }
}

/// What a call to [`Runtime::request_gc`] guarantees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcBehavior {
    /// A full collection has run, finalizers included, when the call returns.
    Synchronous,
    /// The engine is asked to collect soon; nothing is guaranteed on return.
    Asynchronous,
    /// The request is ignored.
    Unsupported,
}

/// Receives exceptions that could not be returned to a caller.
pub trait JsiExceptionHandler {
    fn on_jsi_exception(&self, exception: &JsiNativeException);
}

impl<F: Fn(&JsiNativeException)> JsiExceptionHandler for F {
    fn on_jsi_exception(&self, exception: &JsiNativeException) {
        self(exception)
    }
}

/// Default handler: log and drop.
pub struct LoggingExceptionHandler;

impl JsiExceptionHandler for LoggingExceptionHandler {
    fn on_jsi_exception(&self, exception: &JsiNativeException) {
        tracing::error!(
            error = %exception,
            code = exception.error_code().as_i32(),
            js = exception.is_js_error(),
            stack = %exception.stack(),
            "unhandled JSI exception"
        );
    }
}

/// Debugger integration hooks. Every method defaults to a no-op.
pub trait InspectorRuntimeObserver {
    fn on_attached(&self, _description: &str) {}

    fn on_detached(&self) {}

    fn on_script_evaluated(&self, _source_url: &str) {}
}

/// Observer that ignores every event.
pub struct NoopInspectorObserver;

impl InspectorRuntimeObserver for NoopInspectorObserver {}

/// Opaque state returned by [`Runtime::push_scope`].
pub type ScopeState = Box<dyn Any>;

/// State every backend embeds: registries, the destroyed flag, the exception
/// handler and the inspector observer.
pub struct RuntimeCore {
    options: RuntimeOptions,
    destroyed: Arc<AtomicBool>,
    host_objects: HostRegistry<dyn HostObject>,
    host_functions: HostRegistry<HostFunctionType>,
    exception_handler: RefCell<Rc<dyn JsiExceptionHandler>>,
    inspector: RefCell<Rc<dyn InspectorRuntimeObserver>>,
    shared_functions: RefCell<HashMap<&'static str, Function>>,
}

impl RuntimeCore {
    pub fn new(options: RuntimeOptions) -> Self {
        Self {
            options,
            destroyed: Arc::new(AtomicBool::new(false)),
            host_objects: HostRegistry::default(),
            host_functions: HostRegistry::default(),
            exception_handler: RefCell::new(Rc::new(LoggingExceptionHandler)),
            inspector: RefCell::new(Rc::new(NoopInspectorObserver)),
            shared_functions: RefCell::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Shared flag observed by every host wrapper of this runtime.
    pub fn destroyed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.destroyed)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Flip the destroyed flag, then release every registered payload.
    ///
    /// Backends call this first thing in their `Drop`, before the engine is
    /// torn down. Wrappers finalized afterwards leave the registries alone.
    pub fn mark_destroyed(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!(
            host_objects = self.host_objects.len(),
            host_functions = self.host_functions.len(),
            "releasing host registries"
        );
        self.shared_functions.borrow_mut().clear();
        self.host_objects.clear();
        self.host_functions.clear();
    }

    pub fn host_objects(&self) -> &HostRegistry<dyn HostObject> {
        &self.host_objects
    }

    pub fn host_functions(&self) -> &HostRegistry<HostFunctionType> {
        &self.host_functions
    }

    pub fn add_host_object(&self, host: &Arc<dyn HostObject>) -> usize {
        self.host_objects.add(host)
    }

    pub fn remove_host_object(&self, key: usize) -> bool {
        self.host_objects.remove(key)
    }

    pub fn add_host_function(&self, func: &Arc<HostFunctionType>) -> usize {
        self.host_functions.add(func)
    }

    pub fn remove_host_function(&self, key: usize) -> bool {
        self.host_functions.remove(key)
    }

    /// A function created on first use and reused for the lifetime of the
    /// runtime, keyed by `key`.
    pub fn shared_function(
        &self,
        rt: &dyn Runtime,
        key: &'static str,
        create: impl FnOnce() -> Option<Function>,
    ) -> Option<Function> {
        if let Some(func) = self.shared_functions.borrow().get(key) {
            return Some(func.clone_in(rt));
        }
        let func = create()?;
        let copy = func.clone_in(rt);
        self.shared_functions.borrow_mut().insert(key, func);
        Some(copy)
    }

    pub fn set_exception_handler(&self, handler: Rc<dyn JsiExceptionHandler>) {
        *self.exception_handler.borrow_mut() = handler;
    }

    /// Forward an exception to the installed handler.
    pub fn report(&self, exception: &JsiNativeException) {
        let handler = Rc::clone(&self.exception_handler.borrow());
        handler.on_jsi_exception(exception);
    }

    pub fn inspector(&self) -> Rc<dyn InspectorRuntimeObserver> {
        Rc::clone(&self.inspector.borrow())
    }

    pub(crate) fn replace_inspector(&self, observer: Rc<dyn InspectorRuntimeObserver>) -> Rc<dyn InspectorRuntimeObserver> {
        std::mem::replace(&mut *self.inspector.borrow_mut(), observer)
    }
}

/// A JavaScript engine behind the handle-based value model.
///
/// Handles (`Value`, `Object`, ...) are created by one runtime and must only
/// be passed back to that runtime. Runtimes are single-threaded.
///
/// Accessors fail softly: when the engine raises, the exception is reported
/// through [`Runtime::report_jsi_exception`] and the accessor returns `None`,
/// `false` or an empty result.
pub trait Runtime {
    fn core(&self) -> &RuntimeCore;

    fn kind(&self) -> RuntimeKind;

    /// Human-readable engine name and version.
    fn description(&self) -> String;

    fn gc_behavior(&self) -> GcBehavior;

    // Evaluation

    fn evaluate_javascript(&self, buffer: Arc<dyn Buffer>, source_url: &str) -> JsiResult<Value>;

    fn evaluate_javascript_bytecode(&self, _bytecode: Arc<dyn Buffer>, source_url: &str) -> JsiResult<Value> {
        Err(JsiNativeException::unsupported(format!(
            "Evaluating bytecode for '{source_url}'"
        )))
    }

    fn prepare_javascript(
        &self,
        buffer: Arc<dyn Buffer>,
        source_url: &str,
    ) -> JsiResult<Arc<dyn PreparedJavaScript>> {
        Ok(Arc::new(SourceJavaScriptPreparation::new(buffer, source_url)))
    }

    fn evaluate_prepared_javascript(&self, prepared: &Arc<dyn PreparedJavaScript>) -> JsiResult<Value> {
        match prepared.as_any().downcast_ref::<SourceJavaScriptPreparation>() {
            Some(source) => self.evaluate_javascript(Arc::clone(source.buffer()), source.source_url()),
            None => Err(JsiNativeException::new(format!(
                "'{}' was prepared by a different runtime",
                prepared.source_url()
            ))),
        }
    }

    fn global(&self) -> Object;

    // Handle duplication

    fn clone_symbol(&self, pv: &dyn PointerValue) -> Option<Box<dyn PointerValue>>;

    fn clone_string(&self, pv: &dyn PointerValue) -> Option<Box<dyn PointerValue>>;

    fn clone_object(&self, pv: &dyn PointerValue) -> Option<Box<dyn PointerValue>>;

    fn clone_prop_name_id(&self, pv: &dyn PointerValue) -> Option<Box<dyn PointerValue>>;

    // Keys, strings and symbols

    fn create_prop_name_id_from_ascii(&self, ascii: &str) -> PropNameId {
        self.create_prop_name_id_from_utf8(ascii.as_bytes())
    }

    fn create_prop_name_id_from_utf8(&self, utf8: &[u8]) -> PropNameId;

    fn create_prop_name_id_from_string(&self, string: &JsString) -> PropNameId;

    fn create_prop_name_id_from_symbol(&self, symbol: &Symbol) -> PropNameId;

    fn prop_name_id_to_utf8(&self, id: &PropNameId) -> String;

    fn compare_prop_name_ids(&self, a: &PropNameId, b: &PropNameId) -> bool;

    fn symbol_to_string(&self, symbol: &Symbol) -> String;

    fn create_string_from_ascii(&self, ascii: &str) -> JsString {
        self.create_string_from_utf8(ascii.as_bytes())
    }

    fn create_string_from_utf8(&self, utf8: &[u8]) -> JsString;

    fn string_to_utf8(&self, string: &JsString) -> String;

    fn create_big_int(&self, digits: &str) -> Option<crate::bigint::BigInt>;

    /// Parse JSON. Backends without a native parser can delegate to
    /// [`crate::json::parse_json_utf8`].
    fn create_value_from_json_utf8(&self, json: &[u8]) -> Option<Value>;

    // Objects

    fn create_object(&self) -> Object;

    fn create_object_from_host_object(&self, host: Arc<dyn HostObject>) -> Option<Object>;

    fn get_host_object(&self, object: &Object) -> Option<Arc<dyn HostObject>>;

    fn get_host_function(&self, func: &Function) -> Option<Arc<HostFunctionType>>;

    fn get_property(&self, object: &Object, name: &PropNameId) -> Option<Value>;

    fn get_property_by_str(&self, object: &Object, name: &str) -> Option<Value>;

    fn has_property(&self, object: &Object, name: &PropNameId) -> bool;

    fn has_property_by_str(&self, object: &Object, name: &str) -> bool;

    fn set_property_value(&self, object: &Object, name: &PropNameId, value: &Value) -> bool;

    fn set_property_value_by_str(&self, object: &Object, name: &str, value: &Value) -> bool;

    fn get_property_names(&self, object: &Object) -> Option<Array>;

    fn is_array(&self, object: &Object) -> bool;

    fn is_array_buffer(&self, object: &Object) -> bool;

    fn is_function(&self, object: &Object) -> bool;

    fn is_host_object(&self, object: &Object) -> bool;

    fn is_host_function(&self, func: &Function) -> bool;

    /// A portable BigInt object, or an engine-native bigint on backends that
    /// hand those out.
    fn is_big_int(&self, object: &Object) -> bool {
        self.has_property_by_str(object, crate::bigint::DIGITS_PROPERTY)
    }

    // Arrays and buffers

    fn create_array(&self, length: usize) -> Option<Array>;

    fn array_size(&self, array: &Array) -> usize;

    fn get_value_at_index(&self, array: &Array, index: usize) -> Option<Value>;

    fn set_value_at_index(&self, array: &Array, index: usize, value: &Value) -> bool;

    fn create_array_buffer_copy(&self, data: &[u8]) -> Option<ArrayBuffer>;

    fn create_array_buffer_no_copy(&self, data: Vec<u8>) -> Option<ArrayBuffer>;

    fn array_buffer_size(&self, buffer: &ArrayBuffer) -> usize;

    fn array_buffer_data(&self, buffer: &ArrayBuffer) -> *mut u8;

    // Functions

    fn create_function_from_host_function(
        &self,
        name: &PropNameId,
        param_count: u32,
        func: Arc<HostFunctionType>,
    ) -> Option<Function>;

    fn call(&self, func: &Function, this: &Value, args: &[Value]) -> Option<Value>;

    fn call_as_constructor(&self, func: &Function, args: &[Value]) -> Option<Value>;

    // Scopes

    fn push_scope(&self) -> Option<ScopeState> {
        None
    }

    fn pop_scope(&self, _state: Option<ScopeState>) {}

    // Identity

    fn strict_equals_symbol(&self, a: &Symbol, b: &Symbol) -> bool;

    fn strict_equals_string(&self, a: &JsString, b: &JsString) -> bool;

    fn strict_equals_object(&self, a: &Object, b: &Object) -> bool;

    fn instance_of(&self, object: &Object, ctor: &Function) -> Option<bool>;

    // Memory

    fn request_gc(&self);

    fn request_gc_for_testing(&self) {
        self.request_gc();
    }

    // Diagnostics

    fn report_jsi_exception(&self, exception: &JsiNativeException) {
        self.core().report(exception);
    }

    fn set_exception_handler(&self, handler: Rc<dyn JsiExceptionHandler>) {
        self.core().set_exception_handler(handler);
    }

    fn attach_inspector(&self, observer: Rc<dyn InspectorRuntimeObserver>) {
        observer.on_attached(&self.description());
        self.core().replace_inspector(observer).on_detached();
    }

    fn detach_inspector(&self) {
        self.core()
            .replace_inspector(Rc::new(NoopInspectorObserver))
            .on_detached();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_mark_destroyed_is_idempotent() {
        let core = RuntimeCore::new(RuntimeOptions::default());
        let flag = core.destroyed_flag();
        let payload: Arc<HostFunctionType> =
            Arc::new(|_: &dyn Runtime, _: &Value, _: &[Value]| -> JsiResult<Value> { Ok(Value::Undefined) });
        core.add_host_function(&payload);

        core.mark_destroyed();
        core.mark_destroyed();

        assert!(flag.load(Ordering::Acquire));
        assert!(core.host_functions().is_empty());
        assert_eq!(Arc::strong_count(&payload), 1);
    }

    #[test]
    fn test_report_uses_installed_handler() {
        let core = RuntimeCore::new(RuntimeOptions::default());
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        core.set_exception_handler(Rc::new(move |_: &JsiNativeException| counter.set(counter.get() + 1)));

        core.report(&JsiNativeException::new("one"));
        core.report(&JsiNativeException::new("two"));
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn test_runtime_kind_display() {
        assert_eq!(RuntimeKind::Jsvm.to_string(), "JSVM");
        assert_eq!(RuntimeKind::Jsc.to_string(), "JavaScriptCore");
    }
}

//! In-memory `Runtime` used to exercise the contract without an engine.
//!
//! Objects are reference counted. Host proxies are not released when their
//! object becomes unreachable; they are queued and run on the next
//! `request_gc`, the way a tracing collector finalizes them.

#![allow(dead_code)]

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use otter_jsi::{
    Array, ArrayBuffer, BigInt, Buffer, Function, GcBehavior, HostFunctionType, HostObject,
    HostObjectWrapper, JsString, JsiNativeException, JsiNativeExceptionCollector, JsiResult, Object,
    Pointer, PointerValue, PropNameId, Runtime, RuntimeCore, RuntimeKind, RuntimeOptions,
    ScopeState, Symbol, Value, bigint, jsi_frame, json,
};

pub struct SymbolData {
    description: String,
}

#[derive(Clone)]
enum Key {
    String(Rc<str>),
    Symbol(Rc<SymbolData>),
}

impl Key {
    fn same(&self, other: &Key) -> bool {
        match (self, other) {
            (Key::String(a), Key::String(b)) => a == b,
            (Key::Symbol(a), Key::Symbol(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Key::String(s) => Some(s),
            Key::Symbol(_) => None,
        }
    }
}

#[derive(Clone)]
enum Slot {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Symbol(Rc<SymbolData>),
    Object(Rc<TestObject>),
}

type Finalizers = RefCell<Vec<Box<dyn Any>>>;

enum ObjectKind {
    Plain,
    Array(RefCell<Vec<Slot>>),
    ArrayBuffer(RefCell<Vec<u8>>),
    HostObject(RefCell<Option<HostObjectWrapper<TestRuntime, dyn HostObject>>>),
    HostFunction(RefCell<Option<HostObjectWrapper<TestRuntime, HostFunctionType>>>),
}

struct TestObject {
    kind: ObjectKind,
    properties: RefCell<Vec<(Key, Slot)>>,
    proto: RefCell<Option<Rc<TestObject>>>,
    finalizers: Weak<Finalizers>,
}

impl TestObject {
    fn new(kind: ObjectKind, finalizers: &Rc<Finalizers>) -> Rc<TestObject> {
        Rc::new(TestObject {
            kind,
            properties: RefCell::new(Vec::new()),
            proto: RefCell::new(None),
            finalizers: Rc::downgrade(finalizers),
        })
    }

    fn own(&self, key: &Key) -> Option<Slot> {
        self.properties
            .borrow()
            .iter()
            .find(|(k, _)| k.same(key))
            .map(|(_, v)| v.clone())
    }

    fn lookup(&self, key: &Key) -> Option<Slot> {
        if let (ObjectKind::Array(items), Some("length")) = (&self.kind, key.as_str()) {
            return Some(Slot::Number(items.borrow().len() as f64));
        }
        if let Some(slot) = self.own(key) {
            return Some(slot);
        }
        let proto = self.proto.borrow().clone()?;
        proto.lookup(key)
    }

    fn write(&self, key: Key, slot: Slot) {
        let mut properties = self.properties.borrow_mut();
        match properties.iter_mut().find(|(k, _)| k.same(&key)) {
            Some((_, existing)) => *existing = slot,
            None => properties.push((key, slot)),
        }
    }
}

impl Drop for TestObject {
    fn drop(&mut self) {
        let proxy: Option<Box<dyn Any>> = match &self.kind {
            ObjectKind::HostObject(wrapper) => wrapper
                .borrow_mut()
                .take()
                .map(|w| Box::new(w) as Box<dyn Any>),
            ObjectKind::HostFunction(wrapper) => wrapper
                .borrow_mut()
                .take()
                .map(|w| Box::new(w) as Box<dyn Any>),
            _ => None,
        };
        if let (Some(proxy), Some(queue)) = (proxy, self.finalizers.upgrade()) {
            queue.borrow_mut().push(proxy);
        }
    }
}

struct TestPointer {
    slot: Slot,
    live: Rc<Cell<usize>>,
}

impl PointerValue for TestPointer {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for TestPointer {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

pub struct TestRuntime {
    core: RuntimeCore,
    self_weak: Weak<TestRuntime>,
    global: Rc<TestObject>,
    finalizers: Rc<Finalizers>,
    live_handles: Rc<Cell<usize>>,
    scope_depth: Cell<usize>,
    gc_runs: Cell<usize>,
    evaluated: RefCell<Vec<String>>,
}

impl TestRuntime {
    pub fn new() -> Rc<TestRuntime> {
        Self::with_options(RuntimeOptions::default())
    }

    pub fn with_options(options: RuntimeOptions) -> Rc<TestRuntime> {
        let runtime = Rc::new_cyclic(|weak| {
            let finalizers = Rc::new(RefCell::new(Vec::new()));
            TestRuntime {
                core: RuntimeCore::new(options),
                self_weak: weak.clone(),
                global: TestObject::new(ObjectKind::Plain, &finalizers),
                finalizers,
                live_handles: Rc::new(Cell::new(0)),
                scope_depth: Cell::new(0),
                gc_runs: Cell::new(0),
                evaluated: RefCell::new(Vec::new()),
            }
        });
        runtime.install_globals();
        runtime
    }

    fn install_globals(&self) {
        let string = Function::from_closure(self, "String", 1, |rt, _this, args| {
            let text = match args.first() {
                None => String::new(),
                Some(Value::Undefined) => "undefined".into(),
                Some(Value::Null) => "null".into(),
                Some(Value::Bool(b)) => b.to_string(),
                Some(Value::Number(n)) => format_number(*n),
                Some(Value::String(s)) => s.utf8(rt),
                Some(Value::Symbol(s)) => s.to_string(rt),
                Some(Value::Object(_)) => "[object Object]".into(),
            };
            Ok(Value::from_utf8(rt, &text))
        });
        if let Some(string) = string {
            self.global().set_property(self, "String", &string.into());
        }
    }

    /// Number of live handles created by this runtime.
    pub fn live_handles(&self) -> usize {
        self.live_handles.get()
    }

    /// Host proxies waiting for the next collection.
    pub fn pending_finalizers(&self) -> usize {
        self.finalizers.borrow().len()
    }

    pub fn scope_depth(&self) -> usize {
        self.scope_depth.get()
    }

    pub fn gc_runs(&self) -> usize {
        self.gc_runs.get()
    }

    pub fn evaluated_sources(&self) -> Vec<String> {
        self.evaluated.borrow().clone()
    }

    pub fn create_symbol(&self, description: &str) -> Symbol {
        let data = Rc::new(SymbolData {
            description: description.to_string(),
        });
        Symbol::from_value(self.pointer(Slot::Symbol(data)))
    }

    fn run_finalizers(&self) -> usize {
        let pending = std::mem::take(&mut *self.finalizers.borrow_mut());
        let count = pending.len();
        drop(pending);
        count
    }

    fn pointer(&self, slot: Slot) -> Box<dyn PointerValue> {
        self.live_handles.set(self.live_handles.get() + 1);
        Box::new(TestPointer {
            slot,
            live: Rc::clone(&self.live_handles),
        })
    }

    fn wrap(&self, slot: Slot) -> Value {
        match slot {
            Slot::Undefined => Value::Undefined,
            Slot::Null => Value::Null,
            Slot::Bool(b) => Value::Bool(b),
            Slot::Number(n) => Value::Number(n),
            heap @ Slot::String(_) => Value::String(JsString::from_value(self.pointer(heap))),
            heap @ Slot::Symbol(_) => Value::Symbol(Symbol::from_value(self.pointer(heap))),
            heap @ Slot::Object(_) => Value::Object(Object::from_value(self.pointer(heap))),
        }
    }

    fn wrap_object(&self, object: Rc<TestObject>) -> Object {
        Object::from_value(self.pointer(Slot::Object(object)))
    }

    fn slot_of(pointer: &Pointer) -> Option<Slot> {
        pointer.downcast::<TestPointer>().map(|p| p.slot.clone())
    }

    fn unwrap(&self, value: &Value) -> Option<Slot> {
        match value {
            Value::Undefined => Some(Slot::Undefined),
            Value::Null => Some(Slot::Null),
            Value::Bool(b) => Some(Slot::Bool(*b)),
            Value::Number(n) => Some(Slot::Number(*n)),
            Value::String(s) => Self::slot_of(s.pointer()),
            Value::Symbol(s) => Self::slot_of(s.pointer()),
            Value::Object(o) => Self::slot_of(o.pointer()),
        }
    }

    fn object_of(&self, object: &Object) -> Option<Rc<TestObject>> {
        match Self::slot_of(object.pointer())? {
            Slot::Object(o) => Some(o),
            _ => None,
        }
    }

    fn key_of(&self, name: &PropNameId) -> Option<Key> {
        match Self::slot_of(name.pointer())? {
            Slot::String(s) => Some(Key::String(s)),
            Slot::Symbol(s) => Some(Key::Symbol(s)),
            _ => None,
        }
    }

    fn host_object_of(&self, object: &TestObject) -> Option<Arc<dyn HostObject>> {
        let ObjectKind::HostObject(wrapper) = &object.kind else {
            return None;
        };
        let (_, host) = wrapper.borrow().as_ref()?.get_runtime_and_host()?;
        Some(host)
    }

    fn host_function_of(&self, object: &TestObject) -> Option<Arc<HostFunctionType>> {
        let ObjectKind::HostFunction(wrapper) = &object.kind else {
            return None;
        };
        let (_, func) = wrapper.borrow().as_ref()?.get_runtime_and_host()?;
        Some(func)
    }

    fn invoke(&self, target: &TestObject, this: &Value, args: &[Value]) -> Option<Value> {
        let Some(func) = self.host_function_of(target) else {
            self.report_jsi_exception(&JsiNativeException::js_error(
                "TypeError",
                "value is not a function",
                "",
            ));
            return None;
        };

        let scope = JsiNativeExceptionCollector::scope();
        let result = (*func)(self, this, args);
        let pending = scope.take();
        drop(scope);

        let outcome = match (result, pending) {
            (Err(err), _) | (Ok(_), Some(err)) => Err(err),
            (Ok(value), None) => Ok(value),
        };
        match outcome {
            Ok(value) => Some(value),
            Err(err) => {
                let err = jsi_frame!(err);
                self.report_jsi_exception(&err);
                if self.core.options().rethrow_native_exceptions {
                    None
                } else {
                    Some(Value::Undefined)
                }
            }
        }
    }

    fn proto_of(&self, ctor: &TestObject) -> Option<Rc<TestObject>> {
        match ctor.own(&Key::String(Rc::from("prototype")))? {
            Slot::Object(proto) => Some(proto),
            _ => None,
        }
    }
}

impl Drop for TestRuntime {
    fn drop(&mut self) {
        self.core.mark_destroyed();
        self.global.properties.borrow_mut().clear();
    }
}

impl Runtime for TestRuntime {
    fn core(&self) -> &RuntimeCore {
        &self.core
    }

    fn kind(&self) -> RuntimeKind {
        RuntimeKind::Custom
    }

    fn description(&self) -> String {
        "TestRuntime".to_string()
    }

    fn gc_behavior(&self) -> GcBehavior {
        GcBehavior::Synchronous
    }

    /// Understands sums of numeric literals only.
    fn evaluate_javascript(&self, buffer: Arc<dyn Buffer>, source_url: &str) -> JsiResult<Value> {
        let source = std::str::from_utf8(buffer.data())
            .map_err(|e| JsiNativeException::new(format!("Source is not UTF-8: {e}")))?;
        self.evaluated.borrow_mut().push(source_url.to_string());
        self.core.inspector().on_script_evaluated(source_url);

        let terms: Option<Vec<f64>> = source
            .trim()
            .trim_end_matches(';')
            .split('+')
            .map(|term| term.trim().parse::<f64>().ok())
            .collect();
        match terms {
            Some(terms) => Ok(Value::Number(terms.into_iter().sum())),
            None => Err(JsiNativeException::js_error(
                "SyntaxError",
                "Unexpected token",
                format!("at {source_url}:1:1"),
            )),
        }
    }

    fn global(&self) -> Object {
        self.wrap_object(Rc::clone(&self.global))
    }

    fn clone_symbol(&self, pv: &dyn PointerValue) -> Option<Box<dyn PointerValue>> {
        let slot = pv.as_any().downcast_ref::<TestPointer>()?.slot.clone();
        Some(self.pointer(slot))
    }

    fn clone_string(&self, pv: &dyn PointerValue) -> Option<Box<dyn PointerValue>> {
        self.clone_symbol(pv)
    }

    fn clone_object(&self, pv: &dyn PointerValue) -> Option<Box<dyn PointerValue>> {
        self.clone_symbol(pv)
    }

    fn clone_prop_name_id(&self, pv: &dyn PointerValue) -> Option<Box<dyn PointerValue>> {
        self.clone_symbol(pv)
    }

    fn create_prop_name_id_from_utf8(&self, utf8: &[u8]) -> PropNameId {
        let text = String::from_utf8_lossy(utf8);
        PropNameId::from_value(self.pointer(Slot::String(Rc::from(text.as_ref()))))
    }

    fn create_prop_name_id_from_string(&self, string: &JsString) -> PropNameId {
        PropNameId::from_pointer(Pointer::from_option(
            Self::slot_of(string.pointer()).map(|slot| self.pointer(slot)),
        ))
    }

    fn create_prop_name_id_from_symbol(&self, symbol: &Symbol) -> PropNameId {
        PropNameId::from_pointer(Pointer::from_option(
            Self::slot_of(symbol.pointer()).map(|slot| self.pointer(slot)),
        ))
    }

    fn prop_name_id_to_utf8(&self, id: &PropNameId) -> String {
        match self.key_of(id) {
            Some(Key::String(s)) => s.to_string(),
            Some(Key::Symbol(s)) => s.description.clone(),
            None => String::new(),
        }
    }

    fn compare_prop_name_ids(&self, a: &PropNameId, b: &PropNameId) -> bool {
        match (self.key_of(a), self.key_of(b)) {
            (Some(a), Some(b)) => a.same(&b),
            _ => false,
        }
    }

    fn symbol_to_string(&self, symbol: &Symbol) -> String {
        match Self::slot_of(symbol.pointer()) {
            Some(Slot::Symbol(data)) => format!("Symbol({})", data.description),
            _ => String::new(),
        }
    }

    fn create_string_from_utf8(&self, utf8: &[u8]) -> JsString {
        let text = String::from_utf8_lossy(utf8);
        JsString::from_value(self.pointer(Slot::String(Rc::from(text.as_ref()))))
    }

    fn string_to_utf8(&self, string: &JsString) -> String {
        match Self::slot_of(string.pointer()) {
            Some(Slot::String(s)) => s.to_string(),
            _ => String::new(),
        }
    }

    fn create_big_int(&self, digits: &str) -> Option<BigInt> {
        bigint::create_big_int_object(self, digits).map(BigInt::from_object_unchecked)
    }

    fn create_value_from_json_utf8(&self, utf8: &[u8]) -> Option<Value> {
        json::parse_json_utf8(self, utf8)
    }

    fn create_object(&self) -> Object {
        self.wrap_object(TestObject::new(ObjectKind::Plain, &self.finalizers))
    }

    fn create_object_from_host_object(&self, host: Arc<dyn HostObject>) -> Option<Object> {
        let runtime = self.self_weak.upgrade()?;
        let wrapper = HostObjectWrapper::new(&runtime, &host);
        let object = TestObject::new(
            ObjectKind::HostObject(RefCell::new(Some(wrapper))),
            &self.finalizers,
        );
        Some(self.wrap_object(object))
    }

    fn get_host_object(&self, object: &Object) -> Option<Arc<dyn HostObject>> {
        let target = self.object_of(object)?;
        self.host_object_of(&target)
    }

    fn get_host_function(&self, func: &Function) -> Option<Arc<HostFunctionType>> {
        let target = self.object_of(func)?;
        self.host_function_of(&target)
    }

    fn get_property(&self, object: &Object, name: &PropNameId) -> Option<Value> {
        let target = self.object_of(object)?;
        if let ObjectKind::HostObject(_) = &target.kind {
            let host = self.host_object_of(&target)?;
            let scope = JsiNativeExceptionCollector::scope();
            let value = host.get(self, name);
            if let Some(err) = scope.take() {
                self.report_jsi_exception(&err);
                return None;
            }
            return Some(value);
        }
        let key = self.key_of(name)?;
        Some(self.wrap(target.lookup(&key).unwrap_or(Slot::Undefined)))
    }

    fn get_property_by_str(&self, object: &Object, name: &str) -> Option<Value> {
        self.get_property(object, &PropNameId::for_utf8(self, name))
    }

    fn has_property(&self, object: &Object, name: &PropNameId) -> bool {
        let Some(target) = self.object_of(object) else {
            return false;
        };
        if let Some(host) = self.host_object_of(&target) {
            return host
                .get_property_names(self)
                .iter()
                .any(|candidate| PropNameId::compare(self, candidate, name));
        }
        self.key_of(name)
            .is_some_and(|key| target.lookup(&key).is_some())
    }

    fn has_property_by_str(&self, object: &Object, name: &str) -> bool {
        self.has_property(object, &PropNameId::for_utf8(self, name))
    }

    fn set_property_value(&self, object: &Object, name: &PropNameId, value: &Value) -> bool {
        let Some(target) = self.object_of(object) else {
            return false;
        };
        if let ObjectKind::HostObject(_) = &target.kind {
            let Some(host) = self.host_object_of(&target) else {
                return false;
            };
            return match host.set(self, name, value) {
                Ok(()) => true,
                Err(err) => {
                    self.report_jsi_exception(&err);
                    false
                }
            };
        }
        match (self.key_of(name), self.unwrap(value)) {
            (Some(key), Some(slot)) => {
                target.write(key, slot);
                true
            }
            _ => false,
        }
    }

    fn set_property_value_by_str(&self, object: &Object, name: &str, value: &Value) -> bool {
        self.set_property_value(object, &PropNameId::for_utf8(self, name), value)
    }

    fn get_property_names(&self, object: &Object) -> Option<Array> {
        let target = self.object_of(object)?;
        let names: Vec<Value> = match &target.kind {
            ObjectKind::HostObject(_) => self
                .host_object_of(&target)?
                .get_property_names(self)
                .iter()
                .map(|id| Value::from_utf8(self, &id.utf8(self)))
                .collect(),
            ObjectKind::Array(items) => (0..items.borrow().len())
                .map(|index| Value::from_utf8(self, &index.to_string()))
                .collect(),
            _ => target
                .properties
                .borrow()
                .iter()
                .filter_map(|(key, _)| key.as_str().map(str::to_string))
                .map(|name| Value::from_utf8(self, &name))
                .collect(),
        };
        Array::create_with_elements(self, &names)
    }

    fn is_array(&self, object: &Object) -> bool {
        self.object_of(object)
            .is_some_and(|o| matches!(o.kind, ObjectKind::Array(_)))
    }

    fn is_array_buffer(&self, object: &Object) -> bool {
        self.object_of(object)
            .is_some_and(|o| matches!(o.kind, ObjectKind::ArrayBuffer(_)))
    }

    fn is_function(&self, object: &Object) -> bool {
        self.object_of(object)
            .is_some_and(|o| matches!(o.kind, ObjectKind::HostFunction(_)))
    }

    fn is_host_object(&self, object: &Object) -> bool {
        self.object_of(object)
            .is_some_and(|o| matches!(o.kind, ObjectKind::HostObject(_)))
    }

    fn is_host_function(&self, func: &Function) -> bool {
        self.is_function(func)
    }

    fn create_array(&self, length: usize) -> Option<Array> {
        let items = vec![Slot::Undefined; length];
        let object = TestObject::new(ObjectKind::Array(RefCell::new(items)), &self.finalizers);
        Some(self.wrap_object(object).get_array(self))
    }

    fn array_size(&self, array: &Array) -> usize {
        match self.object_of(array).as_deref().map(|o| &o.kind) {
            Some(ObjectKind::Array(items)) => items.borrow().len(),
            _ => 0,
        }
    }

    fn get_value_at_index(&self, array: &Array, index: usize) -> Option<Value> {
        let target = self.object_of(array)?;
        let ObjectKind::Array(items) = &target.kind else {
            return None;
        };
        let slot = items.borrow().get(index).cloned().unwrap_or(Slot::Undefined);
        Some(self.wrap(slot))
    }

    fn set_value_at_index(&self, array: &Array, index: usize, value: &Value) -> bool {
        let (Some(target), Some(slot)) = (self.object_of(array), self.unwrap(value)) else {
            return false;
        };
        let ObjectKind::Array(items) = &target.kind else {
            return false;
        };
        let mut items = items.borrow_mut();
        if index >= items.len() {
            items.resize(index + 1, Slot::Undefined);
        }
        items[index] = slot;
        true
    }

    fn create_array_buffer_copy(&self, data: &[u8]) -> Option<ArrayBuffer> {
        self.create_array_buffer_no_copy(data.to_vec())
    }

    fn create_array_buffer_no_copy(&self, data: Vec<u8>) -> Option<ArrayBuffer> {
        let object = TestObject::new(ObjectKind::ArrayBuffer(RefCell::new(data)), &self.finalizers);
        Some(self.wrap_object(object).get_array_buffer(self))
    }

    fn array_buffer_size(&self, buffer: &ArrayBuffer) -> usize {
        match self.object_of(buffer).as_deref().map(|o| &o.kind) {
            Some(ObjectKind::ArrayBuffer(bytes)) => bytes.borrow().len(),
            _ => 0,
        }
    }

    fn array_buffer_data(&self, buffer: &ArrayBuffer) -> *mut u8 {
        match self.object_of(buffer).as_deref().map(|o| &o.kind) {
            Some(ObjectKind::ArrayBuffer(bytes)) => bytes.borrow_mut().as_mut_ptr(),
            _ => std::ptr::null_mut(),
        }
    }

    fn create_function_from_host_function(
        &self,
        name: &PropNameId,
        param_count: u32,
        func: Arc<HostFunctionType>,
    ) -> Option<Function> {
        let runtime = self.self_weak.upgrade()?;
        let wrapper = HostObjectWrapper::new(&runtime, &func);
        let object = TestObject::new(
            ObjectKind::HostFunction(RefCell::new(Some(wrapper))),
            &self.finalizers,
        );
        object.write(
            Key::String(Rc::from("name")),
            Slot::String(Rc::from(name.utf8(self).as_str())),
        );
        object.write(Key::String(Rc::from("length")), Slot::Number(param_count.into()));
        object.write(
            Key::String(Rc::from("prototype")),
            Slot::Object(TestObject::new(ObjectKind::Plain, &self.finalizers)),
        );
        Some(self.wrap_object(object).get_function(self))
    }

    fn call(&self, func: &Function, this: &Value, args: &[Value]) -> Option<Value> {
        let target = self.object_of(func)?;
        self.invoke(&target, this, args)
    }

    fn call_as_constructor(&self, func: &Function, args: &[Value]) -> Option<Value> {
        let target = self.object_of(func)?;
        let instance = TestObject::new(ObjectKind::Plain, &self.finalizers);
        *instance.proto.borrow_mut() = self.proto_of(&target);
        let this = Value::Object(self.wrap_object(Rc::clone(&instance)));
        match self.invoke(&target, &this, args)? {
            result @ Value::Object(_) => Some(result),
            _ => Some(this),
        }
    }

    fn push_scope(&self) -> Option<ScopeState> {
        let depth = self.scope_depth.get() + 1;
        self.scope_depth.set(depth);
        Some(Box::new(depth))
    }

    fn pop_scope(&self, state: Option<ScopeState>) {
        let expected = state.and_then(|s| s.downcast::<usize>().ok()).map(|d| *d);
        assert_eq!(expected, Some(self.scope_depth.get()), "scopes popped out of order");
        self.scope_depth.set(self.scope_depth.get() - 1);
    }

    fn strict_equals_symbol(&self, a: &Symbol, b: &Symbol) -> bool {
        match (Self::slot_of(a.pointer()), Self::slot_of(b.pointer())) {
            (Some(Slot::Symbol(a)), Some(Slot::Symbol(b))) => Rc::ptr_eq(&a, &b),
            _ => false,
        }
    }

    fn strict_equals_string(&self, a: &JsString, b: &JsString) -> bool {
        match (Self::slot_of(a.pointer()), Self::slot_of(b.pointer())) {
            (Some(Slot::String(a)), Some(Slot::String(b))) => a == b,
            _ => false,
        }
    }

    fn strict_equals_object(&self, a: &Object, b: &Object) -> bool {
        match (self.object_of(a), self.object_of(b)) {
            (Some(a), Some(b)) => Rc::ptr_eq(&a, &b),
            _ => false,
        }
    }

    fn instance_of(&self, object: &Object, ctor: &Function) -> Option<bool> {
        let target = self.object_of(object)?;
        let ctor = self.object_of(ctor)?;
        let proto = self.proto_of(&ctor)?;
        let mut current = target.proto.borrow().clone();
        while let Some(candidate) = current {
            if Rc::ptr_eq(&candidate, &proto) {
                return Some(true);
            }
            current = candidate.proto.borrow().clone();
        }
        Some(false)
    }

    fn request_gc(&self) {
        self.gc_runs.set(self.gc_runs.get() + 1);
        while self.run_finalizers() > 0 {}
    }
}

//! Function handles and host-function creation.

use std::sync::Arc;

use crate::exception::JsiResult;
use crate::host::HostFunctionType;
use crate::object::{Object, object_subtype};
use crate::propnameid::PropNameId;
use crate::runtime::Runtime;
use crate::value::Value;

#[derive(Debug)]
pub struct Function {
    object: Object,
}

object_subtype!(Function);

impl Function {
    /// Expose a native callable to script.
    pub fn create_from_host_function(
        rt: &dyn Runtime,
        name: &PropNameId,
        param_count: u32,
        func: Arc<HostFunctionType>,
    ) -> Option<Function> {
        rt.create_function_from_host_function(name, param_count, func)
    }

    /// [`Function::create_from_host_function`] taking a closure and a plain name.
    pub fn from_closure<F>(rt: &dyn Runtime, name: &str, param_count: u32, func: F) -> Option<Function>
    where
        F: Fn(&dyn Runtime, &Value, &[Value]) -> JsiResult<Value> + 'static,
    {
        let name = PropNameId::for_utf8(rt, name);
        rt.create_function_from_host_function(&name, param_count, Arc::new(func))
    }

    /// Call with `this` bound to `undefined`.
    pub fn call(&self, rt: &dyn Runtime, args: &[Value]) -> Option<Value> {
        rt.call(self, &Value::Undefined, args)
    }

    pub fn call_with_this(&self, rt: &dyn Runtime, this: &Object, args: &[Value]) -> Option<Value> {
        let this = Value::Object(this.clone_in(rt));
        rt.call(self, &this, args)
    }

    /// `new f(...args)`.
    pub fn call_as_constructor(&self, rt: &dyn Runtime, args: &[Value]) -> Option<Value> {
        rt.call_as_constructor(self, args)
    }

    pub fn is_host_function(&self, rt: &dyn Runtime) -> bool {
        rt.is_host_function(self)
    }

    pub fn get_host_function(&self, rt: &dyn Runtime) -> Option<Arc<HostFunctionType>> {
        rt.get_host_function(self)
    }
}

//! Object handles and the checked/unchecked narrowing to subtypes.

use std::sync::Arc;

use crate::array::Array;
use crate::array_buffer::ArrayBuffer;
use crate::bigint::BigInt;
use crate::function::Function;
use crate::host::HostObject;
use crate::pointer::{Pointer, PointerValue};
use crate::propnameid::PropNameId;
use crate::runtime::Runtime;
use crate::value::Value;

/// A handle to an object in the engine heap.
#[derive(Debug)]
pub struct Object {
    pointer: Pointer,
}

impl Object {
    pub fn new(rt: &dyn Runtime) -> Object {
        rt.create_object()
    }

    pub fn from_pointer(pointer: Pointer) -> Self {
        Self { pointer }
    }

    pub fn from_value(value: Box<dyn PointerValue>) -> Self {
        Self::from_pointer(Pointer::new(value))
    }

    /// Wrap a native host object in an engine object.
    pub fn create_from_host_object(rt: &dyn Runtime, host: Arc<dyn HostObject>) -> Option<Object> {
        rt.create_object_from_host_object(host)
    }

    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    pub fn into_pointer(self) -> Pointer {
        self.pointer
    }

    pub fn clone_in(&self, rt: &dyn Runtime) -> Object {
        let cloned = self.pointer.get().and_then(|pv| rt.clone_object(pv));
        Object::from_pointer(Pointer::from_option(cloned))
    }

    pub fn strict_equals(rt: &dyn Runtime, a: &Object, b: &Object) -> bool {
        rt.strict_equals_object(a, b)
    }

    pub fn get_property(&self, rt: &dyn Runtime, name: &str) -> Option<Value> {
        rt.get_property_by_str(self, name)
    }

    pub fn get_property_by_id(&self, rt: &dyn Runtime, name: &PropNameId) -> Option<Value> {
        rt.get_property(self, name)
    }

    pub fn has_property(&self, rt: &dyn Runtime, name: &str) -> bool {
        rt.has_property_by_str(self, name)
    }

    pub fn has_property_by_id(&self, rt: &dyn Runtime, name: &PropNameId) -> bool {
        rt.has_property(self, name)
    }

    pub fn set_property(&self, rt: &dyn Runtime, name: &str, value: &Value) -> bool {
        rt.set_property_value_by_str(self, name, value)
    }

    pub fn set_property_by_id(&self, rt: &dyn Runtime, name: &PropNameId, value: &Value) -> bool {
        rt.set_property_value(self, name, value)
    }

    /// Enumerable own property names, as an array of strings.
    pub fn get_property_names(&self, rt: &dyn Runtime) -> Option<Array> {
        rt.get_property_names(self)
    }

    pub fn get_property_as_object(&self, rt: &dyn Runtime, name: &str) -> Option<Object> {
        self.get_property(rt, name)?.into_object()
    }

    pub fn get_property_as_function(&self, rt: &dyn Runtime, name: &str) -> Option<Function> {
        self.get_property_as_object(rt, name)?.into_function(rt)
    }

    pub fn is_array(&self, rt: &dyn Runtime) -> bool {
        rt.is_array(self)
    }

    pub fn is_array_buffer(&self, rt: &dyn Runtime) -> bool {
        rt.is_array_buffer(self)
    }

    pub fn is_function(&self, rt: &dyn Runtime) -> bool {
        rt.is_function(self)
    }

    pub fn is_big_int(&self, rt: &dyn Runtime) -> bool {
        rt.is_big_int(self)
    }

    pub fn is_host_object(&self, rt: &dyn Runtime) -> bool {
        rt.is_host_object(self)
    }

    pub fn get_host_object(&self, rt: &dyn Runtime) -> Option<Arc<dyn HostObject>> {
        rt.get_host_object(self)
    }

    pub fn instance_of(&self, rt: &dyn Runtime, ctor: &Function) -> Option<bool> {
        rt.instance_of(self, ctor)
    }

    /// Checked narrowing.
    pub fn into_array(self, rt: &dyn Runtime) -> Option<Array> {
        self.is_array(rt).then(|| Array::from_object(self))
    }

    /// Unchecked narrowing. The caller guarantees the shape.
    pub fn get_array(self, rt: &dyn Runtime) -> Array {
        debug_assert!(self.is_array(rt), "object is not an array");
        Array::from_object(self)
    }

    pub fn into_array_buffer(self, rt: &dyn Runtime) -> Option<ArrayBuffer> {
        self.is_array_buffer(rt).then(|| ArrayBuffer::from_object(self))
    }

    pub fn get_array_buffer(self, rt: &dyn Runtime) -> ArrayBuffer {
        debug_assert!(self.is_array_buffer(rt), "object is not an ArrayBuffer");
        ArrayBuffer::from_object(self)
    }

    pub fn into_function(self, rt: &dyn Runtime) -> Option<Function> {
        self.is_function(rt).then(|| Function::from_object(self))
    }

    pub fn get_function(self, rt: &dyn Runtime) -> Function {
        debug_assert!(self.is_function(rt), "object is not a function");
        Function::from_object(self)
    }

    pub fn into_big_int(self, rt: &dyn Runtime) -> Option<BigInt> {
        self.is_big_int(rt).then(|| BigInt::from_object(self))
    }
}

/// Implements `Deref<Target = Object>` and the object conversions for a
/// narrowed handle type.
macro_rules! object_subtype {
    ($name:ident) => {
        impl std::ops::Deref for $name {
            type Target = $crate::object::Object;

            fn deref(&self) -> &Self::Target {
                &self.object
            }
        }

        impl $name {
            pub(crate) fn from_object(object: $crate::object::Object) -> Self {
                Self { object }
            }

            pub fn into_object(self) -> $crate::object::Object {
                self.object
            }

            pub fn clone_in(&self, rt: &dyn $crate::runtime::Runtime) -> Self {
                Self::from_object(self.object.clone_in(rt))
            }
        }

        impl From<$name> for $crate::object::Object {
            fn from(value: $name) -> Self {
                value.object
            }
        }

        impl From<$name> for $crate::value::Value {
            fn from(value: $name) -> Self {
                $crate::value::Value::Object(value.object)
            }
        }
    };
}

pub(crate) use object_subtype;

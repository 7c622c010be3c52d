//! Array handles.

use crate::object::{Object, object_subtype};
use crate::runtime::Runtime;
use crate::value::Value;

#[derive(Debug)]
pub struct Array {
    object: Object,
}

object_subtype!(Array);

impl Array {
    pub fn new(rt: &dyn Runtime, length: usize) -> Option<Array> {
        rt.create_array(length)
    }

    pub fn create_with_elements(rt: &dyn Runtime, elements: &[Value]) -> Option<Array> {
        let array = rt.create_array(elements.len())?;
        for (index, element) in elements.iter().enumerate() {
            if !array.set_value_at_index(rt, index, element) {
                return None;
            }
        }
        Some(array)
    }

    pub fn size(&self, rt: &dyn Runtime) -> usize {
        rt.array_size(self)
    }

    pub fn get_value_at_index(&self, rt: &dyn Runtime, index: usize) -> Option<Value> {
        rt.get_value_at_index(self, index)
    }

    pub fn set_value_at_index(&self, rt: &dyn Runtime, index: usize, value: &Value) -> bool {
        rt.set_value_at_index(self, index, value)
    }

    /// Every element in order. Stops at the first element that cannot be read.
    pub fn to_vec(&self, rt: &dyn Runtime) -> Vec<Value> {
        (0..self.size(rt))
            .map_while(|index| self.get_value_at_index(rt, index))
            .collect()
    }
}

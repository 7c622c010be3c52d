//! Property keys.

use crate::pointer::{Pointer, PointerValue};
use crate::runtime::Runtime;
use crate::string::JsString;
use crate::symbol::Symbol;

/// An interned property key: either a string or a symbol.
#[derive(Debug)]
pub struct PropNameId {
    pointer: Pointer,
}

impl PropNameId {
    pub fn from_pointer(pointer: Pointer) -> Self {
        Self { pointer }
    }

    pub fn from_value(value: Box<dyn PointerValue>) -> Self {
        Self::from_pointer(Pointer::new(value))
    }

    pub fn for_ascii(rt: &dyn Runtime, ascii: &str) -> Self {
        debug_assert!(ascii.is_ascii(), "for_ascii called with non-ASCII input");
        rt.create_prop_name_id_from_ascii(ascii)
    }

    pub fn for_utf8(rt: &dyn Runtime, utf8: &str) -> Self {
        rt.create_prop_name_id_from_utf8(utf8.as_bytes())
    }

    pub fn for_string(rt: &dyn Runtime, string: &JsString) -> Self {
        rt.create_prop_name_id_from_string(string)
    }

    pub fn for_symbol(rt: &dyn Runtime, symbol: &Symbol) -> Self {
        rt.create_prop_name_id_from_symbol(symbol)
    }

    /// Build one key per name.
    pub fn names(rt: &dyn Runtime, names: &[&str]) -> Vec<PropNameId> {
        names.iter().map(|name| Self::for_utf8(rt, name)).collect()
    }

    pub fn utf8(&self, rt: &dyn Runtime) -> String {
        rt.prop_name_id_to_utf8(self)
    }

    pub fn compare(rt: &dyn Runtime, a: &PropNameId, b: &PropNameId) -> bool {
        rt.compare_prop_name_ids(a, b)
    }

    pub fn clone_in(&self, rt: &dyn Runtime) -> PropNameId {
        let cloned = self.pointer.get().and_then(|pv| rt.clone_prop_name_id(pv));
        PropNameId::from_pointer(Pointer::from_option(cloned))
    }

    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    pub fn into_pointer(self) -> Pointer {
        self.pointer
    }
}

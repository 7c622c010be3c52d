//! Engine symbol handles.

use crate::pointer::{Pointer, PointerValue};
use crate::runtime::Runtime;

/// A handle to a symbol in the engine heap.
#[derive(Debug)]
pub struct Symbol {
    pointer: Pointer,
}

impl Symbol {
    pub fn from_pointer(pointer: Pointer) -> Self {
        Self { pointer }
    }

    pub fn from_value(value: Box<dyn PointerValue>) -> Self {
        Self::from_pointer(Pointer::new(value))
    }

    /// `Symbol(description).toString()`, e.g. `Symbol(foo)`.
    pub fn to_string(&self, rt: &dyn Runtime) -> String {
        rt.symbol_to_string(self)
    }

    pub fn strict_equals(rt: &dyn Runtime, a: &Symbol, b: &Symbol) -> bool {
        rt.strict_equals_symbol(a, b)
    }

    pub fn clone_in(&self, rt: &dyn Runtime) -> Symbol {
        let cloned = self.pointer.get().and_then(|pv| rt.clone_symbol(pv));
        Symbol::from_pointer(Pointer::from_option(cloned))
    }

    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    pub fn into_pointer(self) -> Pointer {
        self.pointer
    }
}

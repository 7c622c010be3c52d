//! Lexical handle scopes.

use crate::runtime::{Runtime, ScopeState};

/// Bounds the lifetime of temporary engine handles created while it is
/// alive. A hint only: handles owned by `Value`s stay valid after the scope
/// closes, and backends without scopes ignore it.
pub struct Scope<'rt> {
    rt: &'rt dyn Runtime,
    state: Option<ScopeState>,
}

impl<'rt> Scope<'rt> {
    pub fn new(rt: &'rt dyn Runtime) -> Self {
        Self {
            rt,
            state: rt.push_scope(),
        }
    }

    /// Run `f` inside a fresh scope.
    pub fn call_with<T>(rt: &'rt dyn Runtime, f: impl FnOnce(&dyn Runtime) -> T) -> T {
        let _scope = Scope::new(rt);
        f(rt)
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        self.rt.pop_scope(self.state.take());
    }
}

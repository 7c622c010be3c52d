//! Thread-local accumulation of native exceptions.
//!
//! Host-function trampolines open a [`CollectorScope`] around each call into
//! native code. Code deep inside the call can record an error with
//! [`JsiNativeExceptionCollector::throw_exception`] instead of threading a
//! `Result` through every frame; the trampoline inspects the scope when the
//! call returns.

use std::cell::RefCell;
use std::marker::PhantomData;

use crate::exception::JsiNativeException;

thread_local! {
    static SCOPES: RefCell<Vec<Option<JsiNativeException>>> = const { RefCell::new(Vec::new()) };
}

/// Entry points for the per-thread collector stack.
pub struct JsiNativeExceptionCollector;

impl JsiNativeExceptionCollector {
    /// Push a new collection scope. It is popped when the guard drops.
    pub fn scope() -> CollectorScope {
        let depth = SCOPES.with(|scopes| {
            let mut scopes = scopes.borrow_mut();
            scopes.push(None);
            scopes.len()
        });
        CollectorScope {
            depth,
            _not_send: PhantomData,
        }
    }

    /// Record an exception in the innermost scope.
    ///
    /// The first exception recorded in a scope wins; later ones are logged
    /// and dropped. Returns `false` when there is no open scope, in which
    /// case the exception is lost.
    pub fn throw_exception(exception: JsiNativeException) -> bool {
        SCOPES.with(|scopes| {
            let mut scopes = scopes.borrow_mut();
            let Some(slot) = scopes.last_mut() else {
                tracing::error!(error = %exception, "native exception thrown outside a collector scope");
                return false;
            };
            if let Some(existing) = slot.as_ref() {
                tracing::warn!(
                    kept = %existing,
                    dropped = %exception,
                    "native exception already pending in scope"
                );
            } else {
                *slot = Some(exception);
            }
            true
        })
    }

    /// Whether the innermost scope holds an exception.
    pub fn has_exception() -> bool {
        SCOPES.with(|scopes| matches!(scopes.borrow().last(), Some(Some(_))))
    }

    /// Number of open scopes on this thread.
    pub fn depth() -> usize {
        SCOPES.with(|scopes| scopes.borrow().len())
    }
}

/// Guard for one collector scope. `!Send`: scopes belong to the thread that
/// opened them.
#[must_use = "the scope is popped as soon as the guard is dropped"]
pub struct CollectorScope {
    depth: usize,
    _not_send: PhantomData<*mut ()>,
}

impl CollectorScope {
    pub fn has_exception(&self) -> bool {
        SCOPES.with(|scopes| matches!(scopes.borrow().get(self.depth - 1), Some(Some(_))))
    }

    /// Take the exception recorded in this scope, if any.
    pub fn take(&self) -> Option<JsiNativeException> {
        SCOPES.with(|scopes| {
            scopes
                .borrow_mut()
                .get_mut(self.depth - 1)
                .and_then(Option::take)
        })
    }
}

impl Drop for CollectorScope {
    fn drop(&mut self) {
        let leftover = SCOPES.with(|scopes| {
            let mut scopes = scopes.borrow_mut();
            if scopes.len() != self.depth {
                tracing::warn!(
                    expected = self.depth,
                    actual = scopes.len(),
                    "collector scopes dropped out of order"
                );
            }
            let leftover = scopes.get_mut(self.depth - 1).and_then(Option::take);
            scopes.truncate(self.depth - 1);
            leftover
        });

        if let Some(exception) = leftover {
            tracing::error!(error = %exception, "native exception left unhandled in collector scope");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throw_without_scope_is_lost() {
        assert_eq!(JsiNativeExceptionCollector::depth(), 0);
        assert!(!JsiNativeExceptionCollector::throw_exception(JsiNativeException::new("lost")));
    }

    #[test]
    fn test_first_exception_wins() {
        let scope = JsiNativeExceptionCollector::scope();
        JsiNativeExceptionCollector::throw_exception(JsiNativeException::new("first"));
        JsiNativeExceptionCollector::throw_exception(JsiNativeException::new("second"));

        assert!(scope.has_exception());
        assert_eq!(scope.take().map(|e| e.message().to_string()), Some("first".into()));
        assert!(!scope.has_exception());
    }

    #[test]
    fn test_nested_scopes_are_independent() {
        let outer = JsiNativeExceptionCollector::scope();
        {
            let inner = JsiNativeExceptionCollector::scope();
            assert_eq!(JsiNativeExceptionCollector::depth(), 2);
            JsiNativeExceptionCollector::throw_exception(JsiNativeException::new("inner"));
            assert!(inner.has_exception());
            assert!(!outer.has_exception());
            assert!(inner.take().is_some());
        }
        assert_eq!(JsiNativeExceptionCollector::depth(), 1);
        assert!(!JsiNativeExceptionCollector::has_exception());
        drop(outer);
        assert_eq!(JsiNativeExceptionCollector::depth(), 0);
    }
}

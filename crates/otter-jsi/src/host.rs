//! Native objects and functions exposed to script.
//!
//! The engine owns a proxy for every exposed payload. The proxy holds a
//! [`HostObjectWrapper`]: a weak reference to the runtime, a weak reference
//! to the payload and a snapshot of the runtime's destroyed flag. The strong
//! reference to the payload lives in the runtime's registry so that the
//! payload outlives any script reference but never the runtime itself.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak as RcWeak};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::exception::{JsiNativeException, JsiResult};
use crate::propnameid::PropNameId;
use crate::runtime::{Runtime, RuntimeCore};
use crate::value::Value;

/// Signature of a native function callable from script: runtime, `this`,
/// arguments.
pub type HostFunctionType = dyn Fn(&dyn Runtime, &Value, &[Value]) -> JsiResult<Value>;

/// A native object whose properties are served by Rust code.
pub trait HostObject: 'static {
    /// Read a property. Unknown properties are `undefined`. Errors are
    /// raised through the native exception collector.
    fn get(&self, _rt: &dyn Runtime, _name: &PropNameId) -> Value {
        Value::Undefined
    }

    /// Write a property. The default rejects every assignment.
    fn set(&self, rt: &dyn Runtime, name: &PropNameId, _value: &Value) -> JsiResult<()> {
        Err(JsiNativeException::new(format!(
            "Cannot assign to property '{}' on HostObject with default setter",
            name.utf8(rt)
        ))
        .with_name("TypeError"))
    }

    /// Names reported by `Object.keys` and `for...in`.
    fn get_property_names(&self, _rt: &dyn Runtime) -> Vec<PropNameId> {
        Vec::new()
    }
}

/// Strong references to live payloads, keyed by payload address.
///
/// A payload bound more than once stays registered until its last binding
/// is released.
pub struct HostRegistry<H: ?Sized> {
    entries: RefCell<HashMap<usize, (Arc<H>, usize)>>,
}

impl<H: ?Sized> Default for HostRegistry<H> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }
}

impl<H: ?Sized> HostRegistry<H> {
    pub fn key_of(host: &Arc<H>) -> usize {
        Arc::as_ptr(host).cast::<()>() as usize
    }

    /// Register a binding of `host` and return its key.
    pub fn add(&self, host: &Arc<H>) -> usize {
        let key = Self::key_of(host);
        let mut entries = self.entries.borrow_mut();
        entries
            .entry(key)
            .and_modify(|(_, count)| *count += 1)
            .or_insert_with(|| (Arc::clone(host), 1));
        key
    }

    /// Release one binding. Returns `true` when the entry was erased.
    pub fn remove(&self, key: usize) -> bool {
        let released = {
            let mut entries = self.entries.borrow_mut();
            let remaining = match entries.get_mut(&key) {
                Some((_, count)) => {
                    *count -= 1;
                    *count
                }
                None => {
                    tracing::warn!(key, "releasing a host payload that is not registered");
                    return false;
                }
            };
            if remaining == 0 { entries.remove(&key) } else { None }
        };
        // Dropped outside the borrow: the payload's destructor may release
        // other handles that reach back into the registry.
        released.is_some()
    }

    pub fn get(&self, key: usize) -> Option<Arc<H>> {
        self.entries.borrow().get(&key).map(|(host, _)| Arc::clone(host))
    }

    pub fn contains(&self, key: usize) -> bool {
        self.entries.borrow().contains_key(&key)
    }

    /// Number of bindings of `key`.
    pub fn binding_count(&self, key: usize) -> usize {
        self.entries.borrow().get(&key).map_or(0, |(_, count)| *count)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Drop every entry.
    pub(crate) fn clear(&self) {
        let drained: Vec<_> = self.entries.borrow_mut().drain().collect();
        drop(drained);
    }
}

/// Payload kinds that have a registry on [`RuntimeCore`].
pub trait RegisteredHost: 'static {
    fn registry(core: &RuntimeCore) -> &HostRegistry<Self>;
}

impl RegisteredHost for dyn HostObject {
    fn registry(core: &RuntimeCore) -> &HostRegistry<Self> {
        core.host_objects()
    }
}

impl RegisteredHost for HostFunctionType {
    fn registry(core: &RuntimeCore) -> &HostRegistry<Self> {
        core.host_functions()
    }
}

/// The lifetime triple held by an engine-side proxy.
pub struct HostObjectWrapper<R: Runtime + 'static, H: ?Sized + RegisteredHost> {
    runtime: RcWeak<R>,
    host: Weak<H>,
    key: usize,
    destroyed: Arc<AtomicBool>,
}

impl<R: Runtime + 'static, H: ?Sized + RegisteredHost> HostObjectWrapper<R, H> {
    /// Register `host` with the runtime and capture weak references to both.
    pub fn new(runtime: &Rc<R>, host: &Arc<H>) -> Self {
        let core = runtime.core();
        let key = H::registry(core).add(host);
        Self {
            runtime: Rc::downgrade(runtime),
            host: Arc::downgrade(host),
            key,
            destroyed: core.destroyed_flag(),
        }
    }

    /// Both halves, or `None` once the runtime is destroyed or either side
    /// has been released.
    pub fn get_runtime_and_host(&self) -> Option<(Rc<R>, Arc<H>)> {
        if self.destroyed.load(Ordering::Acquire) {
            return None;
        }
        let runtime = self.runtime.upgrade()?;
        let host = self.host.upgrade()?;
        Some((runtime, host))
    }

    pub fn key(&self) -> usize {
        self.key
    }

    pub fn is_runtime_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}

impl<R: Runtime + 'static, H: ?Sized + RegisteredHost> Drop for HostObjectWrapper<R, H> {
    fn drop(&mut self) {
        if self.destroyed.load(Ordering::Acquire) {
            return;
        }
        if let Some(runtime) = self.runtime.upgrade() {
            H::registry(runtime.core()).remove(self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_counts_bindings() {
        let registry: HostRegistry<str> = HostRegistry::default();
        let payload: Arc<str> = Arc::from("payload");
        let key = registry.add(&payload);
        assert_eq!(registry.add(&payload), key);
        assert_eq!(registry.binding_count(key), 2);
        assert_eq!(Arc::strong_count(&payload), 2);

        assert!(!registry.remove(key));
        assert!(registry.contains(key));
        assert!(registry.remove(key));
        assert!(registry.is_empty());
        assert_eq!(Arc::strong_count(&payload), 1);
    }

    #[test]
    fn test_registry_remove_unknown_key() {
        let registry: HostRegistry<str> = HostRegistry::default();
        assert!(!registry.remove(0xdead));
    }

    #[test]
    fn test_registry_clear_releases_payloads() {
        let registry: HostRegistry<str> = HostRegistry::default();
        let payload: Arc<str> = Arc::from("payload");
        registry.add(&payload);
        registry.clear();
        assert_eq!(registry.len(), 0);
        assert_eq!(Arc::strong_count(&payload), 1);
    }
}

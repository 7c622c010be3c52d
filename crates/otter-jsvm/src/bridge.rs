//! Embedding bridge: lets a second native-binding runtime run on the
//! environment a [`JsvmRuntime`](crate::JsvmRuntime) created.
//!
//! The bridge never owns the environment. It keeps a weak reference to the
//! context and tells the delegate when it may start and must stop using it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use otter_jsvm_sys::{JSVM_Env, JSVM_VM};

use crate::error::BridgeError;
use crate::instance::JsvmContextWrapper;
use crate::runtime::JsvmRuntime;

/// The shared engine environment as seen by the bridge.
pub trait BindingContext {
    fn env(&self) -> JSVM_Env;

    fn vm(&self) -> JSVM_VM;
}

impl BindingContext for JsvmContextWrapper {
    fn env(&self) -> JSVM_Env {
        JsvmContextWrapper::env(self)
    }

    fn vm(&self) -> JSVM_VM {
        JsvmContextWrapper::vm(self).raw()
    }
}

/// The second runtime.
pub trait BindingDelegate {
    /// Start using `env`. An error leaves the bridge detached.
    fn on_attach(&self, env: JSVM_Env, vm: JSVM_VM) -> Result<(), String>;

    /// Stop using the environment. Called at most once per successful
    /// attach, and only while the environment is still alive.
    fn on_detach(&self, _env: JSVM_Env) {}
}

enum BridgeState<C> {
    Detached,
    Attached {
        context: Weak<C>,
        delegate: Rc<dyn BindingDelegate>,
    },
    Failed(String),
}

pub struct EmbeddingBridge<C: BindingContext = JsvmContextWrapper> {
    state: RefCell<BridgeState<C>>,
}

impl<C: BindingContext> Default for EmbeddingBridge<C> {
    fn default() -> Self {
        Self {
            state: RefCell::new(BridgeState::Detached),
        }
    }
}

impl<C: BindingContext> EmbeddingBridge<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand the environment of `context` to `delegate`.
    pub fn attach(&self, context: &Rc<C>, delegate: Rc<dyn BindingDelegate>) -> Result<(), BridgeError> {
        if self.is_attached() {
            return Err(BridgeError::AlreadyAttached);
        }

        // The delegate runs without the state borrowed so it may query the
        // bridge.
        if let Err(message) = delegate.on_attach(context.env(), context.vm()) {
            tracing::warn!(%message, "embedding bridge attach rejected");
            *self.state.borrow_mut() = BridgeState::Failed(message.clone());
            return Err(BridgeError::Delegate(message));
        }

        *self.state.borrow_mut() = BridgeState::Attached {
            context: Rc::downgrade(context),
            delegate,
        };
        tracing::debug!("embedding bridge attached");
        Ok(())
    }

    /// Release the environment. Safe to call repeatedly, before any attach
    /// and after a failed attach.
    pub fn detach(&self) {
        let previous = std::mem::replace(&mut *self.state.borrow_mut(), BridgeState::Detached);
        match previous {
            BridgeState::Attached { context, delegate } => match context.upgrade() {
                Some(context) => {
                    delegate.on_detach(context.env());
                    tracing::debug!("embedding bridge detached");
                }
                None => tracing::debug!("embedding bridge detached after its context was destroyed"),
            },
            BridgeState::Failed(_) | BridgeState::Detached => {}
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(*self.state.borrow(), BridgeState::Attached { .. })
    }

    /// The error from the last attach, if it failed.
    pub fn failure(&self) -> Option<String> {
        match &*self.state.borrow() {
            BridgeState::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// The shared environment while attached.
    pub fn env(&self) -> Result<JSVM_Env, BridgeError> {
        match &*self.state.borrow() {
            BridgeState::Attached { context, .. } => context
                .upgrade()
                .map(|context| context.env())
                .ok_or(BridgeError::ContextGone),
            _ => Err(BridgeError::NotAttached),
        }
    }
}

impl EmbeddingBridge<JsvmContextWrapper> {
    /// Attach to the environment of `runtime`.
    pub fn attach_runtime(&self, runtime: &JsvmRuntime, delegate: Rc<dyn BindingDelegate>) -> Result<(), BridgeError> {
        self.attach(runtime.context(), delegate)
    }
}

impl<C: BindingContext> Drop for EmbeddingBridge<C> {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::ptr;

    struct FakeContext;

    impl BindingContext for FakeContext {
        fn env(&self) -> JSVM_Env {
            ptr::null_mut()
        }

        fn vm(&self) -> JSVM_VM {
            ptr::null_mut()
        }
    }

    #[derive(Default)]
    struct CountingDelegate {
        attached: Cell<usize>,
        detached: Cell<usize>,
        reject: bool,
    }

    impl BindingDelegate for CountingDelegate {
        fn on_attach(&self, _env: JSVM_Env, _vm: JSVM_VM) -> Result<(), String> {
            if self.reject {
                return Err("unsupported engine".into());
            }
            self.attached.set(self.attached.get() + 1);
            Ok(())
        }

        fn on_detach(&self, _env: JSVM_Env) {
            self.detached.set(self.detached.get() + 1);
        }
    }

    #[test]
    fn test_detach_without_attach() {
        let bridge = EmbeddingBridge::<FakeContext>::new();
        bridge.detach();
        bridge.detach();
        assert!(!bridge.is_attached());
        assert_eq!(bridge.env(), Err(BridgeError::NotAttached));
    }

    #[test]
    fn test_attach_then_detach_twice() {
        let context = Rc::new(FakeContext);
        let delegate = Rc::new(CountingDelegate::default());
        let bridge = EmbeddingBridge::<FakeContext>::new();

        bridge.attach(&context, delegate.clone()).unwrap();
        assert!(bridge.is_attached());
        assert!(bridge.env().is_ok());
        assert_eq!(
            bridge.attach(&context, delegate.clone()),
            Err(BridgeError::AlreadyAttached)
        );

        bridge.detach();
        bridge.detach();
        assert_eq!(delegate.attached.get(), 1);
        assert_eq!(delegate.detached.get(), 1);
    }

    #[test]
    fn test_failed_attach_is_detachable() {
        let context = Rc::new(FakeContext);
        let delegate = Rc::new(CountingDelegate {
            reject: true,
            ..Default::default()
        });
        let bridge = EmbeddingBridge::<FakeContext>::new();

        let err = bridge.attach(&context, delegate.clone()).unwrap_err();
        assert_eq!(err, BridgeError::Delegate("unsupported engine".into()));
        assert_eq!(bridge.failure().as_deref(), Some("unsupported engine"));

        bridge.detach();
        assert_eq!(delegate.detached.get(), 0);
        assert!(bridge.failure().is_none());
    }

    #[test]
    fn test_context_dropped_before_detach() {
        let context = Rc::new(FakeContext);
        let delegate = Rc::new(CountingDelegate::default());
        let bridge = EmbeddingBridge::<FakeContext>::new();
        bridge.attach(&context, delegate.clone()).unwrap();

        drop(context);
        assert_eq!(bridge.env(), Err(BridgeError::ContextGone));
        bridge.detach();
        assert_eq!(delegate.detached.get(), 0);
    }

    #[test]
    fn test_drop_detaches() {
        let context = Rc::new(FakeContext);
        let delegate = Rc::new(CountingDelegate::default());
        {
            let bridge = EmbeddingBridge::<FakeContext>::new();
            bridge.attach(&context, delegate.clone()).unwrap();
        }
        assert_eq!(delegate.detached.get(), 1);
    }
}

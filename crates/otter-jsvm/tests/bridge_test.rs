//! Integration tests for the embedding bridge on a live environment

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use otter_jsi::{Runtime, StringBuffer};
use otter_jsvm::{BindingDelegate, BridgeError, EmbeddingBridge, JsvmRuntime};
use otter_jsvm_sys::{JSVM_Env, JSVM_VM};
use serial_test::serial;

#[derive(Default)]
struct Recorder {
    env: Cell<Option<JSVM_Env>>,
    detached: Cell<usize>,
}

impl BindingDelegate for Recorder {
    fn on_attach(&self, env: JSVM_Env, vm: JSVM_VM) -> Result<(), String> {
        if vm.is_null() {
            return Err("no VM".into());
        }
        self.env.set(Some(env));
        Ok(())
    }

    fn on_detach(&self, _env: JSVM_Env) {
        self.detached.set(self.detached.get() + 1);
    }
}

fn runtime() -> Option<Rc<JsvmRuntime>> {
    if let Err(err) = otter_jsvm_sys::load() {
        eprintln!("skipping JSVM test: {err}");
        return None;
    }
    Some(JsvmRuntime::new().unwrap())
}

#[test]
#[serial]
fn test_attach_shares_the_runtime_environment() {
    let Some(rt) = runtime() else { return };
    let recorder = Rc::new(Recorder::default());
    let bridge: EmbeddingBridge = EmbeddingBridge::new();

    bridge.attach_runtime(&rt, recorder.clone()).unwrap();
    assert_eq!(recorder.env.get(), Some(rt.env()));
    assert_eq!(bridge.env(), Ok(rt.env()));
    assert_eq!(bridge.attach_runtime(&rt, recorder.clone()), Err(BridgeError::AlreadyAttached));

    bridge.detach();
    bridge.detach();
    assert_eq!(recorder.detached.get(), 1);

    let result = rt
        .evaluate_javascript(Arc::new(StringBuffer::new("1+2")), "after-detach.js")
        .unwrap();
    assert_eq!(result.as_number(), Some(3.0));
}

#[test]
#[serial]
fn test_detach_after_runtime_dropped() {
    let Some(rt) = runtime() else { return };
    let recorder = Rc::new(Recorder::default());
    let bridge: EmbeddingBridge = EmbeddingBridge::new();
    bridge.attach_runtime(&rt, recorder.clone()).unwrap();

    drop(rt);
    assert_eq!(bridge.env(), Err(BridgeError::ContextGone));
    bridge.detach();
    assert_eq!(recorder.detached.get(), 0);
}

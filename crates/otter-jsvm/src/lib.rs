#![allow(unsafe_op_in_unsafe_fn)]

//! otter-jsvm - HarmonyOS JSVM backend for `otter-jsi`.
//!
//! [`JsvmRuntime`] implements the [`otter_jsi::Runtime`] contract on top of
//! the JSVM-API (`libjsvm.so`), which is loaded at runtime through
//! `otter-jsvm-sys`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use otter_jsi::{Runtime, StringBuffer};
//! use otter_jsvm::JsvmRuntime;
//!
//! let rt = JsvmRuntime::new().unwrap();
//! let result = rt
//!     .evaluate_javascript(Arc::new(StringBuffer::new("1 + 2")), "main.js")
//!     .unwrap();
//! assert_eq!(result.as_number(), Some(3.0));
//! ```
//!
//! # Thread Safety
//!
//! A runtime and every handle it returns are `!Send` and `!Sync`. The engine
//! is initialized once per process; runtimes may be created on any thread
//! afterwards, each confined to the thread that created it.
//!
//! # Host objects and functions
//!
//! Host objects are instances of a per-runtime class whose named-property
//! interceptors forward to the [`otter_jsi::HostObject`]. Host functions are
//! plain engine functions whose callback data points at a proxy. Both are
//! type-tagged, so `is_host_object` / `is_host_function` never confuse them
//! with ordinary objects.

mod bridge;
mod config;
mod error;
mod helper;
mod host_function;
mod host_object;
mod instance;
mod pointer;
mod prepared;
mod runtime;

pub use bridge::{BindingContext, BindingDelegate, EmbeddingBridge};
pub use config::JsvmOptions;
pub use error::{BridgeError, JsvmError, JsvmResult};
pub use instance::{JsvmContextWrapper, JsvmVm, initialize};
pub use pointer::{JsvmObjectValue, JsvmRef, JsvmStringValue, JsvmSymbolValue};
pub use prepared::JsvmPreparedJavaScript;
pub use runtime::JsvmRuntime;

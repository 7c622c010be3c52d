//! otter-jsi - engine-agnostic JavaScript runtime interface.
//!
//! The crate defines the [`Runtime`] contract and its handle-based value
//! model. Backends (see `otter-jsvm`) implement [`Runtime`]; embedders only
//! ever see `&dyn Runtime` and the handle types.
//!
//! # Ownership
//!
//! Every heap handle ([`Object`], [`JsString`], [`Symbol`], [`PropNameId`]
//! and the object subtypes) owns one [`Pointer`], which owns one backend
//! [`PointerValue`] holding a strong engine reference. Handles are moved,
//! not copied; `clone_in(rt)` asks the runtime for another reference.
//!
//! Native payloads exposed to script ([`HostObject`], [`HostFunctionType`])
//! are held strongly by per-runtime registries and weakly by the engine
//! proxies through [`HostObjectWrapper`].
//!
//! # Errors
//!
//! Fallible operations return [`JsiNativeException`] values. Engine
//! exceptions that cannot be returned are reported to the runtime's
//! [`JsiExceptionHandler`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use otter_jsi::{Function, Runtime, StringBuffer, Value};
//!
//! fn install(rt: &dyn Runtime) {
//!     let add = Function::from_closure(rt, "add", 2, |_, _, args| {
//!         let a = args.first().and_then(Value::as_number).unwrap_or(0.0);
//!         let b = args.get(1).and_then(Value::as_number).unwrap_or(0.0);
//!         Ok(Value::Number(a + b))
//!     });
//!     if let Some(add) = add {
//!         rt.global().set_property(rt, "add", &add.into());
//!     }
//!     let result = rt.evaluate_javascript(Arc::new(StringBuffer::new("add(1, 2)")), "main.js");
//!     assert_eq!(result.ok().and_then(|v| v.as_number()), Some(3.0));
//! }
//! ```

pub mod array;
pub mod array_buffer;
pub mod bigint;
pub mod buffer;
pub mod collector;
pub mod config;
pub mod exception;
pub mod function;
pub mod host;
pub mod json;
pub mod object;
pub mod pointer;
pub mod propnameid;
pub mod runtime;
pub mod scope;
pub mod string;
pub mod symbol;
pub mod value;

pub use array::Array;
pub use array_buffer::ArrayBuffer;
pub use bigint::BigInt;
pub use buffer::{
    Buffer, BytecodeGetter, PreparedJavaScript, SourceJavaScriptPreparation, StringBuffer,
    VectorBuffer,
};
pub use collector::{CollectorScope, JsiNativeExceptionCollector};
pub use config::RuntimeOptions;
pub use exception::{ErrorCode, JsError, JsiException, JsiNativeException, JsiResult, NativeFrame};
pub use function::Function;
pub use host::{HostFunctionType, HostObject, HostObjectWrapper, HostRegistry, RegisteredHost};
pub use object::Object;
pub use pointer::{Pointer, PointerValue};
pub use propnameid::PropNameId;
pub use runtime::{
    GcBehavior, InspectorRuntimeObserver, JsiExceptionHandler, LoggingExceptionHandler,
    NoopInspectorObserver, Runtime, RuntimeCore, RuntimeKind, ScopeState,
};
pub use scope::Scope;
pub use string::JsString;
pub use symbol::Symbol;
pub use value::{MAX_SAFE_INTEGER, Value};

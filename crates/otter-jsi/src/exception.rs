//! Exception types crossing the native/script boundary.
//!
//! Backends never unwind through engine frames. Every fallible operation
//! hands back a [`JsiNativeException`] as a value; the same type represents
//! script-thrown errors (`is_js_error() == true`) and native binding errors.

use std::fmt;

use thiserror::Error;

use crate::runtime::Runtime;
use crate::value::Value;

/// Result type for evaluation and host-function calls.
pub type JsiResult<T> = Result<T, JsiNativeException>;

/// Numeric error codes carried on native exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Error thrown by script.
    JsRuntime = 1101,
    /// Malformed arguments, wrong handle shape, missing property.
    NativeBinding = 1102,
    /// A C-API call of the engine failed.
    Engine = 1103,
    /// The backend does not implement the operation.
    Unsupported = 1104,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// One synthetic native frame, appended while an exception propagates out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeFrame {
    pub function: String,
    pub file: String,
    pub line: u32,
}

impl fmt::Display for NativeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {} ({}:{})", self.function, self.file, self.line)
    }
}

/// The exception value returned by every fallible runtime operation.
#[derive(Debug, Clone, Error)]
#[error("{name}: {message}")]
pub struct JsiNativeException {
    name: String,
    message: String,
    stack: String,
    error_code: ErrorCode,
    is_js_error: bool,
    frames: Vec<NativeFrame>,
}

impl JsiNativeException {
    /// A native binding error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: "Error".into(),
            message: message.into(),
            stack: String::new(),
            error_code: ErrorCode::NativeBinding,
            is_js_error: false,
            frames: Vec::new(),
        }
    }

    /// An error thrown by script.
    pub fn js_error(
        name: impl Into<String>,
        message: impl Into<String>,
        stack: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: stack.into(),
            error_code: ErrorCode::JsRuntime,
            is_js_error: true,
            frames: Vec::new(),
        }
    }

    /// A failed engine C-API call.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::new(message).with_code(ErrorCode::Engine)
    }

    /// An operation the backend does not implement.
    pub fn unsupported(operation: impl fmt::Display) -> Self {
        Self::new(format!("{operation} is not supported by this runtime"))
            .with_code(ErrorCode::Unsupported)
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.error_code = code;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = stack.into();
        self
    }

    /// Append a native frame as the exception moves one call outward.
    pub fn add_native_frame(&mut self, function: impl Into<String>, file: impl Into<String>, line: u32) {
        self.frames.push(NativeFrame {
            function: function.into(),
            file: file.into(),
            line,
        });
    }

    pub fn with_frame(mut self, function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        self.add_native_frame(function, file, line);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Script stack as reported by the engine, without native frames.
    pub fn js_stack(&self) -> &str {
        &self.stack
    }

    pub fn native_frames(&self) -> &[NativeFrame] {
        &self.frames
    }

    /// Full stack: the engine stack followed by the synthetic native frames.
    pub fn stack(&self) -> String {
        let mut out = self.stack.clone();
        for frame in &self.frames {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("    ");
            out.push_str(&frame.to_string());
        }
        out
    }

    pub fn error_code(&self) -> ErrorCode {
        self.error_code
    }

    pub fn is_js_error(&self) -> bool {
        self.is_js_error
    }
}

/// Build a native exception tagged with the current source location.
#[macro_export]
macro_rules! jsi_native_exception {
    ($($arg:tt)+) => {
        $crate::JsiNativeException::new(format!($($arg)+))
            .with_frame(module_path!(), file!(), line!())
    };
}

/// Record the current source location on an exception that is being
/// propagated outward.
#[macro_export]
macro_rules! jsi_frame {
    ($err:expr) => {
        $err.with_frame(module_path!(), file!(), line!())
    };
}

/// An error that originated in script.
#[derive(Debug, Clone, Error)]
#[error("{name}: {message}")]
pub struct JsError {
    pub name: String,
    pub message: String,
    pub stack: String,
}

impl JsError {
    pub fn new(name: impl Into<String>, message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: stack.into(),
        }
    }

    /// Read `name`, `message` and `stack` off a thrown value.
    ///
    /// Primitive throws (`throw "x"`, `throw 42`) become an `Error` whose
    /// message is the stringified value.
    pub fn from_value(rt: &dyn Runtime, value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            let message = value
                .to_js_string(rt)
                .map(|s| s.utf8(rt))
                .unwrap_or_else(|| "Unknown error".to_string());
            return Self::new("Error", message, "");
        };

        let read = |key: &str| -> Option<String> {
            let property = object.get_property(rt, key)?;
            if property.is_undefined() || property.is_null() {
                return None;
            }
            property.to_js_string(rt).map(|s| s.utf8(rt))
        };

        let name = read("name").unwrap_or_else(|| "Error".to_string());
        let message = read("message").unwrap_or_else(|| {
            value
                .to_js_string(rt)
                .map(|s| s.utf8(rt))
                .unwrap_or_else(|| "Unknown error".to_string())
        });
        let stack = read("stack").unwrap_or_default();
        Self::new(name, message, stack)
    }
}

impl From<JsError> for JsiNativeException {
    fn from(err: JsError) -> Self {
        JsiNativeException::js_error(err.name, err.message, err.stack)
    }
}

/// The thrown family, used only where an embedding chooses to turn a
/// native error into a synchronous failure.
#[derive(Debug, Error)]
pub enum JsiException {
    #[error(transparent)]
    Js(#[from] JsError),

    #[error(transparent)]
    Native(#[from] JsiNativeException),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl JsiException {
    pub fn message(&self) -> String {
        match self {
            Self::Js(err) => err.message.clone(),
            Self::Native(err) => err.message().to_string(),
            Self::Unsupported(op) => op.clone(),
        }
    }

    pub fn into_native(self) -> JsiNativeException {
        match self {
            Self::Js(err) => err.into(),
            Self::Native(err) => err,
            Self::Unsupported(op) => JsiNativeException::unsupported(op),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_exception_display() {
        let err = JsiNativeException::new("bad argument");
        assert_eq!(err.to_string(), "Error: bad argument");
        assert!(!err.is_js_error());
        assert_eq!(err.error_code(), ErrorCode::NativeBinding);
    }

    #[test]
    fn test_js_error_flag() {
        let err = JsiNativeException::js_error("TypeError", "x is not a function", "at foo (a.js:1:1)");
        assert!(err.is_js_error());
        assert_eq!(err.name(), "TypeError");
        assert_eq!(err.error_code().as_i32(), 1101);
        assert_eq!(err.stack(), "at foo (a.js:1:1)");
    }

    #[test]
    fn test_native_frames_render_after_js_stack() {
        let err = JsiNativeException::js_error("Error", "boom", "at main (index.js:3:7)")
            .with_frame("dispatch", "module.rs", 10)
            .with_frame("invoke", "bridge.rs", 42);

        assert_eq!(err.native_frames().len(), 2);
        assert_eq!(
            err.stack(),
            "at main (index.js:3:7)\n    at dispatch (module.rs:10)\n    at invoke (bridge.rs:42)"
        );
    }

    #[test]
    fn test_macro_records_location() {
        let err = jsi_native_exception!("missing {}", "callback");
        assert_eq!(err.message(), "missing callback");
        let frame = &err.native_frames()[0];
        assert!(frame.file.ends_with("exception.rs"));
        assert!(frame.function.contains("exception"));
    }

    #[test]
    fn test_jsi_exception_into_native() {
        let thrown: JsiException = JsError::new("RangeError", "too big", "").into();
        let native = thrown.into_native();
        assert!(native.is_js_error());
        assert_eq!(native.message(), "too big");

        let unsupported = JsiException::Unsupported("bytecode".into()).into_native();
        assert_eq!(unsupported.error_code(), ErrorCode::Unsupported);
    }
}

//! Error types for the JSVM backend

use otter_jsi::JsiNativeException;
use otter_jsvm_sys::{JSVM_Status, LoadError, status_name};
use thiserror::Error;

/// Result type alias for JSVM operations
pub type JsvmResult<T> = Result<T, JsvmError>;

#[derive(Debug, Clone, Error)]
pub enum JsvmError {
    /// The engine library could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A C-API call returned a failing status
    #[error("{operation} failed with {}{}", status_name(*status), format_message(message))]
    Status {
        operation: &'static str,
        status: JSVM_Status,
        message: Option<String>,
    },

    /// VM or environment creation failed
    #[error("Context creation failed: {message}")]
    ContextCreation { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_message(message: &Option<String>) -> String {
    match message {
        Some(message) if !message.is_empty() => format!(": {message}"),
        _ => String::new(),
    }
}

impl JsvmError {
    pub fn status(operation: &'static str, status: JSVM_Status) -> Self {
        Self::Status {
            operation,
            status,
            message: None,
        }
    }

    pub fn context_creation(message: impl Into<String>) -> Self {
        Self::ContextCreation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<JsvmError> for JsiNativeException {
    fn from(err: JsvmError) -> Self {
        JsiNativeException::engine(err.to_string())
    }
}

/// Errors raised by the embedding bridge
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("Bridge is already attached")]
    AlreadyAttached,

    #[error("Bridge is not attached")]
    NotAttached,

    #[error("Binding context is gone")]
    ContextGone,

    #[error("Delegate rejected attach: {0}")]
    Delegate(String),
}

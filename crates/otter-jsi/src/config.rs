//! Runtime configuration shared by every backend.

use serde::{Deserialize, Serialize};

/// Options recognised by all `Runtime` implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeOptions {
    /// Rethrow native exceptions raised by host functions into script.
    /// When disabled they are reported to the exception handler and the
    /// call evaluates to `undefined`.
    /// Default: true
    pub rethrow_native_exceptions: bool,

    /// Produce and consume engine code caches where the backend supports it.
    /// Default: true
    pub enable_code_cache: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            rethrow_native_exceptions: true,
            enable_code_cache: true,
        }
    }
}

impl RuntimeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report native exceptions instead of rethrowing them.
    pub fn swallow_native_exceptions(mut self) -> Self {
        self.rethrow_native_exceptions = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RuntimeOptions::default();
        assert!(options.rethrow_native_exceptions);
        assert!(options.enable_code_cache);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options: RuntimeOptions =
            serde_json::from_str(r#"{ "rethrowNativeExceptions": false }"#).unwrap();
        assert!(!options.rethrow_native_exceptions);
        assert!(options.enable_code_cache);
    }
}

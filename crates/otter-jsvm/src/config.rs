//! Configuration for JSVM runtimes.

use std::path::PathBuf;

use otter_jsi::RuntimeOptions;
use serde::{Deserialize, Serialize};

/// Options for creating a [`JsvmRuntime`](crate::JsvmRuntime).
///
/// `library_path` and `vm_flags` only take effect for the first runtime of
/// the process; the engine is initialized once. The heap limits apply when a
/// thread's shared VM is created and are ignored while it is alive.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JsvmOptions {
    /// Path of the engine library. Falls back to `OTTER_JSVM_LIBRARY`, then
    /// to `libjsvm.so` on the loader search path.
    pub library_path: Option<PathBuf>,

    /// Engine flags passed to `OH_JSVM_Init`, e.g. `--expose-gc`.
    pub vm_flags: Vec<String>,

    /// Old generation limit in bytes. 0 = engine default.
    pub max_old_generation_size: usize,

    /// Young generation limit in bytes. 0 = engine default.
    pub max_young_generation_size: usize,

    /// Engine-independent runtime options.
    pub runtime: RuntimeOptions,
}

impl JsvmOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.vm_flags.push(flag.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_nested_runtime_options() {
        let options: JsvmOptions = serde_json::from_str(
            r#"{ "vmFlags": ["--expose-gc"], "runtime": { "enableCodeCache": false } }"#,
        )
        .unwrap();
        assert_eq!(options.vm_flags, ["--expose-gc"]);
        assert!(!options.runtime.enable_code_cache);
        assert!(options.runtime.rethrow_native_exceptions);
        assert!(options.library_path.is_none());
    }
}

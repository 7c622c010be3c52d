//! Scripts compiled ahead of evaluation.

use std::any::Any;
use std::sync::Arc;

use otter_jsi::{Buffer, PreparedJavaScript};

/// Source plus the code cache the engine produced for it.
///
/// The cache is engine-version specific but not tied to a runtime: any
/// `JsvmRuntime` in the process can evaluate the preparation without
/// recompiling. A rejected cache falls back to a full compile.
pub struct JsvmPreparedJavaScript {
    source_url: String,
    source: Arc<dyn Buffer>,
    code_cache: Arc<[u8]>,
}

impl JsvmPreparedJavaScript {
    pub(crate) fn new(source: Arc<dyn Buffer>, source_url: &str, code_cache: Vec<u8>) -> Self {
        Self {
            source_url: source_url.to_string(),
            source,
            code_cache: code_cache.into(),
        }
    }

    pub fn source(&self) -> &Arc<dyn Buffer> {
        &self.source
    }

    pub fn code_cache(&self) -> &[u8] {
        &self.code_cache
    }
}

impl PreparedJavaScript for JsvmPreparedJavaScript {
    fn source_url(&self) -> &str {
        &self.source_url
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

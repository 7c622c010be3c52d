//! Source and bytecode buffers handed to the evaluation entry points.

use std::any::Any;
use std::sync::Arc;

/// Immutable bytes owned by the caller.
pub trait Buffer {
    fn data(&self) -> &[u8];

    fn size(&self) -> usize {
        self.data().len()
    }
}

/// A buffer backed by a `String`.
#[derive(Debug, Clone)]
pub struct StringBuffer {
    source: String,
}

impl StringBuffer {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Buffer for StringBuffer {
    fn data(&self) -> &[u8] {
        self.source.as_bytes()
    }
}

/// A buffer backed by a byte vector.
#[derive(Debug, Clone, Default)]
pub struct VectorBuffer {
    bytes: Vec<u8>,
}

impl VectorBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

impl Buffer for VectorBuffer {
    fn data(&self) -> &[u8] {
        &self.bytes
    }
}

/// Looks up cached bytecode for a source URL.
pub type BytecodeGetter = dyn Fn(&str) -> Option<Arc<dyn Buffer>>;

/// Script that has been prepared for repeated evaluation.
///
/// What "prepared" means is backend specific: a code cache, compiled
/// bytecode or just the retained source.
pub trait PreparedJavaScript: Any {
    fn source_url(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

/// Preparation that keeps the source and re-evaluates it each time.
pub struct SourceJavaScriptPreparation {
    buffer: Arc<dyn Buffer>,
    source_url: String,
}

impl SourceJavaScriptPreparation {
    pub fn new(buffer: Arc<dyn Buffer>, source_url: impl Into<String>) -> Self {
        Self {
            buffer,
            source_url: source_url.into(),
        }
    }

    pub fn buffer(&self) -> &Arc<dyn Buffer> {
        &self.buffer
    }
}

impl Buffer for SourceJavaScriptPreparation {
    fn data(&self) -> &[u8] {
        self.buffer.data()
    }
}

impl PreparedJavaScript for SourceJavaScriptPreparation {
    fn source_url(&self) -> &str {
        &self.source_url
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

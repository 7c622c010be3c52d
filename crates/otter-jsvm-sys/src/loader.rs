//! Runtime resolution of the JSVM shared library.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

use crate::JsvmApi;

/// Library name passed to the dynamic loader when no path is configured.
pub const DEFAULT_LIBRARY: &str = "libjsvm.so";

/// Environment variable overriding the library path.
pub const LIBRARY_ENV: &str = "OTTER_JSVM_LIBRARY";

/// Why the engine library is unavailable.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("Failed to open {}: {message}", path.display())]
    Library { path: PathBuf, message: String },

    #[error("Missing symbol {symbol}: {message}")]
    Symbol {
        symbol: &'static str,
        message: String,
    },
}

struct Loaded {
    // Keeps the resolved function pointers valid.
    _library: libloading::Library,
    api: JsvmApi,
}

static LIBRARY: OnceLock<Result<Loaded, LoadError>> = OnceLock::new();

fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var_os(LIBRARY_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_LIBRARY),
    }
}

fn open(path: PathBuf) -> Result<Loaded, LoadError> {
    // SAFETY: loading runs the library's initializers; libjsvm has no
    // requirements on the loading thread.
    let library = unsafe { libloading::Library::new(&path) }.map_err(|err| LoadError::Library {
        path: path.clone(),
        message: err.to_string(),
    })?;
    // SAFETY: `library` is kept alongside the table for the life of the process.
    let api = unsafe { JsvmApi::resolve(&library) }?;
    tracing::debug!(path = %path.display(), "loaded JSVM library");
    Ok(Loaded {
        _library: library,
        api,
    })
}

fn get_or_open(explicit: Option<&Path>) -> &'static Result<Loaded, LoadError> {
    let loaded = LIBRARY.get_or_init(|| {
        let path = resolve_path(explicit);
        let result = open(path);
        if let Err(err) = &result {
            tracing::warn!(error = %err, "JSVM library unavailable");
        }
        result
    });
    if let Some(path) = explicit
        && loaded.is_ok()
    {
        tracing::trace!(path = %path.display(), "JSVM library already loaded; path ignored");
    }
    loaded
}

/// Load the library from the default location (or `OTTER_JSVM_LIBRARY`).
///
/// The first attempt is final: a failure is cached for the process.
pub fn load() -> Result<(), LoadError> {
    load_from(None)
}

/// Load the library from `path`, if no library has been loaded yet.
pub fn load_from(path: Option<&Path>) -> Result<(), LoadError> {
    match get_or_open(path) {
        Ok(_) => Ok(()),
        Err(err) => Err(err.clone()),
    }
}

pub fn is_loaded() -> bool {
    matches!(LIBRARY.get(), Some(Ok(_)))
}

pub(crate) fn api() -> Option<&'static JsvmApi> {
    get_or_open(None).as_ref().ok().map(|loaded| &loaded.api)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let path = resolve_path(Some(Path::new("/opt/jsvm/libjsvm.so")));
        assert_eq!(path, PathBuf::from("/opt/jsvm/libjsvm.so"));
    }

    #[test]
    fn test_load_error_display() {
        let err = LoadError::Symbol {
            symbol: "OH_JSVM_Init",
            message: "undefined symbol".into(),
        };
        assert_eq!(err.to_string(), "Missing symbol OH_JSVM_Init: undefined symbol");
    }
}

//! Raw FFI bindings to the HarmonyOS JSVM-API (`ark_runtime/jsvm.h`).
//!
//! The engine ships as a shared library (`libjsvm.so`). Instead of linking
//! against it, the entry points are resolved from the library the first time
//! any of them is called. Every `OH_JSVM_*` function here has the C
//! signature and returns [`JSVM_GENERIC_FAILURE`] when the library could not
//! be loaded; call [`load`] to find out why.
//!
//! Use the safe wrappers in `otter-jsvm` for higher-level access.

#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(clippy::missing_safety_doc)]
#![allow(clippy::too_many_arguments)]

use std::ffi::c_void;
use std::os::raw::{c_char, c_int};

mod loader;

pub use loader::{DEFAULT_LIBRARY, LIBRARY_ENV, LoadError, is_loaded, load, load_from};

// Opaque handles
pub type JSVM_VM = *mut c_void;
pub type JSVM_VMScope = *mut c_void;
pub type JSVM_EnvScope = *mut c_void;
pub type JSVM_Env = *mut c_void;
pub type JSVM_Value = *mut c_void;
pub type JSVM_Ref = *mut c_void;
pub type JSVM_HandleScope = *mut c_void;
pub type JSVM_EscapableHandleScope = *mut c_void;
pub type JSVM_CallbackInfo = *mut c_void;
pub type JSVM_Script = *mut c_void;
pub type JSVM_Deferred = *mut c_void;

// Status codes
pub type JSVM_Status = c_int;
pub const JSVM_OK: JSVM_Status = 0;
pub const JSVM_INVALID_ARG: JSVM_Status = 1;
pub const JSVM_OBJECT_EXPECTED: JSVM_Status = 2;
pub const JSVM_STRING_EXPECTED: JSVM_Status = 3;
pub const JSVM_NAME_EXPECTED: JSVM_Status = 4;
pub const JSVM_FUNCTION_EXPECTED: JSVM_Status = 5;
pub const JSVM_NUMBER_EXPECTED: JSVM_Status = 6;
pub const JSVM_BOOLEAN_EXPECTED: JSVM_Status = 7;
pub const JSVM_ARRAY_EXPECTED: JSVM_Status = 8;
pub const JSVM_GENERIC_FAILURE: JSVM_Status = 9;
pub const JSVM_PENDING_EXCEPTION: JSVM_Status = 10;
pub const JSVM_CANCELLED: JSVM_Status = 11;
pub const JSVM_ESCAPE_CALLED_TWICE: JSVM_Status = 12;
pub const JSVM_HANDLE_SCOPE_MISMATCH: JSVM_Status = 13;
pub const JSVM_CALLBACK_SCOPE_MISMATCH: JSVM_Status = 14;
pub const JSVM_QUEUE_FULL: JSVM_Status = 15;
pub const JSVM_CLOSING: JSVM_Status = 16;
pub const JSVM_BIGINT_EXPECTED: JSVM_Status = 17;
pub const JSVM_DATE_EXPECTED: JSVM_Status = 18;
pub const JSVM_ARRAYBUFFER_EXPECTED: JSVM_Status = 19;
pub const JSVM_DETACHABLE_ARRAYBUFFER_EXPECTED: JSVM_Status = 20;
pub const JSVM_WOULD_DEADLOCK: JSVM_Status = 21;
pub const JSVM_NO_EXTERNAL_BUFFERS_ALLOWED: JSVM_Status = 22;
pub const JSVM_CANNOT_RUN_JS: JSVM_Status = 23;

/// Symbolic name of a status code, for logs.
pub fn status_name(status: JSVM_Status) -> &'static str {
    match status {
        JSVM_OK => "JSVM_OK",
        JSVM_INVALID_ARG => "JSVM_INVALID_ARG",
        JSVM_OBJECT_EXPECTED => "JSVM_OBJECT_EXPECTED",
        JSVM_STRING_EXPECTED => "JSVM_STRING_EXPECTED",
        JSVM_NAME_EXPECTED => "JSVM_NAME_EXPECTED",
        JSVM_FUNCTION_EXPECTED => "JSVM_FUNCTION_EXPECTED",
        JSVM_NUMBER_EXPECTED => "JSVM_NUMBER_EXPECTED",
        JSVM_BOOLEAN_EXPECTED => "JSVM_BOOLEAN_EXPECTED",
        JSVM_ARRAY_EXPECTED => "JSVM_ARRAY_EXPECTED",
        JSVM_GENERIC_FAILURE => "JSVM_GENERIC_FAILURE",
        JSVM_PENDING_EXCEPTION => "JSVM_PENDING_EXCEPTION",
        JSVM_CANCELLED => "JSVM_CANCELLED",
        JSVM_ESCAPE_CALLED_TWICE => "JSVM_ESCAPE_CALLED_TWICE",
        JSVM_HANDLE_SCOPE_MISMATCH => "JSVM_HANDLE_SCOPE_MISMATCH",
        JSVM_CALLBACK_SCOPE_MISMATCH => "JSVM_CALLBACK_SCOPE_MISMATCH",
        JSVM_QUEUE_FULL => "JSVM_QUEUE_FULL",
        JSVM_CLOSING => "JSVM_CLOSING",
        JSVM_BIGINT_EXPECTED => "JSVM_BIGINT_EXPECTED",
        JSVM_DATE_EXPECTED => "JSVM_DATE_EXPECTED",
        JSVM_ARRAYBUFFER_EXPECTED => "JSVM_ARRAYBUFFER_EXPECTED",
        JSVM_DETACHABLE_ARRAYBUFFER_EXPECTED => "JSVM_DETACHABLE_ARRAYBUFFER_EXPECTED",
        JSVM_WOULD_DEADLOCK => "JSVM_WOULD_DEADLOCK",
        JSVM_NO_EXTERNAL_BUFFERS_ALLOWED => "JSVM_NO_EXTERNAL_BUFFERS_ALLOWED",
        JSVM_CANNOT_RUN_JS => "JSVM_CANNOT_RUN_JS",
        _ => "JSVM_UNKNOWN_STATUS",
    }
}

// Value types
pub type JSVM_ValueType = c_int;
pub const JSVM_UNDEFINED: JSVM_ValueType = 0;
pub const JSVM_NULL: JSVM_ValueType = 1;
pub const JSVM_BOOLEAN: JSVM_ValueType = 2;
pub const JSVM_NUMBER: JSVM_ValueType = 3;
pub const JSVM_STRING: JSVM_ValueType = 4;
pub const JSVM_SYMBOL: JSVM_ValueType = 5;
pub const JSVM_OBJECT: JSVM_ValueType = 6;
pub const JSVM_FUNCTION: JSVM_ValueType = 7;
pub const JSVM_EXTERNAL: JSVM_ValueType = 8;
pub const JSVM_BIGINT: JSVM_ValueType = 9;

// Property attributes
pub type JSVM_PropertyAttributes = c_int;
pub const JSVM_DEFAULT: JSVM_PropertyAttributes = 0;
pub const JSVM_WRITABLE: JSVM_PropertyAttributes = 1 << 0;
pub const JSVM_ENUMERABLE: JSVM_PropertyAttributes = 1 << 1;
pub const JSVM_CONFIGURABLE: JSVM_PropertyAttributes = 1 << 2;
pub const JSVM_STATIC: JSVM_PropertyAttributes = 1 << 10;

// Memory pressure levels
pub type JSVM_MemoryPressureLevel = c_int;
pub const JSVM_NO_PRESSURE: JSVM_MemoryPressureLevel = 0;
pub const JSVM_MODERATE_PRESSURE: JSVM_MemoryPressureLevel = 1;
pub const JSVM_CRITICAL_PRESSURE: JSVM_MemoryPressureLevel = 2;

// Callback types
pub type JSVM_NativeCallback =
    Option<unsafe extern "C" fn(env: JSVM_Env, info: JSVM_CallbackInfo) -> JSVM_Value>;

pub type JSVM_Finalize =
    Option<unsafe extern "C" fn(env: JSVM_Env, finalize_data: *mut c_void, finalize_hint: *mut c_void)>;

pub type JSVM_NamedGetterCallback = Option<
    unsafe extern "C" fn(
        env: JSVM_Env,
        name: JSVM_Value,
        this_arg: JSVM_Value,
        named_property_data: JSVM_Value,
    ) -> JSVM_Value,
>;

pub type JSVM_NamedSetterCallback = Option<
    unsafe extern "C" fn(
        env: JSVM_Env,
        name: JSVM_Value,
        property: JSVM_Value,
        this_arg: JSVM_Value,
        named_property_data: JSVM_Value,
    ) -> JSVM_Value,
>;

pub type JSVM_NamedDeleterCallback = Option<
    unsafe extern "C" fn(
        env: JSVM_Env,
        name: JSVM_Value,
        this_arg: JSVM_Value,
        named_property_data: JSVM_Value,
    ) -> JSVM_Value,
>;

pub type JSVM_EnumeratorCallback = Option<
    unsafe extern "C" fn(env: JSVM_Env, this_arg: JSVM_Value, property_data: JSVM_Value) -> JSVM_Value,
>;

pub type JSVM_IndexedGetterCallback = Option<
    unsafe extern "C" fn(
        env: JSVM_Env,
        index: JSVM_Value,
        this_arg: JSVM_Value,
        indexed_property_data: JSVM_Value,
    ) -> JSVM_Value,
>;

pub type JSVM_IndexedSetterCallback = Option<
    unsafe extern "C" fn(
        env: JSVM_Env,
        index: JSVM_Value,
        property: JSVM_Value,
        this_arg: JSVM_Value,
        indexed_property_data: JSVM_Value,
    ) -> JSVM_Value,
>;

pub type JSVM_IndexedDeleterCallback = JSVM_IndexedGetterCallback;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct JSVM_CallbackStruct {
    pub callback: JSVM_NativeCallback,
    pub data: *mut c_void,
}

pub type JSVM_Callback = *mut JSVM_CallbackStruct;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct JSVM_PropertyDescriptor {
    pub utf8name: *const c_char,
    pub name: JSVM_Value,
    pub method: JSVM_Callback,
    pub getter: JSVM_Callback,
    pub setter: JSVM_Callback,
    pub value: JSVM_Value,
    pub attributes: JSVM_PropertyAttributes,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct JSVM_PropertyHandlerConfigurationStruct {
    pub genericNamedPropertyGetterCallback: JSVM_NamedGetterCallback,
    pub genericNamedPropertySetterCallback: JSVM_NamedSetterCallback,
    pub genericNamedPropertyDeleterCallback: JSVM_NamedDeleterCallback,
    pub genericNamedPropertyEnumeratorCallback: JSVM_EnumeratorCallback,
    pub genericIndexedPropertyGetterCallback: JSVM_IndexedGetterCallback,
    pub genericIndexedPropertySetterCallback: JSVM_IndexedSetterCallback,
    pub genericIndexedPropertyDeleterCallback: JSVM_IndexedDeleterCallback,
    pub genericIndexedPropertyEnumeratorCallback: JSVM_EnumeratorCallback,
    pub namedPropertyData: JSVM_Value,
    pub indexedPropertyData: JSVM_Value,
}

impl Default for JSVM_PropertyHandlerConfigurationStruct {
    fn default() -> Self {
        Self {
            genericNamedPropertyGetterCallback: None,
            genericNamedPropertySetterCallback: None,
            genericNamedPropertyDeleterCallback: None,
            genericNamedPropertyEnumeratorCallback: None,
            genericIndexedPropertyGetterCallback: None,
            genericIndexedPropertySetterCallback: None,
            genericIndexedPropertyDeleterCallback: None,
            genericIndexedPropertyEnumeratorCallback: None,
            namedPropertyData: std::ptr::null_mut(),
            indexedPropertyData: std::ptr::null_mut(),
        }
    }
}

pub type JSVM_PropertyHandlerCfg = *mut JSVM_PropertyHandlerConfigurationStruct;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JSVM_TypeTag {
    pub lower: u64,
    pub upper: u64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct JSVM_ExtendedErrorInfo {
    pub errorMessage: *const c_char,
    pub engineReserved: *mut c_void,
    pub engineErrorCode: u32,
    pub errorCode: JSVM_Status,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct JSVM_InitOptions {
    pub externalReferences: *const isize,
    pub argc: *mut c_int,
    pub argv: *mut *mut c_char,
    pub removeFlags: bool,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct JSVM_CreateVMOptions {
    pub maxOldGenerationSize: usize,
    pub maxYoungGenerationSize: usize,
    pub initialOldGenerationSize: usize,
    pub initialYoungGenerationSize: usize,
    pub snapshotBlobData: *const c_char,
    pub snapshotBlobSize: usize,
    pub isForSnapshotting: bool,
}

impl Default for JSVM_CreateVMOptions {
    fn default() -> Self {
        Self {
            maxOldGenerationSize: 0,
            maxYoungGenerationSize: 0,
            initialOldGenerationSize: 0,
            initialYoungGenerationSize: 0,
            snapshotBlobData: std::ptr::null(),
            snapshotBlobSize: 0,
            isForSnapshotting: false,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct JSVM_VMInfo {
    pub apiVersion: u32,
    pub engine: *const c_char,
    pub version: *const c_char,
    pub cachedDataVersionTag: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct JSVM_ScriptOrigin {
    pub sourceMapUrl: *const c_char,
    pub resourceName: *const c_char,
    pub resourceLineOffset: usize,
    pub resourceColumnOffset: usize,
}

/// Declares the symbol table and one forwarding function per entry point.
macro_rules! jsvm_api {
    ($( fn $name:ident($($arg:ident: $ty:ty),* $(,)?); )*) => {
        /// Entry points resolved from the engine library.
        pub(crate) struct JsvmApi {
            $( $name: unsafe extern "C" fn($($ty),*) -> JSVM_Status, )*
        }

        /// Every symbol `resolve` requires, in declaration order.
        #[cfg(test)]
        pub(crate) const REQUIRED_SYMBOLS: &[&str] = &[$(stringify!($name)),*];

        impl JsvmApi {
            /// # Safety
            /// `library` must be the JSVM library; the returned pointers are
            /// valid only while it stays loaded.
            pub(crate) unsafe fn resolve(library: &libloading::Library) -> Result<Self, LoadError> {
                Ok(Self {
                    $(
                        $name: {
                            // SAFETY: the symbol is declared with its C signature.
                            let symbol = unsafe {
                                library.get::<unsafe extern "C" fn($($ty),*) -> JSVM_Status>(
                                    concat!(stringify!($name), "\0").as_bytes(),
                                )
                            }
                            .map_err(|err| LoadError::Symbol {
                                symbol: stringify!($name),
                                message: err.to_string(),
                            })?;
                            *symbol
                        },
                    )*
                })
            }
        }

        $(
            #[inline]
            pub unsafe fn $name($($arg: $ty),*) -> JSVM_Status {
                match loader::api() {
                    // SAFETY: arguments are forwarded unchanged; the caller
                    // upholds the C contract of the entry point.
                    Some(api) => unsafe { (api.$name)($($arg),*) },
                    None => JSVM_GENERIC_FAILURE,
                }
            }
        )*
    };
}

jsvm_api! {
    // Lifecycle
    fn OH_JSVM_Init(options: *const JSVM_InitOptions);
    fn OH_JSVM_CreateVM(options: *const JSVM_CreateVMOptions, result: *mut JSVM_VM);
    fn OH_JSVM_DestroyVM(vm: JSVM_VM);
    fn OH_JSVM_OpenVMScope(vm: JSVM_VM, result: *mut JSVM_VMScope);
    fn OH_JSVM_CloseVMScope(vm: JSVM_VM, scope: JSVM_VMScope);
    fn OH_JSVM_CreateEnv(vm: JSVM_VM, property_count: usize, properties: *const JSVM_PropertyDescriptor, result: *mut JSVM_Env);
    fn OH_JSVM_DestroyEnv(env: JSVM_Env);
    fn OH_JSVM_OpenEnvScope(env: JSVM_Env, result: *mut JSVM_EnvScope);
    fn OH_JSVM_CloseEnvScope(env: JSVM_Env, scope: JSVM_EnvScope);
    fn OH_JSVM_GetVMInfo(result: *mut JSVM_VMInfo);
    fn OH_JSVM_MemoryPressureNotification(env: JSVM_Env, level: JSVM_MemoryPressureLevel);

    // Scripts
    fn OH_JSVM_CompileScriptWithOrigin(env: JSVM_Env, script: JSVM_Value, cached_data: *const u8, cache_data_length: usize, eager_compile: bool, cache_rejected: *mut bool, origin: *mut JSVM_ScriptOrigin, result: *mut JSVM_Script);
    fn OH_JSVM_CreateCodeCache(env: JSVM_Env, script: JSVM_Script, data: *mut *const u8, length: *mut usize);
    fn OH_JSVM_RunScript(env: JSVM_Env, script: JSVM_Script, result: *mut JSVM_Value);

    // Errors
    fn OH_JSVM_GetLastErrorInfo(env: JSVM_Env, result: *mut *const JSVM_ExtendedErrorInfo);
    fn OH_JSVM_Throw(env: JSVM_Env, error: JSVM_Value);
    fn OH_JSVM_ThrowError(env: JSVM_Env, code: *const c_char, msg: *const c_char);
    fn OH_JSVM_CreateError(env: JSVM_Env, code: JSVM_Value, msg: JSVM_Value, result: *mut JSVM_Value);
    fn OH_JSVM_IsError(env: JSVM_Env, value: JSVM_Value, result: *mut bool);
    fn OH_JSVM_GetAndClearLastException(env: JSVM_Env, result: *mut JSVM_Value);
    fn OH_JSVM_IsExceptionPending(env: JSVM_Env, result: *mut bool);

    // Handle scopes and references
    fn OH_JSVM_OpenHandleScope(env: JSVM_Env, result: *mut JSVM_HandleScope);
    fn OH_JSVM_CloseHandleScope(env: JSVM_Env, scope: JSVM_HandleScope);
    fn OH_JSVM_CreateReference(env: JSVM_Env, value: JSVM_Value, initial_refcount: u32, result: *mut JSVM_Ref);
    fn OH_JSVM_DeleteReference(env: JSVM_Env, reference: JSVM_Ref);
    fn OH_JSVM_GetReferenceValue(env: JSVM_Env, reference: JSVM_Ref, result: *mut JSVM_Value);

    // Value creation
    fn OH_JSVM_GetUndefined(env: JSVM_Env, result: *mut JSVM_Value);
    fn OH_JSVM_GetNull(env: JSVM_Env, result: *mut JSVM_Value);
    fn OH_JSVM_GetGlobal(env: JSVM_Env, result: *mut JSVM_Value);
    fn OH_JSVM_GetBoolean(env: JSVM_Env, value: bool, result: *mut JSVM_Value);
    fn OH_JSVM_CreateDouble(env: JSVM_Env, value: f64, result: *mut JSVM_Value);
    fn OH_JSVM_CreateStringUtf8(env: JSVM_Env, str: *const c_char, length: usize, result: *mut JSVM_Value);
    fn OH_JSVM_CreateObject(env: JSVM_Env, result: *mut JSVM_Value);
    fn OH_JSVM_CreateArrayWithLength(env: JSVM_Env, length: usize, result: *mut JSVM_Value);
    fn OH_JSVM_CreateArraybuffer(env: JSVM_Env, byte_length: usize, data: *mut *mut c_void, result: *mut JSVM_Value);
    fn OH_JSVM_CreateFunction(env: JSVM_Env, utf8name: *const c_char, length: usize, cb: JSVM_Callback, result: *mut JSVM_Value);

    // Value inspection
    fn OH_JSVM_Typeof(env: JSVM_Env, value: JSVM_Value, result: *mut JSVM_ValueType);
    fn OH_JSVM_GetValueBool(env: JSVM_Env, value: JSVM_Value, result: *mut bool);
    fn OH_JSVM_GetValueDouble(env: JSVM_Env, value: JSVM_Value, result: *mut f64);
    fn OH_JSVM_GetValueStringUtf8(env: JSVM_Env, value: JSVM_Value, buf: *mut c_char, bufsize: usize, result: *mut usize);
    fn OH_JSVM_CoerceToString(env: JSVM_Env, value: JSVM_Value, result: *mut JSVM_Value);
    fn OH_JSVM_IsArray(env: JSVM_Env, value: JSVM_Value, result: *mut bool);
    fn OH_JSVM_IsArraybuffer(env: JSVM_Env, value: JSVM_Value, result: *mut bool);
    fn OH_JSVM_GetArrayLength(env: JSVM_Env, value: JSVM_Value, result: *mut u32);
    fn OH_JSVM_GetArraybufferInfo(env: JSVM_Env, arraybuffer: JSVM_Value, data: *mut *mut c_void, byte_length: *mut usize);
    fn OH_JSVM_StrictEquals(env: JSVM_Env, lhs: JSVM_Value, rhs: JSVM_Value, result: *mut bool);
    fn OH_JSVM_Instanceof(env: JSVM_Env, object: JSVM_Value, constructor: JSVM_Value, result: *mut bool);

    // Properties
    fn OH_JSVM_GetPropertyNames(env: JSVM_Env, object: JSVM_Value, result: *mut JSVM_Value);
    fn OH_JSVM_SetProperty(env: JSVM_Env, object: JSVM_Value, key: JSVM_Value, value: JSVM_Value);
    fn OH_JSVM_GetProperty(env: JSVM_Env, object: JSVM_Value, key: JSVM_Value, result: *mut JSVM_Value);
    fn OH_JSVM_HasProperty(env: JSVM_Env, object: JSVM_Value, key: JSVM_Value, result: *mut bool);
    fn OH_JSVM_SetNamedProperty(env: JSVM_Env, object: JSVM_Value, utf8name: *const c_char, value: JSVM_Value);
    fn OH_JSVM_GetNamedProperty(env: JSVM_Env, object: JSVM_Value, utf8name: *const c_char, result: *mut JSVM_Value);
    fn OH_JSVM_HasNamedProperty(env: JSVM_Env, object: JSVM_Value, utf8name: *const c_char, result: *mut bool);
    fn OH_JSVM_SetElement(env: JSVM_Env, object: JSVM_Value, index: u32, value: JSVM_Value);
    fn OH_JSVM_GetElement(env: JSVM_Env, object: JSVM_Value, index: u32, result: *mut JSVM_Value);
    fn OH_JSVM_DefineProperties(env: JSVM_Env, object: JSVM_Value, property_count: usize, properties: *const JSVM_PropertyDescriptor);

    // Functions and classes
    fn OH_JSVM_CallFunction(env: JSVM_Env, recv: JSVM_Value, func: JSVM_Value, argc: usize, argv: *const JSVM_Value, result: *mut JSVM_Value);
    fn OH_JSVM_NewInstance(env: JSVM_Env, constructor: JSVM_Value, argc: usize, argv: *const JSVM_Value, result: *mut JSVM_Value);
    fn OH_JSVM_GetCbInfo(env: JSVM_Env, cbinfo: JSVM_CallbackInfo, argc: *mut usize, argv: *mut JSVM_Value, this_arg: *mut JSVM_Value, data: *mut *mut c_void);
    fn OH_JSVM_DefineClassWithPropertyHandler(env: JSVM_Env, utf8name: *const c_char, length: usize, constructor: JSVM_Callback, property_count: usize, properties: *const JSVM_PropertyDescriptor, property_handler_cfg: JSVM_PropertyHandlerCfg, call_as_function_callback: JSVM_Callback, result: *mut JSVM_Value);

    // Wrapping and type tags
    fn OH_JSVM_Wrap(env: JSVM_Env, js_object: JSVM_Value, native_object: *mut c_void, finalize_cb: JSVM_Finalize, finalize_hint: *mut c_void, result: *mut JSVM_Ref);
    fn OH_JSVM_Unwrap(env: JSVM_Env, js_object: JSVM_Value, result: *mut *mut c_void);
    fn OH_JSVM_TypeTagObject(env: JSVM_Env, value: JSVM_Value, type_tag: *const JSVM_TypeTag);
    fn OH_JSVM_CheckObjectTypeTag(env: JSVM_Env, value: JSVM_Value, type_tag: *const JSVM_TypeTag, result: *mut bool);
}

/// Length argument meaning "the string is NUL-terminated".
pub const JSVM_AUTO_LENGTH: usize = usize::MAX;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_names() {
        assert_eq!(status_name(JSVM_OK), "JSVM_OK");
        assert_eq!(status_name(JSVM_PENDING_EXCEPTION), "JSVM_PENDING_EXCEPTION");
        assert_eq!(status_name(1000), "JSVM_UNKNOWN_STATUS");
    }

    #[test]
    fn test_required_symbols_are_unique_and_minimal() {
        let mut seen = std::collections::HashSet::new();
        for symbol in REQUIRED_SYMBOLS {
            assert!(seen.insert(symbol), "{symbol} declared twice");
        }
        for unused in ["OH_JSVM_GetVersion", "OH_JSVM_CompileScript", "OH_JSVM_JsonParse", "OH_JSVM_RemoveWrap"] {
            assert!(!seen.contains(&unused), "{unused} is not called by the backend");
        }
        assert!(seen.contains(&"OH_JSVM_CompileScriptWithOrigin"));
    }

    #[test]
    fn test_struct_layouts() {
        assert_eq!(std::mem::size_of::<JSVM_TypeTag>(), 16);
        assert_eq!(
            std::mem::size_of::<JSVM_CallbackStruct>(),
            2 * std::mem::size_of::<usize>()
        );
        assert_eq!(
            std::mem::size_of::<JSVM_PropertyHandlerConfigurationStruct>(),
            10 * std::mem::size_of::<usize>()
        );
    }
}

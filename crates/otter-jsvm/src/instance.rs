//! Process, VM and environment lifecycle.
//!
//! `OH_JSVM_Init` runs once per process. The VM (with its VM scope open) and
//! the environment (with its env scope open) are created once per thread and
//! shared by every runtime on that thread; the last runtime to go tears them
//! down in the reverse order of creation. Scopes therefore nest no matter in
//! which order runtimes are dropped.

use std::cell::RefCell;
use std::ffi::CString;
use std::marker::PhantomData;
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::rc::{Rc, Weak};
use std::sync::OnceLock;

use otter_jsvm_sys::*;
use parking_lot::Mutex;

use crate::config::JsvmOptions;
use crate::error::{JsvmError, JsvmResult};

/// Serializes engine initialization and VM creation.
static CONTEXT_CREATION_LOCK: Mutex<()> = Mutex::new(());

static ENGINE_INIT: OnceLock<JsvmResult<()>> = OnceLock::new();

thread_local! {
    static SHARED_CONTEXT: RefCell<Weak<JsvmContextWrapper>> = const { RefCell::new(Weak::new()) };
}

/// Load the library and run `OH_JSVM_Init` unless that already happened.
///
/// The outcome of the first attempt is cached for the process.
pub fn initialize(options: &JsvmOptions) -> JsvmResult<()> {
    ENGINE_INIT
        .get_or_init(|| {
            otter_jsvm_sys::load_from(options.library_path.as_deref())?;

            // argv[0] is the program name by convention; the engine skips it.
            let mut args: Vec<CString> = Vec::with_capacity(options.vm_flags.len() + 1);
            args.push(CString::new("otter").map_err(|e| JsvmError::internal(e.to_string()))?);
            for flag in &options.vm_flags {
                args.push(CString::new(flag.as_str()).map_err(|e| JsvmError::internal(e.to_string()))?);
            }
            let mut argv: Vec<*mut c_char> = args.iter().map(|a| a.as_ptr() as *mut c_char).collect();
            let mut argc = argv.len() as c_int;

            let init_options = JSVM_InitOptions {
                externalReferences: ptr::null(),
                argc: &mut argc,
                argv: argv.as_mut_ptr(),
                removeFlags: false,
            };
            // SAFETY: argc/argv point at live CStrings for the duration of the call.
            let status = unsafe { OH_JSVM_Init(&init_options) };
            if status != JSVM_OK {
                return Err(JsvmError::status("OH_JSVM_Init", status));
            }
            tracing::debug!(flags = ?options.vm_flags, "JSVM initialized");
            Ok(())
        })
        .clone()
}

/// One engine VM with its VM scope open.
pub struct JsvmVm {
    vm: JSVM_VM,
    vm_scope: JSVM_VMScope,
    _not_send: PhantomData<*mut ()>,
}

impl JsvmVm {
    pub fn new(options: &JsvmOptions) -> JsvmResult<Self> {
        let create_options = JSVM_CreateVMOptions {
            maxOldGenerationSize: options.max_old_generation_size,
            maxYoungGenerationSize: options.max_young_generation_size,
            ..Default::default()
        };

        let mut vm: JSVM_VM = ptr::null_mut();
        // SAFETY: both pointers are valid for the call.
        let status = unsafe { OH_JSVM_CreateVM(&create_options, &mut vm) };
        if status != JSVM_OK || vm.is_null() {
            return Err(JsvmError::context_creation(format!(
                "OH_JSVM_CreateVM returned {}",
                status_name(status)
            )));
        }

        let mut vm_scope: JSVM_VMScope = ptr::null_mut();
        // SAFETY: `vm` was just created.
        let status = unsafe { OH_JSVM_OpenVMScope(vm, &mut vm_scope) };
        if status != JSVM_OK {
            // SAFETY: no scope is open and nothing else references the VM.
            unsafe { OH_JSVM_DestroyVM(vm) };
            return Err(JsvmError::context_creation(format!(
                "OH_JSVM_OpenVMScope returned {}",
                status_name(status)
            )));
        }

        Ok(Self {
            vm,
            vm_scope,
            _not_send: PhantomData,
        })
    }

    pub fn raw(&self) -> JSVM_VM {
        self.vm
    }
}

impl Drop for JsvmVm {
    fn drop(&mut self) {
        // SAFETY: the scope and VM were created by `new` and every
        // environment of this VM is gone.
        unsafe {
            OH_JSVM_CloseVMScope(self.vm, self.vm_scope);
            OH_JSVM_DestroyVM(self.vm);
        }
    }
}

/// An environment (global object and realm) with its env scope open.
///
/// Shared by every runtime of a thread and every pointer value they hand
/// out, so that no reference outlives the environment it points into.
pub struct JsvmContextWrapper {
    env: JSVM_Env,
    env_scope: JSVM_EnvScope,
    // Dropped after the environment.
    vm: JsvmVm,
}

impl JsvmContextWrapper {
    /// The VM and environment of the current thread.
    ///
    /// The first call on a thread creates them from `options`; later calls
    /// return the same wrapper for as long as any runtime or handle keeps it
    /// alive, and ignore `options`.
    pub fn shared(options: &JsvmOptions) -> JsvmResult<Rc<Self>> {
        if let Some(context) = SHARED_CONTEXT.with(|shared| shared.borrow().upgrade()) {
            return Ok(context);
        }
        let context = Rc::new(Self::create(options)?);
        SHARED_CONTEXT.with(|shared| *shared.borrow_mut() = Rc::downgrade(&context));
        Ok(context)
    }

    /// Initialize the engine if needed, then create a VM and an environment.
    fn create(options: &JsvmOptions) -> JsvmResult<Self> {
        let _guard = CONTEXT_CREATION_LOCK.lock();
        initialize(options)?;

        let vm = JsvmVm::new(options)?;

        let mut env: JSVM_Env = ptr::null_mut();
        // SAFETY: the VM scope is open on this thread.
        let status = unsafe { OH_JSVM_CreateEnv(vm.raw(), 0, ptr::null(), &mut env) };
        if status != JSVM_OK || env.is_null() {
            return Err(JsvmError::context_creation(format!(
                "OH_JSVM_CreateEnv returned {}",
                status_name(status)
            )));
        }
        let env = scopeguard::guard(env, |env| {
            // SAFETY: no env scope was opened.
            unsafe { OH_JSVM_DestroyEnv(env) };
        });

        let mut env_scope: JSVM_EnvScope = ptr::null_mut();
        // SAFETY: `env` is live.
        let status = unsafe { OH_JSVM_OpenEnvScope(*env, &mut env_scope) };
        if status != JSVM_OK {
            return Err(JsvmError::context_creation(format!(
                "OH_JSVM_OpenEnvScope returned {}",
                status_name(status)
            )));
        }

        tracing::debug!("JSVM environment created");
        Ok(Self {
            env: scopeguard::ScopeGuard::into_inner(env),
            env_scope,
            vm,
        })
    }

    pub fn env(&self) -> JSVM_Env {
        self.env
    }

    pub fn vm(&self) -> &JsvmVm {
        &self.vm
    }
}

impl Drop for JsvmContextWrapper {
    fn drop(&mut self) {
        // SAFETY: created by `create`; the VM is dropped after this body runs.
        unsafe {
            OH_JSVM_CloseEnvScope(self.env, self.env_scope);
            OH_JSVM_DestroyEnv(self.env);
        }
        tracing::debug!("JSVM environment destroyed");
    }
}

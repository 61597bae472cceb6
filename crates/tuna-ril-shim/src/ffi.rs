//! C entry points
//!
//! libril loads this library in place of the vendor RIL and calls
//! [`RIL_Init`]. The vendor receives a copy of libril's environment with the
//! two response callbacks pointing here; libril receives a function table
//! whose dispatch and state query point here. Everything in between goes
//! through the process-wide session.

use crate::error::ShimError;
use crate::patch::{PatchOutcome, PatchPhase, Patcher, SymbolResolver};
use crate::payload::{Payload, Token};
use crate::radio_state::RadioState;
use crate::ril::{self, RilEnv, RilErrno, RilInitFn, RilRadioFunctions, RilToken};
use crate::session::{RadioFunctions, RilCallbacks, RilShim};
use std::ffi::{CStr, c_char, c_int, c_void};
use std::ptr;
use std::sync::{Arc, RwLock};
use tuna_config::{DeviceVariant, RilConfig, ShimConfig, VendorLibrary, init_logging};

/// libril's callbacks, as handed to `RIL_Init`
#[derive(Debug, Clone, Copy)]
pub struct PlatformEnv {
    env: &'static RilEnv,
}

// Safety: libril's environment is immutable static data, and its callbacks
// may be invoked from any vendor thread.
unsafe impl Send for PlatformEnv {}
unsafe impl Sync for PlatformEnv {}

impl PlatformEnv {
    pub fn new(env: &'static RilEnv) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &'static RilEnv {
        self.env
    }
}

impl RilCallbacks for PlatformEnv {
    fn on_request_complete(&self, token: Token, error: RilErrno, response: Payload<'_>) {
        if let Some(callback) = self.env.on_request_complete {
            // Safety: libril copies the response before returning.
            unsafe { callback(token.as_raw(), error, response.as_mut_ptr(), response.len()) };
        }
    }

    fn on_unsolicited_response(&self, code: c_int, data: Payload<'_>) {
        if let Some(callback) = self.env.on_unsolicited_response {
            // Safety: as above.
            unsafe { callback(code, data.as_ptr(), data.len()) };
        }
    }
}

/// The vendor's function table, as returned by its `RIL_Init`
#[derive(Debug, Clone, Copy)]
pub struct VendorTable {
    functions: &'static RilRadioFunctions,
}

// Safety: the table is static data in the vendor library, which is never
// unloaded once a session exists; its entries are thread-safe per ril.h.
unsafe impl Send for VendorTable {}
unsafe impl Sync for VendorTable {}

impl VendorTable {
    pub fn new(functions: &'static RilRadioFunctions) -> Self {
        Self { functions }
    }

    pub fn functions(&self) -> &'static RilRadioFunctions {
        self.functions
    }
}

impl RadioFunctions for VendorTable {
    fn version(&self) -> c_int {
        self.functions.version
    }

    fn on_request(&self, request: c_int, data: Payload<'_>, token: Token) {
        if let Some(on_request) = self.functions.on_request {
            // Safety: the buffer is libril's and outlives the call.
            unsafe { on_request(request, data.as_mut_ptr(), data.len(), token.as_raw()) };
        }
    }

    fn on_state_request(&self) -> c_int {
        match self.functions.on_state_request {
            Some(on_state_request) => unsafe { on_state_request() },
            None => RadioState::Unavailable.as_raw(),
        }
    }

    fn supports(&self, request: c_int) -> bool {
        self.functions
            .supports
            .is_some_and(|supports| unsafe { supports(request) } != 0)
    }

    fn on_cancel(&self, token: Token) {
        if let Some(on_cancel) = self.functions.on_cancel {
            unsafe { on_cancel(token.as_raw()) };
        }
    }

    fn get_version(&self) -> Option<&CStr> {
        let get_version = self.functions.get_version?;
        let version = unsafe { get_version() };
        if version.is_null() {
            return None;
        }
        // Safety: a static NUL-terminated string inside the vendor library.
        Some(unsafe { CStr::from_ptr(version) })
    }
}

pub type Session = RilShim<PlatformEnv, VendorTable>;

static SESSION: RwLock<Option<Arc<Session>>> = RwLock::new(None);

/// The active session, if `RIL_Init` got far enough to install one
pub fn current_session() -> Option<Arc<Session>> {
    SESSION
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

fn install_session(session: Arc<Session>) -> Result<(), ShimError> {
    let mut slot = SESSION
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if slot.is_some() {
        return Err(ShimError::AlreadyInitialized);
    }
    *slot = Some(session);
    Ok(())
}

fn discard_session() {
    SESSION
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take();
}

unsafe extern "C" fn shim_on_request_complete(
    t: RilToken,
    e: RilErrno,
    response: *mut c_void,
    responselen: usize,
) {
    let Some(session) = current_session() else {
        tracing::error!("Request completed with no active session");
        return;
    };
    // Safety: the vendor only completes tokens libril gave it.
    let request = unsafe { ril::request_number(t) };
    let response = unsafe { Payload::from_raw(response, responselen) };
    session.on_request_complete(request, Token::from_raw(t), e, response);
}

unsafe extern "C" fn shim_on_unsolicited_response(
    unsol_response: c_int,
    data: *const c_void,
    datalen: usize,
) {
    let Some(session) = current_session() else {
        tracing::error!("Unsolicited response {} with no active session", unsol_response);
        return;
    };
    let data = unsafe { Payload::from_raw(data, datalen) };
    session.on_unsolicited_response(unsol_response, data);
}

unsafe extern "C" fn shim_on_request(
    request: c_int,
    data: *mut c_void,
    datalen: usize,
    t: RilToken,
) {
    let Some(session) = current_session() else {
        tracing::error!("Request {} with no active session", request);
        return;
    };
    let data = unsafe { Payload::from_raw(data, datalen) };
    session.on_request(request, data, Token::from_raw(t));
}

unsafe extern "C" fn shim_on_state_request() -> c_int {
    match current_session() {
        Some(session) => session.on_state_request(),
        None => RadioState::Unavailable.as_raw(),
    }
}

/// Start a session around an already loaded vendor RIL
///
/// Applies the pre-init patches, runs `vendor_init` with the shimmed
/// environment, applies the post-init patches and returns the table to hand
/// to libril. On failure no session remains installed.
///
/// # Safety
///
/// `vendor_init` must be the vendor's `RIL_Init`, `resolver` must resolve
/// symbols of the same library, and `argv` must satisfy `RIL_Init`'s contract.
pub unsafe fn start_session<R: SymbolResolver>(
    env: &'static RilEnv,
    variant: DeviceVariant,
    advertised_version: c_int,
    resolver: &R,
    vendor_init: RilInitFn,
    argc: c_int,
    argv: *mut *mut c_char,
) -> Result<&'static RilRadioFunctions, ShimError> {
    let patcher = Patcher::new(resolver, variant);
    log_patch_pass(PatchPhase::BeforeInit, &patcher.apply(PatchPhase::BeforeInit));

    let session = Arc::new(Session::new(
        variant,
        advertised_version,
        PlatformEnv::new(env),
    ));
    install_session(Arc::clone(&session))?;

    // The vendor keeps this pointer for its lifetime
    let vendor_env: &'static RilEnv = Box::leak(Box::new(RilEnv {
        on_request_complete: Some(shim_on_request_complete),
        on_unsolicited_response: Some(shim_on_unsolicited_response),
        ..*env
    }));

    // Safety: per this function's contract.
    let functions = unsafe { vendor_init(vendor_env, argc, argv) };
    // Safety: non-null tables returned by RIL_Init are static vendor data.
    let Some(functions) = (unsafe { functions.as_ref() }) else {
        discard_session();
        return Err(ShimError::VendorInitFailed);
    };
    tracing::info!("Vendor RIL initialized, version {}", functions.version);

    log_patch_pass(PatchPhase::AfterInit, &patcher.apply(PatchPhase::AfterInit));

    if let Err(e) = session.attach_vendor(VendorTable::new(functions)) {
        discard_session();
        return Err(e);
    }

    Ok(Box::leak(Box::new(RilRadioFunctions {
        version: session.version(),
        on_request: Some(shim_on_request),
        on_state_request: Some(shim_on_state_request),
        ..*functions
    })))
}

fn log_patch_pass(phase: PatchPhase, report: &[(&'static str, PatchOutcome)]) {
    let applied = report
        .iter()
        .filter(|(_, outcome)| *outcome == PatchOutcome::Applied)
        .count();
    let skipped = report
        .iter()
        .filter(|(_, outcome)| {
            matches!(
                outcome,
                PatchOutcome::Mismatch { .. } | PatchOutcome::SymbolMissing
            )
        })
        .count();
    tracing::info!(
        "{:?} patch pass: {} applied, {} skipped",
        phase,
        applied,
        skipped
    );
}

unsafe fn init(
    config: &RilConfig,
    env: *const RilEnv,
    argc: c_int,
    argv: *mut *mut c_char,
) -> Result<&'static RilRadioFunctions, ShimError> {
    // Safety: libril's environment is static for the process lifetime.
    let env: &'static RilEnv = unsafe { env.as_ref() }.ok_or(ShimError::NullEnvironment)?;

    let variant = match config.variant {
        Some(variant) => {
            tracing::info!("Using configured tuna variant {}", variant);
            variant
        }
        None => DeviceVariant::detect(&config.variant_property),
    };
    let library = VendorLibrary::open(&config.vendor_library)?;

    let entry = library
        .symbol("RIL_Init")
        .ok_or(ShimError::SymbolMissing("RIL_Init"))?;
    // Safety: the vendor's RIL_Init has this signature.
    let vendor_init =
        unsafe { std::mem::transmute::<*mut c_void, RilInitFn>(entry.as_ptr()) };

    // On error `library` is dropped here, which closes it
    let functions = unsafe {
        start_session(
            env,
            variant,
            config.advertised_version,
            &library,
            vendor_init,
            argc,
            argv,
        )
    }?;

    library.leak();
    Ok(functions)
}

/// Entry point libril resolves in the RIL library
///
/// # Safety
///
/// Called by libril with its environment table and rild's arguments.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn RIL_Init(
    env: *const RilEnv,
    argc: c_int,
    argv: *mut *mut c_char,
) -> *const RilRadioFunctions {
    let config = ShimConfig::load_default();
    init_logging(env!("CARGO_PKG_NAME"), &config.log);

    match unsafe { init(&config.ril, env, argc, argv) } {
        Ok(functions) => functions,
        Err(e) => {
            tracing::error!("RIL_Init failed: {}", e);
            ptr::null()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    static ENV: RilEnv = RilEnv {
        on_request_complete: None,
        on_unsolicited_response: None,
        request_timed_callback: None,
        on_request_ack: None,
    };

    fn config(vendor_library: &str) -> RilConfig {
        RilConfig {
            vendor_library: PathBuf::from(vendor_library),
            variant: Some(DeviceVariant::Maguro),
            ..RilConfig::default()
        }
    }

    #[test]
    fn test_init_without_environment() {
        let config = config("/nonexistent/libsec-ril.so");
        let result = unsafe { init(&config, ptr::null(), 0, ptr::null_mut()) };
        assert!(matches!(result, Err(ShimError::NullEnvironment)));
        assert!(current_session().is_none());
    }

    #[test]
    fn test_init_with_missing_library() {
        let config = config("/nonexistent/libsec-ril.so");
        let result = unsafe { init(&config, &ENV, 0, ptr::null_mut()) };
        assert!(matches!(result, Err(ShimError::Library(_))));
        assert!(current_session().is_none());
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    #[test]
    fn test_init_with_library_lacking_ril_init() {
        let config = config("libc.so.6");
        let result = unsafe { init(&config, &ENV, 0, ptr::null_mut()) };
        assert!(matches!(result, Err(ShimError::SymbolMissing("RIL_Init"))));
        assert!(current_session().is_none());
    }
}

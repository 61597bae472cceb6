//! The GPS HAL module exported in place of the vendor's
//!
//! `open` loads the vendor HAL and hooks its device. From there, every table
//! the platform gets is a shim-owned copy of the vendor's with the entries
//! whose argument layouts changed pointing back here.

use crate::convert::{downgrade_ref_location, ref_location_is_complete, write_back_ref_location};
use crate::error::GpsShimError;
use crate::gps::{
    AGPS_RIL_INTERFACE, AGpsRefLocation, AGpsRefLocationNoLte, AGpsRilInterface, GetExtensionFn,
    GetGpsInterfaceFn, GpsCallbacks, GpsCallbacksLegacy, GpsDevice, GpsInitFn, GpsInterface,
    HAL_MODULE_INFO_SYM_AS_STR, HARDWARE_MODULE_TAG, HwDevice, HwModule, HwModuleMethods,
    LegacyGpsInitFn, LegacySetRefLocationFn,
};
use std::cell::UnsafeCell;
use std::ffi::{CStr, c_char, c_int, c_void};
use std::mem::{self, size_of};
use std::path::Path;
use std::ptr;
use std::sync::{Mutex, OnceLock};
use tuna_config::{ShimConfig, VendorLibrary, init_logging};

/// Vendor entry points the shim replaced, and the copies handed out instead
pub struct GpsShim {
    vendor_get_gps_interface: OnceLock<GetGpsInterfaceFn>,
    vendor_init: OnceLock<LegacyGpsInitFn>,
    vendor_get_extension: OnceLock<GetExtensionFn>,
    vendor_set_ref_location: OnceLock<LegacySetRefLocationFn>,
    interface: OnceLock<&'static GpsInterface>,
    agps_ril: OnceLock<&'static AGpsRilInterface>,
    /// The callbacks the vendor was last initialized with; it keeps the pointer
    legacy_callbacks: Mutex<GpsCallbacksLegacy>,
}

static SHIM: GpsShim = GpsShim::new();

impl GpsShim {
    const fn new() -> Self {
        Self {
            vendor_get_gps_interface: OnceLock::new(),
            vendor_init: OnceLock::new(),
            vendor_get_extension: OnceLock::new(),
            vendor_set_ref_location: OnceLock::new(),
            interface: OnceLock::new(),
            agps_ril: OnceLock::new(),
            legacy_callbacks: Mutex::new(GpsCallbacksLegacy::EMPTY),
        }
    }

    fn hook_device(&self, device: &mut GpsDevice) -> Result<(), GpsShimError> {
        let vendor = device
            .get_gps_interface
            .ok_or(GpsShimError::MissingEntry("get_gps_interface"))?;
        if self.vendor_get_gps_interface.set(vendor).is_err() {
            tracing::debug!("Vendor device opened again, keeping the first hooks");
        }
        device.get_gps_interface = Some(shim_get_gps_interface);
        Ok(())
    }

    fn gps_interface(&self, dev: *mut GpsDevice) -> Option<&'static GpsInterface> {
        if let Some(interface) = self.interface.get() {
            return Some(interface);
        }

        let vendor_get_gps_interface = self.vendor_get_gps_interface.get()?;
        // Safety: the vendor returns null or a table in its own static data.
        let vendor = unsafe { vendor_get_gps_interface(dev).as_ref() }?;

        if let Some(init) = vendor.init {
            // Safety: the vendor's init takes the legacy callbacks.
            let init = unsafe { mem::transmute::<_, LegacyGpsInitFn>(init) };
            let _ = self.vendor_init.set(init);
        }
        if let Some(get_extension) = vendor.get_extension {
            let _ = self.vendor_get_extension.set(get_extension);
        }

        tracing::debug!("Shimming vendor init and get_extension");
        let shimmed = GpsInterface {
            init: vendor.init.map(|_| shim_init as GpsInitFn),
            get_extension: vendor
                .get_extension
                .map(|_| shim_get_extension as GetExtensionFn),
            ..*vendor
        };
        Some(
            *self
                .interface
                .get_or_init(|| Box::leak(Box::new(shimmed))),
        )
    }

    fn init(&self, callbacks: *mut GpsCallbacks) -> c_int {
        let Some(vendor_init) = self.vendor_init.get() else {
            return -libc::EINVAL;
        };
        // Safety: the platform passes null or its callback table.
        let Some(callbacks) = (unsafe { callbacks.as_ref() }) else {
            tracing::error!("init called without callbacks");
            return -libc::EINVAL;
        };

        // Held across the vendor call so a concurrent init cannot rewrite
        // the table mid-read
        let mut legacy = self
            .legacy_callbacks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *legacy = GpsCallbacksLegacy::from(callbacks);
        tracing::debug!("Calling vendor init with legacy callbacks");
        // Safety: the slot lives in a static, so the pointer stays valid.
        unsafe { vendor_init(&mut *legacy) }
    }

    fn get_extension(&self, name: *const c_char) -> *const c_void {
        let Some(vendor_get_extension) = self.vendor_get_extension.get() else {
            return ptr::null();
        };
        // Safety: the platform passes a NUL-terminated name.
        let extension = unsafe { vendor_get_extension(name) };
        if name.is_null() {
            return extension;
        }
        let name = unsafe { CStr::from_ptr(name) };
        tracing::debug!("get_extension({:?})", name);
        if name.to_bytes() != AGPS_RIL_INTERFACE.as_bytes() {
            return extension;
        }

        match self.agps_ril_interface(extension.cast()) {
            Some(interface) => ptr::from_ref(interface).cast(),
            None => extension,
        }
    }

    fn agps_ril_interface(
        &self,
        vendor: *const AGpsRilInterface,
    ) -> Option<&'static AGpsRilInterface> {
        if let Some(interface) = self.agps_ril.get() {
            return Some(interface);
        }

        // Safety: null or the vendor's static extension table.
        let vendor = unsafe { vendor.as_ref() }?;
        let set_ref_location = vendor.set_ref_location?;
        // Safety: the vendor's set_ref_location takes the pre-LTE location.
        let set_ref_location =
            unsafe { mem::transmute::<_, LegacySetRefLocationFn>(set_ref_location) };
        let _ = self.vendor_set_ref_location.set(set_ref_location);

        tracing::debug!("Shimming AGPS RIL set_ref_location");
        let shimmed = AGpsRilInterface {
            set_ref_location: Some(shim_set_ref_location),
            ..*vendor
        };
        Some(*self.agps_ril.get_or_init(|| Box::leak(Box::new(shimmed))))
    }

    fn set_ref_location(&self, location: *const AGpsRefLocation, sz_struct: usize) {
        if !ref_location_is_complete(sz_struct) {
            tracing::error!("AGpsRefLocation of {} bytes is too small, ignoring", sz_struct);
            return;
        }
        // The vendor's view is copied back into the caller's struct
        let Some(location) = (unsafe { location.cast_mut().as_mut() }) else {
            tracing::error!("set_ref_location called without a location");
            return;
        };
        let Some(vendor_set_ref_location) = self.vendor_set_ref_location.get() else {
            return;
        };

        // Passed writable: the vendor may update it in place
        let mut vendor_location = downgrade_ref_location(location);
        unsafe {
            vendor_set_ref_location(
                ptr::addr_of_mut!(vendor_location).cast_const(),
                size_of::<AGpsRefLocationNoLte>(),
            )
        };

        let cell = unsafe { location.u.cell_id };
        tracing::debug!(
            "set_ref_location: type {} mcc {} mnc {} lac {} cid {} (tac {} pcid {} dropped)",
            location.type_,
            cell.mcc,
            cell.mnc,
            cell.lac,
            cell.cid,
            cell.tac,
            cell.pcid
        );
        write_back_ref_location(location, &vendor_location);
    }
}

/// Hook an opened vendor GPS device so its interface goes through the shim
pub fn hook_device(device: &mut GpsDevice) -> Result<(), GpsShimError> {
    SHIM.hook_device(device)
}

unsafe extern "C" fn shim_get_gps_interface(dev: *mut GpsDevice) -> *const GpsInterface {
    match SHIM.gps_interface(dev) {
        Some(interface) => ptr::from_ref(interface),
        None => ptr::null(),
    }
}

unsafe extern "C" fn shim_init(callbacks: *mut GpsCallbacks) -> c_int {
    SHIM.init(callbacks)
}

unsafe extern "C" fn shim_get_extension(name: *const c_char) -> *const c_void {
    SHIM.get_extension(name)
}

unsafe extern "C" fn shim_set_ref_location(location: *const AGpsRefLocation, sz_struct: usize) {
    SHIM.set_ref_location(location, sz_struct)
}

unsafe fn open_vendor(
    path: &Path,
    id: *const c_char,
    device: *mut *mut HwDevice,
) -> Result<(), GpsShimError> {
    if device.is_null() {
        return Err(GpsShimError::NoDevice);
    }

    let library = VendorLibrary::open(path)?;
    let module = library
        .symbol(HAL_MODULE_INFO_SYM_AS_STR)
        .ok_or(GpsShimError::SymbolMissing(HAL_MODULE_INFO_SYM_AS_STR))?
        .cast::<HwModule>();
    // Safety: HMI is the vendor's hw_module_t.
    let open = unsafe { module.as_ref().methods.as_ref() }
        .and_then(|methods| methods.open)
        .ok_or(GpsShimError::MissingEntry("open"))?;

    let result = unsafe { open(module.as_ptr(), id, device) };
    if result < 0 {
        return Err(GpsShimError::VendorOpenFailed(result));
    }

    // Safety: `device` was just filled in by the vendor's open.
    unsafe { hook_opened_device(device) }?;

    tracing::info!("Loaded vendor GPS HAL {}", path.display());
    library.leak();
    Ok(())
}

/// Hook the device a vendor `open` produced, or close it on failure
///
/// # Safety
///
/// `*device` must be null or a live `gps_device_t` from the vendor's `open`.
unsafe fn hook_opened_device(device: *mut *mut HwDevice) -> Result<(), GpsShimError> {
    // Safety: a GPS module's open returns a gps_device_t.
    let gps = unsafe { (*device).cast::<GpsDevice>().as_mut() }.ok_or(GpsShimError::NoDevice)?;
    if let Err(e) = hook_device(gps) {
        // The vendor library is about to be unloaded
        if let Some(close) = gps.common.close {
            unsafe { close(&mut gps.common) };
        }
        unsafe { *device = ptr::null_mut() };
        return Err(e);
    }
    Ok(())
}

unsafe extern "C" fn open_gps(
    _module: *const HwModule,
    id: *const c_char,
    device: *mut *mut HwDevice,
) -> c_int {
    let config = ShimConfig::load_default();
    init_logging(env!("CARGO_PKG_NAME"), &config.log);

    match unsafe { open_vendor(&config.gps.vendor_library, id, device) } {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("Failed to open vendor GPS HAL: {}", e);
            -libc::EINVAL
        }
    }
}

static GPS_MODULE_METHODS: HwModuleMethods = HwModuleMethods {
    open: Some(open_gps),
};

/// `HAL_MODULE_INFO_SYM`; the HAL loader writes `dso` into it
#[repr(transparent)]
pub struct HalModuleInfo(UnsafeCell<HwModule>);

// Safety: only the HAL loader writes, once, before any other access.
unsafe impl Sync for HalModuleInfo {}

impl HalModuleInfo {
    pub fn as_ptr(&self) -> *const HwModule {
        self.0.get()
    }
}

#[unsafe(no_mangle)]
pub static HMI: HalModuleInfo = HalModuleInfo(UnsafeCell::new(HwModule {
    tag: HARDWARE_MODULE_TAG,
    module_api_version: 1,
    hal_api_version: 0,
    id: c"gps".as_ptr(),
    name: c"GSD4t GPS shim".as_ptr(),
    author: c"tuna-shims".as_ptr(),
    methods: &GPS_MODULE_METHODS,
    dso: ptr::null_mut(),
    reserved: [0; 32 - 7],
}));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::GPS_HARDWARE_MODULE_ID;

    #[test]
    fn test_module_info() {
        let module = unsafe { &*HMI.as_ptr() };
        assert_eq!(module.tag, HARDWARE_MODULE_TAG);
        assert_eq!(module.module_api_version, 1);
        let id = unsafe { CStr::from_ptr(module.id) };
        assert_eq!(id.to_str().unwrap(), GPS_HARDWARE_MODULE_ID);
        let name = unsafe { CStr::from_ptr(module.name) };
        assert_eq!(name, c"GSD4t GPS shim");
        let methods = unsafe { &*module.methods };
        assert!(methods.open.is_some());
    }

    #[test]
    fn test_open_fails_with_einval_without_vendor() {
        let mut device: *mut HwDevice = ptr::null_mut();
        let module = HMI.as_ptr();
        let open = unsafe { (*(*module).methods).open.unwrap() };

        // The stock vendor path does not exist on the build host
        let result = unsafe { open(module, c"gps".as_ptr(), &mut device) };
        assert_eq!(result, -libc::EINVAL);
        assert!(device.is_null());
    }

    #[test]
    fn test_unhooked_shim_refuses_calls() {
        let shim = GpsShim::new();
        assert!(shim.gps_interface(ptr::null_mut()).is_none());
        assert_eq!(shim.init(ptr::null_mut()), -libc::EINVAL);
        assert!(shim.get_extension(c"agps_ril".as_ptr()).is_null());
    }

    static CLOSED: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

    unsafe extern "C" fn close_device(_device: *mut HwDevice) -> c_int {
        CLOSED.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        0
    }

    #[test]
    fn test_unhookable_device_is_closed() {
        let mut gps = GpsDevice {
            common: HwDevice {
                tag: crate::gps::HARDWARE_DEVICE_TAG,
                version: 0,
                module: ptr::null_mut(),
                reserved: [0; 12],
                close: Some(close_device),
            },
            get_gps_interface: None,
        };
        let mut device = ptr::addr_of_mut!(gps).cast::<HwDevice>();

        let result = unsafe { hook_opened_device(&mut device) };

        assert!(matches!(
            result,
            Err(GpsShimError::MissingEntry("get_gps_interface"))
        ));
        assert!(device.is_null());
        assert_eq!(CLOSED.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_device_without_interface_entry() {
        let shim = GpsShim::new();
        let mut device = GpsDevice {
            common: HwDevice {
                tag: crate::gps::HARDWARE_DEVICE_TAG,
                version: 0,
                module: ptr::null_mut(),
                reserved: [0; 12],
                close: None,
            },
            get_gps_interface: None,
        };
        assert!(matches!(
            shim.hook_device(&mut device),
            Err(GpsShimError::MissingEntry("get_gps_interface"))
        ));
    }
}

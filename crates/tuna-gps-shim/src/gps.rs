//! GPS HAL ABI
//!
//! `#[repr(C)]` layouts from `hardware/hardware.h` and `hardware/gps.h`, plus
//! the pre-N shapes the GSD4t HAL was built against. Callbacks the shim only
//! copies are kept as opaque function pointers.

use std::ffi::{c_char, c_int, c_void};

/// `MAKE_TAG_CONSTANT('H', 'W', 'M', 'T')`
pub const HARDWARE_MODULE_TAG: u32 = u32::from_be_bytes(*b"HWMT");

/// `MAKE_TAG_CONSTANT('H', 'W', 'D', 'T')`
pub const HARDWARE_DEVICE_TAG: u32 = u32::from_be_bytes(*b"HWDT");

pub const GPS_HARDWARE_MODULE_ID: &str = "gps";
pub const AGPS_RIL_INTERFACE: &str = "agps_ril";

/// Symbol name of `HAL_MODULE_INFO_SYM`
pub const HAL_MODULE_INFO_SYM_AS_STR: &str = "HMI";

#[cfg(target_pointer_width = "64")]
pub type Reserved = u64;
#[cfg(not(target_pointer_width = "64"))]
pub type Reserved = u32;

pub type HwOpenFn = unsafe extern "C" fn(
    module: *const HwModule,
    id: *const c_char,
    device: *mut *mut HwDevice,
) -> c_int;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HwModuleMethods {
    pub open: Option<HwOpenFn>,
}

/// `struct hw_module_t`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HwModule {
    pub tag: u32,
    pub module_api_version: u16,
    pub hal_api_version: u16,
    pub id: *const c_char,
    pub name: *const c_char,
    pub author: *const c_char,
    pub methods: *const HwModuleMethods,
    /// Written by the HAL loader after `dlopen`
    pub dso: *mut c_void,
    pub reserved: [Reserved; 32 - 7],
}

/// `struct hw_device_t`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HwDevice {
    pub tag: u32,
    pub version: u32,
    pub module: *mut HwModule,
    pub reserved: [Reserved; 12],
    pub close: Option<unsafe extern "C" fn(device: *mut HwDevice) -> c_int>,
}

pub type GetGpsInterfaceFn = unsafe extern "C" fn(dev: *mut GpsDevice) -> *const GpsInterface;

/// `struct gps_device_t`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GpsDevice {
    pub common: HwDevice,
    pub get_gps_interface: Option<GetGpsInterfaceFn>,
}

/// A callback the shim passes along without calling
pub type OpaqueCallback = unsafe extern "C" fn();

/// `GpsCallbacks` as of Android N
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GpsCallbacks {
    pub size: usize,
    pub location_cb: Option<OpaqueCallback>,
    pub status_cb: Option<OpaqueCallback>,
    pub sv_status_cb: Option<OpaqueCallback>,
    pub nmea_cb: Option<OpaqueCallback>,
    pub set_capabilities_cb: Option<OpaqueCallback>,
    pub acquire_wakelock_cb: Option<OpaqueCallback>,
    pub release_wakelock_cb: Option<OpaqueCallback>,
    pub create_thread_cb: Option<OpaqueCallback>,
    pub request_utc_time_cb: Option<OpaqueCallback>,
    pub set_system_info_cb: Option<OpaqueCallback>,
    pub gnss_sv_status_cb: Option<OpaqueCallback>,
}

/// `GpsCallbacks` as the vendor HAL knows it; its `init` fails when handed
/// the two N-era callbacks
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GpsCallbacksLegacy {
    pub size: usize,
    pub location_cb: Option<OpaqueCallback>,
    pub status_cb: Option<OpaqueCallback>,
    pub sv_status_cb: Option<OpaqueCallback>,
    pub nmea_cb: Option<OpaqueCallback>,
    pub set_capabilities_cb: Option<OpaqueCallback>,
    pub acquire_wakelock_cb: Option<OpaqueCallback>,
    pub release_wakelock_cb: Option<OpaqueCallback>,
    pub create_thread_cb: Option<OpaqueCallback>,
    pub request_utc_time_cb: Option<OpaqueCallback>,
}

impl GpsCallbacksLegacy {
    pub const EMPTY: Self = Self {
        size: 0,
        location_cb: None,
        status_cb: None,
        sv_status_cb: None,
        nmea_cb: None,
        set_capabilities_cb: None,
        acquire_wakelock_cb: None,
        release_wakelock_cb: None,
        create_thread_cb: None,
        request_utc_time_cb: None,
    };
}

pub type GpsInitFn = unsafe extern "C" fn(callbacks: *mut GpsCallbacks) -> c_int;
pub type LegacyGpsInitFn = unsafe extern "C" fn(callbacks: *mut GpsCallbacksLegacy) -> c_int;
pub type GetExtensionFn = unsafe extern "C" fn(name: *const c_char) -> *const c_void;

/// `GpsInterface`
///
/// `init` is typed with the current callbacks; the vendor's entry really
/// takes [`GpsCallbacksLegacy`] and is only ever called as such.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GpsInterface {
    pub size: usize,
    pub init: Option<GpsInitFn>,
    pub start: Option<unsafe extern "C" fn() -> c_int>,
    pub stop: Option<unsafe extern "C" fn() -> c_int>,
    pub cleanup: Option<unsafe extern "C" fn()>,
    pub inject_time:
        Option<unsafe extern "C" fn(time: i64, time_reference: i64, uncertainty: c_int) -> c_int>,
    pub inject_location:
        Option<unsafe extern "C" fn(latitude: f64, longitude: f64, accuracy: f32) -> c_int>,
    pub delete_aiding_data: Option<unsafe extern "C" fn(flags: u16)>,
    pub set_position_mode: Option<
        unsafe extern "C" fn(
            mode: u32,
            recurrence: u32,
            min_interval: u32,
            preferred_accuracy: u32,
            preferred_time: u32,
        ) -> c_int,
    >,
    pub get_extension: Option<GetExtensionFn>,
}

/// `AGpsRefLocationType`
pub type AGpsRefLocationType = u16;

pub const AGPS_REF_LOCATION_TYPE_GSM_CELLID: AGpsRefLocationType = 1;
pub const AGPS_REF_LOCATION_TYPE_UMTS_CELLID: AGpsRefLocationType = 2;
pub const AGPS_REF_LOCATION_TYPE_LTE_CELLID: AGpsRefLocationType = 4;

/// `AGpsRefLocationCellID` as of Android N
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AGpsRefLocationCellId {
    pub type_: AGpsRefLocationType,
    pub mcc: u16,
    pub mnc: u16,
    /// In LTE, populated with the tac
    pub lac: u16,
    pub cid: u32,
    pub tac: u16,
    pub pcid: u16,
}

/// `AGpsRefLocationCellID` before LTE fields were added
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AGpsRefLocationCellIdNoLte {
    pub type_: AGpsRefLocationType,
    pub mcc: u16,
    pub mnc: u16,
    pub lac: u16,
    pub cid: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AGpsRefLocationMac {
    pub mac: [u8; 6],
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union AGpsRefLocationUnion {
    pub cell_id: AGpsRefLocationCellId,
    pub mac: AGpsRefLocationMac,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union AGpsRefLocationUnionNoLte {
    pub cell_id: AGpsRefLocationCellIdNoLte,
    pub mac: AGpsRefLocationMac,
}

/// `AGpsRefLocation`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct AGpsRefLocation {
    pub type_: AGpsRefLocationType,
    pub u: AGpsRefLocationUnion,
}

/// `AGpsRefLocation` as the vendor HAL knows it
#[repr(C)]
#[derive(Clone, Copy)]
pub struct AGpsRefLocationNoLte {
    pub type_: AGpsRefLocationType,
    pub u: AGpsRefLocationUnionNoLte,
}

pub type SetRefLocationFn =
    unsafe extern "C" fn(agps_reflocation: *const AGpsRefLocation, sz_struct: usize);
pub type LegacySetRefLocationFn =
    unsafe extern "C" fn(agps_reflocation: *const AGpsRefLocationNoLte, sz_struct: usize);

/// `AGpsRilInterface`
///
/// As with [`GpsInterface::init`], the vendor's `set_ref_location` really
/// takes [`AGpsRefLocationNoLte`].
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AGpsRilInterface {
    pub size: usize,
    pub init: Option<unsafe extern "C" fn(callbacks: *mut c_void)>,
    pub set_ref_location: Option<SetRefLocationFn>,
    pub set_set_id: Option<unsafe extern "C" fn(type_: u16, setid: *const c_char)>,
    pub ni_message: Option<unsafe extern "C" fn(msg: *mut u8, len: usize)>,
    pub update_network_state: Option<
        unsafe extern "C" fn(connected: c_int, type_: c_int, roaming: c_int, extra_info: *const c_char),
    >,
    pub update_network_availability:
        Option<unsafe extern "C" fn(available: c_int, apn: *const c_char)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_tags() {
        assert_eq!(HARDWARE_MODULE_TAG, 0x4857_4D54);
        assert_eq!(HARDWARE_DEVICE_TAG, 0x4857_4454);
    }

    #[test]
    fn test_hw_module_layout() {
        assert_eq!(offset_of!(HwModule, id), 8);
        assert_eq!(offset_of!(HwModule, dso), 8 + 4 * size_of::<usize>());
        #[cfg(target_pointer_width = "64")]
        assert_eq!(size_of::<HwModule>(), 248);
        #[cfg(target_pointer_width = "32")]
        assert_eq!(size_of::<HwModule>(), 128);
    }

    #[test]
    fn test_legacy_callbacks_drop_the_last_two() {
        let ptr = size_of::<usize>();
        assert_eq!(size_of::<GpsCallbacks>(), 12 * ptr);
        assert_eq!(size_of::<GpsCallbacksLegacy>(), 10 * ptr);
    }

    #[test]
    fn test_ref_location_layouts() {
        assert_eq!(size_of::<AGpsRefLocationCellId>(), 16);
        assert_eq!(size_of::<AGpsRefLocationCellIdNoLte>(), 12);
        assert_eq!(offset_of!(AGpsRefLocation, u), 4);
        assert_eq!(size_of::<AGpsRefLocation>(), 20);
        assert_eq!(size_of::<AGpsRefLocationNoLte>(), 16);
    }
}

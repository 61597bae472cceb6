//! Radio Interface Layer ABI
//!
//! Constants and `#[repr(C)]` layouts from `telephony/ril.h` as shipped with
//! the platform the shim targets, plus the two legacy layouts the tuna vendor
//! RIL still produces. Field order and sizes must stay byte-exact: these
//! structs are read from and handed to C code.

use std::ffi::{c_char, c_int, c_void};
use std::ptr;

/// Opaque request handle owned by libril
pub type RilToken = *mut c_void;

/// `RIL_Errno`
pub type RilErrno = c_int;

pub const RIL_E_SUCCESS: RilErrno = 0;
pub const RIL_E_GENERIC_FAILURE: RilErrno = 2;
pub const RIL_E_REQUEST_NOT_SUPPORTED: RilErrno = 6;

/// Request codes (`RIL_REQUEST_*`) the shim inspects
pub mod request {
    use std::ffi::c_int;

    pub const GET_SIM_STATUS: c_int = 1;
    pub const SIM_TRANSMIT_APDU_BASIC: c_int = 114;
    pub const SIM_OPEN_CHANNEL: c_int = 115;
    pub const SIM_CLOSE_CHANNEL: c_int = 116;
    pub const SIM_TRANSMIT_APDU_CHANNEL: c_int = 117;
    pub const NV_READ_ITEM: c_int = 118;
    pub const NV_WRITE_ITEM: c_int = 119;
    pub const NV_WRITE_CDMA_PRL: c_int = 120;
    pub const NV_RESET_CONFIG: c_int = 121;
    pub const SET_UICC_SUBSCRIPTION: c_int = 122;
    pub const ALLOW_DATA: c_int = 123;
    pub const GET_HARDWARE_CONFIG: c_int = 124;
    pub const SIM_AUTHENTICATION: c_int = 125;
    pub const GET_DC_RT_INFO: c_int = 126;
    pub const SET_DC_RT_INFO_RATE: c_int = 127;
    pub const SET_DATA_PROFILE: c_int = 128;
    pub const SHUTDOWN: c_int = 129;
    pub const GET_RADIO_CAPABILITY: c_int = 130;
    pub const SET_RADIO_CAPABILITY: c_int = 131;
    pub const START_LCE: c_int = 132;
    pub const STOP_LCE: c_int = 133;
    pub const PULL_LCEDATA: c_int = 134;
}

/// Unsolicited response codes (`RIL_UNSOL_*`) the shim inspects or emits
pub mod unsol {
    use std::ffi::c_int;

    pub const RESPONSE_RADIO_STATE_CHANGED: c_int = 1000;
    pub const SIM_REFRESH: c_int = 1017;
    pub const RESPONSE_SIM_STATUS_CHANGED: c_int = 1019;
    pub const CDMA_SUBSCRIPTION_SOURCE_CHANGED: c_int = 1031;
    pub const VOICE_RADIO_TECH_CHANGED: c_int = 1035;
}

/// `RIL_RadioTechnology` values and the matching `RAF_*` bits
pub mod radio_tech {
    use std::ffi::c_int;

    pub const UNKNOWN: c_int = 0;
    pub const GPRS: c_int = 1;
    pub const EDGE: c_int = 2;
    pub const UMTS: c_int = 3;
    pub const IS95A: c_int = 4;
    pub const IS95B: c_int = 5;
    pub const ONE_X_RTT: c_int = 6;
    pub const EVDO_0: c_int = 7;
    pub const EVDO_A: c_int = 8;
    pub const HSDPA: c_int = 9;
    pub const HSUPA: c_int = 10;
    pub const HSPA: c_int = 11;
    pub const EVDO_B: c_int = 12;
    pub const EHRPD: c_int = 13;
    pub const LTE: c_int = 14;
    pub const HSPAP: c_int = 15;
    pub const GSM: c_int = 16;
    pub const TD_SCDMA: c_int = 17;
    pub const IWLAN: c_int = 18;

    /// `RAF_*` bit for a radio technology
    pub const fn raf(tech: c_int) -> c_int {
        1 << tech
    }

    pub const RAF_UNKNOWN: c_int = raf(UNKNOWN);
}

pub const RIL_RADIO_CAPABILITY_VERSION: c_int = 1;
pub const RC_PHASE_CONFIGURED: c_int = 0;
pub const RC_STATUS_SUCCESS: c_int = 1;
pub const MAX_UUID_LENGTH: usize = 64;
pub const RIL_CARD_MAX_APPS: usize = 8;

/// `RIL_AppStatus`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppStatus {
    pub app_type: c_int,
    pub app_state: c_int,
    pub perso_substate: c_int,
    pub aid_ptr: *mut c_char,
    pub app_label_ptr: *mut c_char,
    pub pin1_replaced: c_int,
    pub pin1: c_int,
    pub pin2: c_int,
}

impl AppStatus {
    pub const EMPTY: Self = Self {
        app_type: 0,
        app_state: 0,
        perso_substate: 0,
        aid_ptr: ptr::null_mut(),
        app_label_ptr: ptr::null_mut(),
        pin1_replaced: 0,
        pin1: 0,
        pin2: 0,
    };
}

/// `RIL_CardStatus_v5`, what the vendor RIL answers `GET_SIM_STATUS` with
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardStatusV5 {
    pub card_state: c_int,
    pub universal_pin_state: c_int,
    pub gsm_umts_subscription_app_index: c_int,
    pub cdma_subscription_app_index: c_int,
    pub num_applications: c_int,
    pub applications: [AppStatus; RIL_CARD_MAX_APPS],
}

/// `RIL_CardStatus_v6`, what the platform expects
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardStatusV6 {
    pub card_state: c_int,
    pub universal_pin_state: c_int,
    pub gsm_umts_subscription_app_index: c_int,
    pub cdma_subscription_app_index: c_int,
    pub ims_subscription_app_index: c_int,
    pub num_applications: c_int,
    pub applications: [AppStatus; RIL_CARD_MAX_APPS],
}

/// Legacy `RIL_UNSOL_SIM_REFRESH` payload, `int[2]`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimRefreshLegacy {
    pub result: c_int,
    pub ef_id: c_int,
}

/// `RIL_SimRefreshResponse_v7`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimRefreshResponseV7 {
    pub result: c_int,
    pub ef_id: c_int,
    pub aid: *mut c_char,
}

/// `RIL_RadioCapability`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioCapability {
    pub version: c_int,
    pub session: c_int,
    pub phase: c_int,
    pub rat: c_int,
    pub logical_modem_uuid: [c_char; MAX_UUID_LENGTH],
    pub status: c_int,
}

pub type OnRequestCompleteFn =
    unsafe extern "C" fn(t: RilToken, e: RilErrno, response: *mut c_void, responselen: usize);
pub type OnUnsolicitedResponseFn =
    unsafe extern "C" fn(unsol_response: c_int, data: *const c_void, datalen: usize);
pub type TimedCallbackFn = unsafe extern "C" fn(param: *mut c_void);
pub type RequestTimedCallbackFn = unsafe extern "C" fn(
    callback: Option<TimedCallbackFn>,
    param: *mut c_void,
    relative_time: *const libc::timeval,
);
pub type OnRequestAckFn = unsafe extern "C" fn(t: RilToken);

/// `struct RIL_Env`, the platform callbacks handed to `RIL_Init`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RilEnv {
    pub on_request_complete: Option<OnRequestCompleteFn>,
    pub on_unsolicited_response: Option<OnUnsolicitedResponseFn>,
    pub request_timed_callback: Option<RequestTimedCallbackFn>,
    pub on_request_ack: Option<OnRequestAckFn>,
}

pub type OnRequestFn =
    unsafe extern "C" fn(request: c_int, data: *mut c_void, datalen: usize, t: RilToken);
pub type OnStateRequestFn = unsafe extern "C" fn() -> c_int;
pub type SupportsFn = unsafe extern "C" fn(request_code: c_int) -> c_int;
pub type OnCancelFn = unsafe extern "C" fn(t: RilToken);
pub type GetVersionFn = unsafe extern "C" fn() -> *const c_char;

/// `RIL_RadioFunctions`, the table `RIL_Init` returns
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RilRadioFunctions {
    pub version: c_int,
    pub on_request: Option<OnRequestFn>,
    pub on_state_request: Option<OnStateRequestFn>,
    pub supports: Option<SupportsFn>,
    pub on_cancel: Option<OnCancelFn>,
    pub get_version: Option<GetVersionFn>,
}

/// Signature of `RIL_Init`
pub type RilInitFn = unsafe extern "C" fn(
    env: *const RilEnv,
    argc: c_int,
    argv: *mut *mut c_char,
) -> *const RilRadioFunctions;

/// libril's private `CommandInfo`
#[repr(C)]
pub struct CommandInfo {
    pub request_number: c_int,
    pub dispatch_function: Option<unsafe extern "C" fn(p: *mut c_void, p_ri: *mut c_void)>,
    pub response_function:
        Option<unsafe extern "C" fn(p: *mut c_void, response: *mut c_void, len: usize) -> c_int>,
}

/// libril's private `RequestInfo`; every `RilToken` points at one
#[repr(C)]
pub struct RequestInfo {
    pub token: i32,
    pub p_ci: *mut CommandInfo,
    pub p_next: *mut RequestInfo,
    pub cancelled: c_char,
    pub local: c_char,
    pub socket_id: c_int,
    pub was_ack_sent: c_int,
}

/// Recover the request code behind a libril token
///
/// # Safety
///
/// `t` must be null or a token libril handed to `onRequest`, still pending.
pub unsafe fn request_number(t: RilToken) -> Option<c_int> {
    let info = t as *const RequestInfo;
    if info.is_null() {
        return None;
    }
    // Safety: non-null tokens are live `RequestInfo`s per the contract above.
    let command = unsafe { (*info).p_ci };
    if command.is_null() {
        return None;
    }
    // Safety: `pCI` points into libril's static command table.
    Some(unsafe { (*command).request_number })
}

/// Human-readable name of a request code, for logging
pub fn request_to_string(code: c_int) -> &'static str {
    match code {
        request::GET_SIM_STATUS => "GET_SIM_STATUS",
        request::SIM_TRANSMIT_APDU_BASIC => "SIM_TRANSMIT_APDU_BASIC",
        request::SIM_OPEN_CHANNEL => "SIM_OPEN_CHANNEL",
        request::SIM_CLOSE_CHANNEL => "SIM_CLOSE_CHANNEL",
        request::SIM_TRANSMIT_APDU_CHANNEL => "SIM_TRANSMIT_APDU_CHANNEL",
        request::NV_READ_ITEM => "NV_READ_ITEM",
        request::NV_WRITE_ITEM => "NV_WRITE_ITEM",
        request::NV_WRITE_CDMA_PRL => "NV_WRITE_CDMA_PRL",
        request::NV_RESET_CONFIG => "NV_RESET_CONFIG",
        request::SET_UICC_SUBSCRIPTION => "SET_UICC_SUBSCRIPTION",
        request::ALLOW_DATA => "ALLOW_DATA",
        request::GET_HARDWARE_CONFIG => "GET_HARDWARE_CONFIG",
        request::SIM_AUTHENTICATION => "SIM_AUTHENTICATION",
        request::GET_DC_RT_INFO => "GET_DC_RT_INFO",
        request::SET_DC_RT_INFO_RATE => "SET_DC_RT_INFO_RATE",
        request::SET_DATA_PROFILE => "SET_DATA_PROFILE",
        request::SHUTDOWN => "SHUTDOWN",
        request::GET_RADIO_CAPABILITY => "GET_RADIO_CAPABILITY",
        request::SET_RADIO_CAPABILITY => "SET_RADIO_CAPABILITY",
        request::START_LCE => "START_LCE",
        request::STOP_LCE => "STOP_LCE",
        request::PULL_LCEDATA => "PULL_LCEDATA",
        _ => "<vendor request>",
    }
}

/// Human-readable name of an unsolicited response code, for logging
pub fn unsol_to_string(code: c_int) -> &'static str {
    match code {
        unsol::RESPONSE_RADIO_STATE_CHANGED => "UNSOL_RESPONSE_RADIO_STATE_CHANGED",
        unsol::SIM_REFRESH => "UNSOL_SIM_REFRESH",
        unsol::RESPONSE_SIM_STATUS_CHANGED => "UNSOL_RESPONSE_SIM_STATUS_CHANGED",
        unsol::CDMA_SUBSCRIPTION_SOURCE_CHANGED => "UNSOL_CDMA_SUBSCRIPTION_SOURCE_CHANGED",
        unsol::VOICE_RADIO_TECH_CHANGED => "UNSOL_VOICE_RADIO_TECH_CHANGED",
        _ => "<vendor unsolicited>",
    }
}

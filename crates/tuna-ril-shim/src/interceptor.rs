//! Request interception table
//!
//! Decides, per request code, whether the shim answers a request itself or
//! hands it to the vendor RIL. The decision depends only on the request code
//! and the device variant, never on vendor state.

use crate::ril::{
    RC_PHASE_CONFIGURED, RC_STATUS_SUCCESS, RIL_RADIO_CAPABILITY_VERSION, RadioCapability,
    MAX_UUID_LENGTH, radio_tech, request,
};
use std::ffi::c_int;
use tuna_config::DeviceVariant;

/// Requests introduced after the vendor RIL was built (Android 4.3), answered
/// with `REQUEST_NOT_SUPPORTED` instead of reaching a vendor that would
/// misinterpret them
pub const POST_BASELINE_REQUESTS: [c_int; 20] = [
    request::SIM_TRANSMIT_APDU_BASIC,
    request::SIM_OPEN_CHANNEL,
    request::SIM_CLOSE_CHANNEL,
    request::SIM_TRANSMIT_APDU_CHANNEL,
    request::NV_READ_ITEM,
    request::NV_WRITE_ITEM,
    request::NV_WRITE_CDMA_PRL,
    request::NV_RESET_CONFIG,
    request::SET_UICC_SUBSCRIPTION,
    request::ALLOW_DATA,
    request::GET_HARDWARE_CONFIG,
    request::SIM_AUTHENTICATION,
    request::GET_DC_RT_INFO,
    request::SET_DC_RT_INFO_RATE,
    request::SET_DATA_PROFILE,
    request::SHUTDOWN,
    request::SET_RADIO_CAPABILITY,
    request::START_LCE,
    request::STOP_LCE,
    request::PULL_LCEDATA,
];

/// What to do with an incoming request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Complete immediately with `RIL_E_REQUEST_NOT_SUPPORTED`
    NotSupported,
    /// Complete immediately with `RIL_E_SUCCESS` and this capability
    Capability(RadioCapability),
    /// Pass through to the vendor unchanged
    Forward,
}

/// Classify a request
pub fn dispatch(request_code: c_int, variant: DeviceVariant) -> Disposition {
    if request_code == request::GET_RADIO_CAPABILITY {
        return match radio_capability(variant) {
            Some(capability) => Disposition::Capability(capability),
            None => Disposition::NotSupported,
        };
    }

    if POST_BASELINE_REQUESTS.contains(&request_code) {
        Disposition::NotSupported
    } else {
        Disposition::Forward
    }
}

/// Radio access family bitmask the modem of `variant` supports
pub fn radio_access_family(variant: DeviceVariant) -> Option<c_int> {
    use radio_tech::*;

    match variant {
        DeviceVariant::Maguro => Some(
            raf(GSM)
                | raf(GPRS)
                | raf(EDGE)
                | raf(HSUPA)
                | raf(HSDPA)
                | raf(HSPA)
                | raf(HSPAP)
                | raf(UMTS),
        ),
        DeviceVariant::Toro | DeviceVariant::ToroPlus => Some(
            raf(LTE)
                | raf(IS95A)
                | raf(IS95B)
                | raf(ONE_X_RTT)
                | raf(EVDO_0)
                | raf(EVDO_A)
                | raf(EVDO_B)
                | raf(EHRPD),
        ),
        DeviceVariant::Unknown => None,
    }
}

/// The `GET_RADIO_CAPABILITY` answer for `variant`
pub fn radio_capability(variant: DeviceVariant) -> Option<RadioCapability> {
    radio_access_family(variant).map(|rat| RadioCapability {
        version: RIL_RADIO_CAPABILITY_VERSION,
        session: 0,
        phase: RC_PHASE_CONFIGURED,
        rat,
        logical_modem_uuid: [0; MAX_UUID_LENGTH],
        status: RC_STATUS_SUCCESS,
    })
}

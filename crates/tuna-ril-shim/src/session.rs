//! The RIL session: the shim sitting between libril and the vendor RIL
//!
//! Platform-facing calls arrive through [`RadioFunctions`] and are either
//! answered here or delegated to the vendor. Vendor-facing callbacks arrive
//! through [`RilShim::on_request_complete`] and
//! [`RilShim::on_unsolicited_response`] and are upgraded before reaching the
//! platform's [`RilCallbacks`].

use crate::error::ShimError;
use crate::interceptor::{self, Disposition};
use crate::payload::{Payload, Token};
use crate::radio_state::{RadioState, SubStateEvent, SubStateTracker};
use crate::ril::{
    RIL_E_GENERIC_FAILURE, RIL_E_REQUEST_NOT_SUPPORTED, RIL_E_SUCCESS, RilErrno, request,
    request_to_string, unsol, unsol_to_string,
};
use crate::upgrade;
use std::ffi::{CStr, c_int};
use std::sync::{Mutex, OnceLock};
use tuna_config::DeviceVariant;

/// The radio function table, as seen from the platform
pub trait RadioFunctions: Send + Sync {
    /// RIL interface version implemented
    fn version(&self) -> c_int;

    fn on_request(&self, request: c_int, data: Payload<'_>, token: Token);

    /// Current radio state, raw
    fn on_state_request(&self) -> c_int;

    fn supports(&self, request: c_int) -> bool;

    fn on_cancel(&self, token: Token);

    /// Free-form implementation version string
    fn get_version(&self) -> Option<&CStr>;
}

/// The callbacks libril hands to a RIL in its environment table
pub trait RilCallbacks: Send + Sync {
    fn on_request_complete(&self, token: Token, error: RilErrno, response: Payload<'_>);

    fn on_unsolicited_response(&self, code: c_int, data: Payload<'_>);
}

/// Shim state for one vendor RIL session
pub struct RilShim<P, V> {
    variant: DeviceVariant,
    advertised_version: c_int,
    platform: P,
    vendor: OnceLock<V>,
    sub_states: Mutex<SubStateTracker>,
}

impl<P: RilCallbacks, V: RadioFunctions> RilShim<P, V> {
    /// A session with no vendor attached yet
    ///
    /// The vendor is attached once its `RIL_Init` returns; callbacks it raises
    /// before that are still routed through the session.
    pub fn new(variant: DeviceVariant, advertised_version: c_int, platform: P) -> Self {
        Self {
            variant,
            advertised_version,
            platform,
            vendor: OnceLock::new(),
            sub_states: Mutex::new(SubStateTracker::new()),
        }
    }

    pub fn attach_vendor(&self, vendor: V) -> Result<(), ShimError> {
        self.vendor
            .set(vendor)
            .map_err(|_| ShimError::AlreadyInitialized)
    }

    pub fn vendor(&self) -> Option<&V> {
        self.vendor.get()
    }

    pub fn variant(&self) -> DeviceVariant {
        self.variant
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Snapshot of the decoded sub-states
    pub fn sub_states(&self) -> SubStateTracker {
        self.sub_states
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Vendor completed a request; `request` is the code recovered from the token
    pub fn on_request_complete(
        &self,
        request: Option<c_int>,
        token: Token,
        error: RilErrno,
        response: Payload<'_>,
    ) {
        if request == Some(request::GET_SIM_STATUS) {
            if let Some(card_status) = upgrade::upgrade_card_status(response) {
                tracing::debug!("Upgrading GET_SIM_STATUS response from v5 to v6");
                self.platform
                    .on_request_complete(token, error, Payload::of(&card_status));
                return;
            }
        }

        self.platform.on_request_complete(token, error, response);
    }

    /// Vendor raised an unsolicited response
    pub fn on_unsolicited_response(&self, code: c_int, data: Payload<'_>) {
        match code {
            unsol::SIM_REFRESH => {
                if let Some(refresh) = upgrade::upgrade_sim_refresh(data) {
                    tracing::debug!("Upgrading {} to v7", unsol_to_string(code));
                    self.platform
                        .on_unsolicited_response(code, Payload::of(&refresh));
                    return;
                }
            }
            unsol::RESPONSE_RADIO_STATE_CHANGED => self.synthesize_sub_state_events(),
            _ => {}
        }

        self.platform.on_unsolicited_response(code, data);
    }

    fn synthesize_sub_state_events(&self) {
        let Some(vendor) = self.vendor.get() else {
            tracing::debug!("Radio state changed before vendor init finished");
            return;
        };
        let raw_state = vendor.on_state_request();

        // Lock released before calling back into the platform
        let events = self
            .sub_states
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .observe(raw_state);

        for event in events {
            self.emit(event);
        }
    }

    fn emit(&self, event: SubStateEvent) {
        let code = event.code();
        tracing::debug!("Synthesizing {} ({:?})", unsol_to_string(code), event);
        match event.payload() {
            Some(value) => self
                .platform
                .on_unsolicited_response(code, Payload::of(&value)),
            None => self
                .platform
                .on_unsolicited_response(code, Payload::empty()),
        }
    }
}

impl<P: RilCallbacks, V: RadioFunctions> RadioFunctions for RilShim<P, V> {
    fn version(&self) -> c_int {
        let vendor_version = self.vendor.get().map(|v| v.version()).unwrap_or(0);
        vendor_version.max(self.advertised_version)
    }

    fn on_request(&self, request: c_int, data: Payload<'_>, token: Token) {
        match interceptor::dispatch(request, self.variant) {
            Disposition::NotSupported => {
                tracing::debug!(
                    "Answering {} ({}) as not supported",
                    request_to_string(request),
                    request
                );
                self.platform.on_request_complete(
                    token,
                    RIL_E_REQUEST_NOT_SUPPORTED,
                    Payload::empty(),
                );
            }
            Disposition::Capability(capability) => {
                tracing::debug!(
                    "Answering {} for {} with rat {:#x}",
                    request_to_string(request),
                    self.variant,
                    capability.rat
                );
                self.platform
                    .on_request_complete(token, RIL_E_SUCCESS, Payload::of(&capability));
            }
            Disposition::Forward => match self.vendor.get() {
                Some(vendor) => vendor.on_request(request, data, token),
                None => {
                    tracing::error!("Request {} arrived without a vendor RIL", request);
                    self.platform
                        .on_request_complete(token, RIL_E_GENERIC_FAILURE, Payload::empty());
                }
            },
        }
    }

    fn on_state_request(&self) -> c_int {
        let Some(vendor) = self.vendor.get() else {
            return RadioState::Unavailable.as_raw();
        };
        let raw = vendor.on_state_request();
        match RadioState::from_raw(raw) {
            Some(state) => state.modernized().as_raw(),
            None => raw,
        }
    }

    fn supports(&self, request: c_int) -> bool {
        self.vendor.get().is_some_and(|v| v.supports(request))
    }

    fn on_cancel(&self, token: Token) {
        if let Some(vendor) = self.vendor.get() {
            vendor.on_cancel(token);
        }
    }

    fn get_version(&self) -> Option<&CStr> {
        self.vendor.get().and_then(|v| v.get_version())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[derive(Default)]
    struct Recorder {
        completions: Mutex<Vec<(Token, RilErrno, usize)>>,
        unsolicited: Mutex<Vec<(c_int, Option<c_int>)>>,
    }

    impl RilCallbacks for Recorder {
        fn on_request_complete(&self, token: Token, error: RilErrno, response: Payload<'_>) {
            self.completions
                .lock()
                .unwrap()
                .push((token, error, response.len()));
        }

        fn on_unsolicited_response(&self, code: c_int, data: Payload<'_>) {
            self.unsolicited
                .lock()
                .unwrap()
                .push((code, data.read::<c_int>()));
        }
    }

    struct StubVendor {
        state: AtomicI32,
        forwarded: Mutex<Vec<c_int>>,
    }

    impl StubVendor {
        fn new(state: RadioState) -> Self {
            Self {
                state: AtomicI32::new(state.as_raw()),
                forwarded: Mutex::new(Vec::new()),
            }
        }
    }

    impl RadioFunctions for StubVendor {
        fn version(&self) -> c_int {
            6
        }
        fn on_request(&self, request: c_int, _data: Payload<'_>, _token: Token) {
            self.forwarded.lock().unwrap().push(request);
        }
        fn on_state_request(&self) -> c_int {
            self.state.load(Ordering::SeqCst)
        }
        fn supports(&self, request: c_int) -> bool {
            request < 114
        }
        fn on_cancel(&self, _token: Token) {}
        fn get_version(&self) -> Option<&CStr> {
            Some(c"Samsung RIL(IPC) v2.0")
        }
    }

    fn token(n: usize) -> Token {
        Token::from_raw(n as crate::ril::RilToken)
    }

    fn session(variant: DeviceVariant, state: RadioState) -> RilShim<Recorder, StubVendor> {
        let shim = RilShim::new(variant, 7, Recorder::default());
        shim.attach_vendor(StubVendor::new(state)).unwrap();
        shim
    }

    #[test]
    fn test_version_is_at_least_advertised() {
        let shim = session(DeviceVariant::Maguro, RadioState::Off);
        assert_eq!(shim.version(), 7);

        let shim: RilShim<Recorder, StubVendor> =
            RilShim::new(DeviceVariant::Maguro, 5, Recorder::default());
        shim.attach_vendor(StubVendor::new(RadioState::Off)).unwrap();
        assert_eq!(shim.version(), 6);
    }

    #[test]
    fn test_attach_vendor_twice_fails() {
        let shim = session(DeviceVariant::Toro, RadioState::Off);
        let result = shim.attach_vendor(StubVendor::new(RadioState::On));
        assert!(matches!(result, Err(ShimError::AlreadyInitialized)));
    }

    #[test]
    fn test_request_before_vendor_attached() {
        let shim: RilShim<Recorder, StubVendor> =
            RilShim::new(DeviceVariant::Toro, 7, Recorder::default());
        shim.on_request(request::GET_SIM_STATUS, Payload::empty(), token(1));

        let completions = shim.platform().completions.lock().unwrap();
        assert_eq!(*completions, vec![(token(1), RIL_E_GENERIC_FAILURE, 0)]);
        assert_eq!(shim.on_state_request(), RadioState::Unavailable.as_raw());
    }

    #[test]
    fn test_state_query_modernizes_legacy_states() {
        let shim = session(DeviceVariant::Toro, RadioState::RuimReady);
        assert_eq!(shim.on_state_request(), RadioState::On.as_raw());

        shim.vendor()
            .unwrap()
            .state
            .store(RadioState::Unavailable.as_raw(), Ordering::SeqCst);
        assert_eq!(shim.on_state_request(), RadioState::Unavailable.as_raw());

        shim.vendor().unwrap().state.store(42, Ordering::SeqCst);
        assert_eq!(shim.on_state_request(), 42);
    }

    #[test]
    fn test_radio_state_change_before_vendor_attached_is_forwarded_only() {
        let shim: RilShim<Recorder, StubVendor> =
            RilShim::new(DeviceVariant::Maguro, 7, Recorder::default());
        shim.on_unsolicited_response(unsol::RESPONSE_RADIO_STATE_CHANGED, Payload::empty());

        let unsolicited = shim.platform().unsolicited.lock().unwrap();
        assert_eq!(*unsolicited, vec![(unsol::RESPONSE_RADIO_STATE_CHANGED, None)]);
        assert_eq!(shim.sub_states(), SubStateTracker::new());
    }

    #[test]
    fn test_pass_through_entries_delegate() {
        let shim = session(DeviceVariant::Maguro, RadioState::On);
        assert!(shim.supports(request::GET_SIM_STATUS));
        assert!(!shim.supports(request::SHUTDOWN));
        assert_eq!(shim.get_version(), Some(c"Samsung RIL(IPC) v2.0"));
    }
}

//! Legacy radio state decoding
//!
//! Pre-v7 RILs encode SIM readiness and the CDMA/GSM personality of the modem
//! in the radio state itself (`SIM_READY`, `RUIM_NOT_READY`, `NV_READY`, ...).
//! Newer platforms only understand `OFF`, `UNAVAILABLE` and `ON` and expect
//! dedicated unsolicited events for the rest. This module derives those three
//! sub-states and tracks which of them changed.

use crate::ril::{radio_tech, unsol};
use std::ffi::c_int;

/// `RIL_RadioState`, ordered by its raw value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum RadioState {
    Off = 0,
    Unavailable = 1,
    SimNotReady = 2,
    SimLockedOrAbsent = 3,
    SimReady = 4,
    RuimNotReady = 5,
    RuimReady = 6,
    RuimLockedOrAbsent = 7,
    NvNotReady = 8,
    NvReady = 9,
    On = 10,
}

impl RadioState {
    pub fn from_raw(raw: c_int) -> Option<Self> {
        Some(match raw {
            0 => RadioState::Off,
            1 => RadioState::Unavailable,
            2 => RadioState::SimNotReady,
            3 => RadioState::SimLockedOrAbsent,
            4 => RadioState::SimReady,
            5 => RadioState::RuimNotReady,
            6 => RadioState::RuimReady,
            7 => RadioState::RuimLockedOrAbsent,
            8 => RadioState::NvNotReady,
            9 => RadioState::NvReady,
            10 => RadioState::On,
            _ => return None,
        })
    }

    pub fn as_raw(self) -> c_int {
        self as c_int
    }

    /// Between `UNAVAILABLE` and `ON`: only pre-v7 RILs report these
    pub fn is_legacy(self) -> bool {
        self > RadioState::Unavailable && self < RadioState::On
    }

    /// The state reported to the platform in place of this one
    pub fn modernized(self) -> Self {
        if self.is_legacy() {
            RadioState::On
        } else {
            self
        }
    }
}

/// `CDMA_SUBSCRIPTION_SOURCE_*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SubscriptionSource {
    RuimSim = 0,
    Nv = 1,
}

/// Whether a radio technology belongs to the 3GPP2 (CDMA) family
pub fn is_3gpp2(tech: c_int) -> bool {
    matches!(
        tech,
        radio_tech::IS95A
            | radio_tech::IS95B
            | radio_tech::ONE_X_RTT
            | radio_tech::EVDO_0
            | radio_tech::EVDO_A
            | radio_tech::EVDO_B
            | radio_tech::EHRPD
    )
}

/// Voice radio technology implied by a legacy state, `None` for non-legacy states
pub fn decode_voice_radio_technology(state: RadioState) -> Option<c_int> {
    match state {
        RadioState::SimNotReady | RadioState::SimLockedOrAbsent | RadioState::SimReady => {
            Some(radio_tech::UMTS)
        }
        RadioState::RuimNotReady
        | RadioState::RuimReady
        | RadioState::RuimLockedOrAbsent
        | RadioState::NvNotReady
        | RadioState::NvReady => Some(radio_tech::ONE_X_RTT),
        RadioState::Off | RadioState::Unavailable | RadioState::On => None,
    }
}

/// CDMA subscription source implied by a legacy state, `None` for non-legacy states
pub fn decode_subscription_source(state: RadioState) -> Option<SubscriptionSource> {
    match state {
        RadioState::SimNotReady
        | RadioState::SimLockedOrAbsent
        | RadioState::SimReady
        | RadioState::RuimNotReady
        | RadioState::RuimReady
        | RadioState::RuimLockedOrAbsent => Some(SubscriptionSource::RuimSim),
        RadioState::NvNotReady | RadioState::NvReady => Some(SubscriptionSource::Nv),
        RadioState::Off | RadioState::Unavailable | RadioState::On => None,
    }
}

/// SIM/RUIM status implied by a legacy state
///
/// Only states that say something about the card carry a status; the
/// not-ready and NV states decode to `None`.
pub fn decode_sim_status(state: RadioState) -> Option<RadioState> {
    match state {
        RadioState::SimLockedOrAbsent
        | RadioState::SimReady
        | RadioState::RuimReady
        | RadioState::RuimLockedOrAbsent => Some(state),
        RadioState::SimNotReady
        | RadioState::RuimNotReady
        | RadioState::NvNotReady
        | RadioState::NvReady
        | RadioState::Off
        | RadioState::Unavailable
        | RadioState::On => None,
    }
}

/// A synthetic unsolicited event derived from a radio state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubStateEvent {
    VoiceRadioTechChanged(Option<c_int>),
    SubscriptionSourceChanged(Option<SubscriptionSource>),
    SimStatusChanged,
}

impl SubStateEvent {
    /// `RIL_UNSOL_*` code the event is delivered as
    pub fn code(&self) -> c_int {
        match self {
            SubStateEvent::VoiceRadioTechChanged(_) => unsol::VOICE_RADIO_TECH_CHANGED,
            SubStateEvent::SubscriptionSourceChanged(_) => unsol::CDMA_SUBSCRIPTION_SOURCE_CHANGED,
            SubStateEvent::SimStatusChanged => unsol::RESPONSE_SIM_STATUS_CHANGED,
        }
    }

    /// Integer payload, `-1` standing in for an undecodable value;
    /// `None` for events delivered without a payload
    pub fn payload(&self) -> Option<c_int> {
        match self {
            SubStateEvent::VoiceRadioTechChanged(tech) => Some(tech.unwrap_or(-1)),
            SubStateEvent::SubscriptionSourceChanged(source) => {
                Some(source.map(|s| s as c_int).unwrap_or(-1))
            }
            SubStateEvent::SimStatusChanged => None,
        }
    }
}

/// Last decoded value of each sub-state; all start unknown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubStateTracker {
    voice_radio_tech: Option<c_int>,
    subscription_source: Option<SubscriptionSource>,
    sim_status: Option<RadioState>,
}

impl SubStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in a radio state reported by the vendor
    ///
    /// Returns the events to emit, in delivery order: voice radio technology,
    /// then subscription source (3GPP2 technologies only), then SIM status.
    /// Non-legacy and unrecognized states change nothing.
    pub fn observe(&mut self, raw_state: c_int) -> Vec<SubStateEvent> {
        let mut events = Vec::new();

        let Some(state) = RadioState::from_raw(raw_state).filter(|s| s.is_legacy()) else {
            return events;
        };

        let voice_radio_tech = decode_voice_radio_technology(state);
        if voice_radio_tech != self.voice_radio_tech {
            self.voice_radio_tech = voice_radio_tech;
            events.push(SubStateEvent::VoiceRadioTechChanged(voice_radio_tech));
        }

        if voice_radio_tech.is_some_and(is_3gpp2) {
            let subscription_source = decode_subscription_source(state);
            if subscription_source != self.subscription_source {
                self.subscription_source = subscription_source;
                events.push(SubStateEvent::SubscriptionSourceChanged(subscription_source));
            }
        }

        let sim_status = decode_sim_status(state);
        if sim_status != self.sim_status {
            self.sim_status = sim_status;
            events.push(SubStateEvent::SimStatusChanged);
        }

        events
    }

    pub fn voice_radio_tech(&self) -> Option<c_int> {
        self.voice_radio_tech
    }

    pub fn subscription_source(&self) -> Option<SubscriptionSource> {
        self.subscription_source
    }

    pub fn sim_status(&self) -> Option<RadioState> {
        self.sim_status
    }
}

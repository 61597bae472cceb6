//! Versioned struct upgrades
//!
//! The vendor RIL was built against an older `ril.h`. Where a payload shape
//! grew since, the legacy struct is converted into the current one here. Each
//! conversion is keyed on the exact legacy size; anything else is left for the
//! caller to forward untouched.

use crate::payload::Payload;
use crate::ril::{CardStatusV5, CardStatusV6, SimRefreshLegacy, SimRefreshResponseV7};
use std::ptr;

/// `ims_subscription_app_index` value meaning "no IMS application"
pub const NO_IMS_SUBSCRIPTION_APP: i32 = -1;

impl From<&CardStatusV5> for CardStatusV6 {
    fn from(legacy: &CardStatusV5) -> Self {
        Self {
            card_state: legacy.card_state,
            universal_pin_state: legacy.universal_pin_state,
            gsm_umts_subscription_app_index: legacy.gsm_umts_subscription_app_index,
            cdma_subscription_app_index: legacy.cdma_subscription_app_index,
            ims_subscription_app_index: NO_IMS_SUBSCRIPTION_APP,
            num_applications: legacy.num_applications,
            applications: legacy.applications,
        }
    }
}

impl From<SimRefreshLegacy> for SimRefreshResponseV7 {
    fn from(legacy: SimRefreshLegacy) -> Self {
        Self {
            result: legacy.result,
            ef_id: legacy.ef_id,
            aid: ptr::null_mut(),
        }
    }
}

/// Upgrade a `GET_SIM_STATUS` response if it has the v5 shape
pub fn upgrade_card_status(response: Payload<'_>) -> Option<CardStatusV6> {
    response
        .read::<CardStatusV5>()
        .map(|legacy| CardStatusV6::from(&legacy))
}

/// Upgrade a `SIM_REFRESH` payload if it has the legacy `int[2]` shape
pub fn upgrade_sim_refresh(data: Payload<'_>) -> Option<SimRefreshResponseV7> {
    data.read::<SimRefreshLegacy>().map(SimRefreshResponseV7::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ril::{AppStatus, RIL_CARD_MAX_APPS};
    use std::ffi::c_char;

    fn legacy_card_status(label: *mut c_char) -> CardStatusV5 {
        let mut applications = [AppStatus::EMPTY; RIL_CARD_MAX_APPS];
        applications[0] = AppStatus {
            app_type: 2,
            app_state: 5,
            perso_substate: 2,
            aid_ptr: ptr::null_mut(),
            app_label_ptr: label,
            pin1_replaced: 0,
            pin1: 1,
            pin2: 2,
        };
        CardStatusV5 {
            card_state: 1,
            universal_pin_state: 0,
            gsm_umts_subscription_app_index: 0,
            cdma_subscription_app_index: -1,
            num_applications: 1,
            applications,
        }
    }

    #[test]
    fn test_card_status_v5_to_v6() {
        let mut label = *b"USIM\0";
        let legacy = legacy_card_status(label.as_mut_ptr() as *mut c_char);

        let current = CardStatusV6::from(&legacy);

        assert_eq!(current.card_state, legacy.card_state);
        assert_eq!(current.universal_pin_state, legacy.universal_pin_state);
        assert_eq!(
            current.gsm_umts_subscription_app_index,
            legacy.gsm_umts_subscription_app_index
        );
        assert_eq!(
            current.cdma_subscription_app_index,
            legacy.cdma_subscription_app_index
        );
        assert_eq!(current.ims_subscription_app_index, NO_IMS_SUBSCRIPTION_APP);
        assert_eq!(current.num_applications, legacy.num_applications);
        assert_eq!(current.applications, legacy.applications);
        // Pointers inside the apps are carried over, not copied
        assert_eq!(current.applications[0].app_label_ptr, legacy.applications[0].app_label_ptr);
    }

    #[test]
    fn test_upgrade_card_status_requires_v5_length() {
        let legacy = legacy_card_status(ptr::null_mut());
        let upgraded = upgrade_card_status(Payload::of(&legacy)).expect("v5 payload");
        assert_eq!(upgraded.num_applications, 1);

        let current = CardStatusV6::from(&legacy);
        assert_eq!(upgrade_card_status(Payload::of(&current)), None);
        assert_eq!(upgrade_card_status(Payload::empty()), None);
    }

    #[test]
    fn test_sim_refresh_legacy_to_v7() {
        let legacy = SimRefreshLegacy {
            result: 0,
            ef_id: 0x6F3A,
        };
        let current = SimRefreshResponseV7::from(legacy);
        assert_eq!(current.result, 0);
        assert_eq!(current.ef_id, 0x6F3A);
        assert!(current.aid.is_null());
    }

    #[test]
    fn test_upgrade_sim_refresh_requires_int_pair() {
        let pair: [i32; 2] = [2, 0x2FE2];
        let upgraded = upgrade_sim_refresh(Payload::of(&pair)).expect("int[2] payload");
        assert_eq!((upgraded.result, upgraded.ef_id), (2, 0x2FE2));

        let single: i32 = 1;
        assert_eq!(upgrade_sim_refresh(Payload::of(&single)), None);
        assert_eq!(upgrade_sim_refresh(Payload::of(&upgraded)), None);
    }
}

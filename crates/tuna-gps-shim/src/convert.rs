//! Conversions between the platform's GPS structs and the vendor's

use crate::gps::{
    AGpsRefLocation, AGpsRefLocationCellIdNoLte, AGpsRefLocationNoLte, AGpsRefLocationUnionNoLte,
    GpsCallbacks, GpsCallbacksLegacy,
};
use std::mem::size_of;

impl From<&GpsCallbacks> for GpsCallbacksLegacy {
    fn from(callbacks: &GpsCallbacks) -> Self {
        Self {
            size: size_of::<GpsCallbacksLegacy>(),
            location_cb: callbacks.location_cb,
            status_cb: callbacks.status_cb,
            sv_status_cb: callbacks.sv_status_cb,
            nmea_cb: callbacks.nmea_cb,
            set_capabilities_cb: callbacks.set_capabilities_cb,
            acquire_wakelock_cb: callbacks.acquire_wakelock_cb,
            release_wakelock_cb: callbacks.release_wakelock_cb,
            create_thread_cb: callbacks.create_thread_cb,
            request_utc_time_cb: callbacks.request_utc_time_cb,
        }
    }
}

/// Cell identity without the LTE-only `tac` and `pcid`
pub fn downgrade_ref_location(location: &AGpsRefLocation) -> AGpsRefLocationNoLte {
    // Safety: every bit pattern is a valid cell id; a MAC location occupies
    // the leading bytes and is carried along with them.
    let cell = unsafe { location.u.cell_id };
    AGpsRefLocationNoLte {
        type_: location.type_,
        u: AGpsRefLocationUnionNoLte {
            cell_id: AGpsRefLocationCellIdNoLte {
                type_: cell.type_,
                mcc: cell.mcc,
                mnc: cell.mnc,
                lac: cell.lac,
                cid: cell.cid,
            },
        },
    }
}

/// Copy back what the vendor may have changed in its view of `location`
pub fn write_back_ref_location(location: &mut AGpsRefLocation, vendor: &AGpsRefLocationNoLte) {
    // Safety: plain integers on both sides.
    let vendor_cell = unsafe { vendor.u.cell_id };
    location.type_ = vendor.type_;
    let cell = unsafe { &mut location.u.cell_id };
    cell.type_ = vendor_cell.type_;
    cell.mcc = vendor_cell.mcc;
    cell.mnc = vendor_cell.mnc;
    cell.lac = vendor_cell.lac;
    cell.cid = vendor_cell.cid;
}

/// Whether a platform ref location of `sz_struct` bytes holds every field the
/// vendor reads
pub fn ref_location_is_complete(sz_struct: usize) -> bool {
    sz_struct >= size_of::<AGpsRefLocationNoLte>()
}

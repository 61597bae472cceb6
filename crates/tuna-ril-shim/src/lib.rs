//! RIL shim for the tuna family (maguro, toro, toroplus)
//!
//! Built as the RIL library rild loads. It opens the Samsung vendor RIL, which
//! predates the platform it now runs on, and translates between the two:
//!
//! - requests the vendor does not know are answered "not supported"
//! - the radio capability query is answered from the device variant
//! - legacy response and event payloads are upgraded to current layouts
//! - the sub-states once folded into the radio state are reported as the
//!   separate events the platform now expects
//! - a few values in the vendor's data segment are patched around init

pub mod compat;
mod error;
pub mod ffi;
pub mod interceptor;
pub mod patch;
pub mod payload;
pub mod radio_state;
pub mod ril;
pub mod session;
pub mod upgrade;

pub use error::ShimError;
pub use interceptor::{Disposition, dispatch};
pub use patch::{PATCH_TABLE, PatchOutcome, PatchPhase, PatchTarget, Patcher, SymbolResolver};
pub use payload::{Payload, Token};
pub use radio_state::{RadioState, SubStateEvent, SubStateTracker, SubscriptionSource};
pub use session::{RadioFunctions, RilCallbacks, RilShim};

/// Shim Result type
pub type Result<T> = std::result::Result<T, ShimError>;

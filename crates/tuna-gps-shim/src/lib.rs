//! GPS HAL shim for maguro
//!
//! The SiRF GSD4t HAL predates the Android N GPS interface: its `init` fails
//! when handed the N-era callback table, and its AGPS RIL extension reads
//! reference locations without the LTE cell fields. This library is installed
//! as the GPS HAL, loads the vendor one and hands each side the layout it
//! expects.

pub mod convert;
mod error;
pub mod gps;
pub mod shim;

pub use error::GpsShimError;
pub use shim::{HMI, HalModuleInfo, hook_device};

/// GPS shim Result type
pub type Result<T> = std::result::Result<T, GpsShimError>;

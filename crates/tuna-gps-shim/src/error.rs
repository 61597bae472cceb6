use std::ffi::c_int;
use thiserror::Error;
use tuna_config::LibraryError;

#[derive(Debug, Error)]
pub enum GpsShimError {
    #[error("Vendor library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Vendor GPS HAL does not export {0}")]
    SymbolMissing(&'static str),

    #[error("Vendor GPS HAL has no {0} entry")]
    MissingEntry(&'static str),

    #[error("Vendor open failed: {0}")]
    VendorOpenFailed(c_int),

    #[error("No device returned")]
    NoDevice,
}

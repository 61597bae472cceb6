use thiserror::Error;
use tuna_config::LibraryError;

#[derive(Debug, Error)]
pub enum ShimError {
    #[error("Vendor library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Vendor library does not export {0}")]
    SymbolMissing(&'static str),

    #[error("RIL_Init called without an environment table")]
    NullEnvironment,

    #[error("Vendor RIL_Init returned no radio functions")]
    VendorInitFailed,

    #[error("A RIL session is already active")]
    AlreadyInitialized,
}

//! Recovery-time helpers for tuna OTA packages
//!
//! Update scripts run these from recovery, where the ROM's properties are not
//! available and the kernel may differ from the one that will boot.

mod cmdline;
mod footer;

use std::path::PathBuf;
use thiserror::Error;

pub use cmdline::{CMDLINE_PATH, read_cmdline, variant_from_cmdline};
pub use footer::{
    BAD_FS_SIZE, CRYPT_MNT_MAGIC, FOOTER_HEADER_LEN, FS_SIZE_OFFSET, FooterFix, GOOD_FS_SIZE,
    METADATA_PARTITION, fix_fs_size,
};

#[derive(Debug, Error)]
pub enum UpdaterError {
    #[error("Cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot read crypto footer {path}: {source}")]
    ReadFooter {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot seek or write crypto footer {path}: {source}")]
    WriteFooter {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, UpdaterError>;

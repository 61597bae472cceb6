//! Variant detection from the kernel command line
//!
//! The bootloader appends the radio version, and every radio version starts
//! with the model number. A recovery built for one variant can be flashed on
//! another, so this is preferred over anything the build itself claims.

use std::fs;
use std::io;
use std::path::Path;
use tuna_config::DeviceVariant;

pub const CMDLINE_PATH: &str = "/proc/cmdline";

/// Read a command line file with trailing newlines stripped
pub fn read_cmdline(path: &Path) -> io::Result<String> {
    let mut cmdline = fs::read_to_string(path)?;
    let len = cmdline.trim_end_matches('\n').len();
    cmdline.truncate(len);
    Ok(cmdline)
}

/// Detect the variant from the command line at `path`
///
/// An unreadable command line yields [`DeviceVariant::Unknown`], leaving
/// detection to first boot.
pub fn variant_from_cmdline(path: &Path) -> DeviceVariant {
    match read_cmdline(path) {
        Ok(cmdline) => {
            let variant = DeviceVariant::from_identifier(&cmdline);
            tracing::debug!("{} -> {}", path.display(), variant);
            variant
        }
        Err(e) => {
            tracing::warn!("Cannot read {}: {}", path.display(), e);
            DeviceVariant::Unknown
        }
    }
}

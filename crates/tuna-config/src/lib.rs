//! Configuration for the tuna vendor shims
//!
//! Handles device variant detection (maguro, toro, toroplus) and the optional
//! TOML configuration shared by the RIL shim, the GPS shim and the recovery
//! updater, plus the `dlopen` handle both shims load their vendor blob with.
//! Every setting has a built-in default matching the stock vendor
//! layout, so a missing configuration file is never an error.

mod library;
mod logging;
mod property;
mod variant;

pub use library::{LibraryError, VendorLibrary};
pub use logging::init_logging;
pub use property::read_property;
pub use variant::{DeviceVariant, VARIANT_PROPERTY};

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Standard configuration path on the vendor partition
pub const CONFIG_PATH: &str = "/vendor/etc/tuna-shims.toml";

/// Stock location of the Samsung RIL
pub const DEFAULT_RIL_LIBRARY: &str = "/vendor/lib/libsec-ril.so";

/// Stock location of the SiRF GSD4t GPS HAL
pub const DEFAULT_GPS_LIBRARY: &str = "/vendor/maguro/lib/hw/gps.omap4.so";

/// First RIL interface version whose SIM refresh payload is the v7 struct
pub const DEFAULT_ADVERTISED_RIL_VERSION: i32 = 7;

/// Top-level configuration for all shims
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShimConfig {
    #[serde(default)]
    pub ril: RilConfig,

    #[serde(default)]
    pub gps: GpsConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// RIL shim settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RilConfig {
    /// Path of the vendor RIL opened with local symbol visibility
    #[serde(default = "default_ril_library")]
    pub vendor_library: PathBuf,
    /// System property naming the device variant
    #[serde(default = "default_variant_property")]
    pub variant_property: String,
    /// Fixed variant, skipping property detection
    #[serde(default)]
    pub variant: Option<DeviceVariant>,
    /// Lowest RIL version reported to the platform
    #[serde(default = "default_advertised_version")]
    pub advertised_version: i32,
}

impl Default for RilConfig {
    fn default() -> Self {
        Self {
            vendor_library: default_ril_library(),
            variant_property: default_variant_property(),
            variant: None,
            advertised_version: default_advertised_version(),
        }
    }
}

fn default_ril_library() -> PathBuf {
    PathBuf::from(DEFAULT_RIL_LIBRARY)
}

fn default_variant_property() -> String {
    VARIANT_PROPERTY.to_string()
}

fn default_advertised_version() -> i32 {
    DEFAULT_ADVERTISED_RIL_VERSION
}

/// GPS shim settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GpsConfig {
    /// Path of the vendor GPS HAL module
    #[serde(default = "default_gps_library")]
    pub vendor_library: PathBuf,
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            vendor_library: default_gps_library(),
        }
    }
}

fn default_gps_library() -> PathBuf {
    PathBuf::from(DEFAULT_GPS_LIBRARY)
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl ShimConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the vendor partition, falling back to defaults
    ///
    /// A broken file is reported and ignored: a shim must never refuse to
    /// start because of its own configuration.
    pub fn load_default() -> Self {
        Self::load_or_default(Path::new(CONFIG_PATH))
    }

    /// Load `path` if it exists and parses, defaults otherwise
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                tracing::debug!("Loaded shim configuration from {}", path.display());
                config
            }
            Err(ConfigError::NotFound(_)) => Self::default(),
            Err(e) => {
                tracing::warn!("Ignoring configuration {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

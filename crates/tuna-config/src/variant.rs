//! Tuna device variant detection
//!
//! The three tuna boards share one vendor tree but carry different modems:
//! maguro is HSPA, toro and toroplus are CDMA/LTE. The variant decides which
//! radio capabilities are reported and which vendor memory patches apply.

use serde::Deserialize;
use std::fmt;
use std::sync::OnceLock;

/// Property set by init from the bootloader-provided board name
pub const VARIANT_PROPERTY: &str = "ro.product.subdevice";

static DETECTED: OnceLock<DeviceVariant> = OnceLock::new();

/// Hardware variant of a tuna device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceVariant {
    /// GT-I9250, HSPA+
    Maguro,
    /// SCH-I515, Verizon CDMA/LTE
    Toro,
    /// SPH-L700, Sprint CDMA/LTE
    ToroPlus,
    /// Anything else; no variant-specific behavior applies
    Unknown,
}

impl DeviceVariant {
    /// Map a board name, property value or kernel command line to a variant
    ///
    /// Matching is by case-insensitive substring. `toroplus` is tested before
    /// `toro` since the latter is a prefix of the former. The model numbers
    /// match the radio version string the bootloader puts on the command line.
    pub fn from_identifier(identifier: &str) -> Self {
        let id = identifier.to_lowercase();

        if id.contains("toroplus") || id.contains("l700") {
            DeviceVariant::ToroPlus
        } else if id.contains("toro") || id.contains("i515") {
            DeviceVariant::Toro
        } else if id.contains("maguro") || id.contains("i9250") {
            DeviceVariant::Maguro
        } else {
            DeviceVariant::Unknown
        }
    }

    /// Detect the variant from a system property, caching the first result
    ///
    /// Later calls return the cached value regardless of `property`.
    pub fn detect(property: &str) -> Self {
        *DETECTED.get_or_init(|| {
            let value = crate::read_property(property);
            let variant = value
                .as_deref()
                .map(Self::from_identifier)
                .unwrap_or(DeviceVariant::Unknown);
            tracing::info!(
                "Detected tuna variant {} ({} = {:?})",
                variant,
                property,
                value
            );
            variant
        })
    }

    /// Board name as used by the build and the updater scripts
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceVariant::Maguro => "maguro",
            DeviceVariant::Toro => "toro",
            DeviceVariant::ToroPlus => "toroplus",
            DeviceVariant::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeviceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

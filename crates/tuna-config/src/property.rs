//! System property access
//!
//! Bionic exposes properties through `__system_property_get`. Off-device the
//! property is looked up in the environment instead (`ro.product.subdevice`
//! becomes `RO_PRODUCT_SUBDEVICE`) so the shims can be exercised on a host.

/// Maximum property value length including the terminator (bionic `PROP_VALUE_MAX`)
#[cfg(target_os = "android")]
const PROP_VALUE_MAX: usize = 92;

/// Read a system property, `None` if unset or empty
#[cfg(target_os = "android")]
pub fn read_property(key: &str) -> Option<String> {
    use std::ffi::{CStr, CString, c_char};

    let key = CString::new(key).ok()?;
    let mut value = [0 as c_char; PROP_VALUE_MAX];

    // Safety: `value` has room for PROP_VALUE_MAX bytes, which bionic never exceeds.
    let len = unsafe { libc::__system_property_get(key.as_ptr(), value.as_mut_ptr()) };
    if len <= 0 {
        return None;
    }

    // Safety: bionic always NUL-terminates the value it writes.
    let value = unsafe { CStr::from_ptr(value.as_ptr()) };
    Some(value.to_string_lossy().into_owned())
}

/// Read a system property, `None` if unset or empty
#[cfg(not(target_os = "android"))]
pub fn read_property(key: &str) -> Option<String> {
    std::env::var(env_key(key)).ok().filter(|v| !v.is_empty())
}

#[cfg(not(target_os = "android"))]
fn env_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(all(test, not(target_os = "android")))]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_mapping() {
        assert_eq!(env_key("ro.product.subdevice"), "RO_PRODUCT_SUBDEVICE");
        assert_eq!(env_key("ro.config.vc-call"), "RO_CONFIG_VC_CALL");
    }

    #[test]
    fn test_missing_property() {
        assert_eq!(read_property("ro.tuna.test.definitely_unset_property"), None);
    }
}

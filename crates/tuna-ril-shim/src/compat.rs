//! Symbols the vendor RIL imports from platform libraries that no longer
//! provide them
//!
//! The exports are only built for Android, where the referenced platform
//! libraries exist. The account renaming is plain logic and tested on the host.

/// Account the audio HAL runs as on current platforms
pub const AUDIO_HAL_ACCOUNT: &str = "audioserver";

/// Account the vendor RIL accepts audio clients from
pub const LEGACY_MEDIA_ACCOUNT: &str = "media";

/// Name the vendor RIL should see for `account`, if it differs
pub fn platform_account_alias(account: &[u8]) -> Option<&'static str> {
    (account == AUDIO_HAL_ACCOUNT.as_bytes()).then_some(LEGACY_MEDIA_ACCOUNT)
}

#[cfg(target_os = "android")]
mod exports {
    use super::platform_account_alias;
    use std::ffi::{CStr, c_void};
    use std::ptr;

    /// `getpwuid` as the vendor RIL imports it
    ///
    /// The RIL only accepts sockets from the `media` user, while the audio
    /// HAL runs as `audioserver`; the record returned for it is renamed.
    ///
    /// # Safety
    ///
    /// Same contract as `getpwuid`.
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn cmpt__id(uid: libc::uid_t) -> *mut libc::passwd {
        let record = unsafe { libc::getpwuid(uid) };
        if record.is_null() {
            return record;
        }
        // Safety: getpwuid returned a valid record with a NUL-terminated name.
        let name = unsafe { (*record).pw_name };
        if name.is_null() {
            return record;
        }
        let current = unsafe { CStr::from_ptr(name) };
        if let Some(alias) = platform_account_alias(current.to_bytes()) {
            let bytes = alias.as_bytes();
            // Safety: the alias is shorter than the name it replaces.
            unsafe {
                ptr::copy_nonoverlapping(bytes.as_ptr(), name.cast::<u8>(), bytes.len());
                *name.add(bytes.len()) = 0;
            }
        }
        record
    }

    /// toroplus links against the platform screenshot client; nothing on a
    /// running phone reaches it
    #[unsafe(export_name = "_ZN7android16ScreenshotClient6updateEv")]
    pub extern "C" fn screenshot_client_update() {
        tracing::error!("ScreenshotClient::update called from the vendor RIL");
    }

    #[link(name = "binder")]
    unsafe extern "C" {
        /// `android::Parcel::writeString16(const char16_t*, size_t)`
        #[link_name = "_ZN7android6Parcel13writeString16EPKDsj"]
        fn parcel_write_string16(instance: *mut c_void, str: *const u16, len: usize) -> usize;
    }

    /// `Parcel::writeString16` under its pre-C++11 mangling, where
    /// `char16_t` was still `unsigned short`
    ///
    /// # Safety
    ///
    /// Same contract as the forwarded method.
    #[unsafe(export_name = "_ZN7android6Parcel13writeString16EPKtj")]
    pub unsafe extern "C" fn parcel_write_string16_legacy(
        instance: *mut c_void,
        str: *const u16,
        len: usize,
    ) -> usize {
        unsafe { parcel_write_string16(instance, str, len) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audioserver_is_renamed_to_media() {
        assert_eq!(platform_account_alias(b"audioserver"), Some("media"));
        assert!(LEGACY_MEDIA_ACCOUNT.len() < AUDIO_HAL_ACCOUNT.len());
    }

    #[test]
    fn test_other_accounts_unchanged() {
        for account in [&b"radio"[..], b"media", b"system", b"audioserver2", b""] {
            assert_eq!(platform_account_alias(account), None);
        }
    }
}

//! Crypto footer `fs_size` fix for HSPA devices
//!
//! Newer bootloaders shrink the userdata partition by one sector. A device
//! encrypted under the factory partition table keeps the old size in its
//! crypto footer and then fails to map the volume on decrypt.

use crate::{Result, UpdaterError};
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::info;

pub const METADATA_PARTITION: &str = "/dev/block/platform/omap/omap_hsmmc.0/by-name/metadata";

pub const CRYPT_MNT_MAGIC: u32 = 0xD0B5_B1C4;
pub const BAD_FS_SIZE: u64 = 0x01B1_4FDF;
pub const GOOD_FS_SIZE: u64 = 0x01B1_4FDE;

/// `magic`, `major_version`, `minor_version`, `ftr_size`, `flags`,
/// `keysize`, `spare1`, `fs_size`
pub const FOOTER_HEADER_LEN: usize = 32;
pub const FS_SIZE_OFFSET: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterFix {
    Updated,
    NotNeeded,
}

/// Rewrite a footer carrying the factory `fs_size`; anything else is left as is
pub fn fix_fs_size(path: &Path) -> Result<FooterFix> {
    let mut device = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| UpdaterError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let mut header = [0u8; FOOTER_HEADER_LEN];
    device
        .read_exact(&mut header)
        .map_err(|source| UpdaterError::ReadFooter {
            path: path.to_path_buf(),
            source,
        })?;

    let magic = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let mut fs_size = [0u8; 8];
    fs_size.copy_from_slice(&header[FS_SIZE_OFFSET..FS_SIZE_OFFSET + 8]);
    let fs_size = u64::from_le_bytes(fs_size);

    if magic != CRYPT_MNT_MAGIC || fs_size != BAD_FS_SIZE {
        info!("Footer doesn't need updating");
        return Ok(FooterFix::NotNeeded);
    }

    let write_error = |source| UpdaterError::WriteFooter {
        path: path.to_path_buf(),
        source,
    };
    device
        .seek(SeekFrom::Start(FS_SIZE_OFFSET as u64))
        .map_err(write_error)?;
    device
        .write_all(&GOOD_FS_SIZE.to_le_bytes())
        .map_err(write_error)?;
    device.sync_all().map_err(write_error)?;

    info!("Footer updated");
    Ok(FooterFix::Updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn footer(magic: u32, fs_size: u64) -> Vec<u8> {
        let mut data = vec![0u8; 512];
        data[..4].copy_from_slice(&magic.to_le_bytes());
        data[4..6].copy_from_slice(&1u16.to_le_bytes());
        data[8..12].copy_from_slice(&104u32.to_le_bytes());
        data[FS_SIZE_OFFSET..FS_SIZE_OFFSET + 8].copy_from_slice(&fs_size.to_le_bytes());
        data[32..36].copy_from_slice(&3u32.to_le_bytes());
        data
    }

    #[test]
    fn test_factory_size_is_fixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata");
        let original = footer(CRYPT_MNT_MAGIC, BAD_FS_SIZE);
        fs::write(&path, &original).unwrap();

        assert_eq!(fix_fs_size(&path).unwrap(), FooterFix::Updated);

        let fixed = fs::read(&path).unwrap();
        assert_eq!(fixed, footer(CRYPT_MNT_MAGIC, GOOD_FS_SIZE));
        // Only fs_size changed
        assert_eq!(fixed[..FS_SIZE_OFFSET], original[..FS_SIZE_OFFSET]);
        assert_eq!(fixed[FS_SIZE_OFFSET + 8..], original[FS_SIZE_OFFSET + 8..]);

        // A second run has nothing to do
        assert_eq!(fix_fs_size(&path).unwrap(), FooterFix::NotNeeded);
    }

    #[test]
    fn test_other_footers_untouched() {
        let dir = tempfile::tempdir().unwrap();
        for (name, data) in [
            ("good", footer(CRYPT_MNT_MAGIC, GOOD_FS_SIZE)),
            ("no-magic", footer(0, BAD_FS_SIZE)),
            ("erased", vec![0xFF; 512]),
        ] {
            let path = dir.path().join(name);
            fs::write(&path, &data).unwrap();
            assert_eq!(fix_fs_size(&path).unwrap(), FooterFix::NotNeeded);
            assert_eq!(fs::read(&path).unwrap(), data);
        }
    }

    #[test]
    fn test_short_partition_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata");
        fs::write(&path, [0u8; FOOTER_HEADER_LEN - 1]).unwrap();

        assert!(matches!(
            fix_fs_size(&path),
            Err(UpdaterError::ReadFooter { .. })
        ));
    }

    #[test]
    fn test_missing_partition_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            fix_fs_size(&dir.path().join("metadata")),
            Err(UpdaterError::Open { .. })
        ));
    }
}

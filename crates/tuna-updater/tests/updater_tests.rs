//! Integration tests for the updater binary as update scripts call it

use std::fs;
use std::process::Command;
use tempfile::TempDir;
use tuna_updater::{BAD_FS_SIZE, CRYPT_MNT_MAGIC, FS_SIZE_OFFSET, GOOD_FS_SIZE};

fn updater(args: &[&str]) -> (bool, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_tuna-updater"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to run tuna-updater");
    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
    )
}

#[test]
fn test_get_variant() {
    let dir = TempDir::new().unwrap();
    let cmdline = dir.path().join("cmdline");

    for (contents, expected) in [
        ("androidboot.baseband=I9250XXLJ1\n", "maguro"),
        ("androidboot.baseband=I515.FA02\n", "toro"),
        ("androidboot.baseband=L700.FG04\n", "toroplus"),
        ("androidboot.hardware=tuna\n", "unknown"),
    ] {
        fs::write(&cmdline, contents).unwrap();
        let (ok, stdout) = updater(&["get-variant", cmdline.to_str().unwrap()]);
        assert!(ok);
        assert_eq!(stdout, expected);
    }
}

#[test]
fn test_fs_size_fix() {
    let dir = TempDir::new().unwrap();
    let metadata = dir.path().join("metadata");
    let mut footer = vec![0u8; 128];
    footer[..4].copy_from_slice(&CRYPT_MNT_MAGIC.to_le_bytes());
    footer[FS_SIZE_OFFSET..FS_SIZE_OFFSET + 8].copy_from_slice(&BAD_FS_SIZE.to_le_bytes());
    fs::write(&metadata, &footer).unwrap();

    let (ok, stdout) = updater(&["fs-size-fix", metadata.to_str().unwrap()]);
    assert!(ok);
    assert_eq!(stdout, "t");

    let fixed = fs::read(&metadata).unwrap();
    assert_eq!(
        fixed[FS_SIZE_OFFSET..FS_SIZE_OFFSET + 8],
        GOOD_FS_SIZE.to_le_bytes()
    );
}

#[test]
fn test_failures_exit_nonzero() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("metadata");

    let (ok, stdout) = updater(&["fs-size-fix", missing.to_str().unwrap()]);
    assert!(!ok);
    assert!(stdout.is_empty());

    let (ok, _) = updater(&["write-bootloader"]);
    assert!(!ok);
}

//! Tuna recovery updater
//!
//! Called from OTA update scripts:
//!
//! ```text
//! tuna-updater get-variant [CMDLINE]
//! tuna-updater fs-size-fix [DEVICE]
//! ```
//!
//! `get-variant` prints the board name; `fs-size-fix` prints `t` once the
//! crypto footer is known to be good.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tuna_config::LogConfig;
use tuna_updater::{CMDLINE_PATH, METADATA_PARTITION};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Print the board variant named by the kernel command line
    GetVariant {
        #[arg(default_value = CMDLINE_PATH)]
        cmdline: PathBuf,
    },
    /// Repair the factory `fs_size` in the userdata crypto footer
    FsSizeFix {
        #[arg(default_value = METADATA_PARTITION)]
        device: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tuna_config::init_logging(env!("CARGO_PKG_NAME"), &LogConfig::default());

    match cli.command {
        Command::GetVariant { cmdline } => {
            println!("{}", tuna_updater::variant_from_cmdline(&cmdline));
        }
        Command::FsSizeFix { device } => {
            let fix = tuna_updater::fix_fs_size(&device)
                .with_context(|| format!("fs-size-fix failed on {}", device.display()))?;
            debug!("{}: {:?}", device.display(), fix);
            println!("t");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        Cli::try_parse_from(std::iter::once("tuna-updater").chain(args.iter().copied()))
            .map(|cli| cli.command)
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_paths_default_to_device_nodes() {
        assert_eq!(
            parse(&["get-variant"]).unwrap(),
            Command::GetVariant {
                cmdline: PathBuf::from(CMDLINE_PATH)
            }
        );
        assert_eq!(
            parse(&["fs-size-fix"]).unwrap(),
            Command::FsSizeFix {
                device: PathBuf::from(METADATA_PARTITION)
            }
        );
    }

    #[test]
    fn test_explicit_paths() {
        assert_eq!(
            parse(&["get-variant", "/tmp/cmdline"]).unwrap(),
            Command::GetVariant {
                cmdline: PathBuf::from("/tmp/cmdline")
            }
        );
        assert_eq!(
            parse(&["fs-size-fix", "/dev/block/mmcblk0p13"]).unwrap(),
            Command::FsSizeFix {
                device: PathBuf::from("/dev/block/mmcblk0p13")
            }
        );
    }

    #[test]
    fn test_bad_invocations_rejected() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["write-bootloader"]).is_err());
        assert!(parse(&["get-variant", "/proc/cmdline", "extra"]).is_err());
    }
}

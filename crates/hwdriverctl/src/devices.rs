//! Device enumeration via lspci/lsusb or saved listings

use anyhow::{Context, Result};
use hwdriver::enumerate::{parse_lspci, parse_lsusb};
use hwdriver::DeviceDescriptor;
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::warn;

/// PCI devices first, then USB. PCI listing failures are fatal, USB ones are not.
pub fn collect(lspci: Option<&Path>, lsusb: Option<&Path>) -> Result<Vec<DeviceDescriptor>> {
    collect_with(lspci, lsusb, run)
}

/// `collect` with the command runner passed in
fn collect_with<F>(lspci: Option<&Path>, lsusb: Option<&Path>, run: F) -> Result<Vec<DeviceDescriptor>>
where
    F: Fn(&str, &[&str]) -> Result<String>,
{
    let pci_text = match lspci {
        Some(path) => read_listing(path)?,
        None => run("lspci", &["-n"]).context("running lspci -n")?,
    };
    let mut devices = parse_lspci(&pci_text);

    let usb_text = match lsusb {
        Some(path) => Some(read_listing(path)?),
        None => match run("lsusb", &[]) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("lsusb unavailable, skipping USB devices: {:#}", e);
                None
            }
        },
    };
    if let Some(text) = usb_text {
        devices.extend(parse_lsusb(&text));
    }

    Ok(devices)
}

fn read_listing(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn run(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program).args(args).output()?;
    if !output.status.success() {
        anyhow::bail!("{} exited with {}", program, output.status);
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const LSPCI: &str = "00:02.0 0300: 8086:0166 (rev 09)\n01:00.0 0300: 10de:0040 (rev a1)\n";
    const LSUSB: &str = "Bus 001 Device 002: ID 80ee:cafe VirtualBox USB Tablet\n";

    fn listing(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", text).unwrap();
        file
    }

    fn no_commands(program: &str, _args: &[&str]) -> Result<String> {
        anyhow::bail!("{} should not run", program)
    }

    #[test]
    fn test_saved_listings_pci_then_usb() {
        let pci = listing(LSPCI);
        let usb = listing(LSUSB);
        let devices = collect_with(Some(pci.path()), Some(usb.path()), no_commands).unwrap();

        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0], DeviceDescriptor::new("0x0300", "0x8086", "0x0166").unwrap());
        assert_eq!(devices[1].vendor_id(), "0x10de");
        assert_eq!(devices[2], DeviceDescriptor::new("", "0x80ee", "0xcafe").unwrap());
    }

    #[test]
    fn test_missing_pci_listing_is_fatal() {
        let usb = listing(LSUSB);
        let err = collect_with(Some(Path::new("/nonexistent/lspci.txt")), Some(usb.path()), no_commands)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/lspci.txt"));
    }

    #[test]
    fn test_failing_lspci_command_is_fatal() {
        let err = collect_with(None, None, no_commands).unwrap_err();
        assert!(format!("{:#}", err).contains("lspci -n"));
    }

    #[test]
    fn test_failing_lsusb_command_is_skipped() {
        let pci = listing(LSPCI);
        let devices = collect_with(Some(pci.path()), None, no_commands).unwrap();
        assert_eq!(devices.len(), 2);
        assert!(devices.iter().all(|d| !d.class_id().is_empty()));
    }

    #[test]
    fn test_commands_are_used_without_listings() {
        let devices = collect_with(None, None, |program, args| match program {
            "lspci" => {
                assert_eq!(args, &["-n"]);
                Ok(LSPCI.to_string())
            }
            _ => Ok(LSUSB.to_string()),
        })
        .unwrap();
        assert_eq!(devices.len(), 3);
    }
}

//! Parsers for `lspci -n` and `lsusb` listings.
//!
//! Only the text is handled here; running the tools belongs to the caller.
//! Lines that do not look like a device entry are skipped.

use crate::device::DeviceDescriptor;
use tracing::debug;

/// Parse `lspci -n` output.
///
/// Expected line shape: `00:02.0 0300: 8086:0166 (rev 09)`
pub fn parse_lspci(text: &str) -> Vec<DeviceDescriptor> {
    text.lines().filter_map(parse_lspci_line).collect()
}

fn parse_lspci_line(line: &str) -> Option<DeviceDescriptor> {
    let mut fields = line.split_whitespace();
    let _slot = fields.next()?;
    let class = fields.next()?.strip_suffix(':')?;
    let (vendor, device) = fields.next()?.split_once(':')?;

    match DeviceDescriptor::new(class, vendor, device) {
        Ok(descriptor) => Some(descriptor),
        Err(e) => {
            debug!("skipping lspci line {:?}: {}", line, e);
            None
        }
    }
}

/// Parse `lsusb` output. USB devices carry no PCI class.
///
/// Expected line shape: `Bus 001 Device 002: ID 8087:0024 Intel Corp.`
pub fn parse_lsusb(text: &str) -> Vec<DeviceDescriptor> {
    text.lines().filter_map(parse_lsusb_line).collect()
}

fn parse_lsusb_line(line: &str) -> Option<DeviceDescriptor> {
    let mut fields = line.split_whitespace().skip_while(|f| *f != "ID");
    fields.next()?;
    let (vendor, device) = fields.next()?.split_once(':')?;

    match DeviceDescriptor::new("", vendor, device) {
        Ok(descriptor) => Some(descriptor),
        Err(e) => {
            debug!("skipping lsusb line {:?}: {}", line, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSPCI: &str = "\
00:00.0 0600: 8086:0154 (rev 09)
00:02.0 0300: 8086:0166 (rev 09)
01:00.0 0300: 10de:0040 (rev a1)
garbage line
02:00.0 0280: zzzz:0001
";

    const LSUSB: &str = "\
Bus 002 Device 001: ID 1d6b:0003 Linux Foundation 3.0 root hub
Bus 001 Device 003: ID 0e0f:0003 VMware, Inc. Virtual Mouse

Bus 001 Device 004: ID
";

    #[test]
    fn test_parse_lspci() {
        let devices = parse_lspci(LSPCI);
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[1].class_id(), "0x0300");
        assert_eq!(devices[1].vendor_id(), "0x8086");
        assert_eq!(devices[2].device_id(), "0x0040");
    }

    #[test]
    fn test_parse_lsusb() {
        let devices = parse_lsusb(LSUSB);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[1].class_id(), "");
        assert_eq!(devices[1].vendor_id(), "0x0e0f");
        assert_eq!(devices[1].device_id(), "0x0003");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_lspci("").is_empty());
        assert!(parse_lsusb("\n\n").is_empty());
    }
}

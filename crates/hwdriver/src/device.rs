//! Detected devices and PCI identifier normalization.
//!
//! Identifiers arrive in several spellings (`10de`, `0x10DE`, sysfs class
//! `0x030000`). Everything is normalized to lowercase `0x` plus four hex
//! digits so matching can be plain string equality.

use crate::error::IdError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalize a vendor or device id to `0x%04x` form.
pub fn normalize_pci_id(field: &'static str, raw: &str) -> Result<String, IdError> {
    let digits = hex_digits(field, raw)?;
    if digits.len() > 4 {
        return Err(IdError::Invalid {
            field,
            value: raw.to_string(),
        });
    }
    Ok(format!("0x{:0>4}", digits))
}

/// Normalize a class id. Empty means "any class" and stays empty.
///
/// Six-digit sysfs classes carry the programming interface in the low byte,
/// which drivers never filter on, so only class and subclass are kept.
pub fn normalize_class_id(raw: &str) -> Result<String, IdError> {
    if raw.trim().is_empty() {
        return Ok(String::new());
    }
    let digits = hex_digits("class", raw)?;
    match digits.len() {
        1..=4 => Ok(format!("0x{:0>4}", digits)),
        6 => Ok(format!("0x{}", &digits[..4])),
        _ => Err(IdError::Invalid {
            field: "class",
            value: raw.to_string(),
        }),
    }
}

fn hex_digits(field: &'static str, raw: &str) -> Result<String, IdError> {
    let lower = raw.trim().to_ascii_lowercase();
    if lower.is_empty() {
        return Err(IdError::Empty { field });
    }
    let digits = lower.strip_prefix("0x").unwrap_or(&lower);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(IdError::Invalid {
            field,
            value: raw.to_string(),
        });
    }
    Ok(digits.to_string())
}

/// One enumerated device. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawDevice")]
pub struct DeviceDescriptor {
    class_id: String,
    vendor_id: String,
    device_id: String,
}

#[derive(Deserialize)]
struct RawDevice {
    #[serde(default)]
    class_id: String,
    vendor_id: String,
    device_id: String,
}

impl TryFrom<RawDevice> for DeviceDescriptor {
    type Error = IdError;

    fn try_from(raw: RawDevice) -> Result<Self, Self::Error> {
        DeviceDescriptor::new(&raw.class_id, &raw.vendor_id, &raw.device_id)
    }
}

impl DeviceDescriptor {
    pub fn new(class_id: &str, vendor_id: &str, device_id: &str) -> Result<Self, IdError> {
        Ok(Self {
            class_id: normalize_class_id(class_id)?,
            vendor_id: normalize_pci_id("vendor", vendor_id)?,
            device_id: normalize_pci_id("device", device_id)?,
        })
    }

    /// Class id, empty when the source carries no class (USB, some virtual devices)
    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn vendor_id(&self) -> &str {
        &self.vendor_id
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = if self.class_id.is_empty() {
            "----"
        } else {
            &self.class_id
        };
        write!(f, "{} {}:{}", class, self.vendor_id, self.device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_spellings() {
        assert_eq!(normalize_pci_id("vendor", "10de").unwrap(), "0x10de");
        assert_eq!(normalize_pci_id("vendor", "0x10DE").unwrap(), "0x10de");
        assert_eq!(normalize_pci_id("device", " 40 ").unwrap(), "0x0040");
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert_eq!(
            normalize_pci_id("vendor", ""),
            Err(IdError::Empty { field: "vendor" })
        );
        assert!(normalize_pci_id("vendor", "0x").is_err());
        assert!(normalize_pci_id("vendor", "nvidia").is_err());
        assert!(normalize_pci_id("device", "0x12345").is_err());
    }

    #[test]
    fn test_class_forms() {
        assert_eq!(normalize_class_id("").unwrap(), "");
        assert_eq!(normalize_class_id("0300").unwrap(), "0x0300");
        assert_eq!(normalize_class_id("0x030000").unwrap(), "0x0300");
        assert!(normalize_class_id("0x03000").is_err());
    }

    #[test]
    fn test_id_length_limits() {
        assert_eq!(normalize_pci_id("vendor", "0x1").unwrap(), "0x0001");
        assert_eq!(normalize_pci_id("vendor", "FFFF").unwrap(), "0xffff");
        // six digits is only a valid spelling for classes
        assert!(normalize_pci_id("vendor", "0x10de00").is_err());
        assert!(DeviceDescriptor::new("0300", "10de", "004000").is_err());
        assert_eq!(
            DeviceDescriptor::new("030000", "10de", "0040").unwrap().class_id(),
            "0x0300"
        );
        assert!(normalize_class_id("0x0300000").is_err());
    }

    #[test]
    fn test_display() {
        let gpu = DeviceDescriptor::new("0300", "10de", "0040").unwrap();
        assert_eq!(gpu.to_string(), "0x0300 0x10de:0x0040");

        let usb = DeviceDescriptor::new("", "15ad", "0405").unwrap();
        assert_eq!(usb.to_string(), "---- 0x15ad:0x0405");
    }

    #[test]
    fn test_deserialize_normalizes() {
        let json = r#"{"class_id":"0300","vendor_id":"10DE","device_id":"40"}"#;
        let device: DeviceDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(device, DeviceDescriptor::new("0x0300", "0x10de", "0x0040").unwrap());

        let bad = r#"{"vendor_id":"zz","device_id":"40"}"#;
        assert!(serde_json::from_str::<DeviceDescriptor>(bad).is_err());
    }
}

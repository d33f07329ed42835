//! Driver registry.
//!
//! Filled once at startup and read-only afterwards, so a shared `&DriverRegistry`
//! can serve any number of resolutions without locking.

use crate::device::DeviceDescriptor;
use crate::driver::DriverSpec;
use crate::error::RegistryError;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct DriverRegistry {
    /// Registration order
    specs: Vec<DriverSpec>,
    /// vendor id -> indices into `specs`, ascending
    by_vendor: HashMap<String, Vec<usize>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from specs in order, stopping at the first duplicate.
    pub fn from_specs<I>(specs: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = DriverSpec>,
    {
        let mut registry = Self::new();
        for spec in specs {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, spec: DriverSpec) -> Result<(), RegistryError> {
        if self.get(spec.name()).is_some() {
            return Err(RegistryError::DuplicateDriver(spec.name().to_string()));
        }

        debug!(
            "registered driver {} (vendor {}, {} device ids, priority {})",
            spec.name(),
            spec.vendor_id(),
            spec.device_ids().len(),
            spec.priority()
        );
        self.by_vendor
            .entry(spec.vendor_id().to_string())
            .or_default()
            .push(self.specs.len());
        self.specs.push(spec);
        Ok(())
    }

    /// Every spec whose filter matches the device, in registration order.
    /// An empty result is normal: most hardware needs no extra driver.
    pub fn find_candidates(&self, device: &DeviceDescriptor) -> Vec<&DriverSpec> {
        self.by_vendor
            .get(device.vendor_id())
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| &self.specs[i])
                    .filter(|spec| spec.matches(device))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&DriverSpec> {
        self.specs.iter().find(|spec| spec.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DriverSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverKind;

    fn spec(name: &str, vendor: &str, devices: &[&str]) -> DriverSpec {
        DriverSpec::new(name, "0x0300", vendor, devices.iter().copied(), 0, DriverKind::Nouveau)
            .unwrap()
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = DriverRegistry::new();
        registry.register(spec("nouveau", "0x10de", &[])).unwrap();
        let err = registry.register(spec("nouveau", "0x1002", &[])).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateDriver("nouveau".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_candidates_follow_registration_order() {
        let registry = DriverRegistry::from_specs([
            spec("b", "0x10de", &["0x0040"]),
            spec("other_vendor", "0x1002", &[]),
            spec("a", "0x10de", &[]),
        ])
        .unwrap();

        let device = DeviceDescriptor::new("0x0300", "0x10de", "0x0040").unwrap();
        let names: Vec<&str> = registry
            .find_candidates(&device)
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_unknown_vendor_has_no_candidates() {
        let registry = DriverRegistry::from_specs([spec("a", "0x10de", &[])]).unwrap();
        let device = DeviceDescriptor::new("0x0300", "0x1af4", "0x1050").unwrap();
        assert!(registry.find_candidates(&device).is_empty());
    }
}

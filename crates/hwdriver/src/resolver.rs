//! Driver selection per device group.
//!
//! Devices sharing a class id and vendor id form one group and get one
//! driver: the candidates of every member are pooled and ranked together.
//! Ranking is by priority, then open drivers over proprietary ones. A tie
//! after both is a catalog defect and fails the whole pass.

use crate::device::DeviceDescriptor;
use crate::driver::DriverSpec;
use crate::error::ResolveError;
use crate::registry::DriverRegistry;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, error, info};

/// Result of resolving a single device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceOutcome<'r> {
    pub device: DeviceDescriptor,
    /// None when no registered driver claims the device
    pub driver: Option<&'r DriverSpec>,
}

#[derive(Debug, Clone, Copy)]
pub struct Resolver<'r> {
    registry: &'r DriverRegistry,
    exclude_proprietary: bool,
}

/// `(class_id, vendor_id)` of a device
type GroupKey = (String, String);

fn group_key(device: &DeviceDescriptor) -> GroupKey {
    (device.class_id().to_string(), device.vendor_id().to_string())
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r DriverRegistry) -> Self {
        Self {
            registry,
            exclude_proprietary: false,
        }
    }

    /// Drop proprietary candidates before ranking
    pub fn exclude_proprietary(mut self, exclude: bool) -> Self {
        self.exclude_proprietary = exclude;
        self
    }

    /// Pick the winning driver for one device on its own, if any.
    pub fn select(&self, device: &DeviceDescriptor) -> Result<Option<&'r DriverSpec>, ResolveError> {
        self.select_group(std::slice::from_ref(device))
    }

    /// Pick one driver for a group of devices from the pooled candidates of
    /// all members. Every member is expected to share class and vendor ids.
    pub fn select_group(
        &self,
        devices: &[DeviceDescriptor],
    ) -> Result<Option<&'r DriverSpec>, ResolveError> {
        let Some(first_device) = devices.first() else {
            return Ok(None);
        };

        let mut candidates: Vec<&'r DriverSpec> = Vec::new();
        for device in devices {
            for spec in self.registry.find_candidates(device) {
                if !candidates.iter().any(|c| c.name() == spec.name()) {
                    candidates.push(spec);
                }
            }
        }
        if self.exclude_proprietary {
            candidates.retain(|spec| !spec.is_proprietary());
        }

        let mut best: Option<&'r DriverSpec> = None;
        let mut tied: Option<&'r DriverSpec> = None;
        for candidate in candidates {
            let Some(current) = best else {
                best = Some(candidate);
                continue;
            };
            match rank(candidate).cmp(&rank(current)) {
                Ordering::Greater => {
                    best = Some(candidate);
                    tied = None;
                }
                Ordering::Equal if tied.is_none() => tied = Some(candidate),
                _ => {}
            }
        }

        if let (Some(first), Some(second)) = (best, tied) {
            error!(
                "drivers {} and {} tie for device {}",
                first.name(), second.name(), first_device
            );
            return Err(ResolveError::AmbiguousDriver {
                device: first_device.to_string(),
                first: first.name().to_string(),
                second: second.name().to_string(),
            });
        }
        Ok(best)
    }

    /// Resolve devices in input order.
    ///
    /// A group's winner is computed when its first member is reached and
    /// reused for the rest, so the input is buffered up front.
    pub fn outcomes<I>(
        &self,
        devices: I,
    ) -> impl Iterator<Item = Result<DeviceOutcome<'r>, ResolveError>>
    where
        I: IntoIterator<Item = DeviceDescriptor>,
    {
        let resolver = *self;
        let devices: Vec<DeviceDescriptor> = devices.into_iter().collect();
        let mut groups: HashMap<GroupKey, Vec<DeviceDescriptor>> = HashMap::new();
        for device in &devices {
            groups.entry(group_key(device)).or_default().push(device.clone());
        }
        let mut winners: HashMap<GroupKey, Option<&'r DriverSpec>> = HashMap::new();

        devices
            .into_iter()
            .map(move |device| -> Result<DeviceOutcome<'r>, ResolveError> {
                let key = group_key(&device);
                let driver = match winners.get(&key).copied() {
                    Some(driver) => driver,
                    None => {
                        let members = groups.get(&key).map(Vec::as_slice).unwrap_or_default();
                        let driver = resolver.select_group(members)?;
                        if let Some(spec) = driver {
                            debug!(
                                "group {} {} -> {} ({} devices)",
                                key.0,
                                key.1,
                                spec.name(),
                                members.len()
                            );
                        }
                        winners.insert(key, driver);
                        driver
                    }
                };
                Ok(DeviceOutcome { device, driver })
            })
    }

    /// Resolve every device. The first ambiguity aborts the pass.
    pub fn resolve<I>(&self, devices: I) -> Result<Resolution<'r>, ResolveError>
    where
        I: IntoIterator<Item = DeviceDescriptor>,
    {
        let mut resolution = Resolution::default();
        for outcome in self.outcomes(devices) {
            let outcome = outcome?;
            match outcome.driver {
                Some(spec) => {
                    info!("device {} -> {}", outcome.device, spec.name());
                    resolution.selections.push((outcome.device, spec));
                }
                None => {
                    debug!("device {} has no driver", outcome.device);
                    resolution.unhandled.push(outcome.device);
                }
            }
        }
        Ok(resolution)
    }
}

fn rank(spec: &DriverSpec) -> (i32, bool) {
    (spec.priority(), !spec.is_proprietary())
}

/// Outcome of a resolution pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution<'r> {
    selections: Vec<(DeviceDescriptor, &'r DriverSpec)>,
    unhandled: Vec<DeviceDescriptor>,
}

impl<'r> Resolution<'r> {
    /// Handled devices with their driver, in input order
    pub fn selections(&self) -> &[(DeviceDescriptor, &'r DriverSpec)] {
        &self.selections
    }

    /// Devices no driver claimed. Informational, not an error.
    pub fn unhandled(&self) -> &[DeviceDescriptor] {
        &self.unhandled
    }

    /// Selected drivers without repeats, first-seen order
    pub fn drivers(&self) -> Vec<&'r DriverSpec> {
        let mut drivers: Vec<&'r DriverSpec> = Vec::new();
        for (_, spec) in &self.selections {
            if !drivers.iter().any(|d| d.name() == spec.name()) {
                drivers.push(*spec);
            }
        }
        drivers
    }

    pub fn driver_for(&self, device: &DeviceDescriptor) -> Option<&'r DriverSpec> {
        self.selections
            .iter()
            .find(|(d, _)| d == device)
            .map(|(_, spec)| *spec)
    }

    pub fn summary(&self) -> ResolutionSummary {
        ResolutionSummary {
            selections: self
                .selections
                .iter()
                .map(|(device, spec)| SelectionSummary {
                    device: device.clone(),
                    driver: spec.name().to_string(),
                    proprietary: spec.is_proprietary(),
                })
                .collect(),
            unhandled: self.unhandled.clone(),
        }
    }
}

/// Serializable view of a resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub selections: Vec<SelectionSummary>,
    pub unhandled: Vec<DeviceDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSummary {
    pub device: DeviceDescriptor,
    pub driver: String,
    pub proprietary: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverKind;

    fn registry(specs: Vec<DriverSpec>) -> DriverRegistry {
        DriverRegistry::from_specs(specs).unwrap()
    }

    fn vga(name: &str, priority: i32, kind: DriverKind) -> DriverSpec {
        DriverSpec::new(name, "0x0300", "0x10de", Vec::<&str>::new(), priority, kind).unwrap()
    }

    fn card() -> DeviceDescriptor {
        DeviceDescriptor::new("0x0300", "0x10de", "0x0040").unwrap()
    }

    #[test]
    fn test_higher_priority_wins_regardless_of_order() {
        let reg = registry(vec![
            vga("low", 0, DriverKind::Nouveau),
            vga("high", 5, DriverKind::Nvidia304xx),
        ]);
        let chosen = Resolver::new(&reg).select(&card()).unwrap().unwrap();
        assert_eq!(chosen.name(), "high");
    }

    #[test]
    fn test_tie_prefers_open_driver() {
        for specs in [
            vec![vga("closed", 0, DriverKind::Nvidia304xx), vga("open", 0, DriverKind::Nouveau)],
            vec![vga("open", 0, DriverKind::Nouveau), vga("closed", 0, DriverKind::Nvidia304xx)],
        ] {
            let reg = registry(specs);
            let chosen = Resolver::new(&reg).select(&card()).unwrap().unwrap();
            assert_eq!(chosen.name(), "open");
        }
    }

    #[test]
    fn test_full_tie_is_ambiguous() {
        let reg = registry(vec![
            vga("one", 1, DriverKind::Nouveau),
            vga("two", 1, DriverKind::Nouveau),
        ]);
        let err = Resolver::new(&reg).select(&card()).unwrap_err();
        assert_eq!(
            err,
            ResolveError::AmbiguousDriver {
                device: card().to_string(),
                first: "one".to_string(),
                second: "two".to_string(),
            }
        );
    }

    #[test]
    fn test_tie_below_winner_is_fine() {
        let reg = registry(vec![
            vga("one", 0, DriverKind::Nouveau),
            vga("two", 0, DriverKind::Nouveau),
            vga("three", 3, DriverKind::Nouveau),
        ]);
        let chosen = Resolver::new(&reg).select(&card()).unwrap().unwrap();
        assert_eq!(chosen.name(), "three");
    }

    #[test]
    fn test_exclude_proprietary() {
        let reg = registry(vec![vga("closed", 9, DriverKind::Nvidia304xx)]);
        let resolver = Resolver::new(&reg).exclude_proprietary(true);
        assert!(resolver.select(&card()).unwrap().is_none());
    }

    #[test]
    fn test_outcomes_keep_input_order() {
        let reg = registry(vec![vga("open", 0, DriverKind::Nouveau)]);
        let other = DeviceDescriptor::new("0x0200", "0x8086", "0x15b8").unwrap();
        let outcomes: Vec<_> = Resolver::new(&reg)
            .outcomes(vec![other.clone(), card()])
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(outcomes[0].device, other);
        assert!(outcomes[0].driver.is_none());
        assert_eq!(outcomes[1].driver.map(|s| s.name()), Some("open"));
    }

    fn listed(name: &str, id: &str, priority: i32, kind: DriverKind) -> DriverSpec {
        DriverSpec::new(name, "0x0300", "0x10de", [id], priority, kind).unwrap()
    }

    #[test]
    fn test_group_shares_one_driver() {
        let reg = registry(vec![
            listed("legacy", "0x0040", 2, DriverKind::Nvidia304xx),
            listed("modern", "0x1c82", 0, DriverKind::Nouveau),
        ]);
        let old = card();
        let new = DeviceDescriptor::new("0x0300", "0x10de", "0x1c82").unwrap();

        // on its own the newer card would get "modern"
        let alone = Resolver::new(&reg).select(&new).unwrap().unwrap();
        assert_eq!(alone.name(), "modern");

        let outcomes: Vec<_> = Resolver::new(&reg)
            .outcomes(vec![new.clone(), old.clone()])
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(outcomes[0].device, new);
        assert_eq!(outcomes[0].driver.map(|s| s.name()), Some("legacy"));
        assert_eq!(outcomes[1].driver.map(|s| s.name()), Some("legacy"));
    }

    #[test]
    fn test_group_tie_is_ambiguous() {
        let reg = registry(vec![
            listed("one", "0x0040", 1, DriverKind::Nouveau),
            listed("two", "0x1c82", 1, DriverKind::Nouveau),
        ]);
        let other = DeviceDescriptor::new("0x0300", "0x10de", "0x1c82").unwrap();
        // each device alone has a single candidate
        assert!(Resolver::new(&reg).select(&card()).is_ok());
        assert!(Resolver::new(&reg).select(&other).is_ok());

        let err = Resolver::new(&reg).resolve(vec![card(), other]).unwrap_err();
        assert!(matches!(err, ResolveError::AmbiguousDriver { .. }));
    }

    #[test]
    fn test_groups_split_on_class() {
        let reg = registry(vec![listed("legacy", "0x0040", 0, DriverKind::Nvidia304xx)]);
        let audio = DeviceDescriptor::new("0x0403", "0x10de", "0x1c82").unwrap();
        let resolution = Resolver::new(&reg).resolve(vec![card(), audio.clone()]).unwrap();
        assert_eq!(resolution.unhandled(), &[audio]);
        assert_eq!(resolution.selections().len(), 1);
    }
}

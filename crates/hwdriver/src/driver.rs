//! Driver variants and their applicability filters.
//!
//! The set of drivers is closed: every variant is a `DriverKind` and all
//! behavior dispatches on it. A `DriverSpec` pairs a kind with the device
//! table it claims.

use crate::device::{normalize_class_id, normalize_pci_id, DeviceDescriptor};
use crate::error::{IdError, PostInstallError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Only this architecture gets `lib32-*` multilib packages.
pub const MULTILIB_ARCH: &str = "x86_64";

const NVIDIA_XORG_CONF: &str = "etc/X11/xorg.conf.d/20-nvidia.conf";
const SYSTEMD_WANTS_DIR: &str = "etc/systemd/system/multi-user.target.wants";
const SYSTEMD_UNIT_DIR: &str = "/usr/lib/systemd/system";

const NO_PACKAGES: &[&str] = &[];
const MESA_LIB32: &[&str] = &["lib32-mesa"];
const NVIDIA_304XX_PACKAGES: &[&str] = &[
    "nvidia-304xx",
    "nvidia-304xx-utils",
    "nvidia-304xx-libgl",
    "libvdpau",
    "libcl",
];
const NVIDIA_304XX_LIB32: &[&str] = &["lib32-nvidia-304xx-libgl", "lib32-libvdpau"];
const NOUVEAU_PACKAGES: &[&str] = &["xf86-video-nouveau", "mesa", "mesa-vdpau", "libvdpau"];
const NOUVEAU_LIB32: &[&str] = &["lib32-mesa", "lib32-mesa-vdpau"];
const INTEL_PACKAGES: &[&str] = &["xf86-video-intel", "mesa", "libva-intel-driver"];
const ATI_PACKAGES: &[&str] = &["xf86-video-ati", "mesa", "mesa-vdpau"];
const VMWARE_PACKAGES: &[&str] = &["xf86-video-vmware", "xf86-input-vmmouse", "open-vm-tools"];
const VIRTUALBOX_PACKAGES: &[&str] = &["virtualbox-guest-modules-arch", "virtualbox-guest-utils"];

/// Every driver the catalog knows how to install
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    /// Legacy proprietary NVIDIA driver for GeForce 6/7 era cards
    Nvidia304xx,
    Nouveau,
    Intel,
    Ati,
    /// VMware guest
    Vmware,
    /// VirtualBox guest
    VirtualBox,
}

impl DriverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverKind::Nvidia304xx => "nvidia_304xx",
            DriverKind::Nouveau => "nouveau",
            DriverKind::Intel => "intel",
            DriverKind::Ati => "ati",
            DriverKind::Vmware => "vmware",
            DriverKind::VirtualBox => "virtualbox",
        }
    }

    /// Packages to install, in install order.
    pub fn packages(&self, architecture: &str) -> Vec<String> {
        let multilib = architecture == MULTILIB_ARCH;
        let (base, lib32) = match self {
            DriverKind::Nvidia304xx => (NVIDIA_304XX_PACKAGES, NVIDIA_304XX_LIB32),
            DriverKind::Nouveau => (NOUVEAU_PACKAGES, NOUVEAU_LIB32),
            DriverKind::Intel => (INTEL_PACKAGES, MESA_LIB32),
            DriverKind::Ati => (ATI_PACKAGES, MESA_LIB32),
            DriverKind::Vmware => (VMWARE_PACKAGES, NO_PACKAGES),
            DriverKind::VirtualBox => (VIRTUALBOX_PACKAGES, NO_PACKAGES),
        };

        let mut packages: Vec<String> = base.iter().map(|p| p.to_string()).collect();
        if multilib {
            packages.extend(lib32.iter().map(|p| p.to_string()));
        }
        packages
    }

    pub fn is_proprietary(&self) -> bool {
        matches!(self, DriverKind::Nvidia304xx)
    }

    /// Whether `post_install` does anything for this driver
    pub fn has_post_install(&self) -> bool {
        matches!(self, DriverKind::Nvidia304xx | DriverKind::VirtualBox)
    }

    /// Driver-specific setup inside an installed system rooted at `target_root`.
    pub fn post_install(&self, target_root: &Path) -> Result<(), PostInstallError> {
        if !self.has_post_install() {
            return Ok(());
        }
        if !target_root.is_dir() {
            return Err(PostInstallError::TargetRootMissing {
                driver: self.as_str().to_string(),
                root: target_root.to_path_buf(),
            });
        }

        match self {
            DriverKind::Nvidia304xx => self.write_nvidia_xorg_conf(target_root),
            DriverKind::VirtualBox => self.enable_unit(target_root, "vboxservice.service"),
            _ => Ok(()),
        }
    }

    fn write_nvidia_xorg_conf(&self, target_root: &Path) -> Result<(), PostInstallError> {
        let path = target_root.join(NVIDIA_XORG_CONF);
        let content = "\
Section \"Device\"
        Identifier \"Nvidia Card\"
        Driver \"nvidia\"
        VendorName \"NVIDIA Corporation\"
        Option \"NoLogo\" \"true\"
EndSection
";
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
        }
        fs::write(&path, content).map_err(|e| self.io_error(&path, e))?;
        info!("{}: wrote {}", self.as_str(), path.display());
        Ok(())
    }

    /// Same effect as `systemctl enable` on a unit wanted by multi-user.target.
    fn enable_unit(&self, target_root: &Path, unit: &str) -> Result<(), PostInstallError> {
        let wants = target_root.join(SYSTEMD_WANTS_DIR);
        fs::create_dir_all(&wants).map_err(|e| self.io_error(&wants, e))?;

        let link = wants.join(unit);
        if link.symlink_metadata().is_ok() {
            debug!("{}: {} already enabled", self.as_str(), unit);
            return Ok(());
        }
        let target = PathBuf::from(SYSTEMD_UNIT_DIR).join(unit);
        std::os::unix::fs::symlink(&target, &link).map_err(|e| self.io_error(&link, e))?;
        info!("{}: enabled {}", self.as_str(), unit);
        Ok(())
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> PostInstallError {
        PostInstallError::Io {
            driver: self.as_str().to_string(),
            path: path.to_path_buf(),
            source,
        }
    }
}

impl std::fmt::Display for DriverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static declaration of where a driver applies and what it is.
///
/// Deserializing goes through [`DriverSpec::new`], so ids read from JSON are
/// normalized and validated the same way as ids given in code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDriverSpec")]
pub struct DriverSpec {
    name: String,
    class_id: String,
    vendor_id: String,
    device_ids: BTreeSet<String>,
    priority: i32,
    kind: DriverKind,
}

#[derive(Deserialize)]
struct RawDriverSpec {
    name: String,
    #[serde(default)]
    class_id: String,
    vendor_id: String,
    #[serde(default)]
    device_ids: Vec<String>,
    #[serde(default)]
    priority: i32,
    kind: DriverKind,
}

impl TryFrom<RawDriverSpec> for DriverSpec {
    type Error = IdError;

    fn try_from(raw: RawDriverSpec) -> Result<Self, Self::Error> {
        DriverSpec::new(
            &raw.name,
            &raw.class_id,
            &raw.vendor_id,
            raw.device_ids,
            raw.priority,
            raw.kind,
        )
    }
}

impl DriverSpec {
    /// Build a spec, normalizing every id the same way devices are.
    pub fn new<I, S>(
        name: &str,
        class_id: &str,
        vendor_id: &str,
        device_ids: I,
        priority: i32,
        kind: DriverKind,
    ) -> Result<Self, IdError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let device_ids = device_ids
            .into_iter()
            .map(|id| normalize_pci_id("device", id.as_ref()))
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self {
            name: name.to_string(),
            class_id: normalize_class_id(class_id)?,
            vendor_id: normalize_pci_id("vendor", vendor_id)?,
            device_ids,
            priority,
            kind,
        })
    }

    /// Unique name within a registry
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Empty matches any class
    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn vendor_id(&self) -> &str {
        &self.vendor_id
    }

    /// Empty matches every device of the vendor (and class, if set)
    pub fn device_ids(&self) -> &BTreeSet<String> {
        &self.device_ids
    }

    /// Higher wins
    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn kind(&self) -> DriverKind {
        self.kind
    }

    /// Copy of this spec with a different priority
    pub fn with_priority(&self, priority: i32) -> Self {
        Self {
            priority,
            ..self.clone()
        }
    }

    pub fn is_proprietary(&self) -> bool {
        self.kind.is_proprietary()
    }

    pub fn packages(&self, architecture: &str) -> Vec<String> {
        self.kind.packages(architecture)
    }

    /// Filter predicate: class (when set), vendor exact, device exact or wildcard.
    pub fn matches(&self, device: &DeviceDescriptor) -> bool {
        if !self.class_id.is_empty() && self.class_id != device.class_id() {
            return false;
        }
        if self.vendor_id != device.vendor_id() {
            return false;
        }
        self.device_ids.is_empty() || self.device_ids.contains(device.device_id())
    }
}

//! Hardware driver resolution for system installation.
//!
//! Detected PCI/USB devices go in; the registry finds which drivers claim
//! them, the resolver picks one per device, and the plan builder turns the
//! picks into a package list plus post-install actions for the target root.

pub mod catalog;
pub mod config;
pub mod device;
pub mod driver;
pub mod enumerate;
pub mod error;
pub mod plan;
pub mod registry;
pub mod resolver;
pub mod settings;

pub use config::HwDriverConfig;
pub use device::DeviceDescriptor;
pub use driver::{DriverKind, DriverSpec};
pub use error::{ConfigError, IdError, PostInstallError, RegistryError, ResolveError, SettingsError};
pub use plan::{InstallPlan, InstallPlanBuilder, PostInstallAction, PostInstallReport};
pub use registry::DriverRegistry;
pub use resolver::{DeviceOutcome, Resolution, ResolutionSummary, Resolver};
pub use settings::SharedSettings;

//! Error types for driver resolution.
//!
//! Registry and resolver errors abort a resolution pass. Post-install errors
//! are per driver and get collected into a report instead.

use std::path::PathBuf;
use thiserror::Error;

/// A PCI/USB identifier that could not be normalized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("{field} id is empty")]
    Empty { field: &'static str },

    #[error("{field} id {value:?} is not a hex identifier")]
    Invalid { field: &'static str, value: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("driver {0:?} is already registered")]
    DuplicateDriver(String),

    #[error("driver {driver:?} has a bad id: {source}")]
    InvalidId {
        driver: String,
        #[source]
        source: IdError,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Two candidates tie on priority and licensing. This is a catalog defect.
    #[error("ambiguous driver for device {device}: {first:?} and {second:?} tie")]
    AmbiguousDriver {
        device: String,
        first: String,
        second: String,
    },
}

#[derive(Error, Debug)]
pub enum PostInstallError {
    #[error("{driver}: target root {} does not exist", root.display())]
    TargetRootMissing { driver: String, root: PathBuf },

    #[error("{driver}: failed writing {}: {source}", path.display())]
    Io {
        driver: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PostInstallError {
    /// Name of the driver whose post-install step failed
    pub fn driver(&self) -> &str {
        match self {
            PostInstallError::TargetRootMissing { driver, .. } => driver,
            PostInstallError::Io { driver, .. } => driver,
        }
    }

    /// Attribute the failure to a registry name instead of the driver kind
    pub(crate) fn for_driver(mut self, name: &str) -> Self {
        match &mut self {
            PostInstallError::TargetRootMissing { driver, .. }
            | PostInstallError::Io { driver, .. } => *driver = name.to_string(),
        }
        self
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("setting {0:?} is already set")]
    AlreadySet(String),

    #[error("setting {key:?} could not be encoded or decoded: {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

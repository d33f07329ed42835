//! Configuration
//!
//! Lives in /etc/hwdriver/config.toml. Every section is optional; a missing
//! file means defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const SYSTEM_CONFIG_DIR: &str = "/etc/hwdriver";
const CONFIG_FILE: &str = "config.toml";

/// Where the installer mounts the target system
pub const DEFAULT_TARGET_ROOT: &str = "/install";

/// Driver selection settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Never select proprietary drivers
    #[serde(default)]
    pub exclude_proprietary: bool,

    /// Driver name -> priority, replacing the catalog value
    #[serde(default)]
    pub priority_overrides: BTreeMap<String, i32>,
}

/// Install plan settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Target architecture; the host's when unset
    #[serde(default)]
    pub architecture: Option<String>,

    #[serde(default = "default_target_root")]
    pub target_root: PathBuf,
}

fn default_target_root() -> PathBuf {
    PathBuf::from(DEFAULT_TARGET_ROOT)
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            architecture: None,
            target_root: default_target_root(),
        }
    }
}

impl PlanConfig {
    pub fn effective_architecture(&self) -> String {
        self.architecture
            .clone()
            .unwrap_or_else(host_architecture)
    }
}

/// Host architecture in `uname -m` spelling
pub fn host_architecture() -> String {
    match std::env::consts::ARCH {
        "x86" => "i686".to_string(),
        arch => arch.to_string(),
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HwDriverConfig {
    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub plan: PlanConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl HwDriverConfig {
    /// Load the system config. A missing file means defaults; a file that
    /// exists but can't be read or parsed is an error.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_or_default(&config_path())
    }

    /// Defaults when `path` doesn't exist, otherwise [`HwDriverConfig::load_from`].
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Load a specific file. Errors are reported, not papered over.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub fn config_path() -> PathBuf {
    PathBuf::from(SYSTEM_CONFIG_DIR).join(CONFIG_FILE)
}

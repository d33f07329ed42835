//! Install plan construction and post-install execution.
//!
//! Building a plan is pure: same resolution, architecture and root give the
//! same plan. Running post-install actions is the only step that touches the
//! filesystem, and it runs them one at a time in plan order.

use crate::driver::DriverKind;
use crate::error::PostInstallError;
use crate::resolver::Resolution;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One driver's setup step inside the target system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInstallAction {
    pub driver: String,
    pub kind: DriverKind,
    pub target_root: PathBuf,
}

impl PostInstallAction {
    pub fn run(&self) -> Result<(), PostInstallError> {
        self.kind
            .post_install(&self.target_root)
            .map_err(|e| e.for_driver(&self.driver))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallPlan {
    pub architecture: String,
    /// Unique, first-seen order
    pub packages: Vec<String>,
    /// Resolution order
    pub post_install: Vec<PostInstallAction>,
}

impl InstallPlan {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.post_install.is_empty()
    }

    /// Run every post-install action in order. A failure is logged and kept;
    /// the remaining actions still run.
    pub fn run_post_install(&self) -> PostInstallReport {
        let started_at = Utc::now();
        let mut completed = Vec::new();
        let mut failures = Vec::new();

        for action in &self.post_install {
            match action.run() {
                Ok(()) => {
                    info!("post-install {} done", action.driver);
                    completed.push(action.driver.clone());
                }
                Err(e) => {
                    warn!("post-install {} failed: {}", action.driver, e);
                    failures.push(e);
                }
            }
        }

        PostInstallReport {
            started_at,
            finished_at: Utc::now(),
            completed,
            failures,
        }
    }
}

/// What happened when a plan's post-install actions ran
#[derive(Debug)]
pub struct PostInstallReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Drivers whose action succeeded, in run order
    pub completed: Vec<String>,
    pub failures: Vec<PostInstallError>,
}

impl PostInstallReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct InstallPlanBuilder {
    architecture: String,
    target_root: PathBuf,
}

impl InstallPlanBuilder {
    pub fn new(architecture: &str, target_root: impl AsRef<Path>) -> Self {
        Self {
            architecture: architecture.to_string(),
            target_root: target_root.as_ref().to_path_buf(),
        }
    }

    pub fn build(&self, resolution: &Resolution<'_>) -> InstallPlan {
        let mut seen = HashSet::new();
        let mut packages = Vec::new();
        let mut post_install = Vec::new();

        for spec in resolution.drivers() {
            for package in spec.packages(&self.architecture) {
                if seen.insert(package.clone()) {
                    packages.push(package);
                } else {
                    debug!("{}: package {} already planned", spec.name(), package);
                }
            }

            if spec.kind().has_post_install() {
                post_install.push(PostInstallAction {
                    driver: spec.name().to_string(),
                    kind: spec.kind(),
                    target_root: self.target_root.clone(),
                });
            }
        }

        InstallPlan {
            architecture: self.architecture.clone(),
            packages,
            post_install,
        }
    }
}

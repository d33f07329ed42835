//! Settings handed from one installer step to the next.
//!
//! Each key can be written once; the first writer wins and later writes are
//! refused. The installer owns one `SharedSettings` and passes it along, so
//! there is no global state.

use crate::error::SettingsError;
use crate::plan::InstallPlan;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Key under which the resolved install plan is stored
pub const INSTALL_PLAN_KEY: &str = "hardware.install_plan";

#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    values: BTreeMap<String, Value>,
}

impl SharedSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from initial values. These count as the first write.
    pub fn from_map(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), SettingsError> {
        if self.values.contains_key(key) {
            return Err(SettingsError::AlreadySet(key.to_string()));
        }
        let value = serde_json::to_value(value).map_err(|source| SettingsError::Codec {
            key: key.to_string(),
            source,
        })?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SettingsError> {
        self.values
            .get(key)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|source| SettingsError::Codec {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn set_install_plan(&mut self, plan: &InstallPlan) -> Result<(), SettingsError> {
        self.set(INSTALL_PLAN_KEY, plan)
    }

    pub fn install_plan(&self) -> Result<Option<InstallPlan>, SettingsError> {
        self.get(INSTALL_PLAN_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_writer_wins() {
        let mut settings = SharedSettings::new();
        settings.set("arch", &"x86_64").unwrap();

        let err = settings.set("arch", &"i686").unwrap_err();
        assert!(matches!(err, SettingsError::AlreadySet(ref k) if k == "arch"));
        assert_eq!(settings.get::<String>("arch").unwrap().as_deref(), Some("x86_64"));
    }

    #[test]
    fn test_missing_key_is_none() {
        let settings = SharedSettings::new();
        assert_eq!(settings.get::<String>("nothing").unwrap(), None);
        assert!(!settings.contains("nothing"));
    }

    #[test]
    fn test_seeded_values_are_final() {
        let mut settings = SharedSettings::from_map(BTreeMap::from([(
            "target_root".to_string(),
            Value::from("/install"),
        )]));
        assert!(settings.set("target_root", &"/mnt").is_err());
        assert_eq!(settings.keys().collect::<Vec<_>>(), vec!["target_root"]);
    }

    #[test]
    fn test_wrong_type_is_codec_error() {
        let mut settings = SharedSettings::new();
        settings.set("count", &"three").unwrap();
        assert!(matches!(
            settings.get::<u32>("count"),
            Err(SettingsError::Codec { .. })
        ));
    }

    #[test]
    fn test_install_plan_slot() {
        let plan = InstallPlan {
            architecture: "x86_64".to_string(),
            packages: vec!["mesa".to_string()],
            post_install: Vec::new(),
        };
        let mut settings = SharedSettings::new();
        assert_eq!(settings.install_plan().unwrap(), None);

        settings.set_install_plan(&plan).unwrap();
        assert_eq!(settings.install_plan().unwrap(), Some(plan.clone()));
        assert!(settings.set_install_plan(&plan).is_err());
    }
}

//! Submitter configuration, loaded once at startup.
//!
//! ```json
//! {
//!   "farm": { "backend": "deadline", "tempDir": "/tmp/deadline", "submitScene": false },
//!   "sceneFile": "/jobs/shot010/shot010_v003.hip",
//!   "rules": { "ifd": ["MissingPool", "MissingCamera"] }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::validate::{RuleRegistry, RuleTable};

/// Set to any value to submit to the virtual farm instead of Deadline.
pub const VIRTUAL_FARM_ENV: &str = "HOUFARM_VIRTUAL_DEADLINE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitterConfig {
    #[serde(default)]
    pub farm: FarmBackend,
    /// Groups the submitted jobs in the farm monitor. Defaults to the scene
    /// file name.
    #[serde(default)]
    pub batch_name: Option<String>,
    #[serde(default = "default_department")]
    pub department: String,
    #[serde(default)]
    pub scene_file: String,
    #[serde(default)]
    pub houdini_version: Option<String>,
    /// Replaces the default rule list of the kinds it names.
    #[serde(default)]
    pub rules: Option<RuleTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum FarmBackend {
    #[serde(rename_all = "camelCase")]
    Deadline {
        /// Path to `deadlinecommand`; located from the Deadline install when absent.
        #[serde(default)]
        command: Option<PathBuf>,
        #[serde(default)]
        temp_dir: Option<PathBuf>,
        /// Upload the scene file with every job instead of referencing it.
        #[serde(default)]
        submit_scene: bool,
    },
    Virtual,
}

impl Default for FarmBackend {
    fn default() -> Self {
        FarmBackend::Deadline {
            command: None,
            temp_dir: None,
            submit_scene: false,
        }
    }
}

fn default_department() -> String {
    "3D".to_string()
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        SubmitterConfig {
            farm: FarmBackend::default(),
            batch_name: None,
            department: default_department(),
            scene_file: String::new(),
            houdini_version: None,
            rules: None,
        }
    }
}

impl SubmitterConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read a config file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let mut config = Self::from_json(&json)?;
        config.apply_env();
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    pub fn apply_env_from(&mut self, var: impl Fn(&str) -> Option<String>) {
        if var(VIRTUAL_FARM_ENV).is_some() && self.farm != FarmBackend::Virtual {
            info!(env = VIRTUAL_FARM_ENV, "virtual farm forced by environment");
            self.farm = FarmBackend::Virtual;
        }
    }

    /// Batch name for the farm monitor.
    pub fn batch_name(&self) -> String {
        if let Some(name) = &self.batch_name {
            return name.clone();
        }
        Path::new(&self.scene_file)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn registry(&self) -> Result<RuleRegistry, ConfigError> {
        match &self.rules {
            Some(table) => RuleRegistry::from_table(table),
            None => Ok(RuleRegistry::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = SubmitterConfig::from_json("{}").unwrap();
        assert_eq!(config, SubmitterConfig::default());
        assert_eq!(config.department, "3D");
    }

    #[test]
    fn deadline_backend_fields_are_camel_case() {
        let config = SubmitterConfig::from_json(
            r#"{ "farm": { "backend": "deadline", "tempDir": "/tmp/dl", "submitScene": true } }"#,
        )
        .unwrap();
        assert_eq!(
            config.farm,
            FarmBackend::Deadline {
                command: None,
                temp_dir: Some(PathBuf::from("/tmp/dl")),
                submit_scene: true,
            }
        );
    }

    #[test]
    fn env_forces_virtual_farm() {
        let mut config = SubmitterConfig::default();
        config.apply_env_from(|_| None);
        assert_ne!(config.farm, FarmBackend::Virtual);
        config.apply_env_from(|name| (name == VIRTUAL_FARM_ENV).then(|| "1".to_string()));
        assert_eq!(config.farm, FarmBackend::Virtual);
    }

    #[test]
    fn batch_name_defaults_to_scene_file_name() {
        let config = SubmitterConfig {
            scene_file: "/jobs/shot010/shot010_v003.hip".into(),
            ..Default::default()
        };
        assert_eq!(config.batch_name(), "shot010_v003.hip");
    }

    #[test]
    fn bad_rule_table_is_reported() {
        let config = SubmitterConfig::from_json(r#"{ "rules": { "ifd": ["Bogus"] } }"#).unwrap();
        assert!(matches!(config.registry(), Err(ConfigError::UnknownRule { .. })));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            SubmitterConfig::from_json("{ farm: "),
            Err(ConfigError::Parse(_))
        ));
    }
}

//! Application configuration
//!
//! Persisted between runs via confy under the platform config directory.
//! Paths are stored as plain strings; resolution to platform defaults
//! happens in the accessors so an empty config file stays portable.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Name shown to other planners on claims and presence
    pub display_name: String,
    /// Plan opened when none is named on the command line
    pub default_plan: String,
    /// Extra ability definition files, loaded over the bundled catalog
    pub catalog_directory: Option<String>,
    /// Extra encounter files, loaded over the bundled ones
    pub encounter_directory: Option<String>,
    /// Where plan documents live; the platform data directory when unset
    pub plan_directory: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            display_name: String::new(),
            default_plan: "default".to_string(),
            catalog_directory: None,
            encounter_directory: None,
            plan_directory: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        confy::load("rampart", "config").unwrap_or_default()
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        confy::store("rampart", "config", self).map_err(ConfigError::Save)
    }

    pub fn plan_dir(&self) -> PathBuf {
        self.plan_directory
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_plan_directory)
    }

    pub fn catalog_dir(&self) -> Option<PathBuf> {
        self.catalog_directory.as_ref().map(PathBuf::from)
    }

    pub fn encounter_dir(&self) -> Option<PathBuf> {
        self.encounter_directory.as_ref().map(PathBuf::from)
    }
}

fn default_plan_directory() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("rampart").join("plans"))
        .unwrap_or_else(|| PathBuf::from("plans"))
}

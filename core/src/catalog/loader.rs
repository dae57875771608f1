//! Ability catalog loading
//!
//! Loads ability definitions from TOML files. A catalog ships bundled into
//! the binary; user-supplied files from the configured catalog directory are
//! loaded on top (recursive, one or more `[[ability]]` entries per file).

use std::fs;
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use thiserror::Error;

use super::definition::{AbilityDefinition, CatalogConfig, StackPoolConfig};
use super::jobs::Job;

/// Catalog shipped with the binary
const BUNDLED_CATALOG: &str = include_str!("../../data/abilities.toml");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: Box<toml::de::Error>,
    },
    #[error("failed to parse bundled catalog: {0}")]
    Bundled(Box<toml::de::Error>),
    #[error("duplicate ability id '{id}'")]
    DuplicateId { id: String },
}

/// Immutable table of ability definitions keyed by id
#[derive(Debug, Clone, Default)]
pub struct AbilityCatalog {
    abilities: HashMap<String, AbilityDefinition>,
    /// Ids in file order, for stable listing
    order: Vec<String>,
    stack_pool: Option<StackPoolConfig>,
}

impl AbilityCatalog {
    /// The catalog compiled into the binary.
    pub fn bundled() -> Result<Self, CatalogError> {
        let config: CatalogConfig =
            toml::from_str(BUNDLED_CATALOG).map_err(|e| CatalogError::Bundled(Box::new(e)))?;
        Self::from_config(config)
    }

    pub fn from_config(config: CatalogConfig) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        catalog.merge(config)?;
        Ok(catalog)
    }

    /// Load every `.toml` file under a directory (recursive) into the
    /// catalog. Files that fail to parse are skipped with a warning so one
    /// bad file does not take down the whole catalog.
    pub fn load_dir(&mut self, dir: &Path) -> Result<(), CatalogError> {
        if !dir.exists() {
            return Ok(());
        }

        let entries = fs::read_dir(dir).map_err(|e| CatalogError::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                self.load_dir(&path)?;
            } else if path.extension().is_some_and(|ext| ext == "toml") {
                if let Err(e) = self.merge_file(&path) {
                    tracing::warn!("skipping catalog file: {e}");
                }
            }
        }

        Ok(())
    }

    fn merge_file(&mut self, path: &Path) -> Result<(), CatalogError> {
        let content = fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: CatalogConfig = toml::from_str(&content).map_err(|e| CatalogError::Parse {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        self.merge(config)
    }

    fn merge(&mut self, config: CatalogConfig) -> Result<(), CatalogError> {
        if self.stack_pool.is_none() {
            self.stack_pool = config.stack_pool;
        }

        for ability in config.abilities {
            if self.abilities.contains_key(&ability.id) {
                return Err(CatalogError::DuplicateId { id: ability.id });
            }
            self.order.push(ability.id.clone());
            self.abilities.insert(ability.id.clone(), ability);
        }

        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&AbilityDefinition> {
        self.abilities.get(id)
    }

    /// All abilities in file order.
    pub fn iter(&self) -> impl Iterator<Item = &AbilityDefinition> {
        self.order.iter().filter_map(|id| self.abilities.get(id))
    }

    /// Abilities castable by the given job, in file order.
    pub fn for_job(&self, job: Job) -> impl Iterator<Item = &AbilityDefinition> {
        self.iter().filter(move |ability| ability.can_cast(job))
    }

    /// Shared resource pool configuration, if any catalog file declared one.
    pub fn stack_pool(&self) -> Option<StackPoolConfig> {
        self.stack_pool
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::definition::MitigationValue;

    #[test]
    fn test_parse_catalog_config() {
        let toml = r#"
[stack_pool]
capacity = 3
refill_secs = 60.0

[[ability]]
id = "shell"
name = "Shell"
level = 35
jobs = ["SCH"]
target = "party"
cooldown = 120.0
duration = 30.0
mitigation = 0.10

[[ability]]
id = "ward"
name = "Ward"
level = 66
jobs = ["WHM"]
target = "single"
cooldown = 30.0
duration = 15.0
charges = [{ level = 66, value = 1 }, { level = 88, value = 2 }]
barrier = { max_hp_percent = 0.15 }

[[ability]]
id = "veil"
name = "Veil"
jobs = ["DRG"]
target = "party"
cooldown = 90.0
duration = 15.0
mitigation = { physical = 0.10, magical = 0.05 }
"#;

        let config: CatalogConfig = toml::from_str(toml).expect("Failed to parse TOML");
        let catalog = AbilityCatalog::from_config(config).expect("Failed to build catalog");

        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.stack_pool().map(|pool| pool.capacity),
            Some(3)
        );

        let shell = catalog.get("shell").expect("shell missing");
        assert_eq!(shell.cooldown_at(90), 120.0);
        assert_eq!(
            shell.mitigation_at(90),
            Some(MitigationValue::Uniform(0.10))
        );

        let ward = catalog.get("ward").expect("ward missing");
        assert_eq!(ward.charges_at(70), 1);
        assert_eq!(ward.charges_at(90), 2);
        assert!(ward.barrier.is_some());

        let veil = catalog.get("veil").expect("veil missing");
        assert!(matches!(
            veil.mitigation_at(90),
            Some(MitigationValue::Split { .. })
        ));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let toml = r#"
[[ability]]
id = "shell"
name = "Shell"
jobs = ["SCH"]
target = "party"

[[ability]]
id = "shell"
name = "Shell Again"
jobs = ["SCH"]
target = "party"
"#;

        let config: CatalogConfig = toml::from_str(toml).expect("Failed to parse TOML");
        assert!(matches!(
            AbilityCatalog::from_config(config),
            Err(CatalogError::DuplicateId { .. })
        ));
    }

    #[test]
    fn test_for_job_filters_by_caster() {
        let toml = r#"
[[ability]]
id = "shell"
name = "Shell"
jobs = ["SCH"]
target = "party"

[[ability]]
id = "tank_wall"
name = "Tank Wall"
jobs = ["PLD", "WAR", "DRK", "GNB"]
target = "self"
"#;

        let config: CatalogConfig = toml::from_str(toml).expect("Failed to parse TOML");
        let catalog = AbilityCatalog::from_config(config).expect("Failed to build catalog");

        let for_war: Vec<_> = catalog.for_job(Job::Warrior).map(|a| a.id.as_str()).collect();
        assert_eq!(for_war, vec!["tank_wall"]);

        let for_sch: Vec<_> = catalog.for_job(Job::Scholar).map(|a| a.id.as_str()).collect();
        assert_eq!(for_sch, vec!["shell"]);
    }

    #[test]
    fn test_bundled_catalog_parses() {
        let catalog = AbilityCatalog::bundled().expect("bundled catalog invalid");
        assert!(!catalog.is_empty());
        assert!(catalog.stack_pool().is_some());
    }
}

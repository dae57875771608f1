//! Encounter loading
//!
//! Builds sorted [`Timeline`]s from encounter TOML files. A demo encounter
//! ships bundled into the binary; user files from the configured encounter
//! directory load on top.

use std::fs;
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use thiserror::Error;

use super::definition::{BossAction, EncounterConfig};

/// Encounter shipped with the binary
const BUNDLED_ENCOUNTER: &str = include_str!("../../data/encounters/the_sunspire.toml");

#[derive(Debug, Error)]
pub enum TimelineError {
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
    #[error("failed to parse bundled encounter: {0}")]
    Bundled(Box<toml::de::Error>),
    #[error("duplicate encounter id '{id}'")]
    DuplicateId { id: String },
}

/// Sorted view of one encounter's boss actions
#[derive(Debug, Clone)]
pub struct Timeline {
    pub id: String,
    pub name: String,
    pub duration_secs: f32,
    actions: Vec<BossAction>,
}

impl Timeline {
    /// Sorts actions by time. The sort is stable, so actions sharing a
    /// timestamp keep their file order.
    pub fn from_config(config: EncounterConfig) -> Self {
        let mut actions = config.actions;
        actions.sort_by(|a, b| a.time_secs.total_cmp(&b.time_secs));
        Self {
            id: config.encounter.id,
            name: config.encounter.name,
            duration_secs: config.encounter.duration_secs,
            actions,
        }
    }

    pub fn action(&self, id: &str) -> Option<&BossAction> {
        self.actions.iter().find(|action| action.id == id)
    }

    pub fn action_time(&self, id: &str) -> Option<f32> {
        self.action(id).map(|action| action.time_secs)
    }

    pub fn actions(&self) -> &[BossAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// All known encounters, keyed by id
#[derive(Debug, Clone, Default)]
pub struct EncounterLibrary {
    encounters: HashMap<String, Timeline>,
    /// Ids in load order, for stable listing
    order: Vec<String>,
}

impl EncounterLibrary {
    /// The demo encounter compiled into the binary.
    pub fn bundled() -> Result<Self, TimelineError> {
        let config: EncounterConfig =
            toml::from_str(BUNDLED_ENCOUNTER).map_err(|e| TimelineError::Bundled(Box::new(e)))?;
        let mut library = Self::default();
        library.insert(Timeline::from_config(config))?;
        Ok(library)
    }

    /// Load every `.toml` file under a directory (recursive) into the
    /// library. Files that fail to parse are skipped with a warning.
    pub fn load_dir(&mut self, dir: &Path) -> Result<(), TimelineError> {
        if !dir.exists() {
            return Ok(());
        }

        let entries = fs::read_dir(dir).map_err(|e| TimelineError::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                self.load_dir(&path)?;
            } else if path.extension().is_some_and(|ext| ext == "toml") {
                match load_encounter_file(&path) {
                    Ok(timeline) => self.insert(timeline)?,
                    Err(e) => tracing::warn!("skipping encounter file: {e}"),
                }
            }
        }

        Ok(())
    }

    /// Add one timeline; encounter ids are unique across the library.
    pub fn insert(&mut self, timeline: Timeline) -> Result<(), TimelineError> {
        if self.encounters.contains_key(&timeline.id) {
            return Err(TimelineError::DuplicateId { id: timeline.id });
        }
        self.order.push(timeline.id.clone());
        self.encounters.insert(timeline.id.clone(), timeline);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Timeline> {
        self.encounters.get(id)
    }

    /// All encounters in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Timeline> {
        self.order.iter().filter_map(|id| self.encounters.get(id))
    }

    pub fn len(&self) -> usize {
        self.encounters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encounters.is_empty()
    }
}

/// Load a single encounter file.
pub fn load_encounter_file(path: &Path) -> Result<Timeline, TimelineError> {
    let content = fs::read_to_string(path).map_err(|e| TimelineError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: EncounterConfig = toml::from_str(&content).map_err(|e| TimelineError::Parse {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    Ok(Timeline::from_config(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::DamageType;

    #[test]
    fn test_parse_encounter_config() {
        let toml = r#"
[encounter]
id = "test_fight"
name = "Test Fight"
duration_secs = 300.0

[[action]]
id = "buster_1"
name = "Heavy Swing"
time_secs = 12.0
damage = "physical"
tank_buster = true
raw_damage = 150000

[[action]]
id = "raidwide_1"
name = "Shockwave"
time_secs = 30.0
damage = "magical"
hit_count = 3
"#;

        let config: EncounterConfig = toml::from_str(toml).expect("Failed to parse TOML");
        let timeline = Timeline::from_config(config);

        assert_eq!(timeline.id, "test_fight");
        assert_eq!(timeline.len(), 2);

        let buster = timeline.action("buster_1").expect("buster missing");
        assert!(buster.tank_buster);
        assert_eq!(buster.damage, DamageType::Physical);
        assert_eq!(buster.raw_damage, Some(150000));
        assert_eq!(buster.hit_count, 1);

        let raidwide = timeline.action("raidwide_1").expect("raidwide missing");
        assert_eq!(raidwide.hit_count, 3);
    }

    #[test]
    fn test_actions_sorted_by_time() {
        let toml = r#"
[encounter]
id = "test_fight"
name = "Test Fight"
duration_secs = 100.0

[[action]]
id = "late"
name = "Late"
time_secs = 50.0

[[action]]
id = "early"
name = "Early"
time_secs = 10.0
"#;

        let config: EncounterConfig = toml::from_str(toml).expect("Failed to parse TOML");
        let timeline = Timeline::from_config(config);

        let ids: Vec<_> = timeline.actions().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[test]
    fn test_equal_timestamps_keep_file_order() {
        let toml = r#"
[encounter]
id = "test_fight"
name = "Test Fight"
duration_secs = 100.0

[[action]]
id = "first"
name = "First"
time_secs = 20.0

[[action]]
id = "second"
name = "Second"
time_secs = 20.0

[[action]]
id = "third"
name = "Third"
time_secs = 20.0
"#;

        let config: EncounterConfig = toml::from_str(toml).expect("Failed to parse TOML");
        let timeline = Timeline::from_config(config);

        let ids: Vec<_> = timeline.actions().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_bundled_encounter_parses() {
        let library = EncounterLibrary::bundled().expect("bundled encounter invalid");
        assert_eq!(library.len(), 1);
        let timeline = library.iter().next().expect("no encounter");
        assert!(!timeline.is_empty());
    }
}

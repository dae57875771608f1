//! Loaded game data
//!
//! Bundled catalog and encounters with user-supplied files layered on top.

use std::sync::Arc;

use crate::catalog::AbilityCatalog;
use crate::timeline::EncounterLibrary;

use super::config::AppConfig;
use super::error::LibraryError;

/// Ability catalog and encounter library, assembled once at startup
#[derive(Debug, Clone)]
pub struct Libraries {
    pub catalog: Arc<AbilityCatalog>,
    pub encounters: Arc<EncounterLibrary>,
}

impl Libraries {
    /// Bundled data plus whatever the configured directories add.
    pub fn load(config: &AppConfig) -> Result<Self, LibraryError> {
        let mut catalog = AbilityCatalog::bundled()?;
        if let Some(dir) = config.catalog_dir() {
            catalog.load_dir(&dir)?;
        }

        let mut encounters = EncounterLibrary::bundled()?;
        if let Some(dir) = config.encounter_dir() {
            encounters.load_dir(&dir)?;
        }

        tracing::info!(
            abilities = catalog.len(),
            encounters = encounters.len(),
            "game data loaded"
        );

        Ok(Self {
            catalog: Arc::new(catalog),
            encounters: Arc::new(encounters),
        })
    }
}

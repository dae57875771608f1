//! Encounter timelines
//!
//! Boss action sequences sorted by time, loaded from encounter TOML files.

mod definition;
mod loader;

pub use definition::{BossAction, DamageType, EncounterConfig, EncounterHeader};
pub use loader::{load_encounter_file, EncounterLibrary, Timeline, TimelineError};

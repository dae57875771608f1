//! Ability catalog
//!
//! Static game data consumed by the planner: job/role registry, ability
//! definitions with level-scaled properties, and the TOML loader.

mod definition;
mod jobs;
mod loader;

pub use definition::{
    AbilityDefinition, BarrierEffect, CatalogConfig, HealingEffect, LevelStep, Leveled,
    MitigationValue, PotencyBonus, PotencyStacking, RegenEffect, StackPoolConfig, TargetMode,
};
pub use jobs::{Job, Role};
pub use loader::{AbilityCatalog, CatalogError};

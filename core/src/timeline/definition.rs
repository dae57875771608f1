//! Encounter timeline types
//!
//! Deserialized from encounter TOML files: a header plus the ordered list of
//! timestamped boss actions the plan assigns mitigation against.

use serde::{Deserialize, Serialize};

/// Damage classification of a boss action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Physical,
    #[default]
    Magical,
    /// Deals both physical and magical damage
    Both,
    /// No unavoidable damage; resolved by movement, not mitigation
    Avoidable,
}

impl DamageType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Magical => "magical",
            Self::Both => "physical + magical",
            Self::Avoidable => "avoidable",
        }
    }
}

/// One timestamped damage event within an encounter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossAction {
    pub id: String,
    pub name: String,
    /// Seconds from pull
    pub time_secs: f32,
    #[serde(default)]
    pub damage: DamageType,
    /// Targets one tank rather than the party
    #[serde(default)]
    pub tank_buster: bool,
    /// Targets both tanks at once
    #[serde(default)]
    pub dual_buster: bool,
    /// Hits in the sequence (e.g. a three-hit raid-wide)
    #[serde(default = "crate::serde_defaults::default_hit_count")]
    pub hit_count: u8,
    /// Expected unmitigated damage per hit, when known
    #[serde(default)]
    pub raw_damage: Option<u32>,
}

impl BossAction {
    pub fn targets_tanks(&self) -> bool {
        self.tank_buster || self.dual_buster
    }
}

/// Header block of an encounter file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterHeader {
    pub id: String,
    pub name: String,
    pub duration_secs: f32,
}

/// Root shape of an encounter TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterConfig {
    pub encounter: EncounterHeader,
    #[serde(default, rename = "action")]
    pub actions: Vec<BossAction>,
}

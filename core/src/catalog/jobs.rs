//! Job and role registry
//!
//! Static game data: the playable combat jobs, their role groupings, and
//! abbreviation lookup. Catalog files and plan documents reference jobs by
//! abbreviation ("WAR", "SCH"); everything else in the engine works with
//! the typed enum.

use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Combat role groupings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Tank,
    Healer,
    Melee,
    PhysicalRanged,
    Caster,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tank => "Tank",
            Self::Healer => "Healer",
            Self::Melee => "Melee DPS",
            Self::PhysicalRanged => "Physical Ranged DPS",
            Self::Caster => "Magical Ranged DPS",
        }
    }
}

/// Playable combat jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Job {
    // ─── Tanks ──────────────────────────────────────────────────────────────
    #[serde(rename = "PLD")]
    Paladin,
    #[serde(rename = "WAR")]
    Warrior,
    #[serde(rename = "DRK")]
    DarkKnight,
    #[serde(rename = "GNB")]
    Gunbreaker,
    // ─── Healers ────────────────────────────────────────────────────────────
    #[serde(rename = "WHM")]
    WhiteMage,
    #[serde(rename = "SCH")]
    Scholar,
    #[serde(rename = "AST")]
    Astrologian,
    #[serde(rename = "SGE")]
    Sage,
    // ─── Melee ──────────────────────────────────────────────────────────────
    #[serde(rename = "MNK")]
    Monk,
    #[serde(rename = "DRG")]
    Dragoon,
    #[serde(rename = "NIN")]
    Ninja,
    #[serde(rename = "SAM")]
    Samurai,
    #[serde(rename = "RPR")]
    Reaper,
    #[serde(rename = "VPR")]
    Viper,
    // ─── Physical ranged ────────────────────────────────────────────────────
    #[serde(rename = "BRD")]
    Bard,
    #[serde(rename = "MCH")]
    Machinist,
    #[serde(rename = "DNC")]
    Dancer,
    // ─── Casters ────────────────────────────────────────────────────────────
    #[serde(rename = "BLM")]
    BlackMage,
    #[serde(rename = "SMN")]
    Summoner,
    #[serde(rename = "RDM")]
    RedMage,
    #[serde(rename = "PCT")]
    Pictomancer,
}

/// Abbreviation → job, for parsing user input and wire data
static JOBS_BY_ABBREV: phf::Map<&'static str, Job> = phf_map! {
    "PLD" => Job::Paladin,
    "WAR" => Job::Warrior,
    "DRK" => Job::DarkKnight,
    "GNB" => Job::Gunbreaker,
    "WHM" => Job::WhiteMage,
    "SCH" => Job::Scholar,
    "AST" => Job::Astrologian,
    "SGE" => Job::Sage,
    "MNK" => Job::Monk,
    "DRG" => Job::Dragoon,
    "NIN" => Job::Ninja,
    "SAM" => Job::Samurai,
    "RPR" => Job::Reaper,
    "VPR" => Job::Viper,
    "BRD" => Job::Bard,
    "MCH" => Job::Machinist,
    "DNC" => Job::Dancer,
    "BLM" => Job::BlackMage,
    "SMN" => Job::Summoner,
    "RDM" => Job::RedMage,
    "PCT" => Job::Pictomancer,
};

impl Job {
    pub const fn role(&self) -> Role {
        match self {
            Self::Paladin | Self::Warrior | Self::DarkKnight | Self::Gunbreaker => Role::Tank,
            Self::WhiteMage | Self::Scholar | Self::Astrologian | Self::Sage => Role::Healer,
            Self::Monk
            | Self::Dragoon
            | Self::Ninja
            | Self::Samurai
            | Self::Reaper
            | Self::Viper => Role::Melee,
            Self::Bard | Self::Machinist | Self::Dancer => Role::PhysicalRanged,
            Self::BlackMage | Self::Summoner | Self::RedMage | Self::Pictomancer => Role::Caster,
        }
    }

    pub const fn abbrev(&self) -> &'static str {
        match self {
            Self::Paladin => "PLD",
            Self::Warrior => "WAR",
            Self::DarkKnight => "DRK",
            Self::Gunbreaker => "GNB",
            Self::WhiteMage => "WHM",
            Self::Scholar => "SCH",
            Self::Astrologian => "AST",
            Self::Sage => "SGE",
            Self::Monk => "MNK",
            Self::Dragoon => "DRG",
            Self::Ninja => "NIN",
            Self::Samurai => "SAM",
            Self::Reaper => "RPR",
            Self::Viper => "VPR",
            Self::Bard => "BRD",
            Self::Machinist => "MCH",
            Self::Dancer => "DNC",
            Self::BlackMage => "BLM",
            Self::Summoner => "SMN",
            Self::RedMage => "RDM",
            Self::Pictomancer => "PCT",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Paladin => "Paladin",
            Self::Warrior => "Warrior",
            Self::DarkKnight => "Dark Knight",
            Self::Gunbreaker => "Gunbreaker",
            Self::WhiteMage => "White Mage",
            Self::Scholar => "Scholar",
            Self::Astrologian => "Astrologian",
            Self::Sage => "Sage",
            Self::Monk => "Monk",
            Self::Dragoon => "Dragoon",
            Self::Ninja => "Ninja",
            Self::Samurai => "Samurai",
            Self::Reaper => "Reaper",
            Self::Viper => "Viper",
            Self::Bard => "Bard",
            Self::Machinist => "Machinist",
            Self::Dancer => "Dancer",
            Self::BlackMage => "Black Mage",
            Self::Summoner => "Summoner",
            Self::RedMage => "Red Mage",
            Self::Pictomancer => "Pictomancer",
        }
    }

    /// Parse a job from its abbreviation (case-insensitive).
    pub fn from_abbrev(abbrev: &str) -> Option<Job> {
        JOBS_BY_ABBREV
            .get(abbrev.to_ascii_uppercase().as_str())
            .copied()
    }

    pub const fn is_tank(&self) -> bool {
        matches!(self.role(), Role::Tank)
    }

    pub const fn is_healer(&self) -> bool {
        matches!(self.role(), Role::Healer)
    }

    /// All jobs in role order
    pub fn all() -> &'static [Job] {
        &[
            Self::Paladin,
            Self::Warrior,
            Self::DarkKnight,
            Self::Gunbreaker,
            Self::WhiteMage,
            Self::Scholar,
            Self::Astrologian,
            Self::Sage,
            Self::Monk,
            Self::Dragoon,
            Self::Ninja,
            Self::Samurai,
            Self::Reaper,
            Self::Viper,
            Self::Bard,
            Self::Machinist,
            Self::Dancer,
            Self::BlackMage,
            Self::Summoner,
            Self::RedMage,
            Self::Pictomancer,
        ]
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

impl FromStr for Job {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_abbrev(s).ok_or_else(|| format!("unknown job '{s}'"))
    }
}

//! Shared plan document types for Rampart
//!
//! This crate contains the serializable shape of a collaborative mitigation
//! plan, shared between the planning engine (rampart-core) and any frontend.
//! Everything here is plain data; the availability and stacking logic lives
//! in the engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─────────────────────────────────────────────────────────────────────────────
// Tank Positions
// ─────────────────────────────────────────────────────────────────────────────

/// Which tank an assigned mitigation protects.
///
/// Party-wide abilities carry no position; self/single-target abilities
/// record one so dual tank busters can be planned per tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TankPosition {
    MainTank,
    OffTank,
    /// Covers both tanks (e.g. a stack buster both tanks share)
    Shared,
}

impl TankPosition {
    /// Returns a human-readable label for this position.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MainTank => "MT",
            Self::OffTank => "OT",
            Self::Shared => "MT+OT",
        }
    }

    /// Check whether an effect recorded at this position covers `filter`.
    /// `Shared` covers either tank.
    pub fn covers(&self, filter: TankPosition) -> bool {
        *self == filter || matches!(self, Self::Shared)
    }
}

/// Which job fills each tank slot (job abbreviations, e.g. "WAR").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TankPositions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_tank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off_tank: Option<String>,
}

impl TankPositions {
    /// Position held by `job`, if it is slotted as a tank.
    pub fn position_of(&self, job: &str) -> Option<TankPosition> {
        if self.main_tank.as_deref() == Some(job) {
            return Some(TankPosition::MainTank);
        }
        if self.off_tank.as_deref() == Some(job) {
            return Some(TankPosition::OffTank);
        }
        None
    }

    /// Job holding `position` (`Shared` has no single job).
    pub fn job_at(&self, position: TankPosition) -> Option<&str> {
        match position {
            TankPosition::MainTank => self.main_tank.as_deref(),
            TankPosition::OffTank => self.off_tank.as_deref(),
            TankPosition::Shared => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Assignments
// ─────────────────────────────────────────────────────────────────────────────

/// One mitigation ability placed on one boss action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedMitigation {
    /// Catalog id of the assigned ability (e.g. "reprisal")
    pub ability_id: String,

    /// Tank the effect protects (None for party/area abilities)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<TankPosition>,

    /// Seconds the cast happens before the boss action, clamped by the
    /// engine to [0, ability duration]. The only field edited in place.
    #[serde(default)]
    pub precast_secs: f32,

    /// Job abbreviation of the caster (disambiguates role-shared abilities)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caster_job: Option<String>,

    /// Display id of the user who claimed the casting job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caster: Option<String>,

    // ─── Write metadata ─────────────────────────────────────────────────────
    /// Session that wrote this row
    #[serde(default)]
    pub written_by: String,

    /// Write time, epoch milliseconds
    #[serde(default)]
    pub written_at: i64,
}

impl AssignedMitigation {
    /// Two rows conflict when they carry the same ability at the same
    /// position on one action.
    pub fn conflicts_with(&self, ability_id: &str, position: Option<TankPosition>) -> bool {
        self.ability_id == ability_id && self.position == position
    }
}

/// Boss action id → assigned mitigations, in assignment order.
///
/// Invariant (enforced by the engine's assignment store): no two entries
/// for the same (ability id, position) pair under one action.
pub type AssignmentMap = BTreeMap<String, Vec<AssignedMitigation>>;

// ─────────────────────────────────────────────────────────────────────────────
// Job Selection
// ─────────────────────────────────────────────────────────────────────────────

/// One selected party job, optionally claimed by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSelection {
    /// Job abbreviation (e.g. "WAR", "SCH")
    pub job: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<String>,
}

/// Wire shapes historically written for a selected job.
///
/// Older documents stored a bare array of job strings; newer ones store
/// objects. Both deserialize; [`SelectedJobs`] normalizes at the boundary
/// so nothing downstream ever sniffs the shape again.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawJobSelection {
    Abbrev(String),
    Tagged(JobSelection),
}

/// The party composition, in selection order.
///
/// Serializes as an array of [`JobSelection`] objects; deserializes from
/// either legacy shape via [`RawJobSelection`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<RawJobSelection>")]
pub struct SelectedJobs(pub Vec<JobSelection>);

impl From<Vec<RawJobSelection>> for SelectedJobs {
    fn from(raw: Vec<RawJobSelection>) -> Self {
        Self(
            raw.into_iter()
                .map(|entry| match entry {
                    RawJobSelection::Abbrev(job) => JobSelection {
                        job,
                        claimed_by: None,
                    },
                    RawJobSelection::Tagged(selection) => selection,
                })
                .collect(),
        )
    }
}

impl SelectedJobs {
    pub fn jobs(&self) -> &[JobSelection] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, job: &str) -> bool {
        self.0.iter().any(|s| s.job == job)
    }

    /// User who claimed `job`, if anyone.
    pub fn claimed_by(&self, job: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|s| s.job == job)
            .and_then(|s| s.claimed_by.as_deref())
    }

    /// Set or clear the claim on `job`. Returns false if the job is not
    /// part of the selection.
    pub fn set_claim(&mut self, job: &str, user: Option<String>) -> bool {
        match self.0.iter_mut().find(|s| s.job == job) {
            Some(selection) => {
                selection.claimed_by = user;
                true
            }
            None => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Health Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Encounter-level numbers used by barrier and healing math.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthSettings {
    /// Party level; drives leveled cooldown/duration/value lookups
    #[serde(default = "default_level")]
    pub level: u8,
    /// Max HP of a non-tank party member
    #[serde(default = "default_party_max_hp")]
    pub party_max_hp: u32,
    /// Max HP of a tank
    #[serde(default = "default_tank_max_hp")]
    pub tank_max_hp: u32,
    /// HP restored per 100 points of healing potency
    #[serde(default = "default_healing_per_100")]
    pub healing_per_100_potency: f32,
}

fn default_level() -> u8 {
    100
}
fn default_party_max_hp() -> u32 {
    80_000
}
fn default_tank_max_hp() -> u32 {
    105_000
}
fn default_healing_per_100() -> f32 {
    6_000.0
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            party_max_hp: default_party_max_hp(),
            tank_max_hp: default_tank_max_hp(),
            healing_per_100_potency: default_healing_per_100(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Claims & Presence
// ─────────────────────────────────────────────────────────────────────────────

/// Job abbreviation → display id of the user who claimed it.
pub type JobClaims = BTreeMap<String, String>;

/// Presence-like signal: which boss action a session is looking at.
/// Persisted immediately (no debounce) and never rolled back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presence {
    /// Session id of the viewer
    pub session: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_action: Option<String>,
    /// Last update, epoch milliseconds
    #[serde(default)]
    pub updated_at: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Plan Document
// ─────────────────────────────────────────────────────────────────────────────

/// The full persisted shape of one plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanDocument {
    /// Encounter the plan targets
    #[serde(default)]
    pub boss_id: String,
    #[serde(default)]
    pub selected_jobs: SelectedJobs,
    #[serde(default)]
    pub assignments: AssignmentMap,
    #[serde(default)]
    pub tank_positions: TankPositions,
    #[serde(default)]
    pub health_settings: HealthSettings,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub job_claims: JobClaims,
    /// Presence of each connected session, keyed by session id.
    /// A sibling of the plan fields, subscribed independently.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub presence: BTreeMap<String, Presence>,
}

impl PlanDocument {
    /// Apply one field update in place (last write wins).
    pub fn apply(&mut self, value: &FieldValue) {
        match value {
            FieldValue::BossId { id } => self.boss_id = id.clone(),
            FieldValue::SelectedJobs { jobs } => self.selected_jobs = SelectedJobs(jobs.clone()),
            FieldValue::Assignments { assignments } => self.assignments = assignments.clone(),
            FieldValue::TankPositions { positions } => self.tank_positions = positions.clone(),
            FieldValue::HealthSettings { settings } => self.health_settings = *settings,
            FieldValue::JobClaims { claims } => self.job_claims = claims.clone(),
            FieldValue::Presence { presence } => {
                self.presence
                    .insert(presence.session.clone(), presence.clone());
            }
        }
    }

    /// Current value of `field`, if it has a whole-document representation.
    /// Presence is per-session and returns None.
    pub fn get(&self, field: DocumentField) -> Option<FieldValue> {
        match field {
            DocumentField::BossId => Some(FieldValue::BossId {
                id: self.boss_id.clone(),
            }),
            DocumentField::SelectedJobs => Some(FieldValue::SelectedJobs {
                jobs: self.selected_jobs.0.clone(),
            }),
            DocumentField::Assignments => Some(FieldValue::Assignments {
                assignments: self.assignments.clone(),
            }),
            DocumentField::TankPositions => Some(FieldValue::TankPositions {
                positions: self.tank_positions.clone(),
            }),
            DocumentField::HealthSettings => Some(FieldValue::HealthSettings {
                settings: self.health_settings,
            }),
            DocumentField::JobClaims => Some(FieldValue::JobClaims {
                claims: self.job_claims.clone(),
            }),
            DocumentField::Presence => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Document Fields
// ─────────────────────────────────────────────────────────────────────────────

/// The independently-debounced fields of a plan document.
///
/// Each field has its own persist schedule so one slow field never blocks
/// the others, and its own rollback snapshot in the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentField {
    BossId,
    SelectedJobs,
    Assignments,
    TankPositions,
    HealthSettings,
    JobClaims,
    Presence,
}

impl DocumentField {
    /// Stable string key used by document stores.
    pub fn key(&self) -> &'static str {
        match self {
            Self::BossId => "boss_id",
            Self::SelectedJobs => "selected_jobs",
            Self::Assignments => "assignments",
            Self::TankPositions => "tank_positions",
            Self::HealthSettings => "health_settings",
            Self::JobClaims => "job_claims",
            Self::Presence => "presence",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|f| f.key() == key)
    }

    /// Persist debounce in milliseconds. Presence is immediate; structural
    /// edits are short; batched low-priority fields wait longer.
    pub fn persist_delay_ms(&self) -> u64 {
        match self {
            Self::Presence => 0,
            Self::BossId | Self::SelectedJobs | Self::Assignments | Self::TankPositions => 200,
            Self::HealthSettings | Self::JobClaims => 400,
        }
    }

    pub fn all() -> &'static [DocumentField] {
        &[
            Self::BossId,
            Self::SelectedJobs,
            Self::Assignments,
            Self::TankPositions,
            Self::HealthSettings,
            Self::JobClaims,
            Self::Presence,
        ]
    }
}

/// A typed field value, as written to and broadcast by document stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum FieldValue {
    BossId { id: String },
    SelectedJobs { jobs: Vec<JobSelection> },
    Assignments { assignments: AssignmentMap },
    TankPositions { positions: TankPositions },
    HealthSettings { settings: HealthSettings },
    JobClaims { claims: JobClaims },
    Presence { presence: Presence },
}

impl FieldValue {
    /// The field this value belongs to.
    pub fn field(&self) -> DocumentField {
        match self {
            Self::BossId { .. } => DocumentField::BossId,
            Self::SelectedJobs { .. } => DocumentField::SelectedJobs,
            Self::Assignments { .. } => DocumentField::Assignments,
            Self::TankPositions { .. } => DocumentField::TankPositions,
            Self::HealthSettings { .. } => DocumentField::HealthSettings,
            Self::JobClaims { .. } => DocumentField::JobClaims,
            Self::Presence { .. } => DocumentField::Presence,
        }
    }
}

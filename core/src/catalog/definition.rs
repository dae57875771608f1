//! Ability definition types
//!
//! Deserialized from the catalog TOML files. Numeric properties that scale
//! with encounter level (cooldown, duration, charges, reduction value) are
//! expressed as either a flat value or a table of level steps; lookups pick
//! the highest step at or below the queried level.

use super::jobs::Job;
use crate::timeline::DamageType;
use serde::{Deserialize, Serialize};

/// One step of a level-scaled value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelStep<T> {
    pub level: u8,
    pub value: T,
}

/// A value that may scale with encounter level.
///
/// Accepts either a bare value (`cooldown = 90.0`) or a list of steps
/// (`charges = [{ level = 66, value = 1 }, { level = 88, value = 2 }]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Leveled<T> {
    Flat(T),
    Steps(Vec<LevelStep<T>>),
}

impl<T> Default for Leveled<T> {
    fn default() -> Self {
        Self::Steps(Vec::new())
    }
}

impl<T: Copy> Leveled<T> {
    /// Value at the given level, from the highest step at or below it.
    /// `None` when no step applies (or the table is empty).
    pub fn value_at(&self, level: u8) -> Option<T> {
        match self {
            Self::Flat(value) => Some(*value),
            Self::Steps(steps) => steps
                .iter()
                .filter(|step| step.level <= level)
                .max_by_key(|step| step.level)
                .map(|step| step.value),
        }
    }
}

/// Who an ability lands on when cast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMode {
    #[serde(rename = "self")]
    SelfTarget,
    Single,
    Party,
    Area,
}

impl TargetMode {
    /// Party and ground-area effects cover every tank position; self and
    /// single-target effects only cover whoever they were assigned to.
    pub fn is_party_wide(&self) -> bool {
        matches!(self, Self::Party | Self::Area)
    }
}

/// Damage-reduction value, either uniform or split by damage kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MitigationValue {
    Uniform(f32),
    Split { physical: f32, magical: f32 },
}

impl MitigationValue {
    /// Reduction fraction applied against the given damage type. A split
    /// value against dual-typed damage reports its stronger component.
    pub fn for_damage(&self, damage: DamageType) -> f32 {
        match self {
            Self::Uniform(value) => *value,
            Self::Split { physical, magical } => match damage {
                DamageType::Physical => *physical,
                DamageType::Magical => *magical,
                DamageType::Both | DamageType::Avoidable => physical.max(*magical),
            },
        }
    }

    pub fn reduces_damage(&self) -> bool {
        match self {
            Self::Uniform(value) => *value > 0.0,
            Self::Split { physical, magical } => *physical > 0.0 || *magical > 0.0,
        }
    }
}

/// Shield granted on cast, sized from max HP, cure potency, or both
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BarrierEffect {
    /// Shield as a fraction of the target's max HP
    #[serde(default)]
    pub max_hp_percent: Option<f32>,
    /// Shield sized like a heal of this cure potency
    #[serde(default)]
    pub potency: Option<f32>,
}

/// Regen component of a healing effect, ticking every few seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegenEffect {
    /// Cure potency per tick
    pub potency: f32,
    pub duration_secs: f32,
}

/// Healing granted on cast
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HealingEffect {
    /// Instant cure potency
    #[serde(default)]
    pub potency: Option<f32>,
    #[serde(default)]
    pub regen: Option<RegenEffect>,
    /// Fractional max-HP increase while the effect lasts
    #[serde(default)]
    pub max_hp_increase: Option<f32>,
}

impl HealingEffect {
    pub fn has_instant_component(&self) -> bool {
        self.potency.is_some() || self.max_hp_increase.is_some()
    }
}

/// How a potency bonus combines with other bonuses on the same caster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PotencyStacking {
    #[default]
    Additive,
    Multiplicative,
}

/// Buff to the healing potency of the caster's other abilities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PotencyBonus {
    /// Fractional bonus, e.g. 0.2 for +20%
    pub value: f32,
    #[serde(default)]
    pub stacking: PotencyStacking,
}

/// Shared consumable resource pool (e.g. healer aether stacks)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackPoolConfig {
    #[serde(default = "crate::serde_defaults::default_stack_capacity")]
    pub capacity: u8,
    /// Seconds after the last refill before the pool passively returns to full
    pub refill_secs: f32,
}

/// A defensive ability as loaded from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    pub id: String,
    pub name: String,
    /// Minimum level required to cast
    #[serde(default = "crate::serde_defaults::default_level_one")]
    pub level: u8,
    /// Jobs that can cast this ability
    pub jobs: Vec<Job>,
    pub target: TargetMode,
    #[serde(default)]
    pub cooldown: Leveled<f32>,
    #[serde(default)]
    pub duration: Leveled<f32>,
    /// Independent uses held at once; absent means one
    #[serde(default)]
    pub charges: Leveled<u8>,
    /// Damage-reduction value while active
    #[serde(default)]
    pub mitigation: Option<Leveled<MitigationValue>>,
    #[serde(default)]
    pub barrier: Option<BarrierEffect>,
    #[serde(default)]
    pub healing: Option<HealingEffect>,
    /// Bonus this ability grants to the caster's subsequent heals
    #[serde(default)]
    pub potency_bonus: Option<PotencyBonus>,
    /// Spends one stack of the shared resource pool per cast
    #[serde(default)]
    pub consumes_stacks: bool,
    /// Resets the shared resource pool to full on cast
    #[serde(default)]
    pub restores_stacks: bool,
    /// Cooldown tracked per capable selected job rather than globally
    #[serde(default)]
    pub role_shared: bool,
}

impl AbilityDefinition {
    pub fn cooldown_at(&self, level: u8) -> f32 {
        self.cooldown.value_at(level).unwrap_or(0.0)
    }

    pub fn duration_at(&self, level: u8) -> f32 {
        self.duration.value_at(level).unwrap_or(0.0)
    }

    pub fn charges_at(&self, level: u8) -> u8 {
        self.charges.value_at(level).unwrap_or(1).max(1)
    }

    pub fn mitigation_at(&self, level: u8) -> Option<MitigationValue> {
        self.mitigation.as_ref().and_then(|table| table.value_at(level))
    }

    /// Whether this ability reduces damage at all at the given level.
    pub fn has_mitigation(&self, level: u8) -> bool {
        self.mitigation_at(level)
            .is_some_and(|value| value.reduces_damage())
    }

    pub fn can_cast(&self, job: Job) -> bool {
        self.jobs.contains(&job)
    }

    pub fn castable_at(&self, level: u8) -> bool {
        level >= self.level
    }

    pub fn touches_stack_pool(&self) -> bool {
        self.consumes_stacks || self.restores_stacks
    }

    /// Whether the effect resolves once at its own action instead of
    /// persisting as a buff that later actions inherit.
    ///
    /// Anything that reduces damage keeps its reduction window regardless of
    /// attached heals or shields. Past that, barriers and instant heals spend
    /// themselves on cast, as does a regen with no potency buff attached:
    /// its healing lands over time but is not re-appliable to a later hit.
    pub fn is_one_shot(&self, level: u8) -> bool {
        if self.has_mitigation(level) {
            return false;
        }
        let barrier = self.barrier.is_some();
        let healing = self.healing.is_some();
        let instant = self
            .healing
            .as_ref()
            .is_some_and(HealingEffect::has_instant_component);
        let regen = self.healing.as_ref().is_some_and(|h| h.regen.is_some());

        (barrier && !regen)
            || (instant && !regen)
            || (barrier && healing)
            || (regen && self.potency_bonus.is_none())
    }
}

/// Root shape of a catalog TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Shared resource pool the consumer/provider flags refer to
    #[serde(default)]
    pub stack_pool: Option<StackPoolConfig>,
    #[serde(default, rename = "ability")]
    pub abilities: Vec<AbilityDefinition>,
}

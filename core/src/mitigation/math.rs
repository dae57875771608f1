//! Stacking math
//!
//! Stateless composition of damage reduction, barriers, and healing over a
//! set of active effects. Reductions stack multiplicatively on the
//! surviving fraction; healing potency bonuses compose per caster job.

use hashbrown::HashMap;

use super::active::ActiveMitigation;
use crate::catalog::{BarrierEffect, Job, PotencyStacking};
use crate::timeline::DamageType;

/// Regen effects tick on this cadence
pub const TICK_INTERVAL_SECS: f32 = 3.0;

/// Fraction of incoming damage removed by the stacked effects.
///
/// Each reduction multiplies the surviving fraction: 10% and 20% together
/// remove 28%, not 30%, and no stack ever reaches 100%.
pub fn total_mitigation(effects: &[ActiveMitigation], damage: DamageType) -> f32 {
    let mut survival = 1.0_f32;
    for effect in effects {
        if let Some(value) = effect.mitigation {
            survival *= 1.0 - value.for_damage(damage);
        }
    }
    1.0 - survival
}

/// Absolute shield size from one barrier effect. The max-HP and potency
/// components add when both are present.
pub fn barrier_amount(barrier: &BarrierEffect, max_hp: f32, potency_per_100: f32) -> f32 {
    let mut amount = 0.0;
    if let Some(percent) = barrier.max_hp_percent {
        amount += max_hp * percent;
    }
    if let Some(potency) = barrier.potency {
        amount += (potency / 100.0) * potency_per_100;
    }
    amount
}

/// Total shielding from every barrier in the set.
pub fn total_barrier(effects: &[ActiveMitigation], max_hp: f32, potency_per_100: f32) -> f32 {
    effects
        .iter()
        .filter_map(|effect| effect.barrier.as_ref())
        .map(|barrier| barrier_amount(barrier, max_hp, potency_per_100))
        .sum()
}

/// Total healing from the set: instant cures, max-HP boosts, and regens
/// (per-tick potency times the full ticks that fit the regen's duration).
///
/// Potency bonuses in the set scale heals cast by the SAME job that carries
/// the bonus: additive bonuses sum, multiplicative ones compose, and the
/// two groups multiply together.
pub fn healing_amount(effects: &[ActiveMitigation], potency_per_100: f32, max_hp: f32) -> f32 {
    let mut additive: HashMap<Job, f32> = HashMap::new();
    let mut multiplicative: HashMap<Job, f32> = HashMap::new();
    for effect in effects {
        let (Some(bonus), Some(job)) = (effect.potency_bonus, effect.caster_job) else {
            continue;
        };
        match bonus.stacking {
            PotencyStacking::Additive => *additive.entry(job).or_insert(0.0) += bonus.value,
            PotencyStacking::Multiplicative => {
                *multiplicative.entry(job).or_insert(1.0) *= 1.0 + bonus.value;
            }
        }
    }

    let modifier_for = |job: Option<Job>| -> f32 {
        let Some(job) = job else {
            return 1.0;
        };
        let add = additive.get(&job).copied().unwrap_or(0.0);
        let mult = multiplicative.get(&job).copied().unwrap_or(1.0);
        (1.0 + add) * mult
    };

    let mut total = 0.0;
    for effect in effects {
        let Some(healing) = effect.healing else {
            continue;
        };
        let modifier = modifier_for(effect.caster_job);
        if let Some(potency) = healing.potency {
            total += (potency * modifier / 100.0) * potency_per_100;
        }
        if let Some(increase) = healing.max_hp_increase {
            total += max_hp * increase;
        }
        if let Some(regen) = healing.regen {
            let ticks = (regen.duration_secs / TICK_INTERVAL_SECS).floor();
            total += (regen.potency * modifier / 100.0) * potency_per_100 * ticks;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{HealingEffect, MitigationValue, PotencyBonus, RegenEffect};
    use rampart_types::TankPosition;

    fn effect(ability_id: &str) -> ActiveMitigation {
        ActiveMitigation {
            ability_id: ability_id.to_string(),
            ability_name: ability_id.to_string(),
            source_action: "source".to_string(),
            caster_job: None,
            position: None,
            effective_start: 0.0,
            effective_end: 15.0,
            remaining_secs: 10.0,
            mitigation: None,
            barrier: None,
            healing: None,
            potency_bonus: None,
        }
    }

    fn reduction(ability_id: &str, value: MitigationValue) -> ActiveMitigation {
        let mut e = effect(ability_id);
        e.mitigation = Some(value);
        e
    }

    #[test]
    fn test_reductions_multiply_survival_fractions() {
        let effects = [
            reduction("a", MitigationValue::Uniform(0.10)),
            reduction("b", MitigationValue::Uniform(0.20)),
        ];
        let total = total_mitigation(&effects, DamageType::Physical);
        // 1 - (0.9 * 0.8), not 0.30
        assert!((total - 0.28).abs() < 1e-6, "got {total}");
    }

    #[test]
    fn test_split_values_pick_the_matching_component() {
        let effects = [reduction(
            "feint",
            MitigationValue::Split {
                physical: 0.10,
                magical: 0.05,
            },
        )];
        assert!((total_mitigation(&effects, DamageType::Physical) - 0.10).abs() < 1e-6);
        assert!((total_mitigation(&effects, DamageType::Magical) - 0.05).abs() < 1e-6);
        assert!((total_mitigation(&effects, DamageType::Both) - 0.10).abs() < 1e-6);
    }

    #[test]
    fn test_effects_without_reduction_do_not_change_the_total() {
        let mut barrier_only = effect("shield");
        barrier_only.barrier = Some(BarrierEffect {
            max_hp_percent: Some(0.25),
            potency: None,
        });
        let effects = [
            barrier_only,
            reduction("a", MitigationValue::Uniform(0.10)),
        ];
        assert!((total_mitigation(&effects, DamageType::Magical) - 0.10).abs() < 1e-6);
    }

    #[test]
    fn test_position_does_not_affect_stacking() {
        let mut positioned = reduction("a", MitigationValue::Uniform(0.10));
        positioned.position = Some(TankPosition::MainTank);
        let total = total_mitigation(&[positioned], DamageType::Physical);
        assert!((total - 0.10).abs() < 1e-6);
    }

    #[test]
    fn test_barrier_components_add_within_one_ability() {
        let barrier = BarrierEffect {
            max_hp_percent: Some(0.10),
            potency: Some(320.0),
        };
        // 80_000 * 0.10 + (320 / 100) * 6_000
        let amount = barrier_amount(&barrier, 80_000.0, 6_000.0);
        assert!((amount - 27_200.0).abs() < 0.5, "got {amount}");
    }

    #[test]
    fn test_total_barrier_sums_across_effects() {
        let mut a = effect("a");
        a.barrier = Some(BarrierEffect {
            max_hp_percent: Some(0.10),
            potency: None,
        });
        let mut b = effect("b");
        b.barrier = Some(BarrierEffect {
            max_hp_percent: None,
            potency: Some(500.0),
        });
        let total = total_barrier(&[a, b], 100_000.0, 6_000.0);
        assert!((total - 40_000.0).abs() < 0.5, "got {total}");
    }

    #[test]
    fn test_instant_heal_scales_with_potency_per_100() {
        let mut heal = effect("cure");
        heal.healing = Some(HealingEffect {
            potency: Some(600.0),
            regen: None,
            max_hp_increase: None,
        });
        let total = healing_amount(&[heal], 6_000.0, 80_000.0);
        assert!((total - 36_000.0).abs() < 0.5, "got {total}");
    }

    #[test]
    fn test_regen_ticks_floor_over_duration() {
        let mut regen = effect("soil");
        regen.healing = Some(HealingEffect {
            potency: None,
            regen: Some(RegenEffect {
                potency: 100.0,
                duration_secs: 14.0,
            }),
            max_hp_increase: None,
        });
        // floor(14 / 3) = 4 ticks
        let total = healing_amount(&[regen], 6_000.0, 80_000.0);
        assert!((total - 24_000.0).abs() < 0.5, "got {total}");
    }

    #[test]
    fn test_max_hp_increase_adds_flat_amount() {
        let mut boost = effect("protract");
        boost.healing = Some(HealingEffect {
            potency: None,
            regen: None,
            max_hp_increase: Some(0.10),
        });
        let total = healing_amount(&[boost], 6_000.0, 105_000.0);
        assert!((total - 10_500.0).abs() < 0.5, "got {total}");
    }

    #[test]
    fn test_potency_bonus_scopes_to_its_caster_job() {
        let mut buff = effect("window");
        buff.caster_job = Some(Job::WhiteMage);
        buff.potency_bonus = Some(PotencyBonus {
            value: 0.20,
            stacking: PotencyStacking::Multiplicative,
        });

        let mut own_heal = effect("cure");
        own_heal.caster_job = Some(Job::WhiteMage);
        own_heal.healing = Some(HealingEffect {
            potency: Some(100.0),
            regen: None,
            max_hp_increase: None,
        });

        let mut other_heal = effect("succor");
        other_heal.caster_job = Some(Job::Scholar);
        other_heal.healing = Some(HealingEffect {
            potency: Some(100.0),
            regen: None,
            max_hp_increase: None,
        });

        // WHM heal boosted to 120 potency, SCH heal untouched
        let total = healing_amount(&[buff, own_heal, other_heal], 6_000.0, 80_000.0);
        assert!((total - (7_200.0 + 6_000.0)).abs() < 0.5, "got {total}");
    }

    #[test]
    fn test_additive_bonuses_sum_then_multiply_with_multiplicative() {
        let mut add_a = effect("add_a");
        add_a.caster_job = Some(Job::Scholar);
        add_a.potency_bonus = Some(PotencyBonus {
            value: 0.10,
            stacking: PotencyStacking::Additive,
        });
        let mut add_b = effect("add_b");
        add_b.caster_job = Some(Job::Scholar);
        add_b.potency_bonus = Some(PotencyBonus {
            value: 0.10,
            stacking: PotencyStacking::Additive,
        });
        let mut mult = effect("mult");
        mult.caster_job = Some(Job::Scholar);
        mult.potency_bonus = Some(PotencyBonus {
            value: 0.20,
            stacking: PotencyStacking::Multiplicative,
        });

        let mut heal = effect("cure");
        heal.caster_job = Some(Job::Scholar);
        heal.healing = Some(HealingEffect {
            potency: Some(100.0),
            regen: None,
            max_hp_increase: None,
        });

        // (1 + 0.1 + 0.1) * 1.2 = 1.44 → 144 potency → 8_640
        let total = healing_amount(&[add_a, add_b, mult, heal], 6_000.0, 80_000.0);
        assert!((total - 8_640.0).abs() < 0.5, "got {total}");
    }
}

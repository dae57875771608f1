//! Active effect resolution
//!
//! Which effects cover a boss action: the rows assigned to the action
//! itself, plus duration buffs from other actions whose window reaches it.
//! One-shot effects (barriers, instant heals, plain regens) resolve at
//! their own action and are never inherited forward.

use rampart_types::{AssignedMitigation, AssignmentMap, TankPosition};

use crate::catalog::{
    AbilityCatalog, AbilityDefinition, BarrierEffect, HealingEffect, Job, MitigationValue,
    PotencyBonus,
};
use crate::timeline::Timeline;

/// One effect covering a point on the timeline, with its ability's
/// level-resolved values pulled out for the math
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveMitigation {
    pub ability_id: String,
    pub ability_name: String,
    /// Action the effect was assigned to
    pub source_action: String,
    pub caster_job: Option<Job>,
    pub position: Option<TankPosition>,
    pub effective_start: f32,
    pub effective_end: f32,
    /// Window left when the covered action hits
    pub remaining_secs: f32,
    pub mitigation: Option<MitigationValue>,
    pub barrier: Option<BarrierEffect>,
    pub healing: Option<HealingEffect>,
    pub potency_bonus: Option<PotencyBonus>,
}

/// Read-only view over the plan that effect queries run against
pub struct ActiveEffectResolver<'a> {
    catalog: &'a AbilityCatalog,
    timeline: &'a Timeline,
    assignments: &'a AssignmentMap,
    level: u8,
}

impl<'a> ActiveEffectResolver<'a> {
    pub fn new(
        catalog: &'a AbilityCatalog,
        timeline: &'a Timeline,
        assignments: &'a AssignmentMap,
        level: u8,
    ) -> Self {
        Self {
            catalog,
            timeline,
            assignments,
            level,
        }
    }

    /// Duration buffs from OTHER actions whose window covers the target
    /// action, sorted by window start.
    ///
    /// With a tank-position filter, party and ground-area effects always
    /// pass; self and single-target effects pass only when their recorded
    /// position covers the filtered one. Precast shifts a window earlier,
    /// so an effect assigned to a later action can cover this one.
    pub fn active_at(
        &self,
        target_action_id: &str,
        tank_filter: Option<TankPosition>,
    ) -> Vec<ActiveMitigation> {
        let Some(target_time) = self.timeline.action_time(target_action_id) else {
            return Vec::new();
        };

        let mut active = Vec::new();
        for (action_id, rows) in self.assignments {
            if action_id.as_str() == target_action_id {
                continue;
            }
            let Some(source_time) = self.timeline.action_time(action_id) else {
                continue;
            };
            for row in rows {
                let Some(ability) = self.catalog.get(&row.ability_id) else {
                    continue;
                };
                if ability.is_one_shot(self.level) {
                    continue;
                }
                let effect = materialize(row, ability, action_id, source_time, target_time, self.level);
                if effect.effective_start > target_time || effect.effective_end <= target_time {
                    continue;
                }
                if let Some(filter) = tank_filter {
                    if !covers_position(ability, row, filter) {
                        continue;
                    }
                }
                active.push(effect);
            }
        }

        active.sort_by(|a, b| {
            a.effective_start
                .total_cmp(&b.effective_start)
                .then_with(|| a.ability_id.cmp(&b.ability_id))
        });
        active
    }

    /// The full set covering an action: its own rows plus inherited
    /// windows, sorted by window start.
    pub fn effects_at(
        &self,
        action_id: &str,
        tank_filter: Option<TankPosition>,
    ) -> Vec<ActiveMitigation> {
        let mut effects = self.assigned_at(action_id);
        if let Some(filter) = tank_filter {
            effects.retain(|effect| {
                let Some(ability) = self.catalog.get(&effect.ability_id) else {
                    return true;
                };
                ability.target.is_party_wide()
                    || effect.position.is_some_and(|position| position.covers(filter))
            });
        }
        effects.extend(self.active_at(action_id, tank_filter));
        effects.sort_by(|a, b| {
            a.effective_start
                .total_cmp(&b.effective_start)
                .then_with(|| a.ability_id.cmp(&b.ability_id))
        });
        effects
    }

    /// Every effect assigned to the action itself, one-shots included.
    pub fn assigned_at(&self, action_id: &str) -> Vec<ActiveMitigation> {
        let Some(time) = self.timeline.action_time(action_id) else {
            return Vec::new();
        };

        let rows = match self.assignments.get(action_id) {
            Some(rows) => rows.as_slice(),
            None => return Vec::new(),
        };

        rows.iter()
            .filter_map(|row| {
                let ability = self.catalog.get(&row.ability_id)?;
                Some(materialize(row, ability, action_id, time, time, self.level))
            })
            .collect()
    }
}

/// Whether an effect assigned with `row`'s position protects the filtered
/// tank.
fn covers_position(ability: &AbilityDefinition, row: &AssignedMitigation, filter: TankPosition) -> bool {
    if ability.target.is_party_wide() {
        return true;
    }
    row.position.is_some_and(|position| position.covers(filter))
}

fn materialize(
    row: &AssignedMitigation,
    ability: &AbilityDefinition,
    source_action: &str,
    source_time: f32,
    target_time: f32,
    level: u8,
) -> ActiveMitigation {
    let effective_start = (source_time - row.precast_secs).max(0.0);
    let effective_end = effective_start + ability.duration_at(level);
    ActiveMitigation {
        ability_id: ability.id.clone(),
        ability_name: ability.name.clone(),
        source_action: source_action.to_string(),
        caster_job: row.caster_job.as_deref().and_then(Job::from_abbrev),
        position: row.position,
        effective_start,
        effective_end,
        remaining_secs: effective_end - target_time,
        mitigation: ability.mitigation_at(level),
        barrier: ability.barrier,
        healing: ability.healing,
        potency_bonus: ability.potency_bonus,
    }
}

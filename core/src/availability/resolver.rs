//! Availability resolution
//!
//! Answers "can this ability be assigned to this boss action" by replaying
//! every prior use recorded in the plan. Charge, instance, and stack
//! accounting live in their own trackers; this module collects the uses,
//! runs the trackers, and folds the verdicts into one result.

use rampart_types::{AssignmentMap, SelectedJobs};

use super::charges::available_charges;
use super::instances::{available_instances, free_casters};
use super::stacks::{sort_stack_events, stacks_at, StackCache, StackEvent, StackEventKind};
use crate::catalog::{AbilityCatalog, AbilityDefinition, Job, StackPoolConfig};
use crate::timeline::Timeline;

/// Cooldown, charge, instance, and resource state for one ability at one
/// point on the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityResult {
    /// No free use at the query time
    pub on_cooldown: bool,
    pub charges_available: u8,
    pub charges_total: u8,
    /// (available, total) caster slots, for role-shared abilities
    pub instances: Option<(u8, u8)>,
    /// Stacks left in the shared resource pool, for consumer abilities
    pub stacks_available: Option<u8>,
    /// Why the ability cannot be assigned, when it cannot
    pub reason: Option<String>,
}

impl AvailabilityResult {
    pub fn can_assign(&self) -> bool {
        self.reason.is_none()
    }
}

/// Read-only view over the plan that availability checks run against
pub struct AvailabilityResolver<'a> {
    catalog: &'a AbilityCatalog,
    timeline: &'a Timeline,
    assignments: &'a AssignmentMap,
    selected_jobs: &'a SelectedJobs,
    level: u8,
    stack_cache: &'a StackCache,
}

impl<'a> AvailabilityResolver<'a> {
    pub fn new(
        catalog: &'a AbilityCatalog,
        timeline: &'a Timeline,
        assignments: &'a AssignmentMap,
        selected_jobs: &'a SelectedJobs,
        level: u8,
        stack_cache: &'a StackCache,
    ) -> Self {
        Self {
            catalog,
            timeline,
            assignments,
            selected_jobs,
            level,
            stack_cache,
        }
    }

    /// Availability of `ability` at `at` for assignment onto
    /// `target_action_id`.
    ///
    /// Only uses on actions strictly earlier than `at` count; rows already
    /// recorded on the target action itself never conflict with it, so
    /// re-checking an existing assignment reports the state that admitted
    /// it.
    pub fn check(
        &self,
        ability: &AbilityDefinition,
        at: f32,
        target_action_id: &str,
    ) -> AvailabilityResult {
        let uses = self.prior_uses(&ability.id, at, target_action_id);
        let cooldown = ability.cooldown_at(self.level);

        let (charges_available, charges_total, instances) = if ability.role_shared {
            let capable = self.capable_jobs(ability);
            let (available, total) = available_instances(&uses, &capable, cooldown, at);
            (available, total, Some((available, total)))
        } else {
            let times: Vec<f32> = uses.iter().map(|&(time, _)| time).collect();
            let total = ability.charges_at(self.level);
            let available = available_charges(&times, total, cooldown, at);
            (available, total, None)
        };

        let stacks_available = if ability.consumes_stacks {
            self.catalog
                .stack_pool()
                .map(|pool| self.pooled_stacks(pool, at))
        } else {
            None
        };

        let reason = deny_reason(
            ability,
            self.level,
            charges_available,
            charges_total,
            instances,
            stacks_available,
        );
        if let Some(reason) = &reason {
            tracing::debug!(ability = %ability.id, at, reason, "assignment unavailable");
        }

        AvailabilityResult {
            on_cooldown: charges_available == 0,
            charges_available,
            charges_total,
            instances,
            stacks_available,
            reason,
        }
    }

    /// Prior casts of `ability_id` with their recorded caster jobs, sorted
    /// by owning action time. Rows on actions missing from the timeline are
    /// skipped.
    fn prior_uses(
        &self,
        ability_id: &str,
        before: f32,
        target_action_id: &str,
    ) -> Vec<(f32, Option<Job>)> {
        let mut uses = Vec::new();
        for (action_id, rows) in self.assignments {
            if action_id.as_str() == target_action_id {
                continue;
            }
            let Some(time) = self.timeline.action_time(action_id) else {
                continue;
            };
            if time >= before {
                continue;
            }
            for row in rows {
                if row.ability_id == ability_id {
                    let caster = row.caster_job.as_deref().and_then(Job::from_abbrev);
                    uses.push((time, caster));
                }
            }
        }
        uses.sort_by(|a, b| a.0.total_cmp(&b.0));
        uses
    }

    /// Selected jobs able to cast `ability`, in selection order.
    pub fn capable_jobs(&self, ability: &AbilityDefinition) -> Vec<Job> {
        self.selected_jobs
            .jobs()
            .iter()
            .filter_map(|selection| Job::from_abbrev(&selection.job))
            .filter(|&job| ability.can_cast(job))
            .collect()
    }

    /// Casters a new role-shared assignment could be attributed to: the
    /// selected capable jobs with no cast of `ability` inside its cooldown,
    /// in selection order.
    pub fn free_casters(
        &self,
        ability: &AbilityDefinition,
        at: f32,
        target_action_id: &str,
    ) -> Vec<Job> {
        let uses = self.prior_uses(&ability.id, at, target_action_id);
        let capable = self.capable_jobs(ability);
        free_casters(&uses, &capable, ability.cooldown_at(self.level), at)
    }

    fn pooled_stacks(&self, pool: StackPoolConfig, at: f32) -> u8 {
        if let Some(stacks) = self.stack_cache.get(at) {
            return stacks;
        }
        let events = self.stack_events(at);
        let stacks = stacks_at(&events, pool, at);
        self.stack_cache.put(at, stacks);
        stacks
    }

    /// Provider/consumer casts strictly before `before`, sorted for replay.
    fn stack_events(&self, before: f32) -> Vec<StackEvent> {
        let mut events = Vec::new();
        for (action_id, rows) in self.assignments {
            let Some(time) = self.timeline.action_time(action_id) else {
                continue;
            };
            if time >= before {
                continue;
            }
            for row in rows {
                let Some(ability) = self.catalog.get(&row.ability_id) else {
                    continue;
                };
                if ability.restores_stacks {
                    events.push(StackEvent {
                        time,
                        kind: StackEventKind::Restore,
                    });
                }
                if ability.consumes_stacks {
                    events.push(StackEvent {
                        time,
                        kind: StackEventKind::Consume,
                    });
                }
            }
        }
        sort_stack_events(&mut events);
        events
    }
}

fn deny_reason(
    ability: &AbilityDefinition,
    level: u8,
    charges_available: u8,
    charges_total: u8,
    instances: Option<(u8, u8)>,
    stacks_available: Option<u8>,
) -> Option<String> {
    if !ability.castable_at(level) {
        return Some(format!("requires level {}", ability.level));
    }
    if let Some((_, 0)) = instances {
        return Some("no selected job can cast it".to_string());
    }
    if charges_available == 0 {
        return Some(match (instances, charges_total) {
            (Some(_), _) => "all caster instances are on cooldown".to_string(),
            (None, total) if total > 1 => "no charges available".to_string(),
            _ => "on cooldown".to_string(),
        });
    }
    if stacks_available == Some(0) {
        return Some("no resource stacks remaining".to_string());
    }
    None
}

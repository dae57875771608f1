//! Role-shared instance tracking
//!
//! A role-shared ability (Rampart, Feint, Addle) is castable by every
//! selected job of its role, each keeping an independent cooldown. Instance
//! counting lives here and nowhere else; callers never scan job lists
//! themselves.

use crate::catalog::Job;

/// Free and total caster slots for a role-shared ability at `at`.
///
/// `capable` is the list of selected jobs that can cast the ability, one
/// slot each. `uses` are the sorted prior casts with their recorded caster
/// job when the plan knows it; a cast lands on its caster's slot, an
/// unattributed cast on whichever slot is free at that moment, falling back
/// to the slot idle the longest.
pub fn available_instances(
    uses: &[(f32, Option<Job>)],
    capable: &[Job],
    cooldown_secs: f32,
    at: f32,
) -> (u8, u8) {
    let total = capable.len() as u8;
    if total == 0 {
        return (0, 0);
    }
    if cooldown_secs <= 0.0 {
        return (total, total);
    }

    let last_use = replay_slots(uses, capable, cooldown_secs, at);
    let available = last_use
        .iter()
        .filter(|last| last.is_none_or(|t| at - t >= cooldown_secs))
        .count() as u8;

    (available, total)
}

/// Capable jobs whose slot is free at `at`, in selection order; used to
/// attribute a new cast when the caller did not name a caster.
pub fn free_casters(
    uses: &[(f32, Option<Job>)],
    capable: &[Job],
    cooldown_secs: f32,
    at: f32,
) -> Vec<Job> {
    if cooldown_secs <= 0.0 {
        return capable.to_vec();
    }

    let last_use = replay_slots(uses, capable, cooldown_secs, at);
    capable
        .iter()
        .zip(&last_use)
        .filter(|(_, last)| last.is_none_or(|t| at - t >= cooldown_secs))
        .map(|(&job, _)| job)
        .collect()
}

/// Last cast landing on each slot, replaying `uses` strictly before `at`.
fn replay_slots(
    uses: &[(f32, Option<Job>)],
    capable: &[Job],
    cooldown_secs: f32,
    at: f32,
) -> Vec<Option<f32>> {
    let mut last_use: Vec<Option<f32>> = vec![None; capable.len()];
    for &(use_time, caster) in uses {
        if use_time >= at {
            break;
        }
        let slot = caster
            .and_then(|job| capable.iter().position(|&capable_job| capable_job == job))
            .unwrap_or_else(|| pick_slot(&last_use, use_time, cooldown_secs));
        last_use[slot] = Some(use_time);
    }
    last_use
}

/// Slot for a cast with no recorded caster job.
fn pick_slot(last_use: &[Option<f32>], use_time: f32, cooldown_secs: f32) -> usize {
    if let Some(free) = last_use
        .iter()
        .position(|last| last.is_none_or(|t| use_time - t >= cooldown_secs))
    {
        return free;
    }
    last_use
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.unwrap_or(f32::NEG_INFINITY)
                .total_cmp(&b.unwrap_or(f32::NEG_INFINITY))
        })
        .map(|(slot, _)| slot)
        .unwrap_or(0)
}

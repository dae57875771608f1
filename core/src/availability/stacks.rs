//! Pooled-stack tracking
//!
//! A shared consumable resource (healer aether stacks) sits apart from any
//! one ability's cooldown: consumer casts spend a stack, a provider cast
//! sets the pool back to full, and the pool passively returns to full on
//! its own refill cadence. Queries replay the plan's provider/consumer
//! events in time order; results are cached per query time because the UI
//! re-asks for the same timestamps on every hover.

use std::sync::Mutex;

use hashbrown::HashMap;

use crate::catalog::StackPoolConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StackEventKind {
    /// Provider cast; resets the pool to full
    Restore,
    /// Consumer cast; spends one stack
    Consume,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackEvent {
    pub time: f32,
    pub kind: StackEventKind,
}

/// Sort events by time, providers ahead of consumers on ties.
pub fn sort_stack_events(events: &mut [StackEvent]) {
    events.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.kind.cmp(&b.kind)));
}

/// Stacks remaining at `at`, replaying sorted events against a pool that
/// starts full.
///
/// Passive refills complete on the `refill_secs` grid anchored at the last
/// provider cast (or the pull at 0); a boundary that passes while the pool
/// is already full still advances the anchor, so the next refill is always
/// one full interval after the previous one. Events at or after `at` are
/// ignored.
pub fn stacks_at(events: &[StackEvent], pool: StackPoolConfig, at: f32) -> u8 {
    let mut stacks = pool.capacity;
    let mut anchor = 0.0_f32;

    for event in events {
        if event.time >= at {
            break;
        }
        if pool.refill_secs > 0.0 {
            while anchor + pool.refill_secs <= event.time {
                anchor += pool.refill_secs;
                stacks = pool.capacity;
            }
        }
        match event.kind {
            StackEventKind::Restore => {
                stacks = pool.capacity;
                anchor = event.time;
            }
            StackEventKind::Consume => {
                stacks = stacks.saturating_sub(1);
            }
        }
    }

    if pool.refill_secs > 0.0 {
        while anchor + pool.refill_secs <= at {
            anchor += pool.refill_secs;
            stacks = pool.capacity;
        }
    }

    stacks
}

/// Memoized stack reads keyed by query time.
///
/// Cleared whenever an assignment touching the pool is added or removed;
/// a stale entry would hand the resolver a wrong verdict during rapid
/// assign/unassign interaction.
#[derive(Debug, Default)]
pub struct StackCache {
    entries: Mutex<HashMap<u32, u8>>,
}

impl StackCache {
    pub fn get(&self, at: f32) -> Option<u8> {
        let entries = self.entries.lock().ok()?;
        entries.get(&at.to_bits()).copied()
    }

    pub fn put(&self, at: f32, stacks: u8) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(at.to_bits(), stacks);
        }
    }

    pub fn invalidate(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

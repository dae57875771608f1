//! Assignment store
//!
//! Owns the authoritative assignment map for the current plan. Mutations
//! here only enforce the uniqueness invariant (no duplicate ability +
//! position pair on one action); cooldown and resource validation is the
//! caller's job, done through the availability resolver before mutating.

use rampart_types::{AssignedMitigation, AssignmentMap, TankPosition};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentStore {
    assignments: AssignmentMap,
}

impl AssignmentStore {
    pub fn from_map(assignments: AssignmentMap) -> Self {
        Self { assignments }
    }

    pub fn map(&self) -> &AssignmentMap {
        &self.assignments
    }

    /// Clone of the current map, for rollback snapshots.
    pub fn snapshot(&self) -> AssignmentMap {
        self.assignments.clone()
    }

    /// Replace the whole map (remote update or rollback).
    pub fn restore(&mut self, assignments: AssignmentMap) {
        self.assignments = assignments;
    }

    /// Append a row unless an identical (ability, position) pair already
    /// sits on the action.
    pub fn add(&mut self, action_id: &str, row: AssignedMitigation) -> bool {
        let rows = self.assignments.entry(action_id.to_string()).or_default();
        if rows
            .iter()
            .any(|existing| existing.conflicts_with(&row.ability_id, row.position))
        {
            return false;
        }
        rows.push(row);
        true
    }

    /// Remove the first matching row. Without a position, matches by
    /// ability alone; the action's entry disappears once its list empties.
    pub fn remove(
        &mut self,
        action_id: &str,
        ability_id: &str,
        position: Option<TankPosition>,
    ) -> bool {
        let Some(rows) = self.assignments.get_mut(action_id) else {
            return false;
        };
        let Some(index) = rows.iter().position(|row| {
            row.ability_id == ability_id
                && position.is_none_or(|wanted| row.position == Some(wanted))
        }) else {
            return false;
        };
        rows.remove(index);
        if rows.is_empty() {
            self.assignments.remove(action_id);
        }
        true
    }

    /// Update the precast offset of the first matching row.
    pub fn update_precast(
        &mut self,
        action_id: &str,
        ability_id: &str,
        position: Option<TankPosition>,
        precast_secs: f32,
    ) -> bool {
        let Some(rows) = self.assignments.get_mut(action_id) else {
            return false;
        };
        let Some(row) = rows.iter_mut().find(|row| {
            row.ability_id == ability_id
                && position.is_none_or(|wanted| row.position == Some(wanted))
        }) else {
            return false;
        };
        row.precast_secs = precast_secs;
        true
    }

    pub fn rows(&self, action_id: &str) -> &[AssignedMitigation] {
        self.assignments
            .get(action_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Rows across all actions.
    pub fn total_rows(&self) -> usize {
        self.assignments.values().map(Vec::len).sum()
    }
}

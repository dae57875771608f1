//! Local plan state
//!
//! The session's working copy of one plan document, split into the
//! independently-synchronized fields the sync engine persists. Conversions
//! to and from the wire document live here so every boundary (store load,
//! remote update, rollback) normalizes payloads the same way.

use std::collections::BTreeMap;

use rampart_types::{
    DocumentField, FieldValue, HealthSettings, JobClaims, PlanDocument, Presence, SelectedJobs,
    TankPositions,
};

use super::store::AssignmentStore;
use crate::availability::StackCache;

#[derive(Debug, Default)]
pub struct PlanState {
    pub boss_id: String,
    pub selected_jobs: SelectedJobs,
    pub assignments: AssignmentStore,
    pub tank_positions: TankPositions,
    pub health_settings: HealthSettings,
    pub job_claims: JobClaims,
    /// Presence of each connected session, keyed by session id
    pub presence: BTreeMap<String, Presence>,
    /// Memoized pooled-stack reads; cleared on any assignment change
    pub stack_cache: StackCache,
}

impl PlanState {
    pub fn from_document(document: PlanDocument) -> Self {
        Self {
            boss_id: document.boss_id,
            selected_jobs: document.selected_jobs,
            assignments: AssignmentStore::from_map(document.assignments),
            tank_positions: document.tank_positions,
            health_settings: document.health_settings,
            job_claims: document.job_claims,
            presence: document.presence,
            stack_cache: StackCache::default(),
        }
    }

    pub fn to_document(&self) -> PlanDocument {
        PlanDocument {
            boss_id: self.boss_id.clone(),
            selected_jobs: self.selected_jobs.clone(),
            assignments: self.assignments.snapshot(),
            tank_positions: self.tank_positions.clone(),
            health_settings: self.health_settings,
            job_claims: self.job_claims.clone(),
            presence: self.presence.clone(),
        }
    }

    /// Current value of one field, as the sync engine persists it.
    /// Presence is per-session; `session_id` selects whose row.
    pub fn field_value(&self, field: DocumentField, session_id: &str) -> Option<FieldValue> {
        match field {
            DocumentField::BossId => Some(FieldValue::BossId {
                id: self.boss_id.clone(),
            }),
            DocumentField::SelectedJobs => Some(FieldValue::SelectedJobs {
                jobs: self.selected_jobs.0.clone(),
            }),
            DocumentField::Assignments => Some(FieldValue::Assignments {
                assignments: self.assignments.snapshot(),
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
            DocumentField::Presence => self.presence.get(session_id).map(|presence| {
                FieldValue::Presence {
                    presence: presence.clone(),
                }
            }),
        }
    }

    /// Apply one field value (remote update or rollback snapshot).
    /// Assignment changes clear the stack cache: any replaced row may have
    /// touched the shared resource pool.
    pub fn apply_field(&mut self, value: &FieldValue) {
        match value {
            FieldValue::BossId { id } => self.boss_id = id.clone(),
            FieldValue::SelectedJobs { jobs } => {
                self.selected_jobs = SelectedJobs(jobs.clone());
            }
            FieldValue::Assignments { assignments } => {
                self.assignments.restore(assignments.clone());
                self.stack_cache.invalidate();
            }
            FieldValue::TankPositions { positions } => {
                self.tank_positions = positions.clone();
            }
            FieldValue::HealthSettings { settings } => self.health_settings = *settings,
            FieldValue::JobClaims { claims } => self.job_claims = claims.clone(),
            FieldValue::Presence { presence } => {
                self.presence
                    .insert(presence.session.clone(), presence.clone());
            }
        }
    }
}

//! Plan session
//!
//! One user's live connection to one plan: the ability catalog and
//! encounter library for lookups, the shared [`PlanState`] all views read,
//! and the sync engine that persists edits and applies remote changes.
//! Every mutating entry point follows the same shape: validate, snapshot
//! the field, edit state, queue the persist.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedReceiver;

use rampart_types::{
    AssignedMitigation, DocumentField, FieldValue, HealthSettings, JobSelection, PlanDocument,
    Presence, SelectedJobs, TankPosition, TankPositions,
};

use crate::availability::{AvailabilityResolver, AvailabilityResult};
use crate::catalog::{AbilityCatalog, AbilityDefinition, Job};
use crate::mitigation::{
    ActiveEffectResolver, ActiveMitigation, healing_amount, total_barrier, total_mitigation,
};
use crate::plan::PlanState;
use crate::sync::{DocumentStore, StoreError, SyncEngine, SyncNotice, SyncState};
use crate::timeline::{DamageType, EncounterLibrary, Timeline};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown ability '{0}'")]
    UnknownAbility(String),
    #[error("unknown boss action '{0}'")]
    UnknownAction(String),
    #[error("unknown encounter '{0}'")]
    UnknownEncounter(String),
    #[error("no encounter selected")]
    NoEncounter,
    #[error("'{0}' is not in the party")]
    JobNotSelected(String),
    #[error("'{0}' is not a tank job")]
    NotATank(String),
    #[error("{ability} is not available: {reason}")]
    NotAvailable { ability: String, reason: String },
    #[error("{ability} is already assigned to that action")]
    DuplicateAssignment { ability: String },
    #[error("{ability} is not assigned to that action")]
    AssignmentNotFound { ability: String },
    #[error("plan is read-only: the store subscription was lost")]
    SyncBlocked,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Damage and coverage rollup for one boss action.
#[derive(Debug, Clone)]
pub struct MitigationSummary {
    pub action_id: String,
    pub action_name: String,
    pub time_secs: f32,
    pub damage_type: DamageType,
    pub targets_tanks: bool,
    /// Own rows plus inherited windows, in window order
    pub active: Vec<ActiveMitigation>,
    pub physical_reduction: f32,
    pub magical_reduction: f32,
    /// Absolute shielding from rows assigned to the action
    pub barrier_total: f32,
    /// Absolute healing from rows assigned to the action, potency bonuses
    /// applied
    pub healing_total: f32,
    /// Expected damage per hit after reduction, when the timeline knows the
    /// raw number
    pub residual_damage: Option<f32>,
}

/// Connection and persistence state, for display.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub plan_id: String,
    pub session_id: String,
    pub blocked: bool,
    pub boss_id: String,
    pub fields: Vec<(DocumentField, SyncState)>,
    /// Presence rows of the other connected sessions
    pub viewers: Vec<Presence>,
}

pub struct PlanSession<S> {
    catalog: Arc<AbilityCatalog>,
    encounters: Arc<EncounterLibrary>,
    state: Arc<RwLock<PlanState>>,
    engine: SyncEngine<S>,
}

impl<S: DocumentStore + 'static> PlanSession<S> {
    /// Load the plan from the store, connect the sync engine, and hand back
    /// the session plus its notice stream.
    pub async fn open(
        store: Arc<S>,
        plan_id: impl Into<String>,
        session_id: impl Into<String>,
        catalog: Arc<AbilityCatalog>,
        encounters: Arc<EncounterLibrary>,
    ) -> Result<(Self, UnboundedReceiver<SyncNotice>), SessionError> {
        let plan_id = plan_id.into();
        let document = store.load(&plan_id).await?;
        let state = Arc::new(RwLock::new(PlanState::from_document(document)));
        let (engine, notices) = SyncEngine::new(store, plan_id, session_id, Arc::clone(&state));
        engine.connect().await?;

        Ok((
            Self {
                catalog,
                encounters,
                state,
                engine,
            },
            notices,
        ))
    }

    pub fn catalog(&self) -> &AbilityCatalog {
        &self.catalog
    }

    pub fn encounters(&self) -> &EncounterLibrary {
        &self.encounters
    }

    pub fn plan_id(&self) -> &str {
        self.engine.plan_id()
    }

    pub fn session_id(&self) -> &str {
        self.engine.session_id()
    }

    /// Timeline of the currently selected encounter.
    pub async fn timeline(&self) -> Result<&Timeline, SessionError> {
        let boss_id = self.state.read().await.boss_id.clone();
        if boss_id.is_empty() {
            return Err(SessionError::NoEncounter);
        }
        self.encounters
            .get(&boss_id)
            .ok_or(SessionError::UnknownEncounter(boss_id))
    }

    /// Point-in-time copy of the whole plan, for display.
    pub async fn document(&self) -> PlanDocument {
        self.state.read().await.to_document()
    }

    // ─── Availability & effects ──────────────────────────────────────────────

    /// Whether `ability_id` has a free use at `action_id`, and why not when
    /// it does not.
    pub async fn check_availability(
        &self,
        ability_id: &str,
        action_id: &str,
    ) -> Result<AvailabilityResult, SessionError> {
        let ability = self.ability(ability_id)?;
        let timeline = self.timeline().await?;
        let at = self.action_time(timeline, action_id)?;

        let state = self.state.read().await;
        let resolver = AvailabilityResolver::new(
            &self.catalog,
            timeline,
            state.assignments.map(),
            &state.selected_jobs,
            state.health_settings.level,
            &state.stack_cache,
        );
        Ok(resolver.check(ability, at, action_id))
    }

    /// Every effect covering `action_id`: its own rows plus duration buffs
    /// inherited from earlier (or precast later) actions.
    pub async fn active_mitigations(
        &self,
        action_id: &str,
        tank_filter: Option<TankPosition>,
    ) -> Result<Vec<ActiveMitigation>, SessionError> {
        let timeline = self.timeline().await?;
        self.action_time(timeline, action_id)?;

        let state = self.state.read().await;
        let resolver = ActiveEffectResolver::new(
            &self.catalog,
            timeline,
            state.assignments.map(),
            state.health_settings.level,
        );
        Ok(resolver.effects_at(action_id, tank_filter))
    }

    /// Reduction, shielding, and healing rollup for one action.
    pub async fn mitigation_summary(
        &self,
        action_id: &str,
        tank_filter: Option<TankPosition>,
    ) -> Result<MitigationSummary, SessionError> {
        let timeline = self.timeline().await?;
        let action = timeline
            .action(action_id)
            .ok_or_else(|| SessionError::UnknownAction(action_id.to_string()))?;

        let state = self.state.read().await;
        let settings = state.health_settings;
        let resolver = ActiveEffectResolver::new(
            &self.catalog,
            timeline,
            state.assignments.map(),
            settings.level,
        );

        let active = resolver.effects_at(action_id, tank_filter);
        let own = resolver.assigned_at(action_id);
        let inherited = resolver.active_at(action_id, tank_filter);

        let physical_reduction = total_mitigation(&active, DamageType::Physical);
        let magical_reduction = total_mitigation(&active, DamageType::Magical);

        let max_hp = if action.targets_tanks() {
            settings.tank_max_hp as f32
        } else {
            settings.party_max_hp as f32
        };
        let barrier_total = total_barrier(&own, max_hp, settings.healing_per_100_potency);

        // Heals land from the action's own rows; potency bonuses can also
        // reach in from windows still running over it.
        let mut heal_set = own;
        heal_set.extend(
            inherited
                .into_iter()
                .filter(|effect| effect.potency_bonus.is_some()),
        );
        let healing_total = healing_amount(&heal_set, settings.healing_per_100_potency, max_hp);

        let residual_damage = action.raw_damage.map(|raw| {
            let reduction = total_mitigation(&active, action.damage);
            raw as f32 * (1.0 - reduction)
        });

        Ok(MitigationSummary {
            action_id: action.id.clone(),
            action_name: action.name.clone(),
            time_secs: action.time_secs,
            damage_type: action.damage,
            targets_tanks: action.targets_tanks(),
            active,
            physical_reduction,
            magical_reduction,
            barrier_total,
            healing_total,
            residual_damage,
        })
    }

    // ─── Assignment edits ────────────────────────────────────────────────────

    /// Assign an ability to a boss action. Position defaults to the caster's
    /// tank slot for self/single-target abilities; the caster is picked from
    /// the free role-shared slots when not named.
    pub async fn add_mitigation(
        &self,
        action_id: &str,
        ability_id: &str,
        position: Option<TankPosition>,
        caster: Option<Job>,
    ) -> Result<AssignedMitigation, SessionError> {
        self.ensure_writable()?;
        let ability = self.ability(ability_id)?;
        let timeline = self.timeline().await?;
        let at = self.action_time(timeline, action_id)?;

        let mut state = self.state.write().await;

        if let Some(job) = caster {
            if !ability.can_cast(job) {
                return Err(SessionError::NotAvailable {
                    ability: ability.name.clone(),
                    reason: format!("{} cannot cast it", job.abbrev()),
                });
            }
            if !state.selected_jobs.contains(job.abbrev()) {
                return Err(SessionError::JobNotSelected(job.abbrev().to_string()));
            }
        }

        let (availability, picked) = {
            let resolver = AvailabilityResolver::new(
                &self.catalog,
                timeline,
                state.assignments.map(),
                &state.selected_jobs,
                state.health_settings.level,
                &state.stack_cache,
            );
            let availability = resolver.check(ability, at, action_id);
            // Rows on the target action never block availability (nothing
            // conflicts at one instant), but a fresh cast should still land
            // on a job not already used there.
            let picked = if ability.role_shared && caster.is_none() {
                let free = resolver.free_casters(ability, at, action_id);
                let used_here = state.assignments.rows(action_id);
                free.iter()
                    .copied()
                    .find(|job| {
                        !used_here.iter().any(|row| {
                            row.ability_id == ability.id
                                && row.caster_job.as_deref() == Some(job.abbrev())
                        })
                    })
                    .or_else(|| free.first().copied())
            } else {
                None
            };
            (availability, picked)
        };
        if let Some(reason) = availability.reason {
            return Err(SessionError::NotAvailable {
                ability: ability.name.clone(),
                reason,
            });
        }

        let caster_job = caster.or(picked).or_else(|| {
            state
                .selected_jobs
                .jobs()
                .iter()
                .filter_map(|selection| Job::from_abbrev(&selection.job))
                .find(|&job| ability.can_cast(job))
        });
        let claimed = caster_job.and_then(|job| state.job_claims.get(job.abbrev()).cloned());
        let position = if ability.target.is_party_wide() {
            None
        } else {
            position.or_else(|| {
                caster_job.and_then(|job| state.tank_positions.position_of(job.abbrev()))
            })
        };

        let row = AssignedMitigation {
            ability_id: ability.id.clone(),
            position,
            precast_secs: 0.0,
            caster_job: caster_job.map(|job| job.abbrev().to_string()),
            caster: claimed,
            written_by: self.engine.session_id().to_string(),
            written_at: Utc::now().timestamp_millis(),
        };

        let snapshot = state.field_value(DocumentField::Assignments, self.engine.session_id());
        if !state.assignments.add(action_id, row.clone()) {
            return Err(SessionError::DuplicateAssignment {
                ability: ability.name.clone(),
            });
        }
        if ability.touches_stack_pool() {
            state.stack_cache.invalidate();
        }
        drop(state);

        self.engine.queue(DocumentField::Assignments, snapshot).await;
        Ok(row)
    }

    /// Remove an assignment. Without a position, the first row carrying the
    /// ability goes; stale rows whose ability the catalog no longer knows
    /// can still be removed.
    pub async fn remove_mitigation(
        &self,
        action_id: &str,
        ability_id: &str,
        position: Option<TankPosition>,
    ) -> Result<(), SessionError> {
        self.ensure_writable()?;
        let touches_pool = self
            .catalog
            .get(ability_id)
            .is_some_and(AbilityDefinition::touches_stack_pool);

        let mut state = self.state.write().await;
        let snapshot = state.field_value(DocumentField::Assignments, self.engine.session_id());
        if !state.assignments.remove(action_id, ability_id, position) {
            return Err(SessionError::AssignmentNotFound {
                ability: ability_id.to_string(),
            });
        }
        if touches_pool {
            state.stack_cache.invalidate();
        }
        drop(state);

        self.engine.queue(DocumentField::Assignments, snapshot).await;
        Ok(())
    }

    /// Set how many seconds before the action the ability is cast. Clamped
    /// to [0, ability duration]; returns the stored value.
    pub async fn update_precast(
        &self,
        action_id: &str,
        ability_id: &str,
        position: Option<TankPosition>,
        precast_secs: f32,
    ) -> Result<f32, SessionError> {
        self.ensure_writable()?;

        let mut state = self.state.write().await;
        let max = self
            .catalog
            .get(ability_id)
            .map(|ability| ability.duration_at(state.health_settings.level))
            .unwrap_or(f32::MAX);
        let clamped = precast_secs.clamp(0.0, max);

        let snapshot = state.field_value(DocumentField::Assignments, self.engine.session_id());
        if !state
            .assignments
            .update_precast(action_id, ability_id, position, clamped)
        {
            return Err(SessionError::AssignmentNotFound {
                ability: ability_id.to_string(),
            });
        }
        drop(state);

        self.engine.queue(DocumentField::Assignments, snapshot).await;
        Ok(clamped)
    }

    // ─── Plan settings ───────────────────────────────────────────────────────

    pub async fn set_encounter(&self, encounter_id: &str) -> Result<(), SessionError> {
        self.ensure_writable()?;
        if self.encounters.get(encounter_id).is_none() {
            return Err(SessionError::UnknownEncounter(encounter_id.to_string()));
        }

        let mut state = self.state.write().await;
        let snapshot = state.field_value(DocumentField::BossId, self.engine.session_id());
        state.boss_id = encounter_id.to_string();
        drop(state);

        self.engine.queue(DocumentField::BossId, snapshot).await;
        Ok(())
    }

    /// Replace the party composition. Claims survive for jobs that stay;
    /// tank slots and claims of dropped jobs are pruned.
    pub async fn set_jobs(&self, jobs: &[Job]) -> Result<(), SessionError> {
        self.ensure_writable()?;

        let mut queued: Vec<(DocumentField, Option<FieldValue>)> = Vec::new();
        let mut state = self.state.write().await;
        let session_id = self.engine.session_id();

        let selections = jobs
            .iter()
            .map(|job| JobSelection {
                job: job.abbrev().to_string(),
                claimed_by: state
                    .selected_jobs
                    .claimed_by(job.abbrev())
                    .map(str::to_string),
            })
            .collect();
        queued.push((
            DocumentField::SelectedJobs,
            state.field_value(DocumentField::SelectedJobs, session_id),
        ));
        state.selected_jobs = SelectedJobs(selections);

        let stale_main = state
            .tank_positions
            .main_tank
            .as_deref()
            .is_some_and(|job| !state.selected_jobs.contains(job));
        let stale_off = state
            .tank_positions
            .off_tank
            .as_deref()
            .is_some_and(|job| !state.selected_jobs.contains(job));
        if stale_main || stale_off {
            queued.push((
                DocumentField::TankPositions,
                state.field_value(DocumentField::TankPositions, session_id),
            ));
            if stale_main {
                state.tank_positions.main_tank = None;
            }
            if stale_off {
                state.tank_positions.off_tank = None;
            }
        }

        let stale_claims: Vec<String> = state
            .job_claims
            .keys()
            .filter(|job| !state.selected_jobs.contains(job.as_str()))
            .cloned()
            .collect();
        if !stale_claims.is_empty() {
            queued.push((
                DocumentField::JobClaims,
                state.field_value(DocumentField::JobClaims, session_id),
            ));
            for job in stale_claims {
                state.job_claims.remove(&job);
            }
        }
        drop(state);

        for (field, snapshot) in queued {
            self.engine.queue(field, snapshot).await;
        }
        Ok(())
    }

    /// Claim a selected job for a user, or release it with None.
    pub async fn claim_job(&self, job: Job, user: Option<&str>) -> Result<(), SessionError> {
        self.ensure_writable()?;

        let mut state = self.state.write().await;
        if !state.selected_jobs.contains(job.abbrev()) {
            return Err(SessionError::JobNotSelected(job.abbrev().to_string()));
        }
        let session_id = self.engine.session_id();
        let jobs_snapshot = state.field_value(DocumentField::SelectedJobs, session_id);
        let claims_snapshot = state.field_value(DocumentField::JobClaims, session_id);

        state
            .selected_jobs
            .set_claim(job.abbrev(), user.map(String::from));
        match user {
            Some(user) => {
                state
                    .job_claims
                    .insert(job.abbrev().to_string(), user.to_string());
            }
            None => {
                state.job_claims.remove(job.abbrev());
            }
        }
        drop(state);

        self.engine
            .queue(DocumentField::SelectedJobs, jobs_snapshot)
            .await;
        self.engine
            .queue(DocumentField::JobClaims, claims_snapshot)
            .await;
        Ok(())
    }

    /// Slot jobs into the tank positions. Both slots are set at once; None
    /// clears a slot.
    pub async fn set_tanks(
        &self,
        main_tank: Option<Job>,
        off_tank: Option<Job>,
    ) -> Result<(), SessionError> {
        self.ensure_writable()?;

        let mut state = self.state.write().await;
        for job in [main_tank, off_tank].into_iter().flatten() {
            if !job.is_tank() {
                return Err(SessionError::NotATank(job.abbrev().to_string()));
            }
            if !state.selected_jobs.contains(job.abbrev()) {
                return Err(SessionError::JobNotSelected(job.abbrev().to_string()));
            }
        }

        let snapshot = state.field_value(DocumentField::TankPositions, self.engine.session_id());
        state.tank_positions = TankPositions {
            main_tank: main_tank.map(|job| job.abbrev().to_string()),
            off_tank: off_tank.map(|job| job.abbrev().to_string()),
        };
        drop(state);

        self.engine
            .queue(DocumentField::TankPositions, snapshot)
            .await;
        Ok(())
    }

    pub async fn set_health(&self, settings: HealthSettings) -> Result<(), SessionError> {
        self.ensure_writable()?;

        let mut state = self.state.write().await;
        let snapshot = state.field_value(DocumentField::HealthSettings, self.engine.session_id());
        state.health_settings = settings;
        drop(state);

        self.engine
            .queue(DocumentField::HealthSettings, snapshot)
            .await;
        Ok(())
    }

    pub async fn health_settings(&self) -> HealthSettings {
        self.state.read().await.health_settings
    }

    // ─── Presence & status ───────────────────────────────────────────────────

    /// Record which action this session is looking at. Dropped silently
    /// while the plan is blocked; presence is never worth an error.
    pub async fn update_presence(&self, selected_action: Option<&str>) -> Result<(), SessionError> {
        if self.engine.is_blocked() {
            return Ok(());
        }

        let session_id = self.engine.session_id().to_string();
        let row = Presence {
            session: session_id.clone(),
            selected_action: selected_action.map(String::from),
            updated_at: Utc::now().timestamp_millis(),
        };
        self.state.write().await.presence.insert(session_id, row);

        self.engine.queue(DocumentField::Presence, None).await;
        Ok(())
    }

    pub async fn status(&self) -> SessionStatus {
        let (boss_id, viewers) = {
            let state = self.state.read().await;
            let viewers = state
                .presence
                .values()
                .filter(|presence| presence.session != self.engine.session_id())
                .cloned()
                .collect();
            (state.boss_id.clone(), viewers)
        };
        SessionStatus {
            plan_id: self.engine.plan_id().to_string(),
            session_id: self.engine.session_id().to_string(),
            blocked: self.engine.is_blocked(),
            boss_id,
            fields: self.engine.field_states().await,
            viewers,
        }
    }

    /// Persist everything still pending, now.
    pub async fn flush(&self) -> Result<(), SessionError> {
        self.engine.flush().await?;
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.engine.shutdown().await;
    }

    // ─── Internal ────────────────────────────────────────────────────────────

    fn ensure_writable(&self) -> Result<(), SessionError> {
        if self.engine.is_blocked() {
            return Err(SessionError::SyncBlocked);
        }
        Ok(())
    }

    fn ability(&self, id: &str) -> Result<&AbilityDefinition, SessionError> {
        self.catalog
            .get(id)
            .ok_or_else(|| SessionError::UnknownAbility(id.to_string()))
    }

    fn action_time(&self, timeline: &Timeline, action_id: &str) -> Result<f32, SessionError> {
        timeline
            .action_time(action_id)
            .ok_or_else(|| SessionError::UnknownAction(action_id.to_string()))
    }
}

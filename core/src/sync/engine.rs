//! Optimistic synchronization engine
//!
//! Every local edit applies to [`PlanState`] immediately, then persists in
//! the background after a per-field debounce. Each field moves through its
//! own state machine:
//!
//! ```text
//!   Idle ──edit──► PendingLocal ──debounce──► Persisting ──ok──► Committed
//!                       │                         │
//!                       └──newer edit (restart)   └──err/timeout──► RolledBack
//! ```
//!
//! A failed persist restores the field from the snapshot taken before the
//! first unpersisted edit and emits a [`SyncNotice::RolledBack`]. Incoming
//! broadcasts apply last-write-wins, except a session's own echo once the
//! field has been initialized locally.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use hashbrown::{HashMap, HashSet};
use rampart_types::{DocumentField, FieldValue};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep, timeout};

use super::store::{DocumentStore, StoreError};
use crate::plan::PlanState;

/// Outcome bound for one in-flight write.
pub const PERSIST_TIMEOUT: Duration = Duration::from_secs(8);

/// Persistence state of one document field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Idle,
    /// Edited locally, persist scheduled
    PendingLocal,
    /// Write in flight
    Persisting,
    /// Last persist landed
    Committed,
    /// Last persist failed; the field was restored from its snapshot
    RolledBack,
}

impl SyncState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PendingLocal => "pending",
            Self::Persisting => "persisting",
            Self::Committed => "committed",
            Self::RolledBack => "rolled back",
        }
    }
}

/// Out-of-band events the frontend should surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncNotice {
    /// A persist failed and the field reverted to its pre-edit value.
    RolledBack { field: DocumentField },
    /// The store subscription ended; edits are blocked until reconnect.
    SubscriptionLost,
}

struct PendingWrite {
    generation: u64,
    /// Value to restore on failure. Taken before the FIRST unpersisted
    /// edit; replacing a pending write keeps the older snapshot. None for
    /// presence, which is never rolled back.
    snapshot: Option<FieldValue>,
    task: JoinHandle<()>,
}

pub struct SyncEngine<S> {
    store: Arc<S>,
    plan_id: String,
    session_id: String,
    state: Arc<RwLock<PlanState>>,
    pending: Arc<Mutex<HashMap<DocumentField, PendingWrite>>>,
    states: Arc<Mutex<HashMap<DocumentField, SyncState>>>,
    /// Fields that have received at least one broadcast since (re)connect.
    /// An own-origin echo on a field already in this set is suppressed.
    seen_fields: Arc<Mutex<HashSet<DocumentField>>>,
    notices: UnboundedSender<SyncNotice>,
    generation: AtomicU64,
    blocked: Arc<AtomicBool>,
    recv_task: Mutex<Option<JoinHandle<()>>>,
}

impl<S: DocumentStore + 'static> SyncEngine<S> {
    /// Build an engine over `state`. The returned receiver carries
    /// [`SyncNotice`] events until the engine is dropped.
    pub fn new(
        store: Arc<S>,
        plan_id: impl Into<String>,
        session_id: impl Into<String>,
        state: Arc<RwLock<PlanState>>,
    ) -> (Self, UnboundedReceiver<SyncNotice>) {
        let (notices, notice_rx) = mpsc::unbounded_channel();
        let engine = Self {
            store,
            plan_id: plan_id.into(),
            session_id: session_id.into(),
            state,
            pending: Arc::new(Mutex::new(HashMap::new())),
            states: Arc::new(Mutex::new(HashMap::new())),
            seen_fields: Arc::new(Mutex::new(HashSet::new())),
            notices,
            generation: AtomicU64::new(0),
            blocked: Arc::new(AtomicBool::new(false)),
            recv_task: Mutex::new(None),
        };
        (engine, notice_rx)
    }

    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> &Arc<RwLock<PlanState>> {
        &self.state
    }

    /// True once the store subscription has ended; edits are refused until
    /// [`connect`](Self::connect) succeeds again.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Subscribe to the plan and start applying remote updates.
    ///
    /// The store replays the current document into the subscription, so the
    /// first broadcast per field always applies, own origin or not. That
    /// replay is what converges a session after reload.
    pub async fn connect(&self) -> Result<(), StoreError> {
        let mut updates = self.store.subscribe(&self.plan_id).await?;
        self.seen_fields.lock().await.clear();
        self.blocked.store(false, Ordering::SeqCst);

        let state = Arc::clone(&self.state);
        let seen_fields = Arc::clone(&self.seen_fields);
        let blocked = Arc::clone(&self.blocked);
        let notices = self.notices.clone();
        let session_id = self.session_id.clone();

        let task = tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                let field = update.value.field();
                let first = seen_fields.lock().await.insert(field);
                if !first && update.origin == session_id {
                    tracing::trace!(field = field.key(), "suppressed own echo");
                    continue;
                }
                state.write().await.apply_field(&update.value);
            }
            tracing::warn!("plan subscription ended");
            blocked.store(true, Ordering::SeqCst);
            let _ = notices.send(SyncNotice::SubscriptionLost);
        });

        if let Some(old) = self.recv_task.lock().await.replace(task) {
            old.abort();
        }
        Ok(())
    }

    /// Schedule a persist for `field`, which the caller has already edited
    /// in [`PlanState`]. `snapshot` is the field's value from before that
    /// edit; pass None for presence-like fields that must not roll back.
    ///
    /// A second edit before the debounce fires replaces the scheduled
    /// write but keeps the earlier snapshot, so a failure lands the field
    /// back on the last persisted value.
    pub async fn queue(&self, field: DocumentField, snapshot: Option<FieldValue>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.states
            .lock()
            .await
            .insert(field, SyncState::PendingLocal);
        tracing::debug!(field = field.key(), generation, "persist queued");

        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        let pending = Arc::clone(&self.pending);
        let states = Arc::clone(&self.states);
        let notices = self.notices.clone();
        let plan_id = self.plan_id.clone();
        let session_id = self.session_id.clone();
        let delay = Duration::from_millis(field.persist_delay_ms());

        let mut guard = self.pending.lock().await;
        let snapshot = match guard.remove(&field) {
            Some(previous) => {
                previous.task.abort();
                previous.snapshot.or(snapshot)
            }
            None => snapshot,
        };

        let task = tokio::spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            states.lock().await.insert(field, SyncState::Persisting);

            // Persist the field's value as of now, not as of the edit that
            // queued the write; intermediate edits collapse into one write.
            let value = {
                let state = state.read().await;
                state.field_value(field, &session_id)
            };

            let ok = match value {
                Some(value) => matches!(
                    timeout(PERSIST_TIMEOUT, store.write(&plan_id, value, &session_id)).await,
                    Ok(Ok(()))
                ),
                // Nothing to persist (no local row for this field).
                None => true,
            };

            let snapshot = {
                let mut pending = pending.lock().await;
                match pending.get(&field) {
                    Some(entry) if entry.generation == generation => {
                        pending.remove(&field).and_then(|entry| entry.snapshot)
                    }
                    // A newer edit owns this field now; leave its
                    // bookkeeping alone.
                    _ => return,
                }
            };

            if ok {
                states.lock().await.insert(field, SyncState::Committed);
                return;
            }

            tracing::warn!(field = field.key(), "persist failed");
            match snapshot {
                Some(snapshot) => {
                    state.write().await.apply_field(&snapshot);
                    states.lock().await.insert(field, SyncState::RolledBack);
                    let _ = notices.send(SyncNotice::RolledBack { field });
                }
                // No snapshot, nothing to restore; the next edit rewrites.
                None => {
                    states.lock().await.insert(field, SyncState::Idle);
                }
            }
        });

        guard.insert(
            field,
            PendingWrite {
                generation,
                snapshot,
                task,
            },
        );
    }

    /// Cancel scheduled debounces and persist every pending field now.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let fields: Vec<DocumentField> = {
            let mut pending = self.pending.lock().await;
            let fields = pending.keys().copied().collect();
            for (_, entry) in pending.drain() {
                entry.task.abort();
            }
            fields
        };
        if fields.is_empty() {
            return Ok(());
        }

        let values: Vec<FieldValue> = {
            let state = self.state.read().await;
            fields
                .iter()
                .filter_map(|&field| state.field_value(field, &self.session_id))
                .collect()
        };
        self.store
            .write_partial(&self.plan_id, values, &self.session_id)
            .await?;

        let mut states = self.states.lock().await;
        for field in fields {
            states.insert(field, SyncState::Committed);
        }
        Ok(())
    }

    pub async fn field_state(&self, field: DocumentField) -> SyncState {
        self.states
            .lock()
            .await
            .get(&field)
            .copied()
            .unwrap_or_default()
    }

    /// Every field with its current sync state, in document order.
    pub async fn field_states(&self) -> Vec<(DocumentField, SyncState)> {
        let states = self.states.lock().await;
        DocumentField::all()
            .iter()
            .map(|&field| (field, states.get(&field).copied().unwrap_or_default()))
            .collect()
    }

    pub async fn has_pending(&self) -> bool {
        !self.pending.lock().await.is_empty()
    }

    /// Abort the subscription and any scheduled persists.
    pub async fn shutdown(&self) {
        if let Some(task) = self.recv_task.lock().await.take() {
            task.abort();
        }
        let mut pending = self.pending.lock().await;
        for (_, entry) in pending.drain() {
            entry.task.abort();
        }
    }
}

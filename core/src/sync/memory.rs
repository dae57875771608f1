//! In-memory document store
//!
//! Backs tests and offline planning. Keeps one [`PlanDocument`] per plan id,
//! fans every write out to all subscribers of that plan, and records the
//! last writer of each field so late subscribers replay with real origins.

use hashbrown::HashMap;
use rampart_types::{DocumentField, FieldValue, PlanDocument};
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::store::{DocumentStore, RemoteUpdate, StoreError};

#[derive(Default)]
struct Inner {
    plans: HashMap<String, PlanDocument>,
    /// plan id → field → session id of the last writer
    origins: HashMap<String, HashMap<DocumentField, String>>,
    subscribers: HashMap<String, Vec<UnboundedSender<RemoteUpdate>>>,
    /// Remaining writes to reject, for failure-path tests
    fail_writes: u32,
    writes: u64,
}

impl Inner {
    fn broadcast(&mut self, plan_id: &str, update: RemoteUpdate) {
        if let Some(senders) = self.subscribers.get_mut(plan_id) {
            senders.retain(|tx| tx.send(update.clone()).is_ok());
        }
    }

    fn record(&mut self, plan_id: &str, value: &FieldValue, origin: &str) {
        let doc = self.plans.entry(plan_id.to_string()).or_default();
        doc.apply(value);
        self.origins
            .entry(plan_id.to_string())
            .or_default()
            .insert(value.field(), origin.to_string());
        self.writes += 1;
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document directly, without broadcasting. Test setup only.
    pub async fn seed(&self, plan_id: &str, document: PlanDocument) {
        let mut inner = self.inner.lock().await;
        inner.plans.insert(plan_id.to_string(), document);
    }

    /// Reject the next `count` writes with [`StoreError::WriteRejected`].
    pub async fn fail_next_writes(&self, count: u32) {
        self.inner.lock().await.fail_writes = count;
    }

    /// Current document, for assertions.
    pub async fn document(&self, plan_id: &str) -> PlanDocument {
        let inner = self.inner.lock().await;
        inner.plans.get(plan_id).cloned().unwrap_or_default()
    }

    /// Total writes accepted so far.
    pub async fn write_count(&self) -> u64 {
        self.inner.lock().await.writes
    }

    /// Drop every subscriber channel for `plan_id`, ending their streams.
    pub async fn drop_subscribers(&self, plan_id: &str) {
        let mut inner = self.inner.lock().await;
        inner.subscribers.remove(plan_id);
    }
}

impl DocumentStore for MemoryStore {
    async fn write(
        &self,
        plan_id: &str,
        value: FieldValue,
        origin: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.fail_writes > 0 {
            inner.fail_writes -= 1;
            return Err(StoreError::WriteRejected);
        }
        inner.record(plan_id, &value, origin);
        inner.broadcast(
            plan_id,
            RemoteUpdate {
                value,
                origin: origin.to_string(),
            },
        );
        Ok(())
    }

    async fn write_partial(
        &self,
        plan_id: &str,
        values: Vec<FieldValue>,
        origin: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.fail_writes > 0 {
            inner.fail_writes -= 1;
            return Err(StoreError::WriteRejected);
        }
        for value in values {
            inner.record(plan_id, &value, origin);
            inner.broadcast(
                plan_id,
                RemoteUpdate {
                    value,
                    origin: origin.to_string(),
                },
            );
        }
        Ok(())
    }

    async fn load(&self, plan_id: &str) -> Result<PlanDocument, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.plans.get(plan_id).cloned().unwrap_or_default())
    }

    async fn subscribe(
        &self,
        plan_id: &str,
    ) -> Result<UnboundedReceiver<RemoteUpdate>, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().await;
        let doc = inner.plans.get(plan_id).cloned().unwrap_or_default();
        let origins = inner.origins.get(plan_id).cloned().unwrap_or_default();

        // Replay the current document so the subscriber converges before
        // live updates start.
        for &field in DocumentField::all() {
            if field == DocumentField::Presence {
                continue;
            }
            if let Some(value) = doc.get(field) {
                let origin = origins.get(&field).cloned().unwrap_or_default();
                let _ = tx.send(RemoteUpdate { value, origin });
            }
        }
        for presence in doc.presence.values() {
            let _ = tx.send(RemoteUpdate {
                value: FieldValue::Presence {
                    presence: presence.clone(),
                },
                origin: presence.session.clone(),
            });
        }

        inner
            .subscribers
            .entry(plan_id.to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_reaches_all_subscribers() {
        let store = MemoryStore::new();
        let mut a = store.subscribe("p1").await.unwrap();
        let mut b = store.subscribe("p1").await.unwrap();

        // drain the empty-document replay
        while a.try_recv().is_ok() {}
        while b.try_recv().is_ok() {}

        store
            .write(
                "p1",
                FieldValue::BossId {
                    id: "the_sunspire".into(),
                },
                "session-a",
            )
            .await
            .unwrap();

        let update = a.recv().await.unwrap();
        assert_eq!(update.origin, "session-a");
        let update = b.recv().await.unwrap();
        assert!(matches!(update.value, FieldValue::BossId { id } if id == "the_sunspire"));
    }

    #[tokio::test]
    async fn test_subscribe_replays_recorded_origins() {
        let store = MemoryStore::new();
        store
            .write(
                "p1",
                FieldValue::BossId {
                    id: "the_sunspire".into(),
                },
                "session-a",
            )
            .await
            .unwrap();

        let mut rx = store.subscribe("p1").await.unwrap();
        let mut boss_origin = None;
        while let Ok(update) = rx.try_recv() {
            if matches!(update.value, FieldValue::BossId { .. }) {
                boss_origin = Some(update.origin);
            }
        }
        assert_eq!(boss_origin.as_deref(), Some("session-a"));
    }

    #[tokio::test]
    async fn test_fail_next_writes_rejects_then_recovers() {
        let store = MemoryStore::new();
        store.fail_next_writes(1).await;

        let value = FieldValue::BossId { id: "x".into() };
        let err = store.write("p1", value.clone(), "s").await.unwrap_err();
        assert!(matches!(err, StoreError::WriteRejected));
        assert_eq!(store.document("p1").await.boss_id, "");

        store.write("p1", value, "s").await.unwrap();
        assert_eq!(store.document("p1").await.boss_id, "x");
    }
}

//! File-backed document store
//!
//! One TOML file per plan under a plans directory. Writes are
//! load-modify-save on the whole document; change fan-out only reaches
//! subscribers in this process. Field origins are kept in memory, so a
//! fresh process replays history with unknown (empty) origins.

use hashbrown::HashMap;
use std::path::{Path, PathBuf};

use rampart_types::{DocumentField, FieldValue, PlanDocument};
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::store::{DocumentStore, RemoteUpdate, StoreError};

#[derive(Default)]
struct Inner {
    subscribers: HashMap<String, Vec<UnboundedSender<RemoteUpdate>>>,
    origins: HashMap<String, HashMap<DocumentField, String>>,
}

pub struct FileStore {
    dir: PathBuf,
    inner: Mutex<Inner>,
}

impl FileStore {
    /// Open (and create if needed) a plans directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            inner: Mutex::new(Inner::default()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn plan_path(&self, plan_id: &str) -> PathBuf {
        // plan ids come from user input; keep the file name tame
        let name: String = plan_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.toml"))
    }

    fn read_document(&self, plan_id: &str) -> Result<PlanDocument, StoreError> {
        let path = self.plan_path(plan_id);
        if !path.exists() {
            return Ok(PlanDocument::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        toml::from_str(&raw).map_err(|e| StoreError::Decode(Box::new(e)))
    }

    fn save_document(&self, plan_id: &str, doc: &PlanDocument) -> Result<(), StoreError> {
        let raw = toml::to_string_pretty(doc)?;
        std::fs::write(self.plan_path(plan_id), raw)?;
        Ok(())
    }
}

impl DocumentStore for FileStore {
    async fn write(
        &self,
        plan_id: &str,
        value: FieldValue,
        origin: &str,
    ) -> Result<(), StoreError> {
        self.write_partial(plan_id, vec![value], origin).await
    }

    async fn write_partial(
        &self,
        plan_id: &str,
        values: Vec<FieldValue>,
        origin: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let mut doc = self.read_document(plan_id)?;
        for value in &values {
            doc.apply(value);
        }
        self.save_document(plan_id, &doc)?;

        let origins = inner.origins.entry(plan_id.to_string()).or_default();
        for value in &values {
            origins.insert(value.field(), origin.to_string());
        }
        if let Some(senders) = inner.subscribers.get_mut(plan_id) {
            for value in values {
                let update = RemoteUpdate {
                    value,
                    origin: origin.to_string(),
                };
                senders.retain(|tx| tx.send(update.clone()).is_ok());
            }
        }
        Ok(())
    }

    async fn load(&self, plan_id: &str) -> Result<PlanDocument, StoreError> {
        let _guard = self.inner.lock().await;
        self.read_document(plan_id)
    }

    async fn subscribe(
        &self,
        plan_id: &str,
    ) -> Result<UnboundedReceiver<RemoteUpdate>, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().await;
        let doc = self.read_document(plan_id)?;
        let origins = inner.origins.get(plan_id).cloned().unwrap_or_default();

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
    use rampart_types::{AssignedMitigation, TankPosition};

    fn temp_store() -> FileStore {
        let dir = std::env::temp_dir().join(format!("rampart-plans-{}", uuid::Uuid::new_v4()));
        FileStore::open(dir).unwrap()
    }

    #[tokio::test]
    async fn test_write_then_load_round_trips() {
        let store = temp_store();
        let mut assignments = rampart_types::AssignmentMap::new();
        assignments.insert(
            "flame_lance_1".into(),
            vec![AssignedMitigation {
                ability_id: "rampart".into(),
                position: Some(TankPosition::MainTank),
                precast_secs: 2.0,
                caster_job: Some("WAR".into()),
                caster: None,
                written_by: "s1".into(),
                written_at: 1_000,
            }],
        );

        store
            .write(
                "demo",
                FieldValue::BossId {
                    id: "the_sunspire".into(),
                },
                "s1",
            )
            .await
            .unwrap();
        store
            .write("demo", FieldValue::Assignments { assignments }, "s1")
            .await
            .unwrap();

        let doc = store.load("demo").await.unwrap();
        assert_eq!(doc.boss_id, "the_sunspire");
        let rows = &doc.assignments["flame_lance_1"];
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ability_id, "rampart");
        assert_eq!(rows[0].position, Some(TankPosition::MainTank));

        std::fs::remove_dir_all(store.dir()).ok();
    }

    #[tokio::test]
    async fn test_missing_plan_loads_default() {
        let store = temp_store();
        let doc = store.load("never-written").await.unwrap();
        assert_eq!(doc, PlanDocument::default());
        std::fs::remove_dir_all(store.dir()).ok();
    }

    #[tokio::test]
    async fn test_writes_fan_out_in_process() {
        let store = temp_store();
        let mut rx = store.subscribe("demo").await.unwrap();
        while rx.try_recv().is_ok() {}

        store
            .write("demo", FieldValue::BossId { id: "x".into() }, "s1")
            .await
            .unwrap();
        let update = rx.recv().await.unwrap();
        assert_eq!(update.origin, "s1");
        assert!(matches!(update.value, FieldValue::BossId { id } if id == "x"));

        std::fs::remove_dir_all(store.dir()).ok();
    }
}

//! Document store interface
//!
//! The shared plan document lives behind an opaque key-addressable store:
//! writes land one field at a time, every subscriber (the writer included)
//! hears about each change, and each change carries the origin tag of the
//! session that wrote it. Delivery is at-least-once; consistency is strong
//! per field; there are no transactions across fields.

use rampart_types::{FieldValue, PlanDocument};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("write rejected by the store")]
    WriteRejected,
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode document: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("failed to decode document: {0}")]
    Decode(#[from] Box<toml::de::Error>),
}

/// One field change broadcast to subscribers
#[derive(Debug, Clone)]
pub struct RemoteUpdate {
    pub value: FieldValue,
    /// Session id of the writer; empty for replayed initial state with no
    /// recorded writer
    pub origin: String,
}

#[allow(async_fn_in_trait)]
pub trait DocumentStore: Send + Sync {
    /// Write one field, tagged with the writer's session id.
    fn write(
        &self,
        plan_id: &str,
        value: FieldValue,
        origin: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Write several fields in one call. Not atomic across fields; each
    /// field still lands (and broadcasts) individually.
    async fn write_partial(
        &self,
        plan_id: &str,
        values: Vec<FieldValue>,
        origin: &str,
    ) -> Result<(), StoreError>;

    /// Current document. A plan that was never written reads as default.
    async fn load(&self, plan_id: &str) -> Result<PlanDocument, StoreError>;

    /// Subscribe to every subsequent change on the plan, own writes
    /// included. The current document is replayed into the channel first,
    /// one update per field, so a fresh subscriber converges without a
    /// separate load.
    async fn subscribe(&self, plan_id: &str)
        -> Result<UnboundedReceiver<RemoteUpdate>, StoreError>;
}

pub mod availability;
pub mod catalog;
pub mod context;
pub mod mitigation;
pub mod plan;
mod serde_defaults;
pub mod session;
pub mod sync;
pub mod timeline;

// Shared document types, re-exported for downstream crates
pub use rampart_types::{
    AssignedMitigation, AssignmentMap, DocumentField, FieldValue, HealthSettings, JobClaims,
    JobSelection, PlanDocument, Presence, SelectedJobs, TankPosition, TankPositions,
};

// Re-exports for convenience
pub use availability::{AvailabilityResolver, AvailabilityResult};
pub use catalog::{AbilityCatalog, AbilityDefinition, CatalogError, Job, Role};
pub use context::{AppConfig, ConfigError, Libraries, LibraryError};
pub use mitigation::{ActiveEffectResolver, ActiveMitigation};
pub use plan::{AssignmentStore, PlanState};
pub use session::{MitigationSummary, PlanSession, SessionError, SessionStatus};
pub use sync::{FileStore, MemoryStore, SyncEngine, SyncNotice, SyncState};
pub use timeline::{BossAction, DamageType, EncounterLibrary, Timeline, TimelineError};

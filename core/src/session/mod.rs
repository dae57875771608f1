//! Live plan sessions
//!
//! [`PlanSession`] is the one entry point frontends talk to: it owns the
//! catalog and encounter lookups, validates every edit against availability
//! before it lands, and drives the sync engine underneath.

mod plan_session;


pub use plan_session::{MitigationSummary, PlanSession, SessionError, SessionStatus};

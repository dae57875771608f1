//! Plan state
//!
//! The assignment store and the session's working copy of a plan document.

mod state;
mod store;

#[cfg(test)]
mod store_tests;

pub use state::PlanState;
pub use store::AssignmentStore;

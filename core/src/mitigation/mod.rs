//! Mitigation effects
//!
//! Resolution of which effects cover a boss action and the stacking math
//! over them.

mod active;
mod math;


pub use active::{ActiveEffectResolver, ActiveMitigation};
pub use math::{
    barrier_amount, healing_amount, total_barrier, total_mitigation, TICK_INTERVAL_SECS,
};

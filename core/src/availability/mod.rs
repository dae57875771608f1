//! Ability availability
//!
//! Everything that answers whether an ability has a free use at a point on
//! the timeline:
//!
//! ```text
//!   AvailabilityResolver::check(ability, time, target_action)
//!        │
//!        ├── charges::available_charges       recharging uses, one track
//!        ├── instances::available_instances   one track per capable caster
//!        └── stacks::stacks_at                shared consumable pool
//! ```
//!
//! The trackers are pure functions over sorted use times; the resolver
//! collects prior uses out of the assignment map and owns nothing.

mod charges;
mod instances;
mod resolver;
mod stacks;

#[cfg(test)]
mod resolver_tests;

pub use charges::available_charges;
pub use instances::{available_instances, free_casters};
pub use resolver::{AvailabilityResolver, AvailabilityResult};
pub use stacks::{sort_stack_events, stacks_at, StackCache, StackEvent, StackEventKind};

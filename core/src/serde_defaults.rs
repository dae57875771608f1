//! Common serde default value functions
//!
//! Used across ability and encounter definitions to avoid duplication.

/// Default acquisition level for abilities without one
pub fn default_level_one() -> u8 {
    1
}

/// Default hit count for boss actions (single hit)
pub fn default_hit_count() -> u8 {
    1
}

/// Default pooled-resource capacity
pub fn default_stack_capacity() -> u8 {
    3
}

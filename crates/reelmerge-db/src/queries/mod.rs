//! Database query modules.
//!
//! - canonical: Canonical record reads and field-level delta application
//! - merge_log: Append-only audit trail of applied decisions

pub mod canonical;
pub mod merge_log;

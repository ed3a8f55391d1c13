//! Reelmerge - Metadata reconciliation engine
//!
//! Merges per-provider metadata for media files into one canonical record per
//! content key, choosing each field's value with a per-field merge strategy.
//! This library crate exposes the engine and its collaborators for the binary
//! and for integration testing.

pub mod cache;
pub mod config;
pub mod normalize;
pub mod policy;
pub mod providers;
pub mod reconcile;
pub mod select;
pub mod source;
pub mod store;
pub mod worker;

pub use reconcile::{apply_decisions, reconcile};
pub use select::choose_result;

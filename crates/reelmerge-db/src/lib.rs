//! Reelmerge-DB: Database schema, migrations, and query operations
//!
//! This crate persists canonical records for reelmerge using SQLite with
//! rusqlite and r2d2 connection pooling. Records are stored one row per
//! content key plus one row per (content key, field), so deltas land as
//! field-level upserts instead of whole-row overwrites.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Canonical records, merge decisions, and audit log entries
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use reelmerge_common::ContentKey;
//! use reelmerge_db::pool::{init_pool, get_conn};
//! use reelmerge_db::queries::canonical;
//!
//! let pool = init_pool("/var/lib/reelmerge/reelmerge.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let record = canonical::get_record(&conn, &ContentKey::new("9f86d0")).unwrap();
//! println!("Known fields: {:?}", record.map(|r| r.fields.len()));
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

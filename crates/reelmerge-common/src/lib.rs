//! Reelmerge-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across reelmerge:
//!
//! - **Typed IDs**: The content-addressed [`ContentKey`] that joins every data source
//! - **Providers**: The closed [`ProviderId`] set with its fixed priority ranking
//! - **Core Types**: Media kinds shared by fetchers and the store
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use reelmerge_common::{ContentKey, ProviderId, Error, Result};
//!
//! let key = ContentKey::new("9f86d081884c7d65");
//! assert_eq!(key.as_str(), "9f86d081884c7d65");
//!
//! // Earlier providers win every tie-break.
//! assert!(ProviderId::Tmdb.rank() < ProviderId::Tvmaze.rank());
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("canonical record"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod ids;
pub mod provider;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use provider::ProviderId;
pub use types::*;

//! sister-board/crates/sb-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Sister-Board:
//! models, port traits, and the background maintenance jobs.

pub mod error;
pub mod jobs;
pub mod models;
pub mod traits;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;

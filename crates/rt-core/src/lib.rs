//! rusty-turk/crates/rt-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Rusty-Turk.

pub mod error;
pub mod ingest;
pub mod models;
pub mod service;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use service::AnnotationService;
pub use traits::*;

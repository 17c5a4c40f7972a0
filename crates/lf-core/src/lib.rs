//! lf-core: shared types, errors, and configuration.
//!
//! This crate is the foundational dependency for all other lf-* crates,
//! providing the unified error type, run configuration, course and ladder
//! types, and the transcode job/result descriptors.

pub mod config;
pub mod error;
pub mod job;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use job::*;
pub use media::*;

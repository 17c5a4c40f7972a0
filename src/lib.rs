//! ladderforge - batch HLS rendition ladder transcoder
//!
//! This library crate exposes the configuration loader for the binary and for
//! integration testing. The pipeline itself lives in the `lf-*` crates.

pub mod config;

pub use lf_core::{Error, JobResult, LadderMode, TranscodeJob};
pub use lf_pipeline::{BatchScheduler, Plan, RunReport};

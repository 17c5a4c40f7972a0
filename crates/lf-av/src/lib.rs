//! # lf-av
//!
//! External encoder plumbing for the ladderforge pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache the path to
//!   ffmpeg.
//! - **Command execution** ([`ToolCommand`]) -- async builder with optional
//!   timeout for running external processes.
//! - **Process capability** ([`ProcessExecutor`]) -- the injectable seam the
//!   scheduler dispatches through, with [`SystemExecutor`] and
//!   [`DryRunExecutor`] implementations.
//! - **Encode profiles** ([`EncodeProfileBuilder`]) -- turn a source video and
//!   a rendition ladder into fully resolved transcode jobs.

pub mod command;
pub mod executor;
pub mod profile;
pub mod tools;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use executor::{DryRunExecutor, ProcessExecutor, ProcessOutput, SystemExecutor};
pub use profile::{variant_stream_map, EncodeProfileBuilder, MASTER_PLAYLIST, STREAM_PLAYLIST};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};

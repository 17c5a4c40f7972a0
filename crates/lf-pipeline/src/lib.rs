//! # lf-pipeline
//!
//! Orchestration of batch HLS transcodes.
//!
//! This crate provides:
//!
//! - **[`CourseDiscovery`]** -- lists course directories under the input root
//!   and the eligible source videos inside each.
//! - **[`OutputLayout`]** -- idempotent creation of the directories a job
//!   writes into.
//! - **[`BatchScheduler`]** -- runs jobs in fixed-size concurrent windows with
//!   per-job failure isolation, progress reporting and cancellation.
//! - **[`plan`] / [`execute`] / [`run`]** -- entry functions taking an
//!   injected [`Config`](lf_core::config::Config).

pub mod discovery;
pub mod layout;
pub mod progress;
pub mod run;
pub mod scheduler;

// Re-export key types at the crate root.
pub use discovery::{CourseDiscovery, CourseFailure, CourseListing, DiscoveryReport};
pub use layout::OutputLayout;
pub use progress::ProgressSender;
pub use run::{execute, plan, plan_from_report, run, Plan, RunReport};
pub use scheduler::{partition, BatchFailure, BatchOutcome, BatchScheduler};

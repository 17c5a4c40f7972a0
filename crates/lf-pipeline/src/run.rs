//! Entry points tying discovery, planning and scheduling together.
//!
//! Each stage is callable on its own: [`plan`] has no side effects, and
//! [`execute`] runs an already-built [`Plan`] through a [`BatchScheduler`].

use std::collections::HashSet;
use std::path::PathBuf;

use lf_av::EncodeProfileBuilder;
use lf_core::config::Config;
use lf_core::{Error, JobResult, LadderMode, Result, TranscodeJob};
use serde::{Deserialize, Serialize};

use crate::discovery::{CourseDiscovery, CourseFailure, DiscoveryReport};
use crate::scheduler::{BatchFailure, BatchScheduler};

/// The full, resolved job list for a run.
#[derive(Debug, Clone)]
pub struct Plan {
    pub mode: LadderMode,
    pub courses: usize,
    pub videos: usize,
    pub jobs: Vec<TranscodeJob>,
    /// Courses and inputs that were skipped while planning.
    pub failures: Vec<CourseFailure>,
}

/// Discover inputs under `config.input_root` and build every job.
///
/// `program` is the encoder executable written into each command.
///
/// # Errors
///
/// Fails when the configuration is invalid or the input root cannot be
/// listed. Per-course problems are recorded in [`Plan::failures`].
pub fn plan(config: &Config, program: PathBuf) -> Result<Plan> {
    config.validate()?;
    let builder = EncodeProfileBuilder::new(program, config.ladder()?, config.encode.clone());
    let report = CourseDiscovery::from_config(config).scan()?;
    Ok(plan_from_report(&builder, report))
}

/// Build jobs for an existing discovery report.
///
/// Two inputs that would write the same outputs (for example `intro.mp4` and
/// `intro.MP4` in one course) produce identical job ids; only the first is
/// kept and the later one is recorded as a failure.
pub fn plan_from_report(builder: &EncodeProfileBuilder, report: DiscoveryReport) -> Plan {
    let mut failures = report.failures;
    let mut jobs = Vec::new();
    let mut seen = HashSet::new();
    let courses = report.listings.len();
    let mut videos = 0;

    for listing in &report.listings {
        for source in &listing.videos {
            let built = builder.build(&listing.course, source);
            if let Some(clash) = built.iter().find(|job| seen.contains(&job.id)) {
                let error = Error::discovery(
                    &source.path,
                    format!("outputs collide with an earlier input ({})", clash.id),
                );
                tracing::warn!("Skipping {source}: {error}");
                failures.push(CourseFailure::new(&source.course, &source.path, &error));
                continue;
            }
            videos += 1;
            seen.extend(built.iter().map(|job| job.id.clone()));
            jobs.extend(built);
        }
    }

    tracing::info!(
        "Planned {} job(s) for {videos} video(s) in {courses} course(s) [{}]",
        jobs.len(),
        builder.ladder().mode()
    );

    Plan {
        mode: builder.ladder().mode(),
        courses,
        videos,
        jobs,
        failures,
    }
}

/// Summary of a completed run, serializable for `--report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub mode: LadderMode,
    pub courses: usize,
    pub videos: usize,
    pub jobs_total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub course_failures: Vec<CourseFailure>,
    pub batch_failures: Vec<BatchFailure>,
    pub results: Vec<JobResult>,
}

impl RunReport {
    /// True when every course was listed and every job succeeded.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.course_failures.is_empty() && !self.cancelled
    }
}

/// Run a plan to completion.
pub async fn execute(plan: Plan, scheduler: &BatchScheduler) -> RunReport {
    let outcome = scheduler.run(&plan.jobs).await;
    let report = RunReport {
        mode: plan.mode,
        courses: plan.courses,
        videos: plan.videos,
        jobs_total: plan.jobs.len(),
        succeeded: outcome.succeeded(),
        failed: outcome.failed(),
        cancelled: outcome.cancelled,
        course_failures: plan.failures,
        batch_failures: outcome.batch_failures,
        results: outcome.results,
    };

    tracing::info!(
        "Run finished: {} succeeded, {} failed, {} course failure(s)",
        report.succeeded,
        report.failed,
        report.course_failures.len()
    );
    report
}

/// Plan and execute in one call.
pub async fn run(
    config: &Config,
    program: PathBuf,
    scheduler: &BatchScheduler,
) -> Result<RunReport> {
    let plan = plan(config, program)?;
    Ok(execute(plan, scheduler).await)
}

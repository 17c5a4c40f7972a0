mod cli;

use ladderforge::config;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, Overrides};
use lf_av::{DryRunExecutor, ProcessExecutor, SystemExecutor, ToolRegistry};
use lf_core::config::Config;
use lf_pipeline::{BatchScheduler, ProgressSender, RunReport};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Exit status when the run finished but some job or course failed.
const EXIT_PARTIAL_FAILURE: u8 = 2;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "ladderforge=trace,lf_pipeline=trace,lf_av=trace,lf_core=trace".to_string()
        } else {
            "ladderforge=info,lf_pipeline=info,lf_av=info,lf_core=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            overrides,
            dry_run,
            report,
        } => {
            let config = resolve_config(cli.config.as_deref(), &overrides)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_batch(config, dry_run, report.as_deref()))
        }
        Commands::Plan {
            overrides,
            commands,
            json,
        } => {
            let config = resolve_config(cli.config.as_deref(), &overrides)?;
            show_plan(&config, commands, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::CheckTools => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            check_tools(&config)
        }
        Commands::Validate { file } => {
            let path = file.or(cli.config);
            validate_config(path.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version => {
            println!("ladderforge {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Load the config file and layer command-line overrides on top.
fn resolve_config(path: Option<&Path>, overrides: &Overrides) -> Result<Config> {
    let mut config = config::load_config_or_default(path)?;
    overrides.apply(&mut config);
    config::check_config(&config)?;
    Ok(config)
}

async fn run_batch(config: Config, dry_run: bool, report_path: Option<&Path>) -> Result<ExitCode> {
    let tools = ToolRegistry::discover(&config.tools);

    let executor: Arc<dyn ProcessExecutor> = if dry_run {
        Arc::new(DryRunExecutor)
    } else {
        tools.require("ffmpeg")?;
        Arc::new(SystemExecutor::new().with_timeout(config.encode.timeout()))
    };

    let cancellation = CancellationToken::new();
    let on_signal = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing the current window");
            on_signal.cancel();
        }
    });

    let scheduler = BatchScheduler::new(config.batch.window_size, executor)?
        .with_layout(!dry_run)
        .with_cancellation(cancellation)
        .with_progress(ProgressSender::new(|done, total| {
            tracing::info!("Progress: {done}/{total} job(s) finished");
        }));

    tracing::info!(
        "Transcoding {} -> {} ({} mode, window {})",
        config.input_root.display(),
        config.output_root.display(),
        config.encode.mode,
        scheduler.window_size()
    );

    let report = lf_pipeline::run(&config, tools.program("ffmpeg"), &scheduler)
        .await
        .context("Batch run failed")?;

    print_summary(&report);

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {:?}", path))?;
        println!("Report written to {}", path.display());
    }

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_PARTIAL_FAILURE))
    }
}

fn print_summary(report: &RunReport) {
    println!(
        "\n{} job(s): {} succeeded, {} failed",
        report.jobs_total, report.succeeded, report.failed
    );

    for failure in &report.course_failures {
        println!("  ✗ {} ({}): {}", failure.course, failure.path.display(), failure.message);
    }
    for result in report.results.iter().filter(|r| !r.success) {
        println!(
            "  ✗ {}: {}",
            result.description,
            result.error.as_deref().unwrap_or("unknown error")
        );
        if let Some(line) = result.stderr.lines().rev().find(|l| !l.trim().is_empty()) {
            println!("      {}", line.trim());
        }
    }
    if report.cancelled {
        println!("Run was cancelled; remaining jobs were not started.");
    }
}

fn show_plan(config: &Config, commands: bool, json: bool) -> Result<()> {
    let tools = ToolRegistry::discover(&config.tools);
    let plan = lf_pipeline::plan(config, tools.program("ffmpeg"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan.jobs)?);
        return Ok(());
    }

    println!(
        "{} job(s) for {} video(s) in {} course(s) [{} mode]",
        plan.jobs.len(),
        plan.videos,
        plan.courses,
        plan.mode
    );

    for job in &plan.jobs {
        println!("\n{}", job.id);
        if let Some(master) = &job.master_playlist {
            println!("  master:   {}", master.display());
        }
        for playlist in &job.playlists {
            println!("  playlist: {}", playlist.display());
        }
        if commands {
            println!("  $ {}", job.command.to_shell_string());
        }
    }

    for failure in &plan.failures {
        println!("\n✗ skipped {}: {}", failure.course, failure.message);
    }

    Ok(())
}

fn check_tools(config: &Config) -> Result<ExitCode> {
    println!("Checking external tools...\n");

    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Some tools are missing. Install ffmpeg to run transcodes.");
        Ok(ExitCode::FAILURE)
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            config::load_config_or_default(None)?
        }
    };

    let ladder = config.ladder()?;
    println!("✓ Configuration is valid");
    println!("  Input root: {}", config.input_root.display());
    println!("  Output root: {}", config.output_root.display());
    println!("  Window size: {}", config.batch.window_size);
    println!("  Mode: {}", ladder.mode());
    println!("  Segment duration: {}s", config.encode.segment_duration());
    println!("  Renditions: {}", ladder.labels().join(", "));

    let warnings = config.warnings();
    if !warnings.is_empty() {
        println!("  Warnings:");
        for warning in warnings {
            println!("    - {warning}");
        }
    }

    Ok(())
}

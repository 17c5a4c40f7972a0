use clap::{Args, Parser, Subcommand};
use lf_core::config::Config;
use lf_core::LadderMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ladderforge")]
#[command(author, version, about = "Batch HLS rendition ladder transcoder")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover courses and transcode every video into HLS renditions
    Run {
        #[command(flatten)]
        overrides: Overrides,

        /// Log each encoder command instead of running it
        #[arg(long)]
        dry_run: bool,

        /// Write a JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show the jobs a run would execute without running anything
    Plan {
        #[command(flatten)]
        overrides: Overrides,

        /// Print the full encoder command line for each job
        #[arg(long)]
        commands: bool,

        /// Output the job list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        #[arg(value_name = "CONFIG")]
        file: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

/// Command-line values that take precedence over the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Input root containing one directory per course
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output root for rendered playlists and segments
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of encoder processes to run at once
    #[arg(short, long)]
    pub window: Option<usize>,

    /// Ladder mode: cpu or gpu
    #[arg(short, long)]
    pub mode: Option<LadderMode>,
}

impl Overrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.input_root = input.clone();
        }
        if let Some(output) = &self.output {
            config.output_root = output.clone();
        }
        if let Some(window) = self.window {
            config.batch.window_size = window;
        }
        if let Some(mode) = self.mode {
            config.encode.mode = mode;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "ladderforge",
            "run",
            "--input",
            "courses",
            "--window",
            "5",
            "--mode",
            "gpu",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                overrides, dry_run, ..
            } => {
                assert!(dry_run);
                assert_eq!(overrides.window, Some(5));
                assert_eq!(overrides.mode, Some(LadderMode::GpuFanOut));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn overrides_take_precedence() {
        let mut config = Config::default();
        Overrides {
            input: Some("in".into()),
            output: None,
            window: Some(8),
            mode: Some(LadderMode::GpuFanOut),
        }
        .apply(&mut config);

        assert_eq!(config.input_root, PathBuf::from("in"));
        assert_eq!(config.output_root, PathBuf::from("output"));
        assert_eq!(config.batch.window_size, 8);
        assert_eq!(config.encode.mode, LadderMode::GpuFanOut);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["ladderforge", "plan", "--mode", "quantum"]).is_err());
    }
}

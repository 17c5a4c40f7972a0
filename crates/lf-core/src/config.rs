//! Run configuration types.
//!
//! The top-level [`Config`] is deserialized from TOML and carries everything a
//! batch run needs: input/output roots, the batch window, discovery filters,
//! encoder settings, and the rendition ladder. Every section defaults
//! sensibly so a completely empty file is valid and reproduces the CPU ladder.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::media::{profile_level_for_label, LadderMode, RenditionLadder, RenditionSpec, Resolution};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub batch: BatchConfig,
    pub discovery: DiscoveryConfig,
    pub encode: EncodeConfig,
    /// Custom ladder; when absent the default ladder for `encode.mode` is used.
    pub ladder: Option<LadderConfig>,
    pub tools: ToolsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("input"),
            output_root: PathBuf::from("output"),
            batch: BatchConfig::default(),
            discovery: DiscoveryConfig::default(),
            encode: EncodeConfig::default(),
            ladder: None,
            tools: ToolsConfig::default(),
        }
    }
}

impl Config {
    /// Deserialize a `Config` from a TOML string.
    ///
    /// The caller decides where the string comes from (file, embedded, test).
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::config(format!("config parse error: {e}")))
    }

    /// Resolve the rendition ladder for the configured mode.
    pub fn ladder(&self) -> Result<RenditionLadder> {
        match &self.ladder {
            Some(ladder) => ladder.build(self.encode.mode),
            None => Ok(RenditionLadder::default_for(self.encode.mode)),
        }
    }

    /// Check for problems that make a run impossible.
    pub fn validate(&self) -> Result<()> {
        if self.batch.window_size == 0 {
            return Err(Error::config("batch.window_size must be at least 1"));
        }
        if self.discovery.extensions.is_empty() {
            return Err(Error::config("discovery.extensions cannot be empty"));
        }
        if self.encode.gop_size == 0 {
            return Err(Error::config("encode.gop_size must be at least 1"));
        }
        if self.encode.keyframe_interval == 0 {
            return Err(Error::config("encode.keyframe_interval must be at least 1"));
        }
        if self.encode.segment_duration() == 0 {
            return Err(Error::config("encode.segment_duration must be at least 1"));
        }
        if self.encode.segment_extension.trim().is_empty() {
            return Err(Error::config("encode.segment_extension cannot be empty"));
        }
        self.ladder()?;
        Ok(())
    }

    /// Return a list of non-fatal configuration warnings.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.input_root == self.output_root {
            warnings.push("input_root and output_root are the same directory".into());
        }

        if let Ok(ladder) = self.ladder() {
            if ladder.mode() == LadderMode::GpuFanOut {
                for rung in ladder.rungs() {
                    if rung.maxrate.is_none() || rung.bufsize.is_none() {
                        warnings.push(format!(
                            "ladder rung '{}' has no maxrate/bufsize; the encoder default applies",
                            rung.label
                        ));
                    }
                }
            } else if ladder.rungs().iter().any(|r| r.maxrate.is_some()) {
                warnings.push("ladder maxrates/bufsizes are ignored in cpu mode".into());
            }
        }

        if self.encode.mode == LadderMode::Cpu && self.encode.hwaccel.is_some() {
            warnings.push("encode.hwaccel is ignored in cpu mode".into());
        }

        if self.encode.keyframe_interval > self.encode.segment_duration() {
            warnings.push(format!(
                "encode.keyframe_interval ({}s) exceeds segment duration ({}s); segments will be uneven",
                self.encode.keyframe_interval,
                self.encode.segment_duration()
            ));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Scheduler window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of encoder processes allowed to run at once.
    pub window_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { window_size: 3 }
    }
}

/// Source file filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Allowed container extensions, matched case-insensitively, without dot.
    pub extensions: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["mp4".into()],
        }
    }
}

/// Encoder settings shared by every job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    pub mode: LadderMode,
    /// HLS segment length in seconds; defaults to 4 (cpu) or 10 (gpu).
    pub segment_duration: Option<u32>,
    /// Keyframe spacing in frames for cpu encodes (`-g` / `-keyint_min`).
    pub gop_size: u32,
    /// Forced keyframe period in seconds for cpu encodes.
    pub keyframe_interval: u32,
    pub cpu_codec: String,
    pub cpu_preset: String,
    pub gpu_codec: String,
    pub gpu_preset: String,
    pub audio_codec: String,
    pub audio_channels: u32,
    pub segment_extension: String,
    /// Hardware decoder for gpu mode; unset means `cuda`, `"none"` decodes
    /// in software. Only `cuda` keeps frames on the GPU (scaled with
    /// `scale_cuda`); any other decoder returns frames to system memory.
    pub hwaccel: Option<String>,
    /// Per-process timeout; `None` lets an encode run indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            mode: LadderMode::Cpu,
            segment_duration: None,
            gop_size: 4,
            keyframe_interval: 4,
            cpu_codec: "libx264".into(),
            cpu_preset: "veryfast".into(),
            gpu_codec: "h264_nvenc".into(),
            gpu_preset: "fast".into(),
            audio_codec: "aac".into(),
            audio_channels: 2,
            segment_extension: "ts".into(),
            hwaccel: None,
            timeout_secs: None,
        }
    }
}

impl EncodeConfig {
    /// Effective segment duration in seconds.
    pub fn segment_duration(&self) -> u32 {
        self.segment_duration.unwrap_or(match self.mode {
            LadderMode::Cpu => 4,
            LadderMode::GpuFanOut => 10,
        })
    }

    /// Effective hardware decoder. Always `None` in cpu mode.
    pub fn hwaccel(&self) -> Option<&str> {
        match self.mode {
            LadderMode::Cpu => None,
            LadderMode::GpuFanOut => match self.hwaccel.as_deref() {
                None => Some("cuda"),
                Some("none") | Some("") => None,
                Some(other) => Some(other),
            },
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// A ladder written as parallel arrays; index `i` of every array is rung `i`.
///
/// `labels`, `resolutions` and `video_bitrates` are required. The remaining
/// arrays may be left empty (defaults apply) but, when given, must have the
/// same length as `labels`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderConfig {
    pub labels: Vec<String>,
    pub resolutions: Vec<String>,
    pub video_bitrates: Vec<String>,
    pub maxrates: Vec<String>,
    pub bufsizes: Vec<String>,
    pub audio_bitrates: Vec<String>,
    pub profiles: Vec<String>,
    pub levels: Vec<String>,
}

impl LadderConfig {
    /// Zip the arrays into a [`RenditionLadder`].
    pub fn build(&self, mode: LadderMode) -> Result<RenditionLadder> {
        let n = self.labels.len();
        let required = [
            ("resolutions", self.resolutions.len()),
            ("video_bitrates", self.video_bitrates.len()),
        ];
        for (name, len) in required {
            if len != n {
                return Err(Error::config(format!(
                    "ladder.{name} has {len} entries but ladder.labels has {n}"
                )));
            }
        }
        let optional = [
            ("maxrates", self.maxrates.len()),
            ("bufsizes", self.bufsizes.len()),
            ("audio_bitrates", self.audio_bitrates.len()),
            ("profiles", self.profiles.len()),
            ("levels", self.levels.len()),
        ];
        for (name, len) in optional {
            if len != 0 && len != n {
                return Err(Error::config(format!(
                    "ladder.{name} has {len} entries but ladder.labels has {n}"
                )));
            }
        }
        if self.maxrates.is_empty() != self.bufsizes.is_empty() {
            return Err(Error::config(
                "ladder.maxrates and ladder.bufsizes must be given together",
            ));
        }

        let rungs = (0..n)
            .map(|i| {
                let label = self.labels[i].clone();
                let resolution: Resolution = self.resolutions[i].parse()?;
                let (rule_profile, rule_level) = profile_level_for_label(&label);
                Ok(RenditionSpec {
                    resolution,
                    video_bitrate: self.video_bitrates[i].clone(),
                    maxrate: self.maxrates.get(i).cloned(),
                    bufsize: self.bufsizes.get(i).cloned(),
                    audio_bitrate: self
                        .audio_bitrates
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| "128k".into()),
                    profile: self
                        .profiles
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| rule_profile.into()),
                    level: self
                        .levels
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| rule_level.into()),
                    label,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        RenditionLadder::new(mode, rungs)
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
}

//! Media-domain types: courses, source videos, and rendition ladders.
//!
//! Courses and source videos are immutable value records produced by
//! discovery. A [`RenditionLadder`] is an ordered set of [`RenditionSpec`]
//! rungs; the order is whatever the caller declared and is never re-sorted.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Course / SourceVideo
// ---------------------------------------------------------------------------

/// A collection of source videos: one directory under the input root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Course {
    /// Directory name under the input root.
    pub name: String,
    /// `<input_root>/<name>`.
    pub input_dir: PathBuf,
    /// `<output_root>/<name>`.
    pub output_dir: PathBuf,
}

impl Course {
    pub fn new(name: impl Into<String>, input_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            name: name.into(),
            input_dir,
            output_dir,
        }
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A source video file belonging to exactly one [`Course`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceVideo {
    /// Name of the owning course.
    pub course: String,
    /// File name including extension (`intro.mp4`).
    pub file_name: String,
    /// File name without extension (`intro`).
    pub stem: String,
    /// Absolute path to the file.
    pub path: PathBuf,
}

impl fmt::Display for SourceVideo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.course, self.file_name)
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Target frame size, written `WIDTHxHEIGHT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| Error::config(format!("resolution '{s}' is not WIDTHxHEIGHT")))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| Error::config(format!("resolution '{s}' has an invalid dimension")))
        };
        Ok(Self::new(parse(w)?, parse(h)?))
    }
}

impl TryFrom<String> for Resolution {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Resolution> for String {
    fn from(r: Resolution) -> Self {
        r.to_string()
    }
}

// ---------------------------------------------------------------------------
// LadderMode
// ---------------------------------------------------------------------------

/// How a ladder is turned into encoder invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LadderMode {
    /// One independent software encode per rung.
    #[default]
    Cpu,
    /// One hardware encode that splits the decoded stream into every rung.
    #[serde(alias = "gpu")]
    GpuFanOut,
}

impl fmt::Display for LadderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::GpuFanOut => write!(f, "gpu_fan_out"),
        }
    }
}

impl FromStr for LadderMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "gpu" | "gpu_fan_out" | "gpu-fan-out" => Ok(Self::GpuFanOut),
            other => Err(Error::config(format!(
                "unknown ladder mode '{other}' (expected cpu or gpu)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// RenditionSpec / RenditionLadder
// ---------------------------------------------------------------------------

/// One rung of an adaptive-bitrate ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionSpec {
    /// Output label used in file names (`720p`).
    pub label: String,
    pub resolution: Resolution,
    /// Target video bitrate in ffmpeg notation (`2500k`).
    pub video_bitrate: String,
    /// Peak bitrate; only emitted in GPU mode.
    pub maxrate: Option<String>,
    /// Rate-control buffer; only emitted in GPU mode.
    pub bufsize: Option<String>,
    pub audio_bitrate: String,
    /// H.264 profile (`main`, `high`).
    pub profile: String,
    /// H.264 level (`3.1`, `4.2`, `5.1`).
    pub level: String,
}

/// Codec profile and level for a rung label.
///
/// Higher-quality rungs get a higher profile/level; unknown labels fall back
/// to the baseline-friendly `main`/`3.1` pair.
pub fn profile_level_for_label(label: &str) -> (&'static str, &'static str) {
    match label {
        "2160p" => ("high", "5.1"),
        "1440p" => ("high", "5.0"),
        "1080p" => ("high", "4.2"),
        _ => ("main", "3.1"),
    }
}

impl RenditionSpec {
    /// Build a rung whose profile/level follow [`profile_level_for_label`].
    pub fn new(
        label: impl Into<String>,
        resolution: Resolution,
        video_bitrate: impl Into<String>,
        audio_bitrate: impl Into<String>,
    ) -> Self {
        let label = label.into();
        let (profile, level) = profile_level_for_label(&label);
        Self {
            label,
            resolution,
            video_bitrate: video_bitrate.into(),
            maxrate: None,
            bufsize: None,
            audio_bitrate: audio_bitrate.into(),
            profile: profile.to_string(),
            level: level.to_string(),
        }
    }

    /// Builder: attach GPU rate-control limits.
    pub fn with_rate_control(
        mut self,
        maxrate: impl Into<String>,
        bufsize: impl Into<String>,
    ) -> Self {
        self.maxrate = Some(maxrate.into());
        self.bufsize = Some(bufsize.into());
        self
    }
}

/// An ordered, non-empty set of renditions plus the mode used to encode them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionLadder {
    mode: LadderMode,
    rungs: Vec<RenditionSpec>,
}

impl RenditionLadder {
    /// Create a ladder, rejecting empty ladders and duplicate labels.
    ///
    /// Labels name output files, so two rungs sharing a label would write
    /// into the same playlist.
    pub fn new(mode: LadderMode, rungs: Vec<RenditionSpec>) -> Result<Self> {
        if rungs.is_empty() {
            return Err(Error::config("ladder must have at least one rung"));
        }
        let mut seen = HashSet::new();
        for rung in &rungs {
            if rung.label.trim().is_empty() {
                return Err(Error::config("ladder rung label cannot be empty"));
            }
            if !seen.insert(rung.label.as_str()) {
                return Err(Error::config(format!(
                    "duplicate ladder label '{}'",
                    rung.label
                )));
            }
        }
        Ok(Self { mode, rungs })
    }

    /// Software ladder: 720p / 1080p / 2160p, 128k stereo audio on every rung.
    pub fn cpu_default() -> Self {
        Self {
            mode: LadderMode::Cpu,
            rungs: vec![
                RenditionSpec::new("720p", Resolution::new(1280, 720), "1200k", "128k"),
                RenditionSpec::new("1080p", Resolution::new(1920, 1080), "2500k", "128k"),
                RenditionSpec::new("2160p", Resolution::new(3840, 2160), "8000k", "128k"),
            ],
        }
    }

    /// Hardware fan-out ladder: 1080p / 720p / 480p with capped rates.
    pub fn gpu_default() -> Self {
        Self {
            mode: LadderMode::GpuFanOut,
            rungs: vec![
                RenditionSpec::new("1080p", Resolution::new(1920, 1080), "5000k", "192k")
                    .with_rate_control("5350k", "7500k"),
                RenditionSpec::new("720p", Resolution::new(1280, 720), "2800k", "128k")
                    .with_rate_control("2996k", "4200k"),
                RenditionSpec::new("480p", Resolution::new(854, 480), "1400k", "96k")
                    .with_rate_control("1498k", "2100k"),
            ],
        }
    }

    /// Default ladder for a mode.
    pub fn default_for(mode: LadderMode) -> Self {
        match mode {
            LadderMode::Cpu => Self::cpu_default(),
            LadderMode::GpuFanOut => Self::gpu_default(),
        }
    }

    pub fn mode(&self) -> LadderMode {
        self.mode
    }

    pub fn rungs(&self) -> &[RenditionSpec] {
        &self.rungs
    }

    pub fn len(&self) -> usize {
        self.rungs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rungs.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rungs.iter().map(|r| r.label.as_str()).collect()
    }
}

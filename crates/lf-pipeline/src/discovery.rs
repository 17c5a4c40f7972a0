//! Course and source-video discovery.
//!
//! The input root holds one directory per course; each course directory holds
//! the source videos directly (no recursion). Listing is read-only and
//! ordered by name so planning is reproducible.

use std::path::{Path, PathBuf};

use lf_core::config::Config;
use lf_core::{Course, Error, Result, SourceVideo};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

/// A course together with the videos found in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseListing {
    pub course: Course,
    pub videos: Vec<SourceVideo>,
}

/// An input that was skipped during discovery or planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseFailure {
    /// Course name.
    pub course: String,
    /// Directory or file that caused the failure.
    pub path: PathBuf,
    /// Error category (see [`Error::kind`]).
    pub kind: String,
    pub message: String,
}

impl CourseFailure {
    pub fn new(course: impl Into<String>, path: impl Into<PathBuf>, error: &Error) -> Self {
        Self {
            course: course.into(),
            path: path.into(),
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Everything discovery found, plus the courses it had to skip.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    pub listings: Vec<CourseListing>,
    pub failures: Vec<CourseFailure>,
}

impl DiscoveryReport {
    /// Total number of source videos across all listed courses.
    pub fn video_count(&self) -> usize {
        self.listings.iter().map(|l| l.videos.len()).sum()
    }
}

/// Walks the input root for courses and eligible source videos.
#[derive(Debug, Clone)]
pub struct CourseDiscovery {
    input_root: PathBuf,
    output_root: PathBuf,
    /// Lower-cased, without leading dots.
    extensions: Vec<String>,
}

impl CourseDiscovery {
    pub fn new(
        input_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        extensions: &[String],
    ) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.input_root,
            &config.output_root,
            &config.discovery.extensions,
        )
    }

    pub fn input_root(&self) -> &Path {
        &self.input_root
    }

    /// List course directories under the input root, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Discovery`] if the root is missing, is not a
    /// directory, or cannot be read. This is a run-level failure.
    pub fn list_courses(&self) -> Result<Vec<Course>> {
        if !self.input_root.is_dir() {
            return Err(Error::discovery(
                &self.input_root,
                "input root does not exist or is not a directory",
            ));
        }

        let mut courses = Vec::new();
        for entry in WalkDir::new(&self.input_root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let Some(entry) = usable_entry(&self.input_root, entry)? else {
                continue;
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            courses.push(Course::new(
                name.clone(),
                entry.path().to_path_buf(),
                self.output_root.join(&name),
            ));
        }

        tracing::debug!(
            "Found {} course(s) under {}",
            courses.len(),
            self.input_root.display()
        );
        Ok(courses)
    }

    /// List eligible source videos directly inside a course directory.
    ///
    /// Extension matching is case-insensitive. Subdirectories are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Discovery`] if the course directory cannot be read,
    /// for example because it was removed after [`list_courses`](Self::list_courses).
    pub fn list_videos(&self, course: &Course) -> Result<Vec<SourceVideo>> {
        let mut videos = Vec::new();
        for entry in WalkDir::new(&course.input_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let Some(entry) = usable_entry(&course.input_dir, entry)? else {
                continue;
            };
            if !entry.file_type().is_file() || !self.is_eligible(entry.path()) {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().to_string();
            let stem = entry
                .path()
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| file_name.clone());
            videos.push(SourceVideo {
                course: course.name.clone(),
                file_name,
                stem,
                path: entry.path().to_path_buf(),
            });
        }
        Ok(videos)
    }

    /// List every course and its videos.
    ///
    /// A course that cannot be listed is recorded in
    /// [`DiscoveryReport::failures`] and skipped; its siblings are unaffected.
    /// Only an unreadable input root is returned as an error.
    pub fn scan(&self) -> Result<DiscoveryReport> {
        let courses = self.list_courses()?;
        let mut report = DiscoveryReport::default();

        for course in courses {
            match self.list_videos(&course) {
                Ok(videos) => {
                    tracing::info!("Course {}: {} video(s)", course.name, videos.len());
                    report.listings.push(CourseListing { course, videos });
                }
                Err(e) => {
                    tracing::warn!("Skipping course {}: {e}", course.name);
                    report
                        .failures
                        .push(CourseFailure::new(&course.name, &course.input_dir, &e));
                }
            }
        }

        Ok(report)
    }

    fn is_eligible(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| *allowed == ext))
    }
}

/// Sort one walk result into usable, skipped, or fatal.
///
/// Only a failure on `dir` itself (depth 0) fails the listing. A broken
/// entry inside it, such as a dangling symlink, is logged and skipped, as is
/// any entry whose path is not valid UTF-8 and so cannot be passed to the
/// encoder verbatim.
fn usable_entry(
    dir: &Path,
    entry: walkdir::Result<walkdir::DirEntry>,
) -> Result<Option<walkdir::DirEntry>> {
    match entry {
        Ok(entry) if entry.path().to_str().is_none() => {
            tracing::warn!(
                "Skipping {}: path is not valid UTF-8",
                entry.path().display()
            );
            Ok(None)
        }
        Ok(entry) => Ok(Some(entry)),
        Err(err) if err.depth() == 0 => {
            let path = err.path().unwrap_or(dir).to_path_buf();
            Err(Error::discovery(path, err))
        }
        Err(err) => {
            tracing::warn!("Skipping unreadable entry in {}: {err}", dir.display());
            Ok(None)
        }
    }
}

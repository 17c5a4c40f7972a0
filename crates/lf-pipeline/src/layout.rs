//! Output directory materialization.
//!
//! The encoder does not create directories, so every directory a job writes
//! into is created immediately before the job is dispatched.

use std::io;
use std::path::Path;

use lf_core::{Error, Result, TranscodeJob};

/// Creates the output tree required by a job.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputLayout;

impl OutputLayout {
    /// Create `path` and any missing parents.
    ///
    /// Succeeds without touching anything when the directory already exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectoryCreation`] when the path (or one of its
    /// ancestors) exists as a non-directory or the filesystem refuses the
    /// operation.
    pub async fn ensure_dir(path: &Path) -> Result<()> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_dir() => return Ok(()),
            Ok(_) => {
                return Err(Error::directory_creation(
                    path,
                    io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        "path exists and is not a directory",
                    ),
                ))
            }
            Err(_) => {}
        }

        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| Error::directory_creation(path, e))?;
        tracing::debug!("Created {}", path.display());
        Ok(())
    }

    /// Create the job's output directory and every directory it declares.
    pub async fn prepare(job: &TranscodeJob) -> Result<()> {
        Self::ensure_dir(&job.output_dir).await?;
        for dir in &job.required_dirs {
            Self::ensure_dir(dir).await?;
        }
        Ok(())
    }
}

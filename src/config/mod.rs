//! Configuration file loading.
//!
//! The configuration types themselves live in [`lf_core::config`]; this module
//! finds the file, parses it, and validates the result.

pub use lf_core::config::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Default search locations, in priority order.
pub const DEFAULT_PATHS: &[&str] = &["./ladderforge.toml", "~/.config/ladderforge/config.toml"];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = Config::from_toml(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    check_config(&config).with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {}", path.display());
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration, logging non-fatal warnings.
pub fn check_config(config: &Config) -> Result<()> {
    config.validate()?;
    for warning in config.warnings() {
        tracing::warn!("{warning}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
input_root = "/srv/courses"

[batch]
window_size = 5

[encode]
mode = "gpu"
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.input_root, Path::new("/srv/courses"));
        assert_eq!(config.batch.window_size, 5);
        assert_eq!(config.encode.mode, lf_core::LadderMode::GpuFanOut);
    }

    #[test]
    fn invalid_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[batch]\nwindow_size = 0").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("window"));
    }

    #[test]
    fn unparsable_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "input_root = [").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(load_config_or_default(Some(Path::new("/nonexistent/ladderforge.toml"))).is_err());
    }
}

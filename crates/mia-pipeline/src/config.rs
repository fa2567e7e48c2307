//! YAML configuration loading for attack experiments.
//!
//! Loads [`ExperimentConfig`] from a YAML file on disk, falling back to
//! defaults when no file is specified. Command-line flags are applied on top
//! by the binary before [`ExperimentConfig::validate`] runs.

use mia_core::{ExperimentConfig, MiaError, Result};
use std::path::Path;

/// Load an [`ExperimentConfig`] from a YAML file at `path`.
///
/// # Errors
///
/// Returns [`MiaError::NotFound`] if the file does not exist and
/// [`MiaError::Config`] if it cannot be read or the YAML is invalid
/// (including unsupported dataset or architecture names).
pub fn load_config(path: &Path) -> Result<ExperimentConfig> {
    if !path.exists() {
        return Err(MiaError::NotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path).map_err(|e| {
        MiaError::Config(format!("Failed to read config file {}: {e}", path.display()))
    })?;
    let config: ExperimentConfig = serde_yaml::from_str(&contents)
        .map_err(|e| MiaError::Config(format!("Failed to parse config YAML: {e}")))?;
    Ok(config)
}

/// Load from `path` when given, otherwise start from defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<ExperimentConfig> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading configuration from file");
            load_config(path)
        }
        None => Ok(ExperimentConfig::default()),
    }
}

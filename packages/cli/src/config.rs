//! Run-file loading and command-line overrides.

use std::path::{Path, PathBuf};

use urban_index_models::{IndexConfig, MissingNoisePolicy};

/// Reads a TOML run file. Relative paths inside it resolve against the
/// file's own directory.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse.
pub fn load(path: &Path) -> Result<IndexConfig, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let config: IndexConfig = toml::de::from_str(&text)
        .map_err(|e| format!("Invalid run file {}: {e}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    log::debug!("Loaded run file {}", path.display());

    Ok(config.resolve_relative_to(base))
}

/// Applies command-line flags on top of a run file. Flag paths are taken
/// as given (relative to the working directory).
#[must_use]
pub fn apply_overrides(
    mut config: IndexConfig,
    output: Option<PathBuf>,
    summary: Option<PathBuf>,
    missing_policy: Option<MissingNoisePolicy>,
) -> IndexConfig {
    if let Some(output) = output {
        config.output = output;
    }
    if summary.is_some() {
        config.summary = summary;
    }
    if let Some(policy) = missing_policy {
        config.noise.missing_policy = policy;
    }
    config
}

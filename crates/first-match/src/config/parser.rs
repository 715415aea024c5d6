use std::path::Path;

use crate::config::types::JobConfig;
use crate::error::Result;

/// Parse a YAML job file into a [`JobConfig`].
///
/// # Errors
///
/// Returns [`crate::error::MatchError::Io`] if the file cannot be read,
/// or [`crate::error::MatchError::Yaml`] if the YAML is malformed.
pub fn parse_config(path: &Path) -> Result<JobConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse a YAML job from a string.
pub fn parse_config_str(yaml: &str) -> Result<JobConfig> {
    let config: JobConfig = serde_yaml::from_str(yaml)?;
    Ok(config)
}

//! Configuration loader with environment variable overrides
//!
//! Loads configuration from `.tessera.toml` in the project root or the user
//! config directory.

use super::types::PersistenceConfig;
use std::path::{Path, PathBuf};

/// Overrides `save.write_failure_policy`
pub const ENV_WRITE_FAILURE_POLICY: &str = "TESSERA_WRITE_FAILURE_POLICY";
/// Overrides `load.read_failure_policy`
pub const ENV_READ_FAILURE_POLICY: &str = "TESSERA_READ_FAILURE_POLICY";
/// Overrides `load.retain_unrecognized`
pub const ENV_RETAIN_UNRECOGNIZED: &str = "TESSERA_RETAIN_UNRECOGNIZED";

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to parse JSON config: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Load configuration from various sources
///
/// Priority order:
/// 1. Project-level `.tessera.toml` (or `.tessera.json`)
/// 2. User-level `~/.config/tessera/config.toml`
/// 3. Default configuration
///
/// Environment overrides are applied last in every case.
pub fn load_config(project_dir: &Path) -> Result<PersistenceConfig, ConfigError> {
    for name in [".tessera.toml", ".tessera.json"] {
        let project_config = project_dir.join(name);
        if project_config.exists() {
            return load_from_file(&project_config);
        }
    }

    if let Some(user_config) = get_user_config_path() {
        if user_config.exists() {
            return load_from_file(&user_config);
        }
    }

    apply_env_overrides(PersistenceConfig::default())
}

/// Get user config directory path
fn get_user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tessera").join("config.toml"))
}

/// Load configuration from a specific file, TOML unless it ends in `.json`
pub fn load_from_file(path: &Path) -> Result<PersistenceConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: PersistenceConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => toml::from_str(&content)?,
    };
    tracing::debug!(path = %path.display(), "loaded config");

    let config = apply_env_overrides(config)?;
    config.validate().map_err(|message| ConfigError::InvalidValue {
        key: path.display().to_string(),
        message,
    })?;
    Ok(config)
}

fn apply_env_overrides(config: PersistenceConfig) -> Result<PersistenceConfig, ConfigError> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides for the pass settings
///
/// Supports:
/// - TESSERA_WRITE_FAILURE_POLICY -> save.write_failure_policy
/// - TESSERA_READ_FAILURE_POLICY -> load.read_failure_policy
/// - TESSERA_RETAIN_UNRECOGNIZED -> load.retain_unrecognized
///
/// `lookup` returns the value of a variable; empty values are ignored.
pub fn apply_overrides<F>(
    mut config: PersistenceConfig,
    lookup: F,
) -> Result<PersistenceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let invalid = |key: &str, message: String| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    };

    if let Some(value) = get(ENV_WRITE_FAILURE_POLICY) {
        config.save.write_failure_policy = value
            .parse()
            .map_err(|e| invalid(ENV_WRITE_FAILURE_POLICY, e))?;
    }

    if let Some(value) = get(ENV_READ_FAILURE_POLICY) {
        config.load.read_failure_policy = value
            .parse()
            .map_err(|e| invalid(ENV_READ_FAILURE_POLICY, e))?;
    }

    if let Some(value) = get(ENV_RETAIN_UNRECOGNIZED) {
        config.load.retain_unrecognized = match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            other => {
                return Err(invalid(
                    ENV_RETAIN_UNRECOGNIZED,
                    format!("expected a boolean, got '{}'", other),
                ))
            }
        };
    }

    Ok(config)
}

/// Create a sample configuration file content
pub fn sample_config() -> &'static str {
    r#"# Tessera Configuration
# Place this file in your project root as .tessera.toml
# or in ~/.config/tessera/config.toml for global settings

[save]
# What to do when a provider fails to write: skip, marker, abort
write_failure_policy = "skip"

# Element written in place of a failed fragment (marker policy)
marker_element = "fragment-fault"

# Spaces per nesting level, 0 for a single line
indent = 2

[load]
# What to do when a provider fails to read: skip, abort
read_failure_policy = "skip"

# Keep fragments no provider recognizes and write them back on save
retain_unrecognized = false

# Per-provider overrides, keyed by identifier
[providers.bookmarks]
enabled = true
position = 10

# Persist this identifier with the built-in key/value provider
[providers.settings]
properties = true
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReadFailurePolicy, WriteFailurePolicy};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_sample_config_parses() {
        let config: PersistenceConfig = toml::from_str(sample_config()).unwrap();
        assert_eq!(config.save.indent, 2);
        assert_eq!(config.position_for("bookmarks", 0), 10);
        assert_eq!(config.properties_providers().collect::<Vec<_>>(), vec!["settings"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_project_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".tessera.toml"),
            "[save]\nwrite_failure_policy = \"marker\"\nindent = 0\n",
        )
        .unwrap();

        let config = load_from_file(&dir.path().join(".tessera.toml")).unwrap();
        assert_eq!(config.save.write_failure_policy, WriteFailurePolicy::Marker);
        assert_eq!(config.save.indent, 0);
        assert_eq!(config.save.marker_element, "fragment-fault");
    }

    #[test]
    fn test_load_project_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".tessera.json");
        std::fs::write(
            &path,
            r#"{"load": {"retain_unrecognized": true}, "providers": {"notes": {"position": 3}}}"#,
        )
        .unwrap();

        let config = load_from_file(&path).unwrap();
        assert!(config.load.retain_unrecognized);
        assert_eq!(config.position_for("notes", 0), 3);
    }

    #[test]
    fn test_load_config_prefers_project_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".tessera.toml"), "[save]\nindent = 4\n").unwrap();
        std::fs::write(dir.path().join(".tessera.json"), r#"{"save": {"indent": 8}}"#).unwrap();

        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.save.indent, 4);
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".tessera.toml");
        std::fs::write(&path, "[save]\nwrite_failure_policy = \"explode\"\n").unwrap();
        assert!(matches!(load_from_file(&path), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_marker_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".tessera.toml");
        std::fs::write(&path, "[save]\nmarker_element = \"not valid\"\n").unwrap();
        assert!(matches!(
            load_from_file(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let config = apply_overrides(
            PersistenceConfig::default(),
            lookup_from(&[
                (ENV_WRITE_FAILURE_POLICY, "abort"),
                (ENV_READ_FAILURE_POLICY, "ABORT"),
                (ENV_RETAIN_UNRECOGNIZED, "yes"),
            ]),
        )
        .unwrap();
        assert_eq!(config.save.write_failure_policy, WriteFailurePolicy::Abort);
        assert_eq!(config.load.read_failure_policy, ReadFailurePolicy::Abort);
        assert!(config.load.retain_unrecognized);
    }

    #[test]
    fn test_empty_override_ignored() {
        let config = apply_overrides(
            PersistenceConfig::default(),
            lookup_from(&[(ENV_WRITE_FAILURE_POLICY, "  ")]),
        )
        .unwrap();
        assert_eq!(config.save.write_failure_policy, WriteFailurePolicy::Skip);
    }

    #[test]
    fn test_bad_override_rejected() {
        let err = apply_overrides(
            PersistenceConfig::default(),
            lookup_from(&[(ENV_RETAIN_UNRECOGNIZED, "maybe")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains(ENV_RETAIN_UNRECOGNIZED));
    }
}

//! Configuration types for Tessera
//!
//! Defines the structure of `.tessera.toml` configuration.

use crate::xml::validate_name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Save pass settings
    #[serde(default)]
    pub save: SaveConfig,

    /// Load pass settings
    #[serde(default)]
    pub load: LoadConfig,

    /// Per-provider overrides keyed by identifier
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl PersistenceConfig {
    /// Check values serde cannot check on its own
    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.save.marker_element)
            .map_err(|reason| format!("save.marker_element: {}", reason))?;
        for identifier in self.providers.keys() {
            validate_name(identifier)
                .map_err(|reason| format!("providers.{}: {}", identifier, reason))?;
            if *identifier == self.save.marker_element {
                return Err(format!(
                    "providers.{}: collides with save.marker_element",
                    identifier
                ));
            }
        }
        Ok(())
    }

    /// Override for `identifier`, if configured
    pub fn provider(&self, identifier: &str) -> Option<&ProviderConfig> {
        self.providers.get(identifier)
    }

    /// Whether `identifier` may be registered (unconfigured means enabled)
    pub fn is_enabled(&self, identifier: &str) -> bool {
        self.provider(identifier).map_or(true, |p| p.enabled)
    }

    /// Configured position for `identifier`, else `default`
    pub fn position_for(&self, identifier: &str, default: i32) -> i32 {
        self.provider(identifier)
            .and_then(|p| p.position)
            .unwrap_or(default)
    }

    /// Identifiers to back with the built-in properties provider
    pub fn properties_providers(&self) -> impl Iterator<Item = &str> {
        self.providers
            .iter()
            .filter(|(_, p)| p.properties && p.enabled)
            .map(|(id, _)| id.as_str())
    }
}

/// What to do when a provider's write callback fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteFailurePolicy {
    /// Omit the fragment
    #[default]
    Skip,
    /// Emit a marker element naming the provider
    Marker,
    /// Fail the whole save
    Abort,
}

impl fmt::Display for WriteFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteFailurePolicy::Skip => write!(f, "skip"),
            WriteFailurePolicy::Marker => write!(f, "marker"),
            WriteFailurePolicy::Abort => write!(f, "abort"),
        }
    }
}

impl FromStr for WriteFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(WriteFailurePolicy::Skip),
            "marker" => Ok(WriteFailurePolicy::Marker),
            "abort" => Ok(WriteFailurePolicy::Abort),
            other => Err(format!(
                "unknown write failure policy '{}' (expected skip, marker or abort)",
                other
            )),
        }
    }
}

/// What to do when a provider's read callback fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadFailurePolicy {
    /// Skip the rest of the fragment and continue
    #[default]
    Skip,
    /// Fail the whole load
    Abort,
}

impl fmt::Display for ReadFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadFailurePolicy::Skip => write!(f, "skip"),
            ReadFailurePolicy::Abort => write!(f, "abort"),
        }
    }
}

impl FromStr for ReadFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(ReadFailurePolicy::Skip),
            "abort" => Ok(ReadFailurePolicy::Abort),
            other => Err(format!(
                "unknown read failure policy '{}' (expected skip or abort)",
                other
            )),
        }
    }
}

/// Save section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveConfig {
    #[serde(default)]
    pub write_failure_policy: WriteFailurePolicy,

    /// Element written in place of a failed fragment under the marker policy
    #[serde(default = "default_marker_element")]
    pub marker_element: String,

    /// Spaces per nesting level; 0 writes everything on one line
    #[serde(default = "default_indent")]
    pub indent: usize,
}

fn default_marker_element() -> String {
    "fragment-fault".to_string()
}

fn default_indent() -> usize {
    2
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            write_failure_policy: WriteFailurePolicy::default(),
            marker_element: default_marker_element(),
            indent: default_indent(),
        }
    }
}

/// Load section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadConfig {
    #[serde(default)]
    pub read_failure_policy: ReadFailurePolicy,

    /// Keep unrecognized fragments and write them back on the next save
    #[serde(default)]
    pub retain_unrecognized: bool,
}

/// Individual provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Whether this provider is registered at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Replaces the position the application registers with
    #[serde(default)]
    pub position: Option<i32>,

    /// Back this identifier with the built-in properties provider
    #[serde(default)]
    pub properties: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            position: None,
            properties: false,
        }
    }
}

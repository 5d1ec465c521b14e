//! Configuration module for Tessera
//!
//! Handles loading and parsing of `.tessera.toml` (or `.tessera.json`)
//! configuration files with environment variable overrides.

mod loader;
mod types;

pub use loader::{
    apply_overrides, load_config, load_from_file, sample_config, ConfigError,
    ENV_READ_FAILURE_POLICY, ENV_RETAIN_UNRECOGNIZED, ENV_WRITE_FAILURE_POLICY,
};
pub use types::{
    LoadConfig, PersistenceConfig, ProviderConfig, ReadFailurePolicy, SaveConfig,
    WriteFailurePolicy,
};

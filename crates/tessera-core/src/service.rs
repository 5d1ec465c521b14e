//! PersistenceService - main persistence facade
//!
//! Bundles a shared provider registry with the loaded configuration and
//! exposes whole-project save and load to strings, streams and files.
//!
//! # Example
//!
//! ```ignore
//! use tessera_core::{PersistenceService, Project};
//!
//! let service = PersistenceService::from_project_dir(&cwd)?;
//! service.register(Arc::new(BookmarksProvider::default()), 10)?;
//!
//! let mut project = Project::new();
//! let report = service.load_from_path(&path, &mut project)?;
//! for warning in &report.warnings {
//!     eprintln!("{}", warning);
//! }
//! ```

use crate::config::{load_config, PersistenceConfig};
use crate::error::{Result, TesseraError};
use crate::orchestration::{LoadOrchestrator, SaveOrchestrator};
use crate::provider::{PropertiesProvider, ProviderRegistry, SharedProvider};
use crate::report::{LoadReport, SaveReport};
use crate::workspace::{Project, ProjectStorage};
use crate::xml::{StreamReader, StreamWriter};
use std::path::Path;
use std::sync::Arc;

/// Position given to configured properties providers with no explicit position
const PROPERTIES_POSITION: i32 = 1000;

/// Main persistence facade
pub struct PersistenceService {
    /// Provider registry, shareable with other services
    registry: Arc<ProviderRegistry>,

    /// Configuration
    config: PersistenceConfig,
}

impl PersistenceService {
    /// Create a service with a fresh registry
    pub fn new(config: PersistenceConfig) -> Result<Self> {
        Self::with_registry(Arc::new(ProviderRegistry::new()), config)
    }

    /// Create a service around an existing registry
    pub fn with_registry(
        registry: Arc<ProviderRegistry>,
        config: PersistenceConfig,
    ) -> Result<Self> {
        config.validate().map_err(TesseraError::config)?;
        Ok(Self { registry, config })
    }

    /// Create a service configured from `project_dir` (see [`load_config`])
    pub fn from_project_dir(project_dir: &Path) -> Result<Self> {
        Self::new(load_config(project_dir)?)
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    /// Register `provider` under its own identifier.
    ///
    /// Returns `false` if the configuration disables it. A configured
    /// position replaces `default_position`.
    pub fn register(&self, provider: SharedProvider, default_position: i32) -> Result<bool> {
        let identifier = provider.identifier().to_string();
        self.register_as(identifier, provider, default_position)
    }

    /// Register `provider` under `identifier`, applying configured overrides.
    ///
    /// The failure marker element name is reserved and cannot be registered.
    pub fn register_as(
        &self,
        identifier: impl Into<String>,
        provider: SharedProvider,
        default_position: i32,
    ) -> Result<bool> {
        let identifier = identifier.into();
        if identifier == self.config.save.marker_element {
            return Err(TesseraError::invalid_identifier(
                identifier,
                "collides with save.marker_element",
            ));
        }
        if !self.config.is_enabled(&identifier) {
            tracing::info!(identifier = %identifier, "provider disabled by configuration");
            return Ok(false);
        }

        let position = self.config.position_for(&identifier, default_position);
        self.registry.register(identifier, position, provider)?;
        Ok(true)
    }

    /// Register a [`PropertiesProvider`] for every configured identifier
    /// marked `properties = true`. Returns how many were registered.
    pub fn register_configured_properties(&self) -> Result<usize> {
        let mut count = 0;
        for identifier in self.config.properties_providers() {
            let provider: SharedProvider = Arc::new(PropertiesProvider::new(identifier));
            if self.register_as(identifier, provider, PROPERTIES_POSITION)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Write `project` to `stream`
    pub fn save(&self, project: &Project, stream: &mut dyn StreamWriter) -> Result<SaveReport> {
        SaveOrchestrator::new(&self.registry, &self.config.save).save(project, stream)
    }

    /// Render `project` as a complete document
    pub fn save_to_string(&self, project: &Project) -> Result<(String, SaveReport)> {
        SaveOrchestrator::new(&self.registry, &self.config.save).save_to_string(project)
    }

    /// Read a document from `stream` into `project`
    pub fn load(&self, stream: &mut dyn StreamReader, project: &mut Project) -> Result<LoadReport> {
        LoadOrchestrator::new(&self.registry, &self.config.load).load(stream, project)
    }

    /// Parse `document` into `project`
    pub fn load_from_str(&self, document: &str, project: &mut Project) -> Result<LoadReport> {
        LoadOrchestrator::new(&self.registry, &self.config.load).load_from_str(document, project)
    }

    /// Save `project` to the file at `path`, replacing it atomically.
    ///
    /// Nothing is written if the save pass fails.
    pub fn save_to_path(&self, project: &Project, path: &Path) -> Result<SaveReport> {
        let (document, report) = self.save_to_string(project)?;
        ProjectStorage::new(path).write_document(&document)?;
        Ok(report)
    }

    /// Load the file at `path` into `project`
    pub fn load_from_path(&self, path: &Path, project: &mut Project) -> Result<LoadReport> {
        let document = ProjectStorage::new(path).read_document()?;
        self.load_from_str(&document, project)
    }
}

//! Tessera Core - per-workspace fragment persistence
//!
//! This crate persists a project's workspaces into one XML document:
//! - Provider registry (identifier → provider, ordered by position)
//! - Fragment writer (one balanced fragment per provider per workspace)
//! - Fragment dispatcher (streams fragments back to providers by tag)
//! - Save / load orchestrators with per-provider failure isolation
//! - Configuration loading
//!
//! Applications plug in by implementing [`FragmentProvider`].
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐  save   ┌──────────────────┐  write  ┌───────────────┐
//! │ Project            │ ───────→│ SaveOrchestrator │ ───────→│ FragmentWriter│──→ provider.write
//! │  └── Workspace ... │         └──────────────────┘         └───────────────┘
//! │                    │  load   ┌──────────────────┐  read   ┌───────────────┐
//! │                    │ ←───────│ LoadOrchestrator │ ───────→│ Dispatcher    │──→ provider.read
//! └────────────────────┘         └──────────────────┘         └───────────────┘
//!                                         │
//!                                  ProviderRegistry (snapshot per pass)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tessera_core::{PersistenceConfig, PersistenceService, PropertiesProvider, Project};
//!
//! let service = PersistenceService::new(PersistenceConfig::default())?;
//! service.register(Arc::new(PropertiesProvider::new("settings")), 0)?;
//!
//! let (xml, report) = service.save_to_string(&project)?;
//! ```

// Public API modules
pub mod error;
pub mod report;

// Configuration
pub mod config;

// XML stream capability
pub mod xml;

// Workspace model and storage
pub mod workspace;

// Providers and registry
pub mod provider;

// Fragment writing and dispatch
pub mod fragment;

// Whole-project passes
pub mod orchestration;

// Re-export commonly used types
pub use error::{Result, TesseraError};
pub use report::{LoadReport, SaveReport, SkippedFragment, Warning};

// Re-export config types
pub use config::{
    LoadConfig, PersistenceConfig, ProviderConfig, ReadFailurePolicy, SaveConfig,
    WriteFailurePolicy,
};

// Re-export workspace types
pub use workspace::{Project, ProjectStorage, Workspace, WorkspaceId};

// Re-export provider types
pub use provider::{
    FragmentProvider, Properties, PropertiesProvider, PropertySet, ProviderCapabilities,
    ProviderError, ProviderRegistry, RegistrySnapshot, SharedProvider,
};

pub use fragment::{FragmentReader, FragmentWriter, RetainedFragments};
pub use orchestration::{LoadOrchestrator, SaveOrchestrator};

// Main service facade
pub mod service;
pub use service::PersistenceService;

/// Get the crate version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

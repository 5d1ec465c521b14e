//! Provider registry resolving save order and load dispatch

use super::{ProviderCapabilities, SharedProvider};
use crate::error::{Result, TesseraError};
use crate::xml::validate_name;
use parking_lot::RwLock;
use std::collections::HashMap;

/// A registered provider with its ordering hint
#[derive(Clone)]
pub struct ProviderEntry {
    identifier: String,
    position: i32,
    capabilities: ProviderCapabilities,
    provider: SharedProvider,
}

impl ProviderEntry {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn capabilities(&self) -> ProviderCapabilities {
        self.capabilities
    }

    pub fn provider(&self) -> &SharedProvider {
        &self.provider
    }
}

impl std::fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("identifier", &self.identifier)
            .field("position", &self.position)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Ordered provider list used for one save or load pass
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    entries: Vec<ProviderEntry>,
}

impl RegistrySnapshot {
    /// Entries in pass order
    pub fn iter(&self) -> impl Iterator<Item = &ProviderEntry> {
        self.entries.iter()
    }

    /// Find an entry by identifier
    pub fn lookup(&self, identifier: &str) -> Option<&ProviderEntry> {
        self.entries.iter().find(|e| e.identifier == identifier)
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.identifier.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Default)]
struct RegistryInner {
    /// Entries in registration order
    entries: Vec<ProviderEntry>,

    /// Identifier -> index into `entries`
    index: HashMap<String, usize>,
}

/// Registry of fragment providers.
///
/// Registration goes through a shared reference so one registry can be held
/// in an `Arc` by every orchestrator; each pass works on its own snapshot.
#[derive(Default)]
pub struct ProviderRegistry {
    inner: RwLock<RegistryInner>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under `identifier`.
    ///
    /// Fails with [`TesseraError::DuplicateIdentifier`] if the identifier is
    /// taken, leaving the registry unchanged.
    pub fn register(
        &self,
        identifier: impl Into<String>,
        position: i32,
        provider: SharedProvider,
    ) -> Result<()> {
        let identifier = identifier.into();
        validate_name(&identifier)
            .map_err(|reason| TesseraError::invalid_identifier(&identifier, reason))?;

        let mut inner = self.inner.write();
        if inner.index.contains_key(&identifier) {
            return Err(TesseraError::DuplicateIdentifier(identifier));
        }

        tracing::debug!(identifier = %identifier, position, "registered provider");
        let capabilities = provider.capabilities();
        let slot = inner.entries.len();
        inner.index.insert(identifier.clone(), slot);
        inner.entries.push(ProviderEntry {
            identifier,
            position,
            capabilities,
            provider,
        });
        Ok(())
    }

    /// Register a provider under its own identifier
    pub fn register_provider(&self, provider: SharedProvider, position: i32) -> Result<()> {
        let identifier = provider.identifier().to_string();
        self.register(identifier, position, provider)
    }

    /// Get a provider by identifier
    pub fn lookup(&self, identifier: &str) -> Option<SharedProvider> {
        let inner = self.inner.read();
        inner
            .index
            .get(identifier)
            .map(|&slot| inner.entries[slot].provider.clone())
    }

    /// Write-capable providers ordered by position, then registration order
    pub fn snapshot_for_save(&self) -> RegistrySnapshot {
        self.snapshot(|caps| caps.write)
    }

    /// Read-capable providers ordered by position, then registration order
    pub fn snapshot_for_load(&self) -> RegistrySnapshot {
        self.snapshot(|caps| caps.read)
    }

    fn snapshot(&self, include: impl Fn(ProviderCapabilities) -> bool) -> RegistrySnapshot {
        let mut entries: Vec<ProviderEntry> = self
            .inner
            .read()
            .entries
            .iter()
            .filter(|e| include(e.capabilities))
            .cloned()
            .collect();
        // Stable sort: equal positions keep registration order
        entries.sort_by_key(|e| e.position);
        RegistrySnapshot { entries }
    }

    /// Registered identifiers in registration order
    pub fn identifiers(&self) -> Vec<String> {
        self.inner
            .read()
            .entries
            .iter()
            .map(|e| e.identifier.clone())
            .collect()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.inner.read().index.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

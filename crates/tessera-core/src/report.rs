//! Save and load pass reports
//!
//! Serializable so front ends can render or forward them as JSON.

use crate::workspace::WorkspaceId;
use serde::Serialize;

/// Recovered provider failure, aggregated over a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Write callback failed; fragment skipped or replaced by a marker
    ProviderWriteFailure {
        workspace: WorkspaceId,
        identifier: String,
        message: String,
    },

    /// Read callback failed; rest of the fragment skipped
    ProviderReadFailure {
        workspace: WorkspaceId,
        identifier: String,
        message: String,
    },
}

impl Warning {
    pub fn workspace(&self) -> WorkspaceId {
        match self {
            Warning::ProviderWriteFailure { workspace, .. }
            | Warning::ProviderReadFailure { workspace, .. } => *workspace,
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            Warning::ProviderWriteFailure { identifier, .. }
            | Warning::ProviderReadFailure { identifier, .. } => identifier,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Warning::ProviderWriteFailure { message, .. }
            | Warning::ProviderReadFailure { message, .. } => message,
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::ProviderWriteFailure {
                workspace,
                identifier,
                message,
            } => write!(
                f,
                "provider '{}' failed to write workspace {}: {}",
                identifier, workspace, message
            ),
            Warning::ProviderReadFailure {
                workspace,
                identifier,
                message,
            } => write!(
                f,
                "provider '{}' failed to read workspace {}: {}",
                identifier, workspace, message
            ),
        }
    }
}

/// Fragment no registered provider claimed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFragment {
    pub workspace: WorkspaceId,
    pub tag: String,
    /// Byte offset just after the fragment's start tag
    pub position: u64,
}

/// Summary of one project save
#[derive(Debug, Clone, Default, Serialize)]
pub struct SaveReport {
    /// Workspaces written
    pub workspaces: usize,
    /// Provider fragments written
    pub fragments_written: usize,
    /// Retained unrecognized fragments written back
    pub fragments_retained: usize,
    pub warnings: Vec<Warning>,
}

impl SaveReport {
    /// Identifiers of providers skipped at least once, in first-failure order
    pub fn failed_providers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for warning in &self.warnings {
            if !ids.contains(&warning.identifier()) {
                ids.push(warning.identifier());
            }
        }
        ids
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Summary of one project load
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    /// Workspace elements read
    pub workspaces: usize,
    /// Provider read callbacks invoked
    pub dispatched: usize,
    /// Fragments without a provider
    pub skipped: Vec<SkippedFragment>,
    pub warnings: Vec<Warning>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_providers_deduplicated() {
        let ws = WorkspaceId::new();
        let failure = |id: &str| Warning::ProviderWriteFailure {
            workspace: ws,
            identifier: id.to_string(),
            message: "boom".to_string(),
        };
        let report = SaveReport {
            workspaces: 2,
            fragments_written: 3,
            fragments_retained: 0,
            warnings: vec![failure("b"), failure("a"), failure("b")],
        };
        assert_eq!(report.failed_providers(), vec!["b", "a"]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let warning = Warning::ProviderReadFailure {
            workspace: WorkspaceId::new(),
            identifier: "notes".to_string(),
            message: "bad".to_string(),
        };
        let json = serde_json::to_string(&warning).unwrap();
        assert!(json.contains("\"kind\":\"provider_read_failure\""));
        assert!(json.contains("\"identifier\":\"notes\""));
        assert!(warning.to_string().starts_with("provider 'notes' failed to read"));
    }
}

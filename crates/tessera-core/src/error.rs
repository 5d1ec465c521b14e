//! Error types for Tessera Core
//!
//! Provides a unified error type for registry, save and load operations.

use crate::config::ConfigError;
use crate::workspace::WorkspaceId;
use crate::xml::XmlError;
use thiserror::Error;

/// Result type for Tessera Core operations
pub type Result<T> = std::result::Result<T, TesseraError>;

/// Unified error type for Tessera Core
#[derive(Error, Debug)]
pub enum TesseraError {
    /// A provider with the same identifier is already registered
    #[error("Duplicate provider identifier: {0}")]
    DuplicateIdentifier(String),

    /// Identifier cannot be used as a fragment tag
    #[error("Invalid provider identifier '{identifier}': {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    /// A provider write callback failed and the save policy is `abort`
    #[error("Provider '{identifier}' failed to write workspace {workspace}: {message}")]
    ProviderWriteFailure {
        identifier: String,
        workspace: WorkspaceId,
        message: String,
    },

    /// A provider read callback failed and the load policy is `abort`
    #[error("Provider '{identifier}' failed to read workspace {workspace}: {message}")]
    ProviderReadFailure {
        identifier: String,
        workspace: WorkspaceId,
        message: String,
    },

    /// A provider left the stream cursor somewhere other than after its end tag
    #[error("Provider '{identifier}' unbalanced the stream in workspace {workspace}: {detail}")]
    ProviderStreamImbalance {
        identifier: String,
        workspace: WorkspaceId,
        detail: String,
    },

    /// The document is not well-formed or not a project document
    #[error("Malformed document at byte {position}: {message}")]
    MalformedDocument { position: u64, message: String },

    /// Document format version newer than this build understands
    #[error("Unsupported project format version: {0}")]
    UnsupportedVersion(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TesseraError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        TesseraError::Config(msg.into())
    }

    /// Create a malformed document error
    pub fn malformed(position: u64, msg: impl Into<String>) -> Self {
        TesseraError::MalformedDocument {
            position,
            message: msg.into(),
        }
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        TesseraError::InvalidIdentifier {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error aborted a load because the stream can no longer be trusted
    pub fn is_stream_fault(&self) -> bool {
        matches!(
            self,
            TesseraError::ProviderStreamImbalance { .. }
                | TesseraError::MalformedDocument { .. }
                | TesseraError::Io(_)
        )
    }
}

impl From<XmlError> for TesseraError {
    fn from(err: XmlError) -> Self {
        match err {
            XmlError::Syntax { position, message } => {
                TesseraError::MalformedDocument { position, message }
            }
            XmlError::InvalidName(name) => TesseraError::Serialization(format!(
                "Invalid element name: {}",
                name
            )),
            XmlError::Io(e) => TesseraError::Io(e),
        }
    }
}

impl From<ConfigError> for TesseraError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ReadError(e) => TesseraError::Io(e),
            other => TesseraError::Config(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for TesseraError {
    fn from(err: serde_json::Error) -> Self {
        TesseraError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for TesseraError {
    fn from(err: toml::de::Error) -> Self {
        TesseraError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_identifier_display() {
        let err = TesseraError::DuplicateIdentifier("bookmarks".to_string());
        assert_eq!(err.to_string(), "Duplicate provider identifier: bookmarks");
    }

    #[test]
    fn test_xml_syntax_maps_to_malformed() {
        let err: TesseraError = XmlError::Syntax {
            position: 42,
            message: "mismatched end tag".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            TesseraError::MalformedDocument { position: 42, .. }
        ));
        assert!(err.is_stream_fault());
    }

    #[test]
    fn test_imbalance_names_provider() {
        let err = TesseraError::ProviderStreamImbalance {
            identifier: "notes".to_string(),
            workspace: WorkspaceId::new(),
            detail: "stopped before </notes>".to_string(),
        };
        assert!(err.to_string().contains("'notes'"));
        assert!(err.is_stream_fault());
    }

    #[test]
    fn test_config_error_not_stream_fault() {
        let err = TesseraError::config("bad policy");
        assert_eq!(err.to_string(), "Configuration error: bad policy");
        assert!(!err.is_stream_fault());
    }
}

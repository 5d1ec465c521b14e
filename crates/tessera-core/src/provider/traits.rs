//! Fragment provider trait

use crate::fragment::{FragmentReader, FragmentWriter};
use crate::workspace::Workspace;
use crate::xml::XmlError;
use std::sync::Arc;
use thiserror::Error;

/// Error returned by provider callbacks
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The underlying XML stream failed
    #[error("Stream error: {0}")]
    Stream(#[from] XmlError),

    /// A token other than the one the provider expected
    #[error("Unexpected {found}, expected {expected}")]
    UnexpectedToken { expected: String, found: String },

    /// Tried to read beyond the provider's own end tag
    #[error("Read past the end of fragment <{0}>")]
    PastFragmentEnd(String),

    /// Elements opened and closed out of order
    #[error("Unbalanced fragment: {0}")]
    Unbalanced(String),

    /// Content could not be interpreted
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Any other provider-specific failure
    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Create an invalid data error
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        ProviderError::InvalidData(msg.into())
    }

    /// Create a generic provider error
    pub fn other(msg: impl Into<String>) -> Self {
        ProviderError::Other(msg.into())
    }

    /// Create an unexpected token error
    pub fn unexpected(expected: impl Into<String>, found: impl std::fmt::Display) -> Self {
        ProviderError::UnexpectedToken {
            expected: expected.into(),
            found: found.to_string(),
        }
    }
}

/// Which passes a provider takes part in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCapabilities {
    /// Dispatched to on load
    pub read: bool,
    /// Asked for a fragment on save
    pub write: bool,
}

impl ProviderCapabilities {
    pub fn read_only() -> Self {
        Self {
            read: true,
            write: false,
        }
    }

    pub fn write_only() -> Self {
        Self {
            read: false,
            write: true,
        }
    }
}

impl Default for ProviderCapabilities {
    fn default() -> Self {
        Self {
            read: true,
            write: true,
        }
    }
}

/// Extension point for persisting one slice of workspace state.
///
/// On save, `write` receives a writer scoped to the provider's fragment; the
/// enclosing `<identifier>` tags are written by the caller. On load, `read`
/// receives a reader positioned just after `<identifier>` and must consume
/// everything up to and including the matching `</identifier>`
/// ([`FragmentReader::finish`] does that for whatever is left).
pub trait FragmentProvider: Send + Sync {
    /// Identifier used as the fragment tag
    fn identifier(&self) -> &str;

    /// Passes this provider takes part in
    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::default()
    }

    /// Emit this provider's state for `workspace`
    fn write(
        &self,
        out: &mut FragmentWriter,
        workspace: &Workspace,
    ) -> Result<(), ProviderError>;

    /// Consume this provider's fragment and apply it to `workspace`
    fn read(
        &self,
        input: &mut FragmentReader<'_>,
        workspace: &mut Workspace,
    ) -> Result<(), ProviderError>;
}

/// Thread-safe shared provider reference
pub type SharedProvider = Arc<dyn FragmentProvider>;

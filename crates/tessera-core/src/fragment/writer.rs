//! Fragment writer: one self-contained fragment per provider

use super::retained::RetainedFragments;
use crate::config::{SaveConfig, WriteFailurePolicy};
use crate::error::{self, TesseraError};
use crate::provider::{ProviderError, RegistrySnapshot};
use crate::report::Warning;
use crate::workspace::Workspace;
use crate::xml::{validate_name, Attributes, StreamWriter, XmlError};

#[derive(Debug)]
enum WriteOp {
    Start { name: String, attributes: Attributes },
    Text(String),
    End(String),
}

/// Writer handed to [`FragmentProvider::write`].
///
/// Output is buffered and only committed to the document once the provider
/// returns successfully with every element it opened closed again. The
/// enclosing `<identifier>` element is written by the caller.
///
/// [`FragmentProvider::write`]: crate::provider::FragmentProvider::write
#[derive(Debug)]
pub struct FragmentWriter {
    identifier: String,
    attributes: Attributes,
    ops: Vec<WriteOp>,
    open: Vec<String>,
}

impl FragmentWriter {
    pub(crate) fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            attributes: Attributes::new(),
            ops: Vec::new(),
            open: Vec::new(),
        }
    }

    /// Identifier (tag) of this fragment
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Set an attribute on the fragment element itself
    pub fn set_attribute(
        &mut self,
        key: &str,
        value: impl Into<String>,
    ) -> Result<(), ProviderError> {
        validate_name(key).map_err(|_| XmlError::InvalidName(key.to_string()))?;
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key.to_string(), value)),
        }
        Ok(())
    }

    /// Open `<name>`
    pub fn start_element(&mut self, name: &str) -> Result<(), ProviderError> {
        self.start_element_with(name, &[])
    }

    /// Open `<name key="value" ...>`
    pub fn start_element_with(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
    ) -> Result<(), ProviderError> {
        validate_name(name).map_err(|_| XmlError::InvalidName(name.to_string()))?;
        for (key, _) in attributes {
            validate_name(key).map_err(|_| XmlError::InvalidName(key.to_string()))?;
        }

        self.ops.push(WriteOp::Start {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        self.open.push(name.to_string());
        Ok(())
    }

    /// Write character data
    pub fn text(&mut self, text: &str) {
        self.ops.push(WriteOp::Text(text.to_string()));
    }

    /// Close the innermost open element
    pub fn end_element(&mut self) -> Result<(), ProviderError> {
        let name = self.open.pop().ok_or_else(|| {
            ProviderError::Unbalanced(format!(
                "end_element with no open element in <{}>",
                self.identifier
            ))
        })?;
        self.ops.push(WriteOp::End(name));
        Ok(())
    }

    /// Write `<name>text</name>`
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<(), ProviderError> {
        self.start_element(name)?;
        self.text(text);
        self.end_element()
    }

    /// Write `<name key="value" .../>`
    pub fn empty_element(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
    ) -> Result<(), ProviderError> {
        self.start_element_with(name, attributes)?;
        self.end_element()
    }

    /// Number of elements currently open
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    fn check_balanced(&self) -> Result<(), ProviderError> {
        match self.open.last() {
            None => Ok(()),
            Some(name) => Err(ProviderError::Unbalanced(format!(
                "{} element(s) left open, innermost <{}>",
                self.open.len(),
                name
            ))),
        }
    }

    /// Write the complete fragment to `stream`
    fn commit(self, stream: &mut dyn StreamWriter) -> Result<(), XmlError> {
        stream.start_element(&self.identifier, &self.attributes)?;
        for op in &self.ops {
            match op {
                WriteOp::Start { name, attributes } => stream.start_element(name, attributes)?,
                WriteOp::Text(text) => stream.text(text)?,
                WriteOp::End(name) => stream.end_element(name)?,
            }
        }
        stream.end_element(&self.identifier)
    }
}

/// Result of writing one workspace's fragments
#[derive(Debug, Default)]
pub struct WorkspaceWriteOutcome {
    /// Provider fragments committed
    pub written: usize,
    /// Retained unrecognized fragments re-emitted
    pub retained: usize,
    /// Providers whose write callback failed
    pub warnings: Vec<Warning>,
}

/// Ask every provider in `snapshot`, in order, for its fragment of `workspace`.
///
/// A failing provider is handled according to `config.write_failure_policy`;
/// only `abort` stops the pass. Errors from `stream` itself are always fatal.
pub fn write_workspace(
    workspace: &Workspace,
    stream: &mut dyn StreamWriter,
    snapshot: &RegistrySnapshot,
    config: &SaveConfig,
) -> error::Result<WorkspaceWriteOutcome> {
    let mut outcome = WorkspaceWriteOutcome::default();

    for entry in snapshot.iter() {
        let mut fragment = FragmentWriter::new(entry.identifier());
        let result = entry
            .provider()
            .write(&mut fragment, workspace)
            .and_then(|()| fragment.check_balanced());

        let err = match result {
            Ok(()) => {
                tracing::debug!(
                    provider = entry.identifier(),
                    workspace = %workspace.id(),
                    "wrote fragment"
                );
                fragment.commit(stream)?;
                outcome.written += 1;
                continue;
            }
            Err(err) => err,
        };

        tracing::warn!(
            provider = entry.identifier(),
            workspace = %workspace.id(),
            error = %err,
            "provider write failed"
        );

        let message = err.to_string();
        match config.write_failure_policy {
            WriteFailurePolicy::Abort => {
                return Err(TesseraError::ProviderWriteFailure {
                    identifier: entry.identifier().to_string(),
                    workspace: workspace.id(),
                    message,
                });
            }
            WriteFailurePolicy::Marker => {
                write_marker(stream, &config.marker_element, entry.identifier(), &message)?;
            }
            WriteFailurePolicy::Skip => {}
        }

        outcome.warnings.push(Warning::ProviderWriteFailure {
            workspace: workspace.id(),
            identifier: entry.identifier().to_string(),
            message,
        });
    }

    if let Some(retained) = workspace.get::<RetainedFragments>() {
        for fragment in retained.iter() {
            // A provider now owns this tag; its fresh fragment wins
            if snapshot.lookup(fragment.tag()).is_some() {
                continue;
            }
            fragment.replay(stream)?;
            outcome.retained += 1;
        }
    }

    Ok(outcome)
}

/// `<marker provider="identifier">message</marker>`
fn write_marker(
    stream: &mut dyn StreamWriter,
    marker: &str,
    identifier: &str,
    message: &str,
) -> Result<(), XmlError> {
    stream.start_element(
        marker,
        &[("provider".to_string(), identifier.to_string())],
    )?;
    stream.text(message)?;
    stream.end_element(marker)
}

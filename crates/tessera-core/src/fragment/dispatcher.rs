//! Fragment dispatcher
//!
//! Single-pass, forward-only state machine over the tokens of one workspace
//! element:
//!
//! ```text
//!            <T> known                       provider returns at </T>
//! Scanning ───────────────→ Delegated ─────────────────────────────→ Scanning
//!    │  <T> unknown: skip to </T>, stay in Scanning
//!    │
//!    └── </workspace> or end of document ──→ Done
//! ```

use super::reader::FragmentReader;
use super::retained::{RetainedFragment, RetainedFragments};
use crate::config::{LoadConfig, ReadFailurePolicy};
use crate::error::{Result, TesseraError};
use crate::provider::{ProviderEntry, RegistrySnapshot};
use crate::report::{SkippedFragment, Warning};
use crate::workspace::Workspace;
use crate::xml::{Attributes, StreamReader, XmlToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    Delegated,
    Done,
}

/// How the dispatcher reached `Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchEnd {
    /// The workspace's closing tag was consumed
    #[default]
    WorkspaceClosed,
    /// The stream ended first
    EndOfDocument,
}

/// Result of dispatching one workspace's fragments
#[derive(Debug, Default)]
pub struct WorkspaceReadOutcome {
    /// Provider read callbacks invoked
    pub dispatched: usize,
    pub skipped: Vec<SkippedFragment>,
    pub warnings: Vec<Warning>,
    pub end: DispatchEnd,
}

/// Dispatches the fragments of one workspace to providers by identifier
pub struct FragmentDispatcher<'s> {
    snapshot: &'s RegistrySnapshot,
    config: &'s LoadConfig,
    state: State,
}

impl<'s> FragmentDispatcher<'s> {
    pub fn new(snapshot: &'s RegistrySnapshot, config: &'s LoadConfig) -> Self {
        Self {
            snapshot,
            config,
            state: State::Scanning,
        }
    }

    /// Consume tokens up to and including `</closing_tag>` (or end of document),
    /// handing each recognized fragment to its provider.
    ///
    /// The stream must be positioned just after the workspace's start tag.
    pub fn run(
        mut self,
        stream: &mut dyn StreamReader,
        workspace: &mut Workspace,
        closing_tag: &str,
    ) -> Result<WorkspaceReadOutcome> {
        let mut outcome = WorkspaceReadOutcome::default();
        workspace.remove::<RetainedFragments>();

        while self.state != State::Done {
            match stream.next_token()? {
                XmlToken::Start { name, attributes } => match self.snapshot.lookup(&name) {
                    Some(entry) => {
                        self.state = State::Delegated;
                        self.delegate(entry, attributes, stream, workspace, &mut outcome)?;
                        self.state = State::Scanning;
                    }
                    None => {
                        self.skip_unrecognized(name, attributes, stream, workspace, &mut outcome)?
                    }
                },
                XmlToken::End { name } if name == closing_tag => {
                    self.state = State::Done;
                    outcome.end = DispatchEnd::WorkspaceClosed;
                }
                XmlToken::End { name } => {
                    return Err(TesseraError::malformed(
                        stream.position(),
                        format!("unexpected </{}> inside <{}>", name, closing_tag),
                    ));
                }
                XmlToken::Text(_) => {}
                XmlToken::Eof => {
                    self.state = State::Done;
                    outcome.end = DispatchEnd::EndOfDocument;
                }
            }
        }

        Ok(outcome)
    }

    fn delegate(
        &self,
        entry: &ProviderEntry,
        attributes: Attributes,
        stream: &mut dyn StreamReader,
        workspace: &mut Workspace,
        outcome: &mut WorkspaceReadOutcome,
    ) -> Result<()> {
        let identifier = entry.identifier();
        let workspace_id = workspace.id();
        tracing::debug!(provider = identifier, workspace = %workspace_id, "dispatching fragment");

        let mut reader = FragmentReader::new(stream, identifier, attributes);
        let result = entry.provider().read(&mut reader, workspace);
        outcome.dispatched += 1;

        if let Some(fault) = reader.take_fault() {
            tracing::error!(provider = identifier, error = %fault, "stream fault inside fragment");
            return Err(fault.into());
        }
        if reader.overran() {
            return Err(self.imbalance(entry, workspace, format!("read past </{}>", identifier)));
        }

        let err = match result {
            Ok(()) if reader.is_finished() => return Ok(()),
            Ok(()) => {
                return Err(self.imbalance(
                    entry,
                    workspace,
                    format!("returned before </{}>", identifier),
                ));
            }
            Err(err) => err,
        };

        tracing::warn!(
            provider = identifier,
            workspace = %workspace_id,
            error = %err,
            "provider read failed"
        );
        if self.config.read_failure_policy == ReadFailurePolicy::Abort {
            return Err(TesseraError::ProviderReadFailure {
                identifier: identifier.to_string(),
                workspace: workspace_id,
                message: err.to_string(),
            });
        }

        // Best effort: skip whatever the provider left of its fragment
        if reader.finish().is_err() {
            let fault = reader.take_fault().map(TesseraError::from).unwrap_or_else(|| {
                TesseraError::malformed(0, format!("could not skip to </{}>", identifier))
            });
            return Err(fault);
        }

        outcome.warnings.push(Warning::ProviderReadFailure {
            workspace: workspace_id,
            identifier: identifier.to_string(),
            message: err.to_string(),
        });
        Ok(())
    }

    fn imbalance(
        &self,
        entry: &ProviderEntry,
        workspace: &Workspace,
        detail: String,
    ) -> TesseraError {
        tracing::error!(
            provider = entry.identifier(),
            detail = %detail,
            "provider stream imbalance"
        );
        TesseraError::ProviderStreamImbalance {
            identifier: entry.identifier().to_string(),
            workspace: workspace.id(),
            detail,
        }
    }

    fn skip_unrecognized(
        &self,
        tag: String,
        attributes: Attributes,
        stream: &mut dyn StreamReader,
        workspace: &mut Workspace,
        outcome: &mut WorkspaceReadOutcome,
    ) -> Result<()> {
        let position = stream.position();
        let mut recorded = self.config.retain_unrecognized.then(|| {
            vec![XmlToken::Start {
                name: tag.clone(),
                attributes,
            }]
        });

        skip_subtree(stream, &tag, |token| {
            if let Some(tokens) = recorded.as_mut() {
                tokens.push(token.clone());
            }
        })?;

        tracing::info!(tag = %tag, workspace = %workspace.id(), "skipped unrecognized fragment");
        outcome.skipped.push(SkippedFragment {
            workspace: workspace.id(),
            tag: tag.clone(),
            position,
        });

        if let Some(tokens) = recorded {
            workspace
                .get_or_default::<RetainedFragments>()
                .push(RetainedFragment::new(tag, tokens));
        }
        Ok(())
    }
}

/// Skip to the end tag matching an already consumed `<tag>`, tracking depth.
///
/// `visit` sees every consumed token, the final end tag included.
pub(crate) fn skip_subtree(
    stream: &mut dyn StreamReader,
    tag: &str,
    mut visit: impl FnMut(&XmlToken),
) -> Result<()> {
    let mut depth = 1usize;
    while depth > 0 {
        let token = stream.next_token()?;
        match &token {
            XmlToken::Start { .. } => depth += 1,
            XmlToken::End { .. } => depth -= 1,
            XmlToken::Text(_) => {}
            XmlToken::Eof => {
                return Err(TesseraError::malformed(
                    stream.position(),
                    format!("unexpected end of document inside <{}>", tag),
                ));
            }
        }
        visit(&token);
    }
    Ok(())
}

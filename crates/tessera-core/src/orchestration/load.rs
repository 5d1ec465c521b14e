//! Load orchestrator

use super::{
    FORMAT_VERSION, ID_ATTRIBUTE, NAME_ATTRIBUTE, PROJECT_ELEMENT, VERSION_ATTRIBUTE,
    WORKSPACE_ELEMENT,
};
use crate::config::LoadConfig;
use crate::error::{Result, TesseraError};
use crate::fragment::{skip_subtree, DispatchEnd, FragmentDispatcher};
use crate::provider::{ProviderRegistry, RegistrySnapshot};
use crate::report::LoadReport;
use crate::workspace::{Project, WorkspaceId};
use crate::xml::{Attributes, StreamReader, XmlToken, XmlTokenReader};

/// Reads a project document back into a [`Project`], dispatching fragments
/// to providers by identifier
pub struct LoadOrchestrator<'r> {
    registry: &'r ProviderRegistry,
    config: &'r LoadConfig,
}

impl<'r> LoadOrchestrator<'r> {
    pub fn new(registry: &'r ProviderRegistry, config: &'r LoadConfig) -> Self {
        Self { registry, config }
    }

    /// Read a whole document from `stream` into `project`.
    ///
    /// Workspaces are matched by id; unknown ids are appended. On a fatal
    /// error the workspaces read so far keep whatever providers applied.
    pub fn load(&self, stream: &mut dyn StreamReader, project: &mut Project) -> Result<LoadReport> {
        let snapshot = self.registry.snapshot_for_load();
        let mut report = LoadReport::default();

        let mut first = stream.next_token()?;
        while matches!(&first, XmlToken::Text(text) if text.trim().is_empty()) {
            first = stream.next_token()?;
        }
        let attributes = match first {
            XmlToken::Start { name, attributes } if name == PROJECT_ELEMENT => attributes,
            XmlToken::Eof => {
                return Err(TesseraError::malformed(stream.position(), "empty document"));
            }
            other => {
                return Err(TesseraError::malformed(
                    stream.position(),
                    format!("expected <{}>, found {}", PROJECT_ELEMENT, other),
                ));
            }
        };
        check_version(&attributes)?;

        loop {
            match stream.next_token()? {
                XmlToken::Start { name, attributes } if name == WORKSPACE_ELEMENT => {
                    self.load_workspace(&attributes, stream, project, &snapshot, &mut report)?;
                }
                XmlToken::Start { name, .. } => {
                    tracing::info!(element = %name, "skipped unknown project element");
                    skip_subtree(stream, &name, |_| {})?;
                }
                XmlToken::End { name } if name == PROJECT_ELEMENT => break,
                XmlToken::Text(_) => {}
                XmlToken::End { name } => {
                    return Err(TesseraError::malformed(
                        stream.position(),
                        format!("unexpected </{}>", name),
                    ));
                }
                XmlToken::Eof => {
                    return Err(TesseraError::malformed(
                        stream.position(),
                        format!("unexpected end of document inside <{}>", PROJECT_ELEMENT),
                    ));
                }
            }
        }

        tracing::info!(
            workspaces = report.workspaces,
            dispatched = report.dispatched,
            skipped = report.skipped.len(),
            warnings = report.warnings.len(),
            "loaded project"
        );
        Ok(report)
    }

    /// Parse `document` and load it into `project`
    pub fn load_from_str(&self, document: &str, project: &mut Project) -> Result<LoadReport> {
        let mut stream = XmlTokenReader::from_str(document);
        self.load(&mut stream, project)
    }

    fn load_workspace(
        &self,
        attributes: &Attributes,
        stream: &mut dyn StreamReader,
        project: &mut Project,
        snapshot: &RegistrySnapshot,
        report: &mut LoadReport,
    ) -> Result<()> {
        let id = workspace_id(attributes);
        let name = attribute(attributes, NAME_ATTRIBUTE).unwrap_or_default();
        let workspace = project.ensure_workspace(id, name);
        tracing::debug!(workspace = %id, name, "loading workspace");

        let outcome = FragmentDispatcher::new(snapshot, self.config).run(
            stream,
            workspace,
            WORKSPACE_ELEMENT,
        )?;
        if outcome.end == DispatchEnd::EndOfDocument {
            tracing::error!(workspace = %id, "document ended inside workspace");
            return Err(TesseraError::malformed(
                stream.position(),
                format!("unexpected end of document inside <{}>", WORKSPACE_ELEMENT),
            ));
        }

        report.workspaces += 1;
        report.dispatched += outcome.dispatched;
        report.skipped.extend(outcome.skipped);
        report.warnings.extend(outcome.warnings);
        Ok(())
    }
}

fn attribute<'a>(attributes: &'a Attributes, key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Missing means the current version; anything newer is rejected
fn check_version(attributes: &Attributes) -> Result<()> {
    let Some(raw) = attribute(attributes, VERSION_ATTRIBUTE) else {
        return Ok(());
    };
    match raw.trim().parse::<u32>() {
        Ok(version) if version <= FORMAT_VERSION => Ok(()),
        _ => Err(TesseraError::UnsupportedVersion(raw.to_string())),
    }
}

/// Id from the `id` attribute, or a fresh one if missing or unparsable
fn workspace_id(attributes: &Attributes) -> WorkspaceId {
    match attribute(attributes, ID_ATTRIBUTE).map(str::parse::<WorkspaceId>) {
        Some(Ok(id)) => id,
        Some(Err(err)) => {
            tracing::warn!(error = %err, "invalid workspace id, generating a new one");
            WorkspaceId::new()
        }
        None => WorkspaceId::new(),
    }
}

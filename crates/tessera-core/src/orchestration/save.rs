//! Save orchestrator

use super::{
    FORMAT_VERSION, ID_ATTRIBUTE, NAME_ATTRIBUTE, PROJECT_ELEMENT, VERSION_ATTRIBUTE,
    WORKSPACE_ELEMENT,
};
use crate::config::SaveConfig;
use crate::error::Result;
use crate::fragment::write_workspace;
use crate::provider::ProviderRegistry;
use crate::report::SaveReport;
use crate::workspace::Project;
use crate::xml::{StreamWriter, XmlTokenWriter};

/// Writes every workspace of a project, one fragment per provider
pub struct SaveOrchestrator<'r> {
    registry: &'r ProviderRegistry,
    config: &'r SaveConfig,
}

impl<'r> SaveOrchestrator<'r> {
    pub fn new(registry: &'r ProviderRegistry, config: &'r SaveConfig) -> Self {
        Self { registry, config }
    }

    /// Write `project` to `stream`.
    ///
    /// The provider snapshot is taken once, so registrations made while the
    /// pass runs do not affect it.
    pub fn save(&self, project: &Project, stream: &mut dyn StreamWriter) -> Result<SaveReport> {
        let snapshot = self.registry.snapshot_for_save();
        let mut report = SaveReport::default();

        stream.start_element(
            PROJECT_ELEMENT,
            &[(VERSION_ATTRIBUTE.to_string(), FORMAT_VERSION.to_string())],
        )?;

        for workspace in project.workspaces() {
            stream.start_element(
                WORKSPACE_ELEMENT,
                &[
                    (ID_ATTRIBUTE.to_string(), workspace.id().to_string()),
                    (NAME_ATTRIBUTE.to_string(), workspace.name().to_string()),
                ],
            )?;

            let outcome = write_workspace(workspace, stream, &snapshot, self.config)?;
            report.workspaces += 1;
            report.fragments_written += outcome.written;
            report.fragments_retained += outcome.retained;
            report.warnings.extend(outcome.warnings);

            stream.end_element(WORKSPACE_ELEMENT)?;
        }

        stream.end_element(PROJECT_ELEMENT)?;

        tracing::info!(
            workspaces = report.workspaces,
            fragments = report.fragments_written,
            warnings = report.warnings.len(),
            "saved project"
        );
        Ok(report)
    }

    /// Render `project` as a complete document, declaration included
    pub fn save_to_string(&self, project: &Project) -> Result<(String, SaveReport)> {
        let mut stream = XmlTokenWriter::in_memory(self.config.indent);
        stream.declaration()?;
        let report = self.save(project, &mut stream)?;
        Ok((stream.into_string()?, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::PropertiesProvider;
    use crate::workspace::Workspace;
    use std::sync::Arc;

    #[test]
    fn test_empty_project() {
        let registry = ProviderRegistry::new();
        let config = SaveConfig {
            indent: 0,
            ..Default::default()
        };
        let (xml, report) = SaveOrchestrator::new(&registry, &config)
            .save_to_string(&Project::new())
            .unwrap();

        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><project version=\"1\"></project>"
        );
        assert_eq!(report.workspaces, 0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_workspace_attributes_and_fragments() {
        let registry = ProviderRegistry::new();
        registry
            .register_provider(Arc::new(PropertiesProvider::new("settings")), 0)
            .unwrap();
        let config = SaveConfig {
            indent: 0,
            ..Default::default()
        };

        let mut project = Project::new();
        let mut workspace = Workspace::new("main & co");
        PropertiesProvider::get_mut(&mut workspace, "settings").set("theme", "dark");
        let id = project.add(workspace);

        let (xml, report) = SaveOrchestrator::new(&registry, &config)
            .save_to_string(&project)
            .unwrap();

        assert!(xml.contains(&format!("<workspace id=\"{}\" name=\"main &amp; co\">", id)));
        assert!(xml.contains("<settings><property name=\"theme\">dark</property></settings>"));
        assert_eq!(report.workspaces, 1);
        assert_eq!(report.fragments_written, 1);
    }
}

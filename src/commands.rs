//! `inspect` and `check` commands

use anyhow::Context;
use serde_json::json;
use std::fmt::Write as _;
use std::path::Path;
use tessera_core::config::load_config;
use tessera_core::{LoadReport, PersistenceConfig, PersistenceService, Project, WorkspaceId};

/// One workspace of a document and the fragment tags it holds
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceSummary {
    pub id: WorkspaceId,
    pub name: String,
    pub fragments: Vec<String>,
}

/// List workspaces and fragment tags without any provider registered
pub fn inspect(path: &Path) -> anyhow::Result<Vec<WorkspaceSummary>> {
    let service = PersistenceService::new(PersistenceConfig::default())?;
    let mut project = Project::new();
    let report = service
        .load_from_path(path, &mut project)
        .with_context(|| format!("failed to inspect {}", path.display()))?;

    Ok(project
        .workspaces()
        .iter()
        .map(|workspace| WorkspaceSummary {
            id: workspace.id(),
            name: workspace.name().to_string(),
            fragments: report
                .skipped
                .iter()
                .filter(|skipped| skipped.workspace == workspace.id())
                .map(|skipped| skipped.tag.clone())
                .collect(),
        })
        .collect())
}

/// Load `path` with the configured properties providers.
///
/// Configuration is read from `config_dir`, or the document's directory.
pub fn check(path: &Path, config_dir: Option<&Path>) -> anyhow::Result<LoadReport> {
    let dir = match config_dir {
        Some(dir) => dir,
        None => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new(".")),
    };
    let config = load_config(dir)
        .with_context(|| format!("failed to load configuration from {}", dir.display()))?;

    let service = PersistenceService::new(config)?;
    let registered = service.register_configured_properties()?;
    tracing::debug!(registered, "registered properties providers");

    let mut project = Project::new();
    let report = service
        .load_from_path(path, &mut project)
        .with_context(|| format!("failed to load {}", path.display()))?;
    Ok(report)
}

pub fn render_inspect(summaries: &[WorkspaceSummary], as_json: bool) -> anyhow::Result<String> {
    if as_json {
        let value: Vec<_> = summaries
            .iter()
            .map(|s| {
                json!({
                    "id": s.id,
                    "name": s.name,
                    "fragments": s.fragments,
                })
            })
            .collect();
        return Ok(serde_json::to_string_pretty(&value)? + "\n");
    }

    let mut out = String::new();
    if summaries.is_empty() {
        writeln!(out, "no workspaces")?;
    }
    for summary in summaries {
        writeln!(out, "{} \"{}\"", summary.id, summary.name)?;
        for tag in &summary.fragments {
            writeln!(out, "  <{}>", tag)?;
        }
    }
    Ok(out)
}

pub fn render_check(report: &LoadReport, as_json: bool) -> anyhow::Result<String> {
    if as_json {
        return Ok(serde_json::to_string_pretty(report)? + "\n");
    }

    let mut out = String::new();
    writeln!(out, "workspaces: {}", report.workspaces)?;
    writeln!(out, "dispatched: {}", report.dispatched)?;
    writeln!(out, "unrecognized: {}", report.skipped.len())?;
    for skipped in &report.skipped {
        writeln!(out, "  <{}> in workspace {}", skipped.tag, skipped.workspace)?;
    }
    writeln!(out, "warnings: {}", report.warnings.len())?;
    for warning in &report.warnings {
        writeln!(out, "  {}", warning)?;
    }
    Ok(out)
}

//! End-to-end save/load behaviour through the public API

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tessera_core::{
    FragmentProvider, FragmentReader, FragmentWriter, LoadConfig, PersistenceConfig,
    PersistenceService, Project, PropertiesProvider, ProviderError, ProviderRegistry,
    ReadFailurePolicy, RetainedFragments, SaveConfig, SaveOrchestrator, TesseraError, Workspace,
    WriteFailurePolicy,
};

/// Bookmarks state kept in the workspace
#[derive(Debug, Clone, Default, PartialEq)]
struct Bookmarks(Vec<(String, u32)>);

/// Provider persisting [`Bookmarks`], counting read dispatches
#[derive(Default)]
struct BookmarksProvider {
    reads: Mutex<usize>,
}

impl FragmentProvider for BookmarksProvider {
    fn identifier(&self) -> &str {
        "bookmarks"
    }

    fn write(&self, out: &mut FragmentWriter, workspace: &Workspace) -> Result<(), ProviderError> {
        if let Some(bookmarks) = workspace.get::<Bookmarks>() {
            for (file, line) in &bookmarks.0 {
                let line = line.to_string();
                out.start_element_with("mark", &[("line", line.as_str())])?;
                out.text(file);
                out.end_element()?;
            }
        }
        Ok(())
    }

    fn read(
        &self,
        input: &mut FragmentReader<'_>,
        workspace: &mut Workspace,
    ) -> Result<(), ProviderError> {
        *self.reads.lock() += 1;
        let mut bookmarks = Bookmarks::default();
        while let Some(mark) = input.next_child()? {
            let line = mark
                .attribute("line")
                .ok_or_else(|| ProviderError::invalid_data("mark without line"))?
                .parse::<u32>()
                .map_err(|e| ProviderError::invalid_data(e.to_string()))?;
            bookmarks.0.push((input.read_text()?, line));
        }
        workspace.insert(bookmarks);
        Ok(())
    }
}

/// Provider with a fixed identifier that records which providers were
/// dispatched to, in order
struct Named {
    identifier: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl Named {
    fn shared(identifier: &str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            identifier: identifier.to_string(),
            log: log.clone(),
        })
    }
}

impl FragmentProvider for Named {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn write(&self, out: &mut FragmentWriter, _: &Workspace) -> Result<(), ProviderError> {
        self.log.lock().push(format!("write:{}", self.identifier));
        out.text_element("value", &self.identifier)
    }

    fn read(&self, input: &mut FragmentReader<'_>, _: &mut Workspace) -> Result<(), ProviderError> {
        self.log.lock().push(format!("read:{}", self.identifier));
        input.finish()
    }
}

/// Always fails to write
struct Broken;

impl FragmentProvider for Broken {
    fn identifier(&self) -> &str {
        "broken"
    }

    fn write(&self, out: &mut FragmentWriter, _: &Workspace) -> Result<(), ProviderError> {
        // Leaves partial output behind; none of it may reach the document
        out.start_element("half")?;
        Err(ProviderError::other("disk on fire"))
    }

    fn read(&self, input: &mut FragmentReader<'_>, _: &mut Workspace) -> Result<(), ProviderError> {
        input.finish()
    }
}

/// Stops one token before its end tag
struct ShortReader;

impl FragmentProvider for ShortReader {
    fn identifier(&self) -> &str {
        "short"
    }

    fn write(&self, out: &mut FragmentWriter, _: &Workspace) -> Result<(), ProviderError> {
        out.text_element("item", "x")
    }

    fn read(&self, input: &mut FragmentReader<'_>, _: &mut Workspace) -> Result<(), ProviderError> {
        // <item>x</item> but not </short>
        input.next_child()?;
        input.read_text()?;
        Ok(())
    }
}

fn service(config: PersistenceConfig) -> PersistenceService {
    PersistenceService::new(config).unwrap()
}

fn sample_project() -> Project {
    let mut project = Project::new();
    let mut main = Workspace::new("main");
    main.insert(Bookmarks(vec![
        ("src/lib.rs".to_string(), 12),
        ("README <draft>.md".to_string(), 1),
    ]));
    PropertiesProvider::get_mut(&mut main, "settings").set("theme", "dark");
    project.add(main);

    let mut scratch = Workspace::new("scratch");
    scratch.insert(Bookmarks(vec![("notes.txt".to_string(), 3)]));
    project.add(scratch);
    project
}

#[test]
fn test_round_trip() {
    let service = service(PersistenceConfig::default());
    let bookmarks = Arc::new(BookmarksProvider::default());
    service.register(bookmarks.clone(), 0).unwrap();
    service
        .register(Arc::new(PropertiesProvider::new("settings")), 1)
        .unwrap();

    let project = sample_project();
    let (xml, save_report) = service.save_to_string(&project).unwrap();
    assert_eq!(save_report.workspaces, 2);
    assert!(save_report.is_clean());

    let mut restored = Project::new();
    let load_report = service.load_from_str(&xml, &mut restored).unwrap();

    assert_eq!(*bookmarks.reads.lock(), 2);
    assert_eq!(load_report.workspaces, 2);
    assert!(load_report.skipped.is_empty());
    assert_eq!(restored.len(), 2);
    for original in project.workspaces() {
        let workspace = restored.get(original.id()).unwrap();
        assert_eq!(workspace.name(), original.name());
        assert_eq!(workspace.get::<Bookmarks>(), original.get::<Bookmarks>());
        assert_eq!(
            PropertiesProvider::get(workspace, "settings"),
            PropertiesProvider::get(original, "settings")
        );
    }
}

#[test]
fn test_whitespace_values_survive_indented_round_trip() {
    let service = service(PersistenceConfig::default());
    service
        .register(Arc::new(PropertiesProvider::new("settings")), 0)
        .unwrap();

    let mut project = Project::new();
    let mut workspace = Workspace::new("main");
    let settings = PropertiesProvider::get_mut(&mut workspace, "settings");
    settings.set("tab", "    ");
    settings.set("newline", "\n");
    settings.set("padded", "  x  ");
    let id = project.add(workspace);

    let (xml, _) = service.save_to_string(&project).unwrap();
    let mut restored = Project::new();
    service.load_from_str(&xml, &mut restored).unwrap();

    let settings = PropertiesProvider::get(restored.get(id).unwrap(), "settings").unwrap();
    assert_eq!(settings.get("tab"), Some("    "));
    assert_eq!(settings.get("newline"), Some("\n"));
    assert_eq!(settings.get("padded"), Some("  x  "));
}

#[test]
fn test_duplicate_identifier_rejected() {
    let registry = ProviderRegistry::new();
    registry
        .register_provider(Arc::new(BookmarksProvider::default()), 0)
        .unwrap();

    let err = registry
        .register_provider(Arc::new(BookmarksProvider::default()), 5)
        .unwrap_err();

    assert!(matches!(err, TesseraError::DuplicateIdentifier(ref id) if id == "bookmarks"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_order_follows_position_then_registration() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = ProviderRegistry::new();
    registry.register_provider(Named::shared("a", &log), 3).unwrap();
    registry.register_provider(Named::shared("b", &log), 1).unwrap();
    registry.register_provider(Named::shared("c", &log), 2).unwrap();
    registry.register_provider(Named::shared("d", &log), 1).unwrap();

    assert_eq!(registry.snapshot_for_save().identifiers(), vec!["b", "d", "c", "a"]);

    let mut project = Project::new();
    project.add(Workspace::new("main"));
    let config = SaveConfig {
        indent: 0,
        ..Default::default()
    };
    let (xml, _) = SaveOrchestrator::new(&registry, &config)
        .save_to_string(&project)
        .unwrap();

    let b = xml.find("<b>").unwrap();
    let d = xml.find("<d>").unwrap();
    let c = xml.find("<c>").unwrap();
    let a = xml.find("<a>").unwrap();
    assert!(b < d && d < c && c < a);
    assert_eq!(
        *log.lock(),
        vec!["write:b", "write:d", "write:c", "write:a"]
    );
}

#[test]
fn test_unknown_fragment_is_skipped() {
    let service = service(PersistenceConfig::default());
    let bookmarks = Arc::new(BookmarksProvider::default());
    service.register(bookmarks.clone(), 0).unwrap();

    let document = r#"<?xml version="1.0" encoding="UTF-8"?>
<project version="1">
  <workspace id="0b6d3c6a-4a8e-4f7e-9c1a-2f1d5e2b7a10" name="main">
    <unknown-provider>
      <deep><bookmarks><mark line="1">trap</mark></bookmarks></deep>
    </unknown-provider>
    <bookmarks>
      <mark line="7">kept.rs</mark>
    </bookmarks>
  </workspace>
</project>"#;

    let mut project = Project::new();
    let report = service.load_from_str(document, &mut project).unwrap();

    assert_eq!(report.dispatched, 1);
    assert_eq!(*bookmarks.reads.lock(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].tag, "unknown-provider");
    assert_eq!(
        project.workspaces()[0].get::<Bookmarks>(),
        Some(&Bookmarks(vec![("kept.rs".to_string(), 7)]))
    );
}

#[test]
fn test_short_read_is_imbalance() {
    let service = service(PersistenceConfig::default());
    service.register(Arc::new(ShortReader), 0).unwrap();
    let bookmarks = Arc::new(BookmarksProvider::default());
    service.register(bookmarks.clone(), 1).unwrap();

    let mut project = Project::new();
    project.add(Workspace::new("main"));
    let (xml, _) = service.save_to_string(&project).unwrap();

    let err = service
        .load_from_str(&xml, &mut Project::new())
        .unwrap_err();

    assert!(matches!(
        err,
        TesseraError::ProviderStreamImbalance { ref identifier, .. } if identifier == "short"
    ));
    // The stray </short> must never be handed to the next provider
    assert_eq!(*bookmarks.reads.lock(), 0);
}

#[test]
fn test_failing_writer_is_isolated() {
    let service = service(PersistenceConfig::default());
    service.register(Arc::new(Broken), 0).unwrap();
    let bookmarks = Arc::new(BookmarksProvider::default());
    service.register(bookmarks.clone(), 1).unwrap();

    let project = sample_project();
    let (xml, report) = service.save_to_string(&project).unwrap();

    assert!(!xml.contains("<broken"));
    assert!(!xml.contains("<half"));
    assert_eq!(report.failed_providers(), vec!["broken"]);
    assert_eq!(report.warnings.len(), 2);
    assert_eq!(report.fragments_written, 2);

    let mut restored = Project::new();
    let load_report = service.load_from_str(&xml, &mut restored).unwrap();
    assert!(load_report.is_clean());
    assert_eq!(*bookmarks.reads.lock(), 2);
    let first = &project.workspaces()[0];
    assert_eq!(
        restored.get(first.id()).unwrap().get::<Bookmarks>(),
        first.get::<Bookmarks>()
    );
}

#[test]
fn test_empty_project() {
    let service = service(PersistenceConfig::default());
    let bookmarks = Arc::new(BookmarksProvider::default());
    service.register(bookmarks.clone(), 0).unwrap();

    let (xml, save_report) = service.save_to_string(&Project::new()).unwrap();
    let mut restored = Project::new();
    let load_report = service.load_from_str(&xml, &mut restored).unwrap();

    assert_eq!(save_report.workspaces, 0);
    assert_eq!(load_report.dispatched, 0);
    assert!(restored.is_empty());
    assert_eq!(*bookmarks.reads.lock(), 0);
}

#[test]
fn test_marker_policy_output_loads_cleanly() {
    let mut config = PersistenceConfig::default();
    config.save.write_failure_policy = WriteFailurePolicy::Marker;
    let service = service(config);
    service.register(Arc::new(Broken), 0).unwrap();
    service
        .register(Arc::new(BookmarksProvider::default()), 1)
        .unwrap();

    let mut project = Project::new();
    project.add(Workspace::new("main"));
    let (xml, report) = service.save_to_string(&project).unwrap();

    assert!(xml.contains("<fragment-fault provider=\"broken\">disk on fire</fragment-fault>"));
    assert_eq!(report.warnings.len(), 1);

    let load_report = service.load_from_str(&xml, &mut Project::new()).unwrap();
    assert_eq!(load_report.skipped.len(), 1);
    assert_eq!(load_report.skipped[0].tag, "fragment-fault");
    assert!(load_report.is_clean());
}

#[test]
fn test_abort_policies() {
    let mut config = PersistenceConfig::default();
    config.save.write_failure_policy = WriteFailurePolicy::Abort;
    let saver = service(config);
    saver.register(Arc::new(Broken), 0).unwrap();
    let mut project = Project::new();
    project.add(Workspace::new("main"));
    assert!(matches!(
        saver.save_to_string(&project),
        Err(TesseraError::ProviderWriteFailure { ref identifier, .. }) if identifier == "broken"
    ));

    let config = PersistenceConfig {
        load: LoadConfig {
            read_failure_policy: ReadFailurePolicy::Abort,
            ..Default::default()
        },
        ..Default::default()
    };
    let loader = service(config);
    loader
        .register(Arc::new(BookmarksProvider::default()), 0)
        .unwrap();
    let document = "<project><workspace name=\"w\">\
                      <bookmarks><mark line=\"many\">x</mark></bookmarks>\
                    </workspace></project>";
    assert!(matches!(
        loader.load_from_str(document, &mut Project::new()),
        Err(TesseraError::ProviderReadFailure { ref identifier, .. }) if identifier == "bookmarks"
    ));
}

#[test]
fn test_read_failure_recovers_by_default() {
    let service = service(PersistenceConfig::default());
    service
        .register(Arc::new(BookmarksProvider::default()), 0)
        .unwrap();
    service
        .register(Arc::new(PropertiesProvider::new("settings")), 1)
        .unwrap();

    let document = "<project><workspace name=\"w\">\
                      <bookmarks><mark line=\"many\">x</mark><mark line=\"2\">y</mark></bookmarks>\
                      <settings><property name=\"k\">v</property></settings>\
                    </workspace></project>";
    let mut project = Project::new();
    let report = service.load_from_str(document, &mut project).unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].identifier(), "bookmarks");
    let workspace = &project.workspaces()[0];
    assert!(workspace.get::<Bookmarks>().is_none());
    assert_eq!(
        PropertiesProvider::get(workspace, "settings").unwrap().get("k"),
        Some("v")
    );
}

#[test]
fn test_retained_fragments_survive_round_trip() {
    let mut config = PersistenceConfig::default();
    config.load.retain_unrecognized = true;
    let service = service(config);
    service
        .register(Arc::new(BookmarksProvider::default()), 0)
        .unwrap();

    let document = "<project><workspace id=\"0b6d3c6a-4a8e-4f7e-9c1a-2f1d5e2b7a10\" name=\"w\">\
                      <plugin mode=\"fast\"><opt>a &amp; b</opt></plugin>\
                      <bookmarks><mark line=\"4\">x.rs</mark></bookmarks>\
                    </workspace></project>";
    let mut project = Project::new();
    service.load_from_str(document, &mut project).unwrap();
    assert_eq!(
        project.workspaces()[0]
            .get::<RetainedFragments>()
            .map(|r| r.tags()),
        Some(vec!["plugin"])
    );

    let (xml, report) = service.save_to_string(&project).unwrap();
    assert_eq!(report.fragments_retained, 1);
    assert!(xml.contains("<plugin mode=\"fast\">"));
    assert!(xml.contains("a &amp; b"));

    let mut again = Project::new();
    let load_report = service.load_from_str(&xml, &mut again).unwrap();
    assert_eq!(load_report.skipped.len(), 1);
    let workspace = &again.workspaces()[0];
    assert_eq!(
        workspace.get::<Bookmarks>(),
        Some(&Bookmarks(vec![("x.rs".to_string(), 4)]))
    );
    assert_eq!(workspace.get::<RetainedFragments>().unwrap().len(), 1);
}

#[test]
fn test_unsupported_version_rejected() {
    let service = service(PersistenceConfig::default());
    let err = service
        .load_from_str("<project version=\"7\"></project>", &mut Project::new())
        .unwrap_err();
    assert!(matches!(err, TesseraError::UnsupportedVersion(ref v) if v == "7"));
}

#[test]
fn test_truncated_document_is_malformed() {
    let service = service(PersistenceConfig::default());
    service
        .register(Arc::new(BookmarksProvider::default()), 0)
        .unwrap();

    let err = service
        .load_from_str(
            "<project><workspace name=\"w\"><bookmarks><mark line=\"1\">x",
            &mut Project::new(),
        )
        .unwrap_err();
    assert!(matches!(err, TesseraError::MalformedDocument { .. }));
}

#[test]
fn test_save_to_path_writes_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.xml");
    let service = service(PersistenceConfig::default());
    service
        .register(Arc::new(BookmarksProvider::default()), 0)
        .unwrap();

    service.save_to_path(&sample_project(), &path).unwrap();
    service.save_to_path(&sample_project(), &path).unwrap();

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(entries, vec!["project.xml"]);

    let mut project = Project::new();
    let report = service.load_from_path(&path, &mut project).unwrap();
    assert_eq!(report.workspaces, 2);
}

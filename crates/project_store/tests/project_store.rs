use std::collections::HashSet;
use std::fs;

use pretty_assertions::assert_eq;
use project_store::{
    storage_root, CodeSnippet, FileStorage, MemoryStorage, Message, MessageRole, Project,
    ProjectPhase, ProjectStore, ProjectStoreError, SnippetCategory, StorageBackend,
    UpsertOutcome, DEFAULT_PROJECT_NAME, PROJECTS_KEY,
};

struct UnwritableStorage;

impl StorageBackend for UnwritableStorage {
    fn read(&self, _key: &str) -> Result<Option<String>, ProjectStoreError> {
        Ok(None)
    }

    fn write(&self, _key: &str, _value: &str) -> Result<(), ProjectStoreError> {
        Err(ProjectStoreError::io(
            "writing storage file",
            "/unwritable",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        ))
    }
}

fn project_with_history(id: &str) -> Project {
    let mut project = Project::new(id, "With history", 1_000);
    project.current_phase = ProjectPhase::Build;
    project.workspace.messages.push(Message {
        id: "m-1".to_string(),
        role: MessageRole::User,
        content: "make a button".to_string(),
        timestamp: 1_001,
    });
    project.workspace.messages.push(Message {
        id: "m-2".to_string(),
        role: MessageRole::Assistant,
        content: "```tsx\n<button/>\n```".to_string(),
        timestamp: 1_002,
    });
    project.workspace.snippets.push(CodeSnippet {
        id: "s-1".to_string(),
        filename: "frontend-1002.tsx".to_string(),
        language: "tsx".to_string(),
        code: "<button/>".to_string(),
        category: SnippetCategory::Frontend,
        explanation: String::new(),
    });
    project
}

#[test]
fn open_on_empty_backend_yields_empty_list() {
    let store = ProjectStore::open(MemoryStorage::new());

    assert!(store.is_empty());
    assert!(store.load().is_empty());
}

#[test]
fn save_then_load_round_trips_content() {
    let storage = MemoryStorage::new();
    let mut store = ProjectStore::open(storage.clone());
    let projects = vec![project_with_history("p-1"), Project::new("p-2", "Empty", 5)];

    store.save(projects.clone()).expect("save should succeed");

    assert_eq!(store.load(), projects);
    assert_eq!(ProjectStore::open(storage).projects(), projects.as_slice());
}

#[test]
fn malformed_stored_list_fails_open_to_empty() {
    let storage = MemoryStorage::new();
    storage.insert_raw(PROJECTS_KEY, "{not json");

    let store = ProjectStore::open(storage);

    assert!(store.is_empty());
    assert!(matches!(
        store.try_load(),
        Err(ProjectStoreError::JsonParse { .. })
    ));
}

#[test]
fn create_inserts_empty_project_at_front_and_persists() {
    let storage = MemoryStorage::new();
    let mut store = ProjectStore::open(storage.clone());

    let first = store.create(Some("First")).expect("create first");
    let second = store.create(None).expect("create second");

    assert_eq!(second.name, DEFAULT_PROJECT_NAME);
    assert!(second.workspace.messages.is_empty());
    assert!(second.workspace.snippets.is_empty());
    assert_eq!(second.created_at, second.last_modified);
    assert_eq!(store.projects()[0].project_id, second.project_id);
    assert_eq!(store.projects()[1].project_id, first.project_id);

    let reopened = ProjectStore::open(storage);
    assert_eq!(reopened.len(), 2);
    assert_eq!(reopened.projects()[0].project_id, second.project_id);
}

#[test]
fn create_treats_blank_name_as_missing() {
    let mut store = ProjectStore::open(MemoryStorage::new());

    let project = store.create(Some("   ")).expect("create");
    assert_eq!(project.name, DEFAULT_PROJECT_NAME);

    let trimmed = store.create(Some("  Shop  ")).expect("create");
    assert_eq!(trimmed.name, "Shop");
}

#[test]
fn created_ids_are_unique() {
    let mut store = ProjectStore::open(MemoryStorage::new());

    let ids: HashSet<String> = (0..64)
        .map(|_| store.create(None).expect("create").project_id)
        .collect();

    assert_eq!(ids.len(), 64);
}

#[test]
fn upsert_replaces_matching_id_in_place() {
    let mut store = ProjectStore::open(MemoryStorage::new());
    let a = store.create(Some("A")).expect("create a");
    let b = store.create(Some("B")).expect("create b");

    let mut renamed = a.clone();
    renamed.name = "A2".to_string();
    let outcome = store.upsert(renamed).expect("upsert");

    assert_eq!(outcome, UpsertOutcome::Replaced);
    assert_eq!(store.len(), 2);
    assert_eq!(store.projects()[0].project_id, b.project_id);
    assert_eq!(store.projects()[1].name, "A2");
}

#[test]
fn upsert_appends_unknown_id() {
    let mut store = ProjectStore::open(MemoryStorage::new());
    store.create(Some("existing")).expect("create");

    let outcome = store
        .upsert(Project::new("foreign", "Foreign", 9))
        .expect("upsert");

    assert_eq!(outcome, UpsertOutcome::Appended);
    assert_eq!(
        store.projects().last().map(|project| project.project_id.as_str()),
        Some("foreign")
    );
}

#[test]
fn failed_persist_keeps_in_memory_project() {
    let mut store = ProjectStore::open(UnwritableStorage);

    let error = store.create(Some("kept")).expect_err("write must fail");

    assert!(matches!(error, ProjectStoreError::Io { .. }));
    assert_eq!(store.len(), 1);
    assert_eq!(store.projects()[0].name, "kept");
}

#[test]
fn file_storage_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let root = storage_root(dir.path());

    let created = {
        let mut store = ProjectStore::open(FileStorage::new(&root));
        store.create(Some("On disk")).expect("create")
    };

    let stored = fs::read_to_string(root.join("cockpit_projects.json"))
        .expect("projects file should exist");
    assert!(stored.contains("\"projectId\""));

    let reopened = ProjectStore::open(FileStorage::new(&root));
    assert_eq!(reopened.projects(), std::slice::from_ref(&created));
}

#[test]
fn stored_list_written_elsewhere_is_readable() {
    let storage = MemoryStorage::new();
    storage.insert_raw(
        PROJECTS_KEY,
        r#"[{
            "projectId": "legacy",
            "name": "Legacy",
            "status": "paused",
            "currentPhase": "deploy",
            "createdAt": 1,
            "lastModified": 2,
            "workspace": { "messages": [], "snippets": [] }
        }]"#,
    );

    let store = ProjectStore::open(storage);
    let project = store.get("legacy").expect("legacy project should load");

    assert_eq!(project.current_phase, ProjectPhase::Deploy);
    assert_eq!(project.status.as_str(), "paused");
}

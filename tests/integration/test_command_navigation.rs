//! Go-to-definition from invoke() call sites across one or more roots

use crate::common::{TestProject, sample_code};
use crosslink::config::CommandIndexConfig;
use crosslink::{CommandIndex, InvokeDefinitionProvider, WorkspaceIndexManager};
use std::sync::Arc;

fn unwatched() -> CommandIndexConfig {
    CommandIndexConfig {
        watch: false,
        ..Default::default()
    }
}

async fn manager_for(projects: &[&TestProject]) -> Arc<WorkspaceIndexManager> {
    let manager = Arc::new(WorkspaceIndexManager::new(unwatched()));
    let roots: Vec<_> = projects.iter().map(|p| p.path().to_path_buf()).collect();
    manager.initialize(&roots).await.unwrap();
    manager
}

#[tokio::test]
async fn test_registration_list_filters_definitions() {
    let project = TestProject::new();
    project.add_file(
        "src-tauri/src/launcher/commands.rs",
        sample_code::LAUNCHER_COMMANDS,
    );
    project.add_file("src-tauri/src/lib.rs", sample_code::REGISTRATION);

    let manager = manager_for(&[&project]).await;
    let index = manager.index(project.path()).unwrap();
    let snapshot = index.snapshot();

    assert!(snapshot.is_filtered());
    assert_eq!(
        snapshot.command_names(),
        vec!["retrieve_launcher_config", "update_launcher_config"]
    );
    assert!(manager.get_definitions("unregistered_helper").is_empty());
}

#[tokio::test]
async fn test_without_registration_every_definition_is_kept() {
    let project = TestProject::new();
    project.add_file(
        "src-tauri/src/launcher/commands.rs",
        sample_code::LAUNCHER_COMMANDS,
    );

    let manager = manager_for(&[&project]).await;
    let snapshot = manager.index(project.path()).unwrap().snapshot();

    assert!(!snapshot.is_filtered());
    assert_eq!(snapshot.command_count(), 3);
    assert_eq!(manager.get_definitions("unregistered_helper").len(), 1);
}

#[tokio::test]
async fn test_ambiguous_names_return_every_candidate() {
    let first = TestProject::new();
    first.add_file("src-tauri/src/a.rs", "#[tauri::command]\nfn shared() {}\n");
    first.add_file("src-tauri/src/b.rs", "#[tauri::command]\nasync fn shared() {}\n");
    let second = TestProject::new();
    second.add_file("src-tauri/src/c.rs", "#[tauri::command]\npub fn shared() {}\n");

    let manager = manager_for(&[&first, &second]).await;
    let provider = InvokeDefinitionProvider::new(manager, &unwatched());

    let text = "await invoke('shared', { id });";
    let offset = text.find("shared").unwrap();
    let locations = provider.provide_definition(text, offset);

    assert_eq!(locations.len(), 3);
    let files: Vec<_> = locations
        .iter()
        .map(|location| location.path.file_name().unwrap().to_str().unwrap().to_string())
        .collect();
    for expected in ["a.rs", "b.rs", "c.rs"] {
        assert!(files.iter().any(|f| f == expected), "missing {expected}");
    }
}

#[tokio::test]
async fn test_definition_range_points_at_function_name() {
    let project = TestProject::new();
    project.add_file(
        "src-tauri/src/launcher/commands.rs",
        sample_code::LAUNCHER_COMMANDS,
    );

    let manager = manager_for(&[&project]).await;
    let provider = InvokeDefinitionProvider::new(manager, &unwatched());

    let text = r#"invoke<void>("update_launcher_config", { keyPath, value })"#;
    let offset = text.find("update").unwrap() + 3;
    let locations = provider.provide_definition(text, offset);
    assert_eq!(locations.len(), 1);

    let source = project.read("src-tauri/src/launcher/commands.rs");
    let range = locations[0].range;
    let line = source.lines().nth(range.start_line as usize).unwrap();
    assert_eq!(
        &line[range.start_column as usize..range.end_column as usize],
        "update_launcher_config"
    );
}

#[tokio::test]
async fn test_excluded_directories_are_not_indexed() {
    let project = TestProject::new();
    project.add_file("src-tauri/src/lib.rs", "#[tauri::command]\nfn kept() {}\n");
    project.add_file(
        "src-tauri/src/target/generated.rs",
        "#[tauri::command]\nfn generated() {}\n",
    );

    let index = Arc::new(CommandIndex::new(project.path(), unwatched()).unwrap());
    index.initialize().await.unwrap();

    assert_eq!(index.snapshot().command_names(), vec!["kept"]);
}

#[tokio::test]
async fn test_sync_roots_drops_removed_roots() {
    let first = TestProject::new();
    first.add_file("src-tauri/src/lib.rs", "#[tauri::command]\nfn only_first() {}\n");
    let second = TestProject::new();
    second.add_file("src-tauri/src/lib.rs", "#[tauri::command]\nfn only_second() {}\n");

    let manager = manager_for(&[&first, &second]).await;
    assert_eq!(manager.roots().len(), 2);

    manager
        .sync_roots(&[second.path().to_path_buf()])
        .await
        .unwrap();

    assert_eq!(manager.roots().len(), 1);
    assert!(manager.get_definitions("only_first").is_empty());
    assert_eq!(manager.get_definitions("only_second").len(), 1);
}

//! Watched indexes pick up source edits after the debounce window

use crate::common::TestProject;
use crosslink::CommandIndex;
use crosslink::config::CommandIndexConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};

async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    condition()
}

#[tokio::test]
async fn test_watched_index_sees_new_commands() {
    let project = TestProject::new();
    project.add_file("src-tauri/src/lib.rs", "#[tauri::command]\nfn before() {}\n");

    let config = CommandIndexConfig {
        debounce_ms: 100,
        ..Default::default()
    };
    let index = Arc::new(CommandIndex::new(project.path(), config).unwrap());
    index.initialize().await.unwrap();
    assert!(index.is_watching());
    assert_eq!(index.snapshot().command_names(), vec!["before"]);

    // A burst of edits
    for i in 0..5 {
        project.add_file(
            "src-tauri/src/extra.rs",
            &format!("#[tauri::command]\nfn after_{i}() {{}}\n"),
        );
    }

    let appeared = wait_for(|| index.definitions("after_4").len() == 1).await;
    assert!(appeared, "rebuild did not pick up the edit");
    assert!(index.definitions("after_0").is_empty());

    index.dispose();
    assert!(!index.is_watching());
}

#[tokio::test]
async fn test_irrelevant_files_do_not_change_the_index() {
    let project = TestProject::new();
    project.add_file("src-tauri/src/lib.rs", "#[tauri::command]\nfn stable() {}\n");

    let config = CommandIndexConfig {
        debounce_ms: 50,
        ..Default::default()
    };
    let index = Arc::new(CommandIndex::new(project.path(), config).unwrap());
    index.initialize().await.unwrap();
    let before = index.snapshot();

    project.add_file("src/app.ts", "invoke('stable')");
    project.add_file("src-tauri/target/debug/build.rs", "#[tauri::command]\nfn x() {}\n");
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert!(Arc::ptr_eq(&before, &index.snapshot()));
    index.dispose();
}

#[tokio::test]
async fn test_new_module_directory_is_watched() {
    let project = TestProject::new();
    project.add_file("src-tauri/src/lib.rs", "#[tauri::command]\nfn root_cmd() {}\n");

    let config = CommandIndexConfig {
        debounce_ms: 100,
        ..Default::default()
    };
    let index = Arc::new(CommandIndex::new(project.path(), config).unwrap());
    index.initialize().await.unwrap();

    project.add_file(
        "src-tauri/src/launcher/mod.rs",
        "#[tauri::command]\nfn launch() {}\n",
    );
    assert!(
        wait_for(|| index.definitions("launch").len() == 1).await,
        "new directory was not indexed"
    );

    // Edits inside the new directory arrive through its own watch
    project.add_file(
        "src-tauri/src/launcher/extra.rs",
        "#[tauri::command]\nfn relaunch() {}\n",
    );
    assert!(
        wait_for(|| index.definitions("relaunch").len() == 1).await,
        "edit in new directory was not picked up"
    );

    index.dispose();
}

#[tokio::test]
async fn test_source_tree_created_after_start() {
    let project = TestProject::new();
    project.add_file("package.json", "{}");

    let config = CommandIndexConfig {
        debounce_ms: 100,
        ..Default::default()
    };
    let index = Arc::new(CommandIndex::new(project.path(), config).unwrap());
    index.initialize().await.unwrap();
    assert!(index.is_watching());
    assert_eq!(index.snapshot().command_count(), 0);

    project.add_file("src-tauri/src/lib.rs", "#[tauri::command]\nfn late() {}\n");
    assert!(
        wait_for(|| index.definitions("late").len() == 1).await,
        "late source tree was not indexed"
    );

    index.dispose();
}

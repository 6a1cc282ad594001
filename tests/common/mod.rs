#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch workspace laid out like a Tauri app
pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn read(&self, path: &str) -> String {
        fs::read_to_string(self.dir.path().join(path)).expect("Failed to read file")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

pub mod sample_code {
    pub const LAUNCHER_COMMANDS: &str = r#"use tauri::State;

#[tauri::command]
pub async fn retrieve_launcher_config(state: State<'_, AppState>) -> SJMCLResult<Config> {
    Ok(state.config.clone())
}

#[tauri::command(rename_all = "snake_case")]
pub fn update_launcher_config(key_path: String, value: String) -> SJMCLResult<()> {
    Ok(())
}

#[tauri::command]
fn unregistered_helper() {}
"#;

    pub const REGISTRATION: &str = r#"pub fn run() {
    tauri::Builder::default()
        .invoke_handler(tauri::generate_handler![
            launcher::commands::retrieve_launcher_config,
            launcher::commands::update_launcher_config, // settings page
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
"#;

    pub const EN_LOCALE: &str = r#"{
  "General": {
    "copy": {
      "text": "Copy"
    },
    "cancel": "Cancel"
  }
}
"#;
}

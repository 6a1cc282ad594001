//! Configuration module for the command index and locale resolver.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CL_` and use double underscores
//! to separate nested levels:
//! - `CL_COMMANDS__DEBOUNCE_MS=100` sets `commands.debounce_ms`
//! - `CL_COMMANDS__WATCH=false` sets `commands.watch`
//! - `CL_LOCALES__SETTLE_DELAY_MS=500` sets `locales.settle_delay_ms`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory holding the settings file, searched upwards from the current directory
pub const CONFIG_DIR: &str = ".crosslink";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Workspace roots to index (defaults to the detected workspace root)
    #[serde(default)]
    pub workspace_roots: Vec<PathBuf>,

    /// Command definition index settings
    #[serde(default)]
    pub commands: CommandIndexConfig,

    /// Locale file settings
    #[serde(default)]
    pub locales: LocaleConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CommandIndexConfig {
    /// Root-relative glob selecting declaration sources
    #[serde(default = "default_source_glob")]
    pub source_glob: String,

    /// Directory names never descended into
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    /// Attribute path marking a function as an exposed command
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Macro whose argument list registers the reachable commands
    #[serde(default = "default_registration_macro")]
    pub registration_macro: String,

    /// Callee names whose first string argument is a command name
    #[serde(default = "default_invoke_functions")]
    pub invoke_functions: Vec<String>,

    /// Debounce interval in milliseconds for watcher-triggered rebuilds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Rebuild automatically when declaration sources change
    #[serde(default = "default_true")]
    pub watch: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LocaleConfig {
    /// Root-relative glob selecting locale files
    #[serde(default = "default_locale_glob")]
    pub locale_glob: String,

    /// Only documents below this root-relative prefix get locale hovers
    #[serde(default = "default_source_prefix")]
    pub source_prefix: String,

    /// Callee names whose first string argument is a translation key
    #[serde(default = "default_translate_functions")]
    pub translate_functions: Vec<String>,

    /// Delay between writing a locale file and re-reading it (milliseconds)
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Character budget of value previews
    #[serde(default = "default_preview_max_chars")]
    pub preview_max_chars: usize,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_source_glob() -> String {
    "src-tauri/src/**/*.rs".to_string()
}
fn default_exclude_dirs() -> Vec<String> {
    ["target", "node_modules", ".git", "out", "dist", "build"]
        .iter()
        .map(|dir| dir.to_string())
        .collect()
}
fn default_marker() -> String {
    "tauri::command".to_string()
}
fn default_registration_macro() -> String {
    "generate_handler".to_string()
}
fn default_invoke_functions() -> Vec<String> {
    vec!["invoke".to_string()]
}
fn default_debounce_ms() -> u64 {
    250
}
fn default_locale_glob() -> String {
    "src/locales/*.json".to_string()
}
fn default_source_prefix() -> String {
    "src/".to_string()
}
fn default_translate_functions() -> Vec<String> {
    vec!["t".to_string()]
}
fn default_settle_delay_ms() -> u64 {
    200
}
fn default_preview_max_chars() -> usize {
    72
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            workspace_roots: Vec::new(),
            commands: CommandIndexConfig::default(),
            locales: LocaleConfig::default(),
        }
    }
}

impl Default for CommandIndexConfig {
    fn default() -> Self {
        Self {
            source_glob: default_source_glob(),
            exclude_dirs: default_exclude_dirs(),
            marker: default_marker(),
            registration_macro: default_registration_macro(),
            invoke_functions: default_invoke_functions(),
            debounce_ms: default_debounce_ms(),
            watch: true,
        }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            locale_glob: default_locale_glob(),
            source_prefix: default_source_prefix(),
            translate_functions: default_translate_functions(),
            settle_delay_ms: default_settle_delay_ms(),
            preview_max_chars: default_preview_max_chars(),
        }
    }
}

impl CommandIndexConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl LocaleConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_roots.is_empty() {
                    settings.workspace_roots.extend(Self::workspace_root());
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels, single underscores stay
            .merge(Env::prefixed("CL_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the settings file by looking for the config directory
    /// Searches from current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join("settings.toml"))
    }

    /// Get the workspace root directory (where the config directory is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Roots to index: configured roots, else the current directory
    pub fn effective_roots(&self) -> Vec<PathBuf> {
        if !self.workspace_roots.is_empty() {
            return self.workspace_roots.clone();
        }
        std::env::current_dir().map(|dir| vec![dir]).unwrap_or_default()
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = r#"# Crosslink Configuration File

# Version of the configuration schema
version = 1

# Global debug mode
debug = false

# Workspace roots to index (empty = directory containing .crosslink)
workspace_roots = []

[commands]
# Declaration sources, relative to each workspace root
source_glob = "src-tauri/src/**/*.rs"

# Directories that are never scanned
exclude_dirs = ["target", "node_modules", ".git", "out", "dist", "build"]

# Attribute marking an exposed command, and the macro registering them
marker = "tauri::command"
registration_macro = "generate_handler"

# Call sites whose first string argument names a command
invoke_functions = ["invoke"]

# Rebuild when sources change, coalescing bursts within this window
watch = true
debounce_ms = 250

[locales]
# Locale files; the file stem is the locale id
locale_glob = "src/locales/*.json"

# Frontend sources eligible for locale hovers
source_prefix = "src/"
translate_functions = ["t"]

# Wait after writing a locale file before re-reading it
settle_delay_ms = 200

# Maximum characters of a value preview
preview_max_chars = 72
"#;

        std::fs::write(&config_path, template)?;

        Ok(config_path)
    }
}

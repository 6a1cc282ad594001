//! Tolerant regex scanner for exposed command declarations.
//!
//! Two kinds of evidence are collected from declaration sources:
//! - functions annotated with the exposure marker (`#[tauri::command]`)
//! - names listed in the registration macro (`generate_handler![...]`)
//!
//! Sources that match neither contribute nothing; there is no parse failure.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::config::CommandIndexConfig;
use crate::error::{IndexError, IndexResult};
use crate::text::TextOffsetMapper;
use crate::types::{Location, Range};

static COMMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"//[^\n]*|/\*(?s:.)*?\*/").expect("comment pattern is valid")
});

static ENTRY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\s*::\s*[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("entry pattern is valid")
});

/// One exposed function found in a declaration source.
///
/// `range` covers the function name, not the marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub name: String,
    pub path: PathBuf,
    pub range: Range,
}

impl CommandDefinition {
    pub fn location(&self) -> Location {
        Location {
            path: self.path.clone(),
            range: self.range,
        }
    }
}

/// Contribution of one source file to a rebuild
#[derive(Debug, Clone, Default)]
pub struct FileDeclarations {
    pub definitions: Vec<CommandDefinition>,
    pub registered: HashSet<String>,
}

#[derive(Debug, Clone)]
pub struct DeclarationScanner {
    command_pattern: Regex,
    registration_pattern: Regex,
}

impl DeclarationScanner {
    pub fn new(marker: &str, registration_macro: &str) -> IndexResult<Self> {
        // Allow `tauri :: command` spacing inside the attribute path
        let marker = marker
            .split("::")
            .map(|part| regex::escape(part.trim()))
            .collect::<Vec<_>>()
            .join(r"\s*::\s*");

        let command_pattern = format!(
            r"#\s*\[\s*{marker}(?:\s*\([^)]*\))?\s*\](?s:.)*?(?:pub(?:\s*\([^)]+\))?\s+)?(?:async\s+)?fn\s+([A-Za-z_][A-Za-z0-9_]*)\s*[<(]"
        );
        let registration_pattern = format!(
            r"{}\s*!\s*\[((?s:.)*?)\]",
            regex::escape(registration_macro.trim())
        );

        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| IndexError::ConfigError {
                reason: format!("cannot build declaration pattern: {e}"),
            })
        };

        Ok(Self {
            command_pattern: compile(&command_pattern)?,
            registration_pattern: compile(&registration_pattern)?,
        })
    }

    pub fn from_config(config: &CommandIndexConfig) -> IndexResult<Self> {
        Self::new(&config.marker, &config.registration_macro)
    }

    pub fn scan_file(&self, path: &Path, source: &str) -> FileDeclarations {
        let mut registered = HashSet::new();
        self.collect_registered(source, &mut registered);

        FileDeclarations {
            definitions: self.collect_definitions(path, source),
            registered,
        }
    }

    /// Add every name listed in a registration macro to `output`.
    ///
    /// Namespaced entries contribute their last segment.
    pub fn collect_registered(&self, source: &str, output: &mut HashSet<String>) {
        for caps in self.registration_pattern.captures_iter(source) {
            let Some(body) = caps.get(1) else {
                continue;
            };
            let body = COMMENT_PATTERN.replace_all(body.as_str(), "");

            for entry in body.split(',').map(str::trim) {
                if !ENTRY_PATTERN.is_match(entry) {
                    continue;
                }
                if let Some(name) = entry.rsplit("::").next().map(str::trim) {
                    output.insert(name.to_string());
                }
            }
        }
    }

    pub fn collect_definitions(&self, path: &Path, source: &str) -> Vec<CommandDefinition> {
        let mapper = TextOffsetMapper::new(source);

        self.command_pattern
            .captures_iter(source)
            .filter_map(|caps| caps.get(1))
            .map(|name| CommandDefinition {
                name: name.as_str().to_string(),
                path: path.to_path_buf(),
                range: mapper.range(name.start(), name.end()),
            })
            .collect()
    }
}

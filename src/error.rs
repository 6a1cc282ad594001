//! Error types for the command index and locale resolver
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for indexing operations
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Workspace root '{path}' does not exist or is not a directory")]
    RootNotFound { path: PathBuf },

    /// Glob patterns from configuration that failed to compile
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },

    #[error("Failed to start file watcher for '{path}': {reason}")]
    WatcherInit { path: PathBuf, reason: String },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },

    /// General errors for cases where we need to preserve existing behavior
    #[error("{0}")]
    General(String),
}

impl IndexError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::RootNotFound { .. } => "ROOT_NOT_FOUND",
            Self::InvalidGlob { .. } => "INVALID_GLOB",
            Self::WatcherInit { .. } => "WATCHER_INIT_ERROR",
            Self::ConfigError { .. } => "CONFIG_ERROR",
            Self::General(_) => "GENERAL_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::RootNotFound { .. } => vec![
                "Pass an existing directory as workspace root",
                "Check `workspace_roots` in .crosslink/settings.toml",
            ],
            Self::InvalidGlob { .. } => vec![
                "Fix `commands.source_glob` or `locales.locale_glob` in .crosslink/settings.toml",
            ],
            Self::WatcherInit { .. } => vec![
                "Check the inotify watch limit (fs.inotify.max_user_watches)",
                "Set `commands.watch = false` and run 'crosslink index' manually",
            ],
            _ => vec![],
        }
    }
}

/// Errors raised by the structured-text key scanner.
///
/// Every variant carries the byte offset where scanning stopped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("Unexpected end of input at offset {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("Expected '{expected}' at offset {offset}")]
    Expected { expected: char, offset: usize },

    #[error("Invalid value at offset {offset}")]
    InvalidValue { offset: usize },

    #[error("Invalid number at offset {offset}")]
    InvalidNumber { offset: usize },

    #[error("Invalid escape sequence at offset {offset}")]
    InvalidEscape { offset: usize },

    #[error("Invalid unicode escape at offset {offset}")]
    InvalidUnicodeEscape { offset: usize },

    #[error("Unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("Unexpected trailing content at offset {offset}")]
    TrailingContent { offset: usize },

    #[error("Nesting too deep at offset {offset}")]
    TooDeep { offset: usize },
}

/// User-facing failures of the locale ensure-and-navigate path
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Invalid locale key \"{key}\": segments must be non-empty")]
    InvalidKey { key: String },

    #[error("Cannot parse locale file: {path}")]
    UnparseableRoot { path: PathBuf },

    #[error("Cannot create key \"{key}\" because part of path is not an object.")]
    StructuralConflict { key: String },

    #[error("Locale key \"{key}\" does not exist in {path}")]
    KeyNotFound { key: String, path: PathBuf },

    #[error("Cannot locate locale key after update: {key}")]
    MissingAfterWrite { key: String },

    #[error("Failed to access locale file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Result type alias for structured-text scans
pub type ScanResult<T> = Result<T, ScanError>;

/// Result type alias for locale resolution
pub type ResolutionResult<T> = Result<T, ResolutionError>;

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context(self, msg: &str) -> Result<T, IndexError>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: &str) -> Result<T, IndexError> {
        self.map_err(|e| IndexError::General(format!("{msg}: {e}")))
    }
}

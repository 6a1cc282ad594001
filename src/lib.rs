//! Command index and locale key resolver for Tauri frontends

pub mod config;
pub mod error;
pub mod indexing;
pub mod locale;
pub mod parsing;
pub mod providers;
pub mod storage;
pub mod text;
pub mod types;

// Explicit exports for better API clarity
pub use config::Settings;
pub use error::{
    IndexError, IndexResult, ResolutionError, ResolutionResult, ScanError, ScanResult,
};
pub use indexing::{CommandIndex, CommandSnapshot, WorkspaceIndexManager};
pub use locale::{LocaleKeyLookup, LocaleKeyService};
pub use parsing::{CallSitePattern, CommandDefinition, DeclarationScanner};
pub use providers::{InvokeDefinitionProvider, LocaleHoverProvider, OpenLocaleKeyArgs};
pub use storage::{FsTextStore, MemoryTextStore, TextStore};
pub use text::TextOffsetMapper;
pub use types::{Location, Position, Range};

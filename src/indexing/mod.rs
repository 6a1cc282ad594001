pub mod command_index;
pub mod debounce;
pub mod fs_watcher;
pub mod walker;
pub mod workspace;

pub use command_index::{CommandIndex, CommandSnapshot};
pub use debounce::{Debouncer, RebuildTrigger};
pub use fs_watcher::SourceWatcher;
pub use walker::{FileWalker, SourceMatcher};
pub use workspace::WorkspaceIndexManager;

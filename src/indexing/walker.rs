//! File system walker for discovering sources selected by a root-relative glob
//!
//! This module provides directory traversal with support for:
//! - A whitelist glob relative to the workspace root
//! - Excluded directory names (build output, dependencies)
//! - .gitignore rules for pruning directories
//! - Hidden file handling

use ignore::WalkBuilder;
use ignore::overrides::{Override, OverrideBuilder};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::error::{IndexError, IndexResult};

/// Decides whether a path belongs to a glob-selected source set
#[derive(Debug)]
pub struct SourceMatcher {
    root: PathBuf,
    base: PathBuf,
    include: Override,
    exclude_dirs: Vec<String>,
}

impl SourceMatcher {
    pub fn new(root: &Path, glob: &str, exclude_dirs: &[String]) -> IndexResult<Self> {
        let invalid = |e: ignore::Error| IndexError::InvalidGlob {
            pattern: glob.to_string(),
            reason: e.to_string(),
        };

        let mut builder = OverrideBuilder::new(root);
        builder.add(glob).map_err(invalid)?;
        let include = builder.build().map_err(invalid)?;

        Ok(Self {
            root: root.to_path_buf(),
            base: literal_base(glob),
            include,
            exclude_dirs: exclude_dirs.to_vec(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deepest directory that contains every selectable file
    pub fn base_dir(&self) -> PathBuf {
        self.root.join(&self.base)
    }

    /// Whether a directory could hold selected files now or once its
    /// children exist: inside the base directory or on the way to it.
    pub fn is_directory_candidate(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        if relative.components().any(|c| self.is_excluded_component(c)) {
            return false;
        }
        relative.starts_with(&self.base) || self.base.starts_with(relative)
    }

    /// Whether a file path (absolute or root-relative) is selected
    pub fn is_match(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        if relative.components().any(|c| self.is_excluded_component(c)) {
            return false;
        }
        self.include.matched(relative, false).is_whitelist()
    }

    fn is_excluded_component(&self, component: Component<'_>) -> bool {
        match component {
            Component::Normal(name) => self.is_excluded_dir(name.to_str().unwrap_or_default()),
            _ => false,
        }
    }

    fn is_excluded_dir(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|dir| dir == name)
    }
}

/// Walks a root to find files selected by a [`SourceMatcher`]
#[derive(Debug, Clone)]
pub struct FileWalker {
    matcher: Arc<SourceMatcher>,
}

impl FileWalker {
    pub fn new(matcher: Arc<SourceMatcher>) -> Self {
        Self { matcher }
    }

    /// Walk the root and return the selected files in path order
    pub fn walk(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self
            .builder(self.matcher.root())
            .build()
            .filter_map(Result::ok) // Skip entries we can't access
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| self.matcher.is_match(path))
            .collect();

        files.sort();
        files
    }

    /// Directories a non-recursive watcher needs to see every selected file.
    ///
    /// Excluded and ignored directories are pruned. When the base directory
    /// does not exist yet, its closest existing ancestor inside the root is
    /// watched instead so its creation is noticed.
    pub fn watch_directories(&self) -> Vec<PathBuf> {
        let base = self.matcher.base_dir();
        if !base.is_dir() {
            return base
                .ancestors()
                .filter(|dir| dir.starts_with(self.matcher.root()))
                .find(|dir| dir.is_dir())
                .map(|dir| vec![dir.to_path_buf()])
                .unwrap_or_default();
        }

        let mut dirs: Vec<PathBuf> = self
            .builder(&base)
            .build()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_dir()))
            .map(|entry| entry.into_path())
            .collect();

        dirs.sort();
        dirs
    }

    /// Count files that would be scanned (useful for dry runs)
    pub fn count_files(&self) -> usize {
        self.walk().len()
    }

    fn builder(&self, start: &Path) -> WalkBuilder {
        let mut builder = WalkBuilder::new(start);

        builder
            .hidden(true) // Skip hidden files and directories
            .git_ignore(true) // Respect .gitignore files
            .git_global(false)
            .git_exclude(true) // Respect .git/info/exclude
            .follow_links(false) // Don't follow symlinks by default
            .require_git(false); // Allow gitignore to work in non-git directories

        let matcher = self.matcher.clone();
        builder.filter_entry(move |entry| {
            // Prune excluded directories instead of filtering their files one by one
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir
                && entry.depth() > 0
                && matcher.is_excluded_dir(&entry.file_name().to_string_lossy()))
        });

        builder
    }
}

/// Leading glob segments free of wildcards, excluding the file pattern
fn literal_base(glob: &str) -> PathBuf {
    let segments: Vec<&str> = glob.split('/').collect();
    let (_, directories) = segments.split_last().unwrap_or((&"", &[]));

    directories
        .iter()
        .take_while(|segment| !segment.contains(['*', '?', '[', '{']))
        .filter(|segment| !segment.is_empty() && **segment != ".")
        .collect()
}

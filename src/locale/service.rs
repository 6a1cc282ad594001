//! Lookup, preview and ensure-and-create over one locale file at a time.
//!
//! Every call rescans the current text: offsets from an earlier scan go
//! stale as soon as the file is edited or reformatted.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

use super::scanner::scan_lenient;
use crate::config::LocaleConfig;
use crate::error::{IndexResult, ResolutionError, ResolutionResult};
use crate::indexing::{FileWalker, SourceMatcher};
use crate::storage::TextStore;
use crate::text::TextOffsetMapper;
use crate::types::Range;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// A locale file; `locale` is the file stem (`en`, `zh-Hans`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleFile {
    pub locale: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LocaleKeyLookup {
    pub exists: bool,
    pub range: Option<Range>,
    pub preview: Option<String>,
}

pub struct LocaleKeyService {
    store: Arc<dyn TextStore>,
    config: LocaleConfig,
}

impl LocaleKeyService {
    pub fn new(store: Arc<dyn TextStore>, config: LocaleConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &LocaleConfig {
        &self.config
    }

    /// Locale files under `root`, sorted by locale id
    pub fn list_locale_files(&self, root: &Path) -> IndexResult<Vec<LocaleFile>> {
        let matcher = SourceMatcher::new(root, &self.config.locale_glob, &[])?;
        let mut files: Vec<LocaleFile> = FileWalker::new(Arc::new(matcher))
            .walk()
            .into_iter()
            .filter_map(|path| {
                let locale = path.file_stem()?.to_str()?.to_string();
                Some(LocaleFile { locale, path })
            })
            .collect();

        files.sort_by(|a, b| a.locale.cmp(&b.locale));
        Ok(files)
    }

    /// Report whether `scoped_key` exists in the file, where, and a preview
    /// of its value. Unreadable or malformed files report a missing key.
    pub fn lookup(&self, path: &Path, scoped_key: &str) -> LocaleKeyLookup {
        let text = match self.store.read(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("cannot read locale file {}: {e}", path.display());
                return LocaleKeyLookup::default();
            }
        };

        let table = scan_lenient(&text);
        let Some(span) = table.span(scoped_key) else {
            return LocaleKeyLookup::default();
        };

        let mapper = TextOffsetMapper::new(&text);
        LocaleKeyLookup {
            exists: true,
            range: Some(mapper.range(span.start, span.end)),
            preview: table
                .value_at(scoped_key)
                .map(|value| preview_text(value, self.config.preview_max_chars)),
        }
    }

    /// Make sure `scoped_key` exists (creating it when allowed) and return
    /// the range of its key name in the rewritten file.
    ///
    /// Missing intermediate segments become empty objects; the final segment
    /// becomes `""` for a leaf or `{}` otherwise. Existing keys are never
    /// overwritten.
    pub async fn ensure_key_and_locate(
        &self,
        path: &Path,
        scoped_key: &str,
        leaf: bool,
        create_if_missing: bool,
    ) -> ResolutionResult<Range> {
        let segments = split_scoped_key(scoped_key)?;
        let text = self.read_blocking(path).await?;

        let Ok(Value::Object(mut root)) = serde_json::from_str::<Value>(&text) else {
            return Err(ResolutionError::UnparseableRoot {
                path: path.to_path_buf(),
            });
        };

        let exists = scan_lenient(&text).contains(scoped_key);
        if !exists && create_if_missing {
            if !ensure_path(&mut root, &segments, leaf) {
                return Err(ResolutionError::StructuralConflict {
                    key: scoped_key.to_string(),
                });
            }

            let mut updated = serde_json::to_string_pretty(&Value::Object(root)).map_err(|e| {
                ResolutionError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::other(e),
                }
            })?;
            updated.push('\n');

            self.write_blocking(path, updated).await?;
            info!("created locale key {scoped_key} in {}", path.display());

            // The host may not expose the write to an immediate re-read
            tokio::time::sleep(self.config.settle_delay()).await;
        }

        let text = self.read_blocking(path).await?;
        let table = scan_lenient(&text);
        let Some(span) = table.span(scoped_key) else {
            return Err(if create_if_missing {
                ResolutionError::MissingAfterWrite {
                    key: scoped_key.to_string(),
                }
            } else {
                ResolutionError::KeyNotFound {
                    key: scoped_key.to_string(),
                    path: path.to_path_buf(),
                }
            });
        };

        debug!("located {scoped_key} at bytes {}..{}", span.start, span.end);
        Ok(TextOffsetMapper::new(&text).range(span.start, span.end))
    }

    /// Store reads may hit the disk; keep them off the async workers
    async fn read_blocking(&self, path: &Path) -> ResolutionResult<String> {
        let store = self.store.clone();
        let owned = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || store.read(&owned)).await;
        flatten_io(path, result)
    }

    async fn write_blocking(&self, path: &Path, contents: String) -> ResolutionResult<()> {
        let store = self.store.clone();
        let owned = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || store.write(&owned, &contents)).await;
        flatten_io(path, result)
    }
}

fn flatten_io<T>(
    path: &Path,
    result: Result<std::io::Result<T>, tokio::task::JoinError>,
) -> ResolutionResult<T> {
    result
        .map_err(std::io::Error::other)
        .and_then(|inner| inner)
        .map_err(|source| ResolutionError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Split a dotted key, rejecting empty segments
pub fn split_scoped_key(scoped_key: &str) -> ResolutionResult<Vec<&str>> {
    let segments: Vec<&str> = scoped_key.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(ResolutionError::InvalidKey {
            key: scoped_key.to_string(),
        });
    }
    Ok(segments)
}

/// Create missing segments of a path; `false` when an existing non-object
/// value blocks a segment that still has children.
fn ensure_path(root: &mut Map<String, Value>, segments: &[&str], leaf: bool) -> bool {
    let Some((last, parents)) = segments.split_last() else {
        return true;
    };

    let mut current = root;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry {
            Value::Object(next) => current = next,
            _ => return false,
        }
    }

    current.entry(last.to_string()).or_insert_with(|| {
        if leaf {
            Value::String(String::new())
        } else {
            Value::Object(Map::new())
        }
    });
    true
}

/// One-line preview of a value, at most `max_chars` characters.
///
/// Strings render verbatim (the empty string as `""`), other values as
/// compact JSON. Whitespace runs collapse to one space; overlong text ends
/// in an ellipsis.
pub fn preview_text(value: &Value, max_chars: usize) -> String {
    let text = match value {
        Value::String(s) if s.is_empty() => "\"\"".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let flattened = WHITESPACE_RUN.replace_all(&text, " ");
    let flattened = flattened.trim();
    if flattened.chars().count() <= max_chars {
        return flattened.to_string();
    }

    let truncated: String = flattened.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{truncated}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTextStore;
    use serde_json::json;

    const EN: &str = r#"{"General": {"copy": {"text": "Copy"}}}"#;

    fn service_with(text: &str) -> (LocaleKeyService, Arc<MemoryTextStore>, PathBuf) {
        let store = Arc::new(MemoryTextStore::new());
        let path = PathBuf::from("src/locales/en.json");
        store.insert(path.clone(), text);
        let config = LocaleConfig {
            settle_delay_ms: 0,
            ..Default::default()
        };
        (LocaleKeyService::new(store.clone(), config), store, path)
    }

    #[test]
    fn test_lookup_existing_and_missing() {
        let (service, _, path) = service_with(EN);

        let found = service.lookup(&path, "General.copy.text");
        assert!(found.exists);
        assert_eq!(found.preview.as_deref(), Some("Copy"));
        let start = EN.find("text").unwrap() as u32;
        assert_eq!(found.range, Some(Range::new(0, start, 0, start + 4)));

        let missing = service.lookup(&path, "General.copy.missing");
        assert_eq!(missing, LocaleKeyLookup::default());
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let (service, _, path) = service_with(EN);
        assert_eq!(
            service.lookup(&path, "General.copy"),
            service.lookup(&path, "General.copy")
        );
    }

    #[test]
    fn test_lookup_on_malformed_file_reports_missing() {
        let (service, _, path) = service_with(r#"{"General": "#);
        assert!(!service.lookup(&path, "General").exists);
        assert!(!service.lookup(Path::new("nope.json"), "General").exists);
    }

    #[test]
    fn test_lookup_on_deeply_nested_file_reports_missing() {
        let depth = 100_000;
        let text = format!("{{\"a\": {}1{}}}", "[".repeat(depth), "]".repeat(depth));
        let (service, _, path) = service_with(&text);
        assert_eq!(service.lookup(&path, "a"), LocaleKeyLookup::default());
    }

    #[tokio::test]
    async fn test_ensure_creates_leaf() {
        let (service, store, path) = service_with(EN);

        let range = service
            .ensure_key_and_locate(&path, "General.copy.missing", true, true)
            .await
            .unwrap();

        let written = store.get(&path).unwrap();
        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed["General"]["copy"]["missing"], json!(""));
        assert!(written.ends_with("}\n"));
        assert!(written.contains("\n  \"General\": {"));

        // Existing keys keep their order, the new key is appended
        let text_at = written.find("\"text\"").unwrap();
        let missing_at = written.find("\"missing\"").unwrap();
        assert!(text_at < missing_at);

        let lines: Vec<&str> = written.lines().collect();
        let line = &lines[range.start_line as usize];
        assert_eq!(
            &line[range.start_column as usize..range.end_column as usize],
            "missing"
        );

        let lookup = service.lookup(&path, "General.copy.missing");
        assert!(lookup.exists);
        assert_eq!(lookup.preview.as_deref(), Some("\"\""));
    }

    #[tokio::test]
    async fn test_ensure_creates_intermediate_objects() {
        let (service, store, path) = service_with("{}");

        service
            .ensure_key_and_locate(&path, "Settings.about", false, true)
            .await
            .unwrap();

        let parsed: Value = serde_json::from_str(&store.get(&path).unwrap()).unwrap();
        assert_eq!(parsed, json!({"Settings": {"about": {}}}));
    }

    #[tokio::test]
    async fn test_ensure_existing_key_does_not_write() {
        let (service, store, path) = service_with(EN);

        service
            .ensure_key_and_locate(&path, "General.copy", false, true)
            .await
            .unwrap();

        assert_eq!(store.get(&path).unwrap(), EN);
    }

    #[tokio::test]
    async fn test_ensure_structural_conflict() {
        let (service, store, path) = service_with(EN);

        let err = service
            .ensure_key_and_locate(&path, "General.copy.text.deeper", true, true)
            .await
            .unwrap_err();

        assert!(matches!(err, ResolutionError::StructuralConflict { .. }));
        assert_eq!(store.get(&path).unwrap(), EN);
    }

    #[tokio::test]
    async fn test_ensure_without_creation_fails_for_missing_key() {
        let (service, _, path) = service_with(EN);

        let err = service
            .ensure_key_and_locate(&path, "General.paste", true, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::KeyNotFound { .. }));
    }

    #[tokio::test]
    async fn test_ensure_rejects_non_object_root_and_bad_keys() {
        let (service, _, path) = service_with("[1, 2]");
        let err = service
            .ensure_key_and_locate(&path, "a", true, true)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::UnparseableRoot { .. }));

        let err = service
            .ensure_key_and_locate(&path, "a..b", true, true)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidKey { .. }));
    }

    /// Records the thread of every store call
    struct ThreadRecordingStore {
        inner: MemoryTextStore,
        threads: parking_lot::Mutex<Vec<std::thread::ThreadId>>,
    }

    impl TextStore for ThreadRecordingStore {
        fn read(&self, path: &Path) -> std::io::Result<String> {
            self.threads.lock().push(std::thread::current().id());
            self.inner.read(path)
        }

        fn write(&self, path: &Path, contents: &str) -> std::io::Result<()> {
            self.threads.lock().push(std::thread::current().id());
            self.inner.write(path, contents)
        }
    }

    #[tokio::test]
    async fn test_ensure_runs_store_io_off_the_async_thread() {
        let path = PathBuf::from("src/locales/en.json");
        let store = Arc::new(ThreadRecordingStore {
            inner: MemoryTextStore::new(),
            threads: parking_lot::Mutex::new(Vec::new()),
        });
        store.inner.insert(path.clone(), EN);
        let config = LocaleConfig {
            settle_delay_ms: 0,
            ..Default::default()
        };
        let service = LocaleKeyService::new(store.clone(), config);

        service
            .ensure_key_and_locate(&path, "General.paste", true, true)
            .await
            .unwrap();

        // read, write, re-read
        let threads = store.threads.lock().clone();
        assert_eq!(threads.len(), 3);
        let runtime_thread = std::thread::current().id();
        assert!(threads.iter().all(|id| *id != runtime_thread));
        assert!(store.inner.get(&path).unwrap().contains("\"paste\""));
    }

    #[test]
    fn test_preview_text() {
        assert_eq!(preview_text(&json!("Copy"), 72), "Copy");
        assert_eq!(preview_text(&json!(""), 72), "\"\"");
        assert_eq!(preview_text(&json!("a \n\t b"), 72), "a b");
        assert_eq!(preview_text(&json!({"k": [1, true]}), 72), r#"{"k":[1,true]}"#);
        assert_eq!(preview_text(&json!(null), 72), "null");

        let long = "x".repeat(100);
        let preview = preview_text(&json!(long), 72);
        assert_eq!(preview.chars().count(), 72);
        assert!(preview.ends_with('…'));
        assert_eq!(preview_text(&json!("x".repeat(72)), 72).chars().count(), 72);
    }
}

//! Locale hover cards for translation call sites.
//!
//! One line per locale file with a link that opens (or creates) the scoped
//! key in that file. Links carry [`OpenLocaleKeyArgs`] as a query-encoded
//! JSON argument.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

use crate::locale::LocaleKeyService;
use crate::parsing::{CallSitePattern, TranslationKeySelection};
use crate::text::TextOffsetMapper;
use crate::types::Range;

pub const OPEN_LOCALE_KEY_COMMAND: &str = "crosslink.openLocaleKey";

/// Argument bundle of the open-locale-key command
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLocaleKeyArgs {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub scoped_key: Option<String>,
    #[serde(default)]
    pub leaf: bool,
    #[serde(default)]
    pub create_if_missing: bool,
}

impl OpenLocaleKeyArgs {
    /// `command:crosslink.openLocaleKey?args=<json>`
    pub fn to_command_link(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        let query = serde_urlencoded::to_string([("args", json.as_str())]).unwrap_or_default();
        format!("command:{OPEN_LOCALE_KEY_COMMAND}?{query}")
    }

    /// Parse a command link or a bare JSON argument bundle
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let json = match input.strip_prefix(&format!("command:{OPEN_LOCALE_KEY_COMMAND}?")) {
            Some(query) => {
                let mut params: HashMap<String, String> =
                    serde_urlencoded::from_str(query).ok()?;
                params.remove("args")?
            }
            None => input.to_string(),
        };

        serde_json::from_str(&json).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hover {
    pub markdown: String,
    pub range: Range,
}

pub struct LocaleHoverProvider {
    service: Arc<LocaleKeyService>,
    pattern: Option<CallSitePattern>,
}

impl LocaleHoverProvider {
    pub fn new(service: Arc<LocaleKeyService>) -> Self {
        let pattern = CallSitePattern::translation(&service.config().translate_functions);
        Self { service, pattern }
    }

    /// Whether `document` lies under the frontend source prefix of `root`
    pub fn is_frontend_source(&self, root: &Path, document: &Path) -> bool {
        let Ok(relative) = document.strip_prefix(root) else {
            return false;
        };

        let relative = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");
        relative.starts_with(&self.service.config().source_prefix)
    }

    pub fn selection_at(&self, text: &str, offset: usize) -> Option<TranslationKeySelection> {
        self.pattern.as_ref()?.find_translation_key_at(text, offset)
    }

    pub fn provide_hover(
        &self,
        root: &Path,
        document: &Path,
        text: &str,
        offset: usize,
    ) -> Option<Hover> {
        if !self.is_frontend_source(root, document) {
            return None;
        }

        let selection = self.selection_at(text, offset)?;
        let locale_files = match self.service.list_locale_files(root) {
            Ok(files) => files,
            Err(e) => {
                warn!("cannot list locale files under {}: {e}", root.display());
                return None;
            }
        };
        if locale_files.is_empty() {
            return None;
        }

        let leaf = selection.is_leaf();
        let mut items = Vec::with_capacity(locale_files.len());
        for file in &locale_files {
            let lookup = self.service.lookup(&file.path, &selection.scoped_key);
            let link = OpenLocaleKeyArgs {
                uri: Some(path_to_uri(&file.path)),
                locale: Some(file.locale.clone()),
                scoped_key: Some(selection.scoped_key.clone()),
                leaf,
                create_if_missing: !lookup.exists,
            }
            .to_command_link();

            let label = if lookup.exists {
                file.locale.clone()
            } else {
                format!("{} (missing)", file.locale)
            };

            if leaf && lookup.exists {
                let preview = lookup.preview.as_deref().unwrap_or("\"\"");
                items.push(format!(
                    "[{}]({link}): {}",
                    escape_markdown(&label),
                    escape_markdown(preview)
                ));
            } else {
                items.push(format!("[{}]({link})", escape_markdown(&label)));
            }
        }

        let mut markdown = String::from("**i18n Key Segment** \n\n");
        markdown.push_str(&format!(
            "`{}` ({}/{})\n\n***\n\n",
            selection.scoped_key,
            selection.segment_index + 1,
            selection.segments.len()
        ));
        if leaf {
            markdown.push_str(&items.join("  \n"));
        } else {
            markdown.push_str("Go to ");
            markdown.push_str(&items.join(" | "));
        }

        Some(Hover {
            markdown,
            range: TextOffsetMapper::new(text).range(selection.start, selection.end),
        })
    }
}

fn path_to_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Inverse of the hover link's `uri` field; bare paths pass through
pub fn uri_to_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

/// Escape characters that would break a markdown link label
pub fn escape_markdown(source: &str) -> String {
    let mut escaped = String::with_capacity(source.len());
    for c in source.chars() {
        if matches!(c, '\\' | '[' | ']' | '(' | ')') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

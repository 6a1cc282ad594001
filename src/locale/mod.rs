//! Locale files: key-offset scanning and the lookup/ensure service built on it.

pub mod scanner;
pub mod service;

pub use scanner::{KeyOffsetTable, KeySpan, scan, scan_lenient};
pub use service::{
    LocaleFile, LocaleKeyLookup, LocaleKeyService, preview_text, split_scoped_key,
};

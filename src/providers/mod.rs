//! Adapters that turn index and locale results into editor-facing data.

pub mod definition;
pub mod hover;
pub mod open_locale;

pub use definition::InvokeDefinitionProvider;
pub use hover::{
    Hover, LocaleHoverProvider, OPEN_LOCALE_KEY_COMMAND, OpenLocaleKeyArgs, escape_markdown,
    uri_to_path,
};
pub use open_locale::{OpenOutcome, open_locale_key};

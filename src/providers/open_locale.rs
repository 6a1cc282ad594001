//! Handler behind the hover links: ensure the key exists, then report where.

use serde::Serialize;
use tracing::debug;

use super::hover::{OpenLocaleKeyArgs, uri_to_path};
use crate::locale::LocaleKeyService;
use crate::types::Location;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OpenOutcome {
    /// Arguments lacked a uri or scoped key
    Ignored,
    /// The key exists; the host should reveal this range
    Revealed { location: Location },
    /// One user-facing message
    Failed { message: String },
}

pub async fn open_locale_key(service: &LocaleKeyService, args: &OpenLocaleKeyArgs) -> OpenOutcome {
    let (Some(uri), Some(scoped_key)) = (args.uri.as_deref(), args.scoped_key.as_deref()) else {
        debug!("open locale key called without uri or scoped key");
        return OpenOutcome::Ignored;
    };
    if uri.is_empty() || scoped_key.is_empty() {
        return OpenOutcome::Ignored;
    }

    let path = uri_to_path(uri);
    match service
        .ensure_key_and_locate(&path, scoped_key, args.leaf, args.create_if_missing)
        .await
    {
        Ok(range) => OpenOutcome::Revealed {
            location: Location { path, range },
        },
        Err(e) => OpenOutcome::Failed {
            message: format!("crosslink: {e}"),
        },
    }
}

//! Go-to-definition for command call sites in caller documents.

use std::sync::Arc;

use crate::config::CommandIndexConfig;
use crate::indexing::WorkspaceIndexManager;
use crate::parsing::{CallSitePattern, LiteralMatch};
use crate::types::Location;

pub struct InvokeDefinitionProvider {
    manager: Arc<WorkspaceIndexManager>,
    pattern: Option<CallSitePattern>,
}

impl InvokeDefinitionProvider {
    pub fn new(manager: Arc<WorkspaceIndexManager>, config: &CommandIndexConfig) -> Self {
        Self {
            manager,
            pattern: CallSitePattern::invoke(&config.invoke_functions),
        }
    }

    /// The command literal under `offset`, if any
    pub fn command_at(&self, text: &str, offset: usize) -> Option<LiteralMatch> {
        self.pattern.as_ref()?.find_literal_at(text, offset)
    }

    /// Every definition of the command named at `offset`, across all roots.
    ///
    /// Empty when the cursor is not on a command literal or the name is
    /// unknown. Ambiguous names return all candidates.
    pub fn provide_definition(&self, text: &str, offset: usize) -> Vec<Location> {
        let Some(literal) = self.command_at(text, offset) else {
            return Vec::new();
        };

        self.manager
            .get_definitions(&literal.literal)
            .iter()
            .map(|definition| definition.location())
            .collect()
    }
}

//! Source scanners: declaration sources on one side, caller documents on the other.

pub mod call_site;
pub mod declarations;

pub use call_site::{
    CallSitePattern, LiteralKind, LiteralMatch, SegmentHit, TranslationKeySelection,
    resolve_segment_at_offset,
};
pub use declarations::{CommandDefinition, DeclarationScanner, FileDeclarations};

//! Mode handler for `${...}` interpolation regions.

use tower_lsp::lsp_types::{CompletionItem, Hover};

use crate::document::RegionKind;

use super::{access_scope, DefinitionResult, LanguageMode, ModeContext, ModeError};

pub struct TextInterpolationMode;

impl LanguageMode for TextInterpolationMode {
    fn kind(&self) -> RegionKind {
        RegionKind::TextInterpolation
    }

    fn do_complete(&self, ctx: &ModeContext) -> Result<Vec<CompletionItem>, ModeError> {
        access_scope::complete(ctx)
    }

    fn do_definition(
        &self,
        ctx: &ModeContext,
        source_word: &str,
    ) -> Result<Option<DefinitionResult>, ModeError> {
        access_scope::definition(ctx, source_word)
    }

    fn do_hover(&self, ctx: &ModeContext, source_word: &str) -> Result<Option<Hover>, ModeError> {
        access_scope::hover(ctx, source_word)
    }
}

//! Language modes: one handler per embedded-region kind.
//!
//! The registry is a plain `RegionKind -> handler` table built explicitly at
//! startup. `get_mode_and_region_at_position` routes a cursor position to the
//! unique covering region and its handler; positions in plain markup resolve
//! to `None`, which callers treat as "no embedded-language intelligence
//! here", not an error. Handler failures are caught at the dispatch boundary
//! and surfaced as empty results so one broken request never takes down the
//! server.

mod access_scope;
mod attribute_binding;
mod custom_element;
mod repeat_for;
mod text_interpolation;

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tower_lsp::lsp_types::{CompletionItem, Hover, Location, Position, Url};

use crate::document::{RegionKind, TemplateDocumentState, ViewRegion};
use crate::model::ProgramModel;

pub use attribute_binding::AttributeBindingMode;
pub use custom_element::CustomElementMode;
pub use repeat_for::RepeatForMode;
pub use text_interpolation::TextInterpolationMode;

/// Failure inside a mode handler. Never crosses the dispatch boundary: the
/// dispatcher logs it and returns an empty result instead.
#[derive(Debug)]
pub struct ModeError {
    pub message: String,
}

impl ModeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A definition target, always in source-document coordinates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionResult {
    pub target_file_path: PathBuf,
    pub range: tower_lsp::lsp_types::Range,
}

impl DefinitionResult {
    pub fn to_location(&self) -> Option<Location> {
        let uri = Url::from_file_path(&self.target_file_path).ok()?;
        Some(Location::new(uri, self.range))
    }
}

/// Everything a handler needs for one request. Handlers hold these borrows
/// only for the duration of the call.
pub struct ModeContext<'a> {
    pub state: &'a TemplateDocumentState,
    pub region_index: usize,
    pub region: &'a ViewRegion,
    /// Filesystem path of the template document, when known.
    pub document_path: Option<PathBuf>,
    /// Cursor position as a byte offset into the host document.
    pub offset: usize,
    pub trigger_character: Option<String>,
    pub program: &'a ProgramModel,
    /// Quote character used in attribute snippets.
    pub quote: char,
}

/// Uniform capability surface of a language mode.
pub trait LanguageMode: Send + Sync {
    fn kind(&self) -> RegionKind;

    fn do_complete(&self, ctx: &ModeContext) -> Result<Vec<CompletionItem>, ModeError>;

    fn do_definition(
        &self,
        ctx: &ModeContext,
        source_word: &str,
    ) -> Result<Option<DefinitionResult>, ModeError>;

    fn do_hover(&self, ctx: &ModeContext, source_word: &str) -> Result<Option<Hover>, ModeError>;

    fn on_document_removed(&self, _uri: &Url) {}

    fn dispose(&self) {}
}

/// The mode found for a position, together with its covering region.
pub struct ModeAndRegion<'a> {
    pub mode: &'a dyn LanguageMode,
    pub region_index: usize,
    pub region: &'a ViewRegion,
}

/// Table of registered language modes, one per region kind.
pub struct ModeRegistry {
    modes: HashMap<RegionKind, Box<dyn LanguageMode>>,
}

impl ModeRegistry {
    pub fn new() -> Self {
        let mut modes: HashMap<RegionKind, Box<dyn LanguageMode>> = HashMap::new();
        modes.insert(
            RegionKind::TextInterpolation,
            Box::new(TextInterpolationMode),
        );
        modes.insert(RegionKind::RepeatFor, Box::new(RepeatForMode));
        modes.insert(RegionKind::AttributeBinding, Box::new(AttributeBindingMode));
        modes.insert(RegionKind::CustomElement, Box::new(CustomElementMode));
        Self { modes }
    }

    pub fn get(&self, kind: RegionKind) -> Option<&dyn LanguageMode> {
        self.modes.get(&kind).map(|m| m.as_ref())
    }

    /// Route a position to the unique region covering it and that region's
    /// registered mode. `None` means plain markup.
    pub fn get_mode_and_region_at_position<'a>(
        &'a self,
        state: &'a TemplateDocumentState,
        position: Position,
    ) -> Option<ModeAndRegion<'a>> {
        let offset = state.line_index.position_to_offset(position)?;
        let (region_index, region) = state.region_at_offset(offset)?;
        let mode = self.get(region.kind)?;
        Some(ModeAndRegion {
            mode,
            region_index,
            region,
        })
    }

    pub fn on_document_removed(&self, uri: &Url) {
        for mode in self.modes.values() {
            mode.on_document_removed(uri);
        }
    }

    pub fn dispose(&self) {
        for mode in self.modes.values() {
            mode.dispose();
        }
    }
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Run completion, converting a handler failure into an empty list.
pub fn dispatch_complete(mode: &dyn LanguageMode, ctx: &ModeContext) -> Vec<CompletionItem> {
    match mode.do_complete(ctx) {
        Ok(items) => items,
        Err(e) => {
            eprintln!(
                "Warning: {} completion handler failed: {}",
                mode.kind().as_str(),
                e
            );
            Vec::new()
        }
    }
}

/// Run definition, converting a handler failure into `None`.
pub fn dispatch_definition(
    mode: &dyn LanguageMode,
    ctx: &ModeContext,
    source_word: &str,
) -> Option<DefinitionResult> {
    match mode.do_definition(ctx, source_word) {
        Ok(result) => result,
        Err(e) => {
            eprintln!(
                "Warning: {} definition handler failed: {}",
                mode.kind().as_str(),
                e
            );
            None
        }
    }
}

/// Run hover, converting a handler failure into `None`.
pub fn dispatch_hover(
    mode: &dyn LanguageMode,
    ctx: &ModeContext,
    source_word: &str,
) -> Option<Hover> {
    match mode.do_hover(ctx, source_word) {
        Ok(result) => result,
        Err(e) => {
            eprintln!(
                "Warning: {} hover handler failed: {}",
                mode.kind().as_str(),
                e
            );
            None
        }
    }
}

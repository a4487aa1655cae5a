//! Document state management and text utilities.
//!
//! This module provides:
//! - `LineIndex` for byte offset <-> LSP position conversion
//! - `ViewRegion`/`RegionKind` for embedded-language regions in templates
//! - `VirtualSource` for scaffolded expression buffers with offset mapping
//! - `TemplateDocumentState` and `DocumentStore` for the per-document cache

mod region;
mod state;
mod text;
mod virtual_source;

pub use region::{RegionKind, RepeatForData, ViewRegion};
pub use state::{DocumentStore, TemplateDocumentState};
pub use text::{word_at_offset, LineIndex};
pub use virtual_source::VirtualSource;

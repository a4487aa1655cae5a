//! Document state management and the per-document derived-artifact cache.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use tower_lsp::lsp_types::Url;

use crate::template::classify;

use super::region::ViewRegion;
use super::text::LineIndex;
use super::virtual_source::VirtualSource;

/// Classified state for one template document at one version.
///
/// Owns the region list and the per-region virtual sources; everything here
/// is derived from `(source, version)` and is discarded wholesale when a
/// newer version arrives.
#[derive(Debug)]
pub struct TemplateDocumentState {
    pub line_index: LineIndex,
    pub version: i32,
    pub regions: Vec<ViewRegion>,
    /// Lazily synthesized virtual source per region.
    virtual_sources: Vec<OnceLock<Arc<VirtualSource>>>,
}

impl TemplateDocumentState {
    /// Classify `source` against the known custom-element names.
    pub fn new(source: String, version: i32, known_elements: &HashSet<String>) -> Self {
        let regions = classify(&source, known_elements);
        let virtual_sources = regions.iter().map(|_| OnceLock::new()).collect();
        Self {
            line_index: LineIndex::new(source),
            version,
            regions,
            virtual_sources,
        }
    }

    pub fn source(&self) -> &str {
        self.line_index.source()
    }

    /// The unique region covering `offset`, with its index.
    ///
    /// Regions never overlap, so at most one region matches.
    pub fn region_at_offset(&self, offset: usize) -> Option<(usize, &ViewRegion)> {
        self.regions
            .iter()
            .enumerate()
            .find(|(_, r)| r.contains(offset))
    }

    /// The virtual source for the region at `index`, synthesized on first use.
    pub fn virtual_source(&self, index: usize) -> Option<Arc<VirtualSource>> {
        let slot = self.virtual_sources.get(index)?;
        let region = self.regions.get(index)?;
        Some(Arc::clone(slot.get_or_init(|| {
            Arc::new(VirtualSource::synthesize(self.source(), region))
        })))
    }
}

/// Latest raw text per open document.
#[derive(Debug, Clone)]
struct RawDocument {
    source: String,
    version: i32,
}

/// Thread-safe store of open documents plus the classified-state cache.
///
/// Classification is lazy: `update` only records the new text and drops the
/// stale cache entry; the region list is computed on the first query for that
/// version and retained until superseded.
#[derive(Debug, Default)]
pub struct DocumentStore {
    raw: DashMap<Url, RawDocument>,
    classified: DashMap<Url, Arc<TemplateDocumentState>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            raw: DashMap::new(),
            classified: DashMap::new(),
        }
    }

    /// Record a new version of a document, invalidating derived state.
    pub fn update(&self, uri: Url, source: String, version: i32) {
        self.raw.insert(uri.clone(), RawDocument { source, version });
        self.classified.remove(&uri);
    }

    /// Drop a closed document and everything derived from it.
    pub fn close(&self, uri: &Url) {
        self.raw.remove(uri);
        self.classified.remove(uri);
    }

    pub fn text(&self, uri: &Url) -> Option<String> {
        self.raw.get(uri).map(|d| d.source.clone())
    }

    /// Get the classified state for the document's current version,
    /// classifying now if this is the first query since the last edit.
    ///
    /// A computation raced against a newer edit may still be returned to its
    /// caller, but it is never written back over the newer version's slot.
    pub fn get_or_classify(
        &self,
        uri: &Url,
        known_elements: &HashSet<String>,
    ) -> Option<Arc<TemplateDocumentState>> {
        let (source, version) = {
            let raw = self.raw.get(uri)?;
            (raw.source.clone(), raw.version)
        };

        if let Some(state) = self.classified.get(uri) {
            if state.version == version {
                return Some(Arc::clone(&state));
            }
        }

        let state = Arc::new(TemplateDocumentState::new(source, version, known_elements));

        // Only cache if the document has not moved on meanwhile.
        let still_current = self.raw.get(uri).map(|d| d.version) == Some(version);
        if still_current {
            self.classified.insert(uri.clone(), Arc::clone(&state));
        }

        Some(state)
    }
}

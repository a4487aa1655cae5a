//! Typed regions of embedded expression syntax inside a template document.
//!
//! A region covers one span of framework-specific syntax in the markup: an
//! interpolation body, a binding-attribute value, a `repeat.for` value or a
//! custom-element tag name. Regions for a document never overlap and are
//! ordered by start offset; they are recomputed wholesale whenever the
//! document text changes.

use std::ops::Range;

/// Discriminant for the kind of embedded-language region.
///
/// Doubles as the lookup key in the language-mode table, so every kind listed
/// here has exactly one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// `${expr}` in text content or a plain attribute value.
    TextInterpolation,
    /// The value of a `repeat.for="item of items"` attribute.
    RepeatFor,
    /// The value of a `name.command="expr"` binding attribute.
    AttributeBinding,
    /// A `<tag-name` occurrence matching a known component.
    CustomElement,
}

impl RegionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::TextInterpolation => "text-interpolation",
            RegionKind::RepeatFor => "repeat-for",
            RegionKind::AttributeBinding => "attribute-binding",
            RegionKind::CustomElement => "custom-element",
        }
    }
}

/// Metadata carried by a `RepeatFor` region.
#[derive(Debug, Clone)]
pub struct RepeatForData {
    /// The loop variable name (`item` in `item of items`).
    pub iterator: String,
    /// Byte offset of the iterator declaration in the host document.
    pub iterator_start: usize,
    /// The iterable expression (`items` in `item of items`).
    pub iterable: String,
    /// Byte offset of the iterable expression in the host document.
    pub iterable_start: usize,
}

/// One embedded-language region within a template document.
#[derive(Debug, Clone)]
pub struct ViewRegion {
    pub kind: RegionKind,
    /// Byte offset where the region's text starts in the host document.
    pub start: usize,
    /// Exclusive end offset of the region's text.
    pub end: usize,
    /// Tag the region belongs to (the tag itself for `CustomElement`).
    pub tag_name: Option<String>,
    /// Attribute name without its binding command (`value` in `value.bind`).
    pub attribute_name: Option<String>,
    /// Binding command (`bind`, `trigger`, ...), for `AttributeBinding`.
    pub binding_command: Option<String>,
    pub repeat_for: Option<RepeatForData>,
}

impl ViewRegion {
    pub fn interpolation(start: usize, end: usize, tag_name: Option<String>) -> Self {
        Self {
            kind: RegionKind::TextInterpolation,
            start,
            end,
            tag_name,
            attribute_name: None,
            binding_command: None,
            repeat_for: None,
        }
    }

    pub fn attribute_binding(
        start: usize,
        end: usize,
        tag_name: String,
        attribute_name: String,
        binding_command: String,
    ) -> Self {
        Self {
            kind: RegionKind::AttributeBinding,
            start,
            end,
            tag_name: Some(tag_name),
            attribute_name: Some(attribute_name),
            binding_command: Some(binding_command),
            repeat_for: None,
        }
    }

    pub fn repeat_for(start: usize, end: usize, tag_name: String, data: RepeatForData) -> Self {
        Self {
            kind: RegionKind::RepeatFor,
            start,
            end,
            tag_name: Some(tag_name),
            attribute_name: Some("repeat".to_string()),
            binding_command: Some("for".to_string()),
            repeat_for: Some(data),
        }
    }

    pub fn custom_element(start: usize, end: usize, tag_name: String) -> Self {
        Self {
            kind: RegionKind::CustomElement,
            start,
            end,
            tag_name: Some(tag_name),
            attribute_name: None,
            binding_command: None,
            repeat_for: None,
        }
    }

    /// Whether the region covers the given host offset.
    ///
    /// The end bound is inclusive so that a cursor sitting right at the end
    /// of the expression (before the closing delimiter) still counts as
    /// inside the region.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset <= self.end
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The region's raw text, sliced out of the host document.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

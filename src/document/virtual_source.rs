//! Synthetic host-language buffers for embedded expression regions.
//!
//! The expression tooling wants to see a standalone statement, so each
//! expression-bearing region is wrapped in a minimal scaffold. The raw
//! expression substring is preserved byte-for-byte, which keeps the
//! virtual-to-source mapping a single additive transform; scaffold bytes map
//! to no source location and anything anchored there is rejected.

use super::region::{RegionKind, ViewRegion};

/// Scaffold prefix for plain expression regions: `this.user.name;`.
const EXPRESSION_PREFIX: &str = "this.";
const EXPRESSION_SUFFIX: &str = ";\n";

/// Scaffold for repeat-for regions: `for (let item of items) { }`.
///
/// The raw `item of items` text stays contiguous inside the loop head, so the
/// iterator ends up declared as a scoped local over the iterable's elements.
const REPEAT_PREFIX: &str = "for (let ";
const REPEAT_SUFFIX: &str = ") { }\n";

/// A synthetic source buffer derived from exactly one region.
#[derive(Debug, Clone)]
pub struct VirtualSource {
    content: String,
    /// Bytes of scaffold before the expression body.
    prefix_len: usize,
    /// Length of the preserved expression body.
    body_len: usize,
    /// Host-document offset where the expression body starts.
    source_start: usize,
}

impl VirtualSource {
    /// Build the virtual buffer for `region` out of the host document text.
    pub fn synthesize(source: &str, region: &ViewRegion) -> Self {
        let body = region.text(source);
        let (prefix, suffix) = match region.kind {
            RegionKind::RepeatFor => (REPEAT_PREFIX, REPEAT_SUFFIX),
            _ => (EXPRESSION_PREFIX, EXPRESSION_SUFFIX),
        };

        let mut content = String::with_capacity(prefix.len() + body.len() + suffix.len());
        content.push_str(prefix);
        content.push_str(body);
        content.push_str(suffix);

        Self {
            content,
            prefix_len: prefix.len(),
            body_len: body.len(),
            source_start: region.start,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// The preserved expression body.
    pub fn expression(&self) -> &str {
        &self.content[self.prefix_len..self.prefix_len + self.body_len]
    }

    /// Map a virtual offset back to the host document.
    ///
    /// Offsets inside the expression body (end-inclusive, for a cursor at the
    /// very end) translate additively; scaffold offsets have no source
    /// location and yield `None`.
    pub fn to_source_offset(&self, virtual_offset: usize) -> Option<usize> {
        if virtual_offset < self.prefix_len || virtual_offset > self.prefix_len + self.body_len {
            return None;
        }
        Some(self.source_start + (virtual_offset - self.prefix_len))
    }

    /// Map a host-document offset into the virtual buffer.
    pub fn to_virtual_offset(&self, source_offset: usize) -> Option<usize> {
        if source_offset < self.source_start || source_offset > self.source_start + self.body_len {
            return None;
        }
        Some(self.prefix_len + (source_offset - self.source_start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_region_is_wrapped_as_property_access() {
        let source = "<p>${user.name}</p>";
        let region = ViewRegion::interpolation(5, 14, None);
        let vsrc = VirtualSource::synthesize(source, &region);
        assert_eq!(vsrc.content(), "this.user.name;\n");
        assert_eq!(vsrc.expression(), "user.name");
    }

    #[test]
    fn repeat_for_region_declares_the_loop_variable() {
        let source = r#"<li repeat.for="item of items"></li>"#;
        let region = ViewRegion::repeat_for(
            16,
            29,
            "li".to_string(),
            crate::document::RepeatForData {
                iterator: "item".to_string(),
                iterator_start: 16,
                iterable: "items".to_string(),
                iterable_start: 24,
            },
        );
        let vsrc = VirtualSource::synthesize(source, &region);
        assert_eq!(vsrc.content(), "for (let item of items) { }\n");
    }

    #[test]
    fn offsets_round_trip_through_the_body() {
        let source = "<p>${user.name}</p>";
        let region = ViewRegion::interpolation(5, 14, None);
        let vsrc = VirtualSource::synthesize(source, &region);

        for source_offset in region.start..=region.end {
            let v = vsrc.to_virtual_offset(source_offset).unwrap();
            assert_eq!(vsrc.to_source_offset(v), Some(source_offset));
        }
    }

    #[test]
    fn scaffold_offsets_have_no_source_location() {
        let source = "<p>${name}</p>";
        let region = ViewRegion::interpolation(5, 9, None);
        let vsrc = VirtualSource::synthesize(source, &region);

        // "this." prefix
        assert_eq!(vsrc.to_source_offset(0), None);
        assert_eq!(vsrc.to_source_offset(4), None);
        // trailing ";\n"
        assert_eq!(vsrc.to_source_offset(vsrc.content().len() - 1), None);
    }

    #[test]
    fn host_offsets_outside_the_region_do_not_map() {
        let source = "<p>${name}</p>";
        let region = ViewRegion::interpolation(5, 9, None);
        let vsrc = VirtualSource::synthesize(source, &region);
        assert_eq!(vsrc.to_virtual_offset(4), None);
        assert_eq!(vsrc.to_virtual_offset(10), None);
    }

    #[test]
    fn empty_expression_still_maps_its_cursor_position() {
        let source = "<p>${}</p>";
        let region = ViewRegion::interpolation(5, 5, None);
        let vsrc = VirtualSource::synthesize(source, &region);
        assert_eq!(vsrc.to_virtual_offset(5), Some(5));
        assert_eq!(vsrc.to_source_offset(5), Some(5));
    }
}

//! Region classification for template documents.
//!
//! A single forward scan over the markup produces the ordered region list:
//! `${}` interpolations in text and plain attribute values, `repeat.for`
//! values, binding-attribute values, and custom-element tag occurrences
//! matched against the hydrated component names. Malformed spans (an
//! unterminated interpolation or attribute quote, a stray `<`) emit no region
//! and never fail the rest of the document.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::document::{RepeatForData, ViewRegion};

/// Binding commands recognized in `name.command="expr"` attributes.
pub const BINDING_COMMANDS: &[&str] = &[
    "bind",
    "one-way",
    "two-way",
    "to-view",
    "from-view",
    "one-time",
    "call",
    "delegate",
    "trigger",
];

/// `item of items`, with capture positions for the declaration sites.
static REPEAT_FOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z_$][\w$]*)\s+of\s+(\S.*?)\s*$").unwrap());

/// Classify a template document into its embedded-language regions.
///
/// Pure function of the text and the known custom-element name set; the
/// returned list is sorted by start offset and pairwise non-overlapping.
pub fn classify(source: &str, known_elements: &HashSet<String>) -> Vec<ViewRegion> {
    let bytes = source.as_bytes();
    let mut regions = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'<' => pos = scan_tag(source, pos, known_elements, &mut regions),
            b'$' if bytes.get(pos + 1) == Some(&b'{') => {
                pos = scan_interpolation(source, pos, source.len(), None, &mut regions);
            }
            _ => pos += 1,
        }
    }

    regions
}

/// Scan a `<...>` construct starting at `open_pos`. Returns the position to
/// resume the outer scan from.
fn scan_tag(
    source: &str,
    open_pos: usize,
    known_elements: &HashSet<String>,
    regions: &mut Vec<ViewRegion>,
) -> usize {
    let bytes = source.as_bytes();
    let mut pos = open_pos + 1;

    match bytes.get(pos).copied() {
        // Comments and doctype declarations carry no regions.
        Some(b'!') => {
            if source[open_pos..].starts_with("<!--") {
                return match source[open_pos + 4..].find("-->") {
                    Some(rel) => open_pos + 4 + rel + 3,
                    None => source.len(),
                };
            }
            return skip_to_tag_end(bytes, pos);
        }
        Some(b'/') => return skip_to_tag_end(bytes, pos),
        _ => {}
    }

    let name_start = pos;
    while pos < bytes.len() && is_tag_name_byte(bytes[pos]) {
        pos += 1;
    }
    if pos == name_start {
        // Not a tag after all (`< ` or `<3`); treat the `<` as text.
        return open_pos + 1;
    }
    let tag_name = &source[name_start..pos];

    if known_elements.contains(tag_name) {
        regions.push(ViewRegion::custom_element(
            name_start,
            pos,
            tag_name.to_string(),
        ));
    }

    scan_attributes(source, pos, tag_name, regions)
}

/// Scan the attribute list of an open tag. Returns the resume position.
fn scan_attributes(
    source: &str,
    mut pos: usize,
    tag_name: &str,
    regions: &mut Vec<ViewRegion>,
) -> usize {
    let bytes = source.as_bytes();

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        match bytes.get(pos).copied() {
            None => return source.len(),
            Some(b'>') => return pos + 1,
            Some(b'/') => {
                pos += 1;
                continue;
            }
            _ => {}
        }

        let name_start = pos;
        while pos < bytes.len() && is_attr_name_byte(bytes[pos]) {
            pos += 1;
        }
        if pos == name_start {
            pos += 1;
            continue;
        }
        let attr_name = &source[name_start..pos];

        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if bytes.get(pos) != Some(&b'=') {
            // Valueless attribute.
            continue;
        }
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        let (value_start, value_end, resume) = match bytes.get(pos).copied() {
            Some(q @ (b'"' | b'\'')) => {
                let value_start = pos + 1;
                match memfind(bytes, q, value_start) {
                    Some(close) => (value_start, close, close + 1),
                    // Unterminated quote: drop the rest of the document's
                    // tag scan rather than guessing at a value span.
                    None => return source.len(),
                }
            }
            _ => {
                let value_start = pos;
                let mut end = pos;
                while end < bytes.len() && !bytes[end].is_ascii_whitespace() && bytes[end] != b'>' {
                    end += 1;
                }
                (value_start, end, end)
            }
        };

        classify_attribute(source, tag_name, attr_name, value_start, value_end, regions);
        pos = resume;
    }
}

/// Emit the region (if any) for one attribute value.
fn classify_attribute(
    source: &str,
    tag_name: &str,
    attr_name: &str,
    value_start: usize,
    value_end: usize,
    regions: &mut Vec<ViewRegion>,
) {
    if attr_name == "repeat.for" {
        let value = &source[value_start..value_end];
        // Malformed repeat expressions emit nothing.
        let captures = REPEAT_FOR_PATTERN.captures(value);
        if let Some((iterator, iterable)) =
            captures.as_ref().and_then(|c| c.get(1).zip(c.get(2)))
        {
            regions.push(ViewRegion::repeat_for(
                value_start,
                value_end,
                tag_name.to_string(),
                RepeatForData {
                    iterator: iterator.as_str().to_string(),
                    iterator_start: value_start + iterator.start(),
                    iterable: iterable.as_str().to_string(),
                    iterable_start: value_start + iterable.start(),
                },
            ));
        }
        return;
    }

    if let Some((name, command)) = attr_name.rsplit_once('.') {
        if !name.is_empty() && BINDING_COMMANDS.contains(&command) {
            regions.push(ViewRegion::attribute_binding(
                value_start,
                value_end,
                tag_name.to_string(),
                name.to_string(),
                command.to_string(),
            ));
            return;
        }
    }

    // Plain attribute values may still interpolate.
    let bytes = source.as_bytes();
    let mut pos = value_start;
    while pos + 1 < value_end {
        if bytes[pos] == b'$' && bytes[pos + 1] == b'{' {
            pos = scan_interpolation(source, pos, value_end, Some(tag_name.to_string()), regions);
        } else {
            pos += 1;
        }
    }
}

/// Scan a `${...}` interpolation starting at the `$`. Emits a region for the
/// expression body when the delimiter is terminated before `bound`; otherwise
/// skips the delimiter. Returns the resume position.
fn scan_interpolation(
    source: &str,
    dollar_pos: usize,
    bound: usize,
    tag_name: Option<String>,
    regions: &mut Vec<ViewRegion>,
) -> usize {
    let body_start = dollar_pos + 2;
    match find_interpolation_end(source, body_start, bound) {
        Some(close) => {
            regions.push(ViewRegion::interpolation(body_start, close, tag_name));
            close + 1
        }
        None => body_start,
    }
}

/// Find the `}` closing an interpolation body, honoring nested braces and
/// quoted strings inside the expression.
fn find_interpolation_end(source: &str, body_start: usize, bound: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut depth = 1usize;
    let mut pos = body_start;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    while pos < bound {
        let c = bytes[pos];

        if escaped {
            escaped = false;
            pos += 1;
            continue;
        }

        match quote {
            Some(q) => {
                if c == b'\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                b'\'' | b'"' | b'`' => quote = Some(c),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(pos);
                    }
                }
                _ => {}
            },
        }

        pos += 1;
    }

    None
}

fn skip_to_tag_end(bytes: &[u8], from: usize) -> usize {
    match memfind(bytes, b'>', from) {
        Some(end) => end + 1,
        None => bytes.len(),
    }
}

fn memfind(bytes: &[u8], needle: u8, from: usize) -> Option<usize> {
    bytes[from..].iter().position(|&b| b == needle).map(|i| from + i)
}

fn is_tag_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-'
}

fn is_attr_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'.' || b == b'_' || b == b':'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RegionKind;

    fn classify_plain(source: &str) -> Vec<ViewRegion> {
        classify(source, &HashSet::new())
    }

    fn kinds(regions: &[ViewRegion]) -> Vec<RegionKind> {
        regions.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn finds_text_interpolation() {
        let regions = classify_plain("<p>${user.name}</p>");
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].kind, RegionKind::TextInterpolation);
        assert_eq!(regions[0].text("<p>${user.name}</p>"), "user.name");
    }

    #[test]
    fn finds_attribute_binding() {
        let source = r#"<input value.bind="firstName">"#;
        let regions = classify_plain(source);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].kind, RegionKind::AttributeBinding);
        assert_eq!(regions[0].attribute_name.as_deref(), Some("value"));
        assert_eq!(regions[0].binding_command.as_deref(), Some("bind"));
        assert_eq!(regions[0].text(source), "firstName");
    }

    #[test]
    fn finds_repeat_for_with_metadata() {
        let source = r#"<li repeat.for="item of items"></li>"#;
        let regions = classify_plain(source);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].kind, RegionKind::RepeatFor);

        let data = regions[0].repeat_for.as_ref().unwrap();
        assert_eq!(data.iterator, "item");
        assert_eq!(data.iterable, "items");
        assert_eq!(&source[data.iterator_start..data.iterator_start + 4], "item");
        assert_eq!(&source[data.iterable_start..data.iterable_start + 5], "items");
    }

    #[test]
    fn finds_custom_element_tag() {
        let mut known = HashSet::new();
        known.insert("foo-bar".to_string());
        let source = "<div><foo-bar first.bind=\"x\"></foo-bar></div>";
        let regions = classify(source, &known);
        assert_eq!(
            kinds(&regions),
            vec![RegionKind::CustomElement, RegionKind::AttributeBinding]
        );
        assert_eq!(regions[0].text(source), "foo-bar");
    }

    #[test]
    fn unknown_tag_emits_no_element_region() {
        let regions = classify_plain("<foo-bar></foo-bar>");
        assert!(regions.is_empty());
    }

    #[test]
    fn interpolation_inside_plain_attribute_value() {
        let source = r#"<div title="Hi ${name}!"></div>"#;
        let regions = classify_plain(source);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].kind, RegionKind::TextInterpolation);
        assert_eq!(regions[0].text(source), "name");
    }

    #[test]
    fn no_interpolation_regions_inside_binding_values() {
        let source = r#"<div title.bind="greet('${')"></div>"#;
        let regions = classify_plain(source);
        assert_eq!(kinds(&regions), vec![RegionKind::AttributeBinding]);
    }

    #[test]
    fn nested_braces_and_strings_in_interpolation() {
        let source = "${fmt({a: '}'})}";
        let regions = classify_plain(source);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].text(source), "fmt({a: '}'})");
    }

    #[test]
    fn unterminated_interpolation_is_skipped() {
        let regions = classify_plain("<p>${user.name</p>");
        assert!(regions.is_empty());
    }

    #[test]
    fn unterminated_interpolation_does_not_poison_later_markup() {
        let source = "<p>${oops <span>${name}</span>";
        let regions = classify_plain(source);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].text(source), "name");
    }

    #[test]
    fn unterminated_attribute_quote_is_dropped() {
        let regions = classify_plain(r#"<input value.bind="firstName"#);
        assert!(regions.is_empty());
    }

    #[test]
    fn commented_out_markup_is_ignored() {
        let source = "<!-- <input value.bind=\"x\"> ${y} --><p>${z}</p>";
        let regions = classify_plain(source);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].text(source), "z");
    }

    #[test]
    fn malformed_repeat_for_emits_nothing() {
        let regions = classify_plain(r#"<li repeat.for="items"></li>"#);
        assert!(regions.is_empty());
    }

    #[test]
    fn regions_are_sorted_and_non_overlapping() {
        let mut known = HashSet::new();
        known.insert("user-card".to_string());
        let source = concat!(
            "<user-card name.bind=\"selected\">\n",
            "  <li repeat.for=\"item of items\">${item.label}</li>\n",
            "  <em>${count}</em>\n",
            "</user-card>"
        );
        let regions = classify(source, &known);
        assert_eq!(regions.len(), 5);
        for pair in regions.windows(2) {
            assert!(pair[0].end <= pair[1].start, "{:?} overlaps {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn classification_is_deterministic() {
        let mut known = HashSet::new();
        known.insert("foo-bar".to_string());
        let source = "<foo-bar a.bind=\"x\">${y}</foo-bar>";
        let first = classify(source, &known);
        let second = classify(source, &known);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.span(), b.span());
        }
    }

    #[test]
    fn all_binding_commands_are_recognized() {
        for command in BINDING_COMMANDS {
            let source = format!("<div thing.{}=\"expr\"></div>", command);
            let regions = classify_plain(&source);
            assert_eq!(regions.len(), 1, "command {} not recognized", command);
            assert_eq!(regions[0].binding_command.as_deref(), Some(*command));
        }
    }
}

//! Static analysis of view-model source files.
//!
//! This module provides regex-based extraction of component metadata from
//! view-model sources: the exported class, its bindable and plain properties,
//! and the decorator overrides that change the component's name or view file.
//! No type checker is involved; a field is bindable when the source marks it
//! with a `@bindable` decorator or lists it in `static bindables`.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use tower_lsp::lsp_types;

use crate::document::LineIndex;

/// One class field of a view model.
#[derive(Debug, Clone)]
pub struct ViewModelProperty {
    pub name: String,
    /// Declared type annotation, verbatim, when present.
    pub ty: Option<String>,
    pub is_bindable: bool,
    /// Byte span of the field name in the view-model source.
    pub name_span: Range<usize>,
    /// Same span as an LSP range (definition target).
    pub name_range: lsp_types::Range,
}

/// Result of parsing one view-model source file.
#[derive(Debug, Clone)]
pub struct ParsedViewModel {
    pub class_name: String,
    pub class_name_range: lsp_types::Range,
    /// Derived element name: decorator override, else kebab-cased class name
    /// (minus a `CustomElement` suffix).
    pub component_name: String,
    /// Relative view path from a `@useView('./x.html')` override.
    pub explicit_view: Option<String>,
    pub properties: Vec<ViewModelProperty>,
}

static EXPORT_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export\s+(?:default\s+)?class\s+([A-Za-z_$][\w$]*)").unwrap()
});

// @customElement('foo-bar') or @customElement({ name: 'foo-bar', ... })
static CUSTOM_ELEMENT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@customElement\(\s*['"]([^'"]+)['"]"#).unwrap()
});
static CUSTOM_ELEMENT_OBJECT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@customElement\(\s*\{[^}]*name\s*:\s*['"]([^'"]+)['"]"#).unwrap()
});

static USE_VIEW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"@useView\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

// `@bindable name`, `@bindable({...}) name`, modifiers allowed in between.
static BINDABLE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"@bindable(?:\s*\([^)]*\))?\s+(?:(?:public|private|protected|readonly|static)\s+)*([A-Za-z_$][\w$]*)(?:\s*[?!]?\s*:\s*([^;=\n]+))?",
    )
    .unwrap()
});

// Plain class field: `name: Type;`, `name = init;`, modifiers allowed.
static CLASS_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*(?:(?:public|private|protected|readonly|static)\s+)*([A-Za-z_$][\w$]*)\s*[?!]?\s*(?::\s*([^;=\n]+?))?\s*[=;]",
    )
    .unwrap()
});

static STATIC_BINDABLES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"static\s+bindables\s*(?::\s*[^=]+)?=\s*\[([^\]]*)\]").unwrap()
});

/// Parse a view-model source. Returns `None` when no exported class is found,
/// which callers treat as "not a component file".
pub fn parse_view_model(source: &str) -> Option<ParsedViewModel> {
    let comments = find_comment_ranges(source);
    let line_index = LineIndex::new(source.to_string());

    let class_caps = EXPORT_CLASS
        .captures_iter(source)
        .find(|c| !in_any(c.get(0).map(|m| m.start()).unwrap_or(0), &comments))?;
    let class_name_match = class_caps.get(1)?;
    let class_name = class_name_match.as_str().to_string();

    let body_open = source[class_name_match.end()..]
        .find('{')
        .map(|rel| class_name_match.end() + rel)?;
    let body_close = find_matching_brace(source, body_open)?;
    let body = &source[body_open + 1..body_close];
    let body_offset = body_open + 1;

    // Field extraction only looks at the class body's top level; method
    // bodies and nested object literals are masked out first.
    let top_level = top_level_ranges(body);

    let mut properties: Vec<ViewModelProperty> = Vec::new();

    for caps in BINDABLE_FIELD.captures_iter(body) {
        let Some(name) = caps.get(1) else { continue };
        let start = body_offset + name.start();
        if in_any(start, &comments) || !in_any(name.start(), &top_level) {
            continue;
        }
        push_property(
            &mut properties,
            name.as_str(),
            caps.get(2).map(|m| m.as_str().trim().to_string()),
            true,
            start..body_offset + name.end(),
            &line_index,
        );
    }

    for caps in CLASS_FIELD.captures_iter(body) {
        let Some(name) = caps.get(1) else { continue };
        let start = body_offset + name.start();
        if in_any(start, &comments) || !in_any(name.start(), &top_level) {
            continue;
        }
        if name.as_str() == "bindables" {
            continue;
        }
        push_property(
            &mut properties,
            name.as_str(),
            caps.get(2).map(|m| m.as_str().trim().to_string()),
            false,
            start..body_offset + name.end(),
            &line_index,
        );
    }

    if let Some(caps) = STATIC_BINDABLES
        .captures_iter(body)
        .find(|c| !in_any(body_offset + c.get(0).map(|m| m.start()).unwrap_or(0), &comments))
    {
        if let Some(list) = caps.get(1) {
            for entry in list.as_str().split(',') {
                let name = entry.trim().trim_matches(|c| c == '\'' || c == '"' || c == '`');
                if name.is_empty() {
                    continue;
                }
                match properties.iter_mut().find(|p| p.name == name) {
                    Some(existing) => existing.is_bindable = true,
                    None => {
                        let span = body_offset + list.start()..body_offset + list.end();
                        properties.push(ViewModelProperty {
                            name: name.to_string(),
                            ty: None,
                            is_bindable: true,
                            name_span: span.clone(),
                            name_range: line_index.span_to_range(&span),
                        });
                    }
                }
            }
        }
    }

    let decorator_name = CUSTOM_ELEMENT_NAME
        .captures(source)
        .or_else(|| CUSTOM_ELEMENT_OBJECT_NAME.captures(source))
        .and_then(|c| c.get(1))
        .filter(|m| !in_any(m.start(), &comments))
        .map(|m| m.as_str().to_string());

    let component_name = decorator_name.unwrap_or_else(|| {
        let base = class_name.strip_suffix("CustomElement").unwrap_or(&class_name);
        kebab_case(base)
    });

    let explicit_view = USE_VIEW
        .captures(source)
        .and_then(|c| c.get(1))
        .filter(|m| !in_any(m.start(), &comments))
        .map(|m| m.as_str().to_string());

    let class_span = class_name_match.start()..class_name_match.end();
    Some(ParsedViewModel {
        class_name,
        class_name_range: line_index.span_to_range(&class_span),
        component_name,
        explicit_view,
        properties,
    })
}

fn push_property(
    properties: &mut Vec<ViewModelProperty>,
    name: &str,
    ty: Option<String>,
    is_bindable: bool,
    span: Range<usize>,
    line_index: &LineIndex,
) {
    if let Some(existing) = properties.iter_mut().find(|p| p.name == name) {
        // The decorated pass runs first; the plain-field pass must not
        // downgrade its entries.
        if existing.ty.is_none() {
            existing.ty = ty;
        }
        existing.is_bindable |= is_bindable;
        return;
    }
    properties.push(ViewModelProperty {
        name: name.to_string(),
        ty,
        is_bindable,
        name_span: span.clone(),
        name_range: line_index.span_to_range(&span),
    });
}

/// Convert `MyPropertyName` to `my-property-name`.
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Element type of an array-like annotation: `Item[]` / `Array<Item>` → `Item`.
pub fn element_type_name(ty: &str) -> Option<&str> {
    let ty = ty.trim();
    if let Some(inner) = ty.strip_suffix("[]") {
        return Some(inner.trim());
    }
    ty.strip_prefix("Array<")
        .and_then(|rest| rest.strip_suffix('>'))
        .map(str::trim)
}

/// Byte ranges of all comments in a host-language source file.
///
/// Handles `//` line comments and `/* */` block comments while ignoring
/// comment-like sequences inside string and template literals.
fn find_comment_ranges(source: &str) -> Vec<Range<usize>> {
    let bytes = source.as_bytes();
    let mut ranges = Vec::new();
    let mut pos = 0;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    while pos < bytes.len() {
        let c = bytes[pos];

        if escaped {
            escaped = false;
            pos += 1;
            continue;
        }

        if let Some(q) = quote {
            if c == b'\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            pos += 1;
            continue;
        }

        match c {
            b'\'' | b'"' | b'`' => {
                quote = Some(c);
                pos += 1;
            }
            b'/' if pos + 1 < bytes.len() && bytes[pos + 1] == b'/' => {
                let start = pos;
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    pos += 1;
                }
                ranges.push(start..pos);
            }
            b'/' if pos + 1 < bytes.len() && bytes[pos + 1] == b'*' => {
                let start = pos;
                pos += 2;
                while pos + 1 < bytes.len() {
                    if bytes[pos] == b'*' && bytes[pos + 1] == b'/' {
                        pos += 2;
                        break;
                    }
                    pos += 1;
                }
                ranges.push(start..pos);
            }
            _ => pos += 1,
        }
    }

    ranges
}

fn in_any(offset: usize, ranges: &[Range<usize>]) -> bool {
    ranges.iter().any(|r| r.contains(&offset))
}

/// Find the position of the brace matching the one at `open_pos`.
fn find_matching_brace(source: &str, open_pos: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    if bytes.get(open_pos) != Some(&b'{') {
        return None;
    }

    let mut depth = 1;
    let mut pos = open_pos + 1;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    while pos < bytes.len() && depth > 0 {
        let c = bytes[pos];

        if escaped {
            escaped = false;
            pos += 1;
            continue;
        }

        if let Some(q) = quote {
            if c == b'\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            pos += 1;
            continue;
        }

        match c {
            b'\'' | b'"' | b'`' => quote = Some(c),
            b'{' => depth += 1,
            b'}' => depth -= 1,
            _ => {}
        }
        pos += 1;
    }

    if depth == 0 {
        Some(pos - 1)
    } else {
        None
    }
}

/// Spans of `body` that sit at the class body's top level, outside nested
/// braces (method bodies, object literals).
fn top_level_ranges(body: &str) -> Vec<Range<usize>> {
    let bytes = body.as_bytes();
    let mut ranges = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (pos, &c) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        if let Some(q) = quote {
            if c == b'\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            b'\'' | b'"' | b'`' => quote = Some(c),
            b'{' => {
                if depth == 0 {
                    ranges.push(start..pos);
                }
                depth += 1;
            }
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    start = pos + 1;
                }
            }
            _ => {}
        }
    }
    if depth == 0 && start <= body.len() {
        ranges.push(start..body.len());
    }

    ranges
}

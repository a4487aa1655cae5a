//! Shared identifier resolution for expression-bearing regions.
//!
//! Text interpolation, repeat-for and attribute-binding regions all resolve
//! the same way: identifiers come from the enclosing component's view-model
//! properties plus any repeat-for loop variables in scope, and one level of
//! member access follows a property's type annotation to another hydrated
//! class. Requests anchored in scaffold text (no source location) resolve to
//! nothing.

use std::ops::Range;

use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, Documentation, Hover, HoverContents, MarkupContent,
    MarkupKind,
};

use crate::document::word_at_offset;
use crate::model::{element_type_name, Component, ProgramModel, ViewModelProperty};

use super::{DefinitionResult, ModeContext, ModeError};

/// What kind of completion context the cursor sits in.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ExpressionContext {
    /// Cursor is after a `.`; `receiver` is the dotted chain before it.
    MemberAccess { receiver: String, prefix: String },
    /// Cursor is at a bare or partial identifier.
    Identifier { prefix: String },
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Detect the completion context by scanning backwards from the cursor.
pub(crate) fn detect_context(expression: &str, offset: usize) -> ExpressionContext {
    let before = &expression[..offset.min(expression.len())];

    let ident_len = before
        .bytes()
        .rev()
        .take_while(|&b| is_word_byte(b))
        .count();
    let prefix = before[before.len() - ident_len..].to_string();

    let rest = before[..before.len() - ident_len].trim_end();
    if let Some(stripped) = rest.strip_suffix('.') {
        let bytes = stripped.as_bytes();
        let mut chain_start = stripped.len();
        while chain_start > 0 {
            let b = bytes[chain_start - 1];
            if is_word_byte(b) || b == b'.' {
                chain_start -= 1;
            } else {
                break;
            }
        }
        let receiver = stripped[chain_start..].to_string();
        if !receiver.is_empty() {
            return ExpressionContext::MemberAccess { receiver, prefix };
        }
    }

    ExpressionContext::Identifier { prefix }
}

/// A repeat-for loop variable visible at some region.
pub(crate) struct LoopVar {
    pub name: String,
    /// Host-document span of the iterator declaration.
    pub declaration_span: Range<usize>,
    pub iterable: String,
}

/// Loop variables in scope for the context's region: every repeat-for region
/// declared at or before it, the region itself included.
pub(crate) fn loop_vars_in_scope(ctx: &ModeContext) -> Vec<LoopVar> {
    ctx.state
        .regions
        .iter()
        .filter(|r| r.start <= ctx.region.start)
        .filter_map(|r| r.repeat_for.as_ref())
        .map(|data| LoopVar {
            name: data.iterator.clone(),
            declaration_span: data.iterator_start..data.iterator_start + data.iterator.len(),
            iterable: data.iterable.clone(),
        })
        .collect()
}

/// The component whose view this template document is.
pub(crate) fn enclosing_component<'a>(ctx: &ModeContext<'a>) -> Option<&'a Component> {
    let path = ctx.document_path.as_deref()?;
    ctx.program.component_by_view_path(path)
}

/// Follow a dotted property path (`user.address`) through hydrated classes,
/// returning the final property.
fn resolve_property_path<'a>(
    program: &'a ProgramModel,
    component: &'a Component,
    path: &str,
) -> Option<&'a ViewModelProperty> {
    let mut segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    if segments.first() == Some(&"this") {
        segments.remove(0);
    }
    let (last, init) = segments.split_last()?;

    let mut current = component;
    for seg in init {
        let ty = current.property(seg)?.ty.as_deref()?;
        current = program.component_by_class_name(ty.trim())?;
    }
    current.property(last)
}

/// Resolve a member-access receiver chain to the hydrated class whose
/// properties should be offered after the dot.
fn resolve_receiver<'a>(
    ctx: &ModeContext<'a>,
    component: &'a Component,
    loop_vars: &[LoopVar],
    receiver: &str,
) -> Option<&'a Component> {
    let mut segments: Vec<&str> = receiver.split('.').filter(|s| !s.is_empty()).collect();
    if segments.first() == Some(&"this") {
        segments.remove(0);
    }
    if segments.is_empty() {
        return Some(component);
    }

    let first_ty = if let Some(lv) = loop_vars.iter().find(|lv| lv.name == segments[0]) {
        let iterable = resolve_property_path(ctx.program, component, &lv.iterable)?;
        element_type_name(iterable.ty.as_deref()?)?.to_string()
    } else {
        component.property(segments[0])?.ty.clone()?
    };

    let mut current = ctx.program.component_by_class_name(first_ty.trim())?;
    for seg in &segments[1..] {
        let ty = current.property(seg)?.ty.clone()?;
        current = ctx.program.component_by_class_name(ty.trim())?;
    }
    Some(current)
}

/// Whether the request is anchored at a mappable source location. Scaffold
/// text and positions outside the region have none.
fn has_source_anchor(ctx: &ModeContext) -> Result<bool, ModeError> {
    let vsrc = ctx
        .state
        .virtual_source(ctx.region_index)
        .ok_or_else(|| ModeError::new("region has no virtual source"))?;
    let anchored = vsrc
        .to_virtual_offset(ctx.offset)
        .and_then(|v| vsrc.to_source_offset(v))
        .is_some();
    Ok(anchored)
}

fn property_item(property: &ViewModelProperty) -> CompletionItem {
    CompletionItem {
        label: property.name.clone(),
        kind: Some(CompletionItemKind::FIELD),
        detail: property.ty.clone(),
        documentation: property.is_bindable.then(|| {
            Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value: "Bindable property".to_string(),
            })
        }),
        sort_text: Some(format!("1_{}", property.name)),
        ..Default::default()
    }
}

fn matches_prefix(name: &str, prefix: &str) -> bool {
    prefix.is_empty() || name.to_lowercase().starts_with(&prefix.to_lowercase())
}

/// Completion against the virtual source plus the component scope.
pub(crate) fn complete(ctx: &ModeContext) -> Result<Vec<CompletionItem>, ModeError> {
    if !has_source_anchor(ctx)? {
        return Ok(Vec::new());
    }

    let expression = ctx.region.text(ctx.state.source());
    let rel_offset = ctx.offset.saturating_sub(ctx.region.start);
    let loop_vars = loop_vars_in_scope(ctx);
    let component = enclosing_component(ctx);

    let mut items = Vec::new();
    match detect_context(expression, rel_offset) {
        ExpressionContext::MemberAccess { receiver, prefix } => {
            let Some(component) = component else {
                return Ok(items);
            };
            if let Some(target) = resolve_receiver(ctx, component, &loop_vars, &receiver) {
                for property in &target.properties {
                    if matches_prefix(&property.name, &prefix) {
                        items.push(property_item(property));
                    }
                }
            }
        }
        ExpressionContext::Identifier { prefix } => {
            for lv in &loop_vars {
                if matches_prefix(&lv.name, &prefix) {
                    items.push(CompletionItem {
                        label: lv.name.clone(),
                        kind: Some(CompletionItemKind::VARIABLE),
                        detail: Some(format!("loop variable of {}", lv.iterable)),
                        sort_text: Some(format!("0_{}", lv.name)),
                        ..Default::default()
                    });
                }
            }
            if let Some(component) = component {
                for property in &component.properties {
                    if matches_prefix(&property.name, &prefix) {
                        items.push(property_item(property));
                    }
                }
            }
        }
    }

    Ok(items)
}

/// The component owning the word at the cursor: the receiver's class for
/// member access, the enclosing component otherwise.
fn component_for_word<'a>(
    ctx: &ModeContext<'a>,
    component: &'a Component,
    loop_vars: &[LoopVar],
    word_start: usize,
) -> Option<&'a Component> {
    let expression = ctx.region.text(ctx.state.source());
    let rel = word_start.checked_sub(ctx.region.start)?;
    match detect_context(expression, rel) {
        ExpressionContext::MemberAccess { receiver, .. } => {
            resolve_receiver(ctx, component, loop_vars, &receiver)
        }
        ExpressionContext::Identifier { .. } => Some(component),
    }
}

/// Definition for the word under the cursor, in source coordinates.
pub(crate) fn definition(
    ctx: &ModeContext,
    source_word: &str,
) -> Result<Option<DefinitionResult>, ModeError> {
    if !has_source_anchor(ctx)? {
        return Ok(None);
    }

    let loop_vars = loop_vars_in_scope(ctx);

    // A loop variable resolves to its repeat.for declaration site, not to
    // the view model.
    if let Some(lv) = loop_vars.iter().find(|lv| lv.name == source_word) {
        let Some(path) = ctx.document_path.clone() else {
            return Ok(None);
        };
        return Ok(Some(DefinitionResult {
            target_file_path: path,
            range: ctx.state.line_index.span_to_range(&lv.declaration_span),
        }));
    }

    let Some(component) = enclosing_component(ctx) else {
        return Ok(None);
    };

    let word_start = word_at_offset(ctx.state.source(), ctx.offset)
        .map(|(_, span)| span.start)
        .unwrap_or(ctx.offset);
    let Some(target) = component_for_word(ctx, component, &loop_vars, word_start) else {
        return Ok(None);
    };

    Ok(target.property(source_word).map(|p| DefinitionResult {
        target_file_path: target.view_model_file_path.clone(),
        range: p.name_range,
    }))
}

/// Hover for the word under the cursor.
pub(crate) fn hover(ctx: &ModeContext, source_word: &str) -> Result<Option<Hover>, ModeError> {
    if !has_source_anchor(ctx)? {
        return Ok(None);
    }

    let word_span = word_at_offset(ctx.state.source(), ctx.offset).map(|(_, span)| span);
    let range = word_span
        .clone()
        .map(|span| ctx.state.line_index.span_to_range(&span));

    let loop_vars = loop_vars_in_scope(ctx);
    if let Some(lv) = loop_vars.iter().find(|lv| lv.name == source_word) {
        return Ok(Some(Hover {
            contents: markdown(format!(
                "(loop variable) `{}`\n\nDeclared by `repeat.for=\"{} of {}\"`",
                lv.name, lv.name, lv.iterable
            )),
            range,
        }));
    }

    let Some(component) = enclosing_component(ctx) else {
        return Ok(None);
    };
    let word_start = word_span.map(|s| s.start).unwrap_or(ctx.offset);
    let Some(target) = component_for_word(ctx, component, &loop_vars, word_start) else {
        return Ok(None);
    };
    let Some(property) = target.property(source_word) else {
        return Ok(None);
    };

    let mut value = format!(
        "(property) `{}`: `{}`",
        property.name,
        property.ty.as_deref().unwrap_or("unknown")
    );
    if property.is_bindable {
        value.push_str(&format!("\n\nBindable of `{}`", target.class_name));
    }

    Ok(Some(Hover {
        contents: markdown(value),
        range,
    }))
}

fn markdown(value: String) -> HoverContents {
    HoverContents::Markup(MarkupContent {
        kind: MarkupKind::Markdown,
        value,
    })
}

//! Mode handler for custom-element tag regions.
//!
//! Resolves against the component model plus the static element library:
//! completion offers the component's bindables as kebab-case attributes with
//! binding-command snippets, global attributes, and global events; definition
//! jumps to the view-model class; hover summarizes the component.

use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, Documentation, Hover, HoverContents, InsertTextFormat,
    MarkupContent, MarkupKind,
};

use crate::document::RegionKind;
use crate::elements::{GLOBAL_ATTRIBUTES, GLOBAL_EVENTS};
use crate::model::{kebab_case, Component};

use super::{DefinitionResult, LanguageMode, ModeContext, ModeError};

pub struct CustomElementMode;

impl CustomElementMode {
    fn component<'a>(ctx: &ModeContext<'a>) -> Option<&'a Component> {
        let tag = ctx.region.tag_name.as_deref()?;
        ctx.program.component_by_name(tag)
    }
}

impl LanguageMode for CustomElementMode {
    fn kind(&self) -> RegionKind {
        RegionKind::CustomElement
    }

    fn do_complete(&self, ctx: &ModeContext) -> Result<Vec<CompletionItem>, ModeError> {
        let Some(component) = Self::component(ctx) else {
            return Ok(Vec::new());
        };

        let quote = ctx.quote;
        let mut items = Vec::new();

        for property in component.bindables() {
            let attribute = kebab_case(&property.name);
            items.push(CompletionItem {
                label: attribute.clone(),
                kind: Some(CompletionItemKind::VARIABLE),
                detail: Some("View Model Bindable".to_string()),
                documentation: property.ty.clone().map(|ty| {
                    Documentation::MarkupContent(MarkupContent {
                        kind: MarkupKind::Markdown,
                        value: format!("`{}`", ty),
                    })
                }),
                insert_text: Some(format!(
                    "{}.${{1:bind}}={}${{0:{}}}{}",
                    attribute, quote, property.name, quote
                )),
                insert_text_format: Some(InsertTextFormat::SNIPPET),
                sort_text: Some(format!("0_{}", attribute)),
                ..Default::default()
            });
        }

        for attribute in GLOBAL_ATTRIBUTES {
            items.push(CompletionItem {
                label: attribute.name.to_string(),
                kind: Some(CompletionItemKind::PROPERTY),
                documentation: Some(Documentation::MarkupContent(MarkupContent {
                    kind: MarkupKind::Markdown,
                    value: attribute.description.to_string(),
                })),
                insert_text: Some(format!("{}={}${{0}}{}", attribute.name, quote, quote)),
                insert_text_format: Some(InsertTextFormat::SNIPPET),
                sort_text: Some(format!("1_{}", attribute.name)),
                ..Default::default()
            });
        }

        for event in GLOBAL_EVENTS {
            items.push(CompletionItem {
                label: event.to_string(),
                kind: Some(CompletionItemKind::EVENT),
                insert_text: Some(format!("{}.${{1:trigger}}={}${{0}}{}", event, quote, quote)),
                insert_text_format: Some(InsertTextFormat::SNIPPET),
                sort_text: Some(format!("2_{}", event)),
                ..Default::default()
            });
        }

        Ok(items)
    }

    fn do_definition(
        &self,
        ctx: &ModeContext,
        _source_word: &str,
    ) -> Result<Option<DefinitionResult>, ModeError> {
        Ok(Self::component(ctx).map(|component| DefinitionResult {
            target_file_path: component.view_model_file_path.clone(),
            range: component.class_name_range,
        }))
    }

    fn do_hover(&self, ctx: &ModeContext, _source_word: &str) -> Result<Option<Hover>, ModeError> {
        let Some(component) = Self::component(ctx) else {
            return Ok(None);
        };

        let mut value = format!(
            "**custom element** `<{}>`\n\nclass `{}`\n\n{}",
            component.component_name,
            component.class_name,
            component.view_model_file_path.display()
        );
        let bindables: Vec<String> = component
            .bindables()
            .map(|p| format!("`{}`", kebab_case(&p.name)))
            .collect();
        if !bindables.is_empty() {
            value.push_str(&format!("\n\nBindables: {}", bindables.join(", ")));
        }

        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            }),
            range: Some(ctx.state.line_index.span_to_range(&ctx.region.span())),
        }))
    }
}

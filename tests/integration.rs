use std::path::{Path, PathBuf};

use aulsp::{
    discover_view_model_files, dispatch_complete, dispatch_definition, DefinitionResult,
    LanguageMode, ModeContext, ModeRegistry, ProgramModel, TemplateDocumentState,
};
use expect_test::expect;
use tower_lsp::lsp_types::{CompletionItem, Position};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a unique temp directory for test isolation.
fn make_test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("aulsp-integration")
        .join(name)
        .join(format!("{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

const FOO_BAR_TS: &str = r#"export class FooBarCustomElement {
  @bindable myValue: string;
  user: User;
  items: Item[] = [];
  greeting = 'hello';
}
"#;

const USER_TS: &str = r#"export class User {
  name: string;
  email: string;
}
"#;

const ITEM_TS: &str = r#"export class Item {
  label: string;
  price: number;
}
"#;

/// A hydrated single-project workspace with three components.
struct Fixture {
    dir: PathBuf,
    model: ProgramModel,
    registry: ModeRegistry,
}

impl Fixture {
    fn new(name: &str) -> Self {
        let dir = make_test_dir(name);
        std::fs::write(
            dir.join("package.json"),
            r#"{ "name": "fixture", "dependencies": { "aurelia-framework": "^1.0.0" } }"#,
        )
        .unwrap();
        std::fs::write(dir.join("tsconfig.json"), "{}").unwrap();
        std::fs::write(dir.join("foo-bar.ts"), FOO_BAR_TS).unwrap();
        std::fs::write(dir.join("foo-bar.html"), "<template></template>").unwrap();
        std::fs::write(dir.join("user.ts"), USER_TS).unwrap();
        std::fs::write(dir.join("item.ts"), ITEM_TS).unwrap();

        let mut model = ProgramModel::new();
        model.set_projects(&[dir.join("package.json")]);
        model.hydrate(&discover_view_model_files(&dir));

        Self {
            dir,
            model,
            registry: ModeRegistry::new(),
        }
    }

    /// Path of the template paired with the `foo-bar` component.
    fn view_path(&self) -> PathBuf {
        self.dir.join("foo-bar.html")
    }

    /// Dispatch a request at a position in ad-hoc template content.
    fn at_position<T>(
        &self,
        content: &str,
        position: Position,
        f: impl FnOnce(&dyn LanguageMode, &ModeContext) -> T,
    ) -> Option<T> {
        let state =
            TemplateDocumentState::new(content.to_string(), 0, &self.model.component_names());
        let found = self
            .registry
            .get_mode_and_region_at_position(&state, position)?;
        let offset = state.line_index.position_to_offset(position)?;
        let ctx = ModeContext {
            state: &state,
            region_index: found.region_index,
            region: found.region,
            document_path: Some(self.view_path()),
            offset,
            trigger_character: None,
            program: &self.model,
            quote: '"',
        };
        Some(f(found.mode, &ctx))
    }

    fn complete_at(&self, content: &str, position: Position) -> String {
        match self.at_position(content, position, |mode, ctx| dispatch_complete(mode, ctx)) {
            Some(items) => format_completion_labels(&items),
            None => "no region at position".to_string(),
        }
    }

    fn definition_at(&self, content: &str, position: Position, word: &str) -> String {
        match self.at_position(content, position, |mode, ctx| {
            dispatch_definition(mode, ctx, word)
        }) {
            Some(Some(result)) => format_definition(&result),
            Some(None) => "no definition".to_string(),
            None => "no region at position".to_string(),
        }
    }

    fn cleanup(self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn format_completion_labels(items: &[CompletionItem]) -> String {
    if items.is_empty() {
        return "no completions".to_string();
    }
    let mut labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    labels.sort_unstable();
    labels.join(", ")
}

fn format_definition(result: &DefinitionResult) -> String {
    let file = result
        .target_file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("?");
    format!(
        "{} @ {}:{}-{}:{}",
        file,
        result.range.start.line,
        result.range.start.character,
        result.range.end.line,
        result.range.end.character,
    )
}

/// Format a classified document's regions as `line:col-line:col kind "text"`.
fn format_regions(source: &str, known: &std::collections::HashSet<String>) -> String {
    let state = TemplateDocumentState::new(source.to_string(), 0, known);
    if state.regions.is_empty() {
        return "no regions".to_string();
    }
    let mut out = state
        .regions
        .iter()
        .map(|r| {
            let range = state.line_index.span_to_range(&r.span());
            format!(
                "{}:{}-{}:{} {} {:?}",
                range.start.line,
                range.start.character,
                range.end.line,
                range.end.character,
                r.kind.as_str(),
                r.text(source),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    out.push('\n');
    out
}

fn format_component_list(model: &ProgramModel) -> String {
    let list = model.get_component_list();
    if list.is_empty() {
        return "no components".to_string();
    }
    let mut out = list
        .iter()
        .map(|c| {
            let file = |p: &Path| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("?")
                    .to_string()
            };
            format!(
                "{} class={} vm={} view={}",
                c.component_name,
                c.class_name,
                file(&c.view_model_file_path),
                c.view_file_path.as_deref().map(file).unwrap_or_else(|| "-".to_string()),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    out.push('\n');
    out
}

const REPEAT_TEMPLATE: &str = "<template>\n  <li repeat.for=\"item of items\">${item.label}</li>\n</template>\n";

// ---------------------------------------------------------------------------
// Region classification
// ---------------------------------------------------------------------------

#[test]
fn classifies_a_rich_template() {
    let source = "<template>\n  <user-card user.bind=\"currentUser\" class=\"wide\">\n    <li repeat.for=\"item of items\">${item.label}</li>\n  </user-card>\n  <p title=\"Hi ${userName}\">${greeting}</p>\n</template>\n";
    let known = ["user-card".to_string()].into_iter().collect();

    let actual = format_regions(source, &known);
    let expected = expect![[r#"
        1:3-1:12 custom-element "user-card"
        1:24-1:35 attribute-binding "currentUser"
        2:20-2:33 repeat-for "item of items"
        2:37-2:47 text-interpolation "item.label"
        4:17-4:25 text-interpolation "userName"
        4:30-4:38 text-interpolation "greeting"
    "#]];
    expected.assert_eq(&actual);
}

#[test]
fn classification_is_deterministic_and_ordered() {
    let source = "<template>\n  <p if.bind=\"show\">${a} ${b}</p>\n</template>\n";
    let known = std::collections::HashSet::new();

    let first = format_regions(source, &known);
    let second = format_regions(source, &known);
    assert_eq!(first, second);

    let state = TemplateDocumentState::new(source.to_string(), 0, &known);
    for pair in state.regions.windows(2) {
        assert!(pair[0].start < pair[1].start);
        assert!(pair[0].end <= pair[1].start, "regions must not overlap");
    }
}

#[test]
fn virtual_sources_round_trip_every_region() {
    let known = std::collections::HashSet::new();
    let state = TemplateDocumentState::new(REPEAT_TEMPLATE.to_string(), 0, &known);
    assert_eq!(state.regions.len(), 2);

    for (index, region) in state.regions.iter().enumerate() {
        let vsrc = state.virtual_source(index).unwrap();
        for source_offset in region.start..=region.end {
            let virtual_offset = vsrc.to_virtual_offset(source_offset).unwrap();
            assert_eq!(vsrc.to_source_offset(virtual_offset), Some(source_offset));
        }
        // Scaffold start has no source location.
        assert_eq!(vsrc.to_source_offset(0), None);
    }
}

// ---------------------------------------------------------------------------
// Component list / hydration
// ---------------------------------------------------------------------------

#[test]
fn component_list_after_initial_hydration() {
    let fixture = Fixture::new("component-list");
    let actual = format_component_list(&fixture.model);
    let expected = expect![[r#"
        foo-bar class=FooBarCustomElement vm=foo-bar.ts view=foo-bar.html
        item class=Item vm=item.ts view=-
        user class=User vm=user.ts view=-
    "#]];
    expected.assert_eq(&actual);
    fixture.cleanup();
}

#[test]
fn rehydration_is_idempotent() {
    let mut fixture = Fixture::new("rehydrate");
    let before = format_component_list(&fixture.model);

    let paths = discover_view_model_files(&fixture.dir);
    fixture.model.hydrate(&paths);
    fixture.model.hydrate(&paths);

    assert_eq!(before, format_component_list(&fixture.model));
    fixture.cleanup();
}

#[test]
fn broken_view_model_is_skipped_and_siblings_survive() {
    let mut fixture = Fixture::new("broken-sibling");
    std::fs::write(
        fixture.dir.join("broken.ts"),
        "export class {{{{ this is not parseable",
    )
    .unwrap();

    fixture
        .model
        .hydrate(&discover_view_model_files(&fixture.dir));

    let actual = format_component_list(&fixture.model);
    let expected = expect![[r#"
        foo-bar class=FooBarCustomElement vm=foo-bar.ts view=foo-bar.html
        item class=Item vm=item.ts view=-
        user class=User vm=user.ts view=-
    "#]];
    expected.assert_eq(&actual);
    fixture.cleanup();
}

// ---------------------------------------------------------------------------
// Mode dispatch
// ---------------------------------------------------------------------------

#[test]
fn plain_markup_has_no_mode() {
    let fixture = Fixture::new("plain-markup");
    let actual = fixture.complete_at("<p>hi ${user.name}</p>", Position::new(0, 4));
    assert_eq!(actual, "no region at position");
    fixture.cleanup();
}

// ---------------------------------------------------------------------------
// Completion scenarios
// ---------------------------------------------------------------------------

#[test]
fn member_completion_after_user_dot() {
    let fixture = Fixture::new("member-completion");
    // Cursor right after the dot in `${user.}`.
    let actual = fixture.complete_at("<p>${user.}</p>", Position::new(0, 10));
    let expected = expect![[r#"email, name"#]];
    expected.assert_eq(&actual);
    fixture.cleanup();
}

#[test]
fn member_completion_filters_by_prefix() {
    let fixture = Fixture::new("member-prefix");
    // Cursor after `${user.na` — prefix "na" keeps `name`, drops `email`.
    let actual = fixture.complete_at("<p>${user.na}</p>", Position::new(0, 12));
    let expected = expect![[r#"name"#]];
    expected.assert_eq(&actual);
    fixture.cleanup();
}

#[test]
fn no_member_completion_outside_the_delimiters() {
    let fixture = Fixture::new("outside-delimiters");
    // `user.` spelled in plain text, no `${...}` around it.
    let actual = fixture.complete_at("<p>user.</p>", Position::new(0, 8));
    assert_eq!(actual, "no region at position");
    fixture.cleanup();
}

#[test]
fn identifier_completion_offers_properties_and_loop_variables() {
    let fixture = Fixture::new("identifier-completion");
    // Cursor right after `${` in the nested interpolation.
    let actual = fixture.complete_at(REPEAT_TEMPLATE, Position::new(1, 35));
    let expected = expect![[r#"greeting, item, items, myValue, user"#]];
    expected.assert_eq(&actual);
    fixture.cleanup();
}

#[test]
fn custom_element_completion_offers_kebab_case_bindables() {
    let fixture = Fixture::new("custom-element-completion");
    let items = fixture
        .at_position("<foo-bar ></foo-bar>", Position::new(0, 2), |mode, ctx| {
            dispatch_complete(mode, ctx)
        })
        .unwrap();

    let actual = format_completion_labels(&items);
    let expected = expect![[
        r#"blur, class, click, dblclick, focus, hidden, id, keydown, keyup, mousedown, mouseout, mouseover, mouseup, my-value, slot, style, tabindex, title"#
    ]];
    expected.assert_eq(&actual);

    let bindable = items.iter().find(|i| i.label == "my-value").unwrap();
    assert_eq!(
        bindable.insert_text.as_deref(),
        Some("my-value.${1:bind}=\"${0:myValue}\"")
    );
    assert_eq!(bindable.detail.as_deref(), Some("View Model Bindable"));
    fixture.cleanup();
}

// ---------------------------------------------------------------------------
// Definition scenarios
// ---------------------------------------------------------------------------

#[test]
fn loop_variable_definition_resolves_to_the_repeat_for_declaration() {
    let fixture = Fixture::new("loop-var-definition");
    // `item` inside the nested interpolation resolves to the declaration in
    // the repeat.for value, not into any view model.
    let actual = fixture.definition_at(REPEAT_TEMPLATE, Position::new(1, 36), "item");
    let expected = expect![[r#"foo-bar.html @ 1:18-1:22"#]];
    expected.assert_eq(&actual);
    fixture.cleanup();
}

#[test]
fn member_definition_follows_the_loop_variable_type() {
    let fixture = Fixture::new("member-definition");
    // `label` in `${item.label}` lands on the field inside item.ts.
    let actual = fixture.definition_at(REPEAT_TEMPLATE, Position::new(1, 40), "label");
    let expected = expect![[r#"item.ts @ 1:2-1:7"#]];
    expected.assert_eq(&actual);
    fixture.cleanup();
}

#[test]
fn property_definition_resolves_into_the_view_model() {
    let fixture = Fixture::new("property-definition");
    // `items` in the repeat.for iterable is a view-model property.
    let actual = fixture.definition_at(REPEAT_TEMPLATE, Position::new(1, 27), "items");
    let expected = expect![[r#"foo-bar.ts @ 3:2-3:7"#]];
    expected.assert_eq(&actual);
    fixture.cleanup();
}

#[test]
fn unknown_word_has_no_definition() {
    let fixture = Fixture::new("unknown-definition");
    let actual = fixture.definition_at("<p>${missing}</p>", Position::new(0, 7), "missing");
    assert_eq!(actual, "no definition");
    fixture.cleanup();
}

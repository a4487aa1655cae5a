//! Aurelia template language server implementation.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{OnceLock, RwLock};

use serde::{Deserialize, Serialize};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService};

mod document;
mod elements;
mod model;
mod modes;
pub mod settings;
mod template;

pub use document::{
    word_at_offset, DocumentStore, LineIndex, RegionKind, RepeatForData, TemplateDocumentState,
    ViewRegion, VirtualSource,
};
pub use model::{
    discover_manifests, discover_view_model_files, parse_view_model, Component, ProgramModel,
};
pub use modes::{
    dispatch_complete, dispatch_definition, dispatch_hover, DefinitionResult, LanguageMode,
    ModeAndRegion, ModeContext, ModeError, ModeRegistry,
};
pub use settings::{discover_settings, load_settings, Settings};
pub use template::classify;

use model::is_view_model_candidate;

/// Parameters of the `get-virtual-definition` / `get-virtual-hover` requests.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualPositionParams {
    pub document_content: String,
    pub position: Position,
    pub go_to_source_word: String,
    pub file_path: PathBuf,
}

/// One entry of the `aurelia-get-component-list` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInfo {
    pub component_name: String,
    pub class_name: String,
    pub view_file_path: Option<PathBuf>,
    pub view_model_file_path: PathBuf,
}

impl From<&Component> for ComponentInfo {
    fn from(component: &Component) -> Self {
        Self {
            component_name: component.component_name.clone(),
            class_name: component.class_name.clone(),
            view_file_path: component.view_file_path.clone(),
            view_model_file_path: component.view_model_file_path.clone(),
        }
    }
}

pub struct Backend {
    client: Client,
    documents: DocumentStore,
    registry: ModeRegistry,
    program: RwLock<ProgramModel>,
    workspace_root: OnceLock<PathBuf>,
    settings: OnceLock<Settings>,
    /// Flipped once project discovery and initial hydration complete.
    /// Requests arriving earlier are answered empty, never served against a
    /// partial model.
    initialized: AtomicBool,
}

impl Backend {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            documents: DocumentStore::new(),
            registry: ModeRegistry::new(),
            program: RwLock::new(ProgramModel::new()),
            workspace_root: OnceLock::new(),
            settings: OnceLock::new(),
            initialized: AtomicBool::new(false),
        }
    }

    fn quote(&self) -> char {
        self.settings.get().map(|s| s.quote()).unwrap_or('"')
    }

    fn is_ready(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Track a changed document: templates refresh the cache, view models
    /// re-hydrate their component.
    fn on_document_changed(&self, uri: &Url, text: String, version: i32) {
        let path = uri.to_file_path().ok();

        if uri.path().ends_with(".html") {
            self.documents.update(uri.clone(), text, version);
            return;
        }

        if let Some(path) = path {
            if is_view_model_candidate(&path) {
                if let Ok(mut program) = self.program.write() {
                    program.hydrate_source(&path, &text);
                }
            }
        }
    }

    /// Discover projects under the workspace root and hydrate them.
    /// Returns a summary for the initialization log.
    fn discover_and_hydrate(&self) -> String {
        let Some(root) = self.workspace_root.get() else {
            return "no workspace root".to_string();
        };

        let (settings, _settings_dir) = settings::discover_settings(root);
        let root = settings
            .project
            .as_ref()
            .and_then(|p| p.root_directory.clone())
            .unwrap_or_else(|| root.clone());

        let manifests = discover_manifests(&root);

        let Ok(mut program) = self.program.write() else {
            return "program model unavailable".to_string();
        };
        program.set_projects(&manifests);

        if !program.has_projects() {
            // Not fatal: the server stays alive and picks the project up
            // once a qualifying file is opened.
            let _ = self.settings.set(settings);
            return "No active Aurelia project found. Intelligence activates once a project file is opened.".to_string();
        }

        let hydrate_paths: Vec<PathBuf> = program
            .projects()
            .iter()
            .flat_map(|project| settings.hydrate_roots(&project.root_dir))
            .flat_map(|dir| discover_view_model_files(&dir))
            .collect();
        program.hydrate(&hydrate_paths);

        let summary = format!(
            "Found {} Aurelia project(s), {} component(s)",
            program.projects().len(),
            program.get_component_list().len()
        );
        let _ = self.settings.set(settings);
        summary
    }

    /// Classify a document from the store and dispatch a request through the
    /// mode registry. Returns `None` for plain markup or unknown documents.
    fn with_mode_at<T>(
        &self,
        uri: &Url,
        position: Position,
        trigger_character: Option<String>,
        f: impl FnOnce(&dyn LanguageMode, &ModeContext) -> Option<T>,
    ) -> Option<T> {
        let program = self.program.read().ok()?;
        let known = program.component_names();
        let state = self.documents.get_or_classify(uri, &known)?;
        let offset = state.line_index.position_to_offset(position)?;
        let found = self.registry.get_mode_and_region_at_position(&state, position)?;

        let ctx = ModeContext {
            state: &state,
            region_index: found.region_index,
            region: found.region,
            document_path: uri.to_file_path().ok(),
            offset,
            trigger_character,
            program: &program,
            quote: self.quote(),
        };
        f(found.mode, &ctx)
    }

    /// Dispatch against ad-hoc document content (the virtual requests carry
    /// the text inline rather than referring to an open document).
    fn with_mode_in_content<T>(
        &self,
        content: String,
        file_path: PathBuf,
        position: Position,
        f: impl FnOnce(&dyn LanguageMode, &ModeContext) -> Option<T>,
    ) -> Option<T> {
        let program = self.program.read().ok()?;
        let known = program.component_names();
        let state = TemplateDocumentState::new(content, 0, &known);
        let offset = state.line_index.position_to_offset(position)?;
        let found = self.registry.get_mode_and_region_at_position(&state, position)?;

        let ctx = ModeContext {
            state: &state,
            region_index: found.region_index,
            region: found.region,
            document_path: Some(file_path),
            offset,
            trigger_character: None,
            program: &program,
            quote: self.quote(),
        };
        f(found.mode, &ctx)
    }

    /// `aurelia-get-component-list` custom request.
    async fn get_component_list(&self) -> Result<Vec<ComponentInfo>> {
        let Ok(program) = self.program.read() else {
            return Ok(Vec::new());
        };
        Ok(program
            .get_component_list()
            .into_iter()
            .map(ComponentInfo::from)
            .collect())
    }

    /// `get-virtual-definition` custom request.
    async fn get_virtual_definition(
        &self,
        params: VirtualPositionParams,
    ) -> Result<Option<DefinitionResult>> {
        if !self.is_ready() {
            return Ok(None);
        }
        let VirtualPositionParams {
            document_content,
            position,
            go_to_source_word,
            file_path,
        } = params;
        Ok(
            self.with_mode_in_content(document_content, file_path, position, |mode, ctx| {
                dispatch_definition(mode, ctx, &go_to_source_word)
            }),
        )
    }

    /// `get-virtual-hover` custom request.
    async fn get_virtual_hover(&self, params: VirtualPositionParams) -> Result<Option<Hover>> {
        if !self.is_ready() {
            return Ok(None);
        }
        let VirtualPositionParams {
            document_content,
            position,
            go_to_source_word,
            file_path,
        } = params;
        Ok(
            self.with_mode_in_content(document_content, file_path, position, |mode, ctx| {
                dispatch_hover(mode, ctx, &go_to_source_word)
            }),
        )
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let workspace_root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .and_then(|f| f.uri.to_file_path().ok())
            .or_else(|| {
                #[allow(deprecated)]
                params.root_uri.as_ref()?.to_file_path().ok()
            });

        if let Some(root) = workspace_root {
            let _ = self.workspace_root.set(root);
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(
                        [".", "<", "\"", "'", "{", " "]
                            .iter()
                            .map(|s| s.to_string())
                            .collect(),
                    ),
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        // Hydration completes before the ready flag flips, so no request is
        // ever served against a partially built model.
        let summary = self.discover_and_hydrate();
        self.initialized.store(true, Ordering::SeqCst);

        self.client
            .log_message(
                MessageType::INFO,
                format!("Aurelia language server initialized: {}", summary),
            )
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        self.registry.dispose();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        if !self.is_ready() {
            return;
        }
        self.on_document_changed(
            &params.text_document.uri,
            params.text_document.text,
            params.text_document.version,
        );
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        if !self.is_ready() {
            return;
        }
        // FULL sync: exactly one change carrying the whole text.
        if let Some(change) = params.content_changes.into_iter().next() {
            self.on_document_changed(
                &params.text_document.uri,
                change.text,
                params.text_document.version,
            );
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.close(&params.text_document.uri);
        self.registry.on_document_removed(&params.text_document.uri);
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        if !self.is_ready() {
            return Ok(None);
        }
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let trigger = params.context.and_then(|c| c.trigger_character);

        let items = self.with_mode_at(&uri, position, trigger, |mode, ctx| {
            let items = dispatch_complete(mode, ctx);
            (!items.is_empty()).then_some(items)
        });

        Ok(items.map(CompletionResponse::Array))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        if !self.is_ready() {
            return Ok(None);
        }
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        Ok(self.with_mode_at(&uri, position, None, |mode, ctx| {
            let word = word_at_offset(ctx.state.source(), ctx.offset)
                .map(|(w, _)| w.to_string())
                .unwrap_or_default();
            dispatch_hover(mode, ctx, &word)
        }))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        if !self.is_ready() {
            return Ok(None);
        }
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let location = self.with_mode_at(&uri, position, None, |mode, ctx| {
            let word = word_at_offset(ctx.state.source(), ctx.offset)
                .map(|(w, _)| w.to_string())
                .unwrap_or_default();
            dispatch_definition(mode, ctx, &word).and_then(|d| d.to_location())
        });

        Ok(location.map(GotoDefinitionResponse::Scalar))
    }
}

pub fn create_service() -> (LspService<Backend>, tower_lsp::ClientSocket) {
    LspService::build(Backend::new)
        .custom_method("aurelia-get-component-list", Backend::get_component_list)
        .custom_method("get-virtual-definition", Backend::get_virtual_definition)
        .custom_method("get-virtual-hover", Backend::get_virtual_hover)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_can_be_created() {
        let (_service, _socket) = create_service();
    }
}

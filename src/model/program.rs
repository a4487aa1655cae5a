//! The in-memory component/program model.
//!
//! `ProgramModel` owns every discovered `Project` and its `Component`
//! entries. It is built by `set_projects` at initialization and refreshed by
//! `hydrate` whenever a view-model file changes. All mutation happens behind
//! the backend's lock, one request at a time; mode handlers only ever borrow
//! components for the duration of a single request.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::view_model::{parse_view_model, ViewModelProperty};

/// One framework component: a view-model class with an optional paired view.
#[derive(Debug, Clone)]
pub struct Component {
    pub component_name: String,
    pub class_name: String,
    pub class_name_range: tower_lsp::lsp_types::Range,
    pub view_file_path: Option<PathBuf>,
    pub view_model_file_path: PathBuf,
    pub properties: Vec<ViewModelProperty>,
}

impl Component {
    pub fn bindables(&self) -> impl Iterator<Item = &ViewModelProperty> {
        self.properties.iter().filter(|p| p.is_bindable)
    }

    pub fn property(&self, name: &str) -> Option<&ViewModelProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// One project inside the workspace, rooted at its manifest directory.
#[derive(Debug)]
pub struct Project {
    pub package_json_path: PathBuf,
    pub tsconfig_path: Option<PathBuf>,
    pub root_dir: PathBuf,
    components: HashMap<String, Component>,
}

impl Project {
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }
}

/// Top-level registry owning all projects and components.
#[derive(Debug, Default)]
pub struct ProgramModel {
    projects: Vec<Project>,
}

impl ProgramModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the projects found at the given manifest paths.
    ///
    /// A manifest qualifies when its dependencies mention the framework.
    /// Manifests that cannot be read or parsed are skipped with a warning.
    /// Until this has run, the model is empty and `hydrate` is a no-op.
    pub fn set_projects(&mut self, manifest_paths: &[PathBuf]) {
        self.projects.clear();

        for manifest in manifest_paths {
            let content = match std::fs::read_to_string(manifest) {
                Ok(content) => content,
                Err(e) => {
                    eprintln!("Warning: failed to read manifest '{}': {}", manifest.display(), e);
                    continue;
                }
            };
            let json: serde_json::Value = match serde_json::from_str(&content) {
                Ok(json) => json,
                Err(e) => {
                    eprintln!("Warning: failed to parse manifest '{}': {}", manifest.display(), e);
                    continue;
                }
            };
            if !has_framework_dependency(&json) {
                continue;
            }

            let Some(root_dir) = manifest.parent().map(Path::to_path_buf) else {
                continue;
            };
            let tsconfig = root_dir.join("tsconfig.json");
            self.projects.push(Project {
                package_json_path: manifest.clone(),
                tsconfig_path: tsconfig.is_file().then_some(tsconfig),
                root_dir,
                components: HashMap::new(),
            });
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn has_projects(&self) -> bool {
        !self.projects.is_empty()
    }

    /// Hydrate the given view-model paths from disk.
    ///
    /// A path that fails to read or parse is skipped with a warning and never
    /// aborts hydration of its siblings.
    pub fn hydrate(&mut self, paths: &[PathBuf]) {
        for path in paths {
            match std::fs::read_to_string(path) {
                Ok(source) => {
                    self.hydrate_source(path, &source);
                }
                Err(e) => {
                    eprintln!("Warning: failed to read '{}': {}", path.display(), e);
                }
            }
        }
    }

    /// Hydrate one view-model file from in-memory source.
    ///
    /// Re-hydrating a path replaces that component's entry wholesale, so the
    /// operation is idempotent. Returns false when the file is skipped (no
    /// owning project, or no exported class).
    pub fn hydrate_source(&mut self, path: &Path, source: &str) -> bool {
        let Some(project_index) = self.project_index_for_path(path) else {
            return false;
        };

        let Some(parsed) = parse_view_model(source) else {
            eprintln!(
                "Warning: skipping '{}': no exported view-model class",
                path.display()
            );
            return false;
        };

        let view_file_path = resolve_view_path(path, parsed.explicit_view.as_deref());

        let component = Component {
            component_name: parsed.component_name.clone(),
            class_name: parsed.class_name,
            class_name_range: parsed.class_name_range,
            view_file_path,
            view_model_file_path: path.to_path_buf(),
            properties: parsed.properties,
        };

        let project = &mut self.projects[project_index];
        // The file may have been renamed to a different component name since
        // the last hydration; drop any entry it previously produced.
        project
            .components
            .retain(|_, c| c.view_model_file_path != path);
        project.components.insert(parsed.component_name, component);
        true
    }

    /// All components across all projects, ordered by component name.
    pub fn get_component_list(&self) -> Vec<&Component> {
        let mut list: Vec<&Component> = self
            .projects
            .iter()
            .flat_map(|p| p.components.values())
            .collect();
        list.sort_by(|a, b| a.component_name.cmp(&b.component_name));
        list
    }

    /// The set of known custom-element names, for the region classifier.
    pub fn component_names(&self) -> HashSet<String> {
        self.projects
            .iter()
            .flat_map(|p| p.components.keys().cloned())
            .collect()
    }

    pub fn component_by_name(&self, name: &str) -> Option<&Component> {
        self.projects.iter().find_map(|p| p.components.get(name))
    }

    pub fn component_by_view_path(&self, path: &Path) -> Option<&Component> {
        self.projects.iter().find_map(|p| {
            p.components
                .values()
                .find(|c| c.view_file_path.as_deref() == Some(path))
        })
    }

    pub fn component_by_view_model_path(&self, path: &Path) -> Option<&Component> {
        self.projects.iter().find_map(|p| {
            p.components
                .values()
                .find(|c| c.view_model_file_path == path)
        })
    }

    /// Look up a component by its view-model class name, used to resolve a
    /// property's type annotation to another hydrated component.
    pub fn component_by_class_name(&self, class_name: &str) -> Option<&Component> {
        self.projects
            .iter()
            .find_map(|p| p.components.values().find(|c| c.class_name == class_name))
    }

    /// The owning project for a path: the longest matching project root, so
    /// nested monorepo packages win over the workspace root.
    fn project_index_for_path(&self, path: &Path) -> Option<usize> {
        self.projects
            .iter()
            .enumerate()
            .filter(|(_, p)| path.starts_with(&p.root_dir))
            .max_by_key(|(_, p)| p.root_dir.as_os_str().len())
            .map(|(i, _)| i)
    }
}

/// Whether a parsed package.json depends on the framework.
fn has_framework_dependency(manifest: &serde_json::Value) -> bool {
    ["dependencies", "devDependencies"].iter().any(|section| {
        manifest
            .get(section)
            .and_then(|deps| deps.as_object())
            .map(|deps| deps.keys().any(|k| k == "aurelia" || k.starts_with("aurelia-")))
            .unwrap_or(false)
    })
}

/// Pair a view-model path with its view: explicit override first, else the
/// same stem with the view-layer extension.
fn resolve_view_path(view_model_path: &Path, explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(relative) = explicit {
        let base = view_model_path.parent()?;
        let resolved = normalize(&base.join(relative));
        return Some(resolved);
    }

    let candidate = view_model_path.with_extension("html");
    candidate.is_file().then_some(candidate)
}

/// Lexically remove `.` and `..` segments.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Directories never descended into during workspace walks.
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", "dist", "out", "build"];

/// Collect package.json manifests under `root`.
pub fn discover_manifests(root: &Path) -> Vec<PathBuf> {
    let mut manifests = Vec::new();
    walk(root, &mut |path| {
        if path.file_name().map(|n| n == "package.json").unwrap_or(false) {
            manifests.push(path.to_path_buf());
        }
    });
    manifests.sort();
    manifests
}

/// Collect view-model candidates (`.ts`, not declarations or specs) under `root`.
pub fn discover_view_model_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk(root, &mut |path| {
        if is_view_model_candidate(path) {
            files.push(path.to_path_buf());
        }
    });
    files.sort();
    files
}

pub fn is_view_model_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".ts")
        && !name.ends_with(".d.ts")
        && !name.ends_with(".spec.ts")
        && !name.ends_with(".test.ts")
}

fn walk(dir: &Path, visit: &mut dyn FnMut(&Path)) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            let skipped = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| SKIPPED_DIRS.contains(&n) || n.starts_with('.'))
                .unwrap_or(true);
            if !skipped {
                walk(&path, visit);
            }
        } else {
            visit(&path);
        }
    }
}

//! Settings infrastructure for aulsp.
//!
//! Settings come from a settings.toml discovered near the workspace root.
//! Everything is optional; a missing or unparseable file falls back to
//! defaults with a logged warning.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Root settings structure loaded from settings.toml.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Project discovery configuration.
    pub project: Option<ProjectSettings>,

    /// Completion behavior.
    pub completion: Option<CompletionSettings>,
}

/// Project discovery settings.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectSettings {
    /// Overrides the workspace root reported by the client.
    pub root_directory: Option<PathBuf>,

    /// Directories (relative to each project root) to hydrate at startup.
    /// Defaults to the whole project root.
    pub include: Option<Vec<PathBuf>>,
}

/// Completion settings.
#[derive(Debug, Default, Deserialize)]
pub struct CompletionSettings {
    /// Quote character used in attribute snippets: "double" or "single".
    pub quote: Option<String>,
}

impl Settings {
    /// The quote character for attribute snippets (default `"`).
    pub fn quote(&self) -> char {
        match self
            .completion
            .as_ref()
            .and_then(|c| c.quote.as_deref())
        {
            Some("single") | Some("'") => '\'',
            _ => '"',
        }
    }

    /// The directories to hydrate for a project root.
    pub fn hydrate_roots(&self, project_root: &Path) -> Vec<PathBuf> {
        match self.project.as_ref().and_then(|p| p.include.as_ref()) {
            Some(dirs) if !dirs.is_empty() => {
                dirs.iter().map(|d| project_root.join(d)).collect()
            }
            _ => vec![project_root.to_path_buf()],
        }
    }
}

/// Load settings from a settings.toml file.
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Warning: failed to parse settings.toml: {}", e);
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

/// Discover settings.toml by searching up the directory tree, then direct
/// children.
///
/// Search order:
/// 1. Walk up from `start_dir` to filesystem root
/// 2. If not found, check immediate child directories of `start_dir`
///
/// Returns `(settings, settings_dir)` where `settings_dir` is the directory
/// containing the found settings.toml. If not found, returns
/// `(Settings::default(), start_dir)`.
pub fn discover_settings(start_dir: &Path) -> (Settings, PathBuf) {
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        let candidate = dir.join("settings.toml");
        if candidate.is_file() {
            return (load_settings(&candidate), dir.to_path_buf());
        }
        current = dir.parent();
    }

    if let Ok(entries) = std::fs::read_dir(start_dir) {
        for entry in entries.flatten() {
            if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
                let candidate = entry.path().join("settings.toml");
                if candidate.is_file() {
                    return (load_settings(&candidate), entry.path());
                }
            }
        }
    }

    (Settings::default(), start_dir.to_path_buf())
}

//! The component/program model.
//!
//! This module provides:
//! - `parse_view_model` for regex-based static analysis of view-model sources
//! - `Component`, `Project` and `ProgramModel`, the cross-file registry the
//!   language modes resolve symbols against
//! - workspace walks for project manifests and view-model candidates

mod program;
mod view_model;

pub use program::{
    discover_manifests, discover_view_model_files, is_view_model_candidate, Component,
    ProgramModel, Project,
};
pub use view_model::{
    element_type_name, kebab_case, parse_view_model, ParsedViewModel, ViewModelProperty,
};

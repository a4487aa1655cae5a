//! Template scanning.
//!
//! This module turns a template document's text into the ordered list of
//! embedded-language regions that the language modes operate on.

mod scanner;

pub use scanner::{classify, BINDING_COMMANDS};

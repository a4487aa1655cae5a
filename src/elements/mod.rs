//! Static element/attribute library.

mod library;

pub use library::{
    get_element, is_builtin_element, AttributeDef, ElementDef, GLOBAL_ATTRIBUTES, GLOBAL_EVENTS,
};

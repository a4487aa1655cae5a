//! Built-in HTML element and attribute definitions with documentation.
//!
//! Backs custom-element/attribute completion and hover fallback. The set is
//! intentionally the common subset an app template actually touches, not the
//! full HTML specification.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Documentation-only definition of an attribute.
#[derive(Debug, Clone)]
pub struct AttributeDef {
    pub name: &'static str,
    pub description: &'static str,
}

/// Documentation-only definition of an element.
#[derive(Debug, Clone)]
pub struct ElementDef {
    pub name: &'static str,
    pub description: &'static str,
    /// Element-specific attributes.
    pub attributes: &'static [AttributeDef],
    /// Element-specific events, bindable via `.trigger`/`.delegate`.
    pub events: &'static [&'static str],
}

/// Attributes valid on every element.
pub static GLOBAL_ATTRIBUTES: &[AttributeDef] = &[
    AttributeDef {
        name: "id",
        description: "Unique identifier for the element.",
    },
    AttributeDef {
        name: "class",
        description: "Space-separated list of CSS classes.",
    },
    AttributeDef {
        name: "style",
        description: "Inline CSS declarations.",
    },
    AttributeDef {
        name: "title",
        description: "Advisory text, typically shown as a tooltip.",
    },
    AttributeDef {
        name: "hidden",
        description: "Hides the element from rendering.",
    },
    AttributeDef {
        name: "tabindex",
        description: "Position of the element in sequential focus order.",
    },
    AttributeDef {
        name: "slot",
        description: "Named slot the element is projected into.",
    },
];

/// Events valid on every element.
pub static GLOBAL_EVENTS: &[&str] = &[
    "click", "dblclick", "mousedown", "mouseup", "mouseover", "mouseout", "keydown", "keyup",
    "focus", "blur",
];

static ELEMENTS: LazyLock<HashMap<&'static str, ElementDef>> = LazyLock::new(|| {
    let defs = vec![
        // ==================== Document structure ====================
        ElementDef {
            name: "div",
            description: "Generic flow container with no semantic meaning.",
            attributes: &[],
            events: &[],
        },
        ElementDef {
            name: "span",
            description: "Generic inline container with no semantic meaning.",
            attributes: &[],
            events: &[],
        },
        ElementDef {
            name: "template",
            description: "Inert fragment; the root of a component view.",
            attributes: &[],
            events: &[],
        },
        ElementDef {
            name: "p",
            description: "Paragraph of text.",
            attributes: &[],
            events: &[],
        },

        // ==================== Text & media ====================
        ElementDef {
            name: "a",
            description: "Hyperlink to another resource.",
            attributes: &[
                AttributeDef {
                    name: "href",
                    description: "URL the hyperlink points to.",
                },
                AttributeDef {
                    name: "target",
                    description: "Browsing context the link opens in.",
                },
                AttributeDef {
                    name: "rel",
                    description: "Relationship between this document and the target.",
                },
            ],
            events: &[],
        },
        ElementDef {
            name: "img",
            description: "Embedded image.",
            attributes: &[
                AttributeDef {
                    name: "src",
                    description: "URL of the image resource.",
                },
                AttributeDef {
                    name: "alt",
                    description: "Text replacement when the image cannot be shown.",
                },
            ],
            events: &["load", "error"],
        },

        // ==================== Lists & tables ====================
        ElementDef {
            name: "ul",
            description: "Unordered list.",
            attributes: &[],
            events: &[],
        },
        ElementDef {
            name: "ol",
            description: "Ordered list.",
            attributes: &[],
            events: &[],
        },
        ElementDef {
            name: "li",
            description: "List item.",
            attributes: &[],
            events: &[],
        },
        ElementDef {
            name: "table",
            description: "Tabular data container.",
            attributes: &[],
            events: &[],
        },
        ElementDef {
            name: "tr",
            description: "Table row.",
            attributes: &[],
            events: &[],
        },
        ElementDef {
            name: "td",
            description: "Table data cell.",
            attributes: &[AttributeDef {
                name: "colspan",
                description: "Number of columns the cell spans.",
            }],
            events: &[],
        },

        // ==================== Forms ====================
        ElementDef {
            name: "form",
            description: "Form container; groups submittable controls.",
            attributes: &[
                AttributeDef {
                    name: "action",
                    description: "URL that processes the submission.",
                },
                AttributeDef {
                    name: "method",
                    description: "HTTP method used on submit.",
                },
            ],
            events: &["submit", "reset"],
        },
        ElementDef {
            name: "input",
            description: "Single-line form control.",
            attributes: &[
                AttributeDef {
                    name: "type",
                    description: "Control type (text, checkbox, number, ...).",
                },
                AttributeDef {
                    name: "value",
                    description: "Current value of the control.",
                },
                AttributeDef {
                    name: "placeholder",
                    description: "Hint shown while the control is empty.",
                },
                AttributeDef {
                    name: "disabled",
                    description: "Disables user interaction.",
                },
                AttributeDef {
                    name: "checked",
                    description: "Checked state of a checkbox or radio control.",
                },
            ],
            events: &["input", "change"],
        },
        ElementDef {
            name: "textarea",
            description: "Multi-line text control.",
            attributes: &[
                AttributeDef {
                    name: "rows",
                    description: "Visible number of text lines.",
                },
                AttributeDef {
                    name: "placeholder",
                    description: "Hint shown while the control is empty.",
                },
            ],
            events: &["input", "change"],
        },
        ElementDef {
            name: "select",
            description: "Drop-down selection control.",
            attributes: &[AttributeDef {
                name: "multiple",
                description: "Allows selecting more than one option.",
            }],
            events: &["change"],
        },
        ElementDef {
            name: "option",
            description: "One choice within a select control.",
            attributes: &[
                AttributeDef {
                    name: "value",
                    description: "Value submitted for this choice.",
                },
                AttributeDef {
                    name: "selected",
                    description: "Marks the choice as initially selected.",
                },
            ],
            events: &[],
        },
        ElementDef {
            name: "button",
            description: "Clickable button.",
            attributes: &[
                AttributeDef {
                    name: "type",
                    description: "Button behavior (button, submit, reset).",
                },
                AttributeDef {
                    name: "disabled",
                    description: "Disables user interaction.",
                },
            ],
            events: &[],
        },
        ElementDef {
            name: "label",
            description: "Caption for a form control.",
            attributes: &[AttributeDef {
                name: "for",
                description: "Id of the control this label describes.",
            }],
            events: &[],
        },
    ];

    defs.into_iter().map(|e| (e.name, e)).collect()
});

/// Look up a built-in element definition by tag name.
pub fn get_element(name: &str) -> Option<&'static ElementDef> {
    ELEMENTS.get(name)
}

/// Whether a tag name is a built-in element.
pub fn is_builtin_element(name: &str) -> bool {
    ELEMENTS.contains_key(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_elements_are_present() {
        for name in ["div", "input", "li", "template", "button"] {
            assert!(get_element(name).is_some(), "missing element: {}", name);
        }
    }

    #[test]
    fn unknown_element_is_absent() {
        assert!(get_element("marquee-3d").is_none());
        assert!(!is_builtin_element("foo-bar"));
    }

    #[test]
    fn input_has_value_attribute_and_change_event() {
        let input = get_element("input").unwrap();
        assert!(input.attributes.iter().any(|a| a.name == "value"));
        assert!(input.events.contains(&"change"));
    }

    #[test]
    fn global_attributes_include_class() {
        assert!(GLOBAL_ATTRIBUTES.iter().any(|a| a.name == "class"));
        assert!(GLOBAL_EVENTS.contains(&"click"));
    }
}

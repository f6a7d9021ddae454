//! Host toolkit primitives
//!
//! Element tags name the toolkit widget the host should draw. Interaction
//! targets carry `data-field` (which value they edit) and `data-action`
//! (which action they raise).

use crate::dropdown::SelectOption;
use crate::node::ControlNode;

/// Labelled wrapper around one control
pub fn base_control(key: &str, label: &str, help: Option<&str>) -> ControlNode {
    let mut node = ControlNode::element("BaseControl").with_key(key.to_string());
    if !label.is_empty() {
        node = node.with_attr("label", label);
    }
    match help {
        Some(help) if !help.is_empty() => node.with_attr("help", help),
        _ => node,
    }
}

pub fn text_input(field: &str, label: &str, value: &str, placeholder: Option<&str>) -> ControlNode {
    input("TextControl", field, label, value, placeholder)
}

pub fn textarea(field: &str, label: &str, value: &str, placeholder: Option<&str>) -> ControlNode {
    input("TextareaControl", field, label, value, placeholder)
}

pub fn number_input(field: &str, label: &str, value: &str, placeholder: Option<&str>) -> ControlNode {
    input("NumberControl", field, label, value, placeholder)
}

fn input(tag: &str, field: &str, label: &str, value: &str, placeholder: Option<&str>) -> ControlNode {
    let mut node = ControlNode::element(tag)
        .with_key(field.to_string())
        .with_attr("data-field", field)
        .with_attr("value", value);
    if !label.is_empty() {
        node = node.with_attr("label", label);
    }
    match placeholder {
        Some(placeholder) if !placeholder.is_empty() => node.with_attr("placeholder", placeholder),
        _ => node,
    }
}

/// Native select with a leading placeholder choice
pub fn select_input(
    field: &str,
    label: &str,
    value: &str,
    placeholder: Option<&str>,
    options: &[SelectOption],
) -> ControlNode {
    let leading = placeholder.map(|placeholder| SelectOption::new("", placeholder));
    let choices = leading.iter().chain(options.iter()).map(|option| {
        ControlNode::element("option")
            .with_attr("value", option.value.clone())
            .with_flag("selected", option.value == value)
            .with_child(ControlNode::text(option.label.clone()))
    });

    let mut node = ControlNode::element("SelectControl")
        .with_key(field.to_string())
        .with_attr("data-field", field)
        .with_attr("value", value)
        .with_children(choices);
    if !label.is_empty() {
        node = node.with_attr("label", label);
    }
    node
}

pub fn checkbox(field: &str, label: &str, checked: bool) -> ControlNode {
    ControlNode::element("CheckboxControl")
        .with_key(field.to_string())
        .with_attr("data-field", field)
        .with_attr("label", label)
        .with_flag("checked", checked)
}

/// Visual tick inside a multi-select option row
pub fn checkbox_mark(checked: bool) -> ControlNode {
    ControlNode::element("input")
        .with_key("checkbox")
        .with_attr("type", "checkbox")
        .with_flag("checked", checked)
}

pub fn button(key: &str, action: &str, label: &str) -> ControlNode {
    ControlNode::element("Button")
        .with_key(key.to_string())
        .with_attr("data-action", action)
        .with_child(ControlNode::text(label))
}

/// Opens the host media picker
pub fn media_button(key: &str, action: &str, label: &str, multiple: bool) -> ControlNode {
    ControlNode::element("MediaUpload")
        .with_key(key.to_string())
        .with_attr("data-action", action)
        .with_attr("allowedTypes", "image")
        .with_flag("multiple", multiple)
        .with_child(ControlNode::text(label))
}

/// Inline informational message
pub fn notice(key: &str, status: &str, message: &str) -> ControlNode {
    ControlNode::element("Notice")
        .with_key(key.to_string())
        .with_attr("status", status)
        .with_child(ControlNode::text(message))
}

/// Titled group of fields
pub fn section(key: &str, title: &str) -> ControlNode {
    ControlNode::element("div")
        .with_key(key.to_string())
        .with_child(ControlNode::element("h4").with_child(ControlNode::text(title)))
}

pub fn panel(key: &str, title: &str) -> ControlNode {
    ControlNode::element("PanelBody")
        .with_key(key.to_string())
        .with_attr("title", title)
        .with_flag("initialOpen", true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_input_marks_selected_choice() {
        let node = select_input(
            "size",
            "Size",
            "large",
            Some("Select"),
            &[SelectOption::new("medium", "Medium"), SelectOption::new("large", "Large")],
        );
        let children = node.children();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].attr("value"), Some(""));
        assert_eq!(children[2].attr("selected"), Some("true"));
        assert_eq!(children[1].attr("selected"), None);
    }

    #[test]
    fn test_empty_help_is_omitted() {
        let node = base_control("k", "Label", Some(""));
        assert_eq!(node.attr("help"), None);
        assert_eq!(node.attr("label"), Some("Label"));
    }
}

use crate::context::ControlContext;
use crate::dropdown::{value_text, Dropdown, DropdownAction, SelectOption};
use crate::effect::Effects;
use crate::error::ControlResult;
use crate::node::ControlNode;
use crate::controls::select::SelectControl;
use blocks_common::HostData;
use blocks_schema::PropertyDefinition;
use serde_json::Value;
use std::time::Instant;

/// Global CSS class picker
///
/// A select whose option labels fall back to the host's global class names.
#[derive(Debug, Clone)]
pub struct ClassControl {
    inner: SelectControl,
}

/// Class options declared on the property, or every global class
pub fn class_options(property: &PropertyDefinition, host: &HostData) -> Vec<SelectOption> {
    match property.options.as_ref() {
        Some(Value::Array(items)) => items.iter().filter_map(|item| class_option(item, host)).collect(),
        Some(Value::Object(map)) => SelectOption::from_map(map)
            .into_iter()
            .map(|option| {
                if option.label.is_empty() {
                    let label = resolve_label(&option.value, host);
                    SelectOption::new(option.value, label)
                } else {
                    option
                }
            })
            .collect(),
        _ => host
            .global_classes
            .iter()
            .map(|class| SelectOption::new(class.id.clone(), class.name.clone()))
            .collect(),
    }
}

fn class_option(item: &Value, host: &HostData) -> Option<SelectOption> {
    let raw = item.get("id").or_else(|| item.get("value"))?;
    // Some exports carry the class id wrapped in a one-element array
    let id = match raw {
        Value::Array(ids) => ids.first().map(value_text).unwrap_or_default(),
        other => value_text(other),
    };
    if id.is_empty() {
        return None;
    }

    let label = item.get("label").map(value_text).unwrap_or_default();
    let label = if label.is_empty() { resolve_label(&id, host) } else { label };
    Some(SelectOption::new(id, label))
}

fn resolve_label(id: &str, host: &HostData) -> String {
    host.global_class_name(id).unwrap_or(id).to_string()
}

impl ClassControl {
    pub fn new(property: PropertyDefinition, ctx: &ControlContext<'_>) -> Self {
        let placeholder = if property.multiple {
            ctx.t("selectClasses")
        } else {
            ctx.t("selectClass")
        };
        let placeholder = property.placeholder.clone().unwrap_or_else(|| placeholder.to_string());

        let dropdown = Dropdown::new(property.id.clone(), "options", class_options(&property, ctx.host), ctx.settings)
            .with_label(property.label.clone())
            .with_placeholder(placeholder)
            .multiple(property.multiple)
            .searchable(true);

        Self {
            inner: SelectControl::with_dropdown(property, dropdown),
        }
    }

    pub fn property(&self) -> &PropertyDefinition {
        self.inner.property()
    }

    pub fn dropdown(&self) -> &Dropdown {
        self.inner.dropdown()
    }

    pub fn render(&self, value: Option<&Value>, ctx: &ControlContext<'_>) -> ControlResult<ControlNode> {
        self.inner.render(value, ctx)
    }

    pub fn handle(&mut self, action: DropdownAction, value: Option<&Value>, now: Instant) -> ControlResult<Effects> {
        self.inner.handle(action, value, now)
    }

    pub fn unmount(&mut self) {
        self.inner.unmount();
    }
}

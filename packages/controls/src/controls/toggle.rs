use crate::context::ControlContext;
use crate::dropdown::{value_text, SelectOption};
use crate::effect::{Effect, Effects};
use crate::error::ControlResult;
use crate::node::ControlNode;
use crate::primitives;
use blocks_schema::PropertyDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ON: &str = "true";
const OFF: &str = "off";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "camelCase")]
pub enum ToggleAction {
    /// Click on the switch
    Flip,
    /// Click on one of the option buttons
    Select(String),
}

/// Two-position switch over a tri-state stored value (`true`, `"off"`, absent)
#[derive(Debug, Clone)]
pub struct ToggleControl {
    property: PropertyDefinition,
}

/// Stored toggle value as an option key; booleans map to `true`/`off`
fn option_key(value: &Value) -> String {
    match value {
        Value::Bool(true) => ON.to_string(),
        Value::Bool(false) => OFF.to_string(),
        other => value_text(other),
    }
}

impl ToggleControl {
    pub fn new(property: PropertyDefinition) -> Self {
        Self { property }
    }

    pub fn property(&self) -> &PropertyDefinition {
        &self.property
    }

    pub fn options(&self, ctx: &ControlContext<'_>) -> Vec<SelectOption> {
        let declared = SelectOption::parse(self.property.options.as_ref());
        if declared.is_empty() {
            vec![SelectOption::new(ON, ctx.t("on")), SelectOption::new(OFF, ctx.t("off"))]
        } else {
            declared
        }
    }

    fn current(&self, value: Option<&Value>) -> Option<String> {
        value.map(option_key).filter(|key| !key.is_empty())
    }

    fn default_key(&self) -> String {
        self.property
            .default
            .as_ref()
            .map(option_key)
            .filter(|key| !key.is_empty())
            .unwrap_or_else(|| OFF.to_string())
    }

    /// Visual "on" position: the stored value, else the declared default
    pub fn is_on(&self, value: Option<&Value>) -> bool {
        match self.current(value) {
            Some(current) => current == ON,
            None => self.default_key() == ON,
        }
    }

    /// Raw value after choosing `key`; choosing the stored option removes it
    pub fn select(&self, value: Option<&Value>, key: &str) -> Value {
        if self.current(value).as_deref() == Some(key) {
            return Value::Null;
        }
        if key == ON {
            Value::Bool(true)
        } else {
            Value::String(key.to_string())
        }
    }

    pub fn render(&self, value: Option<&Value>, ctx: &ControlContext<'_>) -> ControlResult<ControlNode> {
        let on = self.is_on(value);
        let current = self.current(value);

        let switch = ControlNode::element("div")
            .with_key("toggle-switch")
            .with_attr("data-action", "flip")
            .with_flag("data-on", on)
            .with_child(ControlNode::element("div").with_key("toggle-circle"));

        let buttons = ControlNode::element("ButtonGroup")
            .with_key("toggle-options")
            .with_children(self.options(ctx).into_iter().map(|option| {
                primitives::button(&format!("option-{}", option.value), "select", &option.label)
                    .with_attr("data-value", option.value.clone())
                    .with_flag("isPressed", current.as_deref() == Some(option.value.as_str()))
            }));

        Ok(
            primitives::base_control(&self.property.id, &self.property.label, self.property.help.as_deref())
                .with_child(switch)
                .with_child(buttons),
        )
    }

    pub fn handle(&mut self, action: ToggleAction, value: Option<&Value>) -> ControlResult<Effects> {
        let raw = match action {
            ToggleAction::Flip => {
                let target = if self.is_on(value) { OFF } else { ON };
                self.select(value, target)
            }
            ToggleAction::Select(key) => self.select(value, &key),
        };
        Ok(vec![Effect::Write(raw)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocks_schema::PropertyKind;
    use serde_json::json;

    fn control() -> ToggleControl {
        ToggleControl::new(PropertyDefinition::new("dark", PropertyKind::Toggle, "Dark"))
    }

    #[test]
    fn test_selecting_active_option_removes_key() {
        let mut toggle = control();
        let effects = toggle.handle(ToggleAction::Select("true".into()), Some(&json!(true))).unwrap();
        assert_eq!(effects, vec![Effect::Write(Value::Null)]);
    }

    #[test]
    fn test_flip_alternates_between_true_and_off() {
        let mut toggle = control();
        assert_eq!(toggle.handle(ToggleAction::Flip, None).unwrap(), vec![Effect::Write(json!(true))]);
        assert_eq!(
            toggle.handle(ToggleAction::Flip, Some(&json!(true))).unwrap(),
            vec![Effect::Write(json!("off"))]
        );
        assert_eq!(
            toggle.handle(ToggleAction::Flip, Some(&json!("off"))).unwrap(),
            vec![Effect::Write(json!(true))]
        );
    }

    #[test]
    fn test_default_drives_visual_state_when_absent() {
        let toggle = ToggleControl::new(
            PropertyDefinition::new("dark", PropertyKind::Toggle, "Dark").with_default(json!(true)),
        );
        assert!(toggle.is_on(None));
        assert!(!toggle.is_on(Some(&json!("off"))));
        assert!(!toggle.is_on(Some(&json!(false))));
        // Flipping from the default "on" stores the explicit "off"
        assert_eq!(toggle.select(None, OFF), json!("off"));
    }

    #[test]
    fn test_boolean_false_reads_as_off() {
        let toggle = control();
        assert_eq!(toggle.select(Some(&json!(false)), OFF), Value::Null);
    }
}

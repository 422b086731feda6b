//! Replace variables for reading button state from effect templates.
//!
//! "Current button" always means the top of the click stack carried in the
//! trigger's `metadata.actionButton`.


use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::buttons::{ButtonInfo, ButtonRegistry, ClickStack, ClickStackEntry};
use crate::host::Trigger;

const ANY_OUTPUT: &[&str] = &["text", "number", "object"];
const OBJECT_OUTPUT: &[&str] = &["object"];
const TEXT_OUTPUT: &[&str] = &["text"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    ActionButton,
    CurrentActionButton,
    ActionButtonByName,
    ActionButtonPanel,
    ActionButtonPanelId,
    ActionButtonId,
    ActionButtonName,
    ActionButtonStack,
}

impl Variable {
    pub const ALL: [Variable; 8] = [
        Variable::ActionButton,
        Variable::CurrentActionButton,
        Variable::ActionButtonByName,
        Variable::ActionButtonPanel,
        Variable::ActionButtonPanelId,
        Variable::ActionButtonId,
        Variable::ActionButtonName,
        Variable::ActionButtonStack,
    ];

    pub fn handle(self) -> &'static str {
        match self {
            Variable::ActionButton => "actionButton",
            Variable::CurrentActionButton => "currentActionButton",
            Variable::ActionButtonByName => "actionButtonByName",
            Variable::ActionButtonPanel => "actionButtonPanel",
            Variable::ActionButtonPanelId => "actionButtonPanelId",
            Variable::ActionButtonId => "actionButtonId",
            Variable::ActionButtonName => "actionButtonName",
            Variable::ActionButtonStack => "actionButtonStack",
        }
    }

    pub fn from_handle(handle: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.handle() == handle)
    }

    pub fn definition(self) -> VariableDefinition {
        let (usage, description, outputs): (Option<&'static str>, &'static str, &'static [&'static str]) =
            match self {
                Variable::ActionButton => (
                    Some("actionButton[uuid, property]"),
                    "Get information about an action button. If uuid is not specified, uses the currently executing button. Returns the full button info object or a specific property.",
                    ANY_OUTPUT,
                ),
                Variable::CurrentActionButton => (
                    Some("currentActionButton[property]"),
                    "Get information about the currently executing action button. Returns the full button info object or a specific property.",
                    ANY_OUTPUT,
                ),
                Variable::ActionButtonByName => (
                    Some("actionButtonByName[panelId, buttonName]"),
                    "Look up an action button by name within a panel. Matching is case-insensitive. If multiple buttons have the same name, returns the first match.",
                    OBJECT_OUTPUT,
                ),
                Variable::ActionButtonPanel => (
                    Some("actionButtonPanel[panelId]"),
                    "Get all button information for a panel. Returns a map of button UUIDs to their properties.",
                    OBJECT_OUTPUT,
                ),
                Variable::ActionButtonPanelId => (
                    None,
                    "Get the panel ID of the currently executing action button. Returns empty string if no button is executing.",
                    TEXT_OUTPUT,
                ),
                Variable::ActionButtonId => (
                    None,
                    "Get the ID of the currently executing action button. Returns empty string if no button is executing.",
                    TEXT_OUTPUT,
                ),
                Variable::ActionButtonName => (
                    None,
                    "Get the name of the currently executing action button. Returns empty string if no button is executing.",
                    TEXT_OUTPUT,
                ),
                Variable::ActionButtonStack => (
                    None,
                    "Get the call stack of action buttons. Returns an array where each element contains buttonId, panelId, and buttonName. The most recent call is at index 0.",
                    OBJECT_OUTPUT,
                ),
            };
        VariableDefinition {
            handle: self.handle(),
            usage,
            description,
            categories: &["common"],
            possible_data_output: outputs,
        }
    }

    /// Evaluate against the registry. Never fails: unknown lookups produce the
    /// variable's empty value.
    pub fn evaluate(self, registry: &ButtonRegistry, trigger: &Trigger, args: &[String]) -> Value {
        let arg = |i: usize| args.get(i).map(String::as_str).filter(|a| !a.trim().is_empty());
        match self {
            Variable::ActionButton => {
                let button_id = match arg(0) {
                    Some(id) => id.to_string(),
                    None => match current_entry(trigger) {
                        Some(entry) => entry.button_id,
                        None => return empty_object(),
                    },
                };
                info_or_property(registry, &button_id, args.get(1).map(String::as_str))
            }
            Variable::CurrentActionButton => match current_entry(trigger) {
                Some(entry) => {
                    info_or_property(registry, &entry.button_id, args.first().map(String::as_str))
                }
                None => empty_object(),
            },
            Variable::ActionButtonByName => {
                let (Some(panel_id), Some(name)) = (args.first(), arg(1)) else {
                    debug!("actionButtonByName called without panel id or button name");
                    return Value::Null;
                };
                let wanted = name.to_lowercase();
                registry
                    .button_info_by_panel(panel_id)
                    .into_iter()
                    .find(|info| !info.name.is_empty() && info.name.to_lowercase() == wanted)
                    .map(|info| info.to_value())
                    .unwrap_or_else(|| {
                        debug!(panel_id = %panel_id, name, "no button with that name in panel");
                        Value::Null
                    })
            }
            Variable::ActionButtonPanel => {
                let Some(panel_id) = args.first() else {
                    return empty_object();
                };
                let infos = registry.button_info_by_panel(panel_id);
                if infos.is_empty() {
                    debug!(panel_id = %panel_id, "actionButtonPanel called with unknown panel");
                }
                Value::Object(
                    infos
                        .into_iter()
                        .map(|info| (info.uuid.clone(), info.to_value()))
                        .collect(),
                )
            }
            Variable::ActionButtonPanelId => current_text(trigger, |e| e.panel_id),
            Variable::ActionButtonId => current_text(trigger, |e| e.button_id),
            Variable::ActionButtonName => current_text(trigger, |e| e.button_name),
            Variable::ActionButtonStack => {
                serde_json::to_value(ClickStack::from_trigger(trigger)).unwrap_or_default()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDefinition {
    pub handle: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<&'static str>,
    pub description: &'static str,
    pub categories: &'static [&'static str],
    pub possible_data_output: &'static [&'static str],
}

pub fn variable_definitions() -> Vec<VariableDefinition> {
    Variable::ALL.iter().map(|v| v.definition()).collect()
}

fn current_entry(trigger: &Trigger) -> Option<ClickStackEntry> {
    ClickStack::from_trigger(trigger).current().cloned()
}

fn current_text(trigger: &Trigger, pick: impl FnOnce(ClickStackEntry) -> String) -> Value {
    Value::String(current_entry(trigger).map(pick).unwrap_or_default())
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn info_or_property(registry: &ButtonRegistry, button_id: &str, property: Option<&str>) -> Value {
    let Some(info) = registry.button_info(button_id) else {
        debug!(button_id, "action button variable called with unknown button id");
        return empty_object();
    };
    property_of(&info, property)
}

fn property_of(info: &ButtonInfo, property: Option<&str>) -> Value {
    match property.filter(|p| !p.is_empty()) {
        None => info.to_value(),
        Some(name) => info
            .property(name)
            .unwrap_or_else(|| Value::String(String::new())),
    }
}

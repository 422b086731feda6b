use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::host::Trigger;

/// Horizontal placement of a button inside its panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonAlignment {
    Left,
    #[default]
    Center,
    Right,
}

/// What happens to the button (or its panel) once it is clicked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OnClickVisibility {
    HideButton,
    HidePanel,
    #[default]
    NoVisibilityChanges,
}

/// Button as authored in the host's effect editor.
///
/// Consumed once by [`ButtonRegistry::process_definitions`](super::ButtonRegistry::process_definitions);
/// the registry never keeps the definition itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ButtonDefinition {
    /// Editor-side identifier. Ignored: the registry always mints a new one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub background_color: String,
    pub foreground_color: String,
    pub icon: String,
    pub alignment: ButtonAlignment,
    pub on_click: OnClickVisibility,
    pub effect_list: Value,
    /// JSON object encoded as a string; dropped when it does not parse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_metadata: Option<String>,
}

/// Everything needed to execute a click. Never sent to the front end.
#[derive(Debug, Clone)]
pub struct ButtonConfig {
    pub uuid: String,
    pub panel_id: String,
    pub button_name: String,
    pub on_click: OnClickVisibility,
    pub effect_list: Value,
    pub trigger: Trigger,
    pub timestamp: u64,
    pub extra_metadata: Option<Map<String, Value>>,
}

/// Render projection of a button, kept in its panel's ordered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayButton {
    pub uuid: String,
    pub name: String,
    pub background_color: String,
    pub foreground_color: String,
    pub icon: String,
    pub alignment: ButtonAlignment,
    pub on_click: OnClickVisibility,
    #[serde(default)]
    pub hidden: bool,
}

/// Denormalized view joining a config with its display entry, used by
/// templating lookups.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonInfo {
    pub uuid: String,
    pub name: String,
    pub icon: String,
    pub background_color: String,
    pub foreground_color: String,
    pub alignment: ButtonAlignment,
    pub on_click: OnClickVisibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_metadata: Option<Map<String, Value>>,
    pub effect_count: usize,
}

impl ButtonInfo {
    pub(crate) fn new(display: &DisplayButton, config: &ButtonConfig) -> Self {
        Self {
            uuid: display.uuid.clone(),
            name: display.name.clone(),
            icon: display.icon.clone(),
            background_color: display.background_color.clone(),
            foreground_color: display.foreground_color.clone(),
            alignment: display.alignment,
            on_click: display.on_click,
            extra_metadata: config.extra_metadata.clone(),
            effect_count: effect_count(&config.effect_list),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Look up a single property by its camelCase name.
    pub fn property(&self, name: &str) -> Option<Value> {
        match self.to_value() {
            Value::Object(mut map) => map.remove(name),
            _ => None,
        }
    }
}

/// Partial property update. Fields left as `None` are untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ButtonUpdate {
    pub button_name: Option<String>,
    pub icon: Option<String>,
    pub background_color: Option<String>,
    pub foreground_color: Option<String>,
    pub on_click: Option<OnClickVisibility>,
}

impl ButtonUpdate {
    pub fn is_empty(&self) -> bool {
        self.button_name.is_none()
            && self.icon.is_none()
            && self.background_color.is_none()
            && self.foreground_color.is_none()
            && self.on_click.is_none()
    }
}

/// Number of effects in a chain. Host effect lists are either a bare array or
/// an object carrying the array under `list` (older exports use `effects`).
pub fn effect_count(effect_list: &Value) -> usize {
    match effect_list {
        Value::Array(items) => items.len(),
        Value::Object(map) => ["list", "effects"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .map_or(0, Vec::len),
        _ => 0,
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::types::{
    now_millis, ButtonConfig, ButtonDefinition, ButtonInfo, ButtonUpdate, DisplayButton,
};
use crate::host::Trigger;
use crate::lock_or_recover;

#[derive(Debug, Default)]
struct Tables {
    configs: HashMap<String, ButtonConfig>,
    panels: HashMap<String, Vec<DisplayButton>>,
}

impl Tables {
    /// Find the display entry backing `uuid`, logging which table lacks it.
    fn locate(&self, uuid: &str) -> Option<(String, usize)> {
        let Some(config) = self.configs.get(uuid) else {
            warn!(button_id = uuid, "button not found in button store");
            return None;
        };
        let Some(buttons) = self.panels.get(&config.panel_id) else {
            warn!(button_id = uuid, panel_id = %config.panel_id, "panel not found for button");
            return None;
        };
        let Some(index) = buttons.iter().position(|b| b.uuid == uuid) else {
            warn!(button_id = uuid, panel_id = %config.panel_id, "button not found in panel");
            return None;
        };
        Some((config.panel_id.clone(), index))
    }
}

/// Outcome of changing one button's hidden flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenChange {
    pub panel_id: String,
    /// Every button of the panel is hidden after the change.
    pub all_hidden: bool,
}

/// Owner of every button and panel known to this process.
///
/// Two tables: full configs by button id, and render projections grouped per
/// panel in insertion order. Nothing is persisted; the registry lives exactly as
/// long as the [`ActionButtons`](super::ActionButtons) service that owns it.
#[derive(Debug, Default)]
pub struct ButtonRegistry {
    tables: Mutex<Tables>,
}

impl ButtonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate_uuid(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Register `definitions` under `panel_id`, appending to any buttons the
    /// panel already has. Returns the new display buttons in input order.
    pub fn process_definitions(
        &self,
        definitions: &[ButtonDefinition],
        panel_id: &str,
        trigger: &Trigger,
    ) -> Vec<DisplayButton> {
        debug!(
            count = definitions.len(),
            panel_id, "processing action button definitions"
        );
        let timestamp = now_millis();
        let mut created = Vec::with_capacity(definitions.len());
        let mut configs = Vec::with_capacity(definitions.len());

        for definition in definitions {
            let uuid = self.generate_uuid();
            let extra_metadata = parse_extra_metadata(definition);
            let effect_list = rekey_effect_list(&definition.effect_list, &uuid);

            configs.push(ButtonConfig {
                uuid: uuid.clone(),
                panel_id: panel_id.to_string(),
                button_name: definition.name.clone(),
                on_click: definition.on_click,
                effect_list,
                trigger: trigger.clone(),
                timestamp,
                extra_metadata,
            });
            created.push(DisplayButton {
                uuid,
                name: definition.name.clone(),
                background_color: definition.background_color.clone(),
                foreground_color: definition.foreground_color.clone(),
                icon: definition.icon.clone(),
                alignment: definition.alignment,
                on_click: definition.on_click,
                hidden: false,
            });
        }

        let mut tables = lock_or_recover(&self.tables, "registry.process");
        for config in configs {
            debug!(button_id = %config.uuid, panel_id, "registering button");
            tables.configs.insert(config.uuid.clone(), config);
        }
        tables
            .panels
            .entry(panel_id.to_string())
            .or_default()
            .extend(created.iter().cloned());
        created
    }

    /// Current display list of a panel; empty for an unknown panel.
    pub fn panel_buttons(&self, panel_id: &str) -> Vec<DisplayButton> {
        lock_or_recover(&self.tables, "registry.panel_buttons")
            .panels
            .get(panel_id)
            .cloned()
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn has_panel(&self, panel_id: &str) -> bool {
        lock_or_recover(&self.tables, "registry.has_panel")
            .panels
            .contains_key(panel_id)
    }

    #[cfg(test)]
    pub(crate) fn button_count(&self) -> usize {
        lock_or_recover(&self.tables, "registry.button_count")
            .configs
            .len()
    }

    pub fn config(&self, uuid: &str) -> Option<ButtonConfig> {
        lock_or_recover(&self.tables, "registry.config")
            .configs
            .get(uuid)
            .cloned()
    }

    pub fn button_info(&self, uuid: &str) -> Option<ButtonInfo> {
        let tables = lock_or_recover(&self.tables, "registry.button_info");
        let config = tables.configs.get(uuid)?;
        let display = tables
            .panels
            .get(&config.panel_id)?
            .iter()
            .find(|b| b.uuid == uuid)?;
        Some(ButtonInfo::new(display, config))
    }

    /// Info for every button of a panel, in display order.
    pub fn button_info_by_panel(&self, panel_id: &str) -> Vec<ButtonInfo> {
        let tables = lock_or_recover(&self.tables, "registry.button_info_by_panel");
        let Some(buttons) = tables.panels.get(panel_id) else {
            return Vec::new();
        };
        buttons
            .iter()
            .filter_map(|display| {
                tables
                    .configs
                    .get(&display.uuid)
                    .map(|config| ButtonInfo::new(display, config))
            })
            .collect()
    }

    /// Drop a button from both tables. Returns whether it existed.
    pub fn remove_button(&self, uuid: &str) -> bool {
        debug!(button_id = uuid, "removing button");
        let mut tables = lock_or_recover(&self.tables, "registry.remove_button");
        let Some(config) = tables.configs.remove(uuid) else {
            return false;
        };
        if let Some(buttons) = tables.panels.get_mut(&config.panel_id) {
            buttons.retain(|b| b.uuid != uuid);
        }
        true
    }

    /// Drop every button owned by `panel_id`. Returns how many configs went away.
    pub fn remove_panel(&self, panel_id: &str) -> usize {
        let mut tables = lock_or_recover(&self.tables, "registry.remove_panel");
        let before = tables.configs.len();
        tables.configs.retain(|_, config| config.panel_id != panel_id);
        tables.panels.remove(panel_id);
        let removed = before - tables.configs.len();
        debug!(panel_id, removed, "removed buttons for panel");
        removed
    }

    /// `Some(true)` when the button is visible, `None` when it is unknown.
    pub fn button_visibility(&self, uuid: &str) -> Option<bool> {
        let tables = lock_or_recover(&self.tables, "registry.button_visibility");
        let (panel_id, index) = tables.locate(uuid)?;
        tables.panels.get(&panel_id).map(|b| !b[index].hidden)
    }

    /// Set the hidden flag of one button. `None` when the button is unknown.
    pub fn set_button_hidden(&self, uuid: &str, hidden: bool) -> Option<HiddenChange> {
        let mut tables = lock_or_recover(&self.tables, "registry.set_button_hidden");
        let (panel_id, index) = tables.locate(uuid)?;
        let buttons = tables.panels.get_mut(&panel_id)?;
        debug!(button_id = uuid, hidden, "setting button hidden flag");
        buttons[index].hidden = hidden;
        let all_hidden = buttons.iter().all(|b| b.hidden);
        Some(HiddenChange {
            panel_id,
            all_hidden,
        })
    }

    /// Apply `update` to the display entry and the config. Returns the owning
    /// panel id, or `None` when the button cannot be found.
    pub fn update_button(&self, uuid: &str, update: &ButtonUpdate) -> Option<String> {
        let mut tables = lock_or_recover(&self.tables, "registry.update_button");
        let (panel_id, index) = tables.locate(uuid)?;
        let Tables { configs, panels } = &mut *tables;
        let config = configs.get_mut(uuid)?;
        let button = panels.get_mut(&panel_id)?.get_mut(index)?;

        if let Some(name) = &update.button_name {
            button.name = name.clone();
            config.button_name = name.clone();
        }
        if let Some(icon) = &update.icon {
            button.icon = icon.clone();
        }
        if let Some(color) = &update.background_color {
            button.background_color = color.clone();
        }
        if let Some(color) = &update.foreground_color {
            button.foreground_color = color.clone();
        }
        if let Some(on_click) = update.on_click {
            button.on_click = on_click;
            config.on_click = on_click;
        }
        debug!(button_id = uuid, "updated button properties");
        Some(panel_id)
    }
}

fn parse_extra_metadata(definition: &ButtonDefinition) -> Option<Map<String, Value>> {
    let raw = definition.extra_metadata.as_deref()?;
    if raw.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            warn!(
                button = %definition.name,
                kind = json_kind(&other),
                "extraMetadata is not a JSON object; ignoring"
            );
            None
        }
        Err(err) => {
            warn!(button = %definition.name, error = %err, "failed to parse extraMetadata");
            None
        }
    }
}

/// Deep copy of an effect chain whose own `id` is replaced by the button id, so
/// duplicated buttons never share a chain identity.
fn rekey_effect_list(effect_list: &Value, uuid: &str) -> Value {
    let mut copy = effect_list.clone();
    if let Value::Object(map) = &mut copy {
        if map.get("id").is_some_and(is_truthy) {
            map.insert("id".to_string(), Value::String(uuid.to_string()));
        }
    }
    copy
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

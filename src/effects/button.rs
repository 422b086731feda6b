use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::{is_blank, EffectContext, EffectOutcome, VisibilityMode};
use crate::buttons::{ButtonUpdate, OnClickVisibility};
use crate::host::Trigger;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleButtonVisibilityEffect {
    #[serde(default)]
    pub mode: VisibilityMode,
    #[serde(default)]
    pub button_id: String,
    /// Hide the panel with its last button and re-show it with the first.
    #[serde(default = "default_true")]
    pub auto_panel_toggle: bool,
}

impl Default for ToggleButtonVisibilityEffect {
    fn default() -> Self {
        Self {
            mode: VisibilityMode::default(),
            button_id: String::new(),
            auto_panel_toggle: true,
        }
    }
}

impl ToggleButtonVisibilityEffect {
    pub fn validate(&self) -> Vec<String> {
        if is_blank(&self.button_id) {
            vec!["Button ID is required".to_string()]
        } else {
            Vec::new()
        }
    }

    pub(super) fn run(&self, ctx: EffectContext<'_>) -> EffectOutcome {
        if self.button_id.is_empty() {
            error!("button id is required");
            return EffectOutcome::failed();
        }

        let visible = match self.mode {
            VisibilityMode::Toggle => {
                match ctx.buttons.registry().button_visibility(&self.button_id) {
                    Some(current) => !current,
                    None => {
                        error!(button_id = %self.button_id, "cannot toggle button: button not found");
                        return EffectOutcome::failed();
                    }
                }
            }
            mode => mode.resolve(false),
        };

        ctx.buttons
            .set_button_visibility(&self.button_id, visible, self.auto_panel_toggle);
        info!(button_id = %self.button_id, visible, "toggled button visibility");
        EffectOutcome::ok()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    #[default]
    Unchanged,
    Change,
}

/// One editable property of the update effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyUpdate<T> {
    pub mode: UpdateMode,
    pub value: Option<T>,
}

impl<T: Clone> PropertyUpdate<T> {
    pub fn change(value: T) -> Self {
        Self {
            mode: UpdateMode::Change,
            value: Some(value),
        }
    }

    pub fn is_change(&self) -> bool {
        self.mode == UpdateMode::Change
    }

    fn changed(&self) -> Option<T> {
        if self.is_change() {
            self.value.clone()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateButtonEffect {
    pub button_id: String,
    pub button_name: PropertyUpdate<String>,
    pub icon: PropertyUpdate<String>,
    pub background_color: PropertyUpdate<String>,
    pub foreground_color: PropertyUpdate<String>,
    pub on_click: PropertyUpdate<OnClickVisibility>,
}

impl UpdateButtonEffect {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if is_blank(&self.button_id) {
            errors.push("Button ID is required".to_string());
        }
        let has_changes = self.button_name.is_change()
            || self.icon.is_change()
            || self.background_color.is_change()
            || self.foreground_color.is_change()
            || self.on_click.is_change();
        if !has_changes {
            errors.push("At least one property must be changed".to_string());
        }
        errors
    }

    /// Only the properties switched to `change`.
    pub fn updates(&self) -> ButtonUpdate {
        ButtonUpdate {
            button_name: self.button_name.changed(),
            icon: self.icon.changed(),
            background_color: self.background_color.changed(),
            foreground_color: self.foreground_color.changed(),
            on_click: self.on_click.changed(),
        }
    }

    pub(super) fn run(&self, ctx: EffectContext<'_>) -> EffectOutcome {
        if self.button_id.is_empty() {
            error!("button id is required");
            return EffectOutcome::failed();
        }

        let updates = self.updates();
        debug!(button_id = %self.button_id, ?updates, "applying updates to button");
        if !ctx
            .buttons
            .update_button_properties(&self.button_id, &updates)
        {
            error!(button_id = %self.button_id, "failed to update button");
            return EffectOutcome::failed();
        }
        info!(button_id = %self.button_id, "updated button");
        EffectOutcome::ok()
    }
}

/// Click a button from inside an effect chain; the click stack keeps growing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClickButtonEffect {
    pub button_id: String,
}

impl ClickButtonEffect {
    pub fn validate(&self) -> Vec<String> {
        if is_blank(&self.button_id) {
            vec!["Button ID is required".to_string()]
        } else {
            Vec::new()
        }
    }

    pub(super) fn run(&self, ctx: EffectContext<'_>, trigger: &Trigger) -> EffectOutcome {
        if self.button_id.is_empty() {
            error!("button id is required");
            return EffectOutcome::failed();
        }
        match ctx.buttons.dispatch_click(&self.button_id, Some(trigger)) {
            Ok(_) => EffectOutcome::ok(),
            Err(err) => {
                error!(button_id = %self.button_id, error = %err, "click effect failed");
                EffectOutcome::failed()
            }
        }
    }
}

//! Effect types the extension contributes to the host's effect engine.
//!
//! Each effect is a serde model tagged by its host id. The host (or the bridge)
//! deserializes an [`ActionButtonEffect`], asks it to [`validate`] in the editor
//! and [`run`]s it when a chain reaches it.
//!
//! [`validate`]: ActionButtonEffect::validate
//! [`run`]: ActionButtonEffect::run

mod button;
mod panel;


use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::buttons::{ActionButtons, ButtonDefinition};
use crate::host::Trigger;

pub use button::{
    ClickButtonEffect, PropertyUpdate, ToggleButtonVisibilityEffect, UpdateButtonEffect,
    UpdateMode,
};
pub use panel::{
    AddButtonsToPanelEffect, AddPanelEffect, BackgroundColorType, PanelPositionType,
    RemovePanelEffect, TogglePanelVisibilityEffect,
};

/// Component name the front end registers for action-button panels.
pub const DEFAULT_PANEL_COMPONENT: &str = "action-buttons-panel";

/// Prefix of every panel id minted by the create-panel effect.
pub const PANEL_ID_PREFIX: &str = "action-buttons-";

/// Everything an effect handler may touch.
#[derive(Clone, Copy)]
pub struct EffectContext<'a> {
    pub buttons: &'a ActionButtons,
    /// Component injected for new panels.
    pub panel_component: &'a str,
}

impl<'a> EffectContext<'a> {
    pub fn new(buttons: &'a ActionButtons) -> Self {
        Self {
            buttons,
            panel_component: DEFAULT_PANEL_COMPONENT,
        }
    }

    pub fn with_panel_component(mut self, component: &'a str) -> Self {
        self.panel_component = component;
        self
    }
}

/// Result reported back to the effect engine. Failures never abort the chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Map<String, Value>>,
}

impl EffectOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            outputs: None,
        }
    }

    pub fn ok_with(outputs: Map<String, Value>) -> Self {
        Self {
            success: true,
            outputs: Some(outputs),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            outputs: None,
        }
    }

    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.as_ref().and_then(|o| o.get(name))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ActionButtonEffect {
    #[serde(rename = "action-buttons:add-action-button-panel")]
    AddPanel(AddPanelEffect),
    #[serde(rename = "action-buttons:add-buttons-to-panel")]
    AddButtonsToPanel(AddButtonsToPanelEffect),
    #[serde(rename = "action-buttons:remove-action-button-panel")]
    RemovePanel(RemovePanelEffect),
    #[serde(rename = "action-buttons:toggle-action-button-visibility")]
    ToggleButtonVisibility(ToggleButtonVisibilityEffect),
    #[serde(rename = "action-buttons:toggle-action-button-panel-visibility")]
    TogglePanelVisibility(TogglePanelVisibilityEffect),
    #[serde(rename = "action-buttons:update-action-button")]
    UpdateButton(UpdateButtonEffect),
    #[serde(rename = "action-buttons:click-action-button")]
    ClickButton(ClickButtonEffect),
}

impl ActionButtonEffect {
    pub fn id(&self) -> &'static str {
        match self {
            ActionButtonEffect::AddPanel(_) => "action-buttons:add-action-button-panel",
            ActionButtonEffect::AddButtonsToPanel(_) => "action-buttons:add-buttons-to-panel",
            ActionButtonEffect::RemovePanel(_) => "action-buttons:remove-action-button-panel",
            ActionButtonEffect::ToggleButtonVisibility(_) => {
                "action-buttons:toggle-action-button-visibility"
            }
            ActionButtonEffect::TogglePanelVisibility(_) => {
                "action-buttons:toggle-action-button-panel-visibility"
            }
            ActionButtonEffect::UpdateButton(_) => "action-buttons:update-action-button",
            ActionButtonEffect::ClickButton(_) => "action-buttons:click-action-button",
        }
    }

    /// Editor-time checks. An empty list means the effect may be saved.
    pub fn validate(&self) -> Vec<String> {
        match self {
            ActionButtonEffect::AddPanel(effect) => effect.validate(),
            ActionButtonEffect::AddButtonsToPanel(effect) => effect.validate(),
            ActionButtonEffect::RemovePanel(effect) => effect.validate(),
            ActionButtonEffect::ToggleButtonVisibility(effect) => effect.validate(),
            ActionButtonEffect::TogglePanelVisibility(effect) => effect.validate(),
            ActionButtonEffect::UpdateButton(effect) => effect.validate(),
            ActionButtonEffect::ClickButton(effect) => effect.validate(),
        }
    }

    pub fn run(&self, ctx: EffectContext<'_>, trigger: &Trigger) -> EffectOutcome {
        debug!(effect = self.id(), "triggered");
        match self {
            ActionButtonEffect::AddPanel(effect) => effect.run(ctx, trigger),
            ActionButtonEffect::AddButtonsToPanel(effect) => effect.run(ctx, trigger),
            ActionButtonEffect::RemovePanel(effect) => effect.run(ctx),
            ActionButtonEffect::ToggleButtonVisibility(effect) => effect.run(ctx),
            ActionButtonEffect::TogglePanelVisibility(effect) => effect.run(ctx),
            ActionButtonEffect::UpdateButton(effect) => effect.run(ctx),
            ActionButtonEffect::ClickButton(effect) => effect.run(ctx, trigger),
        }
    }
}

/// Show, hide or flip something.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityMode {
    Hide,
    #[default]
    Show,
    Toggle,
}

impl VisibilityMode {
    /// Target visibility given the current one.
    pub fn resolve(self, currently_visible: bool) -> bool {
        match self {
            VisibilityMode::Hide => false,
            VisibilityMode::Show => true,
            VisibilityMode::Toggle => !currently_visible,
        }
    }
}

/// Static description of an effect, as the host lists it in its editor.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EffectDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub categories: &'static [&'static str],
    pub outputs: &'static [EffectOutputDefinition],
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectOutputDefinition {
    pub label: &'static str,
    pub description: &'static str,
    pub default_name: &'static str,
}

const CHAT_CATEGORIES: &[&str] = &["common", "chat based", "advanced"];

pub const EFFECT_DEFINITIONS: &[EffectDefinition] = &[
    EffectDefinition {
        id: "action-buttons:add-action-button-panel",
        name: "Create Action Button Panel",
        description: "Creates a new interactive action button panel in the chat feed",
        icon: "far fa-plus-square",
        categories: CHAT_CATEGORIES,
        outputs: &[
            EffectOutputDefinition {
                label: "Panel ID",
                description: "The ID of the created action button panel",
                default_name: "panelId",
            },
            EffectOutputDefinition {
                label: "Button IDs",
                description: "Array of button IDs in the order they were specified",
                default_name: "buttonIds",
            },
        ],
    },
    EffectDefinition {
        id: "action-buttons:add-buttons-to-panel",
        name: "Add Action Buttons to Panel",
        description: "Add action buttons to an existing panel",
        icon: "far fa-plus-square",
        categories: CHAT_CATEGORIES,
        outputs: &[EffectOutputDefinition {
            label: "Button IDs",
            description: "Array of button IDs in the order they were specified",
            default_name: "buttonIds",
        }],
    },
    EffectDefinition {
        id: "action-buttons:remove-action-button-panel",
        name: "Remove Action Button Panel",
        description: "Removes an action button panel from the chat feed",
        icon: "far fa-backspace",
        categories: &["chat based"],
        outputs: &[],
    },
    EffectDefinition {
        id: "action-buttons:toggle-action-button-visibility",
        name: "Toggle Action Button Visibility",
        description: "Show or hide an action button",
        icon: "far fa-eye",
        categories: &["chat based"],
        outputs: &[],
    },
    EffectDefinition {
        id: "action-buttons:toggle-action-button-panel-visibility",
        name: "Toggle Action Button Panel Visibility",
        description: "Show or hide an action button panel",
        icon: "far fa-eye",
        categories: &["chat based"],
        outputs: &[],
    },
    EffectDefinition {
        id: "action-buttons:update-action-button",
        name: "Update Action Button",
        description: "Update properties of an existing action button",
        icon: "far fa-edit",
        categories: &["chat based"],
        outputs: &[],
    },
    EffectDefinition {
        id: "action-buttons:click-action-button",
        name: "Click Action Button",
        description: "Click an action button as if a user pressed it",
        icon: "far fa-hand-pointer",
        categories: &["chat based", "advanced"],
        outputs: &[],
    },
];

pub fn effect_definition(id: &str) -> Option<&'static EffectDefinition> {
    EFFECT_DEFINITIONS.iter().find(|def| def.id == id)
}

/// Button rules shared by the two effects that create buttons.
pub(crate) fn validate_buttons(buttons: &[ButtonDefinition], errors: &mut Vec<String>) {
    if buttons.is_empty() {
        errors.push("At least one action button is required".to_string());
        return;
    }
    for (index, button) in buttons.iter().enumerate() {
        let n = index + 1;
        if is_blank(&button.name) && is_blank(&button.icon) {
            errors.push(format!("Button {n}: Name and/or icon is required"));
        }
        if button.background_color.is_empty() {
            errors.push(format!("Button {n}: Background color is required"));
        }
        if button.foreground_color.is_empty() {
            errors.push(format!("Button {n}: Foreground color is required"));
        }
    }
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn button_ids(buttons: &[crate::buttons::DisplayButton]) -> Value {
    Value::Array(
        buttons
            .iter()
            .map(|b| Value::String(b.uuid.clone()))
            .collect(),
    )
}

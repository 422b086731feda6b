use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info};

use super::{
    button_ids, is_blank, validate_buttons, EffectContext, EffectOutcome, VisibilityMode,
    PANEL_ID_PREFIX,
};
use crate::buttons::ButtonDefinition;
use crate::host::{InjectPanel, PanelEdge, PanelPosition, Trigger};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PanelPositionType {
    #[default]
    Append,
    Prepend,
    AfterMessage,
    BeforeMessage,
    /// After the chat message that fired the trigger, else append.
    TriggerMessage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundColorType {
    #[default]
    Default,
    Custom,
}

/// Create a panel in the chat feed and register its buttons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddPanelEffect {
    pub position_type: PanelPositionType,
    pub message_id: String,
    pub action_buttons: Vec<ButtonDefinition>,
    pub show_message: bool,
    pub message_text: String,
    pub message_icon: String,
    pub background_color_type: BackgroundColorType,
    pub background_color: String,
}

impl AddPanelEffect {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if matches!(
            self.position_type,
            PanelPositionType::AfterMessage | PanelPositionType::BeforeMessage
        ) && is_blank(&self.message_id)
        {
            errors.push(
                "Message ID is required when position is after or before a specific message"
                    .to_string(),
            );
        }
        if self.show_message && is_blank(&self.message_text) && is_blank(&self.message_icon) {
            errors.push(
                "When message is enabled, you must provide either message text or an icon (or both)"
                    .to_string(),
            );
        }
        validate_buttons(&self.action_buttons, &mut errors);
        errors
    }

    pub(super) fn run(&self, ctx: EffectContext<'_>, trigger: &Trigger) -> EffectOutcome {
        let panel_id = format!("{PANEL_ID_PREFIX}{}", ctx.buttons.registry().generate_uuid());
        debug!(panel_id = %panel_id, "generated new panel id");

        let created =
            ctx.buttons
                .registry()
                .process_definitions(&self.action_buttons, &panel_id, trigger);
        debug!(count = created.len(), "processed display buttons");

        let position = self.resolve_position(trigger);
        debug!(?position, "using panel position");

        let injected = ctx.buttons.chat_panels().inject_panel(InjectPanel {
            component_name: ctx.panel_component.to_string(),
            component_data: self.component_data(&panel_id),
            position: Some(position),
            panel_id: Some(panel_id.clone()),
            hidden: None,
        });
        if injected.is_none() {
            error!(panel_id = %panel_id, "failed to create action button panel: injection rejected");
            ctx.buttons.registry().remove_panel(&panel_id);
            return EffectOutcome::failed();
        }

        info!(
            panel_id = %panel_id,
            buttons = created.len(),
            "created action button panel"
        );
        let mut outputs = Map::new();
        outputs.insert("panelId".to_string(), Value::String(panel_id));
        outputs.insert("buttonIds".to_string(), button_ids(&created));
        EffectOutcome::ok_with(outputs)
    }

    fn resolve_position(&self, trigger: &Trigger) -> PanelPosition {
        let message_id = (!is_blank(&self.message_id)).then(|| self.message_id.clone());
        match self.position_type {
            PanelPositionType::Append => PanelPosition::default(),
            PanelPositionType::Prepend => PanelPosition::Edge(PanelEdge::Prepend),
            PanelPositionType::TriggerMessage => match trigger.chat_message_id() {
                Some(id) => PanelPosition::After {
                    after_message_id: id.to_string(),
                },
                None => {
                    debug!("no trigger message id found, defaulting to append");
                    PanelPosition::default()
                }
            },
            PanelPositionType::AfterMessage => message_id
                .map(|after_message_id| PanelPosition::After { after_message_id })
                .unwrap_or_default(),
            PanelPositionType::BeforeMessage => message_id
                .map(|before_message_id| PanelPosition::Before { before_message_id })
                .unwrap_or_default(),
        }
    }

    fn component_data(&self, panel_id: &str) -> Value {
        let mut data = json!({
            "panelId": panel_id,
            "hasMessage": self.show_message,
        });
        if self.show_message {
            data["messageText"] = Value::String(self.message_text.clone());
            data["messageIcon"] = Value::String(self.message_icon.clone());
        }
        if self.background_color_type == BackgroundColorType::Custom {
            data["backgroundColor"] = Value::String(self.background_color.clone());
        }
        data
    }
}

/// Append buttons to a panel that already exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddButtonsToPanelEffect {
    pub panel_id: String,
    pub action_buttons: Vec<ButtonDefinition>,
}

impl AddButtonsToPanelEffect {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if is_blank(&self.panel_id) {
            errors.push("Panel ID is required".to_string());
        }
        validate_buttons(&self.action_buttons, &mut errors);
        errors
    }

    pub(super) fn run(&self, ctx: EffectContext<'_>, trigger: &Trigger) -> EffectOutcome {
        if is_blank(&self.panel_id) {
            error!("panel id is required");
            return EffectOutcome::failed();
        }

        match ctx.buttons.chat_panels().get_panel(&self.panel_id) {
            Ok(Some(_)) => {}
            Ok(None) => {
                error!(panel_id = %self.panel_id, "panel does not exist");
                return EffectOutcome::failed();
            }
            Err(err) => {
                error!(panel_id = %self.panel_id, error = %err, "failed to add buttons to panel");
                return EffectOutcome::failed();
            }
        }

        let created =
            ctx.buttons
                .registry()
                .process_definitions(&self.action_buttons, &self.panel_id, trigger);
        ctx.buttons.notify_panel_updated(&self.panel_id);

        info!(panel_id = %self.panel_id, buttons = created.len(), "added buttons to panel");
        let mut outputs = Map::new();
        outputs.insert("buttonIds".to_string(), button_ids(&created));
        EffectOutcome::ok_with(outputs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemovePanelEffect {
    pub panel_id: String,
}

impl RemovePanelEffect {
    pub fn validate(&self) -> Vec<String> {
        if is_blank(&self.panel_id) {
            vec!["Panel ID is required".to_string()]
        } else {
            Vec::new()
        }
    }

    pub(super) fn run(&self, ctx: EffectContext<'_>) -> EffectOutcome {
        if self.panel_id.is_empty() {
            error!("panel id is required");
            return EffectOutcome::failed();
        }
        ctx.buttons.remove_panel(&self.panel_id);
        info!(panel_id = %self.panel_id, "removed action button panel");
        EffectOutcome::ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TogglePanelVisibilityEffect {
    pub mode: VisibilityMode,
    pub panel_id: String,
}

impl TogglePanelVisibilityEffect {
    pub fn validate(&self) -> Vec<String> {
        if is_blank(&self.panel_id) {
            vec!["Panel ID is required".to_string()]
        } else {
            Vec::new()
        }
    }

    pub(super) fn run(&self, ctx: EffectContext<'_>) -> EffectOutcome {
        if self.panel_id.is_empty() {
            error!("panel id is required");
            return EffectOutcome::failed();
        }
        let current = match self.mode {
            VisibilityMode::Toggle => ctx.buttons.panel_visibility(&self.panel_id),
            _ => false,
        };
        let visible = self.mode.resolve(current);
        ctx.buttons.set_panel_visibility(&self.panel_id, visible);
        info!(panel_id = %self.panel_id, visible, "toggled panel visibility");
        EffectOutcome::ok()
    }
}

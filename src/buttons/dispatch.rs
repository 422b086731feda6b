use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, error, info, warn};

use super::manager::ActionButtons;
use super::stack::{
    ActionButtonMetadata, ClickStack, ClickStackEntry, ACTION_BUTTON_METADATA_KEY,
    MAX_CLICK_STACK_DEPTH,
};
use super::types::{ButtonConfig, OnClickVisibility};
use crate::host::{Trigger, DEFAULT_TRIGGER_TYPE};

/// Username injected when the base trigger carries no metadata at all.
pub const UNKNOWN_USERNAME: &str = "Unknown";

/// Why a click was not executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickError {
    UnknownButton(String),
    /// The inherited stack was already [`MAX_CLICK_STACK_DEPTH`] deep.
    StackLimit { button_name: String, depth: usize },
}

impl fmt::Display for ClickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClickError::UnknownButton(id) => write!(f, "button {id} not found in button store"),
            ClickError::StackLimit { button_name, depth } => write!(
                f,
                "click on {button_name} aborted at stack depth {depth} (limit {MAX_CLICK_STACK_DEPTH}); this likely indicates an infinite loop"
            ),
        }
    }
}

impl std::error::Error for ClickError {}

/// What a delivered click did.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickOutcome {
    /// Stack forwarded to the effect chain, this click on top.
    pub stack: ClickStack,
    /// `false` when the effect runner reported an error (already logged).
    pub effects_succeeded: bool,
}

/// Runs one click through resolve, guard and execute.
pub(super) struct ClickDispatcher<'a> {
    buttons: &'a ActionButtons,
}

impl<'a> ClickDispatcher<'a> {
    pub(super) fn new(buttons: &'a ActionButtons) -> Self {
        Self { buttons }
    }

    pub(super) fn dispatch(
        &self,
        button_id: &str,
        invoking: Option<&Trigger>,
    ) -> Result<ClickOutcome, ClickError> {
        let Some(config) = self.buttons.registry().config(button_id) else {
            warn!(button_id, "button not found in button store");
            return Err(ClickError::UnknownButton(button_id.to_string()));
        };
        info!(button = %config.button_name, button_id, "action button clicked");

        let base = invoking.unwrap_or(&config.trigger);
        let inherited = ClickStack::from_trigger(base);
        let stack = match inherited.enter(ClickStackEntry {
            button_id: config.uuid.clone(),
            panel_id: config.panel_id.clone(),
            button_name: config.button_name.clone(),
        }) {
            Ok(stack) => stack,
            Err(limit) => {
                error!(
                    button = %config.button_name,
                    depth = limit.depth,
                    "action button click aborted: stack depth limit exceeded, likely an infinite loop"
                );
                return Err(ClickError::StackLimit {
                    button_name: config.button_name,
                    depth: limit.depth,
                });
            }
        };

        let trigger = forwarded_trigger(base, &config, stack.clone());
        self.apply_visibility(&config);

        let effects_succeeded = match self
            .buttons
            .effect_runner()
            .process_effects(&trigger, &config.effect_list)
        {
            Ok(()) => true,
            Err(err) => {
                error!(button_id, error = %err, "failed to execute effects for button");
                false
            }
        };

        info!(button = %config.button_name, "action finished processing");
        Ok(ClickOutcome {
            stack,
            effects_succeeded,
        })
    }

    fn apply_visibility(&self, config: &ButtonConfig) {
        match config.on_click {
            OnClickVisibility::HideButton => {
                let Some(change) = self.buttons.registry().set_button_hidden(&config.uuid, true)
                else {
                    return;
                };
                if change.all_hidden {
                    self.buttons.hide_panel(&change.panel_id);
                } else {
                    debug!(panel_id = %change.panel_id, "notifying frontend to update panel");
                    self.buttons.notify_panel_updated(&change.panel_id);
                }
            }
            OnClickVisibility::HidePanel => self.buttons.hide_panel(&config.panel_id),
            OnClickVisibility::NoVisibilityChanges => {}
        }
    }
}

/// Copy of `base` with the click context stored under `metadata.actionButton`.
/// Every other metadata field and the trigger type survive unchanged.
pub(super) fn forwarded_trigger(base: &Trigger, config: &ButtonConfig, stack: ClickStack) -> Trigger {
    let mut metadata = base.metadata.clone().unwrap_or_else(|| {
        let mut defaults = Map::new();
        defaults.insert(
            "username".to_string(),
            Value::String(UNKNOWN_USERNAME.to_string()),
        );
        defaults
    });
    let context = ActionButtonMetadata {
        timestamp: config.timestamp,
        extra_metadata: config.extra_metadata.clone(),
        stack,
    };
    metadata.insert(
        ACTION_BUTTON_METADATA_KEY.to_string(),
        serde_json::to_value(context).unwrap_or_default(),
    );

    let kind = base
        .kind
        .clone()
        .filter(|kind| !kind.is_empty())
        .unwrap_or_else(|| DEFAULT_TRIGGER_TYPE.to_string());
    Trigger {
        kind: Some(kind),
        metadata: Some(metadata),
    }
}

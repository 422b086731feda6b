use std::sync::Arc;
use tracing::{debug, error, warn};

use super::dispatch::{ClickDispatcher, ClickError, ClickOutcome};
use super::registry::ButtonRegistry;
use super::types::ButtonUpdate;
use crate::host::{ChatPanels, EffectRunner, FrontendChannel, FrontendEvent, PanelUpdate, Trigger};

/// Host collaborators handed to the service at construction.
#[derive(Clone)]
pub struct HostModules {
    pub effect_runner: Arc<dyn EffectRunner>,
    pub chat_panels: Arc<dyn ChatPanels>,
    pub frontend: Arc<dyn FrontendChannel>,
}

/// The action-button service: registry plus the host modules it drives.
///
/// Built once by whoever integrates with the host and shared by reference (or
/// `Arc`) with the effect handlers, variables and the bridge loop. Dropping it
/// drops every button.
pub struct ActionButtons {
    registry: ButtonRegistry,
    host: HostModules,
}

impl ActionButtons {
    pub fn new(host: HostModules) -> Self {
        Self {
            registry: ButtonRegistry::new(),
            host,
        }
    }

    pub fn registry(&self) -> &ButtonRegistry {
        &self.registry
    }

    pub fn chat_panels(&self) -> &dyn ChatPanels {
        self.host.chat_panels.as_ref()
    }

    pub(crate) fn effect_runner(&self) -> &dyn EffectRunner {
        self.host.effect_runner.as_ref()
    }

    pub fn notify_panel_updated(&self, panel_id: &str) {
        self.host.frontend.send(FrontendEvent::PanelUpdated {
            panel_id: panel_id.to_string(),
        });
    }

    /// Show or hide one button. With `auto_panel_toggle`, hiding the last
    /// visible button hides the panel and showing a button re-shows a hidden
    /// panel. Unknown buttons are ignored.
    pub fn set_button_visibility(&self, button_id: &str, visible: bool, auto_panel_toggle: bool) {
        let Some(change) = self.registry.set_button_hidden(button_id, !visible) else {
            return;
        };

        if auto_panel_toggle {
            if visible {
                if !self.panel_visibility(&change.panel_id) {
                    debug!(panel_id = %change.panel_id, "auto-showing panel because a button is being shown");
                    self.set_panel_visibility(&change.panel_id, true);
                }
            } else if change.all_hidden {
                debug!(panel_id = %change.panel_id, "auto-hiding panel because all buttons are hidden");
                self.set_panel_visibility(&change.panel_id, false);
            }
        }

        debug!(panel_id = %change.panel_id, "notifying frontend to update panel");
        self.notify_panel_updated(&change.panel_id);
    }

    /// Whether the chat-panel collaborator reports the panel as shown. Missing
    /// panels count as hidden; a failing lookup counts as visible.
    pub fn panel_visibility(&self, panel_id: &str) -> bool {
        match self.host.chat_panels.get_panel(panel_id) {
            Ok(Some(panel)) => !panel.hidden,
            Ok(None) => false,
            Err(err) => {
                error!(panel_id, error = %err, "failed to get panel visibility");
                true
            }
        }
    }

    pub fn set_panel_visibility(&self, panel_id: &str, visible: bool) {
        debug!(panel_id, visible, "setting panel visibility");
        self.host
            .chat_panels
            .update_panel(panel_id, PanelUpdate::hidden(!visible));
    }

    pub(crate) fn hide_panel(&self, panel_id: &str) {
        self.set_panel_visibility(panel_id, false);
    }

    /// Apply a partial update and tell the front end to re-render. Returns
    /// `false` when the button is unknown.
    pub fn update_button_properties(&self, button_id: &str, update: &ButtonUpdate) -> bool {
        let Some(panel_id) = self.registry.update_button(button_id, update) else {
            return false;
        };
        self.notify_panel_updated(&panel_id);
        true
    }

    /// Remove a panel from the chat feed and forget its buttons.
    pub fn remove_panel(&self, panel_id: &str) {
        self.host.chat_panels.remove_panel(panel_id);
        self.registry.remove_panel(panel_id);
    }

    /// Click from the UI. The stack continues from the trigger captured when
    /// the button was created.
    pub fn click(&self, button_id: &str) {
        let _ = self.dispatch_click(button_id, None);
    }

    /// Click issued from inside an effect chain; the stack continues from
    /// `trigger`.
    pub fn click_from(&self, button_id: &str, trigger: &Trigger) {
        let _ = self.dispatch_click(button_id, Some(trigger));
    }

    /// Run a click and report what happened. Failures are already logged.
    pub fn dispatch_click(
        &self,
        button_id: &str,
        invoking: Option<&Trigger>,
    ) -> Result<ClickOutcome, ClickError> {
        let outcome = ClickDispatcher::new(self).dispatch(button_id, invoking);
        if let Ok(ClickOutcome {
            effects_succeeded: false,
            ..
        }) = &outcome
        {
            warn!(button_id, "click delivered but its effect chain failed");
        }
        outcome
    }
}

use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    ChatPanel, ChatPanels, ChatUpdate, FrontendChannel, FrontendEvent, InjectPanel, PanelUpdate,
};
use crate::lock_or_recover;

/// Chat-panel collaborator that speaks the front end's `chatUpdate` protocol.
///
/// Every panel this process injects is mirrored locally so visibility queries
/// do not need a round trip through the UI.
pub struct ChatPanelManager {
    frontend: Arc<dyn FrontendChannel>,
    panels: Mutex<HashMap<String, ChatPanel>>,
}

impl ChatPanelManager {
    pub fn new(frontend: Arc<dyn FrontendChannel>) -> Self {
        Self {
            frontend,
            panels: Mutex::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub(crate) fn panel_count(&self) -> usize {
        lock_or_recover(&self.panels, "chat_panels.count").len()
    }
}

impl ChatPanels for ChatPanelManager {
    fn inject_panel(&self, data: InjectPanel) -> Option<String> {
        if data.component_name.is_empty() {
            warn!("cannot inject chat panel: component name is required");
            return None;
        }

        let panel_id = data
            .panel_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let hidden = data.hidden.unwrap_or(false);

        lock_or_recover(&self.panels, "chat_panels.inject").insert(
            panel_id.clone(),
            ChatPanel {
                id: panel_id.clone(),
                component_name: data.component_name.clone(),
                component_data: data.component_data.clone(),
                hidden,
            },
        );

        debug!(panel_id = %panel_id, "injecting custom chat panel");
        self.frontend.send(FrontendEvent::ChatUpdate {
            payload: ChatUpdate::Inject {
                component_name: data.component_name,
                component_data: data.component_data,
                position: data.position.unwrap_or_default(),
                panel_id: panel_id.clone(),
                hidden: data.hidden,
            },
        });
        Some(panel_id)
    }

    fn update_panel(&self, panel_id: &str, updates: PanelUpdate) {
        if panel_id.is_empty() {
            warn!("cannot update chat panel: panel id is required");
            return;
        }
        if updates.is_empty() {
            warn!(panel_id, "cannot update chat panel: no updates provided");
            return;
        }

        if let Some(panel) = lock_or_recover(&self.panels, "chat_panels.update").get_mut(panel_id)
        {
            if let Some(hidden) = updates.hidden {
                panel.hidden = hidden;
            }
            if let Some(data) = &updates.component_data {
                panel.component_data = data.clone();
            }
        }

        debug!(panel_id, "updating custom chat panel");
        self.frontend.send(FrontendEvent::ChatUpdate {
            payload: ChatUpdate::Update {
                panel_id: panel_id.to_string(),
                updates,
            },
        });
    }

    fn remove_panel(&self, panel_id: &str) {
        if panel_id.is_empty() {
            warn!("cannot remove chat panel: panel id is required");
            return;
        }

        lock_or_recover(&self.panels, "chat_panels.remove").remove(panel_id);
        debug!(panel_id, "removing custom chat panel");
        self.frontend.send(FrontendEvent::ChatUpdate {
            payload: ChatUpdate::Remove {
                panel_id: panel_id.to_string(),
            },
        });
    }

    fn get_panel(&self, panel_id: &str) -> Result<Option<ChatPanel>> {
        if panel_id.is_empty() {
            warn!("cannot get chat panel: panel id is required");
            return Ok(None);
        }
        Ok(lock_or_recover(&self.panels, "chat_panels.get")
            .get(panel_id)
            .cloned())
    }
}

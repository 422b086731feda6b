//! Contracts of the host application this extension runs inside.
//!
//! The core never talks to the host directly: effect execution, chat-panel
//! injection and front-end messaging all go through the traits below, so the
//! registry and dispatcher can be driven by the JSON bridge in production and by
//! recording doubles in tests.

mod chat_panels;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use chat_panels::ChatPanelManager;

/// Trigger type used when the originating trigger did not carry one.
pub const DEFAULT_TRIGGER_TYPE: &str = "action_button";

/// Trigger record forwarded along an effect chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Trigger {
    #[cfg(test)]
    pub(crate) fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            metadata: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }

    /// Id of the chat message that fired this trigger, if any.
    pub fn chat_message_id(&self) -> Option<&str> {
        let direct = self
            .metadata_value("chatMessage")
            .and_then(|m| m.get("id"))
            .and_then(Value::as_str);
        direct.or_else(|| {
            self.metadata_value("eventData")
                .and_then(|d| d.get("chatMessage"))
                .and_then(|m| m.get("id"))
                .and_then(Value::as_str)
        })
    }
}

/// Where an injected panel lands in the chat feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PanelPosition {
    Edge(PanelEdge),
    After {
        #[serde(rename = "afterMessageId")]
        after_message_id: String,
    },
    Before {
        #[serde(rename = "beforeMessageId")]
        before_message_id: String,
    },
}

impl Default for PanelPosition {
    fn default() -> Self {
        PanelPosition::Edge(PanelEdge::Append)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelEdge {
    Append,
    Prepend,
}

/// Request to inject a component panel into the chat feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InjectPanel {
    pub component_name: String,
    pub component_data: Value,
    pub position: Option<PanelPosition>,
    pub panel_id: Option<String>,
    pub hidden: Option<bool>,
}

/// Changes applied to an existing panel. At least one field must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_data: Option<Value>,
}

impl PanelUpdate {
    pub fn hidden(hidden: bool) -> Self {
        Self {
            hidden: Some(hidden),
            component_data: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hidden.is_none() && self.component_data.is_none()
    }
}

/// Panel record as known to the chat-panel collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPanel {
    pub id: String,
    pub component_name: String,
    pub component_data: Value,
    pub hidden: bool,
}

/// Payload of a `chatUpdate` message, discriminated by `fbEvent`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "fbEvent")]
pub enum ChatUpdate {
    #[serde(rename = "InjectCustomPanel", rename_all = "camelCase")]
    Inject {
        component_name: String,
        component_data: Value,
        position: PanelPosition,
        panel_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        hidden: Option<bool>,
    },
    #[serde(rename = "UpdateCustomPanel", rename_all = "camelCase")]
    Update {
        panel_id: String,
        updates: PanelUpdate,
    },
    #[serde(rename = "RemoveCustomPanel", rename_all = "camelCase")]
    Remove { panel_id: String },
}

/// Fire-and-forget messages for the front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum FrontendEvent {
    /// A panel's button list changed; the UI should re-fetch it.
    #[serde(rename = "action-buttons:panel-updated")]
    PanelUpdated {
        #[serde(rename = "panelId")]
        panel_id: String,
    },
    #[serde(rename = "chatUpdate")]
    ChatUpdate { payload: ChatUpdate },
}

/// The host's effect engine.
pub trait EffectRunner: Send + Sync {
    /// Run an effect chain to completion. Errors are reported, never retried.
    fn process_effects(&self, trigger: &Trigger, effects: &Value) -> Result<()>;
}

/// The host's chat-panel injection channel; source of truth for panel visibility.
pub trait ChatPanels: Send + Sync {
    /// Returns the id of the injected panel, or `None` when the request was rejected.
    fn inject_panel(&self, data: InjectPanel) -> Option<String>;
    fn update_panel(&self, panel_id: &str, updates: PanelUpdate);
    fn remove_panel(&self, panel_id: &str);
    fn get_panel(&self, panel_id: &str) -> Result<Option<ChatPanel>>;
}

/// One-way channel to the front end.
pub trait FrontendChannel: Send + Sync {
    fn send(&self, event: FrontendEvent);
}
